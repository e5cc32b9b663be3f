//! Configuration module for the server runner.
//!
//! This module handles parsing, validation, and persistence of the server
//! configuration. Configurations are stored as JSON, by default in
//! `config.json` next to the server jar.
//!
//! # Examples
//!
//! Loading a configuration from a file:
//!
//! ```no_run
//! use mc_server_runner::config::ServerConfig;
//!
//! let config = ServerConfig::load_or_default("config.json").unwrap();
//! println!("Launching {} with {} GiB", config.jar_name, config.max_memory);
//! ```
//!
//! Creating a configuration programmatically:
//!
//! ```
//! use mc_server_runner::config::{Loader, ServerConfig, validate_config};
//!
//! let config = ServerConfig {
//!     loader: Loader::Vanilla,
//!     version: "1.21.1".to_string(),
//!     max_memory: 8,
//!     ..ServerConfig::default()
//! };
//! validate_config(&config).unwrap();
//! ```
mod parser;
pub mod validator;

pub use parser::{CONFIG_FILE, Loader, ServerConfig};
pub use validator::validate_config;
