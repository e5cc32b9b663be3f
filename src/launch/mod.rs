//! Launch command construction.
//!
//! * `command` - the Java command line for a configuration
//! * `jvm_args` - typed JVM flags and their command-line form
//! * `loader_args` - Forge/NeoForge argument file lookup
mod command;
pub mod jvm_args;
pub mod loader_args;

pub use command::{ARGS_FILE_SINCE, CommandBuilder, LaunchCommand, LaunchForm, PASS_THROUGH};
pub use jvm_args::{JvmArgValue, JvmArgs};
