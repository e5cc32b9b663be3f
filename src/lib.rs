/*!
 # Minecraft Server Runner

 A Rust library for launching and supervising a Minecraft server process.

 ## Overview

 Minecraft Server Runner provides functionality to:
 - Build the Java command line for Vanilla, Fabric, Quilt, Forge and NeoForge servers
 - Check the installed Java runtime against the game version
 - Relay the server's console to the terminal and operator input back to it
 - Restart the server a bounded or unbounded number of times, with a countdown
 - Stop the server gracefully on `stop` or Ctrl+C, and forcibly when it hangs

 ## Basic Usage

 ```no_run
 use mc_server_runner::{Result, RunningState, ServerConfig, Supervisor};
 use mc_server_runner::pump::OperatorInput;
 use mc_server_runner::server::Interrupts;

 #[tokio::main]
 async fn main() -> Result<()> {
     // Load config.json, or use the defaults when it does not exist
     let config = ServerConfig::load_or_default("config.json")?;

     // Restart the server three times at most
     let mut supervisor = Supervisor::new(config, RunningState::new(3)?)
         .with_server_dir(".");

     let report = supervisor
         .run(OperatorInput::stdin(), Interrupts::ctrl_c())
         .await?;

     println!("Server ran {} time(s): {}", report.attempts, report.reason);
     Ok(())
 }
 ```

 ## Features

 - **Launch Commands**: Heap flags, typed JVM flags and loader argument files
 - **Runtime Check**: Java version detection and game version requirements
 - **Console Relay**: Concurrent stdout, stderr and stdin pumps
 - **Restart Loop**: Countdown, stop/reboot commands and interrupt handling
 - **Configuration**: JSON config with validation and recommended JVM flags

 ## License

 This project is licensed under the terms in the LICENSE file.
*/

pub mod config;
pub mod console;
pub mod error;
pub mod eula;
pub mod launch;
pub mod pump;
pub mod runtime;
pub mod server;

pub use config::ServerConfig;
pub use error::{Error, Result};
pub use launch::{CommandBuilder, LaunchCommand};
pub use server::{RunReport, RunningState, Supervisor, TerminationReason};
