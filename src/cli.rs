pub use clap::Parser;
use clap::Subcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true, default_value = mc_server_runner::config::CONFIG_FILE)]
    pub config: PathBuf,

    /// Server directory
    #[arg(long, global = true, default_value = ".")]
    pub dir: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the server and restart it when it exits
    Run {
        /// Number of runs; negative restarts until stopped
        #[arg(short = 'n', long, default_value_t = 1, allow_negative_numbers = true)]
        times: i64,

        /// Seconds to wait for a graceful stop before killing the server
        #[arg(long, default_value_t = 10)]
        grace: u64,
    },
    /// Print the launch command without starting anything
    Command,
    /// Show the Java runtime and whether it suits the configured game version
    Env,
    /// Accept the Minecraft EULA
    Eula,
    /// Print recommended JVM flags for the configured heap
    Tune {
        /// Store the flags in the configuration file
        #[arg(long)]
        write: bool,
    },
}
