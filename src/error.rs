/// Error handling module for the server runner.
///
/// This module defines the error types used throughout the library.
/// Configuration and spawn failures are fatal for a supervised run, stream
/// failures stay local to the pump that hit them.
///
/// # Example
///
/// ```
/// use mc_server_runner::error::{Error, Result};
///
/// fn handle_error(result: Result<()>) {
///     match result {
///         Ok(_) => println!("Server supervision finished"),
///         Err(Error::ConfigInvalid(msg)) => println!("Fix config.json: {}", msg),
///         Err(Error::Spawn { program, source }) => println!("Could not start {}: {}", program, source),
///         Err(e) => println!("Other error: {}", e),
///     }
/// }
/// ```
use thiserror::Error;

/// Errors that can occur in the mc-server-runner library.
///
/// Each variant includes context information to help the operator
/// understand what went wrong before the restart loop gave up.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read or parse the configuration file.
    ///
    /// This error occurs when:
    /// - The configuration file cannot be read
    /// - The configuration JSON is malformed
    /// - Field types are incorrect
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),

    /// Configuration is valid JSON but contains invalid values.
    ///
    /// This error occurs when:
    /// - The game version is not three dot-separated numbers
    /// - Heap bounds are zero or inverted
    /// - A JVM argument is outside its allowed range
    /// - The reboot target is zero
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    /// The host environment cannot run the server.
    ///
    /// This error occurs when:
    /// - The Java runtime cannot be located
    /// - A filesystem location the launch depends on is unusable
    #[error("Environment error: {0}")]
    Environment(String),

    /// The operating system refused to create the server process.
    ///
    /// This error occurs when:
    /// - The runtime executable does not exist
    /// - The executable is not permitted to run
    #[error("Failed to start {program}: {source}")]
    Spawn {
        /// Program that was being started
        program: String,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// Error while relaying one of the server's standard streams.
    ///
    /// This error occurs when:
    /// - The server closed its stdin while input was being forwarded
    /// - A pipe read or write fails
    #[error("Stream error: {0}")]
    Stream(String),

    /// The detected Java runtime does not match the game version.
    ///
    /// Only returned when strict runtime checking is enabled; otherwise
    /// the mismatch is reported as a warning.
    #[error("Runtime version mismatch: {0}")]
    VersionMismatch(String),

    /// The Java runtime version could not be determined.
    #[error("Runtime probe failed: {0}")]
    Probe(String),

    /// Error when waiting for or signalling a server process.
    #[error("Server process error: {0}")]
    Process(String),

    /// Underlying I/O error not covered by a more specific variant.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other error not covered by the above categories.
    #[error("Other error: {0}")]
    Other(String),
}

/// Result type for mc-server-runner operations.
pub type Result<T> = std::result::Result<T, Error>;
