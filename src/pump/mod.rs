//! Concurrent relays between the server's standard streams and the terminal.
//!
//! * `output` - stdout and stderr to the console
//! * `input` - operator lines to the server's stdin
//! * `sentinel` - stop/reboot detection on operator input
mod input;
mod output;
mod sentinel;

pub use input::{InputEnd, OperatorInput, spawn_input_pump};
pub use output::{OutputStream, spawn_output_pump};
pub use sentinel::{InputCommand, STOP_COMMAND, StopDetector};

use std::time::Duration;
use tokio::task::JoinHandle;

/// Wait up to `limit` for a pump to finish, then abort it.
///
/// The pump task has ended when this returns, whatever the outcome.
pub async fn join_pump<T>(name: &str, mut handle: JoinHandle<T>, limit: Duration) -> Option<T> {
    match tokio::time::timeout(limit, &mut handle).await {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            tracing::warn!(pump = name, error = %e, "Pump task failed");
            None
        }
        Err(_) => {
            tracing::warn!(pump = name, ?limit, "Pump did not drain in time, aborting");
            handle.abort();
            let _ = handle.await;
            None
        }
    }
}
