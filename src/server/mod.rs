/// Server supervision for the runner.
///
/// This module owns the game server process and the restart loop around it.
/// All public entry points are instrumented with `tracing` spans.
///
/// # Components
///
/// * `supervisor` - The restart loop: spawn, relay, wait, count down
/// * `process` - Handle on one spawned server process
/// * `lifecycle` - Log of the loop's state transitions
/// * `state` - Restart target, attempt count and continue flag
/// * `signal` - Interrupt source (Ctrl+C)
///
/// # Examples
///
/// Running a server once with a scripted console:
///
/// ```no_run
/// use mc_server_runner::config::ServerConfig;
/// use mc_server_runner::console::BufferConsole;
/// use mc_server_runner::pump::OperatorInput;
/// use mc_server_runner::server::{Interrupts, RunningState, Supervisor, SupervisorState};
/// use std::sync::Arc;
///
/// # async fn example() -> mc_server_runner::Result<()> {
/// let console = BufferConsole::new();
/// let mut supervisor = Supervisor::new(ServerConfig::default(), RunningState::single())
///     .with_console(Arc::new(console.clone()));
/// let lifecycle = supervisor.lifecycle();
///
/// let (_operator, input) = OperatorInput::channel();
/// let report = supervisor.run(input, Interrupts::never()).await?;
///
/// assert_eq!(report.attempts, 1);
/// assert_eq!(lifecycle.current()?, SupervisorState::Terminated);
/// # Ok(())
/// # }
/// ```
pub mod lifecycle;
mod process;
mod signal;
mod state;
mod supervisor;

pub use lifecycle::{Lifecycle, SupervisorState, Transition};
pub use process::{ServerId, ServerProcess, ServerStatus};
pub use signal::{InterruptSender, Interrupts};
pub use state::RunningState;
pub use supervisor::{
    INTERRUPTED_EXIT_CODE, RunReport, Supervisor, SupervisorOptions, TerminationReason,
};
