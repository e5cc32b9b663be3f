use crate::config::{ServerConfig, validate_config};
use crate::console::{Console, Style, TerminalConsole};
use crate::error::{Error, Result};
use crate::launch::{CommandBuilder, LaunchCommand};
use crate::pump::{self, InputEnd, OperatorInput, OutputStream};
use crate::runtime::{GateOutcome, JavaProbe, RuntimeProbe, Version, VersionGate};
use crate::server::lifecycle::{Lifecycle, SupervisorState};
use crate::server::process::ServerProcess;
use crate::server::signal::Interrupts;
use crate::server::state::RunningState;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

/// Exit code of a server stopped by Ctrl+C.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Timing knobs of the supervision loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorOptions {
    /// How long a server may take to stop after a graceful request
    pub grace_period: Duration,
    /// Length of one countdown step
    pub countdown_tick: Duration,
    /// How long the output pumps may take to drain after exit
    pub drain_timeout: Duration,
}

impl Default for SupervisorOptions {
    fn default() -> Self {
        Self {
            grace_period: Duration::from_secs(10),
            countdown_tick: Duration::from_secs(1),
            drain_timeout: Duration::from_secs(2),
        }
    }
}

/// Why the supervision loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// The server ran as many times as requested
    TargetReached,
    /// The operator asked the server to stop
    StopRequested,
    /// The server itself was stopped by Ctrl+C
    ServerInterrupted,
    /// The operator interrupted the supervisor
    Interrupted,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TerminationReason::TargetReached => "restart target reached",
            TerminationReason::StopRequested => "stop requested",
            TerminationReason::ServerInterrupted => "server interrupted",
            TerminationReason::Interrupted => "interrupted",
        };
        f.write_str(text)
    }
}

/// Summary of a finished supervision loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Number of times the server ran
    pub attempts: u32,
    /// Exit code of the last run
    pub last_exit_code: Option<i32>,
    pub reason: TerminationReason,
}

/// How one server generation ended.
struct Exit {
    code: Option<i32>,
    interrupted: bool,
}

/// Runs a game server, relays its console and restarts it when it exits.
///
/// # Examples
///
/// ```no_run
/// use mc_server_runner::config::ServerConfig;
/// use mc_server_runner::pump::OperatorInput;
/// use mc_server_runner::server::{Interrupts, RunningState, Supervisor};
///
/// #[tokio::main]
/// async fn main() -> mc_server_runner::Result<()> {
///     let config = ServerConfig::load_or_default("config.json")?;
///     let mut supervisor = Supervisor::new(config, RunningState::new(-1)?);
///
///     let report = supervisor
///         .run(OperatorInput::stdin(), Interrupts::ctrl_c())
///         .await?;
///     println!("Stopped after {} runs: {}", report.attempts, report.reason);
///     Ok(())
/// }
/// ```
pub struct Supervisor {
    config: ServerConfig,
    state: RunningState,
    console: Arc<dyn Console>,
    probe: Arc<dyn RuntimeProbe>,
    server_dir: PathBuf,
    command: Option<LaunchCommand>,
    options: SupervisorOptions,
    lifecycle: Lifecycle,
}

impl Supervisor {
    pub fn new(config: ServerConfig, state: RunningState) -> Self {
        Self {
            config,
            state,
            console: Arc::new(TerminalConsole::new()),
            probe: Arc::new(JavaProbe),
            server_dir: PathBuf::from("."),
            command: None,
            options: SupervisorOptions::default(),
            lifecycle: Lifecycle::new(),
        }
    }

    pub fn with_console(mut self, console: Arc<dyn Console>) -> Self {
        self.console = console;
        self
    }

    pub fn with_probe(mut self, probe: Arc<dyn RuntimeProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Directory the server runs in and loader files are looked up in.
    pub fn with_server_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.server_dir = dir.into();
        self
    }

    /// Launch `command` instead of the one built from the configuration.
    pub fn with_command(mut self, command: LaunchCommand) -> Self {
        self.command = Some(command);
        self
    }

    pub fn with_options(mut self, options: SupervisorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn state(&self) -> &RunningState {
        &self.state
    }

    /// Handle on the state log; it stays valid while `run` executes.
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.clone()
    }

    /// Run the supervision loop until it terminates.
    ///
    /// # Errors
    ///
    /// Configuration errors, a strict runtime mismatch and spawn failures
    /// end the loop with an error after being shown on the console.
    /// Interrupts are not errors; they end the loop with a report.
    ///
    /// A finished supervisor may be run again; attempts are counted afresh.
    #[tracing::instrument(skip_all, fields(target = self.state.reboot_target()))]
    pub async fn run(&mut self, input: OperatorInput, mut interrupts: Interrupts) -> Result<RunReport> {
        match self.supervise(&input, &mut interrupts).await {
            Ok(report) => Ok(report),
            Err(e) => Err(self.fail(e)),
        }
    }

    async fn supervise(&mut self, input: &OperatorInput, interrupts: &mut Interrupts) -> Result<RunReport> {
        self.lifecycle.record(SupervisorState::Starting, 0, None)?;

        let command = self.prepare().await?;
        self.state.reset();

        let mut interrupted_before = false;
        let mut last_exit_code = None;
        let reason = loop {
            let exit = self.run_once(&command, input, interrupts).await?;

            self.state.record_attempt();
            last_exit_code = exit.code;
            let attempts = self.state.attempt_count();
            self.lifecycle.record(
                SupervisorState::Exited,
                attempts,
                exit.code.map(|code| format!("exit code {}", code)),
            )?;
            self.info(&format!("Server exited with code {}", display_code(exit.code)));

            let server_interrupted = exit.code == Some(INTERRUPTED_EXIT_CODE);
            if server_interrupted {
                self.state.stop();
            }

            let reason = if exit.interrupted && interrupted_before {
                Some(TerminationReason::Interrupted)
            } else if self.state.target_reached() {
                Some(TerminationReason::TargetReached)
            } else if !self.state.should_continue() {
                Some(if server_interrupted {
                    TerminationReason::ServerInterrupted
                } else {
                    TerminationReason::StopRequested
                })
            } else {
                None
            };
            interrupted_before = exit.interrupted;

            if let Some(reason) = reason {
                break reason;
            }

            self.lifecycle.record(SupervisorState::CountingDown, attempts, None)?;
            if !self.count_down(interrupts).await {
                break TerminationReason::Interrupted;
            }
            self.lifecycle.record(SupervisorState::Starting, attempts, None)?;
        };

        let report = RunReport {
            attempts: self.state.attempt_count(),
            last_exit_code,
            reason,
        };
        self.lifecycle.record(
            SupervisorState::Terminated,
            report.attempts,
            Some(reason.to_string()),
        )?;
        self.info(&format!(
            "Supervisor stopped after {} run(s): {}",
            report.attempts, reason
        ));
        tracing::info!(attempts = report.attempts, %reason, "Supervision finished");
        Ok(report)
    }

    /// Validate the configuration, build the command and check the runtime.
    async fn prepare(&self) -> Result<LaunchCommand> {
        validate_config(&self.config)?;

        let command = match &self.command {
            Some(command) => command.clone(),
            None => CommandBuilder::new(&self.config)
                .server_dir(&self.server_dir)
                .build()?,
        };

        self.check_runtime().await?;
        Ok(command)
    }

    async fn check_runtime(&self) -> Result<()> {
        let gate = VersionGate::new(self.config.force_run);
        if self.config.force_run {
            tracing::info!("{}", GateOutcome::Bypassed);
            return Ok(());
        }

        let game: Version = self.config.version.parse()?;
        let runtime = match self.probe.probe(self.config.jdk_path.clone()).await {
            Ok(version) => version,
            Err(e) => {
                self.warn(&format!("Could not determine the Java version: {}", e));
                return Ok(());
            }
        };

        match gate.check(game, runtime) {
            GateOutcome::Mismatch { reason, .. } if self.config.strict_runtime_check => {
                Err(Error::VersionMismatch(reason))
            }
            GateOutcome::Mismatch { reason, .. } => {
                self.warn(&reason);
                Ok(())
            }
            outcome => {
                tracing::debug!(%runtime, %outcome, "Runtime check");
                Ok(())
            }
        }
    }

    /// Spawn one server generation and supervise it until it exits.
    async fn run_once(
        &mut self,
        command: &LaunchCommand,
        input: &OperatorInput,
        interrupts: &mut Interrupts,
    ) -> Result<Exit> {
        let attempts = self.state.attempt_count();
        self.console.set_title(&format!("Reboot time: {}", attempts));

        let discarded = input.discard_pending();
        if discarded > 0 {
            tracing::debug!(discarded, "Dropped operator input typed while the server was down");
        }
        interrupts.clear();

        let mut process = ServerProcess::spawn(command, &self.server_dir)?;
        self.info(&format!("Launch command: {}", command));
        self.info(&format!("Server started, PID {}", process.pid()));
        self.lifecycle.record(
            SupervisorState::Running,
            attempts,
            Some(format!("pid {}", process.pid())),
        )?;

        let stdin = process.take_stdin()?;
        let stdout = process.take_stdout()?;
        let stderr = process.take_stderr()?;

        let stdout_pump = pump::spawn_output_pump(stdout, Arc::clone(&self.console), OutputStream::Stdout);
        let stderr_pump = pump::spawn_output_pump(stderr, Arc::clone(&self.console), OutputStream::Stderr);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let mut stdin_pump = pump::spawn_input_pump(stdin, input.clone(), self.state.continue_flag(), shutdown_rx);

        let mut interrupted = false;
        let mut stdin_done = false;
        let status = loop {
            tokio::select! {
                status = process.wait() => break status,
                _ = interrupts.recv() => {
                    interrupted = true;
                    break self.shut_down(&mut process, interrupts).await;
                }
                end = &mut stdin_pump, if !stdin_done => {
                    stdin_done = true;
                    self.stdin_ended(end.ok());
                }
            }
        };

        let _ = shutdown_tx.send(());
        if !stdin_done {
            self.stdin_ended(pump::join_pump("stdin", stdin_pump, self.options.drain_timeout).await);
        }
        pump::join_pump("stdout", stdout_pump, self.options.drain_timeout).await;
        pump::join_pump("stderr", stderr_pump, self.options.drain_timeout).await;

        Ok(Exit {
            code: status?,
            interrupted,
        })
    }

    /// Stop the server after an interrupt: ask first, kill when it does not
    /// stop within the grace period or on a second interrupt.
    async fn shut_down(
        &self,
        process: &mut ServerProcess,
        interrupts: &mut Interrupts,
    ) -> Result<Option<i32>> {
        self.info("Interrupted, stopping the server");
        if let Err(e) = process.terminate() {
            tracing::warn!(error = %e, "Graceful stop failed");
        }

        tokio::select! {
            status = process.wait() => status,
            _ = tokio::time::sleep(self.options.grace_period) => {
                self.warn(&format!(
                    "Server did not stop within {}s, killing it",
                    self.options.grace_period.as_secs_f32()
                ));
                process.kill()?;
                process.wait().await
            }
            _ = interrupts.recv() => {
                self.warn("Interrupted again, killing the server");
                process.kill()?;
                process.wait().await
            }
        }
    }

    fn stdin_ended(&self, end: Option<Result<InputEnd>>) {
        match end {
            Some(Err(e)) => self.warn(&format!(
                "Server input closed, typed lines no longer reach the server: {}",
                e
            )),
            Some(Ok(end)) => tracing::debug!(?end, "Stdin pump finished"),
            None => {}
        }
    }

    /// Count down to the next start. Returns `false` if interrupted.
    ///
    /// An interrupt that arrived while the last generation was winding
    /// down cancels the restart too.
    async fn count_down(&self, interrupts: &mut Interrupts) -> bool {
        if interrupts.try_recv() {
            self.info("Restart cancelled");
            return false;
        }
        for remaining in (1..=self.config.reboot_seconds).rev() {
            self.info(&format!("Restarting in {}s", remaining));
            tokio::select! {
                _ = tokio::time::sleep(self.options.countdown_tick) => {}
                _ = interrupts.recv() => {
                    self.info("Restart cancelled");
                    return false;
                }
            }
        }
        true
    }

    /// Report a fatal error and end the loop.
    fn fail(&self, error: Error) -> Error {
        tracing::error!(error = %error, "Supervision failed");
        self.console.write_line(&error.to_string(), Style::Error);
        if let Err(e) = self.lifecycle.record(
            SupervisorState::Terminated,
            self.state.attempt_count(),
            Some(error.to_string()),
        ) {
            tracing::debug!(error = %e, "Could not record termination");
        }
        error
    }

    fn info(&self, text: &str) {
        self.console.write_line(text, Style::Info);
    }

    fn warn(&self, text: &str) {
        tracing::warn!("{}", text);
        self.console.write_line(text, Style::Warning);
    }
}

fn display_code(code: Option<i32>) -> String {
    code.map_or_else(|| "unknown".to_string(), |code| code.to_string())
}
