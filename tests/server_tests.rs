#![cfg(unix)]

use mc_server_runner::config::ServerConfig;
use mc_server_runner::console::{BufferConsole, Style};
use mc_server_runner::error::{Error, Result};
use mc_server_runner::launch::LaunchCommand;
use mc_server_runner::pump::OperatorInput;
use mc_server_runner::server::{
    InterruptSender, Interrupts, RunReport, RunningState, ServerProcess, ServerStatus, Supervisor,
    SupervisorOptions, SupervisorState, TerminationReason,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const READY: &str = "ready";

fn sh(script: &str) -> LaunchCommand {
    let mut command = LaunchCommand::new("sh");
    command.args(["-c", script]);
    command
}

fn config(reboot_seconds: u64) -> ServerConfig {
    ServerConfig {
        reboot_seconds,
        force_run: true,
        ..ServerConfig::default()
    }
}

fn fast() -> SupervisorOptions {
    SupervisorOptions {
        grace_period: Duration::from_secs(5),
        countdown_tick: Duration::from_millis(10),
        drain_timeout: Duration::from_millis(500),
    }
}

struct Harness {
    console: BufferConsole,
    operator: mpsc::Sender<String>,
    interrupt: InterruptSender,
    lifecycle: mc_server_runner::server::Lifecycle,
    run: JoinHandle<Result<RunReport>>,
}

fn start(supervisor: Supervisor) -> Harness {
    let console = BufferConsole::new();
    let mut supervisor = supervisor.with_console(Arc::new(console.clone()));
    let lifecycle = supervisor.lifecycle();
    let (operator, input) = OperatorInput::channel();
    let (interrupt, interrupts) = Interrupts::channel();

    let run = tokio::spawn(async move { supervisor.run(input, interrupts).await });
    Harness {
        console,
        operator,
        interrupt,
        lifecycle,
        run,
    }
}

impl Harness {
    /// Wait until the server has printed `line` `count` times.
    async fn wait_for_output(&self, line: &str, count: usize) {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            let seen = self
                .console
                .lines_with(Style::Output)
                .iter()
                .filter(|l| *l == line)
                .count();
            if seen >= count {
                return;
            }
            assert!(Instant::now() < deadline, "timed out waiting for {line:?}");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    async fn wait_for_info(&self, needle: &str) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while !self
            .console
            .lines_with(Style::Info)
            .iter()
            .any(|l| l.contains(needle))
        {
            assert!(Instant::now() < deadline, "timed out waiting for {needle:?}");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    async fn type_line(&self, line: &str) {
        self.operator.send(line.to_string()).await.unwrap();
    }

    async fn finish(self) -> (Result<RunReport>, BufferConsole, Vec<SupervisorState>) {
        let result = tokio::time::timeout(Duration::from_secs(20), self.run)
            .await
            .expect("supervisor did not finish")
            .unwrap();
        let states = self.lifecycle.states().unwrap();
        (result, self.console, states)
    }
}

fn count(states: &[SupervisorState], state: SupervisorState) -> usize {
    states.iter().filter(|s| **s == state).count()
}

#[tokio::test]
async fn test_bounded_target_runs_exactly_n_times() -> Result<()> {
    let supervisor = Supervisor::new(config(2), RunningState::new(3)?)
        .with_command(sh("echo run; exit 0"))
        .with_options(fast());

    let (result, console, states) = start(supervisor).finish().await;
    let report = result?;

    assert_eq!(report.attempts, 3);
    assert_eq!(report.reason, TerminationReason::TargetReached);
    assert_eq!(report.last_exit_code, Some(0));
    assert_eq!(console.lines_with(Style::Output), vec!["run", "run", "run"]);
    assert_eq!(count(&states, SupervisorState::Running), 3);
    assert_eq!(count(&states, SupervisorState::CountingDown), 2);
    assert_eq!(states.last(), Some(&SupervisorState::Terminated));
    assert_eq!(
        console.titles(),
        vec!["Reboot time: 0", "Reboot time: 1", "Reboot time: 2"]
    );

    let countdown: Vec<String> = console
        .lines_with(Style::Info)
        .into_iter()
        .filter(|l| l.starts_with("Restarting in"))
        .collect();
    assert_eq!(
        countdown,
        vec!["Restarting in 2s", "Restarting in 1s", "Restarting in 2s", "Restarting in 1s"]
    );
    Ok(())
}

#[tokio::test]
async fn test_single_run_never_counts_down() -> Result<()> {
    let supervisor = Supervisor::new(config(10), RunningState::single())
        .with_command(sh("echo out; echo err >&2; exit 3"))
        .with_options(fast());

    let (result, console, states) = start(supervisor).finish().await;
    let report = result?;

    assert_eq!(report.attempts, 1);
    assert_eq!(report.last_exit_code, Some(3));
    assert_eq!(
        states,
        vec![
            SupervisorState::Idle,
            SupervisorState::Starting,
            SupervisorState::Running,
            SupervisorState::Exited,
            SupervisorState::Terminated,
        ]
    );
    assert_eq!(console.lines_with(Style::Output), vec!["out"]);
    assert_eq!(console.lines_with(Style::Error), vec!["[ERROR] err"]);
    assert!(console.contains("Server exited with code 3"));
    assert!(console.contains("Server started, PID"));
    Ok(())
}

#[tokio::test]
async fn test_stop_sentinel_ends_loop() -> Result<()> {
    let supervisor = Supervisor::new(config(1), RunningState::unbounded())
        .with_command(sh("echo ready; read line; echo \"got $line\"; exit 0"))
        .with_options(fast());

    let harness = start(supervisor);
    harness.wait_for_output(READY, 1).await;
    harness.type_line("stop").await;

    let (result, console, states) = harness.finish().await;
    let report = result?;

    assert_eq!(report.attempts, 1);
    assert_eq!(report.reason, TerminationReason::StopRequested);
    assert!(console.lines_with(Style::Output).contains(&"got stop".to_string()));
    assert_eq!(count(&states, SupervisorState::CountingDown), 0);
    Ok(())
}

#[tokio::test]
async fn test_restart_sentinel_continues_loop() -> Result<()> {
    let supervisor = Supervisor::new(config(1), RunningState::new(2)?)
        .with_command(sh("echo ready; read line; echo \"got $line\"; exit 0"))
        .with_options(fast());

    let harness = start(supervisor);
    harness.wait_for_output(READY, 1).await;
    harness.type_line("/reboot").await;
    harness.wait_for_output(READY, 2).await;
    harness.type_line("say still here").await;

    let (result, console, _) = harness.finish().await;
    let report = result?;

    assert_eq!(report.attempts, 2);
    assert_eq!(report.reason, TerminationReason::TargetReached);
    let output = console.lines_with(Style::Output);
    assert!(output.contains(&"got stop".to_string()));
    assert!(output.contains(&"got say still here".to_string()));
    Ok(())
}

#[tokio::test]
async fn test_exit_code_130_ends_loop() -> Result<()> {
    let supervisor = Supervisor::new(config(1), RunningState::unbounded())
        .with_command(sh("exit 130"))
        .with_options(fast());

    let (result, _, states) = start(supervisor).finish().await;
    let report = result?;

    assert_eq!(report.attempts, 1);
    assert_eq!(report.last_exit_code, Some(130));
    assert_eq!(report.reason, TerminationReason::ServerInterrupted);
    assert_eq!(count(&states, SupervisorState::CountingDown), 0);
    Ok(())
}

#[tokio::test]
async fn test_interrupt_during_countdown_skips_restart() -> Result<()> {
    let options = SupervisorOptions {
        countdown_tick: Duration::from_secs(1),
        ..fast()
    };
    let supervisor = Supervisor::new(config(30), RunningState::unbounded())
        .with_command(sh("exit 0"))
        .with_options(options);

    let harness = start(supervisor);
    harness.wait_for_info("Restarting in 30s").await;
    let started = Instant::now();
    harness.interrupt.send(()).unwrap();

    let (result, console, states) = harness.finish().await;
    let report = result?;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(report.attempts, 1);
    assert_eq!(report.reason, TerminationReason::Interrupted);
    assert_eq!(count(&states, SupervisorState::Running), 1);
    assert!(console.contains("Restart cancelled"));
    Ok(())
}

#[tokio::test]
async fn test_interrupt_stops_server_gracefully() -> Result<()> {
    let supervisor = Supervisor::new(config(1), RunningState::single())
        .with_command(sh("echo ready; exec sleep 30"))
        .with_options(fast());

    let harness = start(supervisor);
    harness.wait_for_output(READY, 1).await;
    harness.interrupt.send(()).unwrap();

    let (result, console, _) = harness.finish().await;
    let report = result?;

    // SIGTERM
    assert_eq!(report.last_exit_code, Some(143));
    assert!(!console.contains("killing"));
    Ok(())
}

#[tokio::test]
async fn test_two_interrupted_runs_end_loop() -> Result<()> {
    let supervisor = Supervisor::new(config(0), RunningState::unbounded())
        .with_command(sh("echo ready; exec sleep 30"))
        .with_options(fast());

    let harness = start(supervisor);
    harness.wait_for_output(READY, 1).await;
    harness.interrupt.send(()).unwrap();
    harness.wait_for_output(READY, 2).await;
    harness.interrupt.send(()).unwrap();

    let (result, _, _) = harness.finish().await;
    let report = result?;

    assert_eq!(report.attempts, 2);
    assert_eq!(report.reason, TerminationReason::Interrupted);
    Ok(())
}

#[tokio::test]
async fn test_forced_kill_after_grace_period() -> Result<()> {
    let options = SupervisorOptions {
        grace_period: Duration::from_millis(200),
        ..fast()
    };
    let supervisor = Supervisor::new(config(1), RunningState::single())
        .with_command(sh("trap '' TERM; echo ready; while :; do :; done"))
        .with_options(options);

    let harness = start(supervisor);
    harness.wait_for_output(READY, 1).await;
    harness.interrupt.send(()).unwrap();

    let (result, console, _) = harness.finish().await;
    let report = result?;

    // SIGKILL
    assert_eq!(report.last_exit_code, Some(137));
    assert!(console.contains("killing it"));
    Ok(())
}

#[tokio::test]
async fn test_second_interrupt_kills_immediately() -> Result<()> {
    let options = SupervisorOptions {
        grace_period: Duration::from_secs(60),
        ..fast()
    };
    let supervisor = Supervisor::new(config(1), RunningState::single())
        .with_command(sh("trap '' TERM; echo ready; while :; do :; done"))
        .with_options(options);

    let harness = start(supervisor);
    harness.wait_for_output(READY, 1).await;
    let started = Instant::now();
    harness.interrupt.send(()).unwrap();
    harness.wait_for_info("stopping the server").await;
    harness.interrupt.send(()).unwrap();

    let (result, console, _) = harness.finish().await;
    let report = result?;

    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(report.last_exit_code, Some(137));
    assert!(console.contains("Interrupted again"));
    Ok(())
}

#[tokio::test]
async fn test_spawn_failure_is_fatal() -> Result<()> {
    let supervisor = Supervisor::new(config(1), RunningState::unbounded())
        .with_command(LaunchCommand::new("/nonexistent/bin/java"))
        .with_options(fast());

    let (result, console, states) = start(supervisor).finish().await;

    match result {
        Err(Error::Spawn { program, .. }) => assert_eq!(program, "/nonexistent/bin/java"),
        other => panic!("expected spawn error, got {other:?}"),
    }
    assert_eq!(console.lines_with(Style::Error).len(), 1);
    assert_eq!(states.last(), Some(&SupervisorState::Terminated));
    assert_eq!(count(&states, SupervisorState::Running), 0);
    Ok(())
}

#[tokio::test]
async fn test_process_kill_is_idempotent() -> Result<()> {
    let mut process = ServerProcess::spawn(&sh("exec sleep 30"), std::path::Path::new("."))?;
    assert_eq!(process.status(), ServerStatus::Running);

    process.kill()?;
    process.kill()?;
    assert_eq!(process.status(), ServerStatus::Killed);

    assert_eq!(process.wait().await?, Some(137));
    process.kill()?;
    process.terminate()?;
    assert_eq!(process.status(), ServerStatus::Exited);
    Ok(())
}

#[tokio::test]
async fn test_supervisor_runs_again_after_finishing() -> Result<()> {
    let console = BufferConsole::new();
    let mut supervisor = Supervisor::new(config(1), RunningState::single())
        .with_console(Arc::new(console.clone()))
        .with_command(sh("echo run; exit 0"))
        .with_options(fast());
    let lifecycle = supervisor.lifecycle();

    for _ in 0..2 {
        let (_operator, input) = OperatorInput::channel();
        let report = supervisor.run(input, Interrupts::never()).await?;
        assert_eq!(report.attempts, 1);
        assert_eq!(report.reason, TerminationReason::TargetReached);
    }

    let states = lifecycle.states()?;
    assert_eq!(count(&states, SupervisorState::Running), 2);
    assert_eq!(count(&states, SupervisorState::Terminated), 2);
    assert_eq!(console.lines_with(Style::Output), vec!["run", "run"]);
    assert!(console.lines_with(Style::Error).is_empty());
    Ok(())
}

#[tokio::test]
async fn test_interrupt_while_draining_cancels_immediate_restart() -> Result<()> {
    // The background sleep keeps the output pipes open after the shell exits.
    let supervisor = Supervisor::new(config(0), RunningState::unbounded())
        .with_command(sh("sleep 2 & exit 0"))
        .with_options(fast());

    let harness = start(supervisor);
    harness.wait_for_info("Server started").await;
    tokio::time::sleep(Duration::from_millis(150)).await;
    harness.interrupt.send(()).unwrap();

    let (result, console, states) = harness.finish().await;
    let report = result?;

    assert_eq!(report.attempts, 1);
    assert_eq!(report.last_exit_code, Some(0));
    assert_eq!(report.reason, TerminationReason::Interrupted);
    assert_eq!(count(&states, SupervisorState::Running), 1);
    assert!(console.contains("Restart cancelled"));
    Ok(())
}

#[tokio::test]
async fn test_closed_server_input_is_reported() -> Result<()> {
    let supervisor = Supervisor::new(config(1), RunningState::single())
        .with_command(sh("exec 0<&-; echo ready; sleep 2; exit 0"))
        .with_options(fast());

    let harness = start(supervisor);
    harness.wait_for_output(READY, 1).await;
    harness.type_line("list").await;

    let deadline = Instant::now() + Duration::from_secs(10);
    while harness.console.lines_with(Style::Warning).is_empty() {
        assert!(Instant::now() < deadline, "no warning about the closed input");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(!harness.run.is_finished());

    let (result, console, _) = harness.finish().await;
    assert_eq!(result?.reason, TerminationReason::TargetReached);
    assert!(console.contains("typed lines no longer reach the server"));
    Ok(())
}
