use crate::error::{Error, Result};
use crate::launch::LaunchCommand;
use async_process::{Child, Command, ExitStatus, Stdio};
use std::fmt;
use std::path::Path;
use uuid::Uuid;

/// Identifies one server generation, i.e. one spawned child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServerId(Uuid);

impl ServerId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of a server process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerStatus {
    /// Process is running
    Running,
    /// A graceful termination was requested
    Stopping,
    /// The process was killed
    Killed,
    /// The exit status has been collected
    Exited,
}

/// A running game server process.
///
/// All three standard streams are piped. The child is killed if the handle
/// is dropped while it is still running.
pub struct ServerProcess {
    id: ServerId,
    program: String,
    child: Child,
    pid: u32,
    status: ServerStatus,
    exit_code: Option<i32>,
}

impl ServerProcess {
    /// Start `command` with `dir` as its working directory.
    ///
    /// # Errors
    ///
    /// Returns `Error::Spawn` if the operating system cannot start the
    /// program.
    #[tracing::instrument(skip(command), fields(program = %command.program().display()))]
    pub fn spawn(command: &LaunchCommand, dir: &Path) -> Result<Self> {
        let program = command.program().display().to_string();

        let child = Command::new(command.program())
            .args(command.arguments())
            .current_dir(dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| Error::Spawn {
                program: program.clone(),
                source,
            })?;

        let process = Self {
            id: ServerId::new(),
            pid: child.id(),
            program,
            child,
            status: ServerStatus::Running,
            exit_code: None,
        };
        tracing::info!(id = %process.id, pid = process.pid, "Server process spawned");
        Ok(process)
    }

    pub fn id(&self) -> ServerId {
        self.id
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn status(&self) -> ServerStatus {
        self.status
    }

    /// Exit code, once the process has been waited on.
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Wait for the process to exit and return its exit code.
    ///
    /// On Unix a process ended by a signal reports `128 + signal`, the way
    /// a shell would. Waiting again after exit returns the same code.
    pub async fn wait(&mut self) -> Result<Option<i32>> {
        if self.status == ServerStatus::Exited {
            return Ok(self.exit_code);
        }

        let status = self
            .child
            .status()
            .await
            .map_err(|e| Error::Process(format!("Failed to wait for server process: {}", e)))?;

        self.exit_code = exit_code(status);
        self.status = ServerStatus::Exited;
        tracing::info!(id = %self.id, pid = self.pid, exit_code = ?self.exit_code, "Server process exited");
        Ok(self.exit_code)
    }

    /// Ask the process to shut down cleanly.
    ///
    /// Sends SIGTERM on Unix. Elsewhere there is no graceful request, so the
    /// process is killed.
    #[cfg(unix)]
    pub fn terminate(&mut self) -> Result<()> {
        use nix::errno::Errno;
        use nix::sys::signal::{Signal, kill};
        use nix::unistd::Pid;

        if self.status != ServerStatus::Running {
            return Ok(());
        }

        let pid = i32::try_from(self.pid)
            .map_err(|_| Error::Process(format!("Process id {} out of range", self.pid)))?;
        match kill(Pid::from_raw(pid), Signal::SIGTERM) {
            Ok(()) | Err(Errno::ESRCH) => {
                self.status = ServerStatus::Stopping;
                Ok(())
            }
            Err(e) => Err(Error::Process(format!("Failed to signal process {}: {}", pid, e))),
        }
    }

    #[cfg(not(unix))]
    pub fn terminate(&mut self) -> Result<()> {
        self.kill()
    }

    /// Kill the process. Killing an exited or already killed process is a
    /// no-op.
    pub fn kill(&mut self) -> Result<()> {
        if matches!(self.status, ServerStatus::Exited | ServerStatus::Killed) {
            return Ok(());
        }

        match self.child.kill() {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::InvalidInput => {
                tracing::debug!(pid = self.pid, "Process already exited before kill");
            }
            Err(e) => {
                return Err(Error::Process(format!("Failed to kill process: {}", e)));
            }
        }
        self.status = ServerStatus::Killed;
        Ok(())
    }

    /// Take the stdin pipe from the process
    pub fn take_stdin(&mut self) -> Result<async_process::ChildStdin> {
        self.child
            .stdin
            .take()
            .ok_or_else(|| Error::Process("Failed to get stdin pipe from child process".to_string()))
    }

    /// Take the stdout pipe from the process
    pub fn take_stdout(&mut self) -> Result<async_process::ChildStdout> {
        self.child
            .stdout
            .take()
            .ok_or_else(|| Error::Process("Failed to get stdout pipe from child process".to_string()))
    }

    /// Take the stderr pipe from the process
    pub fn take_stderr(&mut self) -> Result<async_process::ChildStderr> {
        self.child
            .stderr
            .take()
            .ok_or_else(|| Error::Process("Failed to get stderr pipe from child process".to_string()))
    }
}

impl fmt::Debug for ServerProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerProcess")
            .field("id", &self.id)
            .field("program", &self.program)
            .field("pid", &self.pid)
            .field("status", &self.status)
            .field("exit_code", &self.exit_code)
            .finish()
    }
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.code().or_else(|| status.signal().map(|signal| 128 + signal))
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> Option<i32> {
    status.code()
}
