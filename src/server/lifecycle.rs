use crate::error::{Error, Result};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Instant;

const HISTORY_LIMIT: usize = 1000;

/// States of the supervision loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SupervisorState {
    /// Nothing has happened yet
    Idle,
    /// Preparing or spawning a server generation
    Starting,
    /// A server process is live and its streams are pumped
    Running,
    /// The server process has exited
    Exited,
    /// Waiting out the delay before the next restart
    CountingDown,
    /// The loop has ended
    Terminated,
}

impl SupervisorState {
    /// Whether the loop may move from `self` to `next`.
    pub fn can_transition_to(self, next: SupervisorState) -> bool {
        use SupervisorState::*;
        matches!(
            (self, next),
            (Idle, Starting)
                | (Starting, Running)
                | (Starting, Terminated)
                | (Running, Exited)
                | (Running, Terminated)
                | (Exited, CountingDown)
                | (Exited, Terminated)
                | (CountingDown, Starting)
                | (CountingDown, Terminated)
                | (Terminated, Starting)
        )
    }
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One recorded state change.
#[derive(Debug, Clone)]
pub struct Transition {
    pub from: SupervisorState,
    pub to: SupervisorState,
    /// Attempts completed when the change happened
    pub attempt: u32,
    pub timestamp: Instant,
    pub details: Option<String>,
}

/// Log of the supervision loop's state changes.
///
/// Clones share the same log, so a caller can keep a handle while the
/// supervisor runs.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    current: Arc<Mutex<SupervisorState>>,
    transitions: Arc<Mutex<Vec<Transition>>>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            current: Arc::new(Mutex::new(SupervisorState::Idle)),
            transitions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Move to `to`, recording the change.
    ///
    /// # Errors
    ///
    /// Returns `Error::Other` if the move is not a legal transition or the
    /// log cannot be locked.
    pub fn record(&self, to: SupervisorState, attempt: u32, details: Option<String>) -> Result<()> {
        let mut current = self
            .current
            .lock()
            .map_err(|_| Error::Other("Failed to lock supervisor state".to_string()))?;

        let from = *current;
        if !from.can_transition_to(to) {
            return Err(Error::Other(format!(
                "Illegal supervisor transition {} -> {}",
                from, to
            )));
        }
        *current = to;

        tracing::debug!(%from, %to, attempt, "Supervisor transition");

        let mut transitions = self
            .transitions
            .lock()
            .map_err(|_| Error::Other("Failed to lock supervisor transitions".to_string()))?;
        transitions.push(Transition {
            from,
            to,
            attempt,
            timestamp: Instant::now(),
            details,
        });
        if transitions.len() > HISTORY_LIMIT {
            transitions.remove(0);
        }

        Ok(())
    }

    pub fn current(&self) -> Result<SupervisorState> {
        self.current
            .lock()
            .map(|state| *state)
            .map_err(|_| Error::Other("Failed to lock supervisor state".to_string()))
    }

    /// Recorded transitions, oldest first.
    pub fn history(&self) -> Result<Vec<Transition>> {
        self.transitions
            .lock()
            .map(|t| t.clone())
            .map_err(|_| Error::Other("Failed to lock supervisor transitions".to_string()))
    }

    /// Every state entered so far, oldest first, starting with `Idle`.
    pub fn states(&self) -> Result<Vec<SupervisorState>> {
        let history = self.history()?;
        let mut states = vec![SupervisorState::Idle];
        states.extend(history.iter().map(|t| t.to));
        Ok(states)
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SupervisorState::*;

    #[test]
    fn test_records_legal_path() {
        let lifecycle = Lifecycle::new();
        for (to, attempt) in [(Starting, 0), (Running, 0), (Exited, 1), (CountingDown, 1), (Starting, 1)] {
            lifecycle.record(to, attempt, None).unwrap();
        }

        assert_eq!(lifecycle.current().unwrap(), Starting);
        assert_eq!(
            lifecycle.states().unwrap(),
            vec![Idle, Starting, Running, Exited, CountingDown, Starting]
        );
        assert_eq!(lifecycle.history().unwrap()[2].attempt, 1);
    }

    #[test]
    fn test_rejects_illegal_transition() {
        let lifecycle = Lifecycle::new();
        assert!(lifecycle.record(Running, 0, None).is_err());
        assert_eq!(lifecycle.current().unwrap(), Idle);

        lifecycle.record(Starting, 0, None).unwrap();
        lifecycle.record(Terminated, 0, Some("spawn failed".into())).unwrap();
        assert!(lifecycle.record(Running, 0, None).is_err());
        assert!(lifecycle.record(CountingDown, 0, None).is_err());
    }

    #[test]
    fn test_terminated_loop_can_start_again() {
        let lifecycle = Lifecycle::new();
        for to in [Starting, Terminated, Starting, Running] {
            lifecycle.record(to, 0, None).unwrap();
        }
        assert_eq!(lifecycle.current().unwrap(), Running);
    }
}
