use crate::error::{Error, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Restart bookkeeping for one supervised run.
///
/// `reboot_target` is the number of runs to perform: 1 runs the server
/// once, N > 1 restarts it until it has run N times, and any negative value
/// restarts forever.
#[derive(Debug)]
pub struct RunningState {
    reboot_target: i64,
    attempt_count: u32,
    continue_flag: Arc<AtomicBool>,
}

impl RunningState {
    /// # Errors
    ///
    /// Returns `Error::ConfigInvalid` for a target of 0.
    pub fn new(reboot_target: i64) -> Result<Self> {
        if reboot_target == 0 {
            return Err(Error::ConfigInvalid(
                "Reboot target must be non-zero: 1 runs once, negative restarts forever".to_string(),
            ));
        }
        Ok(Self {
            reboot_target,
            attempt_count: 0,
            continue_flag: Arc::new(AtomicBool::new(true)),
        })
    }

    /// Run the server exactly once.
    pub fn single() -> Self {
        Self {
            reboot_target: 1,
            attempt_count: 0,
            continue_flag: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Restart the server until told to stop.
    pub fn unbounded() -> Self {
        Self {
            reboot_target: -1,
            ..Self::single()
        }
    }

    pub fn reboot_target(&self) -> i64 {
        self.reboot_target
    }

    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    pub fn is_unbounded(&self) -> bool {
        self.reboot_target < 0
    }

    /// Shared handle to the continue flag.
    pub fn continue_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.continue_flag)
    }

    pub fn should_continue(&self) -> bool {
        self.continue_flag.load(Ordering::SeqCst)
    }

    /// Clear the continue flag; the loop ends after the current run.
    pub fn stop(&self) {
        self.continue_flag.store(false, Ordering::SeqCst);
    }

    /// Start a fresh run: no attempts yet, continue flag set.
    pub fn reset(&mut self) {
        self.attempt_count = 0;
        self.continue_flag.store(true, Ordering::SeqCst);
    }

    pub(crate) fn record_attempt(&mut self) {
        self.attempt_count += 1;
    }

    /// Whether a bounded target has been met.
    pub fn target_reached(&self) -> bool {
        self.reboot_target >= 0 && i64::from(self.attempt_count) >= self.reboot_target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_target_rejected() {
        assert!(matches!(RunningState::new(0), Err(Error::ConfigInvalid(_))));
    }

    #[test]
    fn test_bounded_target() {
        let mut state = RunningState::new(2).unwrap();
        assert!(!state.target_reached());
        state.record_attempt();
        assert!(!state.target_reached());
        state.record_attempt();
        assert!(state.target_reached());

        state.reset();
        assert_eq!(state.attempt_count(), 0);
    }

    #[test]
    fn test_unbounded_never_reaches_target() {
        let mut state = RunningState::new(-1).unwrap();
        for _ in 0..100 {
            state.record_attempt();
        }
        assert!(state.is_unbounded());
        assert!(!state.target_reached());
    }

    #[test]
    fn test_flag_is_shared() {
        let mut state = RunningState::single();
        let flag = state.continue_flag();
        flag.store(false, Ordering::SeqCst);
        assert!(!state.should_continue());

        state.reset();
        assert!(flag.load(Ordering::SeqCst));
    }
}
