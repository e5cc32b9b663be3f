/// Command sent to the server when the operator asks it to stop.
pub const STOP_COMMAND: &str = "stop";

/// What to do with one line of operator input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    /// Relay the line to the server unmodified
    Forward(String),
    /// Stop the server and end the restart loop
    StopSentinel,
    /// Stop the server and let the restart loop bring it back
    RestartSentinel,
}

/// Recognises the stop and reboot sentinels in operator input.
///
/// Matching is exact and case-sensitive after trimming surrounding
/// whitespace: `Stop` or `stop now` are ordinary server commands.
///
/// ```
/// use mc_server_runner::pump::{InputCommand, StopDetector};
///
/// assert_eq!(StopDetector::classify(" /stop "), InputCommand::StopSentinel);
/// assert_eq!(StopDetector::classify("reboot"), InputCommand::RestartSentinel);
/// assert_eq!(
///     StopDetector::classify("say hi"),
///     InputCommand::Forward("say hi".to_string())
/// );
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct StopDetector;

impl StopDetector {
    pub fn classify(line: &str) -> InputCommand {
        match line.trim() {
            "stop" | "/stop" => InputCommand::StopSentinel,
            "reboot" | "/reboot" => InputCommand::RestartSentinel,
            _ => InputCommand::Forward(line.to_string()),
        }
    }
}
