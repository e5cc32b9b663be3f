//! Terminal output boundary.
//!
//! Everything the supervisor shows the operator goes through a [`Console`]:
//! relayed server output, its own status lines, warnings and the window
//! title. The binary uses [`TerminalConsole`]; tests use [`BufferConsole`].
use owo_colors::OwoColorize;
use std::io::{IsTerminal, Write};
use std::sync::{Arc, Mutex};

/// How a console line should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Style {
    /// Server stdout, shown unchanged
    Output,
    /// Server stderr
    Error,
    /// Supervisor status
    Info,
    /// Supervisor warning
    Warning,
}

/// Line-oriented terminal sink shared by the pumps and the supervisor.
pub trait Console: Send + Sync {
    /// Write one line. The line must not carry its own terminator.
    fn write_line(&self, text: &str, style: Style);

    /// Set the terminal window title, where supported.
    fn set_title(&self, _title: &str) {}
}

/// Console writing to the process stdout, colored when it is a terminal.
#[derive(Debug, Clone)]
pub struct TerminalConsole {
    color: bool,
}

impl TerminalConsole {
    pub fn new() -> Self {
        Self {
            color: std::io::stdout().is_terminal(),
        }
    }
}

impl Default for TerminalConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl Console for TerminalConsole {
    fn write_line(&self, text: &str, style: Style) {
        let mut out = std::io::stdout().lock();
        // A closed stdout is not worth failing the relay over.
        let _ = match (self.color, style) {
            (_, Style::Output) | (false, _) => writeln!(out, "{}", text),
            (true, Style::Error) => writeln!(out, "{}", text.red()),
            (true, Style::Info) => writeln!(out, "{}", text.cyan()),
            (true, Style::Warning) => writeln!(out, "{}", text.yellow().bold()),
        };
        let _ = out.flush();
    }

    fn set_title(&self, title: &str) {
        if !self.color {
            return;
        }
        let mut out = std::io::stdout().lock();
        let _ = write!(out, "\x1b]0;{}\x07", title);
        let _ = out.flush();
    }
}

/// In-memory console recording every line and title.
///
/// Clones share the same buffer, so a test can keep one handle and give
/// another to the supervisor.
#[derive(Debug, Clone, Default)]
pub struct BufferConsole {
    lines: Arc<Mutex<Vec<(Style, String)>>>,
    titles: Arc<Mutex<Vec<String>>>,
}

impl BufferConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// All lines written so far, oldest first.
    pub fn lines(&self) -> Vec<(Style, String)> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// Text of the lines written with `style`.
    pub fn lines_with(&self, style: Style) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(s, _)| *s == style)
            .map(|(_, text)| text)
            .collect()
    }

    /// Whether any line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|(_, text)| text.contains(needle))
    }

    pub fn titles(&self) -> Vec<String> {
        self.titles.lock().map(|t| t.clone()).unwrap_or_default()
    }
}

impl Console for BufferConsole {
    fn write_line(&self, text: &str, style: Style) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push((style, text.to_string()));
        }
    }

    fn set_title(&self, title: &str) {
        if let Ok(mut titles) = self.titles.lock() {
            titles.push(title.to_string());
        }
    }
}
