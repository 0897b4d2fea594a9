//! User-facing reporting for a single invocation.
//!
//! Messages are filtered by a minimum [`Level`] chosen per invocation (from
//! `--quiet`) and written to stderr. Internal diagnostics go through `tracing`
//! instead; the reporter only carries what the user asked the tool to tell them.
//!
//! Color handling follows the NO_COLOR standard (https://no-color.org/) and the
//! traditional CLICOLOR conventions.

use crate::diff::DiffLine;
use colored::{Colorize, control};
use std::cell::RefCell;
use std::fmt::Display;

/// Minimum severity a reporter lets through
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Info,
    Warning,
    Error,
    Silent,
}

impl Level {
    /// Map the number of `--quiet` flags to a level
    pub fn from_quiet(count: u8) -> Self {
        match count {
            0 => Level::Info,
            1 => Level::Warning,
            2 => Level::Error,
            _ => Level::Silent,
        }
    }
}

#[derive(Debug)]
pub struct Reporter {
    level: Level,
    // Set in tests to collect messages instead of printing them
    captured: Option<RefCell<Vec<String>>>,
}

impl Reporter {
    pub fn new(level: Level) -> Self {
        Self {
            level,
            captured: None,
        }
    }

    /// Reporter that records uncolored messages in memory
    pub fn capturing(level: Level) -> Self {
        Self {
            level,
            captured: Some(RefCell::new(Vec::new())),
        }
    }

    /// Messages recorded by a capturing reporter
    pub fn messages(&self) -> Vec<String> {
        self.captured
            .as_ref()
            .map(|c| c.borrow().clone())
            .unwrap_or_default()
    }

    pub fn info(&self, message: impl Display) {
        self.emit(Level::Info, message.to_string(), |m| m.normal());
    }

    pub fn success(&self, message: impl Display) {
        self.emit(Level::Info, format!("✔ {}", message), |m| m.green());
    }

    /// Informational line about something that did not match expectations
    pub fn failure(&self, message: impl Display) {
        self.emit(Level::Info, format!("❌ {}", message), |m| m.normal());
    }

    pub fn warning(&self, message: impl Display) {
        self.emit(Level::Warning, format!("❌ {}", message), |m| m.yellow());
    }

    pub fn error(&self, message: impl Display) {
        self.emit(Level::Error, format!("Error: {}", message), |m| m.red());
    }

    /// Render a line diff, additions in green and removals in red
    pub fn diff(&self, lines: &[DiffLine]) {
        for line in lines {
            let text = line.to_string();
            match line {
                DiffLine::Added(_) => self.emit(Level::Error, text, |m| m.green()),
                DiffLine::Removed(_) => self.emit(Level::Error, text, |m| m.red()),
                DiffLine::Common(_) => self.emit(Level::Error, text, |m| m.normal()),
            }
        }
    }

    fn emit(
        &self,
        level: Level,
        message: String,
        paint: impl FnOnce(&str) -> colored::ColoredString,
    ) {
        if level < self.level {
            return;
        }
        match &self.captured {
            Some(captured) => captured.borrow_mut().push(message),
            None => eprintln!("{}", paint(&message)),
        }
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(Level::Info)
    }
}

/// Configure color output from the environment and the terminal
pub fn init_colors() {
    if std::env::var_os("NO_COLOR").is_some() {
        control::set_override(false);
        return;
    }

    if std::env::var("CLICOLOR_FORCE")
        .map(|v| v != "0")
        .unwrap_or(false)
    {
        control::set_override(true);
        return;
    }

    if std::env::var("CLICOLOR").map(|v| v == "0").unwrap_or(false) {
        control::set_override(false);
        return;
    }

    // Reports and diffs are written to stderr
    let is_tty = std::io::IsTerminal::is_terminal(&std::io::stderr());
    control::set_override(is_tty);
}
