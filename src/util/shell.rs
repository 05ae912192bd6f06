//! Status output for the command line.
//!
//! Commands report progress through [`Shell::status`] so every line gets the
//! same right-aligned, optionally colored verb. Subprocess output does not go
//! through the shell; it is logged through a sink.

use std::fmt::Display;
use std::io::{self, IsTerminal};
use std::time::Duration;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// --quiet: errors only
    Quiet,
    #[default]
    Normal,
    /// --verbose: full command lines too
    Verbose,
}

/// Color output mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    /// Detect TTY and use colors if available.
    #[default]
    Auto,
    Always,
    Never,
}

/// Status types for output messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    // Success statuses (green)
    Finished,
    Removed,

    // In-progress statuses (cyan)
    Configuring,
    Building,
    Running,

    // Warning statuses (yellow)
    Skipped,
    Warning,

    // Error status (red)
    Error,
}

impl Status {
    fn as_str(&self) -> &'static str {
        match self {
            Status::Finished => "Finished",
            Status::Removed => "Removed",
            Status::Configuring => "Configuring",
            Status::Building => "Building",
            Status::Running => "Running",
            Status::Skipped => "Skipped",
            Status::Warning => "Warning",
            Status::Error => "error",
        }
    }

    fn color_code(&self) -> &'static str {
        match self {
            Status::Finished | Status::Removed => "\x1b[1;32m",
            Status::Configuring | Status::Building | Status::Running => "\x1b[1;36m",
            Status::Skipped | Status::Warning => "\x1b[1;33m",
            Status::Error => "\x1b[1;31m",
        }
    }
}

const STATUS_WIDTH: usize = 12;

/// Central shell for all CLI status output.
#[derive(Debug)]
pub struct Shell {
    verbosity: Verbosity,
    use_color: bool,
}

impl Shell {
    pub fn new(verbosity: Verbosity, color: ColorChoice) -> Self {
        let use_color = match color {
            ColorChoice::Auto => io::stderr().is_terminal(),
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        };

        Shell {
            verbosity,
            use_color,
        }
    }

    /// Create a shell from CLI flags. Quiet wins over verbose.
    pub fn from_flags(quiet: bool, verbose: bool, color: ColorChoice) -> Self {
        let verbosity = if quiet {
            Verbosity::Quiet
        } else if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        };
        Shell::new(verbosity, color)
    }

    pub fn is_quiet(&self) -> bool {
        self.verbosity == Verbosity::Quiet
    }

    pub fn is_verbose(&self) -> bool {
        self.verbosity == Verbosity::Verbose
    }

    pub fn use_color(&self) -> bool {
        self.use_color
    }

    /// Print a status message.
    ///
    /// Format: `{status:>12} {message}`. In quiet mode only errors print.
    pub fn status(&self, status: Status, msg: impl Display) {
        if self.is_quiet() && status != Status::Error {
            return;
        }
        eprintln!("{} {}", self.format_status(status), msg);
    }

    /// Print a message only in verbose mode.
    pub fn verbose(&self, status: Status, msg: impl Display) {
        if self.is_verbose() {
            self.status(status, msg);
        }
    }

    pub fn warn(&self, msg: impl Display) {
        self.status(Status::Warning, msg);
    }

    pub fn error(&self, msg: impl Display) {
        self.status(Status::Error, msg);
    }

    /// `Finished <what> in 1.23s`
    pub fn finished(&self, what: impl Display, elapsed: Duration) {
        self.status(
            Status::Finished,
            format!("{} in {:.2}s", what, elapsed.as_secs_f64()),
        );
    }

    fn format_status(&self, status: Status) -> String {
        let text = status.as_str();
        if self.use_color {
            format!(
                "{}{:>width$}\x1b[0m",
                status.color_code(),
                text,
                width = STATUS_WIDTH
            )
        } else {
            format!("{:>width$}", text, width = STATUS_WIDTH)
        }
    }
}

impl Default for Shell {
    fn default() -> Self {
        Shell::new(Verbosity::Normal, ColorChoice::Auto)
    }
}
