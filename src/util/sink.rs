//! Line sinks for subprocess output.
//!
//! The executor never prints. Every line a child writes is handed to a
//! [`LogSink`] with a level: stdout lines at info, stderr lines at error.

use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Level of a logged line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// Receives leveled text lines. Shared between the two stream readers.
pub trait LogSink: Send + Sync {
    fn log(&self, level: LogLevel, line: &str);

    fn info(&self, line: &str) {
        self.log(LogLevel::Info, line);
    }

    fn warn(&self, line: &str) {
        self.log(LogLevel::Warn, line);
    }

    fn error(&self, line: &str) {
        self.log(LogLevel::Error, line);
    }
}

/// Forwards lines to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, level: LogLevel, line: &str) {
        match level {
            LogLevel::Info => tracing::info!("{}", line),
            LogLevel::Warn => tracing::warn!("{}", line),
            LogLevel::Error => tracing::error!("{}", line),
        }
    }
}

/// Prints info lines to stdout and everything else to stderr, unadorned.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl LogSink for StdoutSink {
    fn log(&self, level: LogLevel, line: &str) {
        match level {
            LogLevel::Info => {
                let mut out = io::stdout().lock();
                let _ = writeln!(out, "{}", line);
            }
            LogLevel::Warn | LogLevel::Error => eprintln!("{}", line),
        }
    }
}

/// Passes info lines through only from a heading line onward.
///
/// Used to cut the generator list out of `cmake --help`. Warnings and
/// errors always pass.
pub struct SectionSink {
    inner: Arc<dyn LogSink>,
    heading: String,
    started: AtomicBool,
}

impl SectionSink {
    pub fn new(heading: impl Into<String>, inner: Arc<dyn LogSink>) -> Self {
        SectionSink {
            inner,
            heading: heading.into(),
            started: AtomicBool::new(false),
        }
    }

    /// Whether the heading has been seen.
    pub fn started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for SectionSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SectionSink")
            .field("heading", &self.heading)
            .field("started", &self.started())
            .finish()
    }
}

impl LogSink for SectionSink {
    fn log(&self, level: LogLevel, line: &str) {
        if level != LogLevel::Info {
            self.inner.log(level, line);
            return;
        }
        if !self.started() && line.trim() == self.heading {
            self.started.store(true, Ordering::SeqCst);
        }
        if self.started() {
            self.inner.log(level, line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingSink;

    #[test]
    fn test_section_sink_skips_until_heading() {
        let recording = Arc::new(RecordingSink::new());
        let sink = SectionSink::new("Generators", recording.clone());

        sink.info("Usage");
        sink.info("  cmake [options] <path-to-source>");
        sink.error("stderr before heading");
        assert!(!sink.started());

        sink.info("Generators");
        sink.info("  Ninja                        = Generates build.ninja files.");

        assert!(sink.started());
        assert_eq!(
            recording.lines(),
            [
                (LogLevel::Error, "stderr before heading".to_string()),
                (LogLevel::Info, "Generators".to_string()),
                (
                    LogLevel::Info,
                    "  Ninja                        = Generates build.ninja files.".to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_default_methods_route_levels() {
        let recording = RecordingSink::new();
        recording.info("a");
        recording.warn("b");
        recording.error("c");

        let levels: Vec<LogLevel> = recording.lines().into_iter().map(|(l, _)| l).collect();
        assert_eq!(levels, [LogLevel::Info, LogLevel::Warn, LogLevel::Error]);
    }
}
