//! Test utilities for Keel unit tests.
//!
//! Provides a sink that records every line it receives, stub executables
//! for the process executor, and helpers for throwaway workspaces.
//!
//! # Example
//!
//! ```rust,ignore
//! use keel::test_support::{write_stub_script, RecordingSink};
//!
//! #[test]
//! fn test_example() {
//!     let tmp = tempfile::TempDir::new().unwrap();
//!     let stub = write_stub_script(tmp.path(), "tool", "echo hello");
//!     let sink = std::sync::Arc::new(RecordingSink::new());
//!     // Run `stub` through the executor with `sink`...
//! }
//! ```

pub mod fixtures;

use std::sync::Mutex;

use crate::util::sink::{LogLevel, LogSink};

pub use fixtures::*;

/// Sink that keeps every line for later assertions.
#[derive(Debug, Default)]
pub struct RecordingSink {
    lines: Mutex<Vec<(LogLevel, String)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every recorded line, in arrival order.
    pub fn lines(&self) -> Vec<(LogLevel, String)> {
        self.lines.lock().expect("recording sink poisoned").clone()
    }

    /// Recorded lines of one level.
    pub fn lines_at(&self, level: LogLevel) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, line)| line)
            .collect()
    }
}

impl LogSink for RecordingSink {
    fn log(&self, level: LogLevel, line: &str) {
        self.lines
            .lock()
            .expect("recording sink poisoned")
            .push((level, line.to_string()));
    }
}

/// Whether `args` holds `-D` directly followed by `define`.
pub fn has_define(args: &[String], define: &str) -> bool {
    args.windows(2)
        .any(|pair| pair[0] == "-D" && pair[1] == define)
}

/// Helper to create a temporary workspace with a Keel.toml.
///
/// Returns the TempDir handle - dropping it will clean up the directory.
pub fn create_test_workspace(manifest: &str) -> tempfile::TempDir {
    let tmp = tempfile::TempDir::new().expect("failed to create temp dir");
    let manifest_path = tmp.path().join(crate::core::MANIFEST_NAME);
    std::fs::write(&manifest_path, manifest).expect("failed to write manifest");

    tmp
}
