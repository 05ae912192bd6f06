//! Shared utilities

pub mod args;
pub mod diagnostic;
pub mod fs;
pub mod process;
pub mod shell;
pub mod sink;

pub use diagnostic::Diagnostic;
pub use process::{ExecOptions, ProcessBuilder, ProcessError};
pub use shell::Shell;
pub use sink::{LogLevel, LogSink, TracingSink};
