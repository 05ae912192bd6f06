//! CMake task execution.
//!
//! This module turns final target configurations into runnable CMake tasks.

pub mod cmake;

pub use cmake::{task_name, ActionError, CMakeTask, TaskKind};
