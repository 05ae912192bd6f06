//! Keel - a composable CMake configure/build driver
//!
//! This crate provides the core library functionality for Keel: mergeable
//! CMake flag sets, layered configuration across a workspace, its projects
//! and their targets, target presets, and a streaming process executor.

pub mod builder;
pub mod core;
pub mod util;

/// Test utilities for Keel unit tests.
///
/// This module is only available when compiling with `--cfg test`. It
/// provides a recording log sink and stub executables.
#[cfg(test)]
pub mod test_support;

pub use builder::{ActionError, CMakeTask};
pub use core::{
    configuration::Configuration, errors::ConfigError, project::Project, target::Target,
    workspace::Workspace,
};
