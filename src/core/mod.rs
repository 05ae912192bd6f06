//! Core data structures for Keel.
//!
//! This module contains the configuration model:
//! - Mergeable flag families and cache entries
//! - Layered configurations and placeholder substitution
//! - The workspace → project → target hierarchy and its presets
//! - The Keel.toml manifest

pub mod configuration;
pub mod errors;
pub mod manifest;
pub mod params;
pub mod platform;
pub mod preset;
pub mod project;
pub mod target;
pub mod workspace;

pub use configuration::{Configuration, ExecutionConfiguration, Placeholders};
pub use errors::ConfigError;
pub use manifest::{find_manifest, Manifest, ManifestError, MANIFEST_NAME};
pub use params::{BuildParams, CacheEntries, EntryKey, GeneralParams, ParamSet, Params};
pub use platform::Platform;
pub use preset::PresetRegistry;
pub use project::Project;
pub use target::Target;
pub use workspace::Workspace;
