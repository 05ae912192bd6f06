//! A named group of targets that share one CMake source tree.

use std::path::{Path, PathBuf};

use crate::core::configuration::{Configuration, PROJECT_NAME, TARGET_NAME};
use crate::core::errors::{suggest, ConfigError};
use crate::core::params::{BuildParams, GeneralParams};
use crate::core::preset::PresetRegistry;
use crate::core::target::Target;

/// A project and its targets, in declaration order.
#[derive(Debug, Clone)]
pub struct Project {
    name: String,
    root: PathBuf,
    configuration: Configuration,
    targets: Vec<Target>,
}

impl Project {
    /// Create a project rooted at `root`.
    ///
    /// The project starts with `-S <root>` and a per-target build directory
    /// under `<root>/build/cmake/`.
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let build_dir = default_build_dir(&root);

        let mut configuration = Configuration::new();
        configuration.add_config_params(&GeneralParams {
            source_dir: Some(root.display().to_string()),
            build_dir: Some(build_dir.clone()),
            ..GeneralParams::default()
        });
        configuration.add_build_params(&BuildParams {
            build_dir: Some(build_dir),
            ..BuildParams::default()
        });

        Project {
            name: name.into(),
            root,
            configuration,
            targets: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn configuration_mut(&mut self) -> &mut Configuration {
        &mut self.configuration
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn targets_mut(&mut self) -> impl Iterator<Item = &mut Target> {
        self.targets.iter_mut()
    }

    pub fn target(&self, name: &str) -> Option<&Target> {
        self.targets.iter().find(|t| t.name() == name)
    }

    pub fn target_mut(&mut self, name: &str) -> Option<&mut Target> {
        self.targets.iter_mut().find(|t| t.name() == name)
    }

    /// Look up a target, suggesting close names when it is missing.
    pub fn require_target(&self, name: &str) -> Result<&Target, ConfigError> {
        self.target(name).ok_or_else(|| ConfigError::TargetNotFound {
            name: format!("{}:{}", self.name, name),
            suggestions: suggest(name, self.targets.iter().map(Target::name)),
        })
    }

    /// Get the target `name`, creating it from `preset` first if needed,
    /// then run `configure` on it.
    ///
    /// Calling this again for an existing target only runs `configure`.
    pub fn configure_or_create<F>(
        &mut self,
        presets: &PresetRegistry,
        name: &str,
        preset: &str,
        configure: F,
    ) -> Result<&mut Target, ConfigError>
    where
        F: FnOnce(&mut Target) -> Result<(), ConfigError>,
    {
        let index = match self.targets.iter().position(|t| t.name() == name) {
            Some(index) => {
                let existing = self.targets[index].preset();
                if existing != preset {
                    tracing::warn!(
                        "target `{}:{}` already uses preset `{}`, ignoring `{}`",
                        self.name,
                        name,
                        existing,
                        preset
                    );
                }
                index
            }
            None => {
                let target = presets.create(preset, name)?;
                tracing::debug!("{}: declared target `{}` ({})", self.name, name, preset);
                self.targets.push(target);
                self.targets.len() - 1
            }
        };

        let target = &mut self.targets[index];
        configure(target)?;
        Ok(target)
    }
}

fn default_build_dir(root: &Path) -> String {
    root.join("build")
        .join("cmake")
        .join(PROJECT_NAME)
        .join(TARGET_NAME)
        .display()
        .to_string()
}
