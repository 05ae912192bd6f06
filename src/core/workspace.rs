//! Workspace - the root of the configuration hierarchy.
//!
//! A Workspace owns the root configuration layer, the preset registry and
//! every declared project. Final target configurations are always computed
//! from the current state of all three levels.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::core::configuration::{Configuration, Placeholders, DEFAULT_EXECUTABLE};
use crate::core::errors::{suggest, ConfigError};
use crate::core::manifest::Manifest;
use crate::core::preset::PresetRegistry;
use crate::core::project::Project;
use crate::core::target::Target;

/// A workspace containing every project and the shared root configuration.
#[derive(Debug)]
pub struct Workspace {
    /// Substituted for `{gradleProjectName}`
    name: String,

    /// Directory holding the manifest
    root: PathBuf,

    /// Root configuration layer
    configuration: Configuration,

    projects: Vec<Project>,

    presets: PresetRegistry,

    /// Auto properties such as `<target>.sysRoot`
    properties: BTreeMap<String, String>,
}

impl Workspace {
    /// Create an empty workspace rooted at `root`.
    ///
    /// The root layer runs `cmake` from `<root>/build/cmake`.
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let configuration = Configuration::new()
            .with_executable(DEFAULT_EXECUTABLE)
            .with_working_folder(root.join("build").join("cmake"));

        Workspace {
            name: name.into(),
            root,
            configuration,
            projects: Vec::new(),
            presets: PresetRegistry::with_builtins(),
            properties: BTreeMap::new(),
        }
    }

    /// Load a workspace from a manifest path.
    pub fn load(manifest_path: &Path) -> Result<Self> {
        let manifest = Manifest::load(manifest_path)?;
        manifest.into_workspace()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the workspace root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn configuration_mut(&mut self) -> &mut Configuration {
        &mut self.configuration
    }

    pub fn presets(&self) -> &PresetRegistry {
        &self.presets
    }

    pub fn presets_mut(&mut self) -> &mut PresetRegistry {
        &mut self.presets
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn project(&self, name: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.name() == name)
    }

    pub fn project_mut(&mut self, name: &str) -> Option<&mut Project> {
        self.projects.iter_mut().find(|p| p.name() == name)
    }

    /// Get or create the project `name`, rooted at the workspace root.
    pub fn add_project(&mut self, name: &str) -> &mut Project {
        let index = match self.projects.iter().position(|p| p.name() == name) {
            Some(index) => index,
            None => {
                self.projects.push(Project::new(name, self.root.clone()));
                self.projects.len() - 1
            }
        };
        &mut self.projects[index]
    }

    /// Get or create a target of `project` and run `configure` on it.
    pub fn configure_target<F>(
        &mut self,
        project: &str,
        name: &str,
        preset: &str,
        configure: F,
    ) -> Result<&mut Target, ConfigError>
    where
        F: FnOnce(&mut Target) -> Result<(), ConfigError>,
    {
        let Workspace {
            root,
            projects,
            presets,
            ..
        } = self;

        let index = match projects.iter().position(|p| p.name() == project) {
            Some(index) => index,
            None => {
                projects.push(Project::new(project, root.clone()));
                projects.len() - 1
            }
        };
        projects[index].configure_or_create(presets, name, preset, configure)
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    /// Parse and set a `key=value` property.
    pub fn set_property_arg(&mut self, arg: &str) -> Result<(), ConfigError> {
        let (key, value) = arg
            .split_once('=')
            .filter(|(key, _)| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::InvalidProperty(arg.to_string()))?;
        self.set_property(key.trim(), value);
        Ok(())
    }

    /// Apply auto properties to every declared target.
    pub fn apply_properties(&mut self) {
        let Workspace {
            projects,
            properties,
            ..
        } = self;

        for target in projects.iter_mut().flat_map(Project::targets_mut) {
            target.apply_properties(properties);
        }
    }

    /// Every target paired with its project, in declaration order.
    pub fn targets(&self) -> impl Iterator<Item = (&Project, &Target)> {
        self.projects
            .iter()
            .flat_map(|p| p.targets().iter().map(move |t| (p, t)))
    }

    /// Resolve `project:target`, or `target` when the name is unique.
    pub fn resolve_target(&self, spec: &str) -> Result<(&Project, &Target), ConfigError> {
        if let Some((project, target)) = spec.split_once(':') {
            let project = self
                .project(project)
                .ok_or_else(|| ConfigError::ProjectNotFound {
                    name: project.to_string(),
                    suggestions: suggest(project, self.projects.iter().map(Project::name)),
                })?;
            return Ok((project, project.require_target(target)?));
        }

        let matches: Vec<(&Project, &Target)> =
            self.targets().filter(|(_, t)| t.name() == spec).collect();

        match matches.as_slice() {
            [found] => Ok(*found),
            [] => Err(ConfigError::TargetNotFound {
                name: spec.to_string(),
                suggestions: suggest(spec, self.targets().map(|(_, t)| t.name())),
            }),
            _ => Err(ConfigError::AmbiguousTarget {
                name: spec.to_string(),
                projects: matches.iter().map(|(p, _)| p.name().to_string()).collect(),
            }),
        }
    }

    /// Effective configuration of `target` in `project`.
    ///
    /// Layers are applied root, project, target; placeholders are
    /// substituted last.
    pub fn final_configuration(&self, project: &Project, target: &Target) -> Configuration {
        let names = Placeholders {
            workspace: &self.name,
            project: project.name(),
            target: target.name(),
        };
        target.final_configuration(&[&self.configuration, project.configuration()], &names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::params::GeneralParams;
    use crate::test_support::has_define;

    fn sample() -> Workspace {
        let mut ws = Workspace::new("demo", "/ws");
        ws.configure_target("native", "arm64", "androidArm64", |_| Ok(()))
            .unwrap();
        ws.configure_target("native", "linux", "linuxX64", |_| Ok(()))
            .unwrap();
        ws.configure_target("tools", "linux", "host", |_| Ok(()))
            .unwrap();
        ws
    }

    #[test]
    fn test_workspace_defaults() {
        let ws = Workspace::new("demo", "/ws");
        assert_eq!(ws.configuration().executable.as_deref(), Some("cmake"));
        assert_eq!(
            ws.configuration().working_folder,
            Some(PathBuf::from("/ws/build/cmake"))
        );
    }

    #[test]
    fn test_resolve_target() {
        let ws = sample();

        let (project, target) = ws.resolve_target("arm64").unwrap();
        assert_eq!((project.name(), target.name()), ("native", "arm64"));

        let (project, _) = ws.resolve_target("tools:linux").unwrap();
        assert_eq!(project.name(), "tools");

        match ws.resolve_target("linux").unwrap_err() {
            ConfigError::AmbiguousTarget { projects, .. } => {
                assert_eq!(projects, ["native", "tools"]);
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(matches!(
            ws.resolve_target("nativ:arm64"),
            Err(ConfigError::ProjectNotFound { .. })
        ));
        assert!(matches!(
            ws.resolve_target("arm46"),
            Err(ConfigError::TargetNotFound { .. })
        ));
    }

    #[test]
    fn test_targets_in_declaration_order() {
        let ws = sample();
        let order: Vec<String> = ws
            .targets()
            .map(|(p, t)| format!("{}:{}", p.name(), t.name()))
            .collect();
        assert_eq!(order, ["native:arm64", "native:linux", "tools:linux"]);
    }

    #[test]
    fn test_final_configuration_layers() {
        let mut ws = sample();
        ws.configuration_mut().add_config_params(&GeneralParams {
            generator: Some("Unix Makefiles".into()),
            fresh: Some(true),
            ..GeneralParams::default()
        });
        ws.project_mut("native")
            .unwrap()
            .configuration_mut()
            .add_config_params(&GeneralParams {
                build_dir: Some("/out/{gradleProjectName}/{targetName}".into()),
                ..GeneralParams::default()
            });

        let (project, target) = ws.resolve_target("native:arm64").unwrap();
        let configure = ws.final_configuration(project, target).for_configure();

        assert_eq!(configure.program(), "cmake");
        assert_eq!(
            configure.working_folder,
            Some(PathBuf::from("/ws/build/cmake"))
        );
        assert_eq!(
            configure.args(),
            [
                "--fresh",
                "-S",
                "/ws",
                "-B",
                "/out/demo/arm64",
                "-G",
                "Ninja",
                "-D",
                "CMAKE_SYSTEM_NAME=Android",
                "-D",
                "CMAKE_ANDROID_ARCH_ABI=arm64-v8a"
            ]
        );
    }

    #[test]
    fn test_properties() {
        let mut ws = sample();
        ws.set_property_arg("arm64.sysRoot=/opt/ndk/sysroot").unwrap();
        assert!(matches!(
            ws.set_property_arg("novalue"),
            Err(ConfigError::InvalidProperty(_))
        ));
        ws.apply_properties();

        let (project, target) = ws.resolve_target("arm64").unwrap();
        let args = ws.final_configuration(project, target).for_configure().args();
        assert!(has_define(&args, "CMAKE_SYSROOT=/opt/ndk/sysroot"));
    }

    #[test]
    fn test_load_from_manifest() {
        use crate::core::MANIFEST_NAME;
        use crate::test_support::{create_test_workspace, manifests};

        let tmp = create_test_workspace(&manifests::single_target("native", "arm", "linuxArm64"));
        let ws = Workspace::load(&tmp.path().join(MANIFEST_NAME)).unwrap();

        let (project, target) = ws.resolve_target("native:arm").unwrap();
        assert_eq!(target.preset(), "linuxArm64");
        assert_eq!(project.root(), tmp.path());

        let config = ws.final_configuration(project, target);
        assert_eq!(config.executable.as_deref(), Some("cmake"));
        let args = config.for_configure().args();
        assert!(has_define(&args, "CMAKE_SYSTEM_PROCESSOR=aarch64"));
    }

    #[test]
    fn test_load_with_executable() {
        use crate::core::MANIFEST_NAME;
        use crate::test_support::{create_test_workspace, manifests};

        let tmp = create_test_workspace(&manifests::with_executable(
            "/opt/cmake/bin/cmake",
            "native",
            "host",
        ));
        let ws = Workspace::load(&tmp.path().join(MANIFEST_NAME)).unwrap();

        let (project, target) = ws.resolve_target("host").unwrap();
        assert_eq!(target.preset(), "host");
        let execution = ws.final_configuration(project, target).for_build();
        assert_eq!(execution.program(), "/opt/cmake/bin/cmake");
    }
}
