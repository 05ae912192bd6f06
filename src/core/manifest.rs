//! Keel.toml manifest parsing and schema.
//!
//! The manifest declares the root CMake configuration, the projects and
//! their targets. Tables keep their declaration order, which is also the
//! order targets are built in when none are named on the command line.

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::core::errors::ConfigError;
use crate::core::params::{BuildParams, GeneralParams};
use crate::core::target::Target;
use crate::core::workspace::Workspace;
use crate::util::diagnostic::{hints, Diagnostic};

/// Canonical manifest file name.
pub const MANIFEST_NAME: &str = "Keel.toml";

/// Preset used for targets whose name is not itself a preset.
pub const DEFAULT_PRESET: &str = "host";

/// Error locating a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("could not find `Keel.toml` in `{}` or any parent directory", .dir.display())]
    NotFound { dir: PathBuf },
}

impl ManifestError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.to_string()).with_suggestion(hints::NO_MANIFEST)
    }
}

/// Find `Keel.toml` in `start` or the nearest parent directory.
pub fn find_manifest(start: &Path) -> Result<PathBuf, ManifestError> {
    let mut current = start.to_path_buf();
    loop {
        let candidate = current.join(MANIFEST_NAME);
        if candidate.is_file() {
            return Ok(candidate);
        }
        if !current.pop() {
            return Err(ManifestError::NotFound {
                dir: start.to_path_buf(),
            });
        }
    }
}

/// `[workspace]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct WorkspaceSection {
    /// Substituted for `{gradleProjectName}`; defaults to the directory name
    pub name: Option<String>,
}

/// One configuration layer: `[cmake]` or a `[projects.<name>]` table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct LayerSection {
    pub executable: Option<String>,
    pub working_folder: Option<PathBuf>,
    pub config_params: Option<GeneralParams>,
    pub build_params: Option<BuildParams>,
}

/// `[projects.<name>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ProjectSection {
    pub executable: Option<String>,
    pub working_folder: Option<PathBuf>,
    pub config_params: Option<GeneralParams>,
    pub build_params: Option<BuildParams>,

    #[serde(deserialize_with = "ordered_tables")]
    pub targets: Vec<(String, TargetSection)>,
}

/// `[projects.<name>.targets.<target>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct TargetSection {
    pub preset: Option<String>,
    pub executable: Option<String>,
    pub working_folder: Option<PathBuf>,

    pub use_clang: bool,
    pub use_zig: bool,
    pub compiler_target: Option<String>,
    pub linker: Option<String>,
    pub linker_flags: Option<String>,
    pub sysroot: Option<String>,
    pub compiler_flags: Vec<String>,
    pub gcc_install_dir: Option<String>,
    pub gcc_toolchain: Option<String>,

    pub config_params: Option<GeneralParams>,
    pub build_params: Option<BuildParams>,
}

impl TargetSection {
    /// Apply the declared helpers and flags to `target`, in a fixed order.
    pub fn apply(&self, target: &mut Target) -> Result<(), ConfigError> {
        if let Some(ref executable) = self.executable {
            target.set_executable(executable.clone());
        }
        if let Some(ref folder) = self.working_folder {
            target.set_working_folder(folder.clone());
        }

        if self.use_clang {
            target.use_clang();
        }
        if self.use_zig {
            target.use_zig_toolchain();
        }
        if let Some(ref triple) = self.compiler_target {
            target.set_compiler_target(triple);
        }
        if let Some(ref sysroot) = self.sysroot {
            target.set_sysroot(sysroot);
        }
        for flag in &self.compiler_flags {
            target.add_compiler_flag(flag.clone());
        }
        if let Some(ref dir) = self.gcc_install_dir {
            target.set_gcc_install_dir(dir);
        }
        if let Some(ref dir) = self.gcc_toolchain {
            target.set_gcc_toolchain(dir);
        }
        if let Some(ref flags) = self.linker_flags {
            target.set_linker_flags(flags);
        }
        if let Some(ref linker) = self.linker {
            target.force_linker(linker);
        }

        if let Some(ref params) = self.config_params {
            target.config_params(params)?;
        }
        if let Some(ref params) = self.build_params {
            target.build_params(params);
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
struct RawManifest {
    workspace: WorkspaceSection,
    cmake: LayerSection,
    #[serde(deserialize_with = "ordered_tables")]
    projects: Vec<(String, ProjectSection)>,
    properties: BTreeMap<String, String>,
}

/// The parsed Keel.toml manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub workspace: WorkspaceSection,

    /// Root configuration layer
    pub cmake: LayerSection,

    /// Projects in declaration order
    pub projects: Vec<(String, ProjectSection)>,

    /// Auto properties
    pub properties: BTreeMap<String, String>,

    /// The directory containing this manifest
    pub manifest_dir: PathBuf,
}

impl Manifest {
    /// Load a manifest from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;

        Self::parse(&content, path)
    }

    /// Parse manifest content. Relative paths are resolved against the
    /// directory of `path`.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let raw: RawManifest = toml::from_str(content)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        let manifest_dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut manifest = Manifest {
            workspace: raw.workspace,
            cmake: raw.cmake,
            projects: raw.projects,
            properties: raw.properties,
            manifest_dir,
        };
        manifest.resolve_paths();
        Ok(manifest)
    }

    /// Workspace name, falling back to the manifest directory name.
    pub fn name(&self) -> String {
        if let Some(ref name) = self.workspace.name {
            return name.clone();
        }
        self.manifest_dir
            .canonicalize()
            .unwrap_or_else(|_| self.manifest_dir.clone())
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "workspace".to_string())
    }

    /// Build the workspace this manifest declares.
    pub fn into_workspace(self) -> Result<Workspace> {
        let mut ws = Workspace::new(self.name(), self.manifest_dir.clone());

        let root = ws.configuration_mut();
        if let Some(executable) = self.cmake.executable {
            root.executable = Some(executable);
        }
        if let Some(folder) = self.cmake.working_folder {
            root.working_folder = Some(folder);
        }
        if let Some(ref params) = self.cmake.config_params {
            root.add_config_params(params);
        }
        if let Some(ref params) = self.cmake.build_params {
            root.add_build_params(params);
        }

        for (project_name, project) in &self.projects {
            let layer = ws.add_project(project_name).configuration_mut();
            if let Some(ref executable) = project.executable {
                layer.executable = Some(executable.clone());
            }
            if let Some(ref folder) = project.working_folder {
                layer.working_folder = Some(folder.clone());
            }
            if let Some(ref params) = project.config_params {
                layer.add_config_params(params);
            }
            if let Some(ref params) = project.build_params {
                layer.add_build_params(params);
            }

            for (target_name, target) in &project.targets {
                let preset = match target.preset {
                    Some(ref preset) => preset.clone(),
                    None if ws.presets().contains(target_name) => target_name.clone(),
                    None => DEFAULT_PRESET.to_string(),
                };

                ws.configure_target(project_name, target_name, &preset, |t| target.apply(t))
                    .with_context(|| {
                        format!("invalid target `{}:{}`", project_name, target_name)
                    })?;
            }
        }

        for (key, value) in self.properties {
            ws.set_property(key, value);
        }

        Ok(ws)
    }

    fn resolve_paths(&mut self) {
        let dir = self.manifest_dir.clone();

        resolve_layer(
            &dir,
            &mut self.cmake.working_folder,
            &mut self.cmake.config_params,
            &mut self.cmake.build_params,
        );
        for (_, project) in &mut self.projects {
            resolve_layer(
                &dir,
                &mut project.working_folder,
                &mut project.config_params,
                &mut project.build_params,
            );
            for (_, target) in &mut project.targets {
                resolve_layer(
                    &dir,
                    &mut target.working_folder,
                    &mut target.config_params,
                    &mut target.build_params,
                );
            }
        }
    }
}

fn resolve_layer(
    dir: &Path,
    working_folder: &mut Option<PathBuf>,
    config: &mut Option<GeneralParams>,
    build: &mut Option<BuildParams>,
) {
    if let Some(folder) = working_folder.as_mut() {
        if folder.is_relative() {
            *folder = dir.join(&*folder);
        }
    }

    if let Some(params) = config.as_mut() {
        for path in [
            &mut params.source_dir,
            &mut params.build_dir,
            &mut params.toolchain_file,
            &mut params.initial_cache,
            &mut params.install_prefix,
        ] {
            resolve_string(dir, path);
        }
    }
    if let Some(params) = build.as_mut() {
        resolve_string(dir, &mut params.build_dir);
    }
}

fn resolve_string(dir: &Path, value: &mut Option<String>) {
    if let Some(path) = value.as_mut() {
        if Path::new(path.as_str()).is_relative() {
            *path = dir.join(path.as_str()).display().to_string();
        }
    }
}

/// Deserialize a table into `(key, value)` pairs in document order.
fn ordered_tables<'de, D, T>(deserializer: D) -> Result<Vec<(String, T)>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    struct OrderedVisitor<T>(PhantomData<T>);

    impl<'de, T: Deserialize<'de>> Visitor<'de> for OrderedVisitor<T> {
        type Value = Vec<(String, T)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a table")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut entries = Vec::new();
            while let Some(entry) = map.next_entry::<String, T>()? {
                entries.push(entry);
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(OrderedVisitor(PhantomData))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use crate::test_support::has_define;

    const MINIMAL: &str = r#"
[workspace]
name = "demo"

[projects.demo.targets.host]
"#;

    const SAMPLE: &str = r#"
[workspace]
name = "demo"

[cmake]
executable = "/opt/cmake/bin/cmake"

[cmake.config-params]
generator = "Ninja"
entries = { CMAKE_BUILD_TYPE = "Release" }

[projects.native.config-params]
source-dir = "native"
build-dir = "out/{projectName}/{targetName}"

[projects.native.build-params]
build-dir = "out/{projectName}/{targetName}"
parallel = "8"

[projects.native.targets.linuxX64]

[projects.native.targets.arm64]
preset = "androidArm64.clang"
sysroot = "/opt/ndk/sysroot"

[projects.native.targets.arm64.config-params]
remove = ["generator"]
entries = { android-api = "24" }

[projects.tools.targets.tool]

[properties]
"tool.extraCompilerFlags" = "-g"
"#;

    #[test]
    fn test_parse_manifest() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(MANIFEST_NAME);

        let manifest = Manifest::parse(SAMPLE, &path).unwrap();
        assert_eq!(manifest.name(), "demo");
        assert_eq!(manifest.projects.len(), 2);

        let (name, native) = &manifest.projects[0];
        assert_eq!(name, "native");
        let targets: Vec<&str> = native.targets.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(targets, ["linuxX64", "arm64"]);

        let source_dir = native
            .config_params
            .as_ref()
            .and_then(|p| p.source_dir.clone())
            .unwrap();
        assert_eq!(PathBuf::from(source_dir), tmp.path().join("native"));
    }

    #[test]
    fn test_into_workspace() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(MANIFEST_NAME);

        let ws = Manifest::parse(SAMPLE, &path)
            .unwrap()
            .into_workspace()
            .unwrap();
        assert_eq!(ws.name(), "demo");

        let (project, linux) = ws.resolve_target("linuxX64").unwrap();
        assert_eq!(linux.preset(), "linuxX64");
        let configure = ws.final_configuration(project, linux).for_configure();
        assert_eq!(configure.program(), "/opt/cmake/bin/cmake");
        let out_dir = tmp.path().join("out/native/linuxX64").display().to_string();
        assert_eq!(configure.params.find_value("-B"), Some(out_dir));
        assert!(has_define(&configure.args(), "CMAKE_BUILD_TYPE=Release"));

        let (project, arm64) = ws.resolve_target("native:arm64").unwrap();
        let args = ws.final_configuration(project, arm64).for_configure().args();
        assert!(!args.contains(&"Ninja".to_string()));
        assert!(has_define(&args, "CMAKE_ANDROID_API=24"));
        assert!(has_define(&args, "CMAKE_SYSROOT=/opt/ndk/sysroot"));
        assert!(has_define(&args, "CMAKE_C_COMPILER_TARGET=aarch64-linux-android"));

        let build = ws.final_configuration(project, arm64).for_build();
        let arm64_out = tmp.path().join("out/native/arm64").display().to_string();
        assert_eq!(build.args()[..2], ["--build".to_string(), arm64_out]);
        assert!(build.args().contains(&"--parallel".to_string()));

        let (_, tool) = ws.resolve_target("tool").unwrap();
        assert_eq!(tool.preset(), DEFAULT_PRESET);
        assert_eq!(
            ws.properties().get("tool.extraCompilerFlags").map(String::as_str),
            Some("-g")
        );
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let content = r#"
[projects.native.targets.host]
use-clagn = true
"#;
        let err = Manifest::parse(content, Path::new("Keel.toml")).unwrap_err();
        assert!(format!("{:#}", err).contains("use-clagn"));
    }

    #[test]
    fn test_foreign_entry_rejected_with_target_context() {
        let content = r#"
[projects.native.targets.linuxX64.config-params]
entries = { osx-architectures = "arm64" }
"#;
        let err = Manifest::parse(content, Path::new("Keel.toml"))
            .unwrap()
            .into_workspace()
            .unwrap_err();
        assert!(err.to_string().contains("native:linuxX64"));
        assert!(err.downcast_ref::<ConfigError>().is_some());
    }

    #[test]
    fn test_find_manifest_searches_upward() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(tmp.path().join(MANIFEST_NAME), MINIMAL).unwrap();

        assert_eq!(
            find_manifest(&nested).unwrap(),
            tmp.path().join(MANIFEST_NAME)
        );
    }

    #[test]
    fn test_find_manifest_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = find_manifest(tmp.path()).unwrap_err();
        assert!(err.to_diagnostic().format(false).contains("Keel.toml"));
    }

    #[test]
    fn test_minimal_manifest() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(MANIFEST_NAME);
        let ws = Manifest::parse(MINIMAL, &path)
            .unwrap()
            .into_workspace()
            .unwrap();
        assert!(ws.resolve_target("demo:host").is_ok());
    }
}
