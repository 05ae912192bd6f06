//! Layered configuration.
//!
//! Every level of the hierarchy (workspace, project, target) owns a
//! [`Configuration`]. The effective configuration of a target is the ordered
//! fold of those layers: the last executable and working folder win, and
//! flag sets merge left to right. Placeholders are substituted afterwards.

use std::path::PathBuf;

use crate::core::params::{ParamSet, Params};
use crate::util::args::escape_xsi;

/// Replaced by the workspace name.
pub const WORKSPACE_NAME: &str = "{gradleProjectName}";
/// Replaced by the project name.
pub const PROJECT_NAME: &str = "{projectName}";
/// Replaced by the target name.
pub const TARGET_NAME: &str = "{targetName}";

/// Executable used when no layer names one.
pub const DEFAULT_EXECUTABLE: &str = "cmake";

/// One layer of configuration. Every part is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Configuration {
    pub executable: Option<String>,
    pub working_folder: Option<PathBuf>,
    pub config_params: Option<Params>,
    pub build_params: Option<Params>,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_executable(mut self, executable: impl Into<String>) -> Self {
        self.executable = Some(executable.into());
        self
    }

    pub fn with_working_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.working_folder = Some(folder.into());
        self
    }

    /// Layer a flag set on top of this level's configure flags.
    pub fn add_config_params<P: ParamSet + ?Sized>(&mut self, params: &P) -> &mut Self {
        self.config_params = Some(merge_optional(self.config_params.as_ref(), params));
        self
    }

    /// Layer a flag set on top of this level's build flags.
    pub fn add_build_params<P: ParamSet + ?Sized>(&mut self, params: &P) -> &mut Self {
        self.build_params = Some(merge_optional(self.build_params.as_ref(), params));
        self
    }

    /// `self` overridden by `other`.
    pub fn overlay(&self, other: &Configuration) -> Configuration {
        Configuration {
            executable: other.executable.clone().or_else(|| self.executable.clone()),
            working_folder: other
                .working_folder
                .clone()
                .or_else(|| self.working_folder.clone()),
            config_params: merge_params(&self.config_params, &other.config_params),
            build_params: merge_params(&self.build_params, &other.build_params),
        }
    }

    /// Fold layers in order; later layers override earlier ones.
    pub fn compose<'a, I>(layers: I) -> Configuration
    where
        I: IntoIterator<Item = &'a Configuration>,
    {
        layers
            .into_iter()
            .fold(Configuration::default(), |acc, layer| acc.overlay(layer))
    }

    /// Substitute placeholders in both flag sets.
    pub fn substitute(&self, placeholders: &Placeholders<'_>) -> Configuration {
        Configuration {
            executable: self.executable.clone(),
            working_folder: self.working_folder.clone(),
            config_params: self.config_params.as_ref().map(|p| placeholders.apply(p)),
            build_params: self.build_params.as_ref().map(|p| placeholders.apply(p)),
        }
    }

    /// Project onto the configure step.
    pub fn for_configure(&self) -> ExecutionConfiguration {
        ExecutionConfiguration {
            executable: self.executable.clone(),
            working_folder: self.working_folder.clone(),
            params: self.config_params.clone().unwrap_or_default(),
        }
    }

    /// Project onto the build step.
    pub fn for_build(&self) -> ExecutionConfiguration {
        ExecutionConfiguration {
            executable: self.executable.clone(),
            working_folder: self.working_folder.clone(),
            params: self.build_params.clone().unwrap_or_default(),
        }
    }
}

fn merge_optional<P: ParamSet + ?Sized>(existing: Option<&Params>, params: &P) -> Params {
    match existing {
        Some(existing) => existing.merge_set(params),
        None => params.to_params(),
    }
}

fn merge_params(a: &Option<Params>, b: &Option<Params>) -> Option<Params> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.merge(b)),
        (Some(p), None) | (None, Some(p)) => Some(p.clone()),
        (None, None) => None,
    }
}

/// Names substituted into rendered flags.
#[derive(Debug, Clone, Copy)]
pub struct Placeholders<'a> {
    pub workspace: &'a str,
    pub project: &'a str,
    pub target: &'a str,
}

impl Placeholders<'_> {
    /// Substitute the names into rendered flags.
    ///
    /// Names are XSI-escaped so one with a space or quote stays inside its
    /// argument, quoted or not, when the flags are split.
    pub fn apply(&self, params: &Params) -> Params {
        params
            .replace_with(WORKSPACE_NAME, &escape_xsi(self.workspace))
            .replace_with(PROJECT_NAME, &escape_xsi(self.project))
            .replace_with(TARGET_NAME, &escape_xsi(self.target))
    }
}

/// A fully resolved invocation: program, working folder and flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionConfiguration {
    pub executable: Option<String>,
    pub working_folder: Option<PathBuf>,
    pub params: Params,
}

impl ExecutionConfiguration {
    pub fn program(&self) -> &str {
        self.executable.as_deref().unwrap_or(DEFAULT_EXECUTABLE)
    }

    pub fn args(&self) -> Vec<String> {
        self.params.to_args()
    }

    /// Program followed by its arguments.
    pub fn command_line(&self) -> Vec<String> {
        let mut line = vec![self.program().to_string()];
        line.extend(self.args());
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::params::{BuildParams, GeneralParams};

    fn layer(executable: Option<&str>, flags: &[&str]) -> Configuration {
        let mut config = Configuration::new();
        config.executable = executable.map(str::to_string);
        config.add_config_params(&Params::raw(flags.iter().copied()));
        config
    }

    #[test]
    fn test_compose_last_non_null_wins() {
        let root = Configuration::new()
            .with_executable("cmake")
            .with_working_folder("/ws/build/cmake");
        let target = Configuration::new().with_executable("/opt/cmake/bin/cmake");

        let composed = Configuration::compose([&root, &Configuration::new(), &target]);
        assert_eq!(composed.executable.as_deref(), Some("/opt/cmake/bin/cmake"));
        assert_eq!(
            composed.working_folder,
            Some(PathBuf::from("/ws/build/cmake"))
        );
        assert_eq!(composed.config_params, None);
    }

    #[test]
    fn test_compose_of_nothing_is_empty() {
        assert_eq!(
            Configuration::compose(std::iter::empty()),
            Configuration::default()
        );
    }

    #[test]
    fn test_compose_is_associative() {
        let mut a = Configuration::new().with_executable("cmake");
        a.add_config_params(&GeneralParams {
            generator: Some("Ninja".into()),
            fresh: Some(true),
            ..GeneralParams::default()
        });
        let mut b = layer(None, &["--trace"]);
        b.add_config_params(&GeneralParams {
            generator: Some("Unix Makefiles".into()),
            ..GeneralParams::default()
        });
        let mut c = Configuration::new();
        let mut removal = GeneralParams::new();
        removal.mark_removed(crate::core::params::GeneralField::Fresh);
        c.add_config_params(&removal);

        let left = a.overlay(&b).overlay(&c);
        let right = a.overlay(&b.overlay(&c));
        assert_eq!(left, right);
        assert_eq!(Configuration::compose([&a, &b, &c]), left);
        assert_eq!(
            left.for_configure().args(),
            ["--trace", "-G", "Unix Makefiles"]
        );
    }

    #[test]
    fn test_add_params_merges_within_a_layer() {
        let mut config = Configuration::new();
        config.add_config_params(&GeneralParams {
            generator: Some("Ninja".into()),
            ..GeneralParams::default()
        });
        config.add_config_params(&GeneralParams {
            generator: Some("Xcode".into()),
            ..GeneralParams::default()
        });
        assert_eq!(config.for_configure().args(), ["-G", "Xcode"]);
    }

    #[test]
    fn test_placeholder_substitution() {
        let mut config = Configuration::new();
        config.add_config_params(&Params::raw([
            "-DFOO={targetName}",
            "-B \"/b/{gradleProjectName}/{projectName}/{targetName}\"",
        ]));

        let resolved = config.substitute(&Placeholders {
            workspace: "ws",
            project: "native",
            target: "arm64",
        });
        let args = resolved.for_configure().args();
        assert_eq!(args, ["-D", "FOO=arm64", "-B", "/b/ws/native/arm64"]);
        assert!(args.iter().all(|arg| !arg.contains("{targetName}")));
    }

    #[test]
    fn test_placeholder_names_stay_one_argument() {
        let mut config = Configuration::new();
        config.add_config_params(&Params::raw([
            "-DFOO={targetName}",
            "-B \"/b/{projectName}/{targetName}\"",
            "-C {projectName}.cmake",
        ]));

        let resolved = config.substitute(&Placeholders {
            workspace: "ws",
            project: "my \"native\"",
            target: "arm 64",
        });
        assert_eq!(
            resolved.for_configure().args(),
            [
                "-D",
                "FOO=arm 64",
                "-B",
                "/b/my \"native\"/arm 64",
                "-C",
                "my \"native\".cmake"
            ]
        );
    }

    #[test]
    fn test_for_build_uses_build_params() {
        let mut config = Configuration::new().with_working_folder("/w");
        config.add_config_params(&Params::raw(["--fresh"]));
        config.add_build_params(&BuildParams {
            build_dir: Some("/b".into()),
            ..BuildParams::default()
        });

        let build = config.for_build();
        assert_eq!(build.command_line(), ["cmake", "--build", "/b"]);
        assert_eq!(build.working_folder, Some(PathBuf::from("/w")));
    }
}
