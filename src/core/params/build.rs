//! Build-step flags (`cmake --build ..`).

use std::collections::BTreeSet;

use serde::Deserialize;

use super::general::{push_equals, push_switch, push_switch_with_value, push_value};
use super::{field_identities, Identity, ParamField, ParamSet};
use crate::core::errors::ConfigError;
use crate::util::args::quote_for_shell;

param_fields! {
    /// Fields of [`BuildParams`], in render order.
    pub enum BuildField ("build") {
        BuildDir => "build-dir", r"--build\s+.+";
        Preset => "preset", r"--preset(=|\s+).+";
        ListPresets => "list-presets", "--list-presets(=.*)?";
        ListPresetsType => "list-presets-type", "--list-presets(=.*)?";
        Parallel => "parallel", r"--parallel(\s+.+)?";
        Target => "target", r"--target\s+.+";
        Config => "config", r"--config\s+.+";
        CleanFirst => "clean-first", "--clean-first";
        ResolvePackageReferences => "resolve-package-references", "--resolve-package-references=.*";
        Verbose => "verbose", "--verbose";
        NativeOptions => "native-options", r"--(\s+.*)?";
    }
}

/// Flags for the build step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct BuildParams {
    pub build_dir: Option<String>,
    pub preset: Option<String>,
    pub list_presets: Option<bool>,
    pub list_presets_type: Option<String>,
    /// Job count. An empty string renders a bare `--parallel`.
    pub parallel: Option<String>,
    pub target: Option<String>,
    pub config: Option<String>,
    pub clean_first: Option<bool>,
    pub resolve_package_references: Option<String>,
    pub verbose: Option<bool>,
    /// Passed to the native build tool after `--`.
    pub native_options: Option<Vec<String>>,

    pub args: Vec<String>,

    #[serde(rename = "remove")]
    pub removed: BTreeSet<BuildField>,
}

impl BuildParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_removed(&mut self, field: BuildField) -> &mut Self {
        self.removed.insert(field);
        self
    }

    pub fn mark_removed_by_name(&mut self, name: &str) -> Result<&mut Self, ConfigError> {
        let field = BuildField::from_name(name)?;
        Ok(self.mark_removed(field))
    }

    fn is_set(&self, field: BuildField) -> bool {
        match field {
            BuildField::BuildDir => self.build_dir.is_some(),
            BuildField::Preset => self.preset.is_some(),
            BuildField::ListPresets => self.list_presets.is_some(),
            BuildField::ListPresetsType => self.list_presets_type.is_some(),
            BuildField::Parallel => self.parallel.is_some(),
            BuildField::Target => self.target.is_some(),
            BuildField::Config => self.config.is_some(),
            BuildField::CleanFirst => self.clean_first.is_some(),
            BuildField::ResolvePackageReferences => self.resolve_package_references.is_some(),
            BuildField::Verbose => self.verbose.is_some(),
            BuildField::NativeOptions => self.native_options.is_some(),
        }
    }
}

impl ParamSet for BuildParams {
    fn render(&self) -> Vec<String> {
        let mut out = Vec::new();

        push_value(&mut out, "--build", &self.build_dir);
        push_value(&mut out, "--preset", &self.preset);
        push_switch_with_value(
            &mut out,
            "--list-presets",
            self.list_presets,
            &self.list_presets_type,
        );
        match self.parallel.as_deref() {
            Some("") => out.push("--parallel".to_string()),
            Some(jobs) => out.push(format!("--parallel {}", quote_for_shell(jobs))),
            None => {}
        }
        push_value(&mut out, "--target", &self.target);
        push_value(&mut out, "--config", &self.config);
        push_switch(&mut out, "--clean-first", self.clean_first);
        push_equals(
            &mut out,
            "--resolve-package-references",
            &self.resolve_package_references,
        );
        push_switch(&mut out, "--verbose", self.verbose);
        out.extend(self.args.iter().cloned());

        if let Some(options) = self.native_options.as_ref().filter(|o| !o.is_empty()) {
            let quoted: Vec<String> = options.iter().map(|o| quote_for_shell(o)).collect();
            out.push(format!("-- {}", quoted.join(" ")));
        }

        out
    }

    fn identities(&self) -> BTreeSet<Identity> {
        field_identities(|field| self.is_set(field), &self.removed)
    }
}
