//! Configure-step flags (`cmake -S .. -B ..`).

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer};

use super::entries::{resolve_entry_key, CacheEntries};
use super::{field_identities, Identity, ParamField, ParamSet};
use crate::core::errors::ConfigError;
use crate::util::args::quote_for_shell;

param_fields! {
    /// Fields of [`GeneralParams`], in render order.
    pub enum GeneralField ("configure") {
        SourceDir => "source-dir", r"-S\s+.+";
        BuildDir => "build-dir", r"-B\s+.+";
        InitialCache => "initial-cache", r"-C\s+.+";
        Generator => "generator", r"-G\s+.+";
        Toolset => "toolset", r"-T\s+.+";
        Platform => "platform", r"-A\s+.+";
        ToolchainFile => "toolchain-file", r"--toolchain\s+.+";
        InstallPrefix => "install-prefix", r"--install-prefix\s+.+";
        DeveloperWarnings => "developer-warnings", "-Wdev";
        NoDeveloperWarnings => "no-developer-warnings", "-Wno-dev";
        DeveloperWarningsAsErrors => "developer-warnings-as-errors", "-Werror=dev";
        NoDeveloperWarningsAsErrors => "no-developer-warnings-as-errors", "-Wno-error=dev";
        DeprecatedWarnings => "deprecated-warnings", "-Wdeprecated";
        NoDeprecatedWarnings => "no-deprecated-warnings", "-Wno-deprecated";
        DeprecatedWarningsAsErrors => "deprecated-warnings-as-errors", "-Werror=deprecated";
        NoDeprecatedWarningsAsErrors => "no-deprecated-warnings-as-errors", "-Wno-error=deprecated";
        Preset => "preset", r"--preset(=|\s+).+";
        ListPresets => "list-presets", "--list-presets(=.*)?";
        ListPresetsType => "list-presets-type", "--list-presets(=.*)?";
        CommandMode => "command-mode", "-E";
        ListCache => "list-cache", "-LA?H?";
        ListCacheAdvanced => "list-cache-advanced", "-LA?H?";
        ListCacheHelp => "list-cache-help", "-LA?H?";
        Fresh => "fresh", "--fresh";
        Build => "build", r"--build\s+.+";
        Install => "install", r"--install\s+.+";
        Open => "open", r"--open\s+.+";
        ViewModeOnly => "view-mode-only", "-N";
        Script => "script", r"-P\s+.+";
        FindPackage => "find-package", "--find-package";
        Graphviz => "graphviz", "--graphviz=.*";
        SystemInformation => "system-information", "--system-information(=.*)?";
        SystemInformationFile => "system-information-file", "--system-information(=.*)?";
        LogLevel => "log-level", "--log-level=.*";
        LogContext => "log-context", "--log-context";
        DebugTrycompile => "debug-trycompile", "--debug-trycompile";
        DebugOutput => "debug-output", "--debug-output";
        DebugFind => "debug-find", "--debug-find";
        DebugFindPkg => "debug-find-pkg", "--debug-find-pkg=.*";
        DebugFindVar => "debug-find-var", "--debug-find-var=.*";
        Trace => "trace", "--trace";
        TraceExpand => "trace-expand", "--trace-expand";
        TraceFormat => "trace-format", "--trace-format=.*";
        TraceSource => "trace-source", "--trace-source=.*";
        TraceRedirect => "trace-redirect", "--trace-redirect=.*";
        WarnUninitialized => "warn-uninitialized", "--warn-uninitialized";
        NoWarnUnusedCli => "no-warn-unused-cli", "--no-warn-unused-cli";
        CheckSystemVars => "check-system-vars", "--check-system-vars";
        CompileNoWarningAsError => "compile-no-warning-as-error", "--compile-no-warning-as-error";
        ProfilingFormat => "profiling-format", "--profiling-format=.*";
        ProfilingOutput => "profiling-output", "--profiling-output=.*";
        Entries => "entries", "-D.*";
    }
}

/// Flags for the configure step.
///
/// Every field left at `None` renders nothing and removes nothing. A field
/// set to any value, `Some(false)` included, replaces the same flag from
/// earlier layers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct GeneralParams {
    pub source_dir: Option<String>,
    pub build_dir: Option<String>,
    pub initial_cache: Option<String>,
    pub generator: Option<String>,
    pub toolset: Option<String>,
    pub platform: Option<String>,
    pub toolchain_file: Option<String>,
    pub install_prefix: Option<String>,

    pub developer_warnings: Option<bool>,
    pub no_developer_warnings: Option<bool>,
    pub developer_warnings_as_errors: Option<bool>,
    pub no_developer_warnings_as_errors: Option<bool>,
    pub deprecated_warnings: Option<bool>,
    pub no_deprecated_warnings: Option<bool>,
    pub deprecated_warnings_as_errors: Option<bool>,
    pub no_deprecated_warnings_as_errors: Option<bool>,

    pub preset: Option<String>,
    /// `--list-presets`, optionally narrowed by `list_presets_type`.
    pub list_presets: Option<bool>,
    pub list_presets_type: Option<String>,
    pub command_mode: Option<bool>,
    /// `-L`, extended to `-LA`, `-LH` or `-LAH` by the two modifiers.
    pub list_cache: Option<bool>,
    pub list_cache_advanced: Option<bool>,
    pub list_cache_help: Option<bool>,
    pub fresh: Option<bool>,
    pub build: Option<String>,
    pub install: Option<String>,
    pub open: Option<String>,
    pub view_mode_only: Option<bool>,
    pub script: Option<String>,
    pub find_package: Option<bool>,
    pub graphviz: Option<String>,
    pub system_information: Option<bool>,
    pub system_information_file: Option<String>,
    pub log_level: Option<String>,
    pub log_context: Option<bool>,
    pub debug_trycompile: Option<bool>,
    pub debug_output: Option<bool>,
    pub debug_find: Option<bool>,
    pub debug_find_pkg: Option<String>,
    pub debug_find_var: Option<String>,
    pub trace: Option<bool>,
    pub trace_expand: Option<bool>,
    pub trace_format: Option<String>,
    pub trace_source: Option<String>,
    pub trace_redirect: Option<String>,
    pub warn_uninitialized: Option<bool>,
    pub no_warn_unused_cli: Option<bool>,
    pub check_system_vars: Option<bool>,
    pub compile_no_warning_as_error: Option<bool>,
    pub profiling_format: Option<String>,
    pub profiling_output: Option<String>,

    /// `-D<KEY>=<value>` cache entries.
    pub entries: Option<CacheEntries>,

    /// Cache keys to strip from earlier layers.
    #[serde(deserialize_with = "deserialize_entry_keys")]
    pub remove_entries: BTreeSet<String>,

    /// Extra flags rendered verbatim after everything else.
    pub args: Vec<String>,

    /// Fields whose flags are stripped from earlier layers.
    #[serde(rename = "remove")]
    pub removed: BTreeSet<GeneralField>,
}

impl GeneralParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Strip `field` from earlier layers even when this set leaves it unset.
    pub fn mark_removed(&mut self, field: GeneralField) -> &mut Self {
        self.removed.insert(field);
        self
    }

    pub fn mark_removed_by_name(&mut self, name: &str) -> Result<&mut Self, ConfigError> {
        let field = GeneralField::from_name(name)?;
        Ok(self.mark_removed(field))
    }

    /// Cache entries of this set, created on first use.
    pub fn entries_mut(&mut self) -> &mut CacheEntries {
        self.entries.get_or_insert_with(CacheEntries::new)
    }

    /// Strip one cache entry from earlier layers.
    pub fn remove_entry(&mut self, key: impl Into<String>) -> &mut Self {
        self.remove_entries.insert(key.into());
        self
    }

    fn is_set(&self, field: GeneralField) -> bool {
        use GeneralField::*;

        match field {
            SourceDir => self.source_dir.is_some(),
            BuildDir => self.build_dir.is_some(),
            InitialCache => self.initial_cache.is_some(),
            Generator => self.generator.is_some(),
            Toolset => self.toolset.is_some(),
            Platform => self.platform.is_some(),
            ToolchainFile => self.toolchain_file.is_some(),
            InstallPrefix => self.install_prefix.is_some(),
            DeveloperWarnings => self.developer_warnings.is_some(),
            NoDeveloperWarnings => self.no_developer_warnings.is_some(),
            DeveloperWarningsAsErrors => self.developer_warnings_as_errors.is_some(),
            NoDeveloperWarningsAsErrors => self.no_developer_warnings_as_errors.is_some(),
            DeprecatedWarnings => self.deprecated_warnings.is_some(),
            NoDeprecatedWarnings => self.no_deprecated_warnings.is_some(),
            DeprecatedWarningsAsErrors => self.deprecated_warnings_as_errors.is_some(),
            NoDeprecatedWarningsAsErrors => self.no_deprecated_warnings_as_errors.is_some(),
            Preset => self.preset.is_some(),
            ListPresets => self.list_presets.is_some(),
            ListPresetsType => self.list_presets_type.is_some(),
            CommandMode => self.command_mode.is_some(),
            ListCache => self.list_cache.is_some(),
            ListCacheAdvanced => self.list_cache_advanced.is_some(),
            ListCacheHelp => self.list_cache_help.is_some(),
            Fresh => self.fresh.is_some(),
            Build => self.build.is_some(),
            Install => self.install.is_some(),
            Open => self.open.is_some(),
            ViewModeOnly => self.view_mode_only.is_some(),
            Script => self.script.is_some(),
            FindPackage => self.find_package.is_some(),
            Graphviz => self.graphviz.is_some(),
            SystemInformation => self.system_information.is_some(),
            SystemInformationFile => self.system_information_file.is_some(),
            LogLevel => self.log_level.is_some(),
            LogContext => self.log_context.is_some(),
            DebugTrycompile => self.debug_trycompile.is_some(),
            DebugOutput => self.debug_output.is_some(),
            DebugFind => self.debug_find.is_some(),
            DebugFindPkg => self.debug_find_pkg.is_some(),
            DebugFindVar => self.debug_find_var.is_some(),
            Trace => self.trace.is_some(),
            TraceExpand => self.trace_expand.is_some(),
            TraceFormat => self.trace_format.is_some(),
            TraceSource => self.trace_source.is_some(),
            TraceRedirect => self.trace_redirect.is_some(),
            WarnUninitialized => self.warn_uninitialized.is_some(),
            NoWarnUnusedCli => self.no_warn_unused_cli.is_some(),
            CheckSystemVars => self.check_system_vars.is_some(),
            CompileNoWarningAsError => self.compile_no_warning_as_error.is_some(),
            ProfilingFormat => self.profiling_format.is_some(),
            ProfilingOutput => self.profiling_output.is_some(),
            // set entries carry per-key identities instead
            Entries => false,
        }
    }
}

impl ParamSet for GeneralParams {
    fn render(&self) -> Vec<String> {
        let mut out = Vec::new();

        push_value(&mut out, "-S", &self.source_dir);
        push_value(&mut out, "-B", &self.build_dir);
        push_value(&mut out, "-C", &self.initial_cache);
        push_value(&mut out, "-G", &self.generator);
        push_value(&mut out, "-T", &self.toolset);
        push_value(&mut out, "-A", &self.platform);
        push_value(&mut out, "--toolchain", &self.toolchain_file);
        push_value(&mut out, "--install-prefix", &self.install_prefix);

        push_switch(&mut out, "-Wdev", self.developer_warnings);
        push_switch(&mut out, "-Wno-dev", self.no_developer_warnings);
        push_switch(&mut out, "-Werror=dev", self.developer_warnings_as_errors);
        push_switch(&mut out, "-Wno-error=dev", self.no_developer_warnings_as_errors);
        push_switch(&mut out, "-Wdeprecated", self.deprecated_warnings);
        push_switch(&mut out, "-Wno-deprecated", self.no_deprecated_warnings);
        push_switch(&mut out, "-Werror=deprecated", self.deprecated_warnings_as_errors);
        push_switch(
            &mut out,
            "-Wno-error=deprecated",
            self.no_deprecated_warnings_as_errors,
        );

        push_value(&mut out, "--preset", &self.preset);
        push_switch_with_value(
            &mut out,
            "--list-presets",
            self.list_presets,
            &self.list_presets_type,
        );
        push_switch(&mut out, "-E", self.command_mode);

        if self.list_cache == Some(true) {
            let mut flag = String::from("-L");
            if self.list_cache_advanced == Some(true) {
                flag.push('A');
            }
            if self.list_cache_help == Some(true) {
                flag.push('H');
            }
            out.push(flag);
        }

        push_switch(&mut out, "--fresh", self.fresh);
        push_value(&mut out, "--build", &self.build);
        push_value(&mut out, "--install", &self.install);
        push_value(&mut out, "--open", &self.open);
        push_switch(&mut out, "-N", self.view_mode_only);
        push_value(&mut out, "-P", &self.script);
        push_switch(&mut out, "--find-package", self.find_package);
        push_equals(&mut out, "--graphviz", &self.graphviz);
        push_switch_with_value(
            &mut out,
            "--system-information",
            self.system_information,
            &self.system_information_file,
        );
        push_equals(&mut out, "--log-level", &self.log_level);
        push_switch(&mut out, "--log-context", self.log_context);
        push_switch(&mut out, "--debug-trycompile", self.debug_trycompile);
        push_switch(&mut out, "--debug-output", self.debug_output);
        push_switch(&mut out, "--debug-find", self.debug_find);
        push_equals(&mut out, "--debug-find-pkg", &self.debug_find_pkg);
        push_equals(&mut out, "--debug-find-var", &self.debug_find_var);
        push_switch(&mut out, "--trace", self.trace);
        push_switch(&mut out, "--trace-expand", self.trace_expand);
        push_equals(&mut out, "--trace-format", &self.trace_format);
        push_equals(&mut out, "--trace-source", &self.trace_source);
        push_equals(&mut out, "--trace-redirect", &self.trace_redirect);
        push_switch(&mut out, "--warn-uninitialized", self.warn_uninitialized);
        push_switch(&mut out, "--no-warn-unused-cli", self.no_warn_unused_cli);
        push_switch(&mut out, "--check-system-vars", self.check_system_vars);
        push_switch(
            &mut out,
            "--compile-no-warning-as-error",
            self.compile_no_warning_as_error,
        );
        push_equals(&mut out, "--profiling-format", &self.profiling_format);
        push_equals(&mut out, "--profiling-output", &self.profiling_output);

        if let Some(entries) = &self.entries {
            out.extend(entries.render());
        }
        out.extend(self.args.iter().cloned());

        out
    }

    fn identities(&self) -> BTreeSet<Identity> {
        let mut ids = field_identities(|field| self.is_set(field), &self.removed);
        if let Some(entries) = &self.entries {
            ids.extend(entries.identities());
        }
        ids.extend(self.remove_entries.iter().map(|key| Identity::for_entry(key)));
        ids
    }
}

/// `<flag> "<value>"`
pub(super) fn push_value(out: &mut Vec<String>, flag: &str, value: &Option<String>) {
    if let Some(value) = value {
        out.push(format!("{flag} {}", quote_for_shell(value)));
    }
}

/// `<flag>` when the switch is on.
pub(super) fn push_switch(out: &mut Vec<String>, flag: &str, on: Option<bool>) {
    if on == Some(true) {
        out.push(flag.to_string());
    }
}

/// `"<flag>=<value>"`
pub(super) fn push_equals(out: &mut Vec<String>, flag: &str, value: &Option<String>) {
    if let Some(value) = value {
        out.push(quote_for_shell(&format!("{flag}={value}")));
    }
}

/// `<flag>` or `"<flag>=<value>"` when the switch is on.
pub(super) fn push_switch_with_value(
    out: &mut Vec<String>,
    flag: &str,
    on: Option<bool>,
    value: &Option<String>,
) {
    if on != Some(true) {
        return;
    }
    match value {
        Some(value) => out.push(quote_for_shell(&format!("{flag}={value}"))),
        None => out.push(flag.to_string()),
    }
}

fn deserialize_entry_keys<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let names = Vec::<String>::deserialize(deserializer)?;
    names
        .iter()
        .map(|name| resolve_entry_key(name).map_err(serde::de::Error::custom))
        .collect()
}
