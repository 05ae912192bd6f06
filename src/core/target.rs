//! Targets: one CMake configure/build pair per platform variant.
//!
//! A target is created from a preset, which applies its platform defaults,
//! and is then configured by layering flag sets and calling toolchain
//! helpers. Each call adds a layer on top of the previous ones, so a later
//! call replaces any flag with the same identity.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::core::configuration::{Configuration, Placeholders};
use crate::core::errors::ConfigError;
use crate::core::params::{
    BuildParams, CacheEntries, EntryKey, GeneralParams, Lang, LangEntry, ParamSet,
};
use crate::core::platform::Platform;
use crate::util::args::quote_for_shell;

/// Keys of the per-target auto properties, `<target>.<suffix>`.
pub const PROPERTY_SYSROOT: &str = "sysRoot";
pub const PROPERTY_GCC_INSTALL_DIR: &str = "gccInstallDir";
pub const PROPERTY_GCC_TOOLCHAIN: &str = "gccToolchain";
pub const PROPERTY_EXTRA_COMPILER_FLAGS: &str = "extraCompilerFlags";

const COMPILER_LANGS: [Lang; 2] = [Lang::C, Lang::Cxx];

const LINKER_FLAG_KEYS: [EntryKey; 3] = [
    EntryKey::ExeLinkerFlagsInit,
    EntryKey::ModuleLinkerFlagsInit,
    EntryKey::SharedLinkerFlagsInit,
];

/// A single configure/build target.
#[derive(Debug, Clone)]
pub struct Target {
    name: String,
    preset: String,
    platform: Platform,
    configuration: Configuration,
    compiler_flags: Vec<String>,
}

impl Target {
    /// Declare a target, starting from the platform defaults.
    pub fn new(name: impl Into<String>, preset: impl Into<String>, platform: Platform) -> Self {
        let mut configuration = Configuration::new();
        let defaults = platform.default_params();
        if !defaults.render().is_empty() {
            configuration.add_config_params(&defaults);
        }

        Target {
            name: name.into(),
            preset: preset.into(),
            platform,
            configuration,
            compiler_flags: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Preset this target was created from.
    pub fn preset(&self) -> &str {
        &self.preset
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// This target's own layer.
    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn set_executable(&mut self, executable: impl Into<String>) -> &mut Self {
        self.configuration.executable = Some(executable.into());
        self
    }

    pub fn set_working_folder(&mut self, folder: impl Into<PathBuf>) -> &mut Self {
        self.configuration.working_folder = Some(folder.into());
        self
    }

    /// Layer configure flags on this target.
    ///
    /// Fails when the flags set a cache entry the target's platform does
    /// not understand.
    pub fn config_params(&mut self, params: &GeneralParams) -> Result<&mut Self, ConfigError> {
        if let Some(entries) = &params.entries {
            self.platform.check_entries(entries)?;
        }
        self.configuration.add_config_params(params);
        Ok(self)
    }

    /// Layer build flags on this target.
    pub fn build_params(&mut self, params: &BuildParams) -> &mut Self {
        self.configuration.add_build_params(params);
        self
    }

    /// Layer cache entries on this target.
    pub fn entries(&mut self, entries: CacheEntries) -> Result<&mut Self, ConfigError> {
        self.config_params(&GeneralParams {
            entries: Some(entries),
            ..GeneralParams::default()
        })
    }

    /// Compile C and C++ with `clang` and `clang++`.
    pub fn use_clang(&mut self) -> &mut Self {
        self.set_compilers("clang", "clang++")
    }

    /// Compile through `zig cc` and `zig c++`.
    pub fn use_zig_toolchain(&mut self) -> &mut Self {
        self.set_compilers("zig;cc", "zig;c++")
    }

    /// Target triple for both C and C++.
    pub fn set_compiler_target(&mut self, triple: &str) -> &mut Self {
        self.set_lang_entry(LangEntry::CompilerTarget, triple)
    }

    /// Drop any inherited compiler target.
    pub fn clear_compiler_target(&mut self) -> &mut Self {
        let mut entries = CacheEntries::new();
        for lang in COMPILER_LANGS {
            entries.mark_removed(EntryKey::Lang(lang, LangEntry::CompilerTarget));
        }
        self.push_entries(entries)
    }

    pub fn set_sysroot(&mut self, sysroot: &str) -> &mut Self {
        let mut entries = CacheEntries::new();
        entries.set(EntryKey::Sysroot, sysroot);
        self.push_entries(entries)
    }

    /// Append a flag to `CMAKE_C_FLAGS_INIT` and `CMAKE_CXX_FLAGS_INIT`.
    ///
    /// Flags accumulate across calls on the same target.
    pub fn add_compiler_flag(&mut self, flag: impl Into<String>) -> &mut Self {
        self.compiler_flags.push(flag.into());
        let joined = self.compiler_flags.join(" ");
        self.set_lang_entry(LangEntry::FlagsInit, &joined)
    }

    pub fn set_gcc_install_dir(&mut self, dir: &str) -> &mut Self {
        self.add_compiler_flag(format!("--gcc-install-dir={dir}"))
    }

    pub fn set_gcc_toolchain(&mut self, dir: &str) -> &mut Self {
        self.add_compiler_flag(format!("--gcc-toolchain={dir}"))
    }

    /// Initial flags for executable, module and shared library links.
    pub fn set_linker_flags(&mut self, flags: &str) -> &mut Self {
        let mut entries = CacheEntries::new();
        for key in LINKER_FLAG_KEYS {
            entries.set(key, flags);
        }
        self.push_entries(entries)
    }

    /// Link with `-fuse-ld=<linker>`.
    pub fn force_linker(&mut self, linker: &str) -> &mut Self {
        self.set_linker_flags(&format!("-fuse-ld={}", quote_for_shell(linker)))
    }

    pub fn force_lld(&mut self) -> &mut Self {
        self.force_linker("lld")
    }

    /// Apply `<target>.sysRoot`, `.gccInstallDir`, `.gccToolchain` and
    /// `.extraCompilerFlags` from a property map.
    pub fn apply_properties(&mut self, properties: &BTreeMap<String, String>) -> &mut Self {
        let lookup = |suffix: &str| {
            properties
                .get(&format!("{}.{}", self.name, suffix))
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let sysroot = lookup(PROPERTY_SYSROOT);
        let gcc_install_dir = lookup(PROPERTY_GCC_INSTALL_DIR);
        let gcc_toolchain = lookup(PROPERTY_GCC_TOOLCHAIN);
        let extra_flags = lookup(PROPERTY_EXTRA_COMPILER_FLAGS);

        if let Some(sysroot) = sysroot {
            tracing::debug!("{}: sysroot {}", self.name, sysroot);
            self.set_sysroot(&sysroot);
        }
        if let Some(dir) = gcc_install_dir {
            self.set_gcc_install_dir(&dir);
        }
        if let Some(dir) = gcc_toolchain {
            self.set_gcc_toolchain(&dir);
        }
        if let Some(flags) = extra_flags {
            for flag in flags.split_whitespace() {
                self.add_compiler_flag(flag);
            }
        }
        self
    }

    /// Effective configuration under the given parent layers.
    ///
    /// Parents are ordered root first. Nothing is cached: the result
    /// reflects the parents as they are now.
    pub fn final_configuration(
        &self,
        parents: &[&Configuration],
        placeholders: &Placeholders<'_>,
    ) -> Configuration {
        let layers = parents.iter().copied().chain([&self.configuration]);
        Configuration::compose(layers).substitute(placeholders)
    }

    fn set_compilers(&mut self, c: &str, cxx: &str) -> &mut Self {
        let mut entries = CacheEntries::new();
        entries
            .set(EntryKey::Lang(Lang::C, LangEntry::Compiler), c)
            .set(EntryKey::Lang(Lang::Cxx, LangEntry::Compiler), cxx);
        self.push_entries(entries)
    }

    fn set_lang_entry(&mut self, entry: LangEntry, value: &str) -> &mut Self {
        let mut entries = CacheEntries::new();
        for lang in COMPILER_LANGS {
            entries.set(EntryKey::Lang(lang, entry), value);
        }
        self.push_entries(entries)
    }

    /// Helper entries are valid on every platform.
    fn push_entries(&mut self, entries: CacheEntries) -> &mut Self {
        self.configuration.add_config_params(&entries);
        self
    }
}
