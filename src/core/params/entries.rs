//! `-D<KEY>=<value>` cache entries.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Deserialize;

use super::{Identity, ParamSet};
use crate::core::errors::{suggest, ConfigError};
use crate::util::args::quote_for_shell;

/// Language prefix of per-language entries (`CMAKE_<LANG>_...`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Lang {
    C,
    Cxx,
    ObjC,
    ObjCxx,
    Asm,
}

impl Lang {
    pub const ALL: [Lang; 5] = [Lang::C, Lang::Cxx, Lang::ObjC, Lang::ObjCxx, Lang::Asm];

    fn key(self) -> &'static str {
        match self {
            Lang::C => "C",
            Lang::Cxx => "CXX",
            Lang::ObjC => "OBJC",
            Lang::ObjCxx => "OBJCXX",
            Lang::Asm => "ASM",
        }
    }

    fn name(self) -> &'static str {
        match self {
            Lang::C => "c",
            Lang::Cxx => "cxx",
            Lang::ObjC => "objc",
            Lang::ObjCxx => "objcxx",
            Lang::Asm => "asm",
        }
    }
}

/// Per-language entry suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LangEntry {
    Compiler,
    CompilerTarget,
    CompilerLauncher,
    CompilerExternalToolchain,
    FlagsInit,
}

impl LangEntry {
    pub const ALL: [LangEntry; 5] = [
        LangEntry::Compiler,
        LangEntry::CompilerTarget,
        LangEntry::CompilerLauncher,
        LangEntry::CompilerExternalToolchain,
        LangEntry::FlagsInit,
    ];

    fn key(self) -> &'static str {
        match self {
            LangEntry::Compiler => "COMPILER",
            LangEntry::CompilerTarget => "COMPILER_TARGET",
            LangEntry::CompilerLauncher => "COMPILER_LAUNCHER",
            LangEntry::CompilerExternalToolchain => "COMPILER_EXTERNAL_TOOLCHAIN",
            LangEntry::FlagsInit => "FLAGS_INIT",
        }
    }
}

/// A well-known CMake cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntryKey {
    SystemName,
    SystemVersion,
    SystemProcessor,
    Sysroot,
    SysrootCompile,
    SysrootLink,
    FindRootPath,
    BuildType,
    ExportCompileCommands,
    ExeLinkerFlagsInit,
    ModuleLinkerFlagsInit,
    SharedLinkerFlagsInit,
    StaticLinkerFlagsInit,
    AndroidArchAbi,
    AndroidNdk,
    AndroidApi,
    AndroidStlType,
    AndroidArmMode,
    AndroidArmNeon,
    OsxArchitectures,
    OsxSysroot,
    OsxDeploymentTarget,
    Lang(Lang, LangEntry),
}

const PLAIN_KEYS: &[(EntryKey, &str)] = &[
    (EntryKey::SystemName, "CMAKE_SYSTEM_NAME"),
    (EntryKey::SystemVersion, "CMAKE_SYSTEM_VERSION"),
    (EntryKey::SystemProcessor, "CMAKE_SYSTEM_PROCESSOR"),
    (EntryKey::Sysroot, "CMAKE_SYSROOT"),
    (EntryKey::SysrootCompile, "CMAKE_SYSROOT_COMPILE"),
    (EntryKey::SysrootLink, "CMAKE_SYSROOT_LINK"),
    (EntryKey::FindRootPath, "CMAKE_FIND_ROOT_PATH"),
    (EntryKey::BuildType, "CMAKE_BUILD_TYPE"),
    (EntryKey::ExportCompileCommands, "CMAKE_EXPORT_COMPILE_COMMANDS"),
    (EntryKey::ExeLinkerFlagsInit, "CMAKE_EXE_LINKER_FLAGS_INIT"),
    (EntryKey::ModuleLinkerFlagsInit, "CMAKE_MODULE_LINKER_FLAGS_INIT"),
    (EntryKey::SharedLinkerFlagsInit, "CMAKE_SHARED_LINKER_FLAGS_INIT"),
    (EntryKey::StaticLinkerFlagsInit, "CMAKE_STATIC_LINKER_FLAGS_INIT"),
    (EntryKey::AndroidArchAbi, "CMAKE_ANDROID_ARCH_ABI"),
    (EntryKey::AndroidNdk, "CMAKE_ANDROID_NDK"),
    (EntryKey::AndroidApi, "CMAKE_ANDROID_API"),
    (EntryKey::AndroidStlType, "CMAKE_ANDROID_STL_TYPE"),
    (EntryKey::AndroidArmMode, "CMAKE_ANDROID_ARM_MODE"),
    (EntryKey::AndroidArmNeon, "CMAKE_ANDROID_ARM_NEON"),
    (EntryKey::OsxArchitectures, "CMAKE_OSX_ARCHITECTURES"),
    (EntryKey::OsxSysroot, "CMAKE_OSX_SYSROOT"),
    (EntryKey::OsxDeploymentTarget, "CMAKE_OSX_DEPLOYMENT_TARGET"),
];

impl EntryKey {
    /// Every known key.
    pub fn all() -> Vec<EntryKey> {
        let mut keys: Vec<EntryKey> = PLAIN_KEYS.iter().map(|(key, _)| *key).collect();
        for lang in Lang::ALL {
            keys.extend(LangEntry::ALL.iter().map(|entry| EntryKey::Lang(lang, *entry)));
        }
        keys
    }

    /// The CMake cache key, e.g. `CMAKE_C_COMPILER`.
    pub fn key(self) -> String {
        match self {
            EntryKey::Lang(lang, entry) => format!("CMAKE_{}_{}", lang.key(), entry.key()),
            plain => PLAIN_KEYS
                .iter()
                .find(|(key, _)| *key == plain)
                .map(|(_, name)| name.to_string())
                .unwrap_or_default(),
        }
    }

    /// Manifest name, e.g. `c-compiler` or `android-arch-abi`.
    pub fn name(self) -> String {
        match self {
            EntryKey::Lang(lang, entry) => format!(
                "{}-{}",
                lang.name(),
                entry.key().to_ascii_lowercase().replace('_', "-")
            ),
            _ => self
                .key()
                .trim_start_matches("CMAKE_")
                .to_ascii_lowercase()
                .replace('_', "-"),
        }
    }

    pub fn from_name(name: &str) -> Option<EntryKey> {
        Self::all().into_iter().find(|key| key.name() == name)
    }

    pub fn from_key(key: &str) -> Option<EntryKey> {
        Self::all().into_iter().find(|known| known.key() == key)
    }

    pub fn is_android(self) -> bool {
        matches!(
            self,
            EntryKey::AndroidArchAbi
                | EntryKey::AndroidNdk
                | EntryKey::AndroidApi
                | EntryKey::AndroidStlType
                | EntryKey::AndroidArmMode
                | EntryKey::AndroidArmNeon
        )
    }

    pub fn is_apple(self) -> bool {
        matches!(
            self,
            EntryKey::OsxArchitectures | EntryKey::OsxSysroot | EntryKey::OsxDeploymentTarget
        )
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Map a manifest entry name to its CMake key.
///
/// Known kebab-case names map to their key. Anything else must already look
/// like a cache key (`MY_OPTION`, `FOO:BOOL`).
pub fn resolve_entry_key(name: &str) -> Result<String, ConfigError> {
    if let Some(key) = EntryKey::from_name(name) {
        return Ok(key.key());
    }

    let is_raw_key = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':');
    if is_raw_key {
        return Ok(name.to_string());
    }

    let names: Vec<String> = EntryKey::all().into_iter().map(EntryKey::name).collect();
    Err(ConfigError::UnknownEntry {
        name: name.to_string(),
        suggestions: suggest(name, names.iter().map(String::as_str)),
    })
}

/// The entry name of a cache key, without its `:TYPE` suffix.
pub fn entry_name(key: &str) -> &str {
    key.split_once(':').map_or(key, |(name, _)| name)
}

/// Cache entries with explicit removals.
///
/// Entries render sorted by key. A set key replaces the same entry from
/// earlier layers, typed or not; a removed key strips it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "BTreeMap<String, String>")]
pub struct CacheEntries {
    values: BTreeMap<String, String>,
    removed: BTreeSet<String>,
}

impl CacheEntries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: EntryKey, value: impl Into<String>) -> &mut Self {
        self.set_raw(key.key(), value)
    }

    pub fn set_raw(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn mark_removed(&mut self, key: EntryKey) -> &mut Self {
        self.mark_removed_raw(key.key())
    }

    pub fn mark_removed_raw(&mut self, key: impl Into<String>) -> &mut Self {
        self.removed.insert(key.into());
        self
    }

    /// Keys that are set, in render order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.removed.is_empty()
    }

    /// Layer `other` on top of `self`, as a map.
    pub fn merge(&self, other: &CacheEntries) -> CacheEntries {
        let replaced: BTreeSet<&str> = other
            .values
            .keys()
            .chain(other.removed.iter())
            .map(|key| entry_name(key))
            .collect();
        let mut values: BTreeMap<String, String> = self
            .values
            .iter()
            .filter(|(key, _)| !replaced.contains(entry_name(key)))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        values.extend(other.values.iter().map(|(k, v)| (k.clone(), v.clone())));

        let mut removed = self.removed.clone();
        removed.extend(other.removed.iter().cloned());

        CacheEntries { values, removed }
    }
}

impl ParamSet for CacheEntries {
    fn render(&self) -> Vec<String> {
        self.values
            .iter()
            .map(|(key, value)| format!("-D{key}={}", quote_for_shell(value)))
            .collect()
    }

    fn identities(&self) -> BTreeSet<Identity> {
        self.values
            .keys()
            .chain(self.removed.iter())
            .map(|key| Identity::for_entry(key))
            .collect()
    }
}

impl TryFrom<BTreeMap<String, String>> for CacheEntries {
    type Error = ConfigError;

    fn try_from(map: BTreeMap<String, String>) -> Result<Self, Self::Error> {
        let mut entries = CacheEntries::new();
        for (name, value) in map {
            entries.set_raw(resolve_entry_key(&name)?, value);
        }
        Ok(entries)
    }
}
