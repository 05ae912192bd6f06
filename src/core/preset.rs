//! Named target constructors.
//!
//! A preset name is `<base>[.<toolchain>]`, e.g. `androidArm64`,
//! `androidArm64.clang` or `linuxX64.zig`. The bare base name applies the
//! base's default toolchain strategy.

use std::collections::BTreeMap;
use std::fmt;

use crate::core::errors::{suggest, ConfigError};
use crate::core::params::{CacheEntries, EntryKey};
use crate::core::platform::Platform;
use crate::core::target::Target;

/// Builds a target with the given name.
pub type PresetFn = Box<dyn Fn(&str) -> Target + Send + Sync>;

/// How a base preset gets its compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toolchain {
    /// CMake's built-in Android NDK support.
    Ndk,
    /// `clang`/`clang++` with an explicit triple.
    Clang,
    /// `zig cc`/`zig c++` with a zig target.
    Zig,
}

impl Toolchain {
    pub fn suffix(self) -> &'static str {
        match self {
            Toolchain::Ndk => "ndk",
            Toolchain::Clang => "clang",
            Toolchain::Zig => "zig",
        }
    }
}

struct BasePreset {
    name: &'static str,
    platform: Platform,
    entries: &'static [(EntryKey, &'static str)],
    ndk: bool,
    clang_triple: Option<&'static str>,
    zig_triple: Option<&'static str>,
    default: Option<Toolchain>,
}

impl BasePreset {
    const fn new(
        name: &'static str,
        platform: Platform,
        entries: &'static [(EntryKey, &'static str)],
    ) -> Self {
        BasePreset {
            name,
            platform,
            entries,
            ndk: false,
            clang_triple: None,
            zig_triple: None,
            default: None,
        }
    }

    const fn android(
        name: &'static str,
        entries: &'static [(EntryKey, &'static str)],
        clang: &'static str,
        zig: &'static str,
    ) -> Self {
        BasePreset {
            ndk: true,
            clang_triple: Some(clang),
            zig_triple: Some(zig),
            default: Some(Toolchain::Ndk),
            ..BasePreset::new(name, Platform::Android, entries)
        }
    }

    const fn cross(
        name: &'static str,
        platform: Platform,
        entries: &'static [(EntryKey, &'static str)],
        clang: &'static str,
        zig: &'static str,
        default: Option<Toolchain>,
    ) -> Self {
        BasePreset {
            clang_triple: Some(clang),
            zig_triple: Some(zig),
            default,
            ..BasePreset::new(name, platform, entries)
        }
    }

    fn toolchains(&self) -> Vec<Toolchain> {
        let mut toolchains = Vec::new();
        if self.ndk {
            toolchains.push(Toolchain::Ndk);
        }
        if self.clang_triple.is_some() {
            toolchains.push(Toolchain::Clang);
        }
        if self.zig_triple.is_some() {
            toolchains.push(Toolchain::Zig);
        }
        toolchains
    }

    fn build(&self, name: &str, preset: &str, toolchain: Option<Toolchain>) -> Target {
        let mut target = Target::new(name, preset, self.platform);

        let mut entries = CacheEntries::new();
        for (key, value) in self.entries {
            entries.set(*key, *value);
        }
        if !entries.is_empty() {
            // table entries always match their own platform
            if let Err(e) = target.entries(entries) {
                tracing::warn!("preset `{}`: {}", preset, e);
            }
        }

        match toolchain {
            Some(Toolchain::Clang) => {
                if self.platform == Platform::MinGw {
                    // clang's mingw driver does not understand CMAKE_SYSTEM_NAME=Windows
                    let mut entries = CacheEntries::new();
                    entries.set(SystemName, "Generic");
                    if let Err(e) = target.entries(entries) {
                        tracing::warn!("preset `{}`: {}", preset, e);
                    }
                }
                target.use_clang();
                if let Some(triple) = self.clang_triple {
                    target.set_compiler_target(triple);
                }
                if !self.platform.is_apple() {
                    target.force_lld();
                }
            }
            Some(Toolchain::Zig) => {
                target.use_zig_toolchain();
                if let Some(triple) = self.zig_triple {
                    target.set_compiler_target(triple);
                }
            }
            Some(Toolchain::Ndk) | None => {}
        }

        target
    }
}

use EntryKey::{AndroidArchAbi, OsxArchitectures, OsxSysroot, SystemName, SystemProcessor};

const BASE_PRESETS: &[BasePreset] = &[
    BasePreset::new("host", Platform::Host, &[]),
    BasePreset::android(
        "androidX64",
        &[(AndroidArchAbi, "x86_64")],
        "x86_64-linux-android",
        "x86_64-linux-android",
    ),
    BasePreset::android(
        "androidX86",
        &[(AndroidArchAbi, "x86")],
        "i686-linux-android",
        "x86-linux-android",
    ),
    BasePreset::android(
        "androidArm32",
        &[(AndroidArchAbi, "armeabi-v7a")],
        "armv7a-linux-androideabi",
        "arm-linux-androideabi",
    ),
    BasePreset::android(
        "androidArm64",
        &[(AndroidArchAbi, "arm64-v8a")],
        "aarch64-linux-android",
        "aarch64-linux-android",
    ),
    BasePreset::new("iosArm32", Platform::Ios, &[(OsxArchitectures, "armv7")]),
    BasePreset::new("iosArm64", Platform::Ios, &[(OsxArchitectures, "arm64")]),
    BasePreset::new("iosX64", Platform::Ios, &[(OsxArchitectures, "x86_64")]),
    BasePreset::new(
        "iosSimulatorArm64",
        Platform::Ios,
        &[(OsxArchitectures, "arm64"), (OsxSysroot, "iphonesimulator")],
    ),
    BasePreset::new(
        "iosSimulatorX64",
        Platform::Ios,
        &[(OsxArchitectures, "x86_64"), (OsxSysroot, "iphonesimulator")],
    ),
    BasePreset::new("watchosArm32", Platform::WatchOs, &[(OsxArchitectures, "armv7k")]),
    BasePreset::new("watchosArm64", Platform::WatchOs, &[(OsxArchitectures, "arm64_32")]),
    BasePreset::new("watchosX86", Platform::WatchOs, &[(OsxArchitectures, "i386")]),
    BasePreset::new("watchosX64", Platform::WatchOs, &[(OsxArchitectures, "x86_64")]),
    BasePreset::new(
        "watchosSimulatorArm64",
        Platform::WatchOs,
        &[(OsxArchitectures, "arm64"), (OsxSysroot, "watchsimulator")],
    ),
    BasePreset::new("tvosArm64", Platform::TvOs, &[(OsxArchitectures, "arm64")]),
    BasePreset::new("tvosX64", Platform::TvOs, &[(OsxArchitectures, "x86_64")]),
    BasePreset::new(
        "tvosSimulatorArm64",
        Platform::TvOs,
        &[(OsxArchitectures, "arm64"), (OsxSysroot, "appletvsimulator")],
    ),
    BasePreset::new("visionosArm64", Platform::VisionOs, &[(OsxArchitectures, "arm64")]),
    BasePreset::new(
        "visionosSimulatorArm64",
        Platform::VisionOs,
        &[(OsxArchitectures, "arm64"), (OsxSysroot, "xrsimulator")],
    ),
    BasePreset::cross(
        "linuxX64",
        Platform::Linux,
        &[(SystemProcessor, "x86_64")],
        "x86_64-linux-gnu",
        "x86_64-linux-gnu",
        Some(Toolchain::Clang),
    ),
    BasePreset::cross(
        "linuxArm64",
        Platform::Linux,
        &[(SystemProcessor, "aarch64")],
        "aarch64-linux-gnu",
        "aarch64-linux-gnu",
        Some(Toolchain::Clang),
    ),
    BasePreset::cross(
        "linuxArm32Hfp",
        Platform::Linux,
        &[(SystemProcessor, "armv7hf")],
        "armv7hf-linux-gnu",
        "arm-linux-gnueabihf",
        Some(Toolchain::Clang),
    ),
    BasePreset::cross(
        "linuxMips32",
        Platform::Linux,
        &[(SystemProcessor, "mips")],
        "mips-linux-gnu",
        "mips-linux-gnueabihf",
        Some(Toolchain::Clang),
    ),
    BasePreset::cross(
        "linuxMipsel32",
        Platform::Linux,
        &[(SystemProcessor, "mipsel")],
        "mipsel-linux-gnu",
        "mipsel-linux-gnueabihf",
        Some(Toolchain::Clang),
    ),
    BasePreset::new("msvcX86", Platform::Msvc, &[(SystemProcessor, "x86")]),
    BasePreset::new("msvcX64", Platform::Msvc, &[(SystemProcessor, "x86_64")]),
    BasePreset::new("msvcArm64", Platform::Msvc, &[(SystemProcessor, "ARM64")]),
    BasePreset::cross(
        "mingwX86",
        Platform::MinGw,
        &[(SystemProcessor, "i686")],
        "i686-w64-mingw32",
        "x86-windows-gnu",
        Some(Toolchain::Clang),
    ),
    BasePreset::cross(
        "mingwX64",
        Platform::MinGw,
        &[(SystemProcessor, "x86_64")],
        "x86_64-w64-mingw32",
        "x86_64-windows-gnu",
        Some(Toolchain::Clang),
    ),
    BasePreset::cross(
        "mingwArm64",
        Platform::MinGw,
        &[(SystemProcessor, "aarch64")],
        "aarch64-w64-mingw32",
        "aarch64-windows-gnu",
        Some(Toolchain::Clang),
    ),
    BasePreset::cross(
        "macosX64",
        Platform::Darwin,
        &[(SystemProcessor, "x86_64")],
        "x86_64-apple-darwin",
        "x86_64-macos",
        None,
    ),
    BasePreset::cross(
        "macosArm64",
        Platform::Darwin,
        &[(SystemProcessor, "arm64")],
        "arm64-apple-darwin",
        "aarch64-macos",
        None,
    ),
];

/// Map from preset name to target constructor.
pub struct PresetRegistry {
    presets: BTreeMap<String, PresetFn>,
}

impl PresetRegistry {
    /// A registry with no presets.
    pub fn empty() -> Self {
        PresetRegistry {
            presets: BTreeMap::new(),
        }
    }

    /// A registry holding every built-in preset.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();

        for base in BASE_PRESETS {
            let default = base.default;
            registry.register(base.name, move |name: &str| {
                base.build(name, base.name, default)
            });

            for toolchain in base.toolchains() {
                let preset = format!("{}.{}", base.name, toolchain.suffix());
                let preset_name = preset.clone();
                registry.register(preset, move |name: &str| {
                    base.build(name, &preset_name, Some(toolchain))
                });
            }
        }

        registry
    }

    /// Add or replace a preset.
    pub fn register<F>(&mut self, name: impl Into<String>, builder: F)
    where
        F: Fn(&str) -> Target + Send + Sync + 'static,
    {
        self.presets.insert(name.into(), Box::new(builder));
    }

    pub fn contains(&self, preset: &str) -> bool {
        self.presets.contains_key(preset)
    }

    /// Preset names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.presets.keys().map(String::as_str)
    }

    /// Build a target named `name` from `preset`.
    pub fn create(&self, preset: &str, name: &str) -> Result<Target, ConfigError> {
        let builder = self
            .presets
            .get(preset)
            .ok_or_else(|| ConfigError::UnknownPreset {
                name: preset.to_string(),
                suggestions: suggest(preset, self.names()),
            })?;
        Ok(builder(name))
    }
}

impl Default for PresetRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for PresetRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresetRegistry")
            .field("presets", &self.presets.keys().collect::<Vec<_>>())
            .finish()
    }
}
