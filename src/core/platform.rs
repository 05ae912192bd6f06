//! Target platforms and their default configure flags.

use std::fmt;

use crate::core::errors::ConfigError;
use crate::core::params::{CacheEntries, EntryKey, GeneralParams};

/// The platform a target is declared for.
///
/// The platform picks the default `CMAKE_SYSTEM_NAME` and decides which
/// platform-specific cache entries a target may set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Platform {
    Host,
    Android,
    Ios,
    WatchOs,
    TvOs,
    VisionOs,
    Linux,
    Msvc,
    MinGw,
    Darwin,
    WindowsStore,
    Generic,
}

impl Platform {
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Host => "host",
            Platform::Android => "android",
            Platform::Ios => "ios",
            Platform::WatchOs => "watchos",
            Platform::TvOs => "tvos",
            Platform::VisionOs => "visionos",
            Platform::Linux => "linux",
            Platform::Msvc => "msvc",
            Platform::MinGw => "mingw",
            Platform::Darwin => "darwin",
            Platform::WindowsStore => "windows-store",
            Platform::Generic => "generic",
        }
    }

    /// `CMAKE_SYSTEM_NAME` set by default. The host platform sets none.
    pub fn system_name(self) -> Option<&'static str> {
        match self {
            Platform::Host => None,
            Platform::Android => Some("Android"),
            Platform::Ios => Some("iOS"),
            Platform::WatchOs => Some("watchOS"),
            Platform::TvOs => Some("tvOS"),
            Platform::VisionOs => Some("visionOS"),
            Platform::Linux => Some("Linux"),
            Platform::Msvc | Platform::MinGw => Some("Windows"),
            Platform::Darwin => Some("Darwin"),
            Platform::WindowsStore => Some("WindowsStore"),
            Platform::Generic => Some("Generic"),
        }
    }

    pub fn system_version(self) -> Option<&'static str> {
        match self {
            Platform::WindowsStore => Some("10.0"),
            _ => None,
        }
    }

    pub fn default_generator(self) -> Option<&'static str> {
        match self {
            Platform::Android => Some("Ninja"),
            _ => None,
        }
    }

    pub fn is_apple(self) -> bool {
        matches!(
            self,
            Platform::Ios
                | Platform::WatchOs
                | Platform::TvOs
                | Platform::VisionOs
                | Platform::Darwin
        )
    }

    /// Whether targets of this platform may set `key`.
    ///
    /// Android and Apple entries are tied to their platforms. Every other
    /// key, unknown raw keys included, is accepted everywhere.
    pub fn supports(self, key: &str) -> bool {
        match EntryKey::from_key(key) {
            Some(known) if known.is_android() => self == Platform::Android,
            Some(known) if known.is_apple() => self.is_apple(),
            _ => true,
        }
    }

    /// Reject entries this platform does not understand.
    pub fn check_entries(self, entries: &CacheEntries) -> Result<(), ConfigError> {
        match entries.keys().find(|key| !self.supports(key)) {
            Some(key) => Err(ConfigError::UnsupportedEntry {
                key: key.to_string(),
                platform: self,
            }),
            None => Ok(()),
        }
    }

    /// Configure flags every target of this platform starts from.
    pub fn default_params(self) -> GeneralParams {
        let mut params = GeneralParams {
            generator: self.default_generator().map(str::to_string),
            ..GeneralParams::default()
        };

        if let Some(name) = self.system_name() {
            params.entries_mut().set(EntryKey::SystemName, name);
        }
        if let Some(version) = self.system_version() {
            params.entries_mut().set(EntryKey::SystemVersion, version);
        }

        params
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::params::ParamSet;

    #[test]
    fn test_android_defaults() {
        let params = Platform::Android.default_params();
        assert_eq!(
            params.to_params().to_args(),
            ["-G", "Ninja", "-D", "CMAKE_SYSTEM_NAME=Android"]
        );
    }

    #[test]
    fn test_windows_store_defaults() {
        let args = Platform::WindowsStore.default_params().to_params().to_args();
        assert_eq!(
            args,
            [
                "-D",
                "CMAKE_SYSTEM_NAME=WindowsStore",
                "-D",
                "CMAKE_SYSTEM_VERSION=10.0"
            ]
        );
    }

    #[test]
    fn test_host_has_no_defaults() {
        assert!(Platform::Host.default_params().render().is_empty());
    }

    #[test]
    fn test_entry_support() {
        assert!(Platform::Android.supports("CMAKE_ANDROID_ARCH_ABI"));
        assert!(!Platform::Linux.supports("CMAKE_ANDROID_ARCH_ABI"));
        assert!(Platform::Ios.supports("CMAKE_OSX_ARCHITECTURES"));
        assert!(!Platform::Msvc.supports("CMAKE_OSX_SYSROOT"));
        assert!(Platform::Msvc.supports("CMAKE_SYSTEM_PROCESSOR"));
        assert!(Platform::Host.supports("MY_OPTION"));
    }

    #[test]
    fn test_check_entries() {
        let mut entries = CacheEntries::new();
        entries.set(EntryKey::OsxArchitectures, "arm64");

        assert!(Platform::Darwin.check_entries(&entries).is_ok());
        let err = Platform::Linux.check_entries(&entries).unwrap_err();
        assert_eq!(
            err.to_string(),
            "cache entry `CMAKE_OSX_ARCHITECTURES` is not supported on linux"
        );
    }
}
