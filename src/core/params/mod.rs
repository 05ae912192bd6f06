//! Mergeable CMake flag sets.
//!
//! A [`Params`] value is an ordered list of rendered flag strings plus the
//! set of flag identities it suppresses when layered on top of an earlier
//! set. Typed families ([`GeneralParams`], [`BuildParams`],
//! [`CacheEntries`]) render into `Params` through the [`ParamSet`] trait.
//!
//! Merging `a.merge(&b)` keeps every flag of `a` that none of `b`'s
//! identities match, then appends `b`'s flags. Identities are unioned, so a
//! removal recorded deep in a chain keeps applying to everything before it.

/// Declares a field enum for one flag family together with its static
/// name and identity tables.
macro_rules! param_fields {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident ($family:literal) {
            $($variant:ident => $field:literal, $pattern:literal;)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        $vis enum $name {
            $($variant,)*
        }

        impl $crate::core::params::ParamField for $name {
            const FAMILY: &'static str = $family;
            const ALL: &'static [Self] = &[$(Self::$variant,)*];

            fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $field,)*
                }
            }

            fn identity_pattern(self) -> &'static str {
                match self {
                    $(Self::$variant => $pattern,)*
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::core::errors::ConfigError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <Self as $crate::core::params::ParamField>::from_name(s)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str($crate::core::params::ParamField::name(*self))
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let name = <String as serde::Deserialize>::deserialize(deserializer)?;
                name.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

pub mod build;
pub mod entries;
pub mod general;

use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use regex::Regex;

use crate::core::errors::{suggest, ConfigError};
use crate::util::args::split_into_arguments;

pub use build::{BuildField, BuildParams};
pub use entries::{CacheEntries, EntryKey, Lang, LangEntry};
pub use general::{GeneralField, GeneralParams};

/// A regex that addresses one flag across renderings.
///
/// The pattern must match a whole flag string. It is tried against the
/// flag as rendered (`-S "/src"`) and against its unquoted, space-joined
/// form (`-S /src`), so identities can ignore quoting.
#[derive(Clone)]
pub struct Identity {
    pattern: String,
    regex: Regex,
}

impl Identity {
    /// Compile an identity from a pattern.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{pattern})$"))?;
        Ok(Identity {
            pattern: pattern.to_string(),
            regex,
        })
    }

    /// Compile an identity from a static table.
    ///
    /// # Panics
    ///
    /// Panics when the pattern does not compile.
    pub fn from_static(pattern: &'static str) -> Self {
        Self::new(pattern)
            .unwrap_or_else(|e| panic!("invalid flag identity pattern `{pattern}`: {e}"))
    }

    /// Identity of a `-D<key>=...` cache entry.
    ///
    /// A `:TYPE` suffix is not part of the identity: `-DFOO:BOOL=ON` and
    /// `-DFOO=OFF` set the same entry.
    pub fn for_entry(key: &str) -> Self {
        let pattern = format!(
            "-D{}(?::[A-Za-z_]+)?=.*",
            regex::escape(entries::entry_name(key))
        );
        Self::new(&pattern)
            .unwrap_or_else(|e| panic!("invalid cache entry identity `{pattern}`: {e}"))
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether this identity addresses the given rendered flag.
    pub fn matches(&self, flag: &str) -> bool {
        self.regex.is_match(flag) || self.regex.is_match(&split_into_arguments([flag]).join(" "))
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Identity").field(&self.pattern).finish()
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

impl Eq for Identity {}

impl PartialOrd for Identity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Identity {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.pattern.cmp(&other.pattern)
    }
}

impl Hash for Identity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pattern.hash(state);
    }
}

/// One field of a flag family.
pub trait ParamField: Copy + Ord + 'static {
    /// Family name used in error messages.
    const FAMILY: &'static str;

    /// Every field, in render order.
    const ALL: &'static [Self];

    /// Kebab-case name used in manifests and removal lists.
    fn name(self) -> &'static str;

    fn identity_pattern(self) -> &'static str;

    fn identity(self) -> Identity {
        Identity::from_static(self.identity_pattern())
    }

    /// Look a field up by its kebab-case name.
    fn from_name(name: &str) -> Result<Self, ConfigError> {
        Self::ALL
            .iter()
            .copied()
            .find(|field| field.name() == name)
            .ok_or_else(|| ConfigError::UnknownField {
                family: Self::FAMILY,
                name: name.to_string(),
                suggestions: suggest(name, Self::ALL.iter().map(|f| f.name())),
            })
    }
}

/// Anything that renders into mergeable flags.
pub trait ParamSet {
    /// Rendered flags, in a fixed order.
    fn render(&self) -> Vec<String>;

    /// Identities this set suppresses in earlier layers.
    fn identities(&self) -> BTreeSet<Identity>;

    fn to_params(&self) -> Params {
        Params::from_parts(self.render(), self.identities())
    }
}

/// A rendered, mergeable flag list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    value: Vec<String>,
    identities: BTreeSet<Identity>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw flags that remove nothing when merged.
    pub fn raw<I, S>(flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Params {
            value: flags.into_iter().map(Into::into).collect(),
            identities: BTreeSet::new(),
        }
    }

    pub fn from_parts(value: Vec<String>, identities: BTreeSet<Identity>) -> Self {
        Params { value, identities }
    }

    pub fn value(&self) -> &[String] {
        &self.value
    }

    pub fn identities(&self) -> &BTreeSet<Identity> {
        &self.identities
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty() && self.identities.is_empty()
    }

    /// Layer `other` on top of `self`.
    pub fn merge(&self, other: &Params) -> Params {
        let mut value: Vec<String> = self
            .value
            .iter()
            .filter(|flag| !other.identities.iter().any(|id| id.matches(flag)))
            .cloned()
            .collect();
        value.extend(other.value.iter().cloned());

        let mut identities = self.identities.clone();
        identities.extend(other.identities.iter().cloned());

        Params { value, identities }
    }

    /// Layer any flag family on top of `self`.
    pub fn merge_set<P: ParamSet + ?Sized>(&self, other: &P) -> Params {
        self.merge(&other.to_params())
    }

    /// Replace every occurrence of `placeholder` inside each rendered flag.
    pub fn replace_with(&self, placeholder: &str, replacement: &str) -> Params {
        Params {
            value: self
                .value
                .iter()
                .map(|flag| flag.replace(placeholder, replacement))
                .collect(),
            identities: self.identities.clone(),
        }
    }

    /// Flatten into a quote-free argument vector.
    ///
    /// A native-tool passthrough (`-- ...`) always goes last, wherever it sat
    /// in the merge chain.
    pub fn to_args(&self) -> Vec<String> {
        let (native, flags): (Vec<&String>, Vec<&String>) = self
            .value
            .iter()
            .partition(|flag| *flag == "--" || flag.starts_with("-- "));
        split_into_arguments(flags.into_iter().chain(native))
    }

    /// Value following `option` in the flattened arguments.
    pub fn find_value(&self, option: &str) -> Option<String> {
        let args = self.to_args();
        let position = args.iter().position(|arg| arg == option)?;
        args.get(position + 1).cloned()
    }
}

impl ParamSet for Params {
    fn render(&self) -> Vec<String> {
        self.value.clone()
    }

    fn identities(&self) -> BTreeSet<Identity> {
        self.identities.clone()
    }

    fn to_params(&self) -> Params {
        self.clone()
    }
}

/// Identities of every field that is set or explicitly removed.
pub(crate) fn field_identities<F: ParamField>(
    is_set: impl Fn(F) -> bool,
    removed: &BTreeSet<F>,
) -> BTreeSet<Identity> {
    F::ALL
        .iter()
        .copied()
        .filter(|field| is_set(*field) || removed.contains(field))
        .map(|field| field.identity())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_matches_whole_flag() {
        let trace = Identity::from_static("--trace");
        assert!(trace.matches("--trace"));
        assert!(!trace.matches("--trace-expand"));

        let source = Identity::from_static(r"-S\s+.+");
        assert!(source.matches("-S \"/proj/src\""));
        assert!(source.matches("-Sglued"));
        assert!(!source.matches("-B /proj/build"));
    }

    #[test]
    fn test_identity_ignores_quoting() {
        let graphviz = Identity::from_static("--graphviz=.*");
        assert!(graphviz.matches("\"--graphviz\\=deps.dot\""));
    }

    #[test]
    fn test_entry_identity_escapes_key() {
        let id = Identity::for_entry("CMAKE_C_FLAGS_INIT");
        assert!(id.matches("-DCMAKE_C_FLAGS_INIT=\"-O2\""));
        assert!(!id.matches("-DCMAKE_CXX_FLAGS_INIT=\"-O2\""));
        assert!(!Identity::for_entry("A.B").matches("-DAxB=1"));
    }

    #[test]
    fn test_entry_identity_ignores_type() {
        let typed = Identity::for_entry("FOO:BOOL");
        assert!(typed.matches("-DFOO=\"OFF\""));
        assert!(typed.matches("-DFOO:BOOL=\"ON\""));
        assert!(Identity::for_entry("FOO").matches("-DFOO:STRING=\"x\""));
        assert!(!typed.matches("-DFOO_BAR:BOOL=\"ON\""));
    }

    #[test]
    #[should_panic(expected = "invalid flag identity pattern")]
    fn test_bad_static_pattern_panics() {
        Identity::from_static("(unclosed");
    }

    #[test]
    fn test_merge_filters_then_appends() {
        let a = Params::from_parts(
            vec!["-G \"Ninja\"".into(), "--fresh".into()],
            BTreeSet::new(),
        );
        let b = Params::from_parts(
            vec!["-G \"Unix Makefiles\"".into()],
            [Identity::from_static(r"-G\s+.+")].into(),
        );

        let merged = a.merge(&b);
        assert_eq!(merged.value(), ["--fresh", "-G \"Unix Makefiles\""]);
        assert_eq!(merged.identities().len(), 1);
    }

    #[test]
    fn test_raw_params_remove_nothing() {
        let a = Params::raw(["--fresh"]);
        let merged = a.merge(&Params::raw(["--fresh"]));
        assert_eq!(merged.value(), ["--fresh", "--fresh"]);
    }

    #[test]
    fn test_replace_with() {
        let params = Params::raw(["-DFOO={targetName}", "-B \"/b/{targetName}\""]);
        let replaced = params.replace_with("{targetName}", "arm64");
        assert_eq!(replaced.value(), ["-DFOO=arm64", "-B \"/b/arm64\""]);
    }

    #[test]
    fn test_to_args_moves_native_passthrough_last() {
        let params = Params::raw(["--build \"/b\"", "-- \"-k\"", "--verbose"]);
        assert_eq!(params.to_args(), ["--build", "/b", "--verbose", "--", "-k"]);
    }

    #[test]
    fn test_find_value() {
        let params = Params::raw(["-S \"/proj/my src\"", "-B \"/proj/build\""]);
        assert_eq!(params.find_value("-S").as_deref(), Some("/proj/my src"));
        assert_eq!(params.find_value("-B").as_deref(), Some("/proj/build"));
        assert_eq!(params.find_value("-G"), None);
    }
}
