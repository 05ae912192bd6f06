//! Configuration error types and diagnostics.

use thiserror::Error;

use crate::core::platform::Platform;
use crate::util::diagnostic::{hints, Diagnostic};

/// Error in the declared configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown {family} field `{name}`")]
    UnknownField {
        family: &'static str,
        name: String,
        suggestions: Vec<String>,
    },

    #[error("unknown cache entry `{name}`")]
    UnknownEntry {
        name: String,
        suggestions: Vec<String>,
    },

    #[error("cache entry `{key}` is not supported on {platform}")]
    UnsupportedEntry { key: String, platform: Platform },

    #[error("unknown preset `{name}`")]
    UnknownPreset {
        name: String,
        suggestions: Vec<String>,
    },

    #[error("project `{name}` not found")]
    ProjectNotFound {
        name: String,
        suggestions: Vec<String>,
    },

    #[error("target `{name}` not found")]
    TargetNotFound {
        name: String,
        suggestions: Vec<String>,
    },

    #[error("target `{name}` is declared in more than one project")]
    AmbiguousTarget { name: String, projects: Vec<String> },

    #[error("invalid property `{0}`, expected `key=value`")]
    InvalidProperty(String),
}

impl ConfigError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string());

        match self {
            ConfigError::UnknownField {
                family,
                suggestions,
                ..
            } => with_did_you_mean(diag, suggestions)
                .with_suggestion(format!("Check the list of {family} fields in the documentation")),

            ConfigError::UnknownEntry { suggestions, .. } => with_did_you_mean(diag, suggestions)
                .with_suggestion("Use a known entry name such as `c-compiler`")
                .with_suggestion("Or spell the CMake key directly, e.g. `MY_OPTION`"),

            ConfigError::UnsupportedEntry { platform, .. } => diag
                .with_context(format!("the target is declared for the {platform} platform"))
                .with_suggestion("Pick a preset for a platform that understands this entry"),

            ConfigError::UnknownPreset { suggestions, .. } => {
                with_did_you_mean(diag, suggestions).with_suggestion(hints::LIST_PRESETS)
            }

            ConfigError::ProjectNotFound { suggestions, .. }
            | ConfigError::TargetNotFound { suggestions, .. } => {
                with_did_you_mean(diag, suggestions).with_suggestion(hints::LIST_TARGETS)
            }

            ConfigError::AmbiguousTarget { name, projects } => diag
                .with_context(format!("declared in: {}", projects.join(", ")))
                .with_suggestion(format!(
                    "Qualify it with the project name, e.g. `{}:{}`",
                    projects.first().map(String::as_str).unwrap_or("project"),
                    name
                )),

            ConfigError::InvalidProperty(_) => {
                diag.with_suggestion("Pass properties as `-P <target>.sysRoot=/path`")
            }
        }
    }
}

fn with_did_you_mean(diag: Diagnostic, suggestions: &[String]) -> Diagnostic {
    if suggestions.is_empty() {
        diag
    } else {
        diag.with_context(format!("did you mean: {}?", suggestions.join(", ")))
    }
}

/// Names close to `name`, best match first.
pub fn suggest<'a>(name: &str, candidates: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let threshold = (name.chars().count() / 3).max(2);

    let mut scored: Vec<(usize, &str)> = candidates
        .into_iter()
        .map(|candidate| (edit_distance(name, candidate), candidate))
        .filter(|(distance, _)| *distance <= threshold)
        .collect();
    scored.sort();

    scored
        .into_iter()
        .take(3)
        .map(|(_, candidate)| candidate.to_string())
        .collect()
}

fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.chars().enumerate() {
        let mut prev = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let current = row[j + 1];
            row[j + 1] = if ca == *cb {
                prev
            } else {
                1 + prev.min(row[j]).min(current)
            };
            prev = current;
        }
    }

    row[b.len()]
}
