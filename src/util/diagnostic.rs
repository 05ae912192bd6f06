//! User-friendly diagnostic messages.
//!
//! Configuration mistakes are reported with the root cause, the context that
//! led to it, and concrete next steps.

use std::fmt;
use std::path::PathBuf;

/// Common suggestion messages.
pub mod hints {
    /// Suggestion when no manifest file is found.
    pub const NO_MANIFEST: &str = "Create a Keel.toml or pass `--manifest-path`";

    /// Suggestion when a target or project is not found.
    pub const LIST_TARGETS: &str = "Run `keel targets` to see declared targets";

    /// Suggestion when a preset is not found.
    pub const LIST_PRESETS: &str = "Run `keel presets` to see available presets";

    /// Suggestion when CMake itself fails.
    pub const TOOL_FAILED: &str = "Run with `--verbose` to see the full command line";
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic message with optional suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    pub severity: Severity,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
    /// Related file, usually the manifest
    pub location: Option<PathBuf>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Error,
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            ..Diagnostic::error(message)
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self, color: bool) -> String {
        let mut output = String::new();

        let severity = match (color, self.severity) {
            (true, Severity::Error) => "\x1b[1;31merror\x1b[0m".to_string(),
            (true, Severity::Warning) => "\x1b[1;33mwarning\x1b[0m".to_string(),
            (false, severity) => severity.to_string(),
        };

        output.push_str(&format!("{}: {}\n", severity, self.message));

        if let Some(ref path) = self.location {
            output.push_str(&format!("  --> {}\n", path.display()));
        }

        for ctx in &self.context {
            output.push_str(&format!("  = {}\n", ctx));
        }

        if !self.suggestions.is_empty() {
            output.push('\n');
            let help = if color {
                "\x1b[1;32mhelp\x1b[0m"
            } else {
                "help"
            };
            output.push_str(&format!("{}: consider:\n", help));
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_formatting() {
        let diag = Diagnostic::error("unknown preset `linuxX46`")
            .with_context("did you mean: linuxX64?")
            .with_location("Keel.toml")
            .with_suggestion(hints::LIST_PRESETS);

        let output = diag.format(false);
        assert!(output.starts_with("error: unknown preset"));
        assert!(output.contains("--> Keel.toml"));
        assert!(output.contains("= did you mean: linuxX64?"));
        assert!(output.contains("help: consider:"));
        assert!(output.contains("1. Run `keel presets`"));
    }

    #[test]
    fn test_warning_severity() {
        let diag = Diagnostic::warning("stream still open");
        assert!(diag.format(false).starts_with("warning: stream still open"));
    }
}
