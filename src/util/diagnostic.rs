//! User-facing diagnostic messages.
//!
//! Every build error renders as a message, the values involved and at least
//! one thing the user can try next.

use std::fmt;
use std::path::PathBuf;

/// An error message with optional suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub message: String,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
    /// Related file or directory
    pub location: Option<PathBuf>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
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
        let label = if color { "\x1b[1;31merror\x1b[0m" } else { "error" };
        let mut output = format!("{}: {}\n", label, self.message);

        if let Some(ref path) = self.location {
            output.push_str(&format!("  --> {}\n", path.display()));
        }

        for ctx in &self.context {
            output.push_str(&format!("  = {}\n", ctx));
        }

        if !self.suggestions.is_empty() {
            let help = if color { "\x1b[1;32mhelp\x1b[0m" } else { "help" };
            output.push('\n');
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
        f.write_str(&self.format(false))
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
        let diag = Diagnostic::error("unsupported architecture `riscv64` for Linux")
            .with_location("/tmp/build")
            .with_context("arch comes from the profile")
            .with_suggestion("Pick an architecture from `sslpack info --targets`")
            .with_suggestion("Override it with `--arch`");

        let output = diag.format(false);
        assert!(output.starts_with("error: unsupported architecture"));
        assert!(output.contains("  --> /tmp/build"));
        assert!(output.contains("  = arch comes from the profile"));
        assert!(output.contains("help: consider:"));
        assert!(output.contains("2. Override it with `--arch`"));
    }

    #[test]
    fn test_plain_error_has_no_help() {
        let output = Diagnostic::error("pattern matched nothing").format(false);
        assert_eq!(output, "error: pattern matched nothing\n");
        assert!(Diagnostic::error("x").format(true).contains("\x1b[1;31m"));
    }
}
