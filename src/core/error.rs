//! Build error taxonomy.
//!
//! Every failure aborts the whole build. Variants carry the platform values,
//! failing command or missing path so the caller can diagnose the problem
//! without re-running with extra logging.

use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::Diagnostic;

/// Errors raised while resolving, preparing, executing or packaging a build.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum BuildError {
    #[error("unsupported platform: os `{os}`, arch `{arch}`, compiler `{compiler}`")]
    #[diagnostic(code(sslpack::resolve::unsupported_platform))]
    UnsupportedPlatform {
        os: String,
        arch: String,
        compiler: String,
    },

    #[error("unsupported architecture `{arch}` for {os}")]
    #[diagnostic(code(sslpack::resolve::unsupported_arch))]
    UnsupportedArchitecture { os: String, arch: String },

    #[error("unsupported compiler `{compiler}` on {os}")]
    #[diagnostic(code(sslpack::resolve::unsupported_compiler))]
    UnsupportedCompiler { os: String, compiler: String },

    #[error("unknown build option `{name}`")]
    #[diagnostic(
        code(sslpack::options::unknown),
        help("run `sslpack info --options` to list the known options")
    )]
    UnknownOption { name: String },

    #[error("invalid value `{value}` for `{field}`")]
    #[diagnostic(code(sslpack::settings::invalid))]
    InvalidSetting { field: String, value: String },

    #[error("cannot resolve dependency `{name}`: {reason}")]
    #[diagnostic(code(sslpack::env::dependency))]
    DependencyResolution { name: String, reason: String },

    #[error("{step} step failed with exit code {}: `{command}`", display_code(.code))]
    #[diagnostic(
        code(sslpack::exec::process),
        help("re-run with `--show-output` to see the full tool output")
    )]
    Process {
        step: String,
        command: String,
        code: Option<i32>,
    },

    #[error("expected artifact `{pattern}` not found under {}", .root.display())]
    #[diagnostic(code(sslpack::package::missing_artifact))]
    Packaging { pattern: String, root: PathBuf },

    #[error("toolchain discovery failed: {message}")]
    #[diagnostic(code(sslpack::toolchain::discovery))]
    ToolchainDiscovery { message: String },

    #[error("checksum mismatch for {}: expected {expected}, got {actual}", .path.display())]
    #[diagnostic(code(sslpack::source::checksum))]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("failed to fetch {url}: {message}")]
    #[diagnostic(
        code(sslpack::source::fetch),
        help("check the network connection or pass a local archive with `--archive`")
    )]
    Fetch { url: String, message: String },

    #[error("I/O error at {}", .path.display())]
    #[diagnostic(code(sslpack::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(c) => c.to_string(),
        None => "<signal>".to_string(),
    }
}

impl BuildError {
    pub(crate) fn invalid_setting(field: &str, value: &str) -> Self {
        BuildError::InvalidSetting {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string());
        match self {
            BuildError::UnsupportedPlatform { .. } => diag.with_suggestion(
                "Supported systems: Linux, Android, SunOS, FreeBSD, Windows, Macos, iOS",
            ),
            BuildError::UnsupportedArchitecture { os, .. } => diag.with_suggestion(format!(
                "Run `sslpack info --targets` to see the architectures supported on {}",
                os
            )),
            BuildError::UnsupportedCompiler { os, .. } => diag.with_context(format!(
                "{} only supports the compilers listed by `sslpack info --targets`",
                os
            )),
            BuildError::UnknownOption { name } => diag
                .with_context(format!("`{}` is not a recognised build option", name))
                .with_suggestion("Check the option spelling; options use underscores"),
            BuildError::InvalidSetting { field, .. } => {
                diag.with_suggestion(format!("Check the `{}` setting in your profile", field))
            }
            BuildError::DependencyResolution { name, .. } => diag.with_suggestion(format!(
                "Pass include and library paths for `{}` or disable it with `-o no_{}=True`",
                name, name
            )),
            BuildError::Process { command, .. } => diag
                .with_context(format!("command: {}", command))
                .with_suggestion("Re-run with `--show-output --verbose` for the tool output"),
            BuildError::Packaging { root, .. } => diag
                .with_location(root.clone())
                .with_context("the build reported success but the artifact is missing"),
            BuildError::ToolchainDiscovery { .. } => {
                diag.with_suggestion("Ensure the toolchain is installed and on PATH")
            }
            BuildError::ChecksumMismatch { path, .. } => diag
                .with_location(path.clone())
                .with_suggestion("Delete the cached archive and fetch it again"),
            BuildError::Fetch { url, .. } => diag
                .with_context(format!("source: {}", url))
                .with_suggestion("Download the archive manually and pass it with `--archive <file>`"),
            BuildError::Io { path, source } => diag
                .with_location(path.clone())
                .with_context(source.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_arch_message_carries_values() {
        let err = BuildError::UnsupportedArchitecture {
            os: "Linux".to_string(),
            arch: "riscv64".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("riscv64"));
        assert!(msg.contains("Linux"));
    }

    #[test]
    fn test_process_error_diagnostic() {
        let err = BuildError::Process {
            step: "configure".to_string(),
            command: "./Configure linux-x86_64".to_string(),
            code: Some(2),
        };
        assert!(err.to_string().contains("exit code 2"));

        let output = err.to_diagnostic().format(false);
        assert!(output.contains("command: ./Configure linux-x86_64"));
        assert!(output.contains("help: consider:"));
    }

    #[test]
    fn test_process_error_without_code() {
        let err = BuildError::Process {
            step: "make".to_string(),
            command: "make".to_string(),
            code: None,
        };
        assert!(err.to_string().contains("<signal>"));
    }
}
