//! Shell output and progress display.
//!
//! All user-facing status lines go through [`Shell`]:
//! - Status messages right-aligned to a fixed width (`  Configuring ...`)
//! - Optional ANSI colors, detected from the terminal
//! - A [`Heartbeat`] spinner that stands in for long, noisy command output
//!
//! Diagnostic logging is separate and goes through `tracing`.

use std::fmt::Display;
use std::io::{self, IsTerminal};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only
    Quiet,
    /// Status messages and heartbeats
    #[default]
    Normal,
    /// Status messages, raw command output instead of heartbeats
    Verbose,
}

/// Color output mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    /// Detect TTY and use colors if available.
    #[default]
    Auto,
    Always,
    Never,
}

/// Status types for output messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    // Success (green)
    Finished,
    Packaged,

    // In progress (cyan)
    Fetching,
    Configuring,
    Building,
    Patching,
    Packaging,

    // Info (blue)
    Info,

    // Warning (yellow)
    Warning,
}

impl Status {
    fn as_str(&self) -> &'static str {
        match self {
            Status::Finished => "Finished",
            Status::Packaged => "Packaged",
            Status::Fetching => "Fetching",
            Status::Configuring => "Configuring",
            Status::Building => "Building",
            Status::Patching => "Patching",
            Status::Packaging => "Packaging",
            Status::Info => "Info",
            Status::Warning => "Warning",
        }
    }

    fn color_code(&self) -> &'static str {
        match self {
            Status::Finished | Status::Packaged => "\x1b[1;32m",
            Status::Fetching
            | Status::Configuring
            | Status::Building
            | Status::Patching
            | Status::Packaging => "\x1b[1;36m",
            Status::Info => "\x1b[1;34m",
            Status::Warning => "\x1b[1;33m",
        }
    }
}

/// Width status words are right-aligned to.
const STATUS_WIDTH: usize = 12;

/// Central shell for CLI output.
#[derive(Debug)]
pub struct Shell {
    verbosity: Verbosity,
    use_color: bool,
}

impl Shell {
    pub fn new(verbosity: Verbosity, color: ColorChoice) -> Self {
        let use_color = match color {
            ColorChoice::Auto => io::stderr().is_terminal(),
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        };
        Shell {
            verbosity,
            use_color,
        }
    }

    /// Create a shell from the global CLI flags.
    pub fn from_flags(quiet: bool, verbose: bool, no_color: bool) -> Self {
        let verbosity = if quiet {
            Verbosity::Quiet
        } else if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        };
        let color = if no_color {
            ColorChoice::Never
        } else {
            ColorChoice::Auto
        };
        Shell::new(verbosity, color)
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn is_quiet(&self) -> bool {
        self.verbosity == Verbosity::Quiet
    }

    pub fn is_verbose(&self) -> bool {
        self.verbosity == Verbosity::Verbose
    }

    /// Whether output is colored.
    pub fn use_color(&self) -> bool {
        self.use_color
    }

    /// Print a status message: `{status:>12} {message}`.
    ///
    /// In quiet mode only warnings are printed; errors are rendered as
    /// diagnostics by the caller.
    pub fn status(&self, status: Status, msg: impl Display) {
        if self.is_quiet() && status != Status::Warning {
            return;
        }
        eprintln!("{} {}", self.format_status(status), msg);
    }

    pub fn note(&self, msg: impl Display) {
        self.status(Status::Info, msg);
    }

    pub fn warn(&self, msg: impl Display) {
        self.status(Status::Warning, msg);
    }

    /// Print the closing line of a timed operation.
    pub fn finished(&self, msg: impl Display, elapsed: Duration) {
        self.status(
            Status::Finished,
            format!("{} in {}", msg, format_duration(elapsed)),
        );
    }

    fn format_status(&self, status: Status) -> String {
        let text = status.as_str();
        if self.use_color {
            format!(
                "{}{:>width$}\x1b[0m",
                status.color_code(),
                text,
                width = STATUS_WIDTH
            )
        } else {
            format!("{:>width$}", text, width = STATUS_WIDTH)
        }
    }
}

impl Default for Shell {
    fn default() -> Self {
        Shell::new(Verbosity::Normal, ColorChoice::Auto)
    }
}

/// Spinner advanced once per line of compressed command output.
///
/// Draws nothing when stderr is not a terminal.
pub struct Heartbeat {
    pb: ProgressBar,
}

impl Heartbeat {
    pub fn new(label: impl Display) -> Self {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg} ({pos} lines)") {
            pb.set_style(style);
        }
        pb.set_message(label.to_string());
        pb.enable_steady_tick(Duration::from_millis(120));
        Heartbeat { pb }
    }

    /// Record one line of output.
    pub fn beat(&self) {
        self.pb.inc(1);
    }

    pub fn lines(&self) -> u64 {
        self.pb.position()
    }

    pub fn finish(self) {
        self.pb.finish_and_clear();
    }
}

/// Format a duration in a human-readable way.
fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 60.0 {
        format!("{:.2}s", secs)
    } else {
        format!("{:.1}m", secs / 60.0)
    }
}
