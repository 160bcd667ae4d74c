//! Build plan types.
//!
//! A BuildPlan is the resolved, ready-to-execute description of a single
//! build: the configure target, the flags passed to `Configure`, the
//! environment overlay and the ordered steps the executor runs.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::builder::environment::ToolchainEnvironment;
use crate::core::platform::MsvcRuntime;

/// How a command's output is shown while it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Compress output to a progress indicator.
    #[default]
    Heartbeat,
    /// Pass output straight through.
    Stream,
}

/// A command to execute, with program, arguments, and environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// The program to run (e.g., "perl", "make")
    pub program: PathBuf,
    /// Command arguments
    pub args: Vec<String>,
    /// Command-specific environment variables
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<(String, String)>,
    /// Output display mode
    #[serde(default)]
    pub output: OutputMode,
}

impl CommandSpec {
    /// Create a new command spec.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        CommandSpec {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            output: OutputMode::Heartbeat,
        }
    }

    /// Add an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(|a| a.into()));
        self
    }

    /// Add an environment variable.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Stream output instead of compressing it.
    pub fn streamed(mut self) -> Self {
        self.output = OutputMode::Stream;
        self
    }

    /// Display the command for logs and error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_command())
    }
}

/// A literal in-file text replacement, relative to the working directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchStep {
    pub file: PathBuf,
    pub from: String,
    pub to: String,
    /// Fail when `from` is absent instead of warning
    pub strict: bool,
}

impl PatchStep {
    pub fn strict(file: impl Into<PathBuf>, from: impl Into<String>, to: impl Into<String>) -> Self {
        PatchStep {
            file: file.into(),
            from: from.into(),
            to: to.into(),
            strict: true,
        }
    }

    pub fn lenient(file: impl Into<PathBuf>, from: impl Into<String>, to: impl Into<String>) -> Self {
        PatchStep {
            strict: false,
            ..PatchStep::strict(file, from, to)
        }
    }
}

/// A build step in the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BuildStep {
    /// Run the library's configure script
    Configure(CommandSpec),
    /// Run a build command (make, nmake, ...)
    Run(CommandSpec),
    /// Edit a generated or shipped build file
    Patch(PatchStep),
    /// Rewrite the MSVC runtime flag in an nmake file
    ReplaceRuntime { file: PathBuf, runtime: MsvcRuntime },
    /// Rename a file if it exists
    Rename { from: PathBuf, to: PathBuf },
}

impl BuildStep {
    /// Short name used in logs and errors.
    pub fn label(&self) -> &'static str {
        match self {
            BuildStep::Configure(_) => "configure",
            BuildStep::Run(_) => "build",
            BuildStep::Patch(_) => "patch",
            BuildStep::ReplaceRuntime { .. } => "runtime",
            BuildStep::Rename { .. } => "rename",
        }
    }

    /// The command this step spawns, if any.
    pub fn command(&self) -> Option<&CommandSpec> {
        match self {
            BuildStep::Configure(cmd) | BuildStep::Run(cmd) => Some(cmd),
            _ => None,
        }
    }
}

/// A complete build plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildPlan {
    /// Configure target name (e.g. `linux-x86_64`)
    pub configure_target: String,
    /// Option tokens followed by compiler flags
    pub extra_flags: Vec<String>,
    /// Environment overlay for every spawned command
    pub environment: BTreeMap<String, String>,
    /// Directory the steps run in (the library source tree)
    pub working_directory: PathBuf,
    /// Steps in execution order
    pub steps: Vec<BuildStep>,
    /// Index in the configure arguments where option tokens start
    #[serde(skip)]
    pub(crate) flags_at: usize,
}

impl BuildPlan {
    /// The configure command.
    pub fn configure(&self) -> Option<&CommandSpec> {
        self.steps.iter().find_map(|s| match s {
            BuildStep::Configure(cmd) => Some(cmd),
            _ => None,
        })
    }

    /// All commands that will be spawned, in order.
    pub fn commands(&self) -> impl Iterator<Item = &CommandSpec> {
        self.steps.iter().filter_map(BuildStep::command)
    }

    /// Merge a toolchain environment into the plan.
    ///
    /// Variables are overlaid on the plan's environment; configure flags are
    /// inserted in front of the option tokens of the configure command.
    pub fn with_environment(mut self, env: ToolchainEnvironment) -> Self {
        self.environment.extend(env.vars);

        if !env.configure_flags.is_empty() {
            for step in &mut self.steps {
                if let BuildStep::Configure(cmd) = step {
                    let at = self.flags_at.min(cmd.args.len());
                    cmd.args.splice(at..at, env.configure_flags.iter().cloned());
                }
            }
        }
        self
    }

    /// Prepend steps that must run before configuring (source patches).
    pub fn with_pre_configure(mut self, steps: Vec<BuildStep>) -> Self {
        let at = self
            .steps
            .iter()
            .position(|s| matches!(s, BuildStep::Configure(_)))
            .unwrap_or(0);
        self.steps.splice(at..at, steps);
        self
    }
}
