//! Build plan execution.
//!
//! Steps run strictly in order inside the plan's working directory. Spawning
//! goes through the [`ProcessRunner`] seam so plans can be executed against a
//! recording runner in tests.

use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use crate::builder::environment::PASSTHROUGH_VARS;
use crate::builder::plan::{BuildPlan, BuildStep, CommandSpec, OutputMode, PatchStep};
use crate::core::error::BuildError;
use crate::core::platform::MsvcRuntime;
use crate::util::env::ScopedEnv;
use crate::util::fs::{read_to_string, replace_in_file, write_string};
use crate::util::process::ProcessBuilder;
use crate::util::shell::{Heartbeat, Shell, Status};

/// Lines of compressed output kept for failure reports.
const OUTPUT_TAIL_LINES: usize = 40;

/// Result of running one command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutcome {
    /// Exit code; `None` when the process was killed by a signal
    pub code: Option<i32>,
    /// Tail of the captured output, when output was not streamed
    pub output: Option<String>,
}

impl RunOutcome {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Spawns the commands of a plan.
pub trait ProcessRunner {
    /// Run `command` in `cwd` with `env` overlaid on the inherited environment.
    fn run(
        &self,
        command: &CommandSpec,
        cwd: &Path,
        env: &BTreeMap<String, String>,
    ) -> Result<RunOutcome, BuildError>;
}

/// Runs commands on the host.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    verbose: bool,
}

impl SystemRunner {
    pub fn new() -> Self {
        SystemRunner::default()
    }

    /// Stream every command's output instead of compressing it.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn uses_heartbeat(&self, command: &CommandSpec) -> bool {
        command.output == OutputMode::Heartbeat && !self.verbose && !cfg!(windows)
    }

    fn run_heartbeat(&self, builder: &ProcessBuilder) -> Result<RunOutcome, BuildError> {
        let program = builder.get_program().to_path_buf();
        let mut cmd = builder.command();
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| BuildError::io(&program, e))?;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let label = program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let heartbeat = Heartbeat::new(label);

        let (mut out_lines, err_lines) = std::thread::scope(|s| {
            let err_reader = s.spawn(|| collect_tail(stderr, &heartbeat));
            let out = collect_tail(stdout, &heartbeat);
            let err = err_reader.join().unwrap_or_default();
            (out, err)
        });

        let status = child.wait().map_err(|e| BuildError::io(&program, e))?;
        heartbeat.finish();

        out_lines.extend(err_lines);
        let start = out_lines.len().saturating_sub(OUTPUT_TAIL_LINES);
        Ok(RunOutcome {
            code: status.code(),
            output: Some(out_lines[start..].join("\n")),
        })
    }
}

/// Read lines until EOF, beating once per line and keeping the last few.
fn collect_tail<R: Read>(source: Option<R>, heartbeat: &Heartbeat) -> Vec<String> {
    let mut tail = Vec::new();
    let Some(source) = source else {
        return tail;
    };
    for line in BufReader::new(source).lines() {
        let Ok(line) = line else { break };
        heartbeat.beat();
        if tail.len() == OUTPUT_TAIL_LINES {
            tail.remove(0);
        }
        tail.push(line);
    }
    tail
}

impl ProcessRunner for SystemRunner {
    fn run(
        &self,
        command: &CommandSpec,
        cwd: &Path,
        env: &BTreeMap<String, String>,
    ) -> Result<RunOutcome, BuildError> {
        let builder = ProcessBuilder::new(&command.program)
            .args(&command.args)
            .cwd(cwd)
            .envs(env)
            .envs(command.env.iter().map(|(k, v)| (k, v)));

        tracing::debug!("running `{}` in {}", builder.display_command(), cwd.display());

        if self.uses_heartbeat(command) {
            return self.run_heartbeat(&builder);
        }

        let status = builder
            .command()
            .status()
            .map_err(|e| BuildError::io(&command.program, e))?;
        Ok(RunOutcome {
            code: status.code(),
            output: None,
        })
    }
}

/// Summary of a successful plan execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionSummary {
    pub steps: usize,
    pub commands: usize,
    pub elapsed: Duration,
}

/// Executes build plans.
pub struct BuildExecutor<'a, R: ProcessRunner + ?Sized> {
    runner: &'a R,
    shell: Option<&'a Shell>,
}

impl<'a, R: ProcessRunner + ?Sized> BuildExecutor<'a, R> {
    pub fn new(runner: &'a R) -> Self {
        BuildExecutor {
            runner,
            shell: None,
        }
    }

    /// Report step progress on `shell`.
    pub fn with_shell(mut self, shell: &'a Shell) -> Self {
        self.shell = Some(shell);
        self
    }

    /// Run every step of the plan, stopping at the first failure.
    ///
    /// The whitelisted toolchain variables of the plan are applied to this
    /// process for the duration of the run and restored afterwards.
    pub fn execute(&self, plan: &BuildPlan) -> Result<ExecutionSummary, BuildError> {
        let start = Instant::now();
        let _scoped = ScopedEnv::apply(
            plan.environment
                .iter()
                .filter(|(k, _)| PASSTHROUGH_VARS.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v)),
        );

        let cwd = plan.working_directory.as_path();
        let mut commands = 0;

        for step in &plan.steps {
            match step {
                BuildStep::Configure(cmd) | BuildStep::Run(cmd) => {
                    let status = match step {
                        BuildStep::Configure(_) => Status::Configuring,
                        _ => Status::Building,
                    };
                    self.status(status, cmd.display_command());
                    self.run_command(step.label(), cmd, plan)?;
                    commands += 1;
                }
                BuildStep::Patch(patch) => {
                    self.status(Status::Patching, patch.file.display());
                    if !apply_patch(cwd, patch)? {
                        self.warn(format!(
                            "`{}` not found in {}, skipping",
                            patch.from,
                            patch.file.display()
                        ));
                    }
                }
                BuildStep::ReplaceRuntime { file, runtime } => {
                    self.status(Status::Patching, format!("{} ({})", file.display(), runtime));
                    replace_runtime(&cwd.join(file), *runtime)?;
                }
                BuildStep::Rename { from, to } => {
                    let from = cwd.join(from);
                    if from.exists() {
                        let to = cwd.join(to);
                        std::fs::rename(&from, &to).map_err(|e| BuildError::io(&from, e))?;
                        tracing::debug!("renamed {} -> {}", from.display(), to.display());
                    }
                }
            }
        }

        Ok(ExecutionSummary {
            steps: plan.steps.len(),
            commands,
            elapsed: start.elapsed(),
        })
    }

    fn run_command(
        &self,
        label: &str,
        cmd: &CommandSpec,
        plan: &BuildPlan,
    ) -> Result<(), BuildError> {
        tracing::info!("{}: {}", label, cmd);
        let outcome = self
            .runner
            .run(cmd, &plan.working_directory, &plan.environment)?;

        if outcome.success() {
            return Ok(());
        }
        if let Some(output) = outcome.output.as_deref().filter(|o| !o.is_empty()) {
            tracing::error!("last output of `{}`:\n{}", cmd.program.display(), output);
        }
        Err(BuildError::Process {
            step: label.to_string(),
            command: cmd.display_command(),
            code: outcome.code,
        })
    }

    fn status(&self, status: Status, msg: impl std::fmt::Display) {
        if let Some(shell) = self.shell {
            shell.status(status, msg);
        }
    }

    fn warn(&self, msg: String) {
        match self.shell {
            Some(shell) => shell.warn(msg),
            None => tracing::warn!("{}", msg),
        }
    }
}

/// Apply a literal text patch relative to `cwd`.
///
/// Returns `false` when a lenient patch found nothing to replace.
pub fn apply_patch(cwd: &Path, patch: &PatchStep) -> Result<bool, BuildError> {
    let path = cwd.join(&patch.file);
    if replace_in_file(&path, &patch.from, &patch.to)? {
        tracing::debug!("patched {}", path.display());
        return Ok(true);
    }
    if patch.strict {
        return Err(BuildError::ToolchainDiscovery {
            message: format!(
                "expected text `{}` not found in {}",
                patch.from,
                path.display()
            ),
        });
    }
    Ok(false)
}

/// Rewrite the first runtime flag found (in `/MDd /MTd /MD /MT` order) to
/// `runtime`, everywhere in the file.
pub fn replace_runtime(path: &Path, runtime: MsvcRuntime) -> Result<(), BuildError> {
    let contents = read_to_string(path)?;
    for candidate in MsvcRuntime::SEARCH_ORDER {
        let flag = candidate.as_flag();
        if contents.contains(&flag) {
            write_string(path, &contents.replace(&flag, &runtime.as_flag()))?;
            tracing::debug!("replaced {} with {} in {}", flag, runtime.as_flag(), path.display());
            return Ok(());
        }
    }
    Err(BuildError::ToolchainDiscovery {
        message: format!("no MSVC runtime flag found in {}", path.display()),
    })
}
