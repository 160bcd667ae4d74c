//! Implementation of `sslpack build`.
//!
//! resolve → toolchain environment → tool check → execute → package.
//! Nothing is packaged unless every build step succeeded.

use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::builder::environment::{build_environment, AmbientEnv};
use crate::builder::executor::{BuildExecutor, ExecutionSummary, ProcessRunner};
use crate::builder::packager::{package, ArtifactLayout, PackageReport};
use crate::builder::plan::{BuildPlan, BuildStep, PatchStep};
use crate::builder::requirements::required_tools;
use crate::builder::resolver::TargetResolver;
use crate::core::dependency::{self, DependencyRef};
use crate::core::error::BuildError;
use crate::core::options::OptionSet;
use crate::core::platform::{Os, PlatformDescriptor, SdkDescriptor};
use crate::util::process::{missing_executables, xcrun_sdk};
use crate::util::shell::{Shell, Status};

/// Everything one build needs.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub platform: PlatformDescriptor,
    pub options: OptionSet,
    /// Resolved dependencies (zlib)
    pub dependencies: Vec<DependencyRef>,
    /// The extracted library source tree
    pub source_dir: PathBuf,
    /// Package destination
    pub dest: PathBuf,
    /// Resolve only; run and package nothing
    pub plan_only: bool,
    /// Check required host tools before running anything
    pub check_tools: bool,
    /// Host variables the environment builder may extend
    pub ambient: AmbientEnv,
}

impl BuildRequest {
    pub fn new(
        platform: PlatformDescriptor,
        options: OptionSet,
        source_dir: impl Into<PathBuf>,
        dest: impl Into<PathBuf>,
    ) -> Self {
        BuildRequest {
            platform,
            options,
            dependencies: Vec::new(),
            source_dir: source_dir.into(),
            dest: dest.into(),
            plan_only: false,
            check_tools: true,
            ambient: AmbientEnv::default(),
        }
    }

    pub fn with_dependency(mut self, dep: DependencyRef) -> Self {
        self.dependencies.push(dep);
        self
    }

    /// Dependencies that take part in this build. zlib is ignored when
    /// `no_zlib` is set.
    fn active_dependencies(&self) -> Vec<DependencyRef> {
        self.dependencies
            .iter()
            .filter(|d| !(d.name == "zlib" && self.options.no_zlib()))
            .cloned()
            .collect()
    }
}

/// Result of a build.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub plan: BuildPlan,
    /// `None` for plan-only requests
    pub summary: Option<ExecutionSummary>,
    pub report: Option<PackageReport>,
}

/// Resolve the complete plan for a request without touching the disk.
pub fn plan_build(request: &BuildRequest) -> Result<BuildPlan, BuildError> {
    let deps = request.active_dependencies();
    let plan = TargetResolver::new(&request.source_dir)
        .resolve(&request.platform, &request.options)?;
    let env = build_environment(&request.platform, &deps, &request.ambient)?;
    let mut plan = plan.with_environment(env);

    if dependency::find(&deps, "zlib").is_some() {
        // Configure links some debug targets against Electric Fence
        plan = plan.with_pre_configure(vec![
            BuildStep::Patch(PatchStep::lenient("Configure", "::-lefence::", "::")),
            BuildStep::Patch(PatchStep::lenient("Configure", "::-lefence ", "::")),
        ]);
    }

    tracing::debug!(
        configure_target = %plan.configure_target,
        steps = plan.steps.len(),
        "resolved build plan"
    );
    Ok(plan)
}

/// Run the full pipeline.
pub fn build(
    request: &BuildRequest,
    runner: &dyn ProcessRunner,
    shell: &Shell,
) -> Result<BuildOutcome, BuildError> {
    let start = Instant::now();
    let plan = plan_build(request)?;
    if request.plan_only {
        return Ok(BuildOutcome {
            plan,
            summary: None,
            report: None,
        });
    }

    if request.check_tools {
        check_tools(&request.platform, &request.options)?;
    }

    tracing::info!(
        "building OpenSSL for {} in {}",
        request.platform,
        request.source_dir.display()
    );
    let summary = BuildExecutor::new(runner).with_shell(shell).execute(&plan)?;

    let report = package_build(
        &request.platform,
        &request.options,
        &request.source_dir,
        &request.dest,
        shell,
    )?;

    shell.finished(
        format!("{} ({})", request.platform, plan.configure_target),
        start.elapsed(),
    );
    Ok(BuildOutcome {
        plan,
        summary: Some(summary),
        report: Some(report),
    })
}

/// Fail with the names of any required tools missing from PATH.
pub fn check_tools(platform: &PlatformDescriptor, options: &OptionSet) -> Result<(), BuildError> {
    let missing = missing_executables(required_tools(platform, options));
    if missing.is_empty() {
        return Ok(());
    }
    Err(BuildError::ToolchainDiscovery {
        message: format!("required tools not found on PATH: {}", missing.join(", ")),
    })
}

/// Package an already built source tree into `dest`.
///
/// Artifacts are looked up relative to the directory holding the source
/// tree, which is also where the MSVC install step puts `binaries/`.
pub fn package_build(
    platform: &PlatformDescriptor,
    options: &OptionSet,
    source_dir: &Path,
    dest: &Path,
    shell: &Shell,
) -> Result<PackageReport, BuildError> {
    let source_name = source_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| BuildError::invalid_setting("source", &source_dir.display().to_string()))?;
    let build_root = source_dir
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    shell.status(Status::Packaging, dest.display());
    let layout = ArtifactLayout::for_platform(platform, options, &source_name);
    let report = package(&layout, build_root, dest)?;
    shell.status(
        Status::Packaged,
        format!("{} files into {}", report.files.len(), dest.display()),
    );
    Ok(report)
}

/// Fill in the iOS SDK from `xcrun` when the platform does not carry one.
///
/// Device architectures use the `iphoneos` SDK, everything else the
/// simulator.
pub fn discover_sdk(platform: PlatformDescriptor) -> Result<PlatformDescriptor, BuildError> {
    if platform.os != Os::Ios || platform.sdk.is_some() {
        return Ok(platform);
    }
    let sdk = if platform.arch.is_arm() {
        "iphoneos"
    } else {
        "iphonesimulator"
    };
    let (sysroot, cc) = xcrun_sdk(sdk).map_err(|e| BuildError::ToolchainDiscovery {
        message: format!("{:#}", e),
    })?;
    tracing::debug!("discovered {} SDK at {}", sdk, sysroot.display());
    Ok(platform.with_sdk(SdkDescriptor::new(sysroot, cc)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::executor::RunOutcome;
    use crate::builder::plan::CommandSpec;
    use crate::core::options::BuildOption;
    use crate::core::platform::{Arch, Compiler};
    use crate::util::shell::{ColorChoice, Verbosity};
    use std::cell::RefCell;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    /// Pretends to build: `make` without arguments drops static libraries
    /// into the source tree.
    #[derive(Default)]
    struct FakeBuild {
        commands: RefCell<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    impl ProcessRunner for FakeBuild {
        fn run(
            &self,
            command: &CommandSpec,
            cwd: &Path,
            _env: &BTreeMap<String, String>,
        ) -> Result<RunOutcome, BuildError> {
            let line = command.display_command();
            self.commands.borrow_mut().push(line.clone());
            if self.fail_on.is_some_and(|f| line.starts_with(f)) {
                return Ok(RunOutcome {
                    code: Some(1),
                    output: None,
                });
            }
            if line == "make" {
                for lib in ["libcrypto.a", "libssl.a"] {
                    std::fs::write(cwd.join(lib), "!<arch>").unwrap();
                }
            }
            Ok(RunOutcome {
                code: Some(0),
                output: None,
            })
        }
    }

    fn quiet() -> Shell {
        Shell::new(Verbosity::Quiet, ColorChoice::Never)
    }

    fn source_tree(tmp: &TempDir) -> PathBuf {
        let src = tmp.path().join("openssl-1.0.2p");
        std::fs::create_dir_all(src.join("include/openssl")).unwrap();
        std::fs::write(src.join("include/openssl/ssl.h"), "").unwrap();
        std::fs::write(src.join("LICENSE"), "license").unwrap();
        std::fs::write(src.join("Configure"), "\"debug-linux\",\"gcc:::-lefence::\"").unwrap();
        src
    }

    fn linux_request(src: &Path, dest: &Path) -> BuildRequest {
        let platform =
            PlatformDescriptor::new(Os::Linux, Compiler::Gcc, Arch::X86_64).with_host(Os::Linux);
        let mut request = BuildRequest::new(platform, OptionSet::new(), src, dest);
        request.check_tools = false;
        request
    }

    #[test]
    fn test_build_runs_plan_and_packages() {
        let tmp = TempDir::new().unwrap();
        let src = source_tree(&tmp);
        let dest = tmp.path().join("package");
        let runner = FakeBuild::default();

        let outcome = build(&linux_request(&src, &dest), &runner, &quiet()).unwrap();

        assert_eq!(outcome.plan.configure_target, "linux-x86_64");
        assert_eq!(
            *runner.commands.borrow(),
            vec!["./Configure -fPIC linux-x86_64", "make depend", "make"]
        );
        assert_eq!(outcome.summary.unwrap().commands, 3);
        assert!(dest.join("lib/libcrypto.a").exists());
        assert!(dest.join("lib/libssl.a").exists());
        assert!(dest.join("include/openssl/ssl.h").exists());
        assert!(dest.join("LICENSE").exists());
    }

    #[test]
    fn test_failed_step_packages_nothing() {
        let tmp = TempDir::new().unwrap();
        let src = source_tree(&tmp);
        let dest = tmp.path().join("package");
        let runner = FakeBuild {
            fail_on: Some("make depend"),
            ..Default::default()
        };

        let err = build(&linux_request(&src, &dest), &runner, &quiet()).unwrap_err();
        assert!(matches!(err, BuildError::Process { .. }));
        assert!(!dest.exists());
    }

    #[test]
    fn test_plan_only_has_no_side_effects() {
        let tmp = TempDir::new().unwrap();
        let src = source_tree(&tmp);
        let dest = tmp.path().join("package");
        let runner = FakeBuild::default();
        let mut request = linux_request(&src, &dest);
        request.plan_only = true;

        let outcome = build(&request, &runner, &quiet()).unwrap();
        assert!(outcome.summary.is_none());
        assert!(runner.commands.borrow().is_empty());
        assert!(!dest.exists());
    }

    #[test]
    fn test_zlib_adds_flags_and_lefence_patches() {
        let tmp = TempDir::new().unwrap();
        let src = source_tree(&tmp);
        let zlib = DependencyRef::new("zlib")
            .with_include("/opt/zlib/include")
            .with_lib_dir("/opt/zlib/lib")
            .with_lib_name("z");
        let request = linux_request(&src, tmp.path()).with_dependency(zlib);

        let plan = plan_build(&request).unwrap();
        let patches = plan
            .steps
            .iter()
            .take_while(|s| !matches!(s, BuildStep::Configure(_)))
            .count();
        assert_eq!(patches, 2);
        let configure = plan.configure().unwrap();
        assert!(configure
            .args
            .contains(&"--with-zlib-include=/opt/zlib/include".to_string()));

        let mut request = request;
        request.options.set(BuildOption::NoZlib, true);
        let plan = plan_build(&request).unwrap();
        assert!(matches!(plan.steps[0], BuildStep::Configure(_)));
        assert!(!plan
            .configure()
            .unwrap()
            .args
            .iter()
            .any(|a| a.starts_with("--with-zlib")));
    }

    #[test]
    fn test_zlib_patches_applied_before_configure() {
        let tmp = TempDir::new().unwrap();
        let src = source_tree(&tmp);
        let dest = tmp.path().join("package");
        let zlib = DependencyRef::new("zlib")
            .with_include("/opt/zlib/include")
            .with_lib_dir("/opt/zlib/lib")
            .with_lib_name("z");
        let request = linux_request(&src, &dest).with_dependency(zlib);

        build(&request, &FakeBuild::default(), &quiet()).unwrap();
        let configure = std::fs::read_to_string(src.join("Configure")).unwrap();
        assert!(!configure.contains("-lefence"));
    }

    #[test]
    fn test_package_missing_artifact() {
        let tmp = TempDir::new().unwrap();
        let src = source_tree(&tmp);
        let platform = PlatformDescriptor::new(Os::Linux, Compiler::Gcc, Arch::X86_64);
        let err = package_build(
            &platform,
            &OptionSet::new(),
            &src,
            &tmp.path().join("out"),
            &quiet(),
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::Packaging { .. }));
    }

    #[test]
    fn test_discover_sdk_keeps_explicit_sdk() {
        let platform = PlatformDescriptor::new(Os::Ios, Compiler::AppleClang, Arch::Armv8)
            .with_sdk(SdkDescriptor::new("/sdk/iPhoneOS.sdk", "/usr/bin/clang"));
        let discovered = discover_sdk(platform.clone()).unwrap();
        assert_eq!(discovered, platform);

        let linux = PlatformDescriptor::new(Os::Linux, Compiler::Gcc, Arch::X86_64);
        assert!(discover_sdk(linux).unwrap().sdk.is_none());
    }
}
