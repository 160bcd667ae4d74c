//! Build configuration and execution.
//!
//! This module turns a platform descriptor and option set into a build plan,
//! prepares the toolchain environment, runs the plan and packages the result.

pub mod environment;
pub mod executor;
pub mod link_info;
pub mod packager;
pub mod plan;
pub mod requirements;
pub mod resolver;

pub use environment::{build_environment, AmbientEnv, ToolchainEnvironment};
pub use executor::{BuildExecutor, ExecutionSummary, ProcessRunner, RunOutcome, SystemRunner};
pub use link_info::link_libraries;
pub use packager::{package, ArtifactLayout, CopyRule, PackageReport};
pub use plan::{BuildPlan, BuildStep, CommandSpec, OutputMode, PatchStep};
pub use requirements::required_tools;
pub use resolver::TargetResolver;
