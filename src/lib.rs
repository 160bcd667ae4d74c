//! sslpack - configure, build and package OpenSSL 1.0.2 for many targets
//!
//! This crate maps a platform description (os, compiler, architecture,
//! build type, runtime) and a set of build options onto the OpenSSL build
//! system's own configuration targets, runs the resulting build and
//! collects the libraries and headers into a canonical layout.

pub mod builder;
pub mod core;
pub mod ops;
pub mod sources;
pub mod util;

pub use builder::{BuildPlan, TargetResolver, ToolchainEnvironment};
pub use crate::core::{
    Arch, BuildError, BuildOption, BuildType, Compiler, DependencyRef, MsvcRuntime, OptionSet, Os,
    PlatformDescriptor,
};
pub use ops::{BuildOutcome, BuildRequest};
