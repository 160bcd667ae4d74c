//! Core data structures for sslpack.
//!
//! This module contains the inputs every build is described by:
//! - Platform descriptors (os, compiler, arch, build type)
//! - Build option sets
//! - Resolved dependency references
//! - The build error taxonomy

pub mod dependency;
pub mod error;
pub mod options;
pub mod platform;

pub use dependency::DependencyRef;
pub use error::BuildError;
pub use options::{BuildOption, OptionSet};
pub use platform::{Arch, BuildType, Compiler, MsvcRuntime, Os, PlatformDescriptor, SdkDescriptor};
