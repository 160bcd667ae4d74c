//! High-level operations.
//!
//! This module contains the implementation of sslpack commands.

pub mod build;

pub use build::{
    build, check_tools, discover_sdk, package_build, plan_build, BuildOutcome, BuildRequest,
};
