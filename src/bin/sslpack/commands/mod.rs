//! Command implementations

pub mod build;
pub mod completions;
pub mod fetch;
pub mod info;
pub mod package;
pub mod plan;

use anyhow::Result;

use crate::cli::PlatformArgs;
use sslpack::core::{DependencyRef, OptionSet, PlatformDescriptor};
use sslpack::util::config::{Profile, Settings};

/// Platform, options and dependencies after merging flags over the profile.
pub struct Resolved {
    pub platform: PlatformDescriptor,
    pub options: OptionSet,
    pub dependencies: Vec<DependencyRef>,
}

pub fn resolve_platform(args: &PlatformArgs) -> Result<Resolved> {
    let mut profile = match &args.profile {
        Some(path) => Profile::load(path)?,
        None => Profile::default(),
    };

    profile.settings.merge(Settings {
        os: args.os.clone(),
        arch: args.arch.clone(),
        compiler: args.compiler.clone(),
        compiler_version: args.compiler_version.clone(),
        runtime: args.runtime.clone(),
        build_type: args.build_type.clone(),
        toolset: args.toolset.clone(),
        host: args.host.clone(),
        sdk_sysroot: args.sdk_sysroot.clone(),
        sdk_cc: args.sdk_cc.clone(),
    });
    let platform = profile.settings.to_platform()?;

    let mut options = profile.options.clone();
    for assignment in &args.options {
        options.apply_assignment(assignment)?;
    }

    let mut dependencies: Vec<DependencyRef> = profile
        .dependency_refs()
        .into_iter()
        .filter(|d| !(d.name == "zlib" && args.zlib_include.is_some()))
        .collect();
    if let Some(include) = &args.zlib_include {
        let mut zlib = DependencyRef::new("zlib")
            .with_include(include)
            .with_lib_name(&args.zlib_name);
        if let Some(lib) = &args.zlib_lib {
            zlib = zlib.with_lib_dir(lib);
        }
        dependencies.push(zlib);
    }

    tracing::debug!("resolved platform {}", platform);
    Ok(Resolved {
        platform,
        options,
        dependencies,
    })
}
