//! Build profiles.
//!
//! A profile is a TOML file describing one build:
//!
//! ```toml
//! [settings]
//! os = "Linux"
//! arch = "x86_64"
//! compiler = "gcc"
//! build_type = "Release"
//!
//! [options]
//! shared = true
//!
//! [dependencies.zlib]
//! include_paths = ["/opt/zlib/include"]
//! lib_paths = ["/opt/zlib/lib"]
//! lib_names = ["z"]
//! ```
//!
//! Settings left out default to the host. Command-line flags are merged on
//! top of the profile and take precedence.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::dependency::DependencyRef;
use crate::core::error::BuildError;
use crate::core::options::OptionSet;
use crate::core::platform::{
    Arch, BuildType, Compiler, MsvcRuntime, Os, PlatformDescriptor, SdkDescriptor,
};

/// A build profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Profile {
    pub settings: Settings,
    pub options: OptionSet,
    pub dependencies: BTreeMap<String, DependencyPaths>,
}

/// Platform settings, as written by the user.
///
/// Values are kept as strings and parsed case-insensitively when the
/// platform is built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub os: Option<String>,
    pub arch: Option<String>,
    pub compiler: Option<String>,
    pub compiler_version: Option<String>,
    pub runtime: Option<String>,
    pub build_type: Option<String>,
    pub toolset: Option<String>,
    /// OS of the build machine; defaults to the current host
    pub host: Option<String>,
    pub sdk_sysroot: Option<PathBuf>,
    pub sdk_cc: Option<PathBuf>,
}

/// Include and library locations of a resolved dependency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DependencyPaths {
    pub include_paths: Vec<PathBuf>,
    pub lib_paths: Vec<PathBuf>,
    pub lib_names: Vec<String>,
    pub shared: bool,
}

impl Profile {
    /// Load a profile from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read profile: {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to parse profile: {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Resolved dependencies, in name order.
    pub fn dependency_refs(&self) -> Vec<DependencyRef> {
        self.dependencies
            .iter()
            .map(|(name, paths)| DependencyRef {
                name: name.clone(),
                include_paths: paths.include_paths.clone(),
                lib_paths: paths.lib_paths.clone(),
                lib_names: paths.lib_names.clone(),
                shared: paths.shared,
            })
            .collect()
    }
}

impl Settings {
    /// Merge another set of settings into this one (other takes precedence).
    pub fn merge(&mut self, other: Settings) {
        fn take<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }
        take(&mut self.os, other.os);
        take(&mut self.arch, other.arch);
        take(&mut self.compiler, other.compiler);
        take(&mut self.compiler_version, other.compiler_version);
        take(&mut self.runtime, other.runtime);
        take(&mut self.build_type, other.build_type);
        take(&mut self.toolset, other.toolset);
        take(&mut self.host, other.host);
        take(&mut self.sdk_sysroot, other.sdk_sysroot);
        take(&mut self.sdk_cc, other.sdk_cc);
    }

    /// Build the platform descriptor, defaulting unset values to the host.
    pub fn to_platform(&self) -> Result<PlatformDescriptor, BuildError> {
        let os = match &self.os {
            Some(os) => os.parse()?,
            None => Os::host(),
        };
        let arch = match &self.arch {
            Some(arch) => arch.parse()?,
            None => host_arch()?,
        };
        let compiler = match &self.compiler {
            Some(compiler) => compiler.parse()?,
            None => default_compiler(os),
        };

        let mut platform = PlatformDescriptor::new(os, compiler, arch);
        if let Some(host) = &self.host {
            platform = platform.with_host(host.parse()?);
        }
        if let Some(build_type) = &self.build_type {
            platform = platform.with_build_type(build_type.parse::<BuildType>()?);
        }
        if let Some(version) = &self.compiler_version {
            platform = platform.with_compiler_version(version.clone());
        }
        if let Some(runtime) = &self.runtime {
            platform = platform.with_runtime(runtime.parse::<MsvcRuntime>()?);
        }
        if let Some(toolset) = &self.toolset {
            platform = platform.with_toolset(toolset.clone());
        }
        match (&self.sdk_sysroot, &self.sdk_cc) {
            (Some(sysroot), Some(cc)) => {
                platform = platform.with_sdk(SdkDescriptor::new(sysroot, cc));
            }
            (None, None) => {}
            (Some(_), None) => return Err(BuildError::invalid_setting("sdk_cc", "<unset>")),
            (None, Some(_)) => {
                return Err(BuildError::invalid_setting("sdk_sysroot", "<unset>"))
            }
        }
        Ok(platform)
    }
}

/// Architecture of the running host.
pub fn host_arch() -> Result<Arch, BuildError> {
    std::env::consts::ARCH.parse()
}

/// Compiler assumed when a profile does not name one.
pub fn default_compiler(os: Os) -> Compiler {
    match os {
        Os::Windows => Compiler::Msvc,
        os if os.is_apple() => Compiler::AppleClang,
        Os::Android | Os::FreeBSD => Compiler::Clang,
        _ => Compiler::Gcc,
    }
}
