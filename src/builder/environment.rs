//! Toolchain environment preparation.
//!
//! Given a platform and the resolved dependencies, produce the environment
//! variables and extra `Configure` flags a build needs: zlib paths, mobile
//! SDK roots and compiler drivers, Windows XP SDK overlays.
//!
//! The builder never reads the process environment directly. Whitelisted
//! host variables are captured once into an [`AmbientEnv`] snapshot, which
//! keeps [`build_environment`] pure and repeatable.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::dependency::{self, DependencyRef};
use crate::core::error::BuildError;
use crate::core::platform::{Arch, Compiler, Os, PlatformDescriptor};

/// Host variables the builder may extend.
pub const PASSTHROUGH_VARS: [&str; 6] = ["PATH", "INCLUDE", "LIB", "CL", "LINK", "ProgramFiles(x86)"];

/// Snapshot of the whitelisted host environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AmbientEnv {
    vars: BTreeMap<String, String>,
}

impl AmbientEnv {
    /// Capture the whitelisted variables from the current process.
    pub fn capture() -> Self {
        let vars = PASSTHROUGH_VARS
            .iter()
            .filter_map(|key| std::env::var(key).ok().map(|v| (key.to_string(), v)))
            .collect();
        AmbientEnv { vars }
    }

    /// Build a snapshot from explicit pairs. Non-whitelisted keys are dropped.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(k, _)| PASSTHROUGH_VARS.contains(&k.as_str()))
            .collect();
        AmbientEnv { vars }
    }

    /// Value of a variable, empty when unset.
    pub fn get(&self, key: &str) -> &str {
        self.vars.get(key).map(String::as_str).unwrap_or("")
    }
}

/// Environment variables and configure flags for one build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolchainEnvironment {
    pub vars: BTreeMap<String, String>,
    pub configure_flags: Vec<String>,
}

impl ToolchainEnvironment {
    fn set(&mut self, key: &str, value: impl Into<String>) {
        self.vars.insert(key.to_string(), value.into());
    }
}

/// Compute the toolchain environment for a build.
pub fn build_environment(
    platform: &PlatformDescriptor,
    deps: &[DependencyRef],
    ambient: &AmbientEnv,
) -> Result<ToolchainEnvironment, BuildError> {
    let mut env = ToolchainEnvironment::default();

    if let Some(zlib) = dependency::find(deps, "zlib") {
        env.configure_flags = zlib_flags(platform, zlib)?;
    }

    match platform.os {
        Os::Ios => ios_environment(platform, &mut env)?,
        Os::Android => android_environment(platform, &mut env)?,
        Os::Windows if platform.compiler == Compiler::Msvc && platform.is_xp_toolset() => {
            xp_environment(platform, ambient, &mut env)?
        }
        _ => {}
    }

    tracing::debug!(
        vars = env.vars.len(),
        flags = env.configure_flags.len(),
        "prepared toolchain environment"
    );
    Ok(env)
}

/// `--with-zlib-*` flags.
///
/// Windows needs the full library file; elsewhere the directory is enough
/// since the linker searches it.
fn zlib_flags(
    platform: &PlatformDescriptor,
    zlib: &DependencyRef,
) -> Result<Vec<String>, BuildError> {
    let include = zlib.first_include()?.display().to_string();
    let lib_dir = zlib.first_lib_dir()?.display().to_string();

    let lib = if platform.os == Os::Windows {
        format!("{}/{}.lib", lib_dir, zlib.first_lib_name()?)
    } else {
        lib_dir
    };

    let mut flags = vec![
        format!("--with-zlib-include={}", include),
        format!("--with-zlib-lib={}", lib),
    ];

    // MSYS tools only understand /c/... style paths
    if platform.is_mingw() && !platform.is_cross_building() {
        flags = flags.iter().map(|f| msys_path(f)).collect();
    }

    Ok(flags)
}

fn ios_environment(
    platform: &PlatformDescriptor,
    env: &mut ToolchainEnvironment,
) -> Result<(), BuildError> {
    let sdk = platform
        .sdk
        .as_ref()
        .ok_or_else(|| BuildError::ToolchainDiscovery {
            message: "iOS builds need an SDK sysroot and compiler (--sdk-sysroot, --sdk-cc)"
                .to_string(),
        })?;

    let apple_arch = apple_arch(platform.arch).ok_or_else(|| {
        BuildError::UnsupportedArchitecture {
            os: platform.os.to_string(),
            arch: platform.arch.to_string(),
        }
    })?;

    let mut cc = format!("{} -arch {}", sdk.cc.display(), apple_arch);
    if !platform.arch.is_arm() {
        cc.push_str(" -DOPENSSL_NO_ASM");
    }
    env.set("CC", cc);

    let sdk_name = sdk
        .sysroot
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let cross_top = sdk
        .sysroot
        .parent()
        .and_then(Path::parent)
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    env.set("CROSS_SDK", sdk_name);
    env.set("CROSS_TOP", cross_top);

    Ok(())
}

fn android_environment(
    platform: &PlatformDescriptor,
    env: &mut ToolchainEnvironment,
) -> Result<(), BuildError> {
    // Without an SDK descriptor the profile's own CC/ANDROID_DEV are used.
    let Some(sdk) = platform.sdk.as_ref() else {
        return Ok(());
    };

    let triple = android_triple(platform.arch).ok_or_else(|| {
        BuildError::UnsupportedArchitecture {
            os: platform.os.to_string(),
            arch: platform.arch.to_string(),
        }
    })?;

    let sysroot = sdk.sysroot.display().to_string();
    env.set("CROSS_SYSROOT", sysroot.clone());
    env.set("ANDROID_DEV", format!("{}/usr", sysroot));

    if platform.compiler == Compiler::Clang {
        env.set("CC", format!("{} --target={}", sdk.cc.display(), triple));
        env.set("CFLAGS", format!("--sysroot={}", sysroot));
    } else {
        env.set("CC", sdk.cc.display().to_string());
    }

    Ok(())
}

/// Overlay the Windows 7.1A SDK used by the `*_xp` toolsets.
///
/// PATH, INCLUDE and LIB are prepended to, never replaced, so host toolchain
/// discovery keeps working.
fn xp_environment(
    platform: &PlatformDescriptor,
    ambient: &AmbientEnv,
    env: &mut ToolchainEnvironment,
) -> Result<(), BuildError> {
    let program_files = ambient.get("ProgramFiles(x86)");
    if program_files.is_empty() {
        return Err(BuildError::ToolchainDiscovery {
            message: "ProgramFiles(x86) is not set; cannot locate the Windows 7.1A SDK".to_string(),
        });
    }
    let sdk = format!("{}\\Microsoft SDKs\\Windows\\v7.1A\\", program_files);

    let (lib_dir, subsystem) = match platform.arch {
        Arch::X86 => ("Lib;", "5.01"),
        Arch::X86_64 => ("Lib\\x64;", "5.02"),
        other => {
            return Err(BuildError::UnsupportedArchitecture {
                os: platform.os.to_string(),
                arch: other.to_string(),
            })
        }
    };

    env.set("PATH", format!("{}Bin;{}", sdk, ambient.get("PATH")));
    env.set("INCLUDE", format!("{}Include;{}", sdk, ambient.get("INCLUDE")));
    env.set("LIB", format!("{}{}{}", sdk, lib_dir, ambient.get("LIB")));
    env.set("CL", format!("/D_USING_V110_SDK71_;{}", ambient.get("CL")));
    env.set(
        "LINK",
        format!("/SUBSYSTEM:CONSOLE,{} {}", subsystem, ambient.get("LINK")),
    );

    Ok(())
}

/// Architecture name understood by Apple's `-arch`.
pub fn apple_arch(arch: Arch) -> Option<&'static str> {
    match arch {
        Arch::Armv7 => Some("armv7"),
        Arch::Armv7s => Some("armv7s"),
        Arch::Armv7k => Some("armv7k"),
        Arch::Armv8 => Some("arm64"),
        Arch::Armv8_32 => Some("arm64_32"),
        Arch::Armv8_3 => Some("arm64e"),
        Arch::X86 => Some("i386"),
        Arch::X86_64 => Some("x86_64"),
        _ => None,
    }
}

/// Clang target triple for Android.
pub fn android_triple(arch: Arch) -> Option<&'static str> {
    match arch {
        a if a.is_armv7() => Some("armv7a-linux-androideabi"),
        Arch::Armv8 => Some("aarch64-linux-android"),
        Arch::X86 => Some("i686-linux-android"),
        Arch::X86_64 => Some("x86_64-linux-android"),
        Arch::Mips => Some("mipsel-linux-android"),
        _ => None,
    }
}

/// Convert `C:\dir\file` style paths inside a string to `/c/dir/file`.
pub fn msys_path(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let chars: Vec<char> = s.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let at_word_start = i == 0 || matches!(chars[i - 1], '=' | ' ' | '"');
        if at_word_start
            && chars[i].is_ascii_alphabetic()
            && chars.get(i + 1) == Some(&':')
            && matches!(chars.get(i + 2), Some('\\') | Some('/'))
        {
            out.push('/');
            out.push(chars[i].to_ascii_lowercase());
            i += 2;
            continue;
        }
        out.push(if chars[i] == '\\' { '/' } else { chars[i] });
        i += 1;
    }
    out
}
