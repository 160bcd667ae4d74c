//! Platform descriptors - what we are building for.
//!
//! A [`PlatformDescriptor`] is the immutable record of settings (os,
//! compiler, architecture, build type, ...) a single build is configured
//! for. It is produced by the caller (CLI flags or a profile) and consumed
//! read-only by the resolver, the environment builder and the packager.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::BuildError;

/// Target operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Os {
    Linux,
    Android,
    #[serde(rename = "SunOS", alias = "Solaris")]
    SunOs,
    FreeBSD,
    Windows,
    Macos,
    #[serde(rename = "iOS")]
    Ios,
    #[serde(rename = "watchOS")]
    WatchOs,
    #[serde(rename = "tvOS")]
    TvOs,
    Emscripten,
    Arduino,
    WindowsStore,
}

impl Os {
    pub const ALL: [Os; 12] = [
        Os::Linux,
        Os::Android,
        Os::SunOs,
        Os::FreeBSD,
        Os::Windows,
        Os::Macos,
        Os::Ios,
        Os::WatchOs,
        Os::TvOs,
        Os::Emscripten,
        Os::Arduino,
        Os::WindowsStore,
    ];

    /// Detect the host operating system.
    ///
    /// Unknown hosts are treated as Linux, which only affects the
    /// cross-building check.
    pub fn host() -> Self {
        match std::env::consts::OS {
            "windows" => Os::Windows,
            "macos" => Os::Macos,
            "freebsd" => Os::FreeBSD,
            "solaris" | "illumos" => Os::SunOs,
            "android" => Os::Android,
            "ios" => Os::Ios,
            _ => Os::Linux,
        }
    }

    /// Settings name, as written in profiles.
    pub fn as_str(&self) -> &'static str {
        match self {
            Os::Linux => "Linux",
            Os::Android => "Android",
            Os::SunOs => "SunOS",
            Os::FreeBSD => "FreeBSD",
            Os::Windows => "Windows",
            Os::Macos => "Macos",
            Os::Ios => "iOS",
            Os::WatchOs => "watchOS",
            Os::TvOs => "tvOS",
            Os::Emscripten => "Emscripten",
            Os::Arduino => "Arduino",
            Os::WindowsStore => "WindowsStore",
        }
    }

    /// Apple platforms produce `.dylib` shared libraries.
    pub fn is_apple(&self) -> bool {
        matches!(self, Os::Macos | Os::Ios | Os::WatchOs | Os::TvOs)
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Os {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        let os = match lower.as_str() {
            "solaris" => Os::SunOs,
            "darwin" | "macosx" => Os::Macos,
            _ => Os::ALL
                .into_iter()
                .find(|os| os.as_str().eq_ignore_ascii_case(&lower))
                .ok_or_else(|| BuildError::invalid_setting("os", s))?,
        };
        Ok(os)
    }
}

/// CPU architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    X86,
    #[serde(rename = "x86_64")]
    X86_64,
    Ppc32,
    Ppc64le,
    Ppc64,
    Armv4,
    Armv4i,
    Armv5el,
    Armv5hf,
    Armv6,
    Armv7,
    Armv7hf,
    Armv7s,
    Armv7k,
    Armv8,
    #[serde(rename = "armv8_32")]
    Armv8_32,
    #[serde(rename = "armv8.3")]
    Armv8_3,
    Sparc,
    Sparcv9,
    Mips,
    Mips64,
    Avr,
    S390,
    S390x,
    Riscv32,
    Riscv64,
    Wasm,
}

impl Arch {
    pub const ALL: [Arch; 27] = [
        Arch::X86,
        Arch::X86_64,
        Arch::Ppc32,
        Arch::Ppc64le,
        Arch::Ppc64,
        Arch::Armv4,
        Arch::Armv4i,
        Arch::Armv5el,
        Arch::Armv5hf,
        Arch::Armv6,
        Arch::Armv7,
        Arch::Armv7hf,
        Arch::Armv7s,
        Arch::Armv7k,
        Arch::Armv8,
        Arch::Armv8_32,
        Arch::Armv8_3,
        Arch::Sparc,
        Arch::Sparcv9,
        Arch::Mips,
        Arch::Mips64,
        Arch::Avr,
        Arch::S390,
        Arch::S390x,
        Arch::Riscv32,
        Arch::Riscv64,
        Arch::Wasm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::X86 => "x86",
            Arch::X86_64 => "x86_64",
            Arch::Ppc32 => "ppc32",
            Arch::Ppc64le => "ppc64le",
            Arch::Ppc64 => "ppc64",
            Arch::Armv4 => "armv4",
            Arch::Armv4i => "armv4i",
            Arch::Armv5el => "armv5el",
            Arch::Armv5hf => "armv5hf",
            Arch::Armv6 => "armv6",
            Arch::Armv7 => "armv7",
            Arch::Armv7hf => "armv7hf",
            Arch::Armv7s => "armv7s",
            Arch::Armv7k => "armv7k",
            Arch::Armv8 => "armv8",
            Arch::Armv8_32 => "armv8_32",
            Arch::Armv8_3 => "armv8.3",
            Arch::Sparc => "sparc",
            Arch::Sparcv9 => "sparcv9",
            Arch::Mips => "mips",
            Arch::Mips64 => "mips64",
            Arch::Avr => "avr",
            Arch::S390 => "s390",
            Arch::S390x => "s390x",
            Arch::Riscv32 => "riscv32",
            Arch::Riscv64 => "riscv64",
            Arch::Wasm => "wasm",
        }
    }

    /// Any of the `arm*` architectures.
    pub fn is_arm(&self) -> bool {
        self.as_str().starts_with("arm")
    }

    /// The armv7 family (`armv7`, `armv7hf`, `armv7s`, `armv7k`).
    pub fn is_armv7(&self) -> bool {
        self.as_str().starts_with("armv7")
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Arch {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        match lower.as_str() {
            "x86-64" | "amd64" => return Ok(Arch::X86_64),
            "i386" | "i686" => return Ok(Arch::X86),
            "aarch64" | "arm64" => return Ok(Arch::Armv8),
            _ => {}
        }
        Arch::ALL
            .into_iter()
            .find(|arch| arch.as_str() == lower)
            .ok_or_else(|| BuildError::invalid_setting("arch", s))
    }
}

/// C compiler family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Compiler {
    #[serde(rename = "gcc")]
    Gcc,
    #[serde(rename = "clang")]
    Clang,
    #[serde(rename = "apple-clang")]
    AppleClang,
    #[serde(rename = "Visual Studio", alias = "msvc")]
    Msvc,
    #[serde(rename = "sun-cc")]
    SunCc,
    #[serde(rename = "intel")]
    Intel,
}

impl Compiler {
    pub const ALL: [Compiler; 6] = [
        Compiler::Gcc,
        Compiler::Clang,
        Compiler::AppleClang,
        Compiler::Msvc,
        Compiler::SunCc,
        Compiler::Intel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Compiler::Gcc => "gcc",
            Compiler::Clang => "clang",
            Compiler::AppleClang => "apple-clang",
            Compiler::Msvc => "Visual Studio",
            Compiler::SunCc => "sun-cc",
            Compiler::Intel => "intel",
        }
    }

    /// gcc, clang and apple-clang share the GNU command line.
    pub fn is_gcc_family(&self) -> bool {
        matches!(self, Compiler::Gcc | Compiler::Clang | Compiler::AppleClang)
    }
}

impl fmt::Display for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Compiler {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        match lower.as_str() {
            "msvc" | "visual studio" | "vs" | "cl" => Ok(Compiler::Msvc),
            "suncc" | "sun-cc" => Ok(Compiler::SunCc),
            "appleclang" | "apple-clang" => Ok(Compiler::AppleClang),
            _ => Compiler::ALL
                .into_iter()
                .find(|c| c.as_str() == lower)
                .ok_or_else(|| BuildError::invalid_setting("compiler", s)),
        }
    }
}

/// Debug or release build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BuildType {
    Debug,
    #[default]
    Release,
}

impl BuildType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildType::Debug => "Debug",
            BuildType::Release => "Release",
        }
    }

    pub fn is_debug(&self) -> bool {
        *self == BuildType::Debug
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildType {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(BuildType::Debug),
            "release" => Ok(BuildType::Release),
            _ => Err(BuildError::invalid_setting("build_type", s)),
        }
    }
}

/// MSVC C runtime library selection.
///
/// Static libraries built by the visual builder carry this identifier in
/// their file name until packaging renames them back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MsvcRuntime {
    MD,
    MT,
    MDd,
    MTd,
}

impl MsvcRuntime {
    /// Tokens searched, in order, when rewriting nmake files.
    pub const SEARCH_ORDER: [MsvcRuntime; 4] =
        [MsvcRuntime::MDd, MsvcRuntime::MTd, MsvcRuntime::MD, MsvcRuntime::MT];

    pub fn as_str(&self) -> &'static str {
        match self {
            MsvcRuntime::MD => "MD",
            MsvcRuntime::MT => "MT",
            MsvcRuntime::MDd => "MDd",
            MsvcRuntime::MTd => "MTd",
        }
    }

    /// Compiler flag form (`/MD`, ...).
    pub fn as_flag(&self) -> String {
        format!("/{}", self.as_str())
    }

    /// Default runtime for a build type (dynamic CRT).
    pub fn default_for(build_type: BuildType) -> Self {
        match build_type {
            BuildType::Debug => MsvcRuntime::MDd,
            BuildType::Release => MsvcRuntime::MD,
        }
    }
}

impl fmt::Display for MsvcRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MsvcRuntime {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim_start_matches('/');
        MsvcRuntime::SEARCH_ORDER
            .into_iter()
            .find(|rt| rt.as_str() == trimmed)
            .ok_or_else(|| BuildError::invalid_setting("runtime", s))
    }
}

/// Cross-compilation SDK for mobile targets.
///
/// Discovered by the caller (e.g. `xcrun --sdk iphoneos --show-sdk-path`)
/// so that resolving stays free of process spawning.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SdkDescriptor {
    /// SDK sysroot directory
    pub sysroot: PathBuf,
    /// C compiler driver inside the SDK toolchain
    pub cc: PathBuf,
}

impl SdkDescriptor {
    pub fn new(sysroot: impl Into<PathBuf>, cc: impl Into<PathBuf>) -> Self {
        SdkDescriptor {
            sysroot: sysroot.into(),
            cc: cc.into(),
        }
    }
}

/// Windows XP targeting toolsets.
pub const XP_TOOLSETS: [&str; 4] = ["v110_xp", "v120_xp", "v140_xp", "v141_xp"];

/// Immutable description of the platform a build targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlatformDescriptor {
    pub os: Os,
    pub compiler: Compiler,
    #[serde(default)]
    pub compiler_version: String,
    #[serde(default)]
    pub runtime: Option<MsvcRuntime>,
    pub arch: Arch,
    #[serde(default)]
    pub build_type: BuildType,
    #[serde(default)]
    pub toolset: Option<String>,
    /// OS of the machine running the build
    pub host: Os,
    #[serde(default)]
    pub sdk: Option<SdkDescriptor>,
}

impl PlatformDescriptor {
    /// Create a release descriptor built on the current host.
    pub fn new(os: Os, compiler: Compiler, arch: Arch) -> Self {
        PlatformDescriptor {
            os,
            compiler,
            compiler_version: String::new(),
            runtime: None,
            arch,
            build_type: BuildType::Release,
            toolset: None,
            host: Os::host(),
            sdk: None,
        }
    }

    pub fn with_build_type(mut self, build_type: BuildType) -> Self {
        self.build_type = build_type;
        self
    }

    pub fn with_compiler_version(mut self, version: impl Into<String>) -> Self {
        self.compiler_version = version.into();
        self
    }

    pub fn with_runtime(mut self, runtime: MsvcRuntime) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn with_toolset(mut self, toolset: impl Into<String>) -> Self {
        self.toolset = Some(toolset.into());
        self
    }

    pub fn with_host(mut self, host: Os) -> Self {
        self.host = host;
        self
    }

    pub fn with_sdk(mut self, sdk: SdkDescriptor) -> Self {
        self.sdk = Some(sdk);
        self
    }

    pub fn is_debug(&self) -> bool {
        self.build_type.is_debug()
    }

    /// Building for a different OS than the one we run on.
    pub fn is_cross_building(&self) -> bool {
        self.host != self.os
    }

    /// The effective MSVC runtime (explicit or build-type default).
    pub fn msvc_runtime(&self) -> MsvcRuntime {
        self.runtime
            .unwrap_or_else(|| MsvcRuntime::default_for(self.build_type))
    }

    /// Whether the toolset targets Windows XP.
    pub fn is_xp_toolset(&self) -> bool {
        self.toolset
            .as_deref()
            .is_some_and(|t| XP_TOOLSETS.contains(&t))
    }

    /// MSVC builds use the visual builder and its binary naming.
    pub fn is_msvc(&self) -> bool {
        self.os == Os::Windows && self.compiler == Compiler::Msvc
    }

    /// Windows builds with gcc on a Windows host (MSYS/MinGW).
    pub fn is_mingw(&self) -> bool {
        self.os == Os::Windows && self.compiler == Compiler::Gcc
    }
}

impl fmt::Display for PlatformDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{} ({})",
            self.os, self.arch, self.compiler, self.build_type
        )
    }
}
