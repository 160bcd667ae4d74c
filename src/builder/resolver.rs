//! Target resolution.
//!
//! Maps a (platform, options) pair onto the OpenSSL `Configure` target and
//! the ordered build steps for that platform. Resolution is pure: it reads
//! nothing but its inputs, so the same pair always yields the same plan.
//!
//! Dispatch is table-driven by operating system:
//!
//! | OS | Builder |
//! |---|---|
//! | Linux, Android, SunOS, FreeBSD | unix (`./Configure ... -fPIC <target>`) |
//! | Windows on a Linux host | unix with the `mingw` targets |
//! | Macos | `darwin64-x86_64-cc` or `./config` |
//! | iOS | `iphoneos-cross` |
//! | Windows + msvc | visual (`perl Configure VC-WIN*` + nmake) |
//! | Windows + gcc | MinGW (`perl Configure mingw*` + make) |

use std::path::{Path, PathBuf};

use crate::builder::plan::{BuildPlan, BuildStep, CommandSpec, PatchStep};
use crate::core::error::BuildError;
use crate::core::options::OptionSet;
use crate::core::platform::{Arch, Compiler, Os, PlatformDescriptor};

/// Prefix OpenSSL uses for its debug configure targets.
pub const DEBUG_PREFIX: &str = "debug-";

/// Compiler flags added to GCC-family debug builds.
pub const GCC_DEBUG_FLAGS: [&str; 3] = ["-g3", "-fno-omit-frame-pointer", "-fno-inline-functions"];

/// Install prefix the visual builder installs into, relative to the source tree.
pub const VISUAL_PREFIX: &str = "../binaries";

const SHARED_MAKEFILE: &str = "Makefile.shared";
const INSTALL_NAME_FROM: &str =
    r#"SHAREDFLAGS="$$SHAREDFLAGS -install_name $(INSTALLTOP)/$(LIBDIR)/$$SHLIB$"#;
const INSTALL_NAME_TO: &str = r#"SHAREDFLAGS="$$SHAREDFLAGS -install_name $$SHLIB$"#;

const ANDROID_ARMV7_GCC: &str = r#""android-armv7","gcc:-march=armv7-a -mandroid -I\$(ANDROID_DEV)/include -B\$(ANDROID_DEV)/lib -O3 -fomit-frame-pointer -Wall::-D_REENTRANT::-ldl:BN_LLONG RC4_CHAR RC4_CHUNK DES_INT DES_UNROLL BF_PTR:${armv4_asm}:dlfcn:linux-shared:-fPIC::.so.\$(SHLIB_MAJOR).\$(SHLIB_MINOR)","#;
const ANDROID_ARMV7_CLANG: &str = r#""android-armv7","clang:$ENV{'CFLAGS'} -O3 -fomit-frame-pointer -Wall::-D_REENTRANT::-ldl $ENV{'LDFLAGS'}:BN_LLONG RC4_CHAR RC4_CHUNK DES_INT DES_UNROLL BF_PTR:${armv4_asm}:dlfcn:linux-shared:-fPIC::.so.\$(SHLIB_MAJOR).\$(SHLIB_MINOR)","#;

/// A unix configure target and whether the debug prefix applies to it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct UnixTarget {
    name: String,
    debug_prefix: bool,
}

impl UnixTarget {
    fn new(name: impl Into<String>, debug_prefix: bool) -> Self {
        UnixTarget {
            name: name.into(),
            debug_prefix,
        }
    }
}

/// Resolves platforms into build plans for a source tree.
#[derive(Debug, Clone)]
pub struct TargetResolver {
    working_directory: PathBuf,
}

impl TargetResolver {
    /// Create a resolver for the source tree at `working_directory`.
    pub fn new(working_directory: impl Into<PathBuf>) -> Self {
        TargetResolver {
            working_directory: working_directory.into(),
        }
    }

    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    /// Resolve the build plan for a platform and option set.
    pub fn resolve(
        &self,
        platform: &PlatformDescriptor,
        options: &OptionSet,
    ) -> Result<BuildPlan, BuildError> {
        let plan = match platform.os {
            Os::Linux | Os::Android | Os::SunOs | Os::FreeBSD => self.unix(platform, options)?,
            Os::Windows if platform.host == Os::Linux => self.unix(platform, options)?,
            Os::Macos => self.macos(platform, options),
            Os::Ios => self.ios(options),
            Os::Windows => match platform.compiler {
                Compiler::Msvc => self.visual(platform, options)?,
                Compiler::Gcc => self.mingw(platform, options)?,
                other => {
                    return Err(BuildError::UnsupportedCompiler {
                        os: platform.os.to_string(),
                        compiler: other.to_string(),
                    })
                }
            },
            _ => {
                return Err(BuildError::UnsupportedPlatform {
                    os: platform.os.to_string(),
                    arch: platform.arch.to_string(),
                    compiler: platform.compiler.to_string(),
                })
            }
        };

        tracing::debug!(
            configure_target = %plan.configure_target,
            steps = plan.steps.len(),
            "resolved build plan for {}",
            platform
        );
        Ok(plan)
    }

    fn plan(&self, configure_target: String, extra_flags: Vec<String>) -> BuildPlan {
        BuildPlan {
            configure_target,
            extra_flags,
            environment: Default::default(),
            working_directory: self.working_directory.clone(),
            steps: Vec::new(),
            flags_at: 0,
        }
    }

    /// `./Configure <tokens> -fPIC <target> <cflags>`, then make.
    fn unix(
        &self,
        platform: &PlatformDescriptor,
        options: &OptionSet,
    ) -> Result<BuildPlan, BuildError> {
        let debug = platform.is_debug();
        let target = unix_target(platform)?;

        let mut tokens = Vec::new();
        if debug {
            tokens.push("no-asm".to_string());
        }
        push_unique(&mut tokens, options.configure_tokens());

        let mut cflags = Vec::new();
        if debug {
            cflags.push("-O0".to_string());
            if platform.compiler.is_gcc_family() {
                cflags.extend(GCC_DEBUG_FLAGS.iter().map(|f| f.to_string()));
            }
        }

        let configure_target = if debug && target.debug_prefix {
            format!("{}{}", DEBUG_PREFIX, target.name)
        } else {
            target.name
        };

        let configure = CommandSpec::new("./Configure")
            .args(tokens.iter().cloned())
            .arg("-fPIC")
            .arg(configure_target.clone())
            .args(cflags.iter().cloned());

        let mut extra_flags = tokens;
        push_unique(&mut extra_flags, cflags);

        let mut plan = self.plan(configure_target, extra_flags);

        if platform.os == Os::Android && platform.compiler == Compiler::Clang {
            plan.steps.push(BuildStep::Patch(PatchStep::strict(
                "Configure",
                ANDROID_ARMV7_GCC,
                ANDROID_ARMV7_CLANG,
            )));
        }
        plan.steps.push(BuildStep::Configure(configure));
        if !platform.is_cross_building() {
            plan.steps
                .push(BuildStep::Run(CommandSpec::new("make").arg("depend")));
        }
        plan.steps
            .push(BuildStep::Run(CommandSpec::new("make").streamed()));

        Ok(plan)
    }

    /// `darwin64-x86_64-cc` on x86_64, `./config` elsewhere.
    fn macos(&self, platform: &PlatformDescriptor, options: &OptionSet) -> BuildPlan {
        let tokens = options.configure_tokens();

        let mut plan = if platform.arch == Arch::X86_64 {
            let target = "darwin64-x86_64-cc".to_string();
            let configure = CommandSpec::new("./Configure")
                .arg(target.clone())
                .args(tokens.iter().cloned());
            let mut plan = self.plan(target, tokens);
            plan.flags_at = 1;
            plan.steps.push(BuildStep::Configure(configure));
            plan
        } else {
            let mut extra_flags = tokens.clone();
            if platform.arch == Arch::X86 {
                extra_flags.push("-m32".to_string());
            }
            let configure = CommandSpec::new("./config").args(extra_flags.iter().cloned());
            let mut plan = self.plan("config".to_string(), extra_flags);
            plan.steps.push(BuildStep::Configure(configure));
            plan
        };

        push_apple_make(&mut plan);
        plan
    }

    /// `./Configure iphoneos-cross <tokens>`; the compiler comes from `CC`.
    fn ios(&self, options: &OptionSet) -> BuildPlan {
        let tokens = options.configure_tokens();
        let target = "iphoneos-cross".to_string();
        let configure = CommandSpec::new("./Configure")
            .arg(target.clone())
            .args(tokens.iter().cloned());

        let mut plan = self.plan(target, tokens);
        plan.flags_at = 1;
        plan.steps.push(BuildStep::Configure(configure));
        push_apple_make(&mut plan);
        plan
    }

    /// MSVC: `perl Configure`, the `ms\do_*` generator, nmake and install.
    fn visual(
        &self,
        platform: &PlatformDescriptor,
        options: &OptionSet,
    ) -> Result<BuildPlan, BuildError> {
        let bits = match platform.arch {
            Arch::X86 => "32",
            Arch::X86_64 => "64A",
            other => {
                return Err(BuildError::UnsupportedArchitecture {
                    os: platform.os.to_string(),
                    arch: other.to_string(),
                })
            }
        };
        let prefix = if platform.is_debug() { DEBUG_PREFIX } else { "" };
        let target = format!("{}VC-WIN{}", prefix, bits);

        let mut configure = CommandSpec::new("perl").arg("Configure").arg(target.clone());
        if options.no_asm() {
            configure = configure.arg("no-asm");
        }
        configure = configure.arg(format!("--prefix={}", VISUAL_PREFIX));
        let flags_at = configure.args.len();

        // no-asm already sits in front of --prefix
        let tokens = options.configure_tokens();
        let configure = configure.args(tokens.iter().filter(|t| *t != "no-asm").cloned());

        let generator = if !options.no_asm() && platform.arch == Arch::X86 {
            r"ms\do_nasm.bat"
        } else if platform.arch == Arch::X86_64 {
            r"ms\do_win64a.bat"
        } else {
            r"ms\do_ms.bat"
        };

        let runtime = platform.msvc_runtime();
        let makefile = if options.shared() {
            r"ms\ntdll.mak"
        } else {
            r"ms\nt.mak"
        };

        let mut plan = self.plan(target, tokens);
        plan.flags_at = flags_at;
        plan.steps.push(BuildStep::Configure(configure));
        plan.steps
            .push(BuildStep::Run(CommandSpec::new("cmd").args(["/c", generator])));
        for file in [r"ms\ntdll.mak", r"ms\nt.mak"] {
            plan.steps.push(BuildStep::ReplaceRuntime {
                file: PathBuf::from(file),
                runtime,
            });
        }
        if platform.arch == Arch::X86 {
            // 1.0.2 x86 builds trip over warnings promoted to errors
            for file in [r"ms\nt.mak", r"ms\ntdll.mak"] {
                plan.steps
                    .push(BuildStep::Patch(PatchStep::strict(file, "-WX", "")));
            }
        }
        plan.steps
            .push(BuildStep::Run(CommandSpec::new("nmake").args(["-f", makefile])));
        plan.steps.push(BuildStep::Run(
            CommandSpec::new("nmake").args(["-f", makefile, "install"]),
        ));
        for lib in ["libeay32", "ssleay32"] {
            plan.steps.push(BuildStep::Rename {
                from: PathBuf::from(format!("{}/lib/{}.lib", VISUAL_PREFIX, lib)),
                to: PathBuf::from(format!("{}/lib/{}{}.lib", VISUAL_PREFIX, lib, runtime)),
            });
        }

        Ok(plan)
    }

    /// MinGW under MSYS: `perl Configure mingw[64] [-g] <tokens>`, then make.
    fn mingw(
        &self,
        platform: &PlatformDescriptor,
        options: &OptionSet,
    ) -> Result<BuildPlan, BuildError> {
        let target = match platform.arch {
            Arch::X86 => "mingw",
            Arch::X86_64 => "mingw64",
            other => {
                return Err(BuildError::UnsupportedArchitecture {
                    os: platform.os.to_string(),
                    arch: other.to_string(),
                })
            }
        };

        let mut configure = CommandSpec::new("perl").arg("Configure").arg(target);
        if platform.is_debug() {
            configure = configure.arg("-g");
        }
        let flags_at = configure.args.len();

        let tokens = options.configure_tokens();
        let configure = configure.args(tokens.iter().cloned());

        let mut extra_flags = tokens;
        if platform.is_debug() {
            extra_flags.push("-g".to_string());
        }

        let mut plan = self.plan(target.to_string(), extra_flags);
        plan.flags_at = flags_at;
        plan.steps.push(BuildStep::Configure(configure));
        plan.steps
            .push(BuildStep::Run(CommandSpec::new("make").streamed()));
        Ok(plan)
    }
}

/// Configure target for the unix builder.
fn unix_target(platform: &PlatformDescriptor) -> Result<UnixTarget, BuildError> {
    let arch = platform.arch;
    let unsupported_arch = || BuildError::UnsupportedArchitecture {
        os: platform.os.to_string(),
        arch: arch.to_string(),
    };

    let target = match platform.os {
        Os::Linux => match arch {
            Arch::X86 => UnixTarget::new("linux-generic32", true),
            Arch::X86_64 => UnixTarget::new("linux-x86_64", true),
            Arch::Armv8 => UnixTarget::new("linux-aarch64", true),
            Arch::Ppc64le | Arch::Ppc64 | Arch::Mips64 | Arch::Sparcv9 => {
                UnixTarget::new(format!("linux-{}", arch), false)
            }
            a if a.is_arm() => UnixTarget::new("linux-armv4", false),
            Arch::Mips => UnixTarget::new("linux-mips32", false),
            _ => return Err(unsupported_arch()),
        },
        Os::Android => match arch {
            a if a.is_armv7() => UnixTarget::new("android-armv7", false),
            Arch::Armv8 => UnixTarget::new("android-aarch64", false),
            Arch::X86 => UnixTarget::new("android-x86", false),
            Arch::Mips => UnixTarget::new("android-mips", false),
            _ => return Err(unsupported_arch()),
        },
        Os::SunOs => {
            let suffix = match platform.compiler {
                c if c.is_gcc_family() => "-gcc",
                Compiler::SunCc => "-cc",
                other => {
                    return Err(BuildError::UnsupportedCompiler {
                        os: platform.os.to_string(),
                        compiler: other.to_string(),
                    })
                }
            };
            // OpenSSL only ships a debug profile for sparcv9
            let debug_prefix = arch == Arch::Sparcv9;
            match arch {
                Arch::Sparc | Arch::X86 => {
                    UnixTarget::new(format!("solaris-{}{}", arch, suffix), debug_prefix)
                }
                Arch::Sparcv9 | Arch::X86_64 => {
                    UnixTarget::new(format!("solaris64-{}{}", arch, suffix), debug_prefix)
                }
                _ => return Err(unsupported_arch()),
            }
        }
        Os::FreeBSD => UnixTarget::new(format!("BSD-{}", arch), true),
        Os::Windows => match arch {
            Arch::X86_64 => UnixTarget::new("mingw64", false),
            Arch::X86 => UnixTarget::new("mingw", false),
            _ => return Err(unsupported_arch()),
        },
        _ => {
            return Err(BuildError::UnsupportedPlatform {
                os: platform.os.to_string(),
                arch: arch.to_string(),
                compiler: platform.compiler.to_string(),
            })
        }
    };
    Ok(target)
}

/// Strip the absolute install_name from dylibs, then make.
fn push_apple_make(plan: &mut BuildPlan) {
    plan.steps.push(BuildStep::Patch(PatchStep::strict(
        SHARED_MAKEFILE,
        INSTALL_NAME_FROM,
        INSTALL_NAME_TO,
    )));
    plan.steps.push(BuildStep::Run(CommandSpec::new("make")));
}

fn push_unique(into: &mut Vec<String>, items: Vec<String>) {
    for item in items {
        if !into.contains(&item) {
            into.push(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::plan::OutputMode;
    use crate::core::options::BuildOption;
    use crate::core::platform::{BuildType, MsvcRuntime};

    fn resolver() -> TargetResolver {
        TargetResolver::new("/src/openssl-1.0.2p")
    }

    fn linux(arch: Arch) -> PlatformDescriptor {
        PlatformDescriptor::new(Os::Linux, Compiler::Gcc, arch).with_host(Os::Linux)
    }

    fn labels(plan: &BuildPlan) -> Vec<&'static str> {
        plan.steps.iter().map(BuildStep::label).collect()
    }

    #[test]
    fn test_linux_x86_64_release_defaults() {
        let plan = resolver()
            .resolve(&linux(Arch::X86_64), &OptionSet::new())
            .unwrap();
        assert_eq!(plan.configure_target, "linux-x86_64");
        assert!(plan.extra_flags.is_empty());
        assert_eq!(
            plan.configure().unwrap().display_command(),
            "./Configure -fPIC linux-x86_64"
        );
        assert_eq!(labels(&plan), vec!["configure", "build", "build"]);
        assert_eq!(plan.steps[1].command().unwrap().args, vec!["depend"]);
        assert_eq!(plan.steps[2].command().unwrap().output, OutputMode::Stream);
        assert_eq!(plan.configure().unwrap().output, OutputMode::Heartbeat);
    }

    #[test]
    fn test_linux_x86_debug() {
        let p = linux(Arch::X86).with_build_type(BuildType::Debug);
        let plan = resolver().resolve(&p, &OptionSet::new()).unwrap();
        assert_eq!(plan.configure_target, "debug-linux-generic32");
        assert_eq!(
            plan.extra_flags,
            vec![
                "no-asm",
                "-O0",
                "-g3",
                "-fno-omit-frame-pointer",
                "-fno-inline-functions"
            ]
        );
        assert_eq!(
            plan.configure().unwrap().display_command(),
            "./Configure no-asm -fPIC debug-linux-generic32 -O0 -g3 -fno-omit-frame-pointer -fno-inline-functions"
        );
    }

    #[test]
    fn test_debug_no_asm_is_not_duplicated() {
        let p = linux(Arch::X86_64).with_build_type(BuildType::Debug);
        let opts = OptionSet::new()
            .with(BuildOption::NoAsm, true)
            .with(BuildOption::Shared, true);
        let plan = resolver().resolve(&p, &opts).unwrap();
        let count = plan.extra_flags.iter().filter(|f| *f == "no-asm").count();
        assert_eq!(count, 1);
        assert_eq!(&plan.extra_flags[..2], ["no-asm", "shared"]);
    }

    #[test]
    fn test_linux_literal_arch_targets_skip_debug_prefix() {
        for (arch, expected) in [
            (Arch::Ppc64le, "linux-ppc64le"),
            (Arch::Sparcv9, "linux-sparcv9"),
            (Arch::Armv7hf, "linux-armv4"),
            (Arch::Mips, "linux-mips32"),
        ] {
            let p = linux(arch).with_build_type(BuildType::Debug);
            let plan = resolver().resolve(&p, &OptionSet::new()).unwrap();
            assert_eq!(plan.configure_target, expected);
        }
        let p = linux(Arch::Armv8).with_build_type(BuildType::Debug);
        let plan = resolver().resolve(&p, &OptionSet::new()).unwrap();
        assert_eq!(plan.configure_target, "debug-linux-aarch64");
    }

    #[test]
    fn test_linux_riscv64_unsupported() {
        let err = resolver()
            .resolve(&linux(Arch::Riscv64), &OptionSet::new())
            .unwrap_err();
        match err {
            BuildError::UnsupportedArchitecture { os, arch } => {
                assert_eq!(os, "Linux");
                assert_eq!(arch, "riscv64");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_sunos_targets() {
        for build_type in [BuildType::Debug, BuildType::Release] {
            let p = PlatformDescriptor::new(Os::SunOs, Compiler::Gcc, Arch::Sparc)
                .with_build_type(build_type);
            let plan = resolver().resolve(&p, &OptionSet::new()).unwrap();
            assert_eq!(plan.configure_target, "solaris-sparc-gcc");
        }

        let p = PlatformDescriptor::new(Os::SunOs, Compiler::SunCc, Arch::Sparcv9)
            .with_build_type(BuildType::Debug);
        let plan = resolver().resolve(&p, &OptionSet::new()).unwrap();
        assert_eq!(plan.configure_target, "debug-solaris64-sparcv9-cc");

        let p = PlatformDescriptor::new(Os::SunOs, Compiler::Gcc, Arch::X86_64);
        let plan = resolver().resolve(&p, &OptionSet::new()).unwrap();
        assert_eq!(plan.configure_target, "solaris64-x86_64-gcc");
    }

    #[test]
    fn test_sunos_rejects_msvc() {
        let p = PlatformDescriptor::new(Os::SunOs, Compiler::Msvc, Arch::Sparc);
        let err = resolver().resolve(&p, &OptionSet::new()).unwrap_err();
        assert!(matches!(err, BuildError::UnsupportedCompiler { .. }));
    }

    #[test]
    fn test_freebsd_debug_prefix() {
        let p = PlatformDescriptor::new(Os::FreeBSD, Compiler::Clang, Arch::X86_64)
            .with_build_type(BuildType::Debug);
        let plan = resolver().resolve(&p, &OptionSet::new()).unwrap();
        assert_eq!(plan.configure_target, "debug-BSD-x86_64");
    }

    #[test]
    fn test_android_clang_patches_configure() {
        let p = PlatformDescriptor::new(Os::Android, Compiler::Clang, Arch::Armv7)
            .with_host(Os::Linux);
        let plan = resolver().resolve(&p, &OptionSet::new()).unwrap();
        assert_eq!(plan.configure_target, "android-armv7");
        assert_eq!(labels(&plan), vec!["patch", "configure", "build"]);
        match &plan.steps[0] {
            BuildStep::Patch(patch) => {
                assert!(patch.strict);
                assert!(patch.to.contains("$ENV{'CFLAGS'}"));
            }
            other => panic!("unexpected step: {other:?}"),
        }
    }

    #[test]
    fn test_android_unsupported_arch() {
        let p = PlatformDescriptor::new(Os::Android, Compiler::Clang, Arch::X86_64);
        assert!(matches!(
            resolver().resolve(&p, &OptionSet::new()),
            Err(BuildError::UnsupportedArchitecture { .. })
        ));
    }

    #[test]
    fn test_windows_on_linux_host_uses_mingw_targets() {
        let p = PlatformDescriptor::new(Os::Windows, Compiler::Gcc, Arch::X86_64)
            .with_host(Os::Linux)
            .with_build_type(BuildType::Debug);
        let plan = resolver().resolve(&p, &OptionSet::new()).unwrap();
        assert_eq!(plan.configure_target, "mingw64");
        assert!(plan.extra_flags.contains(&"no-asm".to_string()));
        // cross building skips make depend
        assert_eq!(labels(&plan), vec!["configure", "build"]);
    }

    #[test]
    fn test_visual_static_x86_plan() {
        let p = PlatformDescriptor::new(Os::Windows, Compiler::Msvc, Arch::X86)
            .with_host(Os::Windows)
            .with_runtime(MsvcRuntime::MT);
        let plan = resolver().resolve(&p, &OptionSet::new()).unwrap();

        assert_eq!(plan.configure_target, "VC-WIN32");
        assert_eq!(
            plan.configure().unwrap().display_command(),
            "perl Configure VC-WIN32 --prefix=../binaries"
        );
        assert_eq!(
            labels(&plan),
            vec![
                "configure", "build", "runtime", "runtime", "patch", "patch", "build", "build",
                "rename", "rename"
            ]
        );
        assert_eq!(plan.steps[1].command().unwrap().args, vec!["/c", r"ms\do_nasm.bat"]);
        assert_eq!(
            plan.steps[7].command().unwrap().display_command(),
            r"nmake -f ms\nt.mak install"
        );
        assert_eq!(
            plan.steps[9],
            BuildStep::Rename {
                from: PathBuf::from("../binaries/lib/ssleay32.lib"),
                to: PathBuf::from("../binaries/lib/ssleay32MT.lib"),
            }
        );
    }

    #[test]
    fn test_visual_shared_debug_x64() {
        let p = PlatformDescriptor::new(Os::Windows, Compiler::Msvc, Arch::X86_64)
            .with_host(Os::Windows)
            .with_build_type(BuildType::Debug);
        let opts = OptionSet::new()
            .with(BuildOption::Shared, true)
            .with(BuildOption::NoAsm, true);
        let plan = resolver().resolve(&p, &opts).unwrap();

        assert_eq!(plan.configure_target, "debug-VC-WIN64A");
        assert_eq!(
            plan.configure().unwrap().display_command(),
            "perl Configure debug-VC-WIN64A no-asm --prefix=../binaries shared"
        );
        assert_eq!(plan.flags_at, 4);
        assert!(!labels(&plan).contains(&"patch"));
        let nmake: Vec<_> = plan
            .commands()
            .filter(|c| c.program == Path::new("nmake"))
            .map(|c| c.args[1].clone())
            .collect();
        assert_eq!(nmake, vec![r"ms\ntdll.mak", r"ms\ntdll.mak"]);
        assert!(plan.steps.contains(&BuildStep::ReplaceRuntime {
            file: PathBuf::from(r"ms\nt.mak"),
            runtime: MsvcRuntime::MDd,
        }));
    }

    #[test]
    fn test_visual_rejects_arm() {
        let p = PlatformDescriptor::new(Os::Windows, Compiler::Msvc, Arch::Armv8)
            .with_host(Os::Windows);
        assert!(matches!(
            resolver().resolve(&p, &OptionSet::new()),
            Err(BuildError::UnsupportedArchitecture { .. })
        ));
    }

    #[test]
    fn test_mingw_debug() {
        let p = PlatformDescriptor::new(Os::Windows, Compiler::Gcc, Arch::X86)
            .with_host(Os::Windows)
            .with_build_type(BuildType::Debug);
        let plan = resolver()
            .resolve(&p, &OptionSet::new().with(BuildOption::NoThreads, true))
            .unwrap();
        assert_eq!(plan.configure_target, "mingw");
        assert_eq!(
            plan.configure().unwrap().display_command(),
            "perl Configure mingw -g no-threads"
        );
        assert_eq!(plan.extra_flags, vec!["no-threads", "-g"]);
    }

    #[test]
    fn test_windows_clang_unsupported() {
        let p = PlatformDescriptor::new(Os::Windows, Compiler::Clang, Arch::X86_64)
            .with_host(Os::Windows);
        assert!(matches!(
            resolver().resolve(&p, &OptionSet::new()),
            Err(BuildError::UnsupportedCompiler { .. })
        ));
    }

    #[test]
    fn test_macos_targets() {
        let p = PlatformDescriptor::new(Os::Macos, Compiler::AppleClang, Arch::X86_64);
        let plan = resolver()
            .resolve(&p, &OptionSet::new().with(BuildOption::Shared, true))
            .unwrap();
        assert_eq!(plan.configure_target, "darwin64-x86_64-cc");
        assert_eq!(
            plan.configure().unwrap().display_command(),
            "./Configure darwin64-x86_64-cc shared"
        );
        assert_eq!(labels(&plan), vec!["configure", "patch", "build"]);

        let p = PlatformDescriptor::new(Os::Macos, Compiler::AppleClang, Arch::X86);
        let plan = resolver().resolve(&p, &OptionSet::new()).unwrap();
        assert_eq!(plan.configure_target, "config");
        assert_eq!(plan.configure().unwrap().display_command(), "./config -m32");
    }

    #[test]
    fn test_ios_cross() {
        let p = PlatformDescriptor::new(Os::Ios, Compiler::AppleClang, Arch::Armv8);
        let plan = resolver()
            .resolve(&p, &OptionSet::new().with(BuildOption::NoDes, true))
            .unwrap();
        assert_eq!(plan.configure_target, "iphoneos-cross");
        assert_eq!(plan.configure().unwrap().args, vec!["iphoneos-cross", "no-des"]);
    }

    #[test]
    fn test_unsupported_os() {
        let p = PlatformDescriptor::new(Os::Emscripten, Compiler::Clang, Arch::Wasm);
        match resolver().resolve(&p, &OptionSet::new()).unwrap_err() {
            BuildError::UnsupportedPlatform { os, arch, compiler } => {
                assert_eq!((os.as_str(), arch.as_str(), compiler.as_str()), ("Emscripten", "wasm", "clang"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
