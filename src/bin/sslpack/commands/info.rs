//! `sslpack info` command

use anyhow::Result;

use super::resolve_platform;
use crate::cli::InfoArgs;
use sslpack::builder::{link_libraries, required_tools, TargetResolver};
use sslpack::core::{Arch, BuildOption, Compiler, OptionSet, Os, PlatformDescriptor};

pub fn execute(args: InfoArgs) -> Result<()> {
    if args.list_options {
        print_options();
        return Ok(());
    }
    if args.targets {
        print_targets();
        return Ok(());
    }

    let resolved = resolve_platform(&args.platform)?;
    let platform = &resolved.platform;
    let plan = TargetResolver::new(".").resolve(platform, &resolved.options)?;

    println!("platform:  {}", platform);
    println!("target:    {}", plan.configure_target);
    if !plan.extra_flags.is_empty() {
        println!("flags:     {}", plan.extra_flags.join(" "));
    }
    println!("tools:     {}", required_tools(platform, &resolved.options).join(" "));
    println!("link libs: {}", link_libraries(platform, &resolved.options).join(" "));
    Ok(())
}

fn print_options() {
    for option in BuildOption::ALL {
        println!("{:<12} -> {}", option.name(), option.configure_token());
    }
}

/// Every os/compiler/arch combination the resolver accepts, built natively.
fn print_targets() {
    let resolver = TargetResolver::new(".");
    let options = OptionSet::new();
    for os in Os::ALL {
        for compiler in compilers_for(os) {
            for arch in Arch::ALL {
                let platform = PlatformDescriptor::new(os, *compiler, arch).with_host(native_host(os));
                if let Ok(plan) = resolver.resolve(&platform, &options) {
                    println!(
                        "{:<10} {:<14} {:<9} {}",
                        os.as_str(),
                        compiler.as_str(),
                        arch.as_str(),
                        plan.configure_target
                    );
                }
            }
        }
    }
}

fn compilers_for(os: Os) -> &'static [Compiler] {
    match os {
        Os::Windows => &[Compiler::Msvc, Compiler::Gcc],
        Os::SunOs => &[Compiler::Gcc, Compiler::SunCc],
        Os::Macos | Os::Ios => &[Compiler::AppleClang],
        Os::Android => &[Compiler::Clang, Compiler::Gcc],
        _ => &[Compiler::Gcc],
    }
}

/// Mobile targets are always cross built; everything else on itself.
fn native_host(os: Os) -> Os {
    match os {
        Os::Ios => Os::Macos,
        Os::Android => Os::Linux,
        os => os,
    }
}
