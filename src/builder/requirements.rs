//! Host tools a build needs on PATH.

use crate::core::options::OptionSet;
use crate::core::platform::{Arch, Os, PlatformDescriptor};

/// Tools the resolved plan will spawn, checked before executing.
pub fn required_tools(platform: &PlatformDescriptor, options: &OptionSet) -> Vec<&'static str> {
    // Windows targets built from Linux go through the unix builder
    let native_windows = platform.host != Os::Linux;
    if platform.is_msvc() && native_windows {
        let mut tools = vec!["perl", "nmake"];
        if platform.arch == Arch::X86 && !options.no_asm() {
            tools.push("nasm");
        }
        return tools;
    }
    if platform.is_mingw() && native_windows {
        return vec!["perl", "make", "bash"];
    }
    vec!["perl", "make"]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::options::BuildOption;
    use crate::core::platform::Compiler;

    #[test]
    fn test_msvc_x86_needs_nasm_unless_no_asm() {
        let p = PlatformDescriptor::new(Os::Windows, Compiler::Msvc, Arch::X86).with_host(Os::Windows);
        assert_eq!(required_tools(&p, &OptionSet::new()), vec!["perl", "nmake", "nasm"]);

        let no_asm = OptionSet::new().with(BuildOption::NoAsm, true);
        assert_eq!(required_tools(&p, &no_asm), vec!["perl", "nmake"]);

        let x64 = p.clone();
        let x64 = PlatformDescriptor { arch: Arch::X86_64, ..x64 };
        assert!(!required_tools(&x64, &OptionSet::new()).contains(&"nasm"));
    }

    #[test]
    fn test_unix_and_mingw_tools() {
        let linux = PlatformDescriptor::new(Os::Linux, Compiler::Gcc, Arch::X86_64).with_host(Os::Linux);
        assert_eq!(required_tools(&linux, &OptionSet::new()), vec!["perl", "make"]);

        let mingw = PlatformDescriptor::new(Os::Windows, Compiler::Gcc, Arch::X86_64).with_host(Os::Windows);
        assert_eq!(required_tools(&mingw, &OptionSet::new()), vec!["perl", "make", "bash"]);

        let cross = mingw.with_host(Os::Linux);
        assert_eq!(required_tools(&cross, &OptionSet::new()), vec!["perl", "make"]);
    }
}
