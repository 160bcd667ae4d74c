//! Libraries a consumer links against.

use crate::core::options::OptionSet;
use crate::core::platform::{Compiler, Os, PlatformDescriptor};

/// Link libraries for a packaged build, in link order.
pub fn link_libraries(platform: &PlatformDescriptor, options: &OptionSet) -> Vec<&'static str> {
    if platform.compiler == Compiler::Msvc {
        return vec!["ssleay32", "libeay32", "crypt32", "msi", "ws2_32"];
    }
    if platform.is_mingw() {
        let mut libs = vec!["ssl", "crypto", "ws2_32"];
        if !options.shared() {
            libs.extend(["crypt32", "gdi32"]);
        }
        return libs;
    }
    if platform.os == Os::Linux {
        return vec!["ssl", "crypto", "dl"];
    }
    vec!["ssl", "crypto"]
}
