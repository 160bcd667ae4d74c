//! Artifact packaging.
//!
//! Collects the libraries, headers and license produced by a build into the
//! canonical layout:
//!
//! ```text
//! <dest>/lib/             static and import libraries
//! <dest>/bin/             Windows DLLs
//! <dest>/include/openssl/ public headers
//! ```
//!
//! Patterns are matched against paths relative to the build root (the
//! directory holding the source tree and, for MSVC, `binaries/`). Matches
//! are flattened into their destination directory.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::error::BuildError;
use crate::core::options::OptionSet;
use crate::core::platform::PlatformDescriptor;
use crate::util::fs::{copy_flat, ensure_dir, find_matching};

/// Copy every file matching `pattern` into `dest_dir`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyRule {
    pub pattern: String,
    pub dest_dir: String,
    /// Fail packaging when nothing matches
    pub required: bool,
}

impl CopyRule {
    pub fn required(pattern: impl Into<String>, dest_dir: impl Into<String>) -> Self {
        CopyRule {
            pattern: pattern.into(),
            dest_dir: dest_dir.into(),
            required: true,
        }
    }

    pub fn optional(pattern: impl Into<String>, dest_dir: impl Into<String>) -> Self {
        CopyRule {
            required: false,
            ..CopyRule::required(pattern, dest_dir)
        }
    }
}

/// Where a build's outputs come from and where they go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactLayout {
    pub library_files: Vec<CopyRule>,
    pub header_files: Vec<CopyRule>,
    pub extra_files: Vec<CopyRule>,
    /// Renames applied inside the destination after copying
    pub renames: Vec<(PathBuf, PathBuf)>,
}

impl ArtifactLayout {
    /// Derive the layout for a platform.
    ///
    /// `source_dir` is the source tree's directory name inside the build root.
    pub fn for_platform(
        platform: &PlatformDescriptor,
        options: &OptionSet,
        source_dir: &str,
    ) -> Self {
        let shared = options.shared();

        let (library_files, header_files, renames) = if platform.is_msvc() {
            let runtime = platform.msvc_runtime();
            let mut libs = vec![CopyRule::required("binaries/lib/*.lib", "lib")];
            libs.push(CopyRule {
                required: shared,
                ..CopyRule::required("binaries/bin/*.dll", "bin")
            });
            let renames = ["ssleay32", "libeay32"]
                .iter()
                .map(|lib| {
                    (
                        PathBuf::from(format!("lib/{}{}.lib", lib, runtime)),
                        PathBuf::from(format!("lib/{}.lib", lib)),
                    )
                })
                .collect();
            (
                libs,
                vec![CopyRule::required("binaries/include/openssl/*.h", "include/openssl")],
                renames,
            )
        } else if platform.is_mingw() {
            let libs = if shared {
                vec![
                    CopyRule::required(format!("{}/libcrypto.dll.a", source_dir), "lib"),
                    CopyRule::required(format!("{}/libssl.dll.a", source_dir), "lib"),
                    CopyRule::required(format!("{}/libeay32.dll", source_dir), "bin"),
                    CopyRule::required(format!("{}/ssleay32.dll", source_dir), "bin"),
                ]
            } else {
                vec![
                    CopyRule::required(format!("{}/libcrypto.a", source_dir), "lib"),
                    CopyRule::required(format!("{}/libssl.a", source_dir), "lib"),
                ]
            };
            (libs, unix_headers(source_dir), Vec::new())
        } else {
            let libs = if shared && platform.os.is_apple() {
                vec![
                    CopyRule::required("*libcrypto*.dylib", "lib"),
                    CopyRule::required("*libssl*.dylib", "lib"),
                ]
            } else if shared {
                vec![
                    CopyRule::required("*libcrypto.so*", "lib"),
                    CopyRule::required("*libssl.so*", "lib"),
                ]
            } else {
                vec![
                    CopyRule::required(format!("{}/libcrypto.a", source_dir), "lib"),
                    CopyRule::required(format!("{}/libssl.a", source_dir), "lib"),
                ]
            };
            (libs, unix_headers(source_dir), Vec::new())
        };

        ArtifactLayout {
            library_files,
            header_files,
            extra_files: vec![
                CopyRule::optional(format!("{}/LICENSE", source_dir), ""),
                CopyRule::optional("*applink.c", "include/openssl"),
            ],
            renames,
        }
    }

    /// Every copy rule, libraries first.
    pub fn rules(&self) -> impl Iterator<Item = &CopyRule> {
        self.library_files
            .iter()
            .chain(&self.header_files)
            .chain(&self.extra_files)
    }
}

fn unix_headers(source_dir: &str) -> Vec<CopyRule> {
    vec![CopyRule::required(
        format!("{}/include/*", source_dir),
        "include/openssl",
    )]
}

/// What packaging produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PackageReport {
    /// Files written under the destination, after renames
    pub files: Vec<PathBuf>,
    pub renamed: Vec<(PathBuf, PathBuf)>,
}

/// Copy a build's outputs from `build_root` into `dest_root`.
///
/// One build per destination: files already present are overwritten.
pub fn package(
    layout: &ArtifactLayout,
    build_root: &Path,
    dest_root: &Path,
) -> Result<PackageReport, BuildError> {
    ensure_dir(dest_root)?;
    let mut report = PackageReport::default();

    for rule in layout.rules() {
        let matches = find_matching(build_root, &rule.pattern)?;
        if matches.is_empty() {
            if rule.required {
                return Err(BuildError::Packaging {
                    pattern: rule.pattern.clone(),
                    root: build_root.to_path_buf(),
                });
            }
            tracing::debug!("optional pattern `{}` matched nothing", rule.pattern);
            continue;
        }

        let dest_dir = dest_root.join(&rule.dest_dir);
        for path in matches {
            if path.starts_with(dest_root) {
                continue;
            }
            let copied = copy_flat(&path, &dest_dir)?;
            tracing::debug!("packaged {} -> {}", path.display(), copied.display());
            if !report.files.contains(&copied) {
                report.files.push(copied);
            }
        }
    }

    for (from, to) in &layout.renames {
        let from_path = dest_root.join(from);
        let to_path = dest_root.join(to);
        if !from_path.exists() {
            return Err(BuildError::Packaging {
                pattern: from.display().to_string(),
                root: dest_root.to_path_buf(),
            });
        }
        std::fs::rename(&from_path, &to_path).map_err(|e| BuildError::io(&from_path, e))?;
        report.files.retain(|f| f != &from_path && f != &to_path);
        report.files.push(to_path.clone());
        report.renamed.push((from_path, to_path));
    }

    report.files.sort();
    Ok(report)
}
