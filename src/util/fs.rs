//! Filesystem utilities.

use std::fs;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use walkdir::WalkDir;

use crate::core::error::BuildError;

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<(), BuildError> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| BuildError::io(path, e))?;
    }
    Ok(())
}

/// Remove a directory and all its contents, if it exists.
pub fn remove_dir_all_if_exists(path: &Path) -> Result<(), BuildError> {
    if path.exists() {
        fs::remove_dir_all(path).map_err(|e| BuildError::io(path, e))?;
    }
    Ok(())
}

pub fn read_to_string(path: &Path) -> Result<String, BuildError> {
    fs::read_to_string(path).map_err(|e| BuildError::io(path, e))
}

/// Write a string to a file, creating parent directories if needed.
pub fn write_string(path: &Path, contents: &str) -> Result<(), BuildError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, contents).map_err(|e| BuildError::io(path, e))
}

/// Replace every occurrence of `from` in a file.
///
/// Returns `false` and leaves the file untouched when `from` is absent.
pub fn replace_in_file(path: &Path, from: &str, to: &str) -> Result<bool, BuildError> {
    let contents = read_to_string(path)?;
    if !contents.contains(from) {
        return Ok(false);
    }
    write_string(path, &contents.replace(from, to))?;
    Ok(true)
}

/// Files under `root` whose root-relative path matches `pattern`.
///
/// `*` also matches path separators, so `*libssl.so*` finds the library at
/// any depth. Paths are compared with forward slashes on every host.
/// Symlinks to files match under their own name (`libssl.so` next to
/// `libssl.so.1.0.0`); directory links are not descended into.
pub fn find_matching(root: &Path, pattern: &str) -> Result<Vec<PathBuf>, BuildError> {
    let matcher = Pattern::new(pattern).map_err(|e| BuildError::ToolchainDiscovery {
        message: format!("invalid file pattern `{}`: {}", pattern, e),
    })?;
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: false,
        require_literal_leading_dot: false,
    };

    let mut results = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("skipping unreadable entry: {}", e);
                continue;
            }
        };
        let is_file = entry.file_type().is_file()
            || (entry.path_is_symlink() && entry.path().is_file());
        if !is_file {
            continue;
        }
        let relative = relative_path(root, entry.path());
        let relative = relative.to_string_lossy().replace('\\', "/");
        if matcher.matches_with(&relative, options) {
            results.push(entry.into_path());
        }
    }

    results.sort();
    Ok(results)
}

/// Copy a file into `dest_dir`, keeping only its file name.
///
/// Symlinks are copied through, so the destination is a regular file.
pub fn copy_flat(src: &Path, dest_dir: &Path) -> Result<PathBuf, BuildError> {
    ensure_dir(dest_dir)?;
    let name = src.file_name().ok_or_else(|| {
        BuildError::io(
            src,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
        )
    })?;
    let dest = dest_dir.join(name);
    fs::copy(src, &dest).map_err(|e| BuildError::io(src, e))?;
    Ok(dest)
}

/// Get the relative path from `base` to `path`.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_matching_crosses_directories() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("openssl/ms")).unwrap();
        fs::write(root.join("openssl/libssl.so.1.0.0"), "").unwrap();
        fs::write(root.join("openssl/ms/applink.c"), "").unwrap();
        fs::write(root.join("openssl/README"), "").unwrap();

        let libs = find_matching(root, "*libssl.so*").unwrap();
        assert_eq!(libs.len(), 1);
        let applink = find_matching(root, "*applink.c").unwrap();
        assert_eq!(applink, vec![root.join("openssl/ms/applink.c")]);
        assert!(find_matching(root, "*.dylib").unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_find_matching_includes_file_symlinks() {
        use std::os::unix::fs::symlink;

        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("openssl/certs")).unwrap();
        fs::write(root.join("openssl/libssl.so.1.0.0"), "elf").unwrap();
        symlink("libssl.so.1.0.0", root.join("openssl/libssl.so")).unwrap();
        symlink("missing.so.1.0.0", root.join("openssl/libdangling.so")).unwrap();
        symlink("certs", root.join("openssl/libssl.so.d")).unwrap();

        let libs = find_matching(root, "*libssl.so*").unwrap();
        assert_eq!(
            libs,
            vec![root.join("openssl/libssl.so"), root.join("openssl/libssl.so.1.0.0")]
        );
        assert!(find_matching(root, "*libdangling.so").unwrap().is_empty());

        let dest = copy_flat(&libs[0], &root.join("pkg/lib")).unwrap();
        assert!(!fs::symlink_metadata(&dest).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(dest).unwrap(), "elf");
    }

    #[test]
    fn test_find_matching_anchors_at_root() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("test")).unwrap();
        fs::write(root.join("LICENSE"), "").unwrap();
        fs::write(root.join("test/LICENSE"), "").unwrap();

        assert_eq!(find_matching(root, "LICENSE").unwrap(), vec![root.join("LICENSE")]);
    }

    #[test]
    fn test_replace_in_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nt.mak");
        fs::write(&path, "CFLAG= /MD -WX /O2 -WX").unwrap();

        assert!(replace_in_file(&path, "-WX", "").unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "CFLAG= /MD  /O2 ");
        assert!(!replace_in_file(&path, "-WX", "").unwrap());
    }

    #[test]
    fn test_copy_flat() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("a/b/libcrypto.a");
        write_string(&src, "archive").unwrap();

        let dest = copy_flat(&src, &tmp.path().join("pkg/lib")).unwrap();
        assert_eq!(dest, tmp.path().join("pkg/lib/libcrypto.a"));
        assert_eq!(fs::read_to_string(dest).unwrap(), "archive");
    }
}
