//! Source archive download, verification and extraction.
//!
//! Archives are cached by file name under the user cache directory. A cached
//! archive is reused only while it still matches the expected checksum.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;
use tempfile::NamedTempFile;
use url::Url;

use crate::core::error::BuildError;
use crate::util::fs::{ensure_dir, remove_dir_all_if_exists};
use crate::util::hash::{sha256_bytes, verify_sha256};

pub const OPENSSL_VERSION: &str = "1.0.2p";
pub const OPENSSL_SHA256: &str =
    "50a98e07b1a89eb8f6a99477f262df71c6fa7bef77df4dc83025a2845c827d00";

/// Where to get a source archive and what it must hash to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSource {
    /// Locations tried in order: URLs or local file paths
    pub locations: Vec<String>,
    pub sha256: String,
    pub version: String,
}

impl ArchiveSource {
    /// The OpenSSL release, from the main site or the `old/` mirror releases
    /// move to once superseded.
    pub fn openssl() -> Self {
        ArchiveSource {
            locations: vec![
                format!("https://www.openssl.org/source/openssl-{}.tar.gz", OPENSSL_VERSION),
                format!(
                    "https://www.openssl.org/source/old/1.0.2/openssl-{}.tar.gz",
                    OPENSSL_VERSION
                ),
            ],
            sha256: OPENSSL_SHA256.to_string(),
            version: OPENSSL_VERSION.to_string(),
        }
    }

    /// Use a single location instead of the defaults.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.locations = vec![location.into()];
        self
    }

    pub fn archive_name(&self) -> String {
        format!("openssl-{}.tar.gz", self.version)
    }

    /// Top-level directory inside the archive.
    pub fn source_dir_name(&self) -> String {
        format!("openssl-{}", self.version)
    }
}

/// The per-user cache directory for downloaded archives.
pub fn default_cache_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("org", "sslpack", "sslpack").map(|d| d.cache_dir().to_path_buf())
}

/// Make a verified copy of the archive available in `cache_dir`.
pub fn fetch_archive(source: &ArchiveSource, cache_dir: &Path) -> Result<PathBuf, BuildError> {
    ensure_dir(cache_dir)?;
    let cached = cache_dir.join(source.archive_name());

    if cached.exists() {
        match verify_sha256(&cached, &source.sha256) {
            Ok(()) => {
                tracing::debug!("using cached archive {}", cached.display());
                return Ok(cached);
            }
            Err(BuildError::ChecksumMismatch { .. }) => {
                tracing::warn!("cached archive {} is corrupt, fetching again", cached.display());
            }
            Err(e) => return Err(e),
        }
    }

    let mut last_error = None;
    for location in &source.locations {
        let bytes = match read_location(location) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("{}", e);
                last_error = Some(e);
                continue;
            }
        };

        let actual = sha256_bytes(&bytes);
        if !actual.eq_ignore_ascii_case(&source.sha256) {
            tracing::warn!("checksum mismatch for {}, trying next location", location);
            last_error = Some(BuildError::ChecksumMismatch {
                path: PathBuf::from(location),
                expected: source.sha256.to_ascii_lowercase(),
                actual,
            });
            continue;
        }

        // write beside the cache entry, then move into place
        let mut file = NamedTempFile::new_in(cache_dir).map_err(|e| BuildError::io(cache_dir, e))?;
        file.write_all(&bytes)
            .map_err(|e| BuildError::io(file.path(), e))?;
        file.persist(&cached)
            .map_err(|e| BuildError::io(&cached, e.error))?;
        tracing::info!("fetched {} ({} bytes)", location, bytes.len());
        return Ok(cached);
    }

    Err(last_error.unwrap_or_else(|| BuildError::Fetch {
        url: source.archive_name(),
        message: "no locations configured".to_string(),
    }))
}

/// Read an archive from an http(s) URL, a `file://` URL or a plain path.
fn read_location(location: &str) -> Result<Vec<u8>, BuildError> {
    let fetch_error = |message: String| BuildError::Fetch {
        url: location.to_string(),
        message,
    };

    let path = match Url::parse(location) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {
            let response = reqwest::blocking::get(url.as_str())
                .map_err(|e| fetch_error(e.to_string()))?;
            if !response.status().is_success() {
                return Err(fetch_error(format!("HTTP {}", response.status())));
            }
            let bytes = response.bytes().map_err(|e| fetch_error(e.to_string()))?;
            return Ok(bytes.to_vec());
        }
        Ok(url) if url.scheme() == "file" => url
            .to_file_path()
            .map_err(|_| fetch_error("not a local file URL".to_string()))?,
        // Drive letters parse as URL schemes
        Ok(url) if url.scheme().len() > 1 => {
            return Err(fetch_error(format!("unsupported scheme `{}`", url.scheme())))
        }
        _ => PathBuf::from(location),
    };

    std::fs::read(&path).map_err(|e| BuildError::io(path, e))
}

/// Unpack a `.tar.gz` archive into `dest`, returning the source tree.
///
/// Entries that would land outside `dest` are skipped.
pub fn extract_archive(
    archive: &Path,
    dest: &Path,
    source_dir_name: &str,
) -> Result<PathBuf, BuildError> {
    ensure_dir(dest)?;
    // stale files from an earlier extraction would survive unpacking
    remove_dir_all_if_exists(&dest.join(source_dir_name))?;
    let file = File::open(archive).map_err(|e| BuildError::io(archive, e))?;
    let mut tar = Archive::new(GzDecoder::new(file));

    let entries = tar.entries().map_err(|e| BuildError::io(archive, e))?;
    let mut count = 0usize;
    for entry in entries {
        let mut entry = entry.map_err(|e| BuildError::io(archive, e))?;
        let unpacked = entry
            .unpack_in(dest)
            .map_err(|e| BuildError::io(dest, e))?;
        if unpacked {
            count += 1;
        } else {
            let path = entry.path().map(|p| p.display().to_string()).unwrap_or_default();
            tracing::warn!("skipped archive entry outside destination: {}", path);
        }
    }
    tracing::debug!("extracted {} entries into {}", count, dest.display());

    let source_dir = dest.join(source_dir_name);
    if !source_dir.is_dir() {
        return Err(BuildError::Fetch {
            url: archive.display().to_string(),
            message: format!("archive does not contain `{}/`", source_dir_name),
        });
    }
    Ok(source_dir)
}

/// Fetch, verify and extract; returns the extracted source tree.
pub fn fetch_source(
    source: &ArchiveSource,
    cache_dir: &Path,
    dest: &Path,
) -> Result<PathBuf, BuildError> {
    let archive = fetch_archive(source, cache_dir)?;
    extract_archive(&archive, dest, &source.source_dir_name())
}
