//! Library sources.
//!
//! The source tree is fetched as a release archive, verified against a
//! pinned checksum and extracted next to the build outputs.

pub mod archive;

pub use archive::{extract_archive, fetch_archive, fetch_source, ArchiveSource};
