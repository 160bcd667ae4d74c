//! Resolved dependency references.
//!
//! Dependencies are resolved by an outside collaborator; we only consume
//! their include/lib paths and library names as opaque inputs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::error::BuildError;

/// A resolved dependency (e.g. zlib) as handed to us by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyRef {
    pub name: String,
    #[serde(default)]
    pub include_paths: Vec<PathBuf>,
    #[serde(default)]
    pub lib_paths: Vec<PathBuf>,
    #[serde(default)]
    pub lib_names: Vec<String>,
    #[serde(default)]
    pub shared: bool,
}

impl DependencyRef {
    pub fn new(name: impl Into<String>) -> Self {
        DependencyRef {
            name: name.into(),
            include_paths: Vec::new(),
            lib_paths: Vec::new(),
            lib_names: Vec::new(),
            shared: false,
        }
    }

    pub fn with_include(mut self, path: impl Into<PathBuf>) -> Self {
        self.include_paths.push(path.into());
        self
    }

    pub fn with_lib_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.lib_paths.push(path.into());
        self
    }

    pub fn with_lib_name(mut self, name: impl Into<String>) -> Self {
        self.lib_names.push(name.into());
        self
    }

    pub fn first_include(&self) -> Result<&Path, BuildError> {
        self.include_paths
            .first()
            .map(PathBuf::as_path)
            .ok_or_else(|| self.missing("no include path"))
    }

    pub fn first_lib_dir(&self) -> Result<&Path, BuildError> {
        self.lib_paths
            .first()
            .map(PathBuf::as_path)
            .ok_or_else(|| self.missing("no library path"))
    }

    pub fn first_lib_name(&self) -> Result<&str, BuildError> {
        self.lib_names
            .first()
            .map(String::as_str)
            .ok_or_else(|| self.missing("no library name"))
    }

    fn missing(&self, reason: &str) -> BuildError {
        BuildError::DependencyResolution {
            name: self.name.clone(),
            reason: reason.to_string(),
        }
    }
}

/// Find a dependency by name.
pub fn find<'a>(deps: &'a [DependencyRef], name: &str) -> Option<&'a DependencyRef> {
    deps.iter().find(|d| d.name == name)
}
