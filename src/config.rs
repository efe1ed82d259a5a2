//! Options controlling how packages are opened, composed and written.
//!
//! # Examples
//!
//! ```rust
//! use pptx_compose::{Compression, ComposeOptions};
//!
//! let options = ComposeOptions::new()
//!     .with_working_prefix("deck-")
//!     .with_compression(Compression::Stored)
//!     .with_reuse_identical_parts(false);
//! assert!(!options.reuse_identical_parts);
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Zip compression used when the working copy is rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    Deflated,
    Stored,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposeOptions {
    /// Directory holding the working copy; the system temp dir when unset
    pub working_dir: Option<PathBuf>,
    /// File-name prefix of the working copy
    pub working_prefix: String,
    pub compression: Compression,
    /// Resolve imported parts to byte-identical parts already in the target
    /// instead of copying them
    pub reuse_identical_parts: bool,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            working_dir: None,
            working_prefix: "pptx-compose-".to_string(),
            compression: Compression::Deflated,
            reuse_identical_parts: true,
        }
    }
}

impl ComposeOptions {
    /// Create a new `ComposeOptions` with default values.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from YAML. Missing keys keep their defaults.
    ///
    /// ```rust
    /// use pptx_compose::{Compression, ComposeOptions};
    ///
    /// let options = ComposeOptions::from_yaml_str("compression: stored\n").unwrap();
    /// assert_eq!(options.compression, Compression::Stored);
    /// assert!(options.reuse_identical_parts);
    /// ```
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_saphyr::from_str(yaml)
            .map_err(|e| Error::Config(format!("Failed to parse options: {}", e)))
    }

    /// Serialize to YAML.
    pub fn to_yaml_string(&self) -> Result<String> {
        serde_saphyr::to_string(self)
            .map_err(|e| Error::Config(format!("Failed to serialize options: {}", e)))
    }

    #[inline]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    #[inline]
    pub fn with_working_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.working_prefix = prefix.into();
        self
    }

    #[inline]
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    #[inline]
    pub fn with_reuse_identical_parts(mut self, reuse: bool) -> Self {
        self.reuse_identical_parts = reuse;
        self
    }
}
