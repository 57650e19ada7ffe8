use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Default store name. The name is part of the on-disk identity: changing
/// it opens a new, empty store instead of migrating the old one.
pub const DEFAULT_STORE_NAME: &str = "linkstore-v1";

/// Default number of entities each read handle keeps decoded.
pub const DEFAULT_READER_CACHE: usize = 256;

/// Where and how the physical store is opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding the store file. `None` means no directory could
    /// be resolved, and the store opens in degraded mode.
    pub directory: Option<PathBuf>,
    /// Logical store name; the file is `<directory>/<name>.sqlite3`.
    pub name: String,
    /// Per-read-handle object cache size.
    pub reader_cache_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            name: DEFAULT_STORE_NAME.to_string(),
            reader_cache_capacity: DEFAULT_READER_CACHE,
        }
    }
}

impl StoreConfig {
    /// Config rooted at an explicit directory.
    pub fn in_directory(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: Some(directory.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_reader_cache(mut self, capacity: usize) -> Self {
        self.reader_cache_capacity = capacity;
        self
    }

    /// Full path of the store file, if a directory is configured.
    pub fn path(&self) -> Option<PathBuf> {
        self.directory
            .as_ref()
            .map(|dir| dir.join(format!("{}.sqlite3", self.name)))
    }
}

/// The platform's per-user cache directory for this application.
pub fn default_directory() -> Option<PathBuf> {
    ProjectDirs::from("", "", "linkstore").map(|dirs| dirs.cache_dir().to_path_buf())
}
