//! # File Storage
//!
//! One file per key inside a data directory.
//!
//! ```text
//! <data dir>/
//! ├── cart.json                ← JSON array of line items
//! └── preferredCurrency.json   ← INR | USD
//! ```
//!
//! Writes go to `<key>.json.tmp` first and are then renamed over the real
//! file, so a reader never sees half of a write.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};

/// File-per-key storage backend.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Opens (and creates, if needed) the data directory.
    pub fn open(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| StorageError::io(dir.display(), e))?;
        info!(dir = %dir.display(), "File storage opened");
        Ok(FileStorage { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Maps a key onto its file path.
    ///
    /// Keys are restricted to ASCII letters, digits, `-` and `_` so that a key
    /// can never escape the data directory.
    pub fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl StorageBackend for FileStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io(path.display(), e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");

        fs::write(&tmp, value).map_err(|e| StorageError::io(tmp.display(), e))?;
        fs::rename(&tmp, &path).map_err(|e| StorageError::io(path.display(), e))?;

        debug!(key, bytes = value.len(), "File storage write");
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(key, "File storage remove");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::io(path.display(), e)),
        }
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
