//! Cache storage module
//!
//! This module provides persistent caching of provider responses using the
//! system's standard cache directory. Data is serialized to JSON format for
//! storage and expires after a configurable time-to-live.

use serde::{Deserialize, Serialize};
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use thiserror::Error;

/// Errors that can occur during cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    /// Failed to determine cache directory location
    #[error("Failed to determine cache directory location")]
    CacheDirectoryNotFound,

    /// Failed to create or access cache directory
    #[error("Failed to create cache directory at {path}: {source}")]
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to read cached data
    #[error("Failed to read cache file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write cached data
    #[error("Failed to write cache file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to deserialize cached data
    #[error("Failed to deserialize cache file {path}: {source}")]
    DeserializationFailed {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Failed to serialize data for caching
    #[error("Failed to serialize data: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// A generic cache storage for serializable data
///
/// Entries are JSON files named after their identifier. An entry older than
/// the configured time-to-live is treated as absent.
pub struct CacheStorage<T> {
    /// The directory where cached data is stored
    cache_dir: PathBuf,
    /// Maximum age of an entry, `None` keeps entries forever
    ttl: Option<Duration>,
    _phantom: PhantomData<T>,
}

impl<T> CacheStorage<T>
where
    T: Serialize + for<'de> Deserialize<'de>,
{
    /// Opens or creates a cache storage with the given name
    ///
    /// The cache will be stored in the system's standard cache directory
    /// under a subdirectory named after the application and the provided name.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let cache: CacheStorage<Vec<Season>> =
    ///     CacheStorage::open("seasons", Some(Duration::from_secs(30 * 24 * 60 * 60)))?;
    /// ```
    pub fn open(name: &str, ttl: Option<Duration>) -> Result<Self, CacheError> {
        let proj_dirs = directories::ProjectDirs::from("org", "titlehound", "titlehound")
            .ok_or(CacheError::CacheDirectoryNotFound)?;

        Self::open_in(proj_dirs.cache_dir(), name, ttl)
    }

    /// Opens or creates a cache storage below an explicit root directory
    pub fn open_in(root: &Path, name: &str, ttl: Option<Duration>) -> Result<Self, CacheError> {
        let cache_dir = root.join(sanitize_name(name));

        fs::create_dir_all(&cache_dir).map_err(|e| CacheError::DirectoryCreationFailed {
            path: cache_dir.clone(),
            source: e,
        })?;

        Ok(Self {
            cache_dir,
            ttl,
            _phantom: PhantomData,
        })
    }

    /// Loads cached data for the given identifier
    ///
    /// Returns `Ok(None)` if no entry exists or the entry has expired. Returns
    /// an error if the entry exists but cannot be read or deserialized.
    pub fn load(&self, identifier: &str) -> Result<Option<T>, CacheError> {
        let file_path = self.entry_path(identifier);

        if !file_path.exists() {
            return Ok(None);
        }

        if self.is_expired(&file_path) {
            // Stale entries are rewritten on the next store
            let _ = fs::remove_file(&file_path);
            return Ok(None);
        }

        let content = fs::read_to_string(&file_path).map_err(|e| CacheError::ReadFailed {
            path: file_path.clone(),
            source: e,
        })?;

        let data =
            serde_json::from_str(&content).map_err(|e| CacheError::DeserializationFailed {
                path: file_path,
                source: e,
            })?;

        Ok(Some(data))
    }

    /// Stores data in the cache with the given identifier
    pub fn store(&self, identifier: &str, data: &T) -> Result<(), CacheError> {
        let file_path = self.entry_path(identifier);

        let content = serde_json::to_string_pretty(data)?;

        fs::write(&file_path, content).map_err(|e| CacheError::WriteFailed {
            path: file_path,
            source: e,
        })?;

        Ok(())
    }

    /// Returns the path to the cache directory
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// File path for an identifier
    ///
    /// Sanitizing alone can map distinct identifiers to the same name, so a
    /// short content hash of the raw identifier is appended.
    fn entry_path(&self, identifier: &str) -> PathBuf {
        let digest = blake3::hash(identifier.as_bytes()).to_hex();
        self.cache_dir
            .join(format!("{}_{}.json", sanitize_name(identifier), &digest.as_str()[..16]))
    }

    fn is_expired(&self, file_path: &Path) -> bool {
        let Some(ttl) = self.ttl else {
            return false;
        };

        let modified = match fs::metadata(file_path).and_then(|meta| meta.modified()) {
            Ok(modified) => modified,
            Err(_) => return true,
        };

        match SystemTime::now().duration_since(modified) {
            Ok(age) => age >= ttl,
            // Modification time in the future, keep the entry
            Err(_) => false,
        }
    }
}

/// Sanitizes a name for use in file paths
///
/// Converts to lowercase and replaces all characters that are not
/// a-z, 0-9, or hyphen with underscores.
fn sanitize_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("Simple"), "simple");
        assert_eq!(sanitize_name("tv/1396/season/2"), "tv_1396_season_2");
        assert_eq!(sanitize_name("With-Hyphens"), "with-hyphens");
        assert_eq!(sanitize_name("Special!@#$%"), "special_____");
    }

    #[test]
    fn test_store_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let cache: CacheStorage<Vec<u32>> = CacheStorage::open_in(dir.path(), "numbers", None).unwrap();

        assert_eq!(cache.load("tv/1").unwrap(), None);
        cache.store("tv/1", &vec![1, 2, 3]).unwrap();
        assert_eq!(cache.load("tv/1").unwrap(), Some(vec![1, 2, 3]));
        assert!(cache.cache_dir().ends_with("numbers"));
    }

    #[test]
    fn test_colliding_sanitized_names_stay_apart() {
        let dir = tempfile::tempdir().unwrap();
        let cache: CacheStorage<String> = CacheStorage::open_in(dir.path(), "ids", None).unwrap();

        cache.store("tv/1", &"slash".to_string()).unwrap();
        cache.store("tv:1", &"colon".to_string()).unwrap();

        assert_eq!(cache.load("tv/1").unwrap().as_deref(), Some("slash"));
        assert_eq!(cache.load("tv:1").unwrap().as_deref(), Some("colon"));
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache: CacheStorage<u64> =
            CacheStorage::open_in(dir.path(), "expiring", Some(Duration::ZERO)).unwrap();

        cache.store("find/tt0903747", &1396).unwrap();
        assert_eq!(cache.load("find/tt0903747").unwrap(), None);
    }

    #[test]
    fn test_corrupt_entry_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache: CacheStorage<u64> = CacheStorage::open_in(dir.path(), "corrupt", None).unwrap();

        fs::write(cache.entry_path("broken"), "not json").unwrap();
        assert!(matches!(
            cache.load("broken"),
            Err(CacheError::DeserializationFailed { .. })
        ));
    }
}
