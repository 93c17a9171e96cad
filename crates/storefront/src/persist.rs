//! Persisted key-value snapshots.
//!
//! Small JSON blobs that outlive the process: the last-used filter set and
//! the autocomplete suggestion cache. A storage failure degrades to "no
//! cross-session persistence" and is never surfaced to the visitor; callers
//! decide whether to clear or simply skip on a failed write.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use thiserror::Error;

/// Errors writing to a persisted store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// A fallible string key-value store.
///
/// Reads are infallible by design: an unreadable entry is the same as a
/// missing one.
pub trait KeyValueStore: Send + Sync {
    fn read(&self, key: &str) -> Option<String>;
    fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str);
}

/// One JSON file per key under a data directory.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Create a store rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Map a key to a file path, replacing anything that is not safe in a
    /// file name.
    fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '-'
                }
            })
            .collect();
        self.dir.join(format!("{file}.json"))
    }
}

impl KeyValueStore for JsonFileStore {
    fn read(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) {
        let _ = fs::remove_file(self.path_for(key));
    }
}

/// In-process store: test double and fallback when no data directory is
/// writable.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_owned(), value.to_owned());
        }
        Ok(())
    }

    fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_store(name: &str) -> JsonFileStore {
        let dir = std::env::temp_dir().join(format!(
            "foodbook-persist-{name}-{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        JsonFileStore::new(dir).unwrap()
    }

    #[test]
    fn test_file_store_round_trip() {
        let store = temp_store("round-trip");
        assert!(store.read("foodbook.filters").is_none());

        store.write("foodbook.filters", r#"{"a":1}"#).unwrap();
        assert_eq!(store.read("foodbook.filters").as_deref(), Some(r#"{"a":1}"#));

        store.remove("foodbook.filters");
        assert!(store.read("foodbook.filters").is_none());
    }

    #[test]
    fn test_file_store_sanitizes_keys() {
        let store = temp_store("sanitize");
        store.write("../../etc/passwd", "x").unwrap();
        // The write lands inside the data directory, not outside it.
        assert_eq!(store.read("../../etc/passwd").as_deref(), Some("x"));
        assert!(store.path_for("../../etc/passwd").starts_with(&store.dir));
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::default();
        store.write("key", "value").unwrap();
        assert_eq!(store.read("key").as_deref(), Some("value"));
        store.remove("key");
        assert!(store.read("key").is_none());
    }
}
