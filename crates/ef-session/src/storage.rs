//! Durable key/value storage for client state.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{SessionError, SessionResult};

pub trait Storage {
    fn get(&self, key: &str) -> SessionResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> SessionResult<()>;
    fn remove(&mut self, key: &str) -> SessionResult<()>;
}

fn check_key(key: &str) -> SessionResult<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(SessionError::InvalidKey {
            key: key.to_string(),
        })
    }
}

/// One JSON file per key under a state directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root_dir: PathBuf,
}

impl FileStorage {
    pub fn new(root_dir: PathBuf) -> SessionResult<Self> {
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self { root_dir })
    }

    /// Storage over an existing directory, for read-only callers; `None`
    /// when nothing has been persisted there yet.
    pub fn open_existing(root_dir: &Path) -> Option<Self> {
        root_dir.is_dir().then(|| Self {
            root_dir: root_dir.to_path_buf(),
        })
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.root_dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> SessionResult<Option<String>> {
        check_key(key)?;
        let path = self.entry_path(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set(&mut self, key: &str, value: &str) -> SessionResult<()> {
        check_key(key)?;
        fs::write(self.entry_path(key), value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> SessionResult<()> {
        check_key(key)?;
        let path = self.entry_path(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> SessionResult<Option<String>> {
        check_key(key)?;
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> SessionResult<()> {
        check_key(key)?;
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> SessionResult<()> {
        check_key(key)?;
        self.entries.remove(key);
        Ok(())
    }
}

/// Read and decode a persisted value.
///
/// Missing, unreadable, or malformed entries all yield `T::default()`; the
/// failure is logged and never surfaced.
pub fn load_json<T, S>(storage: &S, key: &str) -> T
where
    T: DeserializeOwned + Default,
    S: Storage + ?Sized,
{
    let raw = match storage.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return T::default(),
        Err(err) => {
            tracing::debug!(key, error = %err, "failed to read persisted state");
            return T::default();
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(err) => {
            tracing::debug!(key, error = %err, "discarding malformed persisted state");
            T::default()
        }
    }
}

pub fn save_json<T, S>(storage: &mut S, key: &str, value: &T) -> SessionResult<()>
where
    T: Serialize + ?Sized,
    S: Storage + ?Sized,
{
    let json = serde_json::to_string(value)?;
    storage.set(key, &json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_round_trip() {
        let mut storage = MemoryStorage::new();
        save_json(&mut storage, "ids", &vec!["a", "b"]).unwrap();
        let ids: Vec<String> = load_json(&storage, "ids");
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn malformed_value_degrades_to_default() {
        let mut storage = MemoryStorage::new();
        storage.set("ids", "{not json").unwrap();
        let ids: Vec<String> = load_json(&storage, "ids");
        assert!(ids.is_empty());

        storage.set("ids", "{\"a\":1}").unwrap();
        let ids: Vec<String> = load_json(&storage, "ids");
        assert!(ids.is_empty());
    }

    #[test]
    fn missing_key_is_default() {
        let storage = MemoryStorage::new();
        let ids: Vec<String> = load_json(&storage, "nothing");
        assert!(ids.is_empty());
    }

    #[test]
    fn path_like_keys_are_rejected() {
        let mut storage = MemoryStorage::new();
        assert!(matches!(
            storage.set("../escape", "1"),
            Err(SessionError::InvalidKey { .. })
        ));
    }

    #[test]
    fn open_existing_does_not_create_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("state");
        assert!(FileStorage::open_existing(&root).is_none());
        assert!(!root.exists());

        FileStorage::new(root.clone())
            .unwrap()
            .set("selectedSimulationIds", "[\"a\"]")
            .unwrap();
        let existing = FileStorage::open_existing(&root).expect("directory exists now");
        assert_eq!(
            existing.get("selectedSimulationIds").unwrap().as_deref(),
            Some("[\"a\"]")
        );
    }

    #[test]
    fn file_storage_persists_and_removes() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path().join("state")).unwrap();
        storage.set("selectedSimulationIds", "[\"a\"]").unwrap();

        let reopened = FileStorage::new(dir.path().join("state")).unwrap();
        assert_eq!(
            reopened.get("selectedSimulationIds").unwrap().as_deref(),
            Some("[\"a\"]")
        );

        storage.remove("selectedSimulationIds").unwrap();
        assert!(reopened.get("selectedSimulationIds").unwrap().is_none());
    }
}
