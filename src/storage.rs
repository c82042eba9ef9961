//! Key/value persistence for portal state.
//!
//! State is stored as JSON strings under versioned keys. Bumping a key's
//! suffix abandons old data rather than migrating it. `FileStore` keeps one
//! `<key>.json` file per key in the data directory and writes atomically
//! (temp file + rename); `MemoryStore` backs tests.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::error::{Error, Result};

pub const KEY_USER: &str = "userData_v1";
pub const KEY_TASKS: &str = "app_tasks_v1";
pub const KEY_TASK_SEQ: &str = "app_task_seq_v1";
pub const KEY_NOTIFICATIONS: &str = "app_notifications_v1";
pub const KEY_TASK_VIEW: &str = "task_view_mode_v1";
pub const KEY_TASK_PAGE_SIZE: &str = "task_page_size_v1";
pub const KEY_NOTIF_VIEW: &str = "notif_view_mode_v1";
pub const KEY_NOTIF_PAGE_SIZE: &str = "notif_page_size_v1";

/// String key/value storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Read and decode `key`. Missing keys yield `None`; undecodable data is
/// logged and treated as missing.
pub fn load_json<T: DeserializeOwned>(store: &impl KeyValueStore, key: &str) -> Result<Option<T>> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            warn!(key, error = %e, "discarding unreadable stored value");
            Ok(None)
        }
    }
}

pub fn save_json<T: Serialize + ?Sized>(store: &mut impl KeyValueStore, key: &str, value: &T) -> Result<()> {
    let data = serde_json::to_string_pretty(value).map_err(|source| Error::Json {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &data)
}

/// One JSON file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) the data directory.
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).map_err(|source| Error::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        Ok(FileStore { dir: dir.to_path_buf() })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(Error::Io { path, source }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        let io = |source: std::io::Error| Error::Io { path: path.clone(), source };
        let mut f = File::create(&tmp).map_err(io)?;
        f.write_all(value.as_bytes()).map_err(io)?;
        f.flush().map_err(io)?;
        fs::rename(&tmp, &path).map_err(io)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(Error::Io { path, source }),
        }
    }
}

/// In-memory storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_round_trips_and_removes() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(&dir.path().join("nested")).unwrap();
        assert_eq!(store.get(KEY_TASKS).unwrap(), None);

        save_json(&mut store, KEY_TASK_SEQ, &42u64).unwrap();
        assert_eq!(load_json::<u64>(&store, KEY_TASK_SEQ).unwrap(), Some(42));
        assert!(store.dir().join("app_task_seq_v1.json").exists());
        assert!(!store.dir().join("app_task_seq_v1.json.tmp").exists());

        store.remove(KEY_TASK_SEQ).unwrap();
        store.remove(KEY_TASK_SEQ).unwrap();
        assert_eq!(store.get(KEY_TASK_SEQ).unwrap(), None);
    }

    #[test]
    fn unreadable_values_are_treated_as_missing() {
        let mut store = MemoryStore::new();
        store.set(KEY_TASKS, "{not json").unwrap();
        assert_eq!(load_json::<Vec<u32>>(&store, KEY_TASKS).unwrap(), None);
    }
}
