use crate::model::Task;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Key holding the active collection.
pub const ACTIVE_KEY: &str = "todos";
/// Key holding the archived collection.
pub const ARCHIVED_KEY: &str = "archivedTodos";

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("failed to access {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialize {key}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Durable key-value store backing the task collections. Values are raw
/// bytes; decoding is left to the caller.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;
    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StorageError>;
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStore { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.path_for(key);
        match fs::read(&path) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(|source| StorageError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.path_for(key);
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        fs::write(&tmp, value).map_err(|source| StorageError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(key, path = %path.display(), bytes = value.len(), "wrote entry");
        Ok(())
    }
}

/// Volatile store, used where nothing should touch the disk.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

/// Reads one collection. Absent, unreadable or malformed entries come back
/// empty; malformed bytes (including invalid UTF-8) are first copied to
/// `<key>.corrupt`.
pub fn load_collection<S: KeyValueStore + ?Sized>(store: &mut S, key: &str) -> Vec<Task> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(err) => {
            warn!(key, error = %err, "could not read entry, starting empty");
            return Vec::new();
        }
    };
    match serde_json::from_slice::<Vec<Task>>(&raw) {
        Ok(tasks) => tasks,
        Err(err) => {
            warn!(key, error = %err, "malformed entry, starting empty");
            let backup = format!("{key}.corrupt");
            if let Err(err) = store.set(&backup, &raw) {
                warn!(key = %backup, error = %err, "could not back up malformed entry");
            }
            Vec::new()
        }
    }
}

/// Rewrites one collection in full.
pub fn save_collection<S: KeyValueStore + ?Sized>(
    store: &mut S,
    key: &str,
    tasks: &[Task],
) -> Result<(), StorageError> {
    let serialized = serde_json::to_vec(tasks).map_err(|source| StorageError::Serialize {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &serialized)
}
