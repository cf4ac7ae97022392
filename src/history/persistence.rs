use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::HistoryLog;
use crate::error::StorageError;

/// Durable text storage keyed by name. Writes overwrite.
pub trait KeyValueStore: Send {
    /// Fails with [`StorageError::NotFound`] when nothing was ever written under `key`.
    fn read(&self, key: &str) -> Result<String, StorageError>;

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Serialize `log` and store it under `key`.
pub fn save(store: &mut dyn KeyValueStore, key: &str, log: &HistoryLog) -> Result<(), StorageError> {
    let text = log.serialize().map_err(|source| StorageError::Encode {
        key: key.to_string(),
        source,
    })?;
    store.write(key, &text)
}

/// Read the log stored under `key`.
pub fn load(store: &dyn KeyValueStore, key: &str) -> Result<HistoryLog, StorageError> {
    let text = store.read(key)?;
    HistoryLog::deserialize(&text).map_err(|source| StorageError::Parse {
        key: key.to_string(),
        source,
    })
}

/// One `<key>.json` file per key inside a directory.
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StorageError::InvalidKey {
                key: key.to_string(),
            });
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn read(&self, key: &str) -> Result<String, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::not_found(key)),
            Err(e) => Err(StorageError::io(key, e)),
        }
    }

    // tmp file + fsync + rename, so a crash mid-write leaves the old value intact
    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir).map_err(|e| StorageError::io(key, e))?;

        let tmp_path = path.with_extension("json.tmp");
        if let Err(e) = replace_file(&tmp_path, &path, value) {
            let _ = fs::remove_file(&tmp_path);
            return Err(StorageError::io(key, e));
        }
        Ok(())
    }
}

fn replace_file(tmp_path: &Path, path: &Path, value: &str) -> std::io::Result<()> {
    let mut file = File::create(tmp_path)?;
    file.write_all(value.as_bytes())?;
    file.sync_all()?;
    fs::rename(tmp_path, path)
}

/// Process-local store. Clones share the same map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored text, bypassing deserialization.
    pub fn raw(&self, key: &str) -> Option<String> {
        match self.values.lock() {
            Ok(g) => g.get(key).cloned(),
            Err(e) => e.into_inner().get(key).cloned(),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<String, StorageError> {
        self.raw(key).ok_or_else(|| StorageError::not_found(key))
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        match self.values.lock() {
            Ok(mut g) => g.insert(key.to_string(), value.to_string()),
            Err(e) => e.into_inner().insert(key.to_string(), value.to_string()),
        };
        Ok(())
    }
}
