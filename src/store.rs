use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;
use tempfile::Builder;

use crate::error::PokedexError;

pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, PokedexError>;
    fn set(&self, key: &str, value: &str) -> Result<(), PokedexError>;
}

#[derive(Debug, Clone)]
pub struct Store {
    data_root: Utf8PathBuf,
}

impl Store {
    pub fn new() -> Result<Self, PokedexError> {
        let data_root = BaseDirs::new()
            .and_then(|dirs| {
                Utf8PathBuf::from_path_buf(dirs.data_local_dir().join("pokedex")).ok()
            })
            .ok_or_else(|| {
                PokedexError::Storage("unable to resolve data directory".to_string())
            })?;
        Ok(Self { data_root })
    }

    pub fn new_with_root(data_root: Utf8PathBuf) -> Self {
        Self { data_root }
    }

    pub fn key_path(&self, key: &str) -> Utf8PathBuf {
        self.data_root.join(format!("{key}.json"))
    }

    pub fn ensure_data_root(&self) -> Result<(), PokedexError> {
        fs::create_dir_all(self.data_root.as_std_path())
            .map_err(|err| PokedexError::Storage(err.to_string()))
    }

    pub fn storage(&self) -> FileStorage {
        FileStorage {
            store: self.clone(),
        }
    }

    pub fn write_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), PokedexError> {
        let parent = path
            .parent()
            .ok_or_else(|| PokedexError::Storage("invalid destination path".to_string()))?;
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| PokedexError::Storage(err.to_string()))?;
        let mut temp = Builder::new()
            .prefix("pokedex-write")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| PokedexError::Storage(err.to_string()))?;
        temp.write_all(content)
            .map_err(|err| PokedexError::Storage(err.to_string()))?;
        temp.persist(path.as_std_path())
            .map_err(|err| PokedexError::Storage(err.to_string()))?;
        Ok(())
    }
}

/// One `<key>.json` file per key under the store's data root.
#[derive(Debug, Clone)]
pub struct FileStorage {
    store: Store,
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, PokedexError> {
        let path = self.store.key_path(key);
        match fs::read_to_string(path.as_std_path()) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(PokedexError::Storage(format!("read {path}: {err}"))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PokedexError> {
        Store::write_atomic(&self.store.key_path(key), value.as_bytes())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(key: &str, value: &str) -> Self {
        let storage = Self::default();
        storage
            .values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        storage
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, PokedexError> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PokedexError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

impl<T: KeyValueStorage + ?Sized> KeyValueStorage for std::sync::Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, PokedexError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PokedexError> {
        (**self).set(key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_path_layout() {
        let store = Store::new_with_root(Utf8PathBuf::from("/tmp/pokedex-test"));
        assert!(store.key_path("bookmarks").ends_with("pokedex-test/bookmarks.json"));
    }

    #[test]
    fn file_storage_missing_key_is_none() {
        let temp = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().join("data")).unwrap();
        let storage = Store::new_with_root(root).storage();
        assert_eq!(storage.get("bookmarks").unwrap(), None);
        storage.set("bookmarks", "[]").unwrap();
        assert_eq!(storage.get("bookmarks").unwrap().as_deref(), Some("[]"));
    }
}
