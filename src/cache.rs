//! Persistent file-name -> (artist, title) cache.
//!
//! The whole mapping is loaded when a [`CacheSession`] is opened and written
//! back wholesale when the session is dropped. Sessions are not serialized
//! against each other: when two are open at once, the one dropped last wins
//! and the other's unseen insertions are lost.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use log::{debug, error, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Cached resolution of one audio file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackDescriptor {
    pub artist: String,
    pub title: String,
}

pub type CacheMap = HashMap<String, TrackDescriptor>;

/// Backing storage for the cache mapping.
pub trait CacheStore: Send + Sync {
    /// Make sure the backing storage exists, creating an empty mapping if not.
    fn touch(&self) -> Result<()>;
    fn load(&self) -> Result<CacheMap>;
    fn store(&self, data: &CacheMap) -> Result<()>;
}

/// Single JSON object on disk: `{ "<file name>": { "artist": .., "title": .. } }`.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CacheStore for JsonFileStore {
    fn touch(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, b"{}")?;
        Ok(())
    }

    fn load(&self) -> Result<CacheMap> {
        let raw = fs::read_to_string(&self.path)?;
        serde_json::from_str(&raw)
            .map_err(|e| Error::CacheIo(format!("{}: {e}", self.path.display())))
    }

    fn store(&self, data: &CacheMap) -> Result<()> {
        let raw = serde_json::to_string(data).map_err(|e| Error::CacheIo(e.to_string()))?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

/// In-memory store. Clones share the same mapping.
#[derive(Clone, Default)]
pub struct MemoryStore {
    data: Arc<Mutex<CacheMap>>,
}

impl MemoryStore {
    pub fn snapshot(&self) -> CacheMap {
        self.data.lock().map(|d| d.clone()).unwrap_or_default()
    }
}

impl CacheStore for MemoryStore {
    fn touch(&self) -> Result<()> {
        Ok(())
    }

    fn load(&self) -> Result<CacheMap> {
        Ok(self.snapshot())
    }

    fn store(&self, data: &CacheMap) -> Result<()> {
        let mut guard = self
            .data
            .lock()
            .map_err(|_| Error::CacheIo("memory store poisoned".to_string()))?;
        *guard = data.clone();
        Ok(())
    }
}

/// Handle to the cache. Cheap to clone; construct once and pass it to
/// every component that resolves tracks.
#[derive(Clone)]
pub struct MetadataCache {
    store: Arc<dyn CacheStore>,
}

impl MetadataCache {
    pub fn new(store: impl CacheStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    pub fn json_file(path: impl Into<PathBuf>) -> Self {
        Self::new(JsonFileStore::new(path))
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryStore::default())
    }

    /// Load the mapping and return a session that writes it back on drop.
    ///
    /// An unreadable or corrupt backing file is treated as an empty cache.
    pub fn open(&self) -> CacheSession {
        let data = match self.store.touch().and_then(|_| self.store.load()) {
            Ok(data) => data,
            Err(e) => {
                warn!("metadata cache unreadable, starting empty: {e}");
                CacheMap::new()
            }
        };
        debug!("metadata cache opened with {} entries", data.len());
        CacheSession {
            store: self.store.clone(),
            data,
        }
    }
}

/// An open cache. All reads and writes happen against the in-memory copy.
pub struct CacheSession {
    store: Arc<dyn CacheStore>,
    data: CacheMap,
}

impl CacheSession {
    pub fn get(&self, key: &str) -> Option<&TrackDescriptor> {
        self.data.get(key)
    }

    /// Insert `value` unless `key` already resolves to something.
    /// Returns whether the entry was inserted.
    pub fn set(&mut self, key: &str, value: TrackDescriptor) -> bool {
        if self.data.contains_key(key) {
            return false;
        }
        self.data.insert(key.to_string(), value);
        true
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Drop for CacheSession {
    fn drop(&mut self) {
        if let Err(e) = self.store.store(&self.data) {
            error!("failed to write metadata cache: {e}");
        }
    }
}
