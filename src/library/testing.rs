//! Test doubles shared by the library, sync and watcher tests.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::cache::MetadataCache;
use crate::error::Result;

use super::{LibraryContext, TagFields, TagIo};

/// Tags keyed by file name; unknown files have no usable tags.
#[derive(Default)]
pub struct FakeTags {
    by_name: Mutex<HashMap<String, TagFields>>,
    reads: AtomicUsize,
}

impl FakeTags {
    pub fn with(entries: &[(&str, &str, &str)]) -> Arc<Self> {
        let tags = Self::default();
        for (file, artist, title) in entries {
            tags.insert(file, artist, title);
        }
        Arc::new(tags)
    }

    pub fn insert(&self, file: &str, artist: &str, title: &str) {
        if let Ok(mut map) = self.by_name.lock() {
            map.insert(
                file.to_string(),
                TagFields {
                    artist: artist.to_string(),
                    title: title.to_string(),
                },
            );
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl TagIo for FakeTags {
    fn read(&self, path: &Path) -> Option<TagFields> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let name = path.file_name()?.to_str()?;
        self.by_name.lock().ok()?.get(name).cloned()
    }

    fn write(&self, path: &Path, artist: &str, title: &str) -> Result<()> {
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            self.insert(name, artist, title);
        }
        Ok(())
    }
}

pub fn context(tags: Arc<FakeTags>) -> LibraryContext {
    LibraryContext::new(MetadataCache::in_memory(), tags, "mp3")
}

/// Create `dir/file` with its own name as content so copies can be told apart.
pub fn touch(dir: &Path, file: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(file), file.as_bytes()).unwrap();
}
