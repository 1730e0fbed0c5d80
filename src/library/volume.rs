use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};
use walkdir::WalkDir;

use crate::cache::{CacheSession, MetadataCache};
use crate::error::Error;

use super::model::{TrackRecord, normalize_artist};
use super::tags::{LoftyTags, TagIo};

/// Collaborators every volume needs to turn files into tracks.
#[derive(Clone)]
pub struct LibraryContext {
    pub cache: MetadataCache,
    pub tags: Arc<dyn TagIo>,
    /// Extension (without dot) of the files a volume is made of.
    pub audio_format: String,
}

impl LibraryContext {
    pub fn new(cache: MetadataCache, tags: Arc<dyn TagIo>, audio_format: &str) -> Self {
        Self {
            cache,
            tags,
            audio_format: audio_format
                .trim()
                .trim_start_matches('.')
                .to_ascii_lowercase(),
        }
    }

    pub fn with_lofty(cache: MetadataCache, audio_format: &str) -> Self {
        Self::new(cache, Arc::new(LoftyTags), audio_format)
    }

    fn is_audio_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|s| s.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(&self.audio_format))
            .unwrap_or(false)
    }

    /// Resolve `file_name` inside `dir`: cache first, then tags.
    ///
    /// Whatever the outcome, including the lost-track sentinel, it is cached
    /// so the file is never inspected again.
    pub fn resolve(&self, dir: &Path, file_name: &str, session: &mut CacheSession) -> TrackRecord {
        let path = dir.join(file_name);
        if let Some(desc) = session.get(file_name) {
            return TrackRecord::from_descriptor(desc, path);
        }

        let track = match self.tags.read(&path) {
            Some(fields) => TrackRecord::new(&fields.artist, &fields.title, path),
            None => {
                debug!("no usable tags in {}", path.display());
                TrackRecord::lost(path)
            }
        };
        session.set(file_name, track.descriptor());
        track
    }
}

/// Outcome of copying tracks into a volume.
#[derive(Debug, Default)]
pub struct MaterializeReport {
    pub copied: usize,
    /// Destination already existed; nothing was written.
    pub skipped: usize,
    pub failed: Vec<Error>,
}

/// A directory of audio files treated as one collection.
#[derive(Clone)]
pub struct Volume {
    name: String,
    root: PathBuf,
    tracks: Vec<TrackRecord>,
    ctx: LibraryContext,
}

impl fmt::Debug for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Volume")
            .field("name", &self.name)
            .field("root", &self.root)
            .field("tracks", &self.tracks.len())
            .finish()
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

impl Volume {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>, ctx: LibraryContext) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            tracks: Vec::new(),
            ctx,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Tracks as of the last [`Volume::load_all`].
    pub fn tracks(&self) -> &[TrackRecord] {
        &self.tracks
    }

    /// File names directly under the root with the configured extension.
    pub fn list_audio_files(&self) -> Vec<String> {
        // Non-recursive: only the root directory's own entries.
        WalkDir::new(&self.root)
            .follow_links(true)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter(|e| !is_hidden(e.path()) && self.ctx.is_audio_file(e.path()))
            .filter_map(|e| e.file_name().to_str().map(str::to_string))
            .collect()
    }

    /// Rebuild the track list from disk within one cache session.
    pub fn load_all(&mut self, verbose: bool) {
        if verbose {
            info!("Loading all data from {}...", self.name);
        }
        let files = self.list_audio_files();
        let mut session = self.ctx.cache.open();
        self.tracks = files
            .iter()
            .map(|f| self.ctx.resolve(&self.root, f, &mut session))
            .collect();
        if verbose {
            info!("Successfully loaded data from {}!", self.name);
        }
    }

    /// Distinct artists, sorted. Lost tracks are left out.
    pub fn artists(&mut self) -> Vec<String> {
        self.load_all(false);
        self.tracks
            .iter()
            .filter(|t| !t.is_lost())
            .map(|t| t.artist().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Titles by `artist`, sorted ascending.
    pub fn tracks_by_artist(&mut self, artist: &str) -> Vec<String> {
        self.load_all(false);
        let artist = normalize_artist(artist);
        let mut titles: Vec<String> = self
            .tracks
            .iter()
            .filter(|t| !t.is_lost() && t.artist() == artist)
            .map(|t| t.title().to_string())
            .collect();
        titles.sort();
        titles
    }

    /// Copy each track's source file into this volume as "Artist - Title.ext".
    ///
    /// A failed copy is recorded in the report and the batch carries on.
    pub fn materialize<'a>(
        &self,
        tracks: impl IntoIterator<Item = &'a TrackRecord>,
    ) -> MaterializeReport {
        let mut report = MaterializeReport::default();
        let mut session = self.ctx.cache.open();

        for track in tracks {
            let file_name = track.file_name(&self.ctx.audio_format);
            let destination = self.root.join(&file_name);
            if destination.exists() {
                debug!("{} already exists, not overwriting", destination.display());
                report.skipped += 1;
                continue;
            }

            debug!("{} >>> {}", track.source().display(), destination.display());
            match fs::copy(track.source(), &destination) {
                Ok(_) => {
                    session.set(&file_name, track.descriptor());
                    report.copied += 1;
                }
                Err(source) => {
                    let err = Error::Copy {
                        track: track.full_name(),
                        destination,
                        source,
                    };
                    warn!("{err}");
                    report.failed.push(err);
                }
            }
        }
        report
    }
}
