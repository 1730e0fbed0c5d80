//! Acquire new tracks into the local library.
//!
//! Each request is tried a fixed number of times; an item that keeps failing
//! is reported and skipped while the rest of the batch carries on.

mod command;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{info, warn};
use serde::Deserialize;

use crate::bridge::{FetchStatus, Mood, Notification, Notifier};
use crate::error::Result;
use crate::library::{LibraryContext, TrackRecord};

pub use command::CommandAcquirer;

/// One row of the front end's fetch form.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FetchRequest {
    pub artist: String,
    pub title: String,
    /// Opaque token echoed back in status/progress notifications.
    pub fetcher_id: String,
}

impl FetchRequest {
    pub fn new(artist: &str, title: &str, fetcher_id: &str) -> Self {
        Self {
            artist: artist.to_string(),
            title: title.to_string(),
            fetcher_id: fetcher_id.to_string(),
        }
    }

    fn is_blank(&self) -> bool {
        self.artist.trim().is_empty() || self.title.trim().is_empty()
    }
}

/// Produces an audio file for a track at `destination`.
pub trait Acquirer: Send + Sync {
    /// `progress` receives human readable percentages such as `"42.0%"`.
    fn acquire(
        &self,
        track: &TrackRecord,
        destination: &Path,
        progress: &dyn Fn(&str),
    ) -> Result<()>;
}

pub struct Fetcher {
    acquirer: Arc<dyn Acquirer>,
    ctx: LibraryContext,
    /// Local library directory the tracks land in.
    data_dir: PathBuf,
    local_name: String,
    retry_attempts: u32,
    notifier: Arc<dyn Notifier>,
}

impl Fetcher {
    pub fn new(
        acquirer: Arc<dyn Acquirer>,
        ctx: LibraryContext,
        data_dir: PathBuf,
        local_name: &str,
        retry_attempts: u32,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            acquirer,
            ctx,
            data_dir,
            local_name: local_name.to_string(),
            retry_attempts: retry_attempts.max(1),
            notifier,
        }
    }

    /// Fetch, tag and cache every non-blank request. Returns how many succeeded.
    pub fn run_batch(&self, requests: &[FetchRequest]) -> usize {
        let mut fetched = 0;
        {
            let mut session = self.ctx.cache.open();
            for request in requests.iter().filter(|r| !r.is_blank()) {
                let track = TrackRecord::new(&request.artist, &request.title, PathBuf::new());
                let file_name = track.file_name(&self.ctx.audio_format);
                let destination = self.data_dir.join(&file_name);
                let track = track.located_at(&destination);

                if !self.fetch_one(&track, &destination, &request.fetcher_id) {
                    continue;
                }
                if let Err(e) = self.ctx.tags.write(&destination, track.artist(), track.title()) {
                    warn!("{e}");
                }
                session.set(&file_name, track.descriptor());
                fetched += 1;
            }
        }

        self.notifier.notify(Notification::ArtistsChanged {
            volume: self.local_name.clone(),
        });
        self.log("Finished fetching tracks!", Mood::Normal);
        fetched
    }

    /// Run [`Fetcher::run_batch`] on its own thread.
    pub fn spawn_batch(
        self: Arc<Self>,
        requests: Vec<FetchRequest>,
    ) -> std::io::Result<JoinHandle<usize>> {
        thread::Builder::new()
            .name("fetch".to_string())
            .spawn(move || self.run_batch(&requests))
    }

    fn fetch_one(&self, track: &TrackRecord, destination: &Path, fetcher_id: &str) -> bool {
        self.log(format!("Fetching {}...", track.full_name()), Mood::Normal);
        self.status(fetcher_id, Mood::Normal);

        let progress = |percent: &str| {
            self.notifier.notify(Notification::FetchProgress {
                fetcher_id: fetcher_id.to_string(),
                percent: percent.to_string(),
            })
        };

        for attempt in 1..=self.retry_attempts {
            match self.acquirer.acquire(track, destination, &progress) {
                Ok(()) => {
                    info!("fetched {} to {}", track.full_name(), destination.display());
                    self.log(format!("Successfully fetched {}", track.full_name()), Mood::Good);
                    self.status(fetcher_id, Mood::Good);
                    return true;
                }
                Err(e) => {
                    self.log(format!("Issue: {e}"), Mood::Bad);
                    self.log(
                        format!("Retrying {attempt}/{}", self.retry_attempts),
                        Mood::Bad,
                    );
                }
            }
        }

        self.log("Unable to fetch song. Skipping...", Mood::Bad);
        self.status(fetcher_id, Mood::Bad);
        false
    }

    fn status(&self, fetcher_id: &str, status: FetchStatus) {
        self.notifier.notify(Notification::FetchStatus {
            fetcher_id: fetcher_id.to_string(),
            status,
        });
    }

    fn log(&self, message: impl Into<String>, mood: Mood) {
        self.notifier.notify(Notification::log(message, mood));
    }
}

#[cfg(test)]
mod tests;
