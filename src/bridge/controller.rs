use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use log::{debug, error, info};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::fetch::{FetchRequest, Fetcher};
use crate::registry::{SharedRegistry, lock};
use crate::sync::SyncEngine;

/// Requests coming from the front end.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    ListVolumes,
    LoadArtists { volume: String },
    LoadTracks { volume: String, artist: String },
    Fetch { requests: Vec<FetchRequest> },
    SyncAll,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "response", content = "items", rename_all = "snake_case")]
pub enum Response {
    Volumes(Vec<String>),
    Artists(Vec<String>),
    Tracks(Vec<String>),
    /// Number of requests handed to the background fetch.
    FetchStarted(usize),
    /// Names of the volumes that received tracks.
    Synced(Vec<String>),
}

/// Executes [`Command`]s against the shared registry.
pub struct Controller {
    registry: SharedRegistry,
    sync: SyncEngine,
    fetcher: Arc<Fetcher>,
    fetches: Mutex<Vec<JoinHandle<usize>>>,
}

impl Controller {
    pub fn new(registry: SharedRegistry, sync: SyncEngine, fetcher: Arc<Fetcher>) -> Self {
        Self {
            registry,
            sync,
            fetcher,
            fetches: Mutex::new(Vec::new()),
        }
    }

    pub fn handle(&self, command: Command) -> Result<Response> {
        debug!("handling {command:?}");
        match command {
            Command::ListVolumes => Ok(Response::Volumes(lock(&self.registry).names())),
            Command::LoadArtists { volume } => {
                let mut volume = lock(&self.registry).get(&volume)?.clone();
                Ok(Response::Artists(volume.artists()))
            }
            Command::LoadTracks { volume, artist } => {
                let mut volume = lock(&self.registry).get(&volume)?.clone();
                Ok(Response::Tracks(volume.tracks_by_artist(&artist)))
            }
            Command::Fetch { requests } => {
                let count = requests.len();
                let handle = self.fetcher.clone().spawn_batch(requests)?;
                if let Ok(mut fetches) = self.fetches.lock() {
                    fetches.retain(|h| !h.is_finished());
                    fetches.push(handle);
                }
                Ok(Response::FetchStarted(count))
            }
            Command::SyncAll => {
                let summaries = self.sync.sync_all();
                for s in &summaries {
                    info!(
                        "{}: {} missing, {} copied, {} failed",
                        s.volume, s.missing, s.copied, s.failed
                    );
                }
                Ok(Response::Synced(
                    summaries.into_iter().map(|s| s.volume).collect(),
                ))
            }
        }
    }

    /// Block until every fetch started so far has finished.
    pub fn wait_for_fetches(&self) {
        let pending: Vec<JoinHandle<usize>> = match self.fetches.lock() {
            Ok(mut fetches) => fetches.drain(..).collect(),
            Err(_) => return,
        };
        for handle in pending {
            if handle.join().is_err() {
                error!("fetch thread panicked");
            }
        }
    }
}
