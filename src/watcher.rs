//! Hot-plug detection for external disks.
//!
//! A background thread lists the volumes root every poll interval, diffs the
//! result against what the registry already reflects and applies at most one
//! add/remove per tick.

mod poll;

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::bridge::{Mood, Notification, Notifier};
use crate::config::VolumeSettings;
use crate::error::{Error, Result};
use crate::library::{LibraryContext, Volume};
use crate::registry::{SharedRegistry, lock};

pub use poll::{PollState, TopologyEvent};

const MAC_VOLUMES_DIR: &str = "/Volumes";
const LINUX_MOUNT_DIR: &str = "/mnt";

/// Directory whose subdirectories are external disks.
///
/// An explicit `root` setting wins; otherwise only macOS and Linux have a
/// known location.
pub fn resolve_volumes_root(settings: &VolumeSettings) -> Result<PathBuf> {
    if let Some(root) = &settings.root {
        return Ok(root.clone());
    }
    match std::env::consts::OS {
        "macos" => Ok(PathBuf::from(MAC_VOLUMES_DIR)),
        "linux" => Ok(PathBuf::from(LINUX_MOUNT_DIR)),
        other => Err(Error::Configuration(format!(
            "OS not supported: {other}; set volumes.root"
        ))),
    }
}

/// Names of the immediate subdirectories of `root`, minus `ignore`.
pub fn find_volumes(root: &Path, ignore: &BTreeSet<String>) -> io::Result<BTreeSet<String>> {
    let mut names = BTreeSet::new();
    for entry in WalkDir::new(root).min_depth(1).max_depth(1).follow_links(true) {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_dir() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if !ignore.contains(name) {
                names.insert(name.to_string());
            }
        }
    }
    Ok(names)
}

pub struct VolumeWatcher {
    root: PathBuf,
    ignore: BTreeSet<String>,
    state: PollState,
    registry: SharedRegistry,
    ctx: LibraryContext,
    notifier: Arc<dyn Notifier>,
}

impl VolumeWatcher {
    /// `local_name` is added to the ignore set so the local library can
    /// never be removed by a disk of the same name.
    pub fn new(
        root: PathBuf,
        settings: &VolumeSettings,
        local_name: &str,
        registry: SharedRegistry,
        ctx: LibraryContext,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let mut ignore: BTreeSet<String> = settings.ignore.iter().cloned().collect();
        ignore.insert(local_name.to_string());
        Self {
            root,
            ignore,
            state: PollState::default(),
            registry,
            ctx,
            notifier,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List the root once and apply the resulting event, if any.
    pub fn poll_once(&mut self) -> Option<TopologyEvent> {
        let current = match find_volumes(&self.root, &self.ignore) {
            Ok(current) => current,
            Err(e) => {
                warn!("cannot list {}: {e}", self.root.display());
                return None;
            }
        };
        let event = self.state.tick(&current)?;
        self.apply(&event);
        Some(event)
    }

    fn apply(&self, event: &TopologyEvent) {
        match event {
            TopologyEvent::Removed(name) => {
                self.notifier.notify(Notification::log(
                    format!("External disk removed {name}"),
                    Mood::Bad,
                ));
                if let Err(e) = lock(&self.registry).remove(name) {
                    debug!("removal of unregistered disk ignored: {e}");
                }
                self.notifier
                    .notify(Notification::DiskRemoved { name: name.clone() });
            }
            TopologyEvent::Added(name) => {
                self.notifier.notify(Notification::log(
                    format!("External disk detected {name}!"),
                    Mood::Good,
                ));
                let volume = Volume::new(name.clone(), self.root.join(name), self.ctx.clone());
                lock(&self.registry).add(volume);
                self.notifier
                    .notify(Notification::DiskAdded { name: name.clone() });
            }
        }
    }

    /// Poll on a dedicated thread until the returned handle is stopped.
    pub fn spawn(mut self, interval: Duration) -> io::Result<WatcherHandle> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        info!("watching {} for external disks", self.root.display());

        let join = thread::Builder::new()
            .name("volume-watcher".to_string())
            .spawn(move || {
                loop {
                    self.poll_once();
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                debug!("volume watcher stopped");
            })?;

        Ok(WatcherHandle {
            stop: stop_tx,
            join: Some(join),
        })
    }
}

/// Stop signal + join handle of a running watcher.
pub struct WatcherHandle {
    stop: Sender<()>,
    join: Option<JoinHandle<()>>,
}

impl WatcherHandle {
    /// Signal the watcher and wait for its current tick to finish.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let Some(join) = self.join.take() else {
            return;
        };
        if self.stop.send(()).is_err() {
            debug!("volume watcher already gone");
        }
        if join.join().is_err() {
            error!("volume watcher thread panicked");
        }
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
