//! Boundary with the front end.
//!
//! Outbound: [`Notification`]s pushed through a [`Notifier`].
//! Inbound: [`Command`]s handled by [`Controller`], one stable entry point
//! parameterized by volume name.

mod controller;

use std::io::Write;
use std::sync::Mutex;
use std::sync::mpsc::Sender;

use log::{debug, error, info, warn};
use serde::Serialize;

pub use controller::{Command, Controller, Response};

/// Tone of a user-facing message.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    #[default]
    Normal,
    Good,
    Bad,
}

/// State of one fetch row in the front end.
pub type FetchStatus = Mood;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    /// Full list of registered volume names after any add/remove.
    TopologyChanged { volumes: Vec<String> },
    DiskAdded { name: String },
    DiskRemoved { name: String },
    FetchStatus { fetcher_id: String, status: FetchStatus },
    FetchProgress { fetcher_id: String, percent: String },
    SyncProgress { volume: String, count: usize },
    SyncFinished { devices: usize },
    /// The artist list of `volume` is stale and should be reloaded.
    ArtistsChanged { volume: String },
    Log { message: String, mood: Mood },
}

impl Notification {
    pub fn log(message: impl Into<String>, mood: Mood) -> Self {
        Self::Log {
            message: message.into(),
            mood,
        }
    }
}

/// Outbound sink for notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log. Used when no front end is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        match notification {
            Notification::Log {
                message,
                mood: Mood::Bad,
            } => warn!("{message}"),
            Notification::Log { message, .. } => info!("{message}"),
            Notification::DiskRemoved { name } => warn!("External disk removed {name}"),
            Notification::DiskAdded { name } => info!("External disk detected {name}!"),
            Notification::SyncProgress { volume, count } => {
                debug!("copied {count} track(s) to {volume}")
            }
            Notification::SyncFinished { devices } => info!("Finished syncing {devices} devices!"),
            Notification::FetchStatus {
                fetcher_id,
                status: Mood::Bad,
            } => warn!("fetch {fetcher_id}: failed"),
            other => debug!("{other:?}"),
        }
    }
}

/// Forwards notifications over a channel.
#[derive(Clone)]
pub struct ChannelNotifier {
    tx: Sender<Notification>,
}

impl ChannelNotifier {
    pub fn new(tx: Sender<Notification>) -> Self {
        Self { tx }
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        // Receiver gone means nobody is listening any more.
        let _ = self.tx.send(notification);
    }
}

/// Writes one JSON object per notification per line, for a front end
/// reading our stdout.
pub struct JsonLinesNotifier<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> JsonLinesNotifier<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }
}

impl<W: Write + Send> Notifier for JsonLinesNotifier<W> {
    fn notify(&self, notification: Notification) {
        let line = match serde_json::to_string(&notification) {
            Ok(line) => line,
            Err(e) => {
                error!("failed to encode notification: {e}");
                return;
            }
        };
        let Ok(mut out) = self.out.lock() else {
            error!("notification output poisoned, dropping {line}");
            return;
        };
        if let Err(e) = writeln!(out, "{line}").and_then(|_| out.flush()) {
            debug!("failed to write notification: {e}");
        }
    }
}

#[cfg(test)]
mod tests;
