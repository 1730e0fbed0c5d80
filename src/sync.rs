//! Replicates tracks across every registered volume.
//!
//! Every run reloads all track sets from disk.

use std::collections::HashSet;
use std::sync::Arc;

use log::{debug, info};

use crate::bridge::{Mood, Notification, Notifier};
use crate::library::{TrackRecord, Volume};
use crate::registry::{SharedRegistry, lock};

/// Per-volume result of a sync run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeSyncSummary {
    pub volume: String,
    pub missing: usize,
    pub copied: usize,
    pub failed: usize,
}

pub struct SyncEngine {
    registry: SharedRegistry,
    notifier: Arc<dyn Notifier>,
}

impl SyncEngine {
    pub fn new(registry: SharedRegistry, notifier: Arc<dyn Notifier>) -> Self {
        Self { registry, notifier }
    }

    /// Copy into every volume the tracks it lacks but some other volume has.
    ///
    /// Does nothing with fewer than two volumes. Lost tracks never take part.
    pub fn sync_all(&self) -> Vec<VolumeSyncSummary> {
        // The registry lock is released before any disk I/O.
        let mut volumes = lock(&self.registry).snapshot();
        if volumes.len() < 2 {
            debug!("sync skipped: {} volume(s) registered", volumes.len());
            return Vec::new();
        }

        for volume in volumes.iter_mut() {
            volume.load_all(true);
        }
        let all_tracks = union_of(&volumes);
        info!(
            "syncing {} distinct tracks across {} volumes",
            all_tracks.len(),
            volumes.len()
        );

        let mut summaries = Vec::new();
        for volume in &volumes {
            let present: HashSet<&TrackRecord> = volume.tracks().iter().collect();
            let mut missing: Vec<&TrackRecord> = all_tracks
                .iter()
                .copied()
                .filter(|t| !present.contains(t))
                .collect();
            if missing.is_empty() {
                continue;
            }
            missing.sort_by_key(|t| t.full_name());

            self.notifier.notify(Notification::log(
                format!("Adding {} track(s) to {}", missing.len(), volume.name()),
                Mood::Normal,
            ));
            let report = volume.materialize(missing.iter().copied());
            for err in &report.failed {
                self.notifier
                    .notify(Notification::log(err.to_string(), Mood::Bad));
            }
            self.notifier.notify(Notification::SyncProgress {
                volume: volume.name().to_string(),
                count: report.copied,
            });
            self.notifier.notify(Notification::ArtistsChanged {
                volume: volume.name().to_string(),
            });

            summaries.push(VolumeSyncSummary {
                volume: volume.name().to_string(),
                missing: missing.len(),
                copied: report.copied,
                failed: report.failed.len(),
            });
        }

        self.notifier.notify(Notification::log(
            format!("Finished syncing {} devices!", volumes.len()),
            Mood::Good,
        ));
        self.notifier.notify(Notification::SyncFinished {
            devices: volumes.len(),
        });
        summaries
    }
}

/// Distinct tracks over all volumes, first occurrence wins as copy source.
fn union_of(volumes: &[Volume]) -> Vec<&TrackRecord> {
    let mut seen = HashSet::new();
    volumes
        .iter()
        .flat_map(|v| v.tracks())
        .filter(|t| !t.is_lost())
        .filter(|t| seen.insert(*t))
        .collect()
}
