use std::collections::HashMap;
use std::fs;
use std::sync::Mutex;
use std::sync::mpsc;

use tempfile::tempdir;

use super::*;
use crate::bridge::ChannelNotifier;
use crate::error::Error;
use crate::library::TagIo;
use crate::library::testing::{FakeTags, context};

/// Fails a configured number of times per search term, then writes the file.
#[derive(Default)]
struct FlakyAcquirer {
    failures_left: Mutex<HashMap<String, u32>>,
    calls: Mutex<Vec<String>>,
}

impl FlakyAcquirer {
    fn failing(term: &str, times: u32) -> Self {
        let acquirer = Self::default();
        acquirer
            .failures_left
            .lock()
            .unwrap()
            .insert(term.to_string(), times);
        acquirer
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Acquirer for FlakyAcquirer {
    fn acquire(
        &self,
        track: &TrackRecord,
        destination: &Path,
        progress: &dyn Fn(&str),
    ) -> Result<()> {
        let term = track.search_term();
        self.calls.lock().unwrap().push(term.clone());
        if let Some(left) = self.failures_left.lock().unwrap().get_mut(&term) {
            if *left > 0 {
                *left -= 1;
                return Err(Error::Fetch("HTTP Error 403: Forbidden".to_string()));
            }
        }
        progress("50.0%");
        fs::write(destination, term.as_bytes())?;
        progress("100%");
        Ok(())
    }
}

struct Harness {
    fetcher: Fetcher,
    acquirer: Arc<FlakyAcquirer>,
    tags: Arc<FakeTags>,
    ctx: LibraryContext,
    rx: mpsc::Receiver<Notification>,
    dir: tempfile::TempDir,
}

fn harness(acquirer: FlakyAcquirer) -> Harness {
    let dir = tempdir().unwrap();
    let (tx, rx) = mpsc::channel();
    let tags = FakeTags::with(&[]);
    let ctx = context(tags.clone());
    let acquirer = Arc::new(acquirer);
    let fetcher = Fetcher::new(
        acquirer.clone(),
        ctx.clone(),
        dir.path().to_path_buf(),
        "local",
        3,
        Arc::new(ChannelNotifier::new(tx)),
    );
    Harness {
        fetcher,
        acquirer,
        tags,
        ctx,
        rx,
        dir,
    }
}

fn statuses(seen: &[Notification], id: &str) -> Vec<Mood> {
    seen.iter()
        .filter_map(|n| match n {
            Notification::FetchStatus { fetcher_id, status } if fetcher_id == id => Some(*status),
            _ => None,
        })
        .collect()
}

#[test]
fn successful_fetch_is_tagged_cached_and_reported() {
    let h = harness(FlakyAcquirer::default());
    let fetched = h
        .fetcher
        .run_batch(&[FetchRequest::new("daft punk", "ONE MORE TIME", "1")]);
    assert_eq!(fetched, 1);

    let path = h.dir.path().join("Daft Punk - One more time.mp3");
    assert!(path.exists());

    // Written tags make the file resolvable from tags, too.
    let tagged = h.tags.read(&path).unwrap();
    assert_eq!(tagged.artist, "Daft Punk");
    assert_eq!(tagged.title, "One more time");

    let session = h.ctx.cache.open();
    assert_eq!(
        session
            .get("Daft Punk - One more time.mp3")
            .map(|d| d.title.as_str()),
        Some("One more time")
    );
    drop(session);

    let seen: Vec<Notification> = h.rx.try_iter().collect();
    assert_eq!(statuses(&seen, "1"), vec![Mood::Normal, Mood::Good]);
    assert!(seen.contains(&Notification::FetchProgress {
        fetcher_id: "1".into(),
        percent: "50.0%".into()
    }));
    assert!(seen.contains(&Notification::ArtistsChanged {
        volume: "local".into()
    }));
    assert_eq!(
        seen.last(),
        Some(&Notification::log("Finished fetching tracks!", Mood::Normal))
    );
}

#[test]
fn transient_failures_are_retried() {
    let h = harness(FlakyAcquirer::failing("Abba Waterloo", 2));
    assert_eq!(h.fetcher.run_batch(&[FetchRequest::new("abba", "waterloo", "7")]), 1);
    assert_eq!(h.acquirer.calls().len(), 3);

    let seen: Vec<Notification> = h.rx.try_iter().collect();
    assert_eq!(statuses(&seen, "7"), vec![Mood::Normal, Mood::Good]);
    assert!(seen.contains(&Notification::log("Retrying 2/3", Mood::Bad)));
}

#[test]
fn exhausted_item_is_skipped_and_batch_continues() {
    let h = harness(FlakyAcquirer::failing("Abba Waterloo", 99));
    let fetched = h.fetcher.run_batch(&[
        FetchRequest::new("abba", "waterloo", "1"),
        FetchRequest::new("abba", "sos", "2"),
    ]);
    assert_eq!(fetched, 1);
    assert_eq!(
        h.acquirer.calls(),
        vec!["Abba Waterloo", "Abba Waterloo", "Abba Waterloo", "Abba Sos"]
    );
    assert!(!h.dir.path().join("Abba - Waterloo.mp3").exists());
    assert!(h.dir.path().join("Abba - Sos.mp3").exists());

    let seen: Vec<Notification> = h.rx.try_iter().collect();
    assert_eq!(statuses(&seen, "1"), vec![Mood::Normal, Mood::Bad]);
    assert_eq!(statuses(&seen, "2"), vec![Mood::Normal, Mood::Good]);
    assert!(seen.contains(&Notification::log("Unable to fetch song. Skipping...", Mood::Bad)));
}

#[test]
fn blank_requests_are_dropped() {
    let h = harness(FlakyAcquirer::default());
    let fetched = h.fetcher.run_batch(&[
        FetchRequest::new("  ", "title", "1"),
        FetchRequest::new("artist", "", "2"),
    ]);
    assert_eq!(fetched, 0);
    assert!(h.acquirer.calls().is_empty());
}

#[test]
fn spawned_batch_reports_its_count() {
    let h = harness(FlakyAcquirer::default());
    let fetcher = Arc::new(h.fetcher);
    let join = fetcher
        .spawn_batch(vec![FetchRequest::new("abba", "sos", "1")])
        .unwrap();
    assert_eq!(join.join().unwrap(), 1);
    assert!(h.dir.path().join("Abba - Sos.mp3").exists());
}
