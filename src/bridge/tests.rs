use std::fs;
use std::path::Path;
use std::sync::{Arc, mpsc};

use tempfile::tempdir;

use super::*;
use crate::error::{Error, Result};
use crate::fetch::{Acquirer, FetchRequest, Fetcher};
use crate::library::testing::{FakeTags, context, touch};
use crate::library::{TrackRecord, Volume};
use crate::registry::{VolumeRegistry, lock};
use crate::sync::SyncEngine;

struct WriteAcquirer;

impl Acquirer for WriteAcquirer {
    fn acquire(&self, _track: &TrackRecord, destination: &Path, _: &dyn Fn(&str)) -> Result<()> {
        fs::write(destination, b"audio")?;
        Ok(())
    }
}

fn controller(local: &Path, usb: &Path) -> (Controller, mpsc::Receiver<Notification>) {
    let (tx, rx) = mpsc::channel();
    let notifier: Arc<dyn Notifier> = Arc::new(ChannelNotifier::new(tx));
    let ctx = context(FakeTags::with(&[
        ("1.mp3", "radiohead", "creep"),
        ("2.mp3", "radiohead", "airbag"),
        ("3.mp3", "bjork", "joga"),
    ]));
    let registry = VolumeRegistry::new(notifier.clone()).shared();
    lock(&registry).add(Volume::new("local", local, ctx.clone()));
    lock(&registry).add(Volume::new("USB", usb, ctx.clone()));

    let fetcher = Fetcher::new(
        Arc::new(WriteAcquirer),
        ctx,
        local.to_path_buf(),
        "local",
        1,
        notifier.clone(),
    );
    let sync = SyncEngine::new(registry.clone(), notifier);
    (Controller::new(registry, sync, Arc::new(fetcher)), rx)
}

#[test]
fn commands_are_parameterized_by_volume_name() {
    let local = tempdir().unwrap();
    let usb = tempdir().unwrap();
    touch(local.path(), "1.mp3");
    touch(local.path(), "2.mp3");
    touch(usb.path(), "3.mp3");
    let (ctl, _rx) = controller(local.path(), usb.path());

    assert_eq!(
        ctl.handle(Command::ListVolumes).unwrap(),
        Response::Volumes(vec!["USB".into(), "local".into()])
    );
    assert_eq!(
        ctl.handle(Command::LoadArtists {
            volume: "USB".into()
        })
        .unwrap(),
        Response::Artists(vec!["Bjork".into()])
    );
    assert_eq!(
        ctl.handle(Command::LoadTracks {
            volume: "local".into(),
            artist: "Radiohead".into()
        })
        .unwrap(),
        Response::Tracks(vec!["Airbag".into(), "Creep".into()])
    );
}

#[test]
fn unknown_volume_is_not_found() {
    let local = tempdir().unwrap();
    let usb = tempdir().unwrap();
    let (ctl, _rx) = controller(local.path(), usb.path());

    let err = ctl
        .handle(Command::LoadArtists {
            volume: "Zip disk".into(),
        })
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(name) if name == "Zip disk"));
}

#[test]
fn sync_all_reports_the_volumes_that_changed() {
    let local = tempdir().unwrap();
    let usb = tempdir().unwrap();
    touch(local.path(), "1.mp3");
    let (ctl, _rx) = controller(local.path(), usb.path());

    assert_eq!(
        ctl.handle(Command::SyncAll).unwrap(),
        Response::Synced(vec!["USB".into()])
    );
    assert!(usb.path().join("Radiohead - Creep.mp3").exists());
}

#[test]
fn fetch_runs_in_the_background() {
    let local = tempdir().unwrap();
    let usb = tempdir().unwrap();
    let (ctl, rx) = controller(local.path(), usb.path());

    let response = ctl
        .handle(Command::Fetch {
            requests: vec![FetchRequest::new("abba", "sos", "row-1")],
        })
        .unwrap();
    assert_eq!(response, Response::FetchStarted(1));
    ctl.wait_for_fetches();

    assert!(local.path().join("Abba - Sos.mp3").exists());
    assert!(rx.try_iter().any(|n| n
        == Notification::FetchStatus {
            fetcher_id: "row-1".into(),
            status: Mood::Good
        }));
}

#[test]
fn commands_deserialize_from_json() {
    let cmd: Command =
        serde_json::from_str(r#"{"command":"load_tracks","volume":"local","artist":"Abba"}"#)
            .unwrap();
    assert_eq!(
        cmd,
        Command::LoadTracks {
            volume: "local".into(),
            artist: "Abba".into()
        }
    );

    let cmd: Command = serde_json::from_str(
        r#"{"command":"fetch","requests":[{"artist":"Abba","title":"Sos","fetcher_id":"3"}]}"#,
    )
    .unwrap();
    assert_eq!(
        cmd,
        Command::Fetch {
            requests: vec![FetchRequest::new("Abba", "Sos", "3")]
        }
    );
}

#[test]
fn json_lines_notifier_writes_one_object_per_line() {
    let notifier = JsonLinesNotifier::new(Vec::new());
    notifier.notify(Notification::DiskAdded { name: "USB".into() });
    notifier.notify(Notification::log("hi", Mood::Good));

    let out = notifier.out.into_inner().unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], r#"{"kind":"disk_added","name":"USB"}"#);
    assert_eq!(lines[1], r#"{"kind":"log","message":"hi","mood":"good"}"#);
}

#[test]
fn channel_notifier_tolerates_a_dropped_receiver() {
    let (tx, rx) = mpsc::channel();
    let notifier = ChannelNotifier::new(tx);
    drop(rx);
    notifier.notify(Notification::SyncFinished { devices: 2 });
}

struct BrokenPipe;

impl Write for BrokenPipe {
    fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
        Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn json_lines_notifier_survives_a_closed_output() {
    let notifier = JsonLinesNotifier::new(BrokenPipe);
    notifier.notify(Notification::DiskRemoved { name: "USB".into() });
    notifier.notify(Notification::SyncFinished { devices: 2 });
}
