use std::fs;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use log::{LevelFilter, error, info, warn};

use crate::bridge::{Controller, JsonLinesNotifier, LogNotifier, Notifier};
use crate::cache::MetadataCache;
use crate::config::{self, LogSettings, NotificationFormat};
use crate::fetch::{CommandAcquirer, Fetcher};
use crate::library::{LibraryContext, Volume};
use crate::registry::{VolumeRegistry, lock};
use crate::sync::SyncEngine;
use crate::watcher::{VolumeWatcher, WatcherHandle, resolve_volumes_root};

/// Everything the command loop needs, wired together.
pub struct Services {
    pub controller: Controller,
    /// `None` when the volumes root could not be resolved.
    pub watcher: Option<WatcherHandle>,
}

pub fn init_logging(settings: &LogSettings) {
    let level = settings.level.parse::<LevelFilter>().unwrap_or_else(|_| {
        eprintln!(
            "tunesync: unknown log level '{}', using info",
            settings.level
        );
        LevelFilter::Info
    });

    let mut clog = colog::default_builder();
    clog.filter(None, level);
    if clog.try_init().is_err() {
        return;
    }

    std::panic::set_hook(Box::new(|panic_info| {
        let current_thread = std::thread::current();
        let thread_name = current_thread.name().unwrap_or("unnamed");
        error!("panic in thread '{}': {}", thread_name, panic_info);
    }));
}

pub fn notifier_for(format: NotificationFormat) -> Arc<dyn Notifier> {
    match format {
        NotificationFormat::Log => Arc::new(LogNotifier),
        NotificationFormat::Json => Arc::new(JsonLinesNotifier::new(io::stdout())),
    }
}

pub fn build(settings: &config::Settings, notifier: Arc<dyn Notifier>) -> io::Result<Services> {
    let library = &settings.library;
    fs::create_dir_all(&library.data_dir)?;

    let format = settings.audio_format();
    let ctx = LibraryContext::with_lofty(MetadataCache::json_file(&library.cache_file), &format);

    let registry = VolumeRegistry::new(notifier.clone()).shared();
    lock(&registry).add(Volume::new(
        library.local_name.clone(),
        library.data_dir.clone(),
        ctx.clone(),
    ));

    let watcher = match resolve_volumes_root(&settings.volumes) {
        Ok(root) => {
            if !root.is_dir() {
                warn!("volumes root {} does not exist yet", root.display());
            }
            let watcher = VolumeWatcher::new(
                root,
                &settings.volumes,
                &library.local_name,
                registry.clone(),
                ctx.clone(),
                notifier.clone(),
            );
            Some(watcher.spawn(Duration::from_millis(settings.volumes.poll_interval_ms))?)
        }
        Err(e) => {
            error!("{e}; external disks will not be detected");
            None
        }
    };

    let fetcher = Fetcher::new(
        Arc::new(CommandAcquirer::new(&settings.fetch, &format)),
        ctx,
        library.data_dir.clone(),
        &library.local_name,
        settings.fetch.retry_attempts,
        notifier.clone(),
    );
    let sync = SyncEngine::new(registry.clone(), notifier);

    info!(
        "library at {} ({} files)",
        library.data_dir.display(),
        format
    );
    Ok(Services {
        controller: Controller::new(registry, sync, Arc::new(fetcher)),
        watcher,
    })
}
