use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/tunesync/config.toml` or `~/.config/tunesync/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `TUNESYNC__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub library: LibrarySettings,
    pub volumes: VolumeSettings,
    pub fetch: FetchSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// Root directory of the local library volume.
    pub data_dir: PathBuf,
    /// Name under which the local library is registered. The watcher never removes it.
    pub local_name: String,
    /// Audio file extension (without dot) that volumes are scanned for and
    /// materialized tracks are named with.
    pub audio_format: String,
    /// JSON file mapping audio file names to their resolved artist/title.
    pub cache_file: PathBuf,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            local_name: "local".to_string(),
            audio_format: "mp3".to_string(),
            cache_file: PathBuf::from(".__cache__.json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VolumeSettings {
    /// Directory whose subdirectories are external disks.
    /// When unset the platform default is used (`/Volumes` on macOS, `/mnt` on Linux).
    pub root: Option<PathBuf>,
    /// Volume names that are never treated as external disks.
    pub ignore: Vec<String>,
    /// Delay between two polls of the volumes root (milliseconds).
    pub poll_interval_ms: u64,
}

impl Default for VolumeSettings {
    fn default() -> Self {
        Self {
            root: None,
            ignore: vec!["Macintosh HD".to_string()],
            poll_interval_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FetchSettings {
    /// Attempts per track before it is reported as failed and skipped.
    pub retry_attempts: u32,
    /// Downloader executable; must accept `yt-dlp` style arguments.
    pub program: String,
    /// Audio quality handed to the downloader's post-processor (kbps).
    pub audio_quality: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            retry_attempts: 3,
            program: "yt-dlp".to_string(),
            audio_quality: "192".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LogSettings {
    /// One of `error`, `warn`, `info`, `debug`, `trace`, `off`.
    pub level: String,
    /// How notifications for the front end are emitted.
    pub notifications: NotificationFormat,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            notifications: NotificationFormat::Log,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationFormat {
    /// Human-readable lines through the logger.
    Log,
    /// One JSON object per line on stdout.
    #[serde(alias = "json-lines", alias = "jsonl")]
    Json,
}
