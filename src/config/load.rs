use std::{env, path::PathBuf};

use super::schema::Settings;
use crate::error::{Error, Result};

const ENV_PREFIX: &str = "TUNESYNC";
const CONFIG_PATH_VAR: &str = "TUNESYNC_CONFIG_PATH";

/// Layering, lowest to highest: struct defaults, the optional config file,
/// `TUNESYNC__SECTION__KEY` environment variables.
impl Settings {
    pub fn load() -> std::result::Result<Self, ::config::ConfigError> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = resolve_config_path() {
            builder = builder.add_source(::config::File::from(path).required(false));
        }
        builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// [`Settings::load`] followed by [`Settings::validate`]. Either failure
    /// is reported as [`Error::Configuration`].
    pub fn load_checked() -> Result<Self> {
        let settings = Self::load()
            .map_err(|e| Error::Configuration(format!("cannot load config: {e}")))?;
        settings
            .validate()
            .map_err(|msg| Error::Configuration(format!("invalid config: {msg}")))?;
        Ok(settings)
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.library.audio_format.trim().trim_start_matches('.').is_empty() {
            return Err("library.audio_format must not be empty".to_string());
        }
        if self.library.local_name.trim().is_empty() {
            return Err("library.local_name must not be empty".to_string());
        }
        if self.volumes.poll_interval_ms == 0 {
            return Err("volumes.poll_interval_ms must be >= 1".to_string());
        }
        if self.fetch.retry_attempts == 0 {
            return Err("fetch.retry_attempts must be >= 1".to_string());
        }
        Ok(())
    }

    /// Extension without a leading dot, lower-cased.
    pub fn audio_format(&self) -> String {
        self.library
            .audio_format
            .trim()
            .trim_start_matches('.')
            .to_ascii_lowercase()
    }
}

/// `TUNESYNC_CONFIG_PATH` if set, else [`default_config_path`].
pub fn resolve_config_path() -> Option<PathBuf> {
    env::var_os(CONFIG_PATH_VAR)
        .map(PathBuf::from)
        .or_else(default_config_path)
}

/// `$XDG_CONFIG_HOME/tunesync/config.toml`, or `~/.config/tunesync/config.toml`
/// when `XDG_CONFIG_HOME` is unset.
pub fn default_config_path() -> Option<PathBuf> {
    env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
        .map(|dir| dir.join("tunesync").join("config.toml"))
}
