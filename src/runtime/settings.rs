use crate::config::Settings;

/// Settings for this run. A config that cannot be loaded or does not validate
/// is reported and replaced by defaults; logging is not up yet, hence stderr.
pub fn load_settings() -> Settings {
    Settings::load_checked().unwrap_or_else(|e| {
        eprintln!("tunesync: {e}; using defaults");
        Settings::default()
    })
}
