//! Error taxonomy shared by every subsystem.
//!
//! Unreadable tags are not an error: such a file resolves to the lost-track
//! sentinel.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The host gives us no way to find the external-volumes root.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A command referenced a volume that is not registered.
    #[error("Volume not found: {0}")]
    NotFound(String),

    /// Copying a track into a volume failed.
    #[error("Failed to copy '{track}' to {}: {source}", destination.display())]
    Copy {
        track: String,
        destination: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cache error: {0}")]
    CacheIo(String),

    #[error("Tag error for {}: {message}", path.display())]
    Tag { path: PathBuf, message: String },

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
