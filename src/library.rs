//! Tracks and volumes.
//!
//! A [`Volume`] is a flat directory of audio files. Its files are resolved to
//! [`TrackRecord`]s through the metadata cache, falling back to reading tags.

mod model;
mod tags;
mod volume;

pub use model::{TrackRecord, UNKNOWN, normalize_artist, normalize_title};
pub use tags::{LoftyTags, TagFields, TagIo};
pub use volume::{LibraryContext, MaterializeReport, Volume};

#[cfg(test)]
pub(crate) mod testing;
