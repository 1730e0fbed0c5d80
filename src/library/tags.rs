use std::path::Path;

use lofty::config::WriteOptions;
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::prelude::Accessor;
use lofty::tag::{ItemKey, Tag};

use crate::error::{Error, Result};

/// Artist and title as read from a file, already trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFields {
    pub artist: String,
    pub title: String,
}

/// Reads and writes the artist/title tags of an audio file.
pub trait TagIo: Send + Sync {
    /// `None` when the file is unreadable or lacks a usable artist or title.
    fn read(&self, path: &Path) -> Option<TagFields>;
    fn write(&self, path: &Path, artist: &str, title: &str) -> Result<()>;
}

/// [`TagIo`] backed by `lofty`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoftyTags;

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl TagIo for LoftyTags {
    fn read(&self, path: &Path) -> Option<TagFields> {
        let tagged = lofty::read_from_path(path).ok()?;
        let tag = tagged.primary_tag().or_else(|| tagged.first_tag())?;

        let artist = non_empty(tag.get_string(ItemKey::TrackArtist))?;
        let title = non_empty(tag.get_string(ItemKey::TrackTitle))?;
        Some(TagFields { artist, title })
    }

    fn write(&self, path: &Path, artist: &str, title: &str) -> Result<()> {
        let tag_error = |message: String| Error::Tag {
            path: path.to_path_buf(),
            message,
        };

        let mut tagged = lofty::read_from_path(path).map_err(|e| tag_error(e.to_string()))?;
        let tag_type = tagged.primary_tag_type();
        if tagged.tag(tag_type).is_none() {
            tagged.insert_tag(Tag::new(tag_type));
        }
        let tag = tagged
            .tag_mut(tag_type)
            .ok_or_else(|| tag_error(format!("no writable {tag_type:?} tag")))?;

        tag.set_artist(artist.to_string());
        tag.set_title(title.to_string());

        tagged
            .save_to_path(path, WriteOptions::default())
            .map_err(|e| tag_error(e.to_string()))
    }
}
