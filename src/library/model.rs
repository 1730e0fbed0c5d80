use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use crate::cache::TrackDescriptor;

/// Artist and title of a track that has no usable metadata.
pub const UNKNOWN: &str = "_UNKNOWN_";

/// A track identified by its normalized artist and title.
///
/// Equality and hashing ignore `source`: the same song stored under two
/// different file names on two volumes is one track.
#[derive(Debug, Clone)]
pub struct TrackRecord {
    artist: String,
    title: String,
    source: PathBuf,
}

impl TrackRecord {
    /// Build a record, normalizing artist and title unless both are [`UNKNOWN`].
    pub fn new(artist: &str, title: &str, source: impl Into<PathBuf>) -> Self {
        let (artist, title) = if artist == UNKNOWN && title == UNKNOWN {
            (UNKNOWN.to_string(), UNKNOWN.to_string())
        } else {
            (normalize_artist(artist), normalize_title(title))
        };
        Self {
            artist,
            title,
            source: source.into(),
        }
    }

    pub fn lost(source: impl Into<PathBuf>) -> Self {
        Self::new(UNKNOWN, UNKNOWN, source)
    }

    pub fn from_descriptor(desc: &TrackDescriptor, source: impl Into<PathBuf>) -> Self {
        Self::new(&desc.artist, &desc.title, source)
    }

    /// Same track, backed by another file.
    pub fn located_at(self, source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            ..self
        }
    }

    pub fn artist(&self) -> &str {
        &self.artist
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// File this record was resolved from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn is_lost(&self) -> bool {
        self.artist == UNKNOWN && self.title == UNKNOWN
    }

    /// "Artist - Title"
    pub fn full_name(&self) -> String {
        format!("{} - {}", self.artist, self.title)
    }

    /// "Artist - Title.format", safe to join onto a volume root.
    ///
    /// Path separators become `_` and leading dots are dropped, so the name
    /// is always a single visible entry of the directory it is joined to.
    pub fn file_name(&self, format: &str) -> String {
        let stem: String = self
            .full_name()
            .chars()
            .map(|c| match c {
                '/' | '\\' | '\0' => '_',
                c => c,
            })
            .collect();
        format!("{}.{}", stem.trim_start_matches('.'), format)
    }

    /// Query handed to the downloader.
    pub fn search_term(&self) -> String {
        format!("{} {}", self.artist, self.title)
    }

    pub fn descriptor(&self) -> TrackDescriptor {
        TrackDescriptor {
            artist: self.artist.clone(),
            title: self.title.clone(),
        }
    }
}

impl PartialEq for TrackRecord {
    fn eq(&self, other: &Self) -> bool {
        self.artist == other.artist && self.title == other.title
    }
}

impl Eq for TrackRecord {}

impl Hash for TrackRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.artist.hash(state);
        self.title.hash(state);
    }
}

/// Lower-case, then upper-case the first letter of every word.
///
/// A word starts after any non-alphabetic character, so "ac/dc" becomes "Ac/Dc".
pub fn normalize_artist(artist: &str) -> String {
    let mut out = String::with_capacity(artist.len());
    let mut at_word_start = true;
    for c in artist.chars() {
        if at_word_start {
            push_capitalized(&mut out, c);
        } else {
            out.extend(c.to_lowercase());
        }
        at_word_start = !c.is_alphabetic();
    }
    out
}

/// Lower-case everything, then upper-case the first character.
pub fn normalize_title(title: &str) -> String {
    let mut chars = title.chars();
    let mut out = String::with_capacity(title.len());
    if let Some(first) = chars.next() {
        push_capitalized(&mut out, first);
    }
    out.extend(chars.flat_map(char::to_lowercase));
    out
}

/// Only the first char of a multi-char uppercase mapping stays upper:
/// 'ß' gives "Ss", not "SS", which keeps normalization idempotent.
fn push_capitalized(out: &mut String, c: char) {
    let mut upper = c.to_uppercase();
    if let Some(first) = upper.next() {
        out.push(first);
    }
    out.extend(upper.flat_map(char::to_lowercase));
}
