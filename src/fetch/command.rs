use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Command, Stdio};

use log::debug;

use crate::config::FetchSettings;
use crate::error::{Error, Result};
use crate::library::TrackRecord;

use super::Acquirer;

/// Runs a `yt-dlp` compatible downloader for the track's search term.
pub struct CommandAcquirer {
    program: String,
    audio_format: String,
    audio_quality: String,
}

impl CommandAcquirer {
    pub fn new(settings: &FetchSettings, audio_format: &str) -> Self {
        Self {
            program: settings.program.clone(),
            audio_format: audio_format.to_string(),
            audio_quality: settings.audio_quality.clone(),
        }
    }

    fn args(&self, track: &TrackRecord, destination: &Path) -> Vec<String> {
        // The downloader picks the extension itself, so hand it the stem.
        let stem = destination.with_extension("");
        vec![
            "--newline".to_string(),
            "--no-playlist".to_string(),
            "--format".to_string(),
            "bestaudio/best".to_string(),
            "--extract-audio".to_string(),
            "--audio-format".to_string(),
            self.audio_format.clone(),
            "--audio-quality".to_string(),
            format!("{}K", self.audio_quality),
            "--output".to_string(),
            format!("{}.%(ext)s", stem.display()),
            format!("ytsearch:{}", track.search_term()),
        ]
    }
}

/// Pull the percentage out of a `[download]  42.0% of 3.2MiB ...` line.
pub(crate) fn parse_progress(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix("[download]")?;
    rest.split_whitespace()
        .next()
        .filter(|token| token.ends_with('%'))
}

impl Acquirer for CommandAcquirer {
    fn acquire(
        &self,
        track: &TrackRecord,
        destination: &Path,
        progress: &dyn Fn(&str),
    ) -> Result<()> {
        let mut child = Command::new(&self.program)
            .args(self.args(track, destination))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::Fetch(format!("cannot start {}: {e}", self.program)))?;

        if let Some(stdout) = child.stdout.take() {
            for line in BufReader::new(stdout).lines().map_while(|l| l.ok()) {
                debug!("{}: {line}", self.program);
                if let Some(percent) = parse_progress(&line) {
                    progress(percent);
                }
            }
        }

        let status = child.wait()?;
        if !status.success() {
            return Err(Error::Fetch(format!("{} exited with {status}", self.program)));
        }
        if !destination.exists() {
            return Err(Error::Fetch(format!(
                "{} produced no {}",
                self.program,
                destination.display()
            )));
        }
        progress("100%");
        Ok(())
    }
}
