use crate::bridge::{Command, Response};
use crate::fetch::FetchRequest;

pub const HELP: &str = "\
commands:
  volumes                      list connected volumes
  artists <volume>             list artists on a volume
  tracks <volume> / <artist>   list an artist's tracks on a volume
  fetch <artist> - <title>[; <artist> - <title>...]
  sync                         copy every track to every volume
  settings                     print the effective settings
  help
  quit
lines starting with '{' are read as JSON commands";

#[derive(Debug, PartialEq, Eq)]
pub enum Line {
    Command(Command),
    Settings,
    Help,
    Quit,
    Empty,
}

pub fn parse_line(line: &str) -> Result<Line, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Line::Empty);
    }
    if line.starts_with('{') {
        return serde_json::from_str(line)
            .map(Line::Command)
            .map_err(|e| format!("invalid command: {e}"));
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    match word.to_ascii_lowercase().as_str() {
        "volumes" => Ok(Line::Command(Command::ListVolumes)),
        "artists" => {
            let volume = required(rest, "artists <volume>")?;
            Ok(Line::Command(Command::LoadArtists { volume }))
        }
        "tracks" => {
            let (volume, artist) = rest
                .split_once(" / ")
                .ok_or_else(|| "usage: tracks <volume> / <artist>".to_string())?;
            Ok(Line::Command(Command::LoadTracks {
                volume: required(volume, "tracks <volume> / <artist>")?,
                artist: required(artist, "tracks <volume> / <artist>")?,
            }))
        }
        "fetch" => parse_fetch(rest).map(|requests| Line::Command(Command::Fetch { requests })),
        "sync" => Ok(Line::Command(Command::SyncAll)),
        "settings" => Ok(Line::Settings),
        "help" | "?" => Ok(Line::Help),
        "quit" | "exit" => Ok(Line::Quit),
        other => Err(format!("unknown command '{other}', try 'help'")),
    }
}

fn required(value: &str, usage: &str) -> Result<String, String> {
    let value = value.trim();
    if value.is_empty() {
        Err(format!("usage: {usage}"))
    } else {
        Ok(value.to_string())
    }
}

/// Each `;`-separated entry becomes one request, numbered from 1.
fn parse_fetch(rest: &str) -> Result<Vec<FetchRequest>, String> {
    let mut requests = Vec::new();
    for entry in rest.split(';').map(str::trim).filter(|e| !e.is_empty()) {
        let (artist, title) = entry
            .split_once(" - ")
            .ok_or_else(|| format!("expected '<artist> - <title>', got '{entry}'"))?;
        let id = (requests.len() + 1).to_string();
        requests.push(FetchRequest::new(artist.trim(), title.trim(), &id));
    }
    if requests.is_empty() {
        return Err("usage: fetch <artist> - <title>[; ...]".to_string());
    }
    Ok(requests)
}

/// Plain-text rendering of a response, one item per line.
pub fn render(response: &Response) -> String {
    match response {
        Response::Volumes(items) | Response::Artists(items) | Response::Tracks(items) => {
            if items.is_empty() {
                "(none)".to_string()
            } else {
                items.join("\n")
            }
        }
        Response::FetchStarted(n) => format!("fetching {n} track(s) in the background"),
        Response::Synced(volumes) if volumes.is_empty() => "everything is in sync".to_string(),
        Response::Synced(volumes) => format!("synced {}", volumes.join(", ")),
    }
}
