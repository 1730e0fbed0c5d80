use std::io::{self, BufRead, Write};

use log::{error, info};

use crate::bridge::Response;
use crate::config::NotificationFormat;
use crate::error::Error;

mod commands;
mod settings;
mod startup;

use commands::{HELP, Line, parse_line, render};

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = settings::load_settings();
    startup::init_logging(&settings.log);

    let format = settings.log.notifications;
    let notifier = startup::notifier_for(format);
    let mut services = startup::build(&settings, notifier)?;

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = line?;
        match parse_line(&line) {
            Ok(Line::Empty) => continue,
            Ok(Line::Quit) => break,
            Ok(Line::Help) => writeln!(stdout, "{HELP}")?,
            Ok(Line::Settings) => write!(stdout, "{}", toml::to_string_pretty(&settings)?)?,
            Ok(Line::Command(command)) => match services.controller.handle(command) {
                Ok(response) => print_response(&mut stdout, format, &response)?,
                Err(e @ Error::NotFound(_)) => writeln!(stdout, "{e}")?,
                Err(e) => error!("{e}"),
            },
            Err(msg) => writeln!(stdout, "{msg}")?,
        }
        stdout.flush()?;
    }

    info!("shutting down");
    services.controller.wait_for_fetches();
    if let Some(watcher) = services.watcher.take() {
        watcher.stop();
    }
    Ok(())
}

fn print_response(out: &mut impl Write, format: NotificationFormat, response: &Response) -> io::Result<()> {
    match format {
        NotificationFormat::Log => writeln!(out, "{}", render(response)),
        NotificationFormat::Json => {
            let json = serde_json::to_string(response).map_err(io::Error::other)?;
            writeln!(out, "{json}")
        }
    }
}
