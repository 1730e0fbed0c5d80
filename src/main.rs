mod bridge;
mod cache;
mod config;
mod error;
mod fetch;
mod library;
mod registry;
mod runtime;
mod sync;
mod watcher;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    runtime::run()
}
