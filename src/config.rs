//! Settings schema and loader.
//!
//! Every section has defaults, so a missing or partial `config.toml` still
//! yields a runnable configuration. See [`Settings`] for the precedence rules.

mod load;
mod schema;

pub use load::resolve_config_path;
pub use schema::*;
