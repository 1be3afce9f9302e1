//! The `settings` module is a simple utility that requires manual verification.
//! Secrets (signing key, database password) come from the settings file or
//! the `TRADEPOST__*` environment overlay; there are no in-code defaults.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
