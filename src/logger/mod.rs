//! The `logger` module is a simple utility that requires manual verification.
//! See `bin/token_demo.rs` for a binary exercising it alongside the codec.

mod logger;
pub use logger::*;

pub use tracing::{debug, error, info, trace, warn};
