//! gf-core: shared errors, configuration and ffmpeg filter helpers.
//!
//! This crate is the foundational dependency for all other gf-* crates,
//! providing the unified error type, the JSON application configuration,
//! per-run capture settings and the time-code and filter parsers those
//! settings are built from.

pub mod config;
pub mod error;
pub mod filters;
pub mod timecode;

// Re-export the most commonly used items at the crate root.
pub use config::{Config, RunConfig};
pub use error::{Error, Result};
pub use filters::{ScaleSpec, Speed};
