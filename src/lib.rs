//! gifforge - turn a slice of a video into an animated GIF
//!
//! This library crate exposes the orchestration layer for integration testing.

pub mod app;
