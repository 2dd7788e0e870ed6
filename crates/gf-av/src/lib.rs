//! # gf-av
//!
//! External tool management and source probing for the gifforge pipeline.
//!
//! This crate provides:
//!
//! - **Tool discovery** ([`ToolRegistry`]) -- find and cache paths to ffmpeg
//!   and ffprobe.
//! - **Command execution** ([`ToolCommand`]) -- async builder for running
//!   external processes.
//! - **Work areas** ([`WorkArea`]) -- per-run directory layout, cleanup and
//!   finalization.
//! - **Probing** ([`probe`]) -- [`FfprobeProber`] and the diagnostics parser
//!   that turns ffprobe's banner into a [`VideoDescription`].

pub mod command;
pub mod probe;
pub mod tools;
pub mod workspace;

// ---- Re-exports for convenience ----

pub use command::{ToolCommand, ToolOutput};
pub use probe::{FfprobeProber, FrameSize, VideoDescription};
pub use tools::{ToolConfig, ToolInfo, ToolRegistry, FFMPEG, FFPROBE};
pub use workspace::WorkArea;
