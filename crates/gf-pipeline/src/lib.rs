//! # gf-pipeline
//!
//! Orchestration of the three ffmpeg invocations that turn a video slice
//! into a GIF.
//!
//! This crate provides:
//!
//! - **[`Stage`]** trait -- one external-process step with build / prepare /
//!   run semantics, and the [`StageCommand`] it builds.
//! - **[`StageContext`]** -- shared execution context (probed video, tool
//!   registry, run settings, cancellation, progress).
//! - **Runner** ([`runner`]) -- runs a stage inline or as a background task
//!   whose result lands in an [`OutcomeCell`].
//! - **Built-in stages** ([`stages`]) -- frame extraction, muxing, GIF
//!   encoding.
//! - **[`Pipeline`]** -- runs stages strictly in order and halts at the
//!   first failure.

pub mod context;
pub mod executor;
pub mod outcome;
pub mod runner;
pub mod stage;
pub mod stages;

// Re-export key types at the crate root.
pub use context::{ProgressSender, StageContext};
pub use executor::Pipeline;
pub use outcome::OutcomeCell;
pub use runner::{launch, run_stage, StageHandle};
pub use stage::{Stage, StageCommand, StageReport};
