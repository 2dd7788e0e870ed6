//! # gf-telemetry
//!
//! Receives the progress reports ffmpeg posts while a stage runs and turns
//! them into console ticks.
//!
//! - **[`TelemetryServer`]** -- loopback axum listener that decodes
//!   `-progress` posts and publishes [`ProgressStatus`] values on a channel.
//! - **[`StatusDecoder`]** -- incremental `key=value` block decoder.
//! - **Sink** ([`sink`]) -- drains the channel and renders progress.

pub mod server;
pub mod sink;
pub mod status;

pub use server::{router, TelemetryServer};
pub use sink::{run_sink, SinkSummary};
pub use status::{ProgressStatus, RunState, StatusDecoder};
