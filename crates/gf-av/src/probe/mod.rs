//! Source video probing: run ffprobe and parse its diagnostic banner.

pub mod diagnostics;
pub mod ffprobe;
pub mod types;

pub use diagnostics::{
    parse_diagnostics, parse_dimension, parse_duration, parse_frame_rate, Field, ParseError,
};
pub use ffprobe::FfprobeProber;
pub use types::{FrameSize, VideoDescription};
