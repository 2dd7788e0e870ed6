//! The three conversion stages, in execution order.

pub mod encode;
pub mod extract;
pub mod mux;

pub use encode::EncodeGif;
pub use extract::{digits_for, effective_capture, ExtractFrames};
pub use mux::MuxFrames;
