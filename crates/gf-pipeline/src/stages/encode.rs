//! Stage 3: convert the intermediate video into the animated GIF.

use async_trait::async_trait;
use gf_av::FFMPEG;

use crate::context::StageContext;
use crate::stage::{Stage, StageCommand};

/// Encodes `<root>/temp.mp4` into `<root>/<base>.gif`.
///
/// The only stage that honors cancellation.
#[derive(Debug, Default, Clone, Copy)]
pub struct EncodeGif;

#[async_trait]
impl Stage for EncodeGif {
    fn name(&self) -> &'static str {
        "encode"
    }

    fn build(&self, ctx: &StageContext) -> gf_core::Result<StageCommand> {
        let ffmpeg = ctx.tools.require(FFMPEG)?;
        let work = ctx.video.require_work_area(self.name())?;

        Ok(StageCommand::new(ffmpeg.path.clone())
            .args(["-y"])
            .opt("-progress", ctx.progress_url.clone())
            .args(["-i".to_string(), work.intermediate.to_string_lossy().to_string()])
            .args(["-vf", "format=rgb8"])
            .args([work.output.to_string_lossy().to_string()]))
    }

    fn cancellable(&self) -> bool {
        true
    }
}
