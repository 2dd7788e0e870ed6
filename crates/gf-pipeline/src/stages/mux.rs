//! Stage 2: mux the extracted frames into an H.264 intermediate.

use async_trait::async_trait;
use gf_av::FFMPEG;

use crate::context::StageContext;
use crate::stage::{Stage, StageCommand};

/// Encodes `<frames_dir>/img-%0Nd.png` into `<root>/temp.mp4`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MuxFrames;

#[async_trait]
impl Stage for MuxFrames {
    fn name(&self) -> &'static str {
        "mux"
    }

    fn build(&self, ctx: &StageContext) -> gf_core::Result<StageCommand> {
        let ffmpeg = ctx.tools.require(FFMPEG)?;
        let work = ctx.video.require_work_area(self.name())?;

        Ok(StageCommand::new(ffmpeg.path.clone())
            .args(["-f", "image2", "-y"])
            .opt("-progress", ctx.progress_url.clone())
            .args([
                "-i".to_string(),
                work.frame_path_pattern().to_string_lossy().to_string(),
            ])
            .args(["-c:v", "libx264", "-crf", "23"])
            .args(["-vf".to_string(), format!("fps={},format=yuv420p", ctx.run.fps)])
            .args(["-preset", "veryslow"])
            .args([work.intermediate.to_string_lossy().to_string()]))
    }
}
