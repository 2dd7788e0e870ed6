//! Stage 1: decode the requested slice of the video into numbered PNG frames.

use std::time::Duration;

use async_trait::async_trait;
use gf_av::{WorkArea, FFMPEG};
use gf_core::timecode::format_timecode;

use crate::context::StageContext;
use crate::stage::{Stage, StageCommand};

/// Capture length used whenever the requested one cannot be honored.
pub const DEFAULT_CAPTURE: Duration = Duration::from_secs(3);
/// Captures must be strictly shorter than this.
pub const MAX_CAPTURE: Duration = Duration::from_secs(60);

/// The capture length actually passed to ffmpeg.
///
/// Anything non-positive, not below [`MAX_CAPTURE`] or longer than the
/// video itself falls back to [`DEFAULT_CAPTURE`]. A zero video duration is
/// treated as unknown and does not limit the capture.
pub fn effective_capture(requested: Duration, video_duration: Duration) -> Duration {
    let fits_video = video_duration.is_zero() || requested <= video_duration;
    if !requested.is_zero() && requested < MAX_CAPTURE && fits_video {
        return requested;
    }

    tracing::warn!(
        requested_secs = requested.as_secs_f64(),
        video_secs = video_duration.as_secs(),
        "Capture length is outside of range; forcing to {} secs",
        DEFAULT_CAPTURE.as_secs()
    );
    DEFAULT_CAPTURE
}

/// Zero-padded width of the frame counter for a requested capture length.
///
/// Judged on the length the user asked for, before any clamping.
pub fn digits_for(capture: Duration) -> usize {
    let secs = capture.as_secs_f64();
    if secs > 0.0 && secs < 15.0 {
        3
    } else if (15.0..30.0).contains(&secs) {
        4
    } else {
        5
    }
}

/// `-t` value: whole seconds when exact, otherwise up to millisecond precision.
fn format_seconds(d: Duration) -> String {
    if d.subsec_millis() == 0 {
        return d.as_secs().to_string();
    }
    let s = format!("{:.3}", d.as_secs_f64());
    s.trim_end_matches('0').to_string()
}

/// Writes `<frames_dir>/img-%0Nd.png` at the run's frame rate.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtractFrames;

#[async_trait]
impl Stage for ExtractFrames {
    fn name(&self) -> &'static str {
        "extract"
    }

    fn build(&self, ctx: &StageContext) -> gf_core::Result<StageCommand> {
        let ffmpeg = ctx.tools.require(FFMPEG)?;
        let capture = effective_capture(ctx.run.length, ctx.video.duration);

        let work = ctx.video.work_area_or_init(|source| {
            WorkArea::derive(
                source,
                &ctx.work.temp_root(),
                &ctx.work.namespace,
                &ctx.run_id,
                digits_for(ctx.run.length),
            )
        })?;

        let source = ctx.video.source_path.to_string_lossy().to_string();
        let frames = work.frame_path_pattern().to_string_lossy().to_string();

        Ok(StageCommand::new(ffmpeg.path.clone())
            .args(["-i".to_string(), source, "-an".to_string()])
            .opt("-vf", ctx.run.video_filter())
            .args(["-ss".to_string(), format_timecode(ctx.run.start)])
            .args(["-t".to_string(), format_seconds(capture)])
            .args(["-q:v", "2", "-f", "image2", "-vsync", "cfr"])
            .args(["-r".to_string(), ctx.run.fps.to_string(), "-y".to_string()])
            .opt("-progress", ctx.progress_url.clone())
            .args([frames]))
    }

    async fn prepare(&self, ctx: &StageContext) -> gf_core::Result<()> {
        let work = ctx.video.require_work_area(self.name())?;
        work.ensure_frames_dir()?;
        tracing::debug!(frames_dir = %work.frames_dir.display(), "Created frame directory");
        Ok(())
    }

    fn weight(&self) -> f32 {
        2.0
    }
}
