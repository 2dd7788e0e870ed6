//! Runs `ffprobe <path>` and reads its stderr banner.
//!
//! No `-print_format`: the banner is what [`parse_diagnostics`] understands,
//! and it is available from every ffprobe build.

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::diagnostics::parse_diagnostics;
use super::types::VideoDescription;
use crate::command::ToolCommand;

/// Probing a local file should never take this long.
const PROBE_TIMEOUT: Duration = Duration::from_secs(60);

/// A prober backed by the `ffprobe` CLI.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    /// Path to the ffprobe binary.
    ffprobe_path: PathBuf,
}

impl FfprobeProber {
    /// Create a new prober using the given ffprobe path.
    pub fn new(ffprobe_path: PathBuf) -> Self {
        Self { ffprobe_path }
    }

    /// Probe `path`, failing with [`gf_core::Error::Probe`] when the output
    /// does not describe a video.
    pub async fn probe(&self, path: &Path) -> gf_core::Result<VideoDescription> {
        let mut cmd = ToolCommand::new(self.ffprobe_path.clone());
        cmd.arg(path.to_string_lossy().as_ref()).timeout(PROBE_TIMEOUT);

        let output = cmd.run_unchecked().await?;
        if !output.status.success() {
            tracing::debug!(
                path = %path.display(),
                status = %output.status,
                "ffprobe exited unsuccessfully; parsing whatever it printed"
            );
        }

        let video = parse_diagnostics(path, &output.stderr)?;
        tracing::debug!(
            path = %path.display(),
            duration_secs = video.duration.as_secs(),
            size = ?video.size,
            fps = ?video.frame_rate,
            "Probed video"
        );
        Ok(video)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_ffprobe_is_a_tool_error() {
        let prober = FfprobeProber::new(PathBuf::from("/nonexistent/ffprobe"));
        let err = prober.probe(Path::new("clip.mp4")).await.unwrap_err();
        assert!(matches!(err, gf_core::Error::Tool { .. }));
    }

    #[tokio::test]
    async fn non_video_output_is_a_probe_error() {
        // `echo` writes to stdout, leaving stderr empty: no Duration line.
        let prober = FfprobeProber::new(PathBuf::from("echo"));
        match prober.probe(Path::new("clip.mp4")).await {
            Err(gf_core::Error::Probe(msg)) => assert!(msg.contains("clip.mp4")),
            Err(gf_core::Error::Tool { .. }) => {} // no echo on this system
            other => panic!("unexpected: {other:?}"),
        }
    }
}
