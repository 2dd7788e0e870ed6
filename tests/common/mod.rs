//! Shared fixtures for integration tests.
//!
//! [`FakeTools`] writes shell stand-ins for ffmpeg and ffprobe into a temp
//! directory, so the whole conversion path runs without a real ffmpeg. The
//! fake ffmpeg touches its last argument (the output path) and appends it to
//! `calls.log`; the fake ffprobe prints a canned banner on stderr.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use gf_core::Config;
use tempfile::TempDir;

/// Banner of a 20 second 640x360 clip at 25 fps.
pub const BANNER: &str = "\
Input #0, mov,mp4,m4a,3gp,3g2,mj2, from 'clip.mp4':
  Duration: 00:00:20.00, start: 0.000000, bitrate: 1205 kb/s
    Stream #0:0(und): Video: h264 (High) (avc1 / 0x31637661), yuv420p, 640x360, 1072 kb/s, 25 fps, 25 tbr, 12800 tbn (default)
    Stream #0:1(und): Audio: aac (LC) (mp4a / 0x6134706D), 44100 Hz, stereo, fltp, 128 kb/s (default)
";

/// Temp directory holding fake tools, a source clip and the work root.
pub struct FakeTools {
    pub dir: TempDir,
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    pub video: PathBuf,
    pub work_root: PathBuf,
    pub calls: PathBuf,
}

impl FakeTools {
    /// Fake tools whose ffmpeg always succeeds.
    pub fn new() -> Self {
        Self::with_ffmpeg_body(
            r#"for last; do :; done
echo "$last" >> "$CALLS"
touch "$last""#,
        )
    }

    /// Fake tools whose ffmpeg fails after writing an error to stderr.
    pub fn failing() -> Self {
        Self::with_ffmpeg_body(
            r#"for last; do :; done
echo "$last" >> "$CALLS"
echo "Conversion failed!" >&2
exit 1"#,
        )
    }

    fn with_ffmpeg_body(body: &str) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let calls = dir.path().join("calls.log");
        let ffmpeg = dir.path().join("ffmpeg");
        let ffprobe = dir.path().join("ffprobe");

        write_script(
            &ffmpeg,
            &format!(
                "#!/bin/sh\nCALLS='{}'\n{}\n",
                calls.display(),
                body
            ),
        );
        write_script(
            &ffprobe,
            &format!("#!/bin/sh\ncat >&2 <<'EOF'\n{BANNER}EOF\n"),
        );

        let video = dir.path().join("clip.mp4");
        fs::write(&video, b"not really a video").expect("write clip");
        let work_root = dir.path().join("work");

        Self {
            dir,
            ffmpeg,
            ffprobe,
            video,
            work_root,
            calls,
        }
    }

    /// A config pointing at the fake tools and the temp work root.
    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.tools.ffmpeg_path = Some(self.ffmpeg.clone());
        config.tools.ffprobe_path = Some(self.ffprobe.clone());
        config.work.temp_root = Some(self.work_root.clone());
        config.telemetry.port = 0;
        config
    }

    /// Write [`Self::config`] as JSON and return its path.
    pub fn write_config(&self) -> PathBuf {
        let path = self.dir.path().join("gifforge.json");
        let json = serde_json::to_string_pretty(&self.config()).expect("serialize config");
        fs::write(&path, json).expect("write config");
        path
    }

    /// Output paths the fake ffmpeg was invoked with, in order.
    pub fn calls(&self) -> Vec<String> {
        fs::read_to_string(&self.calls)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

fn write_script(path: &Path, contents: &str) {
    fs::write(path, contents).expect("write script");
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).expect("chmod script");
}
