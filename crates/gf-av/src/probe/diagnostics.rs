//! Parser for the human-readable banner ffprobe prints on stderr.
//!
//! Only two kinds of line carry anything we need:
//!
//! ```text
//!   Duration: 00:08:20.45, start: 0.000000, bitrate: 1205 kb/s
//!     Stream #0:0(und): Video: h264 (High) (avc1 / 0x31637661), yuv420p, 1280x720 [SAR 1:1 DAR 16:9], 1076 kb/s, 29.97 fps, 29.97 tbr, 30k tbn (default)
//! ```
//!
//! The first `Duration:` line and the first line mentioning `Video:` win;
//! everything else is ignored.

use std::fmt;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use super::types::{FrameSize, VideoDescription};

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Duration:\s+(\d{2}):(\d{2}):(\d{2})\.\d+").expect("valid regex")
});

static DIMENSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{3,})x(\d{2,})(?:[,\s]|$)").expect("valid regex")
});

static FPS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?) fps,").expect("valid regex"));

static TBR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?) tbr,").expect("valid regex"));

/// Which property a [`ParseError`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Duration,
    Dimension,
    FrameRate,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Duration => "duration",
            Field::Dimension => "video size",
            Field::FrameRate => "fps",
        })
    }
}

/// Why a single diagnostic line could not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid {0}: empty input")]
    EmptyInput(Field),
    #[error("invalid {0}: no match")]
    NoMatch(Field),
    #[error("invalid {0}: value out of range")]
    OutOfRange(Field),
}

impl From<ParseError> for gf_core::Error {
    fn from(e: ParseError) -> Self {
        gf_core::Error::Probe(e.to_string())
    }
}

fn non_empty(line: &str, field: Field) -> Result<&str, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        Err(ParseError::EmptyInput(field))
    } else {
        Ok(line)
    }
}

/// Read `Duration: HH:MM:SS.ff` into whole seconds; the fraction is dropped.
pub fn parse_duration(line: &str) -> Result<Duration, ParseError> {
    let line = non_empty(line, Field::Duration)?;
    let caps = DURATION_RE
        .captures(line)
        .ok_or(ParseError::NoMatch(Field::Duration))?;

    let field = |i: usize| {
        caps[i]
            .parse::<u64>()
            .map_err(|_| ParseError::OutOfRange(Field::Duration))
    };
    let (h, m, s) = (field(1)?, field(2)?, field(3)?);

    Ok(Duration::from_secs(h * 3600 + m * 60 + s))
}

/// Read the `WIDTHxHEIGHT` token of a stream line.
pub fn parse_dimension(line: &str) -> Result<FrameSize, ParseError> {
    let line = non_empty(line, Field::Dimension)?;
    let caps = DIMENSION_RE
        .captures(line)
        .ok_or(ParseError::NoMatch(Field::Dimension))?;

    let side = |i: usize| {
        caps[i]
            .parse::<u16>()
            .map_err(|_| ParseError::OutOfRange(Field::Dimension))
    };

    Ok(FrameSize {
        width: side(1)?,
        height: side(2)?,
    })
}

/// Read the frame rate of a stream line.
///
/// The `fps` figure is preferred; `tbr` is only consulted when no `fps`
/// figure is present.
pub fn parse_frame_rate(line: &str) -> Result<f32, ParseError> {
    let line = non_empty(line, Field::FrameRate)?;
    let caps = FPS_RE
        .captures(line)
        .or_else(|| TBR_RE.captures(line))
        .ok_or(ParseError::NoMatch(Field::FrameRate))?;

    match caps[1].parse::<f32>() {
        Ok(rate) if rate.is_finite() => Ok(rate),
        _ => Err(ParseError::OutOfRange(Field::FrameRate)),
    }
}

/// Build a [`VideoDescription`] from the complete stderr of `ffprobe <path>`.
///
/// A missing or unreadable duration means the input is not a video and is
/// fatal. Size and frame rate are best effort and left as `None` when they
/// cannot be read.
pub fn parse_diagnostics(source: &Path, text: &str) -> gf_core::Result<VideoDescription> {
    let mut duration = None;
    let mut duration_err = None;
    let mut video_line = None;

    for line in text.lines().map(str::trim) {
        if line.starts_with("Duration:") {
            if duration.is_none() {
                match parse_duration(line) {
                    Ok(d) => duration = Some(d),
                    Err(e) => {
                        tracing::debug!("{e} in {line:?}");
                        if duration_err.is_none() {
                            duration_err = Some(e);
                        }
                    }
                }
            }
        } else if video_line.is_none() && line.contains("Video:") {
            video_line = Some(line);
        }
        if duration.is_some() && video_line.is_some() {
            break;
        }
    }

    // The first parseable Duration line wins; `Duration: N/A` lines are skipped.
    let duration = match (duration, duration_err) {
        (Some(d), _) => d,
        (None, Some(e)) => return Err(e.into()),
        (None, None) => {
            return Err(gf_core::Error::Probe(format!(
                "{} is not a recognizable video file: no Duration line",
                source.display()
            )))
        }
    };

    let mut video = VideoDescription::new(source.to_path_buf(), duration);

    match video_line {
        Some(line) => {
            video.size = parse_dimension(line)
                .inspect_err(|e| tracing::debug!("{e} in {line:?}"))
                .ok();
            video.frame_rate = parse_frame_rate(line)
                .inspect_err(|e| tracing::debug!("{e} in {line:?}"))
                .ok();
        }
        None => tracing::debug!(source = %source.display(), "No video stream line found"),
    }

    Ok(video)
}
