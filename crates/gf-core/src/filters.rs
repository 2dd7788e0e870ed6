//! ffmpeg `-vf` filter fragments for output scaling and playback speed.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

static SCALE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<width>_|\d+):(?P<height>_|\d+)$").expect("valid regex")
});

/// Requested output dimensions. A missing side is derived from the aspect
/// ratio of the source and rounded down to an even number of pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScaleSpec {
    /// `W:H`, both sides fixed.
    Both { width: u16, height: u16 },
    /// `W:_`, height follows the aspect ratio.
    Width { width: u16 },
    /// `_:H`, width follows the aspect ratio.
    Height { height: u16 },
}

impl ScaleSpec {
    /// Parse a `W:H` argument where either side may be `_`.
    ///
    /// Returns `Ok(None)` for `_:_`, which means "keep the source size".
    pub fn parse(arg: &str) -> Result<Option<Self>> {
        let caps = SCALE_RE
            .captures(arg.trim())
            .ok_or_else(|| Error::Validation(format!("bad scale argument {arg:?}")))?;

        let side = |name: &str| -> Result<Option<u16>> {
            match &caps[name] {
                "_" => Ok(None),
                digits => {
                    let value: u16 = digits.parse().map_err(|_| {
                        Error::Validation(format!("{name} in scale {arg:?} overflows"))
                    })?;
                    if value % 2 != 0 {
                        return Err(Error::Validation(format!("{value} is not even")));
                    }
                    Ok(Some(value))
                }
            }
        };

        Ok(match (side("width")?, side("height")?) {
            (Some(width), Some(height)) => Some(ScaleSpec::Both { width, height }),
            (Some(width), None) => Some(ScaleSpec::Width { width }),
            (None, Some(height)) => Some(ScaleSpec::Height { height }),
            (None, None) => None,
        })
    }

    /// The `scale=` filter expression.
    pub fn filter(&self) -> String {
        match self {
            ScaleSpec::Both { width, height } => format!("scale={width}:{height}"),
            ScaleSpec::Width { width } => format!("scale={width}:trunc(ow/a/2)*2"),
            ScaleSpec::Height { height } => format!("scale=trunc(oh*a/2)*2:{height}"),
        }
    }
}

/// Playback speed of the generated animation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speed {
    VeryFast,
    Faster,
    #[default]
    Placebo,
    Slower,
    VerySlow,
}

impl Speed {
    /// The `setpts=` filter for this speed, `None` when playback is unchanged.
    pub fn filter(&self) -> Option<&'static str> {
        match self {
            Speed::VeryFast => Some("setpts=1/3*PTS"),
            Speed::Faster => Some("setpts=1/2*PTS"),
            Speed::Placebo => None,
            Speed::Slower => Some("setpts=2*PTS"),
            Speed::VerySlow => Some("setpts=3*PTS"),
        }
    }
}

impl FromStr for Speed {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "veryfast" => Ok(Speed::VeryFast),
            "faster" => Ok(Speed::Faster),
            "placebo" => Ok(Speed::Placebo),
            "slower" => Ok(Speed::Slower),
            "veryslow" => Ok(Speed::VerySlow),
            other => Err(Error::Validation(format!("invalid speed argument {other:?}"))),
        }
    }
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Speed::VeryFast => "veryfast",
            Speed::Faster => "faster",
            Speed::Placebo => "placebo",
            Speed::Slower => "slower",
            Speed::VerySlow => "veryslow",
        };
        f.write_str(s)
    }
}

/// Join the scale and speed fragments into one `-vf` value.
///
/// Returns `None` when neither is present so callers can omit `-vf`.
pub fn combine_filters(scale: Option<&str>, speed: Option<&str>) -> Option<String> {
    let parts: Vec<&str> = [scale, speed]
        .into_iter()
        .flatten()
        .filter(|p| !p.is_empty())
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(","))
    }
}
