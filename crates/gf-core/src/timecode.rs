//! Time-code helpers: `HH:MM:SS` start instants and human capture lengths.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use crate::{Error, Result};

static TIMECODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{2}):(\d{2}):(\d{2})$").expect("valid regex"));

/// One length component, e.g. `2m` or `1.5s`.
static LENGTH_PART_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)(ms|h|m|s)").expect("valid regex"));

/// Parse an `HH:MM:SS` instant into an offset from the start of the video.
///
/// All three fields must be two digits; hours are limited to `00..=23`
/// and minutes/seconds to `00..=59`.
pub fn parse_timecode(arg: &str) -> Result<Duration> {
    let caps = TIMECODE_RE
        .captures(arg.trim())
        .ok_or_else(|| Error::Validation(format!("{arg:?} not in format HH:MM:SS")))?;

    // The regex guarantees two ASCII digits per group.
    let field = |i: usize| caps[i].parse::<u64>().unwrap_or_default();
    let (h, m, s) = (field(1), field(2), field(3));

    if h > 23 || m > 59 || s > 59 {
        return Err(Error::Validation(format!("{arg:?} is not a valid time of day")));
    }

    Ok(Duration::from_secs(h * 3600 + m * 60 + s))
}

/// Render a duration as `HH:MM:SS`, dropping any fractional second.
pub fn format_timecode(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

/// Parse a capture length such as `3s`, `2m35s`, `1.5s`, `750ms` or a bare
/// number of seconds (`4.5`).
pub fn parse_length(arg: &str) -> Result<Duration> {
    let arg = arg.trim();
    let invalid = || Error::Validation(format!("invalid length {arg:?}"));

    if arg.is_empty() {
        return Err(invalid());
    }

    if let Ok(secs) = arg.parse::<f64>() {
        return Duration::try_from_secs_f64(secs).map_err(|_| invalid());
    }

    let mut total = 0.0_f64;
    let mut consumed = 0;
    for caps in LENGTH_PART_RE.captures_iter(arg) {
        let whole = caps.get(0).ok_or_else(invalid)?;
        if whole.start() != consumed {
            return Err(invalid());
        }
        consumed = whole.end();

        let value: f64 = caps[1].parse().map_err(|_| invalid())?;
        total += match &caps[2] {
            "h" => value * 3600.0,
            "m" => value * 60.0,
            "s" => value,
            _ => value / 1000.0,
        };
    }

    if consumed != arg.len() {
        return Err(invalid());
    }

    Duration::try_from_secs_f64(total).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_timecode() {
        assert_eq!(parse_timecode("00:00:00").unwrap(), Duration::ZERO);
        assert_eq!(parse_timecode("01:02:03").unwrap(), Duration::from_secs(3723));
    }

    #[test]
    fn rejects_bad_timecodes() {
        assert!(parse_timecode("1:02:03").is_err());
        assert!(parse_timecode("00:60:00").is_err());
        assert!(parse_timecode("00:00:75").is_err());
        assert!(parse_timecode("24:00:00").is_err());
        assert!(parse_timecode("").is_err());
    }

    #[test]
    fn formats_timecode() {
        assert_eq!(format_timecode(Duration::from_secs(0)), "00:00:00");
        assert_eq!(format_timecode(Duration::from_millis(3_723_900)), "01:02:03");
    }

    #[test]
    fn parses_lengths() {
        assert_eq!(parse_length("3s").unwrap(), Duration::from_secs(3));
        assert_eq!(parse_length("2m35s").unwrap(), Duration::from_secs(155));
        assert_eq!(parse_length("1.5s").unwrap(), Duration::from_millis(1500));
        assert_eq!(parse_length("750ms").unwrap(), Duration::from_millis(750));
        assert_eq!(parse_length("4.5").unwrap(), Duration::from_millis(4500));
        assert_eq!(parse_length("1h").unwrap(), Duration::from_secs(3600));
    }

    #[test]
    fn rejects_bad_lengths() {
        assert!(parse_length("").is_err());
        assert!(parse_length("3x").is_err());
        assert!(parse_length("s3").is_err());
        assert!(parse_length("3s junk").is_err());
        assert!(parse_length("-3").is_err());
    }
}
