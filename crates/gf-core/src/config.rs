//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries the
//! tool, telemetry and work-area sections. Every section defaults sensibly
//! so a completely empty `{}` file is valid.
//!
//! [`RunConfig`] holds the per-invocation capture settings assembled from
//! command-line arguments.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;
use crate::filters::{combine_filters, ScaleSpec, Speed};
use crate::Error;

/// Lowest telemetry port accepted from the command line.
pub const MIN_PORT: u16 = 1024;

/// Frame rate bounds for the extracted frames and the final animation.
pub const FPS_RANGE: std::ops::RangeInclusive<u32> = 1..=30;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tools: ToolsConfig,
    pub telemetry: TelemetryConfig,
    pub work: WorkConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Load configuration strictly: a missing or malformed file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.telemetry.port == 0 {
            warnings.push("telemetry.port is 0; a random port will be assigned".into());
        } else if self.telemetry.port < MIN_PORT {
            warnings.push(format!(
                "telemetry.port {} is below {MIN_PORT} and will be rejected",
                self.telemetry.port
            ));
        }

        if self.telemetry.agent_prefix.is_empty() {
            warnings.push("telemetry.agent_prefix is empty; any client will be accepted".into());
        }

        if self.telemetry.channel_capacity == 0 {
            warnings.push("telemetry.channel_capacity is 0; 1 will be used".into());
        }

        for (name, path) in [
            ("ffmpeg_path", &self.tools.ffmpeg_path),
            ("ffprobe_path", &self.tools.ffprobe_path),
        ] {
            if let Some(p) = path {
                if !p.exists() {
                    warnings.push(format!(
                        "tools.{name} {} does not exist; falling back to PATH",
                        p.display()
                    ));
                }
            }
        }

        if self.work.namespace.trim().is_empty() {
            warnings.push("work.namespace is empty; work areas go straight under temp_root".into());
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Paths to external CLI tools.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
}

/// Progress listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    /// Required prefix of the `User-Agent` header on progress posts.
    pub agent_prefix: String,
    pub channel_capacity: usize,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".into(),
            port: 8080,
            agent_prefix: "Lavf".into(),
            channel_capacity: 16,
        }
    }
}

/// Where per-run work areas live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkConfig {
    /// Parent of all work areas; the system temp dir when unset.
    pub temp_root: Option<PathBuf>,
    pub namespace: String,
    /// Keep the extracted frames after a successful run.
    pub keep_frames: bool,
}

impl Default for WorkConfig {
    fn default() -> Self {
        Self {
            temp_root: None,
            namespace: "gifforge".into(),
            keep_frames: false,
        }
    }
}

impl WorkConfig {
    /// The resolved parent directory for work areas.
    pub fn temp_root(&self) -> PathBuf {
        self.temp_root.clone().unwrap_or_else(std::env::temp_dir)
    }
}

// ---------------------------------------------------------------------------
// Per-run settings
// ---------------------------------------------------------------------------

/// Capture settings for a single conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Offset into the video where capture begins.
    pub start: Duration,
    /// Requested capture length before clamping.
    pub length: Duration,
    pub fps: u32,
    pub scale: Option<ScaleSpec>,
    pub speed: Speed,
    /// Telemetry listener port; `0` picks an ephemeral port.
    pub port: u16,
    /// Print the commands instead of running them.
    pub dry_run: bool,
    pub verbose: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            start: Duration::ZERO,
            length: Duration::from_secs(3),
            fps: 25,
            scale: None,
            speed: Speed::Placebo,
            port: 8080,
            dry_run: false,
            verbose: false,
        }
    }
}

impl RunConfig {
    /// Reject settings that no stage could honor.
    pub fn validate(&self) -> Result<()> {
        if !FPS_RANGE.contains(&self.fps) {
            return Err(Error::Validation(format!(
                "frame rate {} not in range [{}, {}]",
                self.fps,
                FPS_RANGE.start(),
                FPS_RANGE.end()
            )));
        }

        if self.port != 0 && self.port < MIN_PORT {
            return Err(Error::Validation(format!(
                "port {} not in the range [{MIN_PORT}, 65535]",
                self.port
            )));
        }

        Ok(())
    }

    /// The combined `-vf` value for frame extraction, if any.
    pub fn video_filter(&self) -> Option<String> {
        let scale = self.scale.map(|s| s.filter());
        combine_filters(scale.as_deref(), self.speed.filter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = Config::default();
        assert!(cfg.telemetry.enabled);
        assert_eq!(cfg.telemetry.host, "127.0.0.1");
        assert_eq!(cfg.telemetry.port, 8080);
        assert_eq!(cfg.telemetry.agent_prefix, "Lavf");
        assert_eq!(cfg.work.namespace, "gifforge");
        assert!(!cfg.work.keep_frames);
    }

    #[test]
    fn default_config_no_warnings() {
        let cfg = Config::default();
        let warnings = cfg.validate();
        assert!(warnings.is_empty(), "unexpected warnings: {:?}", warnings);
    }

    #[test]
    fn privileged_port_warns() {
        let mut cfg = Config::default();
        cfg.telemetry.port = 80;
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.contains("telemetry.port")));
    }

    #[test]
    fn missing_tool_override_warns() {
        let mut cfg = Config::default();
        cfg.tools.ffmpeg_path = Some(PathBuf::from("/nonexistent/ffmpeg"));
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.contains("ffmpeg_path")));
    }

    #[test]
    fn parse_json_config() {
        let json = r#"{"telemetry": {"port": 9090}, "work": {"keep_frames": true}}"#;
        let cfg = Config::from_json(json).unwrap();
        assert_eq!(cfg.telemetry.port, 9090);
        assert_eq!(cfg.telemetry.agent_prefix, "Lavf");
        assert!(cfg.work.keep_frames);
    }

    #[test]
    fn parse_empty_json_uses_defaults() {
        let cfg = Config::from_json("{}").unwrap();
        assert_eq!(cfg.telemetry.port, 8080);
        assert_eq!(cfg.work.namespace, "gifforge");
    }

    #[test]
    fn load_or_default_with_none() {
        let cfg = Config::load_or_default(None);
        assert_eq!(cfg.telemetry.port, 8080);
    }

    #[test]
    fn load_or_default_with_missing_file() {
        let cfg = Config::load_or_default(Some(Path::new("/nonexistent/config.json")));
        assert_eq!(cfg.telemetry.port, 8080);
    }

    #[test]
    fn load_strict_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gifforge.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(Config::load(&path), Err(Error::Validation(_))));
    }

    #[test]
    fn run_config_fps_bounds() {
        let mut run = RunConfig::default();
        assert!(run.validate().is_ok());
        run.fps = 0;
        assert!(run.validate().is_err());
        run.fps = 31;
        assert!(run.validate().is_err());
        run.fps = 30;
        assert!(run.validate().is_ok());
    }

    #[test]
    fn run_config_port_bounds() {
        let mut run = RunConfig::default();
        run.port = 1023;
        assert!(run.validate().is_err());
        run.port = 0;
        assert!(run.validate().is_ok());
        run.port = 65535;
        assert!(run.validate().is_ok());
    }

    #[test]
    fn run_config_video_filter() {
        let mut run = RunConfig::default();
        assert_eq!(run.video_filter(), None);
        run.scale = Some(ScaleSpec::Width { width: 320 });
        run.speed = Speed::Slower;
        assert_eq!(
            run.video_filter().as_deref(),
            Some("scale=320:trunc(ow/a/2)*2,setpts=2*PTS")
        );
    }
}
