use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gifforge")]
#[command(author, version, about = "Turn a slice of a video into an animated GIF")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging and print the work area
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert part of a video into an animated GIF
    Convert {
        /// Relative or full path to the video file
        #[arg(long, required = true)]
        video: String,

        /// Instant within the video to start capture (HH:MM:SS)
        #[arg(long, default_value = "00:00:00")]
        from: String,

        /// Capture length, e.g. 3s, 2m35s or 4.5 (seconds)
        #[arg(long, default_value = "3s")]
        length: String,

        /// Frames per second of the animation, 1 to 30
        #[arg(long, default_value_t = 25)]
        fps: u32,

        /// Output size as W:H; use _ for the side that keeps the aspect ratio
        #[arg(long, default_value = "_:_")]
        scale: String,

        /// Playback speed: veryfast, faster, placebo, slower or veryslow
        #[arg(long, default_value = "placebo")]
        speed: String,

        /// Port for the progress listener (defaults to telemetry.port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Where to move the finished GIF (stays in the work area otherwise)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the ffmpeg commands without running them
        #[arg(long)]
        dry_run: bool,
    },

    /// Probe a video file and display what the pipeline would use
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that ffmpeg and ffprobe are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses --config or defaults if not given)
        #[arg(value_name = "CONFIG")]
        file: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
