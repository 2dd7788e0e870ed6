//! Conversion orchestration: validate arguments, probe the source, run the
//! progress listener alongside the pipeline, then clean up.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use gf_av::{FfprobeProber, ToolRegistry, VideoDescription, WorkArea, FFPROBE};
use gf_core::config::TelemetryConfig;
use gf_core::timecode::{format_timecode, parse_length, parse_timecode};
use gf_core::{Config, Error, Result, RunConfig, ScaleSpec, Speed};
use gf_pipeline::{Pipeline, StageContext, StageReport};
use gf_telemetry::{run_sink, SinkSummary, TelemetryServer};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Capture options as they arrive from the command line.
#[derive(Debug, Clone)]
pub struct CaptureArgs {
    pub from: String,
    pub length: String,
    pub fps: u32,
    pub scale: String,
    pub speed: String,
    pub port: u16,
    pub dry_run: bool,
    pub verbose: bool,
}

impl CaptureArgs {
    /// Parse and validate into a [`RunConfig`].
    pub fn into_run_config(self) -> Result<RunConfig> {
        let run = RunConfig {
            start: parse_timecode(&self.from)?,
            length: parse_length(&self.length)?,
            fps: self.fps,
            scale: ScaleSpec::parse(&self.scale)?,
            speed: self.speed.parse::<Speed>()?,
            port: self.port,
            dry_run: self.dry_run,
            verbose: self.verbose,
        };
        run.validate()?;
        Ok(run)
    }
}

/// What a finished conversion produced.
#[derive(Debug)]
pub struct ConvertOutcome {
    pub video: Arc<VideoDescription>,
    pub reports: Vec<StageReport>,
    pub work_area: Option<WorkArea>,
    /// Final location of the GIF; `None` in dry-run mode.
    pub gif: Option<PathBuf>,
    /// Progress the listener received; `None` when it did not run.
    pub progress: Option<SinkSummary>,
}

/// Expand `~`, then require an existing regular file.
pub fn sanitize_input(raw: &str) -> Result<PathBuf> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::Validation("no video file given".into()));
    }

    let path = PathBuf::from(shellexpand::tilde(raw).as_ref());
    let meta = std::fs::metadata(&path)
        .map_err(|e| Error::Validation(format!("{}: {e}", path.display())))?;
    if !meta.is_file() {
        return Err(Error::Validation(format!(
            "{} is not a regular file",
            path.display()
        )));
    }
    Ok(path)
}

/// Run ffprobe on `path` through the registry's ffprobe.
pub async fn probe_video(tools: &ToolRegistry, path: &Path) -> Result<VideoDescription> {
    let ffprobe = tools.require(FFPROBE)?;
    FfprobeProber::new(ffprobe.path.clone()).probe(path).await
}

/// Progress listener plus the sink draining it.
struct Telemetry {
    url: String,
    shutdown: CancellationToken,
    server: JoinHandle<Result<()>>,
    sink: JoinHandle<SinkSummary>,
}

impl Telemetry {
    async fn start(config: &TelemetryConfig, port: u16) -> Result<Self> {
        let server = TelemetryServer::bind(config, port).await?;
        let url = server.url();
        let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
        let shutdown = CancellationToken::new();

        tracing::debug!("Progress reports go to {url}");
        Ok(Self {
            url,
            server: tokio::spawn(server.serve(tx, shutdown.clone())),
            sink: tokio::spawn(run_sink(rx, std::io::stdout())),
            shutdown,
        })
    }

    /// Stop listening; the sink ends once the listener drops its sender.
    async fn stop(self) -> Option<SinkSummary> {
        self.shutdown.cancel();
        match self.server.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!("Progress listener failed: {e}"),
            Err(e) => tracing::warn!("Progress listener task failed: {e}"),
        }
        self.sink.await.ok()
    }
}

fn print_work_area(work: &WorkArea) {
    println!("  Workdir: {:?}", work.root.display().to_string());
    println!("   Frames: {:?}", work.frame_pattern);
    println!("      gif: {:?}", work.output_name);
}

/// Convert `video_path` into a GIF.
///
/// The work area is removed on failure; on success only the frames go and
/// the GIF is moved to `output` when one is given.
pub async fn convert(
    config: &Config,
    video_path: &Path,
    run: RunConfig,
    output: Option<&Path>,
    cancel: CancellationToken,
) -> Result<ConvertOutcome> {
    run.validate()?;

    let tools = ToolRegistry::discover(&config.tools);
    tools.require_all()?;

    let video = probe_video(&tools, video_path).await?;
    if !video.duration.is_zero() && run.start >= video.duration {
        return Err(Error::Validation(format!(
            "start {} is beyond the end of the video ({})",
            format_timecode(run.start),
            format_timecode(video.duration)
        )));
    }
    tracing::info!(
        video = %video_path.display(),
        duration = %format_timecode(video.duration),
        size = ?video.size,
        fps = ?video.frame_rate,
        "Probed source"
    );
    let video = Arc::new(video);

    let telemetry = if config.telemetry.enabled && !run.dry_run {
        Some(Telemetry::start(&config.telemetry, run.port).await?)
    } else {
        None
    };
    let progress_url = match &telemetry {
        Some(t) => Some(t.url.clone()),
        // An ephemeral port is only known once bound, so a preview omits it.
        None if config.telemetry.enabled && run.port != 0 => {
            Some(format!("http://{}:{}", config.telemetry.host, run.port))
        }
        None => None,
    };

    let run_id = chrono::Utc::now().timestamp_millis().to_string();
    let dry_run = run.dry_run;
    let verbose = run.verbose;

    let mut ctx = StageContext::new(Arc::clone(&video), Arc::new(tools), Arc::new(run), run_id)
        .with_work(config.work.clone())
        .with_cancellation(cancel.clone());
    if let Some(url) = progress_url {
        ctx = ctx.with_progress_url(url);
    }

    let result = Pipeline::standard().execute(&ctx).await;

    let progress = match telemetry {
        Some(t) => t.stop().await,
        None => None,
    };

    let work_area = video.work_area().cloned();
    if verbose {
        if let Some(work) = &work_area {
            print_work_area(work);
        }
    }

    let reports = match result {
        Ok(reports) => reports,
        Err(e) => {
            if let (false, Some(work)) = (dry_run, &work_area) {
                work.cleanup(false, config.work.keep_frames);
            }
            if cancel.is_cancelled() && !e.is_cancelled() {
                return Err(Error::Cancelled(format!("interrupted: {e}")));
            }
            return Err(e);
        }
    };

    let gif = match (&work_area, dry_run) {
        (Some(work), false) => {
            work.cleanup(true, config.work.keep_frames);
            Some(match output {
                Some(dest) => work.finalize(dest)?,
                None => work.output.clone(),
            })
        }
        _ => None,
    };

    Ok(ConvertOutcome {
        video,
        reports,
        work_area,
        gif,
        progress,
    })
}
