//! Execution context shared by all stages in a pipeline run.

use std::sync::Arc;

use gf_av::{ToolRegistry, VideoDescription};
use gf_core::config::WorkConfig;
use gf_core::RunConfig;
use tokio_util::sync::CancellationToken;

/// Sender for reporting coarse pipeline progress.
///
/// Wraps a callback that receives a progress percentage (0.0 -- 100.0) and
/// the name of the stage that just finished.
pub struct ProgressSender {
    callback: Box<dyn Fn(f32, &str) + Send + Sync>,
}

impl ProgressSender {
    /// Create a new sender from the given callback.
    pub fn new(callback: impl Fn(f32, &str) + Send + Sync + 'static) -> Self {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Create a no-op sender that discards all progress reports.
    pub fn noop() -> Self {
        Self {
            callback: Box::new(|_, _| {}),
        }
    }

    /// Report progress.
    pub fn send(&self, progress: f32, stage: &str) {
        (self.callback)(progress, stage);
    }
}

impl std::fmt::Debug for ProgressSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressSender").finish_non_exhaustive()
    }
}

/// Context handed to every stage.
///
/// Cheap to clone: each stage task gets its own copy.
#[derive(Debug, Clone)]
pub struct StageContext {
    /// Probed properties of the input, including the write-once work area.
    pub video: Arc<VideoDescription>,
    /// Tool registry for looking up the ffmpeg executable.
    pub tools: Arc<ToolRegistry>,
    /// Capture settings for this run.
    pub run: Arc<RunConfig>,
    /// Where the work area is rooted.
    pub work: Arc<WorkConfig>,
    /// Unique component of the work area path.
    pub run_id: String,
    /// Address ffmpeg posts `-progress` reports to, when telemetry is on.
    pub progress_url: Option<String>,
    /// When `true`, stages report their command but spawn nothing.
    pub dry_run: bool,
    /// Checked by cancellable stages right before they spawn.
    pub cancellation: CancellationToken,
    /// Channel for reporting progress to the caller.
    pub progress: Arc<ProgressSender>,
}

impl StageContext {
    /// Create a new context with the minimum required fields.
    ///
    /// `dry_run` is taken from the run configuration.
    pub fn new(
        video: Arc<VideoDescription>,
        tools: Arc<ToolRegistry>,
        run: Arc<RunConfig>,
        run_id: impl Into<String>,
    ) -> Self {
        let dry_run = run.dry_run;
        Self {
            video,
            tools,
            run,
            work: Arc::new(WorkConfig::default()),
            run_id: run_id.into(),
            progress_url: None,
            dry_run,
            cancellation: CancellationToken::new(),
            progress: Arc::new(ProgressSender::noop()),
        }
    }

    /// Builder: set where work areas are rooted.
    pub fn with_work(mut self, work: WorkConfig) -> Self {
        self.work = Arc::new(work);
        self
    }

    /// Builder: set the `-progress` target.
    pub fn with_progress_url(mut self, url: impl Into<String>) -> Self {
        self.progress_url = Some(url.into());
        self
    }

    /// Builder: set dry-run mode.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Builder: attach a cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Builder: attach a progress sender.
    pub fn with_progress(mut self, progress: ProgressSender) -> Self {
        self.progress = Arc::new(progress);
        self
    }
}
