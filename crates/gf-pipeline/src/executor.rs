//! Pipeline executor: runs [`Stage`]s strictly one after another, each as
//! its own task, and stops at the first failure.

use std::sync::Arc;

use crate::context::StageContext;
use crate::runner::launch;
use crate::stage::{Stage, StageReport};
use crate::stages::{EncodeGif, ExtractFrames, MuxFrames};

/// An ordered list of stages.
pub struct Pipeline {
    stages: Vec<Arc<dyn Stage>>,
}

impl Pipeline {
    /// Create a pipeline from a list of stages.
    pub fn new(stages: Vec<Arc<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// Frame extraction, then muxing, then GIF encoding.
    pub fn standard() -> Self {
        Self::new(vec![
            Arc::new(ExtractFrames),
            Arc::new(MuxFrames),
            Arc::new(EncodeGif),
        ])
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    fn total_weight(&self) -> f32 {
        self.stages.iter().map(|s| s.weight()).sum()
    }

    /// Execute the pipeline, returning one report per stage.
    ///
    /// A stage is launched only after its predecessor reported success.
    ///
    /// # Errors
    ///
    /// The first stage failure, wrapped in [`gf_core::Error::Stage`]. Later
    /// stages are never launched.
    pub async fn execute(&self, ctx: &StageContext) -> gf_core::Result<Vec<StageReport>> {
        if self.stages.is_empty() {
            return Err(gf_core::Error::pipeline("executor", "no stages to execute"));
        }

        let total_weight = self.total_weight();
        let mut completed_weight: f32 = 0.0;
        let mut reports = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            tracing::info!("Starting: {}", stage.name());

            let handle = launch(Arc::clone(stage), ctx.clone());
            match handle.wait().await {
                Ok(report) => {
                    completed_weight += stage.weight();
                    let pct = if total_weight > 0.0 {
                        (completed_weight / total_weight) * 100.0
                    } else {
                        100.0
                    };
                    ctx.progress.send(pct, stage.name());
                    tracing::info!("[{:.0}%] Completed: {}", pct, stage.name());
                    reports.push(report);
                }
                Err(e) => {
                    if e.is_cancelled() {
                        tracing::warn!("Stage {} cancelled", stage.name());
                    } else {
                        tracing::error!("Stage {} failed: {e}", stage.name());
                    }
                    return Err(gf_core::Error::stage(stage.name(), e));
                }
            }
        }

        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ProgressSender;
    use crate::stage::StageCommand;
    use async_trait::async_trait;
    use gf_av::{ToolRegistry, VideoDescription, FFMPEG};
    use gf_core::RunConfig;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    // -- Helpers --------------------------------------------------------------

    fn make_ctx() -> StageContext {
        let video = VideoDescription::new(PathBuf::from("/videos/crimea.mp4"), Duration::from_secs(500));
        let tools = ToolRegistry::default().with_tool(FFMPEG, "/opt/bin/ffmpeg");
        StageContext::new(
            Arc::new(video),
            Arc::new(tools),
            Arc::new(RunConfig::default()),
            "1234567",
        )
    }

    fn command() -> StageCommand {
        StageCommand::new(PathBuf::from("/opt/bin/ffmpeg"))
    }

    // -- Fake stages ----------------------------------------------------------

    struct FakeOk {
        name: &'static str,
        executed: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Stage for FakeOk {
        fn name(&self) -> &'static str {
            self.name
        }
        fn build(&self, _ctx: &StageContext) -> gf_core::Result<StageCommand> {
            Ok(command())
        }
        async fn run(&self, _ctx: &StageContext) -> gf_core::Result<StageReport> {
            self.executed.fetch_add(1, Ordering::SeqCst);
            Ok(StageReport {
                stage: self.name,
                command: command(),
                executed: true,
            })
        }
    }

    struct FakeFail {
        name: &'static str,
        executed: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Stage for FakeFail {
        fn name(&self) -> &'static str {
            self.name
        }
        fn build(&self, _ctx: &StageContext) -> gf_core::Result<StageCommand> {
            Ok(command())
        }
        async fn run(&self, _ctx: &StageContext) -> gf_core::Result<StageReport> {
            self.executed.fetch_add(1, Ordering::SeqCst);
            Err(gf_core::Error::tool("ffmpeg", "intentional failure"))
        }
    }

    struct FakePanic;

    #[async_trait]
    impl Stage for FakePanic {
        fn name(&self) -> &'static str {
            "panics"
        }
        fn build(&self, _ctx: &StageContext) -> gf_core::Result<StageCommand> {
            Ok(command())
        }
        async fn run(&self, _ctx: &StageContext) -> gf_core::Result<StageReport> {
            panic!("stage blew up");
        }
    }

    fn ok(name: &'static str, counter: &Arc<AtomicUsize>) -> Arc<dyn Stage> {
        Arc::new(FakeOk {
            name,
            executed: counter.clone(),
        })
    }

    // -- Tests ----------------------------------------------------------------

    #[tokio::test]
    async fn empty_pipeline_errors() {
        let result = Pipeline::new(vec![]).execute(&make_ctx()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn stages_run_in_order() {
        let counter = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new(vec![
            ok("first", &counter),
            ok("second", &counter),
            ok("third", &counter),
        ]);

        let reports = pipeline.execute(&make_ctx()).await.unwrap();
        let names: Vec<_> = reports.iter().map(|r| r.stage).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn failure_halts_later_stages() {
        let first = Arc::new(AtomicUsize::new(0));
        let later = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new(vec![
            Arc::new(FakeFail {
                name: "extract",
                executed: first.clone(),
            }),
            ok("mux", &later),
            ok("encode", &later),
        ]);

        let err = pipeline.execute(&make_ctx()).await.unwrap_err();
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(later.load(Ordering::SeqCst), 0);
        match err {
            gf_core::Error::Stage { stage, source } => {
                assert_eq!(stage, "extract");
                assert!(matches!(*source, gf_core::Error::Tool { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn middle_failure_skips_only_the_rest() {
        let before = Arc::new(AtomicUsize::new(0));
        let after = Arc::new(AtomicUsize::new(0));
        let failing = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new(vec![
            ok("extract", &before),
            Arc::new(FakeFail {
                name: "mux",
                executed: failing.clone(),
            }),
            ok("encode", &after),
        ]);

        let err = pipeline.execute(&make_ctx()).await.unwrap_err();
        assert!(err.to_string().contains("[mux]"));
        assert_eq!(before.load(Ordering::SeqCst), 1);
        assert_eq!(failing.load(Ordering::SeqCst), 1);
        assert_eq!(after.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn panicking_stage_becomes_an_error() {
        let counter = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new(vec![Arc::new(FakePanic), ok("after", &counter)]);

        let err = pipeline.execute(&make_ctx()).await.unwrap_err();
        assert!(err.to_string().contains("panicked"), "got: {err}");
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn progress_reporting() {
        let reports = Arc::new(std::sync::Mutex::new(Vec::new()));
        let reports_clone = reports.clone();
        let progress = ProgressSender::new(move |pct, stage| {
            reports_clone.lock().unwrap().push((pct, stage.to_string()));
        });

        let counter = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new(vec![ok("a", &counter), ok("b", &counter)]);
        pipeline
            .execute(&make_ctx().with_progress(progress))
            .await
            .unwrap();

        let rpts = reports.lock().unwrap();
        assert_eq!(rpts.len(), 2);
        assert_eq!(rpts[0], (50.0, "a".to_string()));
        assert_eq!(rpts[1], (100.0, "b".to_string()));
    }

    #[tokio::test]
    async fn standard_dry_run_builds_all_commands() {
        let tmp = tempfile::tempdir().unwrap();
        let mut work = gf_core::config::WorkConfig::default();
        work.temp_root = Some(tmp.path().to_path_buf());
        let ctx = make_ctx()
            .with_work(work)
            .with_dry_run(true)
            .with_progress_url("http://127.0.0.1:8080");

        let pipeline = Pipeline::standard();
        assert_eq!(pipeline.stage_names(), vec!["extract", "mux", "encode"]);

        let reports = pipeline.execute(&ctx).await.unwrap();
        assert_eq!(reports.len(), 3);
        assert!(reports.iter().all(|r| !r.executed));

        let root = tmp.path().join("gifforge").join("1234567");
        let frames = root.join("p").join("img-%03d.png");
        let frames = frames.to_string_lossy();
        let temp = root.join("temp.mp4");
        let temp = temp.to_string_lossy();
        let gif = root.join("crimea.gif");
        let gif = gif.to_string_lossy();

        assert_eq!(
            reports[0].command.to_string(),
            format!(
                "/opt/bin/ffmpeg -i /videos/crimea.mp4 -an -ss 00:00:00 -t 3 -q:v 2 -f image2 \
                 -vsync cfr -r 25 -y -progress http://127.0.0.1:8080 {frames}"
            )
        );
        assert_eq!(
            reports[1].command.to_string(),
            format!(
                "/opt/bin/ffmpeg -f image2 -y -progress http://127.0.0.1:8080 -i {frames} \
                 -c:v libx264 -crf 23 -vf fps=25,format=yuv420p -preset veryslow {temp}"
            )
        );
        assert_eq!(
            reports[2].command.to_string(),
            format!(
                "/opt/bin/ffmpeg -y -progress http://127.0.0.1:8080 -i {temp} \
                 -vf format=rgb8 {gif}"
            )
        );

        // Preview mode touches nothing on disk.
        assert!(!root.exists());
    }

    #[tokio::test]
    async fn missing_ffmpeg_fails_first_stage_with_127() {
        let video = VideoDescription::new(PathBuf::from("/videos/clip.mp4"), Duration::from_secs(60));
        let ctx = StageContext::new(
            Arc::new(video),
            Arc::new(ToolRegistry::default()),
            Arc::new(RunConfig::default()),
            "1",
        );

        let err = Pipeline::standard().execute(&ctx).await.unwrap_err();
        assert!(err.to_string().contains("[extract]"));
        assert_eq!(err.exit_code(), 127);
    }
}
