//! Running a stage, both inline ([`run_stage`]) and as a background task
//! whose outcome is collected through an [`OutcomeCell`] ([`launch`]).

use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::context::StageContext;
use crate::outcome::OutcomeCell;
use crate::stage::{Stage, StageReport};

/// Build, prepare and execute `stage`.
///
/// In dry-run mode the command is built and reported but nothing is
/// prepared or spawned. Cancellable stages check the token exactly once,
/// after preparation and right before the spawn; a running process is not
/// interrupted.
pub async fn run_stage<S: Stage + ?Sized>(
    stage: &S,
    ctx: &StageContext,
) -> gf_core::Result<StageReport> {
    let command = stage.build(ctx)?;

    if ctx.dry_run {
        tracing::info!(stage = stage.name(), "[DRY RUN] {command}");
        return Ok(StageReport {
            stage: stage.name(),
            command,
            executed: false,
        });
    }

    stage.prepare(ctx).await?;

    if stage.cancellable() && ctx.cancellation.is_cancelled() {
        tracing::info!(stage = stage.name(), "Cancelled before spawning");
        return Err(gf_core::Error::Cancelled(format!(
            "{} was cancelled before it started",
            stage.name()
        )));
    }

    tracing::debug!(stage = stage.name(), "Running: {command}");
    command.to_tool_command().execute().await?;

    Ok(StageReport {
        stage: stage.name(),
        command,
        executed: true,
    })
}

/// A stage running in the background.
#[derive(Debug)]
pub struct StageHandle {
    name: &'static str,
    cell: Arc<OutcomeCell>,
    done: oneshot::Receiver<()>,
    task: JoinHandle<()>,
}

/// Spawn `stage` on the runtime.
///
/// The task stores its outcome in the handle's cell and only then signals
/// completion, so [`StageHandle::wait`] always finds the outcome in place.
pub fn launch(stage: Arc<dyn Stage>, ctx: StageContext) -> StageHandle {
    let name = stage.name();
    let cell = Arc::new(OutcomeCell::new());
    let (tx, done) = oneshot::channel();

    let task = tokio::spawn({
        let cell = Arc::clone(&cell);
        async move {
            let outcome = stage.run(&ctx).await;
            cell.set(outcome);
            let _ = tx.send(());
        }
    });

    StageHandle {
        name,
        cell,
        done,
        task,
    }
}

impl StageHandle {
    /// Name of the stage this handle tracks.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Block until the stage finishes and return its outcome.
    pub async fn wait(self) -> gf_core::Result<StageReport> {
        if self.done.await.is_err() {
            // The sender was dropped without a signal: the task died.
            let reason = match self.task.await {
                Err(e) if e.is_panic() => "stage task panicked",
                Err(_) => "stage task was aborted",
                Ok(()) => "stage task ended without reporting",
            };
            return Err(gf_core::Error::pipeline(self.name, reason));
        }

        self.cell.take().unwrap_or_else(|| {
            Err(gf_core::Error::Internal(format!(
                "{} signalled completion without an outcome",
                self.name
            )))
        })
    }
}
