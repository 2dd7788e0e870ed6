//! Console rendering of progress snapshots.

use std::io::Write;

use tokio::sync::mpsc;

use crate::status::{ProgressStatus, RunState};

/// What the sink saw over the lifetime of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SinkSummary {
    /// Snapshots received.
    pub updates: usize,
    /// Reports that reached a terminal state (one per stage that reported).
    pub completions: usize,
    pub last_frame: u64,
    pub dropped_frames: u64,
}

/// The tick written for one snapshot.
///
/// A first `continue` with no frames yet prints `.`, later ones print the
/// frame count, and any terminal state closes the line.
pub fn render(status: &ProgressStatus) -> String {
    match &status.state {
        Some(state) if state.is_terminal() => " Completed\n".to_string(),
        Some(RunState::Continue) | None if status.frame == 0 => ".".to_string(),
        _ => format!(" {}", status.frame),
    }
}

/// Drain `rx` until every sender is gone, writing a tick per snapshot.
pub async fn run_sink<W: Write>(mut rx: mpsc::Receiver<ProgressStatus>, mut out: W) -> SinkSummary {
    let mut summary = SinkSummary::default();

    while let Some(status) = rx.recv().await {
        summary.updates += 1;
        summary.last_frame = status.frame;
        summary.dropped_frames = status.dropped_frames;
        if status.state.as_ref().is_some_and(RunState::is_terminal) {
            summary.completions += 1;
        }

        let tick = render(&status);
        if let Err(e) = out.write_all(tick.as_bytes()).and_then(|()| out.flush()) {
            tracing::debug!("Failed to render progress: {e}");
        }
    }

    tracing::debug!(?summary, "Progress sink drained");
    summary
}
