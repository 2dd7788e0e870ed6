//! Write-once holder for a stage's result.

use parking_lot::Mutex;

use crate::stage::StageReport;

/// Holds the outcome of one stage task until the orchestrator reads it.
///
/// The first write wins; later writes are rejected so a result cannot be
/// replaced once the completion signal may have been observed.
#[derive(Debug, Default)]
pub struct OutcomeCell {
    slot: Mutex<Option<gf_core::Result<StageReport>>>,
}

impl OutcomeCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `outcome` unless one is already present. Returns whether it was stored.
    pub fn set(&self, outcome: gf_core::Result<StageReport>) -> bool {
        let mut slot = self.slot.lock();
        if slot.is_some() {
            return false;
        }
        *slot = Some(outcome);
        true
    }

    pub fn is_set(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Remove and return the stored outcome.
    pub fn take(&self) -> Option<gf_core::Result<StageReport>> {
        self.slot.lock().take()
    }
}
