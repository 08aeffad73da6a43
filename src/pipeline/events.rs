use crate::models::{ScanOutcome, Stage};

/// Messages sent from the orchestrator for real-time display.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// Batch started
    RunStarted {
        targets: usize,
    },
    /// A target acquired a worker slot
    TargetStarted {
        target: String,
    },
    /// An engine invocation is about to run
    StageStarted {
        target: String,
        stage: Stage,
    },
    /// Database creation skipped, existing database reused
    DatabaseCached {
        target: String,
    },
    /// Target finished, successfully or not
    TargetCompleted {
        outcome: ScanOutcome,
        duration_ms: u64,
    },
    /// Every target has an outcome
    RunCompleted {
        succeeded: usize,
        failed: usize,
        duration_ms: u64,
    },
}
