use std::path::Path;
use tokio::sync::Mutex;
use crate::errors::HnpError;
use crate::models::{ScanOutcome, Stage};
use super::metrics_tracker::MetricsTracker;
use super::workflow_logger::WorkflowLogger;
use tracing::warn;

/// Crash-safe, per-run record of what the scanner did: a plain-text
/// workflow log plus a JSON metrics file rewritten after every target.
///
/// Recording never fails the scan; write errors are only logged.
pub struct AuditSession {
    metrics: Mutex<MetricsTracker>,
    workflow_logger: WorkflowLogger,
}

impl AuditSession {
    pub async fn initialize(audit_dir: &Path, run_id: &str) -> Result<Self, HnpError> {
        tokio::fs::create_dir_all(audit_dir).await?;

        let metrics = MetricsTracker::new(audit_dir, run_id);
        metrics.save().await?;
        let workflow_logger = WorkflowLogger::new(audit_dir);
        workflow_logger.initialize(run_id).await?;

        Ok(Self {
            metrics: Mutex::new(metrics),
            workflow_logger,
        })
    }

    pub async fn record_run_started(&self, targets: usize, engine: &str) {
        self.log(&format!("Run started: {} targets, engine {}", targets, engine)).await;
    }

    pub async fn record_stage_started(&self, target: &str, stage: Stage) {
        self.log(&format!("{}: {} started", target, stage)).await;
    }

    pub async fn record_cache_hit(&self, target: &str) {
        self.log(&format!("{}: existing database reused", target)).await;
    }

    pub async fn record_target_completed(&self, outcome: &ScanOutcome, cache_hit: bool, duration_ms: u64) {
        let line = match outcome {
            ScanOutcome::Succeeded { target, .. } => format!(
                "{}: completed in {}ms{}",
                target,
                duration_ms,
                if cache_hit { " (cached database)" } else { "" }
            ),
            ScanOutcome::Failed { target, stage, error } => {
                format!("{}: failed at {}: {}", target, stage, error)
            }
        };
        self.log(&line).await;

        if let Err(e) = self.metrics.lock().await.record_target(outcome, cache_hit, duration_ms).await {
            warn!(error = %e, "Failed to update run metrics");
        }
    }

    /// A target that finished its stages but whose decoded output could not
    /// be read afterwards.
    pub async fn record_unreadable_output(&self, target: &str, error: &str) {
        self.log(&format!("{}: failed at {}: {}", target, Stage::Decode, error)).await;

        if let Err(e) = self.metrics.lock().await.mark_failed(target, Stage::Decode, error).await {
            warn!(error = %e, "Failed to update run metrics");
        }
    }

    pub async fn record_run_completed(&self, succeeded: usize, failed: usize, duration_ms: u64) {
        self.log(&format!(
            "Run completed: {} succeeded, {} failed, {}ms",
            succeeded, failed, duration_ms
        )).await;

        if let Err(e) = self.metrics.lock().await.finish().await {
            warn!(error = %e, "Failed to finalize run metrics");
        }
    }

    pub async fn record_warning(&self, message: &str) {
        self.log(&format!("WARNING: {}", message)).await;
    }

    async fn log(&self, message: &str) {
        if let Err(e) = self.workflow_logger.log_event(message).await {
            warn!(error = %e, path = %self.workflow_logger.path().display(), "Failed to write workflow log");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use crate::audit::metrics_tracker::RunMetrics;

    #[tokio::test]
    async fn test_session_writes_log_and_metrics() {
        let dir = tempfile::tempdir().unwrap();
        let audit_dir = dir.path().join("audit");
        let session = AuditSession::initialize(&audit_dir, "run-1").await.unwrap();

        session.record_run_started(2, "codeql").await;
        session.record_target_completed(&ScanOutcome::Succeeded {
            target: "flask_app".into(),
            result_path: PathBuf::from("/tmp/flask_app.txt"),
        }, true, 12).await;
        session.record_target_completed(&ScanOutcome::Failed {
            target: "broken".into(),
            stage: Stage::QueryRun,
            error: "exit status 2".into(),
        }, false, 5).await;
        session.record_run_completed(1, 1, 20).await;

        let log = std::fs::read_to_string(audit_dir.join("workflow.log")).unwrap();
        assert!(log.contains("Run: run-1"));
        assert!(log.contains("flask_app: completed in 12ms (cached database)"));
        assert!(log.contains("broken: failed at query-run: exit status 2"));

        let metrics: RunMetrics = serde_json::from_str(
            &std::fs::read_to_string(audit_dir.join("run_metrics.json")).unwrap()
        ).unwrap();
        assert_eq!(metrics.run_id, "run-1");
        assert!(metrics.completed_at.is_some());
        assert_eq!(metrics.targets.len(), 2);
        assert_eq!(metrics.targets["broken"].failed_stage, Some(Stage::QueryRun));
        assert!(metrics.targets["flask_app"].cache_hit);
    }

    #[tokio::test]
    async fn test_unreadable_output_downgrades_target() {
        let dir = tempfile::tempdir().unwrap();
        let session = AuditSession::initialize(dir.path(), "run-2").await.unwrap();

        session.record_target_completed(&ScanOutcome::Succeeded {
            target: "gone".into(),
            result_path: PathBuf::from("/tmp/gone.txt"),
        }, true, 40).await;
        session.record_unreadable_output("gone", "cannot read /tmp/gone.txt").await;

        let log = std::fs::read_to_string(dir.path().join("workflow.log")).unwrap();
        assert!(log.contains("gone: failed at decode: cannot read /tmp/gone.txt"));

        let metrics: RunMetrics = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("run_metrics.json")).unwrap()
        ).unwrap();
        let entry = &metrics.targets["gone"];
        assert_eq!(entry.status, "failed");
        assert!(!entry.cache_hit);
        assert_eq!(entry.duration_ms, 40);
        assert_eq!(entry.failed_stage, Some(Stage::Decode));
    }
}
