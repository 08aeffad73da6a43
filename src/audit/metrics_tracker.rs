use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use crate::errors::HnpError;
use crate::models::{ScanOutcome, Stage};
use chrono::Utc;
use super::utils::atomic_write;

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct RunMetrics {
    pub run_id: String,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub targets: BTreeMap<String, TargetMetrics>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TargetMetrics {
    pub status: String,
    pub cache_hit: bool,
    pub duration_ms: u64,
    pub failed_stage: Option<Stage>,
    pub error: Option<String>,
}

pub struct MetricsTracker {
    path: PathBuf,
    data: RunMetrics,
}

impl MetricsTracker {
    pub fn new(base_dir: &Path, run_id: &str) -> Self {
        Self {
            path: base_dir.join("run_metrics.json"),
            data: RunMetrics {
                run_id: run_id.to_string(),
                started_at: Utc::now().to_rfc3339(),
                ..Default::default()
            },
        }
    }

    pub async fn record_target(
        &mut self,
        outcome: &ScanOutcome,
        cache_hit: bool,
        duration_ms: u64,
    ) -> Result<(), HnpError> {
        let entry = match outcome {
            ScanOutcome::Succeeded { .. } => TargetMetrics {
                status: "succeeded".to_string(),
                cache_hit,
                duration_ms,
                failed_stage: None,
                error: None,
            },
            ScanOutcome::Failed { stage, error, .. } => TargetMetrics {
                status: "failed".to_string(),
                cache_hit: false,
                duration_ms,
                failed_stage: Some(*stage),
                error: Some(error.clone()),
            },
        };
        self.data.targets.insert(outcome.target().to_string(), entry);
        self.save().await
    }

    /// Downgrade a target to failed after the scan, keeping its timing.
    pub async fn mark_failed(&mut self, target: &str, stage: Stage, error: &str) -> Result<(), HnpError> {
        let entry = self.data.targets.entry(target.to_string()).or_insert(TargetMetrics {
            status: String::new(),
            cache_hit: false,
            duration_ms: 0,
            failed_stage: None,
            error: None,
        });
        entry.status = "failed".to_string();
        entry.cache_hit = false;
        entry.failed_stage = Some(stage);
        entry.error = Some(error.to_string());
        self.save().await
    }

    pub async fn finish(&mut self) -> Result<(), HnpError> {
        self.data.completed_at = Some(Utc::now().to_rfc3339());
        self.save().await
    }

    pub async fn save(&self) -> Result<(), HnpError> {
        let json = serde_json::to_string_pretty(&self.data)?;
        atomic_write(&self.path, &json).await
    }
}
