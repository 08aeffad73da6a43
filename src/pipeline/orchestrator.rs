use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use dashmap::DashSet;
use futures::future::join_all;
use tokio::sync::{mpsc, Semaphore};
use crate::audit::AuditSession;
use crate::config::ScanSettings;
use crate::engine::{AnalysisEngine, EngineOutput};
use crate::errors::HnpError;
use crate::models::{AnalysisArtifact, ScanOutcome, Stage, Target};
use crate::utils::truncation::truncate_error;
use super::events::ScanEvent;
use super::lock::TargetLocks;
use tracing::{debug, error, info, warn};

/// Drives every target through database creation, query execution and
/// result decoding.
///
/// Targets run concurrently up to the configured limit. A failure in one
/// target becomes that target's outcome and never affects the others.
pub struct ScanOrchestrator {
    settings: ScanSettings,
    engine: Arc<dyn AnalysisEngine>,
    limiter: Semaphore,
    locks: TargetLocks,
    cached: DashSet<String>,
    event_tx: Option<mpsc::UnboundedSender<ScanEvent>>,
    audit: Option<Arc<AuditSession>>,
}

impl ScanOrchestrator {
    pub fn new(settings: ScanSettings, engine: Arc<dyn AnalysisEngine>) -> Self {
        let permits = settings.concurrency.max(1);
        Self {
            settings,
            engine,
            limiter: Semaphore::new(permits),
            locks: TargetLocks::new(),
            cached: DashSet::new(),
            event_tx: None,
            audit: None,
        }
    }

    /// Attach an event channel for streaming progress to a display.
    pub fn with_event_channel(mut self, tx: mpsc::UnboundedSender<ScanEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    pub fn with_audit(mut self, audit: Arc<AuditSession>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Targets whose existing database was reused, sorted by id.
    pub fn cached_targets(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.cached.iter().map(|id| id.key().clone()).collect();
        ids.sort();
        ids
    }

    fn emit(&self, event: ScanEvent) {
        if let Some(ref tx) = self.event_tx {
            let _ = tx.send(event);
        }
    }

    /// Scan all targets. Returns exactly one outcome per target, in input order.
    pub async fn run(&self, targets: &[Target]) -> Vec<ScanOutcome> {
        let started = Instant::now();
        info!(
            targets = targets.len(),
            concurrency = self.settings.concurrency,
            engine = self.engine.engine_name(),
            "Scan started"
        );
        self.emit(ScanEvent::RunStarted { targets: targets.len() });
        if let Some(ref audit) = self.audit {
            audit.record_run_started(targets.len(), self.engine.engine_name()).await;
        }

        let outcomes = join_all(targets.iter().map(|t| self.scan_bounded(t))).await;

        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        let failed = outcomes.len() - succeeded;
        let duration_ms = started.elapsed().as_millis() as u64;

        self.emit(ScanEvent::RunCompleted { succeeded, failed, duration_ms });
        if let Some(ref audit) = self.audit {
            audit.record_run_completed(succeeded, failed, duration_ms).await;
        }
        info!(succeeded, failed, duration_ms, "Scan completed");
        outcomes
    }

    async fn scan_bounded(&self, target: &Target) -> ScanOutcome {
        // The semaphore is never closed; a failed acquire just runs unbounded
        let _permit = self.limiter.acquire().await.ok();
        let started = Instant::now();
        self.emit(ScanEvent::TargetStarted { target: target.id.clone() });

        let (outcome, cache_hit) = match self.scan_locked(target).await {
            Ok((result_path, cache_hit)) => {
                info!(target = %target.id, cache_hit, output = %result_path.display(), "Target analyzed");
                (ScanOutcome::Succeeded { target: target.id.clone(), result_path }, cache_hit)
            }
            Err((stage, e)) => (self.failed(target, stage, e), false),
        };
        if cache_hit {
            self.cached.insert(target.id.clone());
        }

        let duration_ms = started.elapsed().as_millis() as u64;
        if let Some(ref audit) = self.audit {
            audit.record_target_completed(&outcome, cache_hit, duration_ms).await;
        }
        self.emit(ScanEvent::TargetCompleted { outcome: outcome.clone(), duration_ms });
        outcome
    }

    /// Hold the target's lock for the whole check-then-create sequence, so two
    /// workers or two processes never build the same database at once.
    /// Returns the decoded text path and whether the database was reused.
    async fn scan_locked(&self, target: &Target) -> Result<(PathBuf, bool), (Stage, HnpError)> {
        let mut artifact = AnalysisArtifact::resolve(
            &target.id,
            &self.settings.database_root,
            &self.settings.output_root,
        );

        tokio::fs::create_dir_all(&self.settings.database_root)
            .await
            .map_err(|e| (Stage::DatabaseCreate, HnpError::from(e)))?;
        let _guard = self
            .locks
            .acquire(&target.id, &artifact.lock_path, self.settings.stage_timeout)
            .await
            .map_err(|e| (Stage::DatabaseCreate, e))?;

        // Re-check under the lock; another worker may have just built it
        artifact.database_cached = artifact.database_path.exists();

        let cache_hit = self
            .database_stage(target, &artifact)
            .await
            .map_err(|e| (Stage::DatabaseCreate, e))?;
        self.query_stage(target, &artifact)
            .await
            .map_err(|e| (Stage::QueryRun, e))?;
        self.decode_stage(target, &artifact)
            .await
            .map_err(|e| (Stage::Decode, e))?;

        Ok((artifact.text_path, cache_hit))
    }

    /// Returns whether an existing database was reused.
    async fn database_stage(&self, target: &Target, artifact: &AnalysisArtifact) -> Result<bool, HnpError> {
        if artifact.database_cached {
            info!(target = %target.id, database = %artifact.database_path.display(), "Reusing existing database");
            self.emit(ScanEvent::DatabaseCached { target: target.id.clone() });
            if let Some(ref audit) = self.audit {
                audit.record_cache_hit(&target.id).await;
            }
            return Ok(true);
        }

        self.stage_started(target, Stage::DatabaseCreate).await;
        let output = self
            .engine
            .create_database(&artifact.database_path, target.language, &target.path)
            .await?;
        require_success(Stage::DatabaseCreate, &output)?;
        require_exists(Stage::DatabaseCreate, &artifact.database_path)?;
        Ok(false)
    }

    async fn query_stage(&self, target: &Target, artifact: &AnalysisArtifact) -> Result<(), HnpError> {
        self.stage_started(target, Stage::QueryRun).await;
        // A leftover from an earlier run must not pass the existence check
        remove_stale(Stage::QueryRun, &artifact.result_path).await?;
        let output = self
            .engine
            .run_query(&self.settings.query_file, &artifact.database_path, &artifact.result_path)
            .await?;
        require_success(Stage::QueryRun, &output)?;
        require_exists(Stage::QueryRun, &artifact.result_path)
    }

    async fn decode_stage(&self, target: &Target, artifact: &AnalysisArtifact) -> Result<(), HnpError> {
        self.stage_started(target, Stage::Decode).await;
        if let Some(parent) = artifact.text_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        remove_stale(Stage::Decode, &artifact.text_path).await?;
        let output = self
            .engine
            .decode_results(&artifact.result_path, &artifact.text_path)
            .await?;
        require_success(Stage::Decode, &output)?;
        require_exists(Stage::Decode, &artifact.text_path)
    }

    async fn stage_started(&self, target: &Target, stage: Stage) {
        debug!(target = %target.id, stage = %stage, "Stage started");
        self.emit(ScanEvent::StageStarted { target: target.id.clone(), stage });
        if let Some(ref audit) = self.audit {
            audit.record_stage_started(&target.id, stage).await;
        }
    }

    fn failed(&self, target: &Target, stage: Stage, err: HnpError) -> ScanOutcome {
        let class = err.classify();
        let detail = match err {
            HnpError::Stage { detail, .. } => detail,
            other => other.to_string(),
        };
        if class.fatal {
            error!(target = %target.id, stage = %stage, error_type = class.error_type, error = %detail, "Target failed");
        } else {
            warn!(target = %target.id, stage = %stage, error_type = class.error_type, error = %detail, "Target failed");
        }
        ScanOutcome::Failed {
            target: target.id.clone(),
            stage,
            error: truncate_error(&detail),
        }
    }
}

fn require_success(stage: Stage, output: &EngineOutput) -> Result<(), HnpError> {
    if output.success() {
        Ok(())
    } else {
        Err(HnpError::stage(stage, output.failure_detail()))
    }
}

fn require_exists(stage: Stage, path: &Path) -> Result<(), HnpError> {
    if path.exists() {
        Ok(())
    } else {
        Err(HnpError::stage(
            stage,
            format!("engine reported success but {} is missing", path.display()),
        ))
    }
}

async fn remove_stale(stage: Stage, path: &Path) -> Result<(), HnpError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            debug!(path = %path.display(), "Removed stale artifact");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(HnpError::stage(
            stage,
            format!("cannot remove stale {}: {}", path.display(), e),
        )),
    }
}
