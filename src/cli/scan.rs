use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use console::style;
use tokio::sync::mpsc;
use crate::audit::AuditSession;
use crate::catalog::TargetCatalog;
use crate::cli::commands::ScanArgs;
use crate::cli::progress::ScanProgress;
use crate::config::{self, HnpConfig, ScanSettings};
use crate::engine::{AnalysisEngine, CodeqlCli};
use crate::errors::HnpError;
use crate::models::{AnalysisReport, Language, RunSummary};
use crate::pipeline::ScanOrchestrator;
use crate::reporting::{write_report, ReportPaths};
use crate::triage::triage_outcomes;
use crate::utils::formatting::tool_version;
use tracing::{info, warn};

/// Environment fallback for the engine executable.
const ENGINE_PATH_ENV: &str = "CODEQL_PATH";

pub async fn handle_scan(args: ScanArgs, quiet: bool) -> Result<(), HnpError> {
    // Parse config file if provided
    let file_config = match &args.config {
        Some(path) => Some(config::parse_config(Path::new(path)).await?),
        None => None,
    };

    let env_engine = std::env::var(ENGINE_PATH_ENV).ok();
    let mut settings = build_settings(&args, file_config.as_ref(), env_engine.as_deref())?;
    settings.validate().await?;

    let run_id = uuid::Uuid::new_v4().to_string();
    info!(
        run_id = %run_id,
        data_root = %settings.data_root.display(),
        engine = %settings.engine_binary.display(),
        "Starting HNP scan"
    );

    let discovered = TargetCatalog::new(&settings.data_root, settings.language)
        .with_excluded([settings.output_root.clone(), settings.database_root.clone()])
        .discover_async()
        .await?;
    if discovered.targets.is_empty() {
        warn!(data_root = %settings.data_root.display(), "No scannable projects found");
    }

    let audit = Arc::new(AuditSession::initialize(&settings.audit_dir(), &run_id).await?);
    for skipped in &discovered.skipped {
        audit.record_warning(&format!("{} skipped: {}", skipped.target, skipped.reason)).await;
    }

    let engine: Arc<dyn AnalysisEngine> =
        Arc::new(CodeqlCli::new(&settings.engine_binary, settings.stage_timeout));
    let mut orchestrator = ScanOrchestrator::new(settings.clone(), engine).with_audit(audit.clone());

    let mut progress_task = None;
    if !args.no_progress && !quiet {
        let (tx, rx) = mpsc::unbounded_channel();
        orchestrator = orchestrator.with_event_channel(tx);
        progress_task = Some(tokio::spawn(ScanProgress::new().drive(rx)));
    }

    let outcomes = orchestrator.run(&discovered.targets).await;
    let cached = orchestrator.cached_targets();
    // Dropping the orchestrator closes the event channel
    drop(orchestrator);
    if let Some(task) = progress_task {
        let _ = task.await;
    }

    let run = RunSummary {
        run_id: Some(run_id),
        generated_at: Some(Utc::now()),
        tool_version: Some(tool_version()),
        skipped_targets: discovered.skipped,
        ..Default::default()
    };
    let report = triage_outcomes(&outcomes, &cached, Some(audit.as_ref()), run).await;
    let paths = write_report(&report, &settings.output_root).await?;

    if !quiet {
        print_summary(&report, &paths);
    }
    info!(
        flows = report.total_flows,
        failed = report.run.failed_targets.len(),
        "Scan completed"
    );
    Ok(())
}

/// Merge CLI flags over the config file over built-in defaults.
pub fn build_settings(
    args: &ScanArgs,
    file_config: Option<&HnpConfig>,
    env_engine: Option<&str>,
) -> Result<ScanSettings, HnpError> {
    let engine_cfg = file_config.and_then(|c| c.engine.as_ref());
    let scan_cfg = file_config.and_then(|c| c.scan.as_ref());
    let output_cfg = file_config.and_then(|c| c.output.as_ref());

    let data_root = args.data_root.clone()
        .or_else(|| scan_cfg.and_then(|s| s.data_root.clone()))
        .ok_or_else(|| HnpError::Config("No data root given (argument or scan.data_root)".into()))?;

    let query_file = args.query.clone()
        .or_else(|| engine_cfg.and_then(|e| e.query.clone()))
        .ok_or_else(|| HnpError::Config("No query file given (--query or engine.query)".into()))?;

    let engine_binary = args.engine.clone()
        .or_else(|| engine_cfg.and_then(|e| e.binary.clone()))
        .or_else(|| env_engine.map(str::to_string))
        .unwrap_or_else(|| config::DEFAULT_ENGINE_BINARY.to_string());

    let language = match &args.language {
        Some(lang) => Some(lang.parse::<Language>().map_err(HnpError::Config)?),
        None => engine_cfg.and_then(|e| e.language),
    };

    let output_root = PathBuf::from(
        args.output.clone()
            .or_else(|| output_cfg.and_then(|o| o.directory.clone()))
            .unwrap_or_else(|| config::DEFAULT_OUTPUT_DIR.to_string()),
    );

    let database_root = args.database_dir.clone()
        .or_else(|| scan_cfg.and_then(|s| s.database_dir.clone()))
        .map(PathBuf::from)
        .unwrap_or_else(|| output_root.join("databases"));

    let timeout_secs = args.timeout
        .or_else(|| engine_cfg.and_then(|e| e.stage_timeout_secs))
        .unwrap_or(config::DEFAULT_STAGE_TIMEOUT_SECS);

    let concurrency = args.concurrency
        .or_else(|| scan_cfg.and_then(|s| s.concurrency))
        .unwrap_or(config::DEFAULT_CONCURRENCY);

    Ok(ScanSettings {
        engine_binary: PathBuf::from(engine_binary),
        query_file: PathBuf::from(query_file),
        data_root: PathBuf::from(data_root),
        output_root,
        database_root,
        language,
        stage_timeout: Duration::from_secs(timeout_secs),
        concurrency,
    })
}

pub fn print_summary(report: &AnalysisReport, paths: &ReportPaths) {
    let run = &report.run;
    println!();
    println!("  {}", style("HNP scan complete").bold());
    println!(
        "  Targets: {} scanned, {} cached, {} failed, {} skipped",
        run.targets_scanned,
        run.cache_hits,
        run.failed_targets.len(),
        run.skipped_targets.len()
    );
    println!("  Flows:   {}", style(report.total_flows).cyan());
    for (scenario, count) in &report.vulnerability_scenarios {
        println!("    {:<30} {}", scenario.as_str(), count);
    }
    for failed in &run.failed_targets {
        println!("  {} {} failed at {}", style("✗").red(), failed.target, failed.stage);
    }
    println!("  Report:  {}", paths.text.display());
    println!("  JSON:    {}", paths.json.display());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EngineConfig, ScanConfig};

    fn args() -> ScanArgs {
        ScanArgs {
            data_root: Some("./data".into()),
            query: Some("hnp.ql".into()),
            output: None,
            engine: None,
            language: None,
            timeout: None,
            concurrency: None,
            database_dir: None,
            config: None,
            no_progress: true,
        }
    }

    #[test]
    fn test_defaults_applied() {
        let settings = build_settings(&args(), None, None).unwrap();
        assert_eq!(settings.engine_binary, PathBuf::from("codeql"));
        assert_eq!(settings.output_root, PathBuf::from("./results"));
        assert_eq!(settings.database_root, PathBuf::from("./results").join("databases"));
        assert_eq!(settings.concurrency, 1);
        assert_eq!(settings.stage_timeout, Duration::from_secs(1800));
        assert!(settings.language.is_none());
    }

    #[test]
    fn test_cli_overrides_config_overrides_env() {
        let file = HnpConfig {
            engine: Some(EngineConfig {
                binary: Some("/opt/codeql/codeql".into()),
                stage_timeout_secs: Some(60),
                language: Some(Language::Go),
                ..Default::default()
            }),
            scan: Some(ScanConfig { concurrency: Some(3), ..Default::default() }),
            output: None,
        };
        let mut a = args();
        a.concurrency = Some(8);

        let settings = build_settings(&a, Some(&file), Some("/env/codeql")).unwrap();
        assert_eq!(settings.engine_binary, PathBuf::from("/opt/codeql/codeql"));
        assert_eq!(settings.stage_timeout, Duration::from_secs(60));
        assert_eq!(settings.concurrency, 8);
        assert_eq!(settings.language, Some(Language::Go));

        let settings = build_settings(&args(), None, Some("/env/codeql")).unwrap();
        assert_eq!(settings.engine_binary, PathBuf::from("/env/codeql"));
    }

    #[test]
    fn test_missing_query_is_config_error() {
        let mut a = args();
        a.query = None;
        let err = build_settings(&a, None, None).unwrap_err();
        assert!(matches!(err, HnpError::Config(_)));
    }

    #[test]
    fn test_invalid_language_is_config_error() {
        let mut a = args();
        a.language = Some("cobol".into());
        let err = build_settings(&a, None, None).unwrap_err();
        assert!(matches!(err, HnpError::Config(ref m) if m.contains("cobol")));
    }
}
