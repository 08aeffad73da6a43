use std::path::{Path, PathBuf};
use chrono::Utc;
use crate::cli::commands::TriageArgs;
use crate::cli::scan::print_summary;
use crate::errors::HnpError;
use crate::models::RunSummary;
use crate::reporting::write_report;
use crate::triage::{target_from_path, Triage};
use crate::utils::formatting::tool_version;
use tracing::info;

/// Build a report from decoded result files produced by an earlier run or by
/// invoking the engine by hand.
pub async fn handle_triage(args: TriageArgs, quiet: bool) -> Result<(), HnpError> {
    let mut triage = Triage::new();

    for file in &args.files {
        let path = Path::new(file);
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            HnpError::Config(format!("Cannot read result file {}: {}", path.display(), e))
        })?;
        triage.add_text(&target_from_path(path), &String::from_utf8_lossy(&bytes));
    }

    let run = RunSummary {
        run_id: Some(uuid::Uuid::new_v4().to_string()),
        generated_at: Some(Utc::now()),
        tool_version: Some(tool_version()),
        targets_scanned: args.files.len(),
        ..Default::default()
    };
    let report = triage.finish(run);
    let paths = write_report(&report, &PathBuf::from(&args.output)).await?;

    if !quiet {
        print_summary(&report, &paths);
    }
    info!(files = args.files.len(), flows = report.total_flows, "Triage completed");
    Ok(())
}
