use std::path::{Path, PathBuf};
use crate::audit::atomic_write;
use crate::errors::HnpError;
use crate::models::AnalysisReport;
use super::formatter::present;
use tracing::info;

pub const TEXT_REPORT_FILE: &str = "hnp_report.txt";
pub const JSON_REPORT_FILE: &str = "hnp_complete_analysis.json";

#[derive(Debug, Clone)]
pub struct ReportPaths {
    pub text: PathBuf,
    pub json: PathBuf,
}

/// Render the report and persist both forms into `dir`.
///
/// Each file is replaced atomically; readers see the old or the new report,
/// never a partial one.
pub async fn write_report(report: &AnalysisReport, dir: &Path) -> Result<ReportPaths, HnpError> {
    tokio::fs::create_dir_all(dir).await?;
    let presentation = present(report)?;

    let paths = ReportPaths {
        text: dir.join(TEXT_REPORT_FILE),
        json: dir.join(JSON_REPORT_FILE),
    };
    atomic_write(&paths.json, &presentation.json).await?;
    atomic_write(&paths.text, &presentation.text).await?;

    info!(
        text = %paths.text.display(),
        json = %paths.json.display(),
        flows = report.total_flows,
        "Report written"
    );
    Ok(paths)
}
