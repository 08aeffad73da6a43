//! Turns decoded engine output into classified, aggregated findings.

pub mod parser;
pub mod classifier;
pub mod aggregator;

use std::path::Path;
use crate::audit::AuditSession;
use crate::models::{AnalysisReport, RunSummary, ScanOutcome, Stage};
use aggregator::Aggregator;
use tracing::{info, warn};

pub use aggregator::aggregate;
pub use classifier::classify;
pub use parser::parse;

/// Accumulates findings across many decoded result files.
#[derive(Debug, Default)]
pub struct Triage {
    aggregator: Aggregator,
}

impl Triage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and classify one target's decoded text. Returns the number of flows added.
    pub fn add_text(&mut self, target: &str, text: &str) -> usize {
        let before = self.aggregator.total_flows();
        let mut rows = parse(target, text);
        for record in rows.by_ref() {
            let id = self.aggregator.total_flows() + 1;
            self.aggregator.ingest(classifier::to_finding(id, record));
        }
        self.aggregator.record_malformed(rows.malformed());

        let added = self.aggregator.total_flows() - before;
        info!(target = %target, flows = added, malformed = rows.malformed(), "Triaged result table");
        added
    }

    pub fn finish(self, run: RunSummary) -> AnalysisReport {
        self.aggregator.finish(run)
    }
}

/// Build the report for a finished scan from the successful targets' decoded
/// output. Targets are consumed in outcome order, so finding ids are stable
/// for a given target set.
///
/// A target whose decoded file cannot be read is accounted as failed at
/// decode, never as a success or a cache hit.
pub async fn triage_outcomes(
    outcomes: &[ScanOutcome],
    cached: &[String],
    audit: Option<&AuditSession>,
    mut run: RunSummary,
) -> AnalysisReport {
    let mut settled = Vec::with_capacity(outcomes.len());
    let mut decoded = Vec::new();

    for outcome in outcomes {
        let ScanOutcome::Succeeded { target, result_path } = outcome else {
            settled.push(outcome.clone());
            continue;
        };
        match tokio::fs::read(result_path).await {
            Ok(bytes) => {
                decoded.push((target.as_str(), String::from_utf8_lossy(&bytes).into_owned()));
                settled.push(outcome.clone());
            }
            Err(e) => {
                warn!(target = %target, path = %result_path.display(), error = %e, "Cannot read decoded results");
                let error = format!("cannot read {}: {}", result_path.display(), e);
                if let Some(audit) = audit {
                    audit.record_unreadable_output(target, &error).await;
                }
                settled.push(ScanOutcome::Failed { target: target.clone(), stage: Stage::Decode, error });
            }
        }
    }

    run.record_outcomes(&settled, cached);
    let mut triage = Triage::new();
    for (target, text) in &decoded {
        triage.add_text(target, text);
    }
    triage.finish(run)
}

/// Target id for a decoded file given on the command line:
/// `hnp-report-<id>.txt` maps back to `<id>`, anything else uses the file stem.
pub fn target_from_path(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    stem.strip_prefix("hnp-report-").map(str::to_string).unwrap_or(stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Framework, VulnerabilityScenario};

    #[test]
    fn test_ids_start_at_one() {
        let mut t = Triage::new();
        let added = t.add_text("app", "| source | col1 | sink |\n| request.host | x | redirect(a) |\n| request.host | x | print(b) |\n");
        let report = t.finish(RunSummary::default());

        assert_eq!(added, 2);
        let ids: Vec<usize> = report.detailed_findings.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(report.detailed_findings[1].vulnerability_scenario, VulnerabilityScenario::Unknown);
    }

    #[test]
    fn test_ids_continue_across_targets() {
        let mut t = Triage::new();
        t.add_text("a", "| source | col1 | sink |\n| flask.request.host | x | redirect(u) |\n");
        t.add_text("b", "| source | col1 | sink |\n| host | x | send_mail(m) |\n| bad |\n");
        let report = t.finish(RunSummary::default());

        assert_eq!(report.total_flows, 2);
        assert_eq!(report.detailed_findings[1].id, 2);
        assert_eq!(report.detailed_findings[1].target, "b");
        assert_eq!(report.framework_distribution[&Framework::Flask], 1);
        assert_eq!(report.run.malformed_rows, 1);
    }

    #[test]
    fn test_target_from_path() {
        assert_eq!(target_from_path(Path::new("/out/results/hnp-report-flask_app.txt")), "flask_app");
        assert_eq!(target_from_path(Path::new("custom.txt")), "custom");
    }

    #[tokio::test]
    async fn test_unreadable_output_counts_only_as_failure() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("hnp-report-good.txt");
        std::fs::write(&good, "| source | col1 | sink |\n| host | x | render_template(t) |\n").unwrap();

        let outcomes = vec![
            ScanOutcome::Succeeded { target: "good".into(), result_path: good },
            ScanOutcome::Failed { target: "bad".into(), stage: Stage::QueryRun, error: "exit status 2".into() },
            ScanOutcome::Succeeded {
                target: "gone".into(),
                result_path: dir.path().join("missing.txt"),
            },
        ];
        let cached = vec!["gone".to_string(), "good".to_string()];
        let report = triage_outcomes(&outcomes, &cached, None, RunSummary::default()).await;

        assert_eq!(report.total_flows, 1);
        assert_eq!(report.run.targets_scanned, 3);
        assert_eq!(report.run.cache_hits, 1);
        let failed: Vec<(&str, Stage)> = report
            .run
            .failed_targets
            .iter()
            .map(|f| (f.target.as_str(), f.stage))
            .collect();
        assert_eq!(failed, vec![("bad", Stage::QueryRun), ("gone", Stage::Decode)]);
    }

    #[tokio::test]
    async fn test_invalid_utf8_in_decoded_output_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hnp-report-legacy.txt");
        let mut bytes = b"| source | col1 | sink |\n| request.host caf".to_vec();
        bytes.push(0xE9);
        bytes.extend_from_slice(b" | x | redirect(u) |\n");
        std::fs::write(&path, bytes).unwrap();

        let outcomes = vec![ScanOutcome::Succeeded { target: "legacy".into(), result_path: path }];
        let report = triage_outcomes(&outcomes, &[], None, RunSummary::default()).await;

        assert_eq!(report.total_flows, 1);
        assert!(report.run.failed_targets.is_empty());
        assert!(report.detailed_findings[0].source.contains('\u{FFFD}'));
    }
}
