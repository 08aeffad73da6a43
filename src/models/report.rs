use std::collections::BTreeMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use super::finding::{Finding, Framework, VulnerabilityScenario};
use super::scan_result::{ScanOutcome, Stage};

/// Aggregate over every finding of a run.
///
/// Distribution maps iterate in the enums' declaration order, so rendering is
/// deterministic regardless of the order targets finished in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub total_flows: usize,
    pub framework_distribution: BTreeMap<Framework, usize>,
    pub vulnerability_scenarios: BTreeMap<VulnerabilityScenario, usize>,
    pub detailed_findings: Vec<Finding>,
    #[serde(default)]
    pub run: RunSummary,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Option<String>,
    pub generated_at: Option<DateTime<Utc>>,
    pub tool_version: Option<String>,
    pub targets_scanned: usize,
    pub cache_hits: usize,
    pub failed_targets: Vec<FailedTarget>,
    pub skipped_targets: Vec<SkippedTarget>,
    /// Tabular rows dropped by the parser.
    pub malformed_rows: usize,
}

impl RunSummary {
    /// Fill target accounting from the orchestrator's outcomes. `cached`
    /// names the targets whose database was reused; only those that went on
    /// to succeed count as cache hits.
    pub fn record_outcomes(&mut self, outcomes: &[ScanOutcome], cached: &[String]) {
        self.targets_scanned += outcomes.len();
        for outcome in outcomes {
            if let ScanOutcome::Failed { target, stage, error } = outcome {
                self.failed_targets.push(FailedTarget {
                    target: target.clone(),
                    stage: *stage,
                    error: error.clone(),
                });
            }
        }
        self.cache_hits += cached
            .iter()
            .filter(|id| outcomes.iter().any(|o| o.is_success() && o.target() == id.as_str()))
            .count();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedTarget {
    pub target: String,
    pub stage: Stage,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedTarget {
    pub target: String,
    pub reason: String,
}
