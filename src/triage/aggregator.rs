use crate::models::{AnalysisReport, Finding, RunSummary};

/// Single-pass accumulator over classified findings.
///
/// Keeps findings in arrival order and never deduplicates.
#[derive(Debug, Default)]
pub struct Aggregator {
    report: AnalysisReport,
    malformed: usize,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ingest(&mut self, finding: Finding) {
        self.report.total_flows += 1;
        *self.report.framework_distribution.entry(finding.framework).or_insert(0) += 1;
        *self.report.vulnerability_scenarios.entry(finding.vulnerability_scenario).or_insert(0) += 1;
        self.report.detailed_findings.push(finding);
    }

    pub fn record_malformed(&mut self, rows: usize) {
        self.malformed += rows;
    }

    pub fn total_flows(&self) -> usize {
        self.report.total_flows
    }

    pub fn finish(self, mut run: RunSummary) -> AnalysisReport {
        run.malformed_rows += self.malformed;
        AnalysisReport { run, ..self.report }
    }
}

pub fn aggregate(findings: impl IntoIterator<Item = Finding>) -> AnalysisReport {
    let mut aggregator = Aggregator::new();
    for finding in findings {
        aggregator.ingest(finding);
    }
    aggregator.finish(RunSummary::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Framework, VulnerabilityScenario};

    fn finding(id: usize, scenario: VulnerabilityScenario, framework: Framework) -> Finding {
        Finding {
            id,
            source: format!("src{}", id),
            sink: format!("sink{}", id),
            vulnerability_scenario: scenario,
            framework,
            description: format!("HNP: {} in {}", scenario, framework),
            target: "app".into(),
        }
    }

    #[test]
    fn test_distributions_sum_to_total() {
        let report = aggregate(vec![
            finding(1, VulnerabilityScenario::OpenRedirect, Framework::Flask),
            finding(2, VulnerabilityScenario::PasswordReset, Framework::Django),
            finding(3, VulnerabilityScenario::OpenRedirect, Framework::Flask),
            finding(4, VulnerabilityScenario::Unknown, Framework::Unknown),
        ]);
        assert_eq!(report.total_flows, 4);
        assert_eq!(report.detailed_findings.len(), report.total_flows);
        assert_eq!(report.framework_distribution.values().sum::<usize>(), 4);
        assert_eq!(report.vulnerability_scenarios.values().sum::<usize>(), 4);
        assert_eq!(report.vulnerability_scenarios[&VulnerabilityScenario::OpenRedirect], 2);
    }

    #[test]
    fn test_order_preserved_and_zero_keys_absent() {
        let report = aggregate(vec![
            finding(1, VulnerabilityScenario::TemplateInjection, Framework::Tornado),
            finding(2, VulnerabilityScenario::PasswordReset, Framework::Flask),
        ]);
        let ids: Vec<usize> = report.detailed_findings.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(!report.framework_distribution.contains_key(&Framework::Django));

        // Map iteration follows declaration order, not arrival order
        let keys: Vec<_> = report.vulnerability_scenarios.keys().copied().collect();
        assert_eq!(keys, vec![VulnerabilityScenario::PasswordReset, VulnerabilityScenario::TemplateInjection]);
    }

    #[test]
    fn test_empty_input() {
        let report = aggregate(Vec::new());
        assert_eq!(report.total_flows, 0);
        assert!(report.framework_distribution.is_empty());
        assert!(report.vulnerability_scenarios.is_empty());
    }

    #[test]
    fn test_finish_carries_malformed_count() {
        let mut aggregator = Aggregator::new();
        aggregator.record_malformed(2);
        aggregator.record_malformed(1);
        let report = aggregator.finish(RunSummary { malformed_rows: 1, ..Default::default() });
        assert_eq!(report.run.malformed_rows, 4);
    }
}
