use std::collections::BTreeMap;
use std::fmt::Write;
use crate::errors::HnpError;
use crate::models::{AnalysisReport, Finding};
use crate::utils::truncation::truncate_chars;

const RULE_WIDTH: usize = 80;
const SECTION_WIDTH: usize = 40;
/// Findings printed in full per scenario group; the rest are summarized.
const FINDINGS_PER_GROUP: usize = 3;
const SNIPPET_CHARS: usize = 60;

/// Rendered forms of one report.
#[derive(Debug, Clone)]
pub struct Presentation {
    pub text: String,
    /// Complete, untruncated report.
    pub json: String,
}

pub fn present(report: &AnalysisReport) -> Result<Presentation, HnpError> {
    Ok(Presentation {
        text: format_text_report(report),
        json: serde_json::to_string_pretty(report)?,
    })
}

pub fn format_text_report(report: &AnalysisReport) -> String {
    let mut out = String::new();
    format_header(&mut out, report);
    format_summary(&mut out, report);
    format_failed_targets(&mut out, report);
    format_distribution(
        &mut out,
        "FRAMEWORK DISTRIBUTION",
        report.total_flows,
        report.framework_distribution.iter().map(|(k, v)| (k.as_str(), *v)),
    );
    format_distribution(
        &mut out,
        "VULNERABILITY SCENARIOS",
        report.total_flows,
        report.vulnerability_scenarios.iter().map(|(k, v)| (k.as_str(), *v)),
    );
    format_findings(&mut out, &report.detailed_findings);
    out
}

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(out, "{}", "-".repeat(SECTION_WIDTH));
}

fn format_header(out: &mut String, report: &AnalysisReport) {
    let rule = "=".repeat(RULE_WIDTH);
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "HOST HEADER POISONING (HNP) ANALYSIS REPORT");
    let _ = writeln!(out, "{}", rule);
    if let Some(ref run_id) = report.run.run_id {
        let _ = writeln!(out, "Run ID:    {}", run_id);
    }
    if let Some(generated_at) = report.run.generated_at {
        let _ = writeln!(out, "Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    if let Some(ref version) = report.run.tool_version {
        let _ = writeln!(out, "Version:   {}", version);
    }
    out.push('\n');
}

fn format_summary(out: &mut String, report: &AnalysisReport) {
    let run = &report.run;
    section(out, "SUMMARY");
    let _ = writeln!(out, "Targets scanned:        {}", run.targets_scanned);
    let _ = writeln!(out, "Database cache hits:    {}", run.cache_hits);
    let _ = writeln!(out, "Failed targets:         {}", run.failed_targets.len());
    let _ = writeln!(out, "Skipped directories:    {}", run.skipped_targets.len());
    let _ = writeln!(out, "Total HNP flows:        {}", report.total_flows);
    if run.malformed_rows > 0 {
        let _ = writeln!(out, "Malformed rows dropped: {}", run.malformed_rows);
    }
    out.push('\n');
}

fn format_failed_targets(out: &mut String, report: &AnalysisReport) {
    let failed = &report.run.failed_targets;
    section(out, &format!("FAILED TARGETS ({})", failed.len()));
    if failed.is_empty() {
        let _ = writeln!(out, "  None");
    }
    for f in failed {
        let _ = writeln!(out, "  - {} [{}]: {}", f.target, f.stage, first_line(&f.error));
    }
    out.push('\n');

    let skipped = &report.run.skipped_targets;
    if !skipped.is_empty() {
        section(out, &format!("SKIPPED DIRECTORIES ({})", skipped.len()));
        for s in skipped {
            let _ = writeln!(out, "  - {}: {}", s.target, s.reason);
        }
        out.push('\n');
    }
}

fn format_distribution<'a>(
    out: &mut String,
    title: &str,
    total: usize,
    entries: impl Iterator<Item = (&'a str, usize)>,
) {
    section(out, title);
    let mut any = false;
    for (name, count) in entries {
        any = true;
        let _ = writeln!(out, "  {}: {} ({:.1}%)", name, count, percent(count, total));
    }
    if !any {
        let _ = writeln!(out, "  None");
    }
    out.push('\n');
}

fn format_findings(out: &mut String, findings: &[Finding]) {
    section(out, "DETAILED FINDINGS");
    if findings.is_empty() {
        let _ = writeln!(out, "No host header poisoning flows were found.");
        return;
    }

    let mut groups: BTreeMap<&str, Vec<&Finding>> = BTreeMap::new();
    for f in findings {
        groups.entry(f.vulnerability_scenario.as_str()).or_default().push(f);
    }

    for (scenario, group) in &groups {
        let _ = writeln!(out, "\n[{}] ({} flows)", scenario, group.len());
        for f in group.iter().take(FINDINGS_PER_GROUP) {
            let _ = writeln!(out, "  #{} {} ({})", f.id, f.framework, display_target(&f.target));
            let _ = writeln!(out, "     Source: {}", snippet(&f.source));
            let _ = writeln!(out, "     Sink:   {}", snippet(&f.sink));
        }
        if group.len() > FINDINGS_PER_GROUP {
            let _ = writeln!(
                out,
                "  ... and {} more similar scenarios",
                group.len() - FINDINGS_PER_GROUP
            );
        }
    }
}

fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 * 100.0 / total as f64
    }
}

fn snippet(text: &str) -> String {
    let cut = truncate_chars(text, SNIPPET_CHARS);
    if cut.len() < text.len() {
        format!("{}...", cut)
    } else {
        cut.to_string()
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}

fn display_target(target: &str) -> &str {
    if target.is_empty() { "unknown target" } else { target }
}
