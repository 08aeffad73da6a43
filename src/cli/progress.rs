use std::collections::BTreeMap;
use std::time::Duration;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use crate::models::ScanOutcome;
use crate::pipeline::events::ScanEvent;
use crate::pipeline::stage::display_name;
use crate::utils::formatting::format_duration;

/// Progress bar over targets, fed by orchestrator events.
pub struct ScanProgress {
    bar: ProgressBar,
    /// Target id -> current stage label.
    active: BTreeMap<String, &'static str>,
    cache_hits: usize,
    failed: usize,
}

impl ScanProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("  {spinner:.cyan} {bar:30.cyan/dark_gray} {pos}/{len} targets | {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        Self {
            bar,
            active: BTreeMap::new(),
            cache_hits: 0,
            failed: 0,
        }
    }

    pub fn handle_event(&mut self, event: &ScanEvent) {
        match event {
            ScanEvent::RunStarted { targets } => {
                self.bar.set_length(*targets as u64);
                self.bar.set_message("starting");
            }
            ScanEvent::TargetStarted { target } => {
                self.active.insert(target.clone(), "Waiting");
                self.update_message();
            }
            ScanEvent::StageStarted { target, stage } => {
                self.active.insert(target.clone(), display_name(*stage));
                self.update_message();
            }
            ScanEvent::DatabaseCached { .. } => {
                self.cache_hits += 1;
            }
            ScanEvent::TargetCompleted { outcome, duration_ms } => {
                self.active.remove(outcome.target());
                if let ScanOutcome::Failed { target, stage, .. } = outcome {
                    self.failed += 1;
                    self.bar.println(format!(
                        "  {} {} failed at {} after {}",
                        style("✗").red(),
                        target,
                        stage,
                        format_duration(*duration_ms)
                    ));
                }
                self.bar.inc(1);
                self.update_message();
            }
            ScanEvent::RunCompleted { succeeded, failed, duration_ms } => {
                self.bar.finish_with_message(format!(
                    "done: {} succeeded, {} failed, {} cached | {}",
                    succeeded,
                    failed,
                    self.cache_hits,
                    format_duration(*duration_ms)
                ));
            }
        }
    }

    fn update_message(&self) {
        let running: Vec<String> = self
            .active
            .iter()
            .map(|(target, stage)| format!("{} ({})", target, stage))
            .collect();
        let mut msg = if running.is_empty() {
            "idle".to_string()
        } else {
            running.join(", ")
        };
        if self.failed > 0 {
            msg.push_str(&format!(" | {} failed", self.failed));
        }
        self.bar.set_message(msg);
    }

    /// Consume events until the sending side is dropped.
    pub async fn drive(mut self, mut rx: mpsc::UnboundedReceiver<ScanEvent>) {
        while let Some(event) = rx.recv().await {
            self.handle_event(&event);
        }
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}
