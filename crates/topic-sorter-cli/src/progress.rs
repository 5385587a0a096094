use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use topic_sorter_core::progress::Phase;
use topic_sorter_core::ProgressReporter;

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// CLI progress reporter using indicatif bars.
///
/// The walk gets a spinner since the file count is unknown upfront; every other phase
/// reports a percentage.
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<ProgressBar>> {
        self.bar.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_bar(&self, pb: ProgressBar) {
        let mut guard = self.lock();
        if let Some(old) = guard.take() {
            old.finish_and_clear();
        }
        *guard = Some(pb);
    }

    fn finish_bar(&self) {
        if let Some(pb) = self.lock().take() {
            pb.finish_and_clear();
        }
    }
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars(TICK_CHARS);
    pb.set_style(style);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn percent_bar(phase: Phase) -> ProgressBar {
    let pb = ProgressBar::new(100);
    let style = ProgressStyle::with_template("  {spinner:.cyan} {prefix} [{bar:30.cyan/dim}] {pos}% {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━╸─")
        .tick_chars(TICK_CHARS);
    pb.set_style(style);
    pb.set_prefix(label(phase));
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn label(phase: Phase) -> &'static str {
    match phase {
        Phase::Walk => "Scanning",
        Phase::Enrich => "Enriching",
        Phase::Train => "Training",
        Phase::Sort => "Sorting",
    }
}

impl ProgressReporter for CliReporter {
    fn on_phase_start(&self, phase: Phase) {
        let pb = match phase {
            Phase::Walk => spinner("Scanning files...".to_string()),
            _ => percent_bar(phase),
        };
        self.set_bar(pb);
    }

    fn on_progress(&self, _phase: Phase, percent: u8) {
        if let Some(pb) = self.lock().as_ref() {
            pb.set_position(u64::from(percent));
        }
    }

    fn on_status(&self, _phase: Phase, message: &str) {
        if let Some(pb) = self.lock().as_ref() {
            pb.set_message(message.to_string());
        }
    }

    fn on_phase_complete(&self, phase: Phase, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  {} {} complete in {:.2}s",
            "✓".green(),
            label(phase),
            duration_secs
        );
    }

    fn on_phase_cancelled(&self, phase: Phase) {
        self.finish_bar();
        eprintln!("  {} {} cancelled", "✗".yellow(), label(phase));
    }
}
