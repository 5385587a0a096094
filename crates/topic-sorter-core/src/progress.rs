use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

/// Long-running phases that report progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Walk,
    Enrich,
    Train,
    Sort,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Walk => "walk",
            Phase::Enrich => "enrich",
            Phase::Train => "train",
            Phase::Sort => "sort",
        };
        f.write_str(name)
    }
}

/// Trait for reporting phase progress.
///
/// CLI implements with indicatif bars, tests use [`SilentReporter`].
/// All methods have default no-op implementations and may be called from a worker thread.
pub trait ProgressReporter: Send + Sync {
    fn on_phase_start(&self, _phase: Phase) {}
    fn on_progress(&self, _phase: Phase, _percent: u8) {}
    fn on_status(&self, _phase: Phase, _message: &str) {}
    fn on_phase_complete(&self, _phase: Phase, _duration_secs: f64) {}
    /// A started phase stopped early on a [`CancelToken`]; no completion follows.
    fn on_phase_cancelled(&self, _phase: Phase) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}

/// Forwards percentages to a reporter, dropping any value that would move backwards.
pub struct PercentGauge<'a> {
    reporter: &'a dyn ProgressReporter,
    phase: Phase,
    last: AtomicU8,
}

impl<'a> PercentGauge<'a> {
    pub fn new(reporter: &'a dyn ProgressReporter, phase: Phase) -> Self {
        Self {
            reporter,
            phase,
            last: AtomicU8::new(0),
        }
    }

    /// Report `done` out of `total` scaled into `floor..=ceil`.
    pub fn report_fraction(&self, done: usize, total: usize, floor: u8, ceil: u8) {
        let total = total.max(1);
        let span = ceil.saturating_sub(floor) as usize;
        let percent = floor as usize + (done.min(total) * span) / total;
        self.report(percent.min(100) as u8);
    }

    pub fn report(&self, percent: u8) {
        let percent = percent.min(100);
        let previous = self.last.fetch_max(percent, Ordering::SeqCst);
        if percent > previous {
            self.reporter.on_progress(self.phase, percent);
        }
    }

    pub fn start(&self) {
        self.reporter.on_progress(self.phase, 0);
    }

    pub fn current(&self) -> u8 {
        self.last.load(Ordering::SeqCst)
    }
}

/// Cooperative cancellation flag shared between the driver and a worker.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Clear the flag so the token can drive another run.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Result of a cancellable phase. Cancellation is not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Completed(T),
    Cancelled,
}

impl<T> Outcome<T> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled)
    }

    pub fn completed(self) -> Option<T> {
        match self {
            Outcome::Completed(value) => Some(value),
            Outcome::Cancelled => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U> {
        match self {
            Outcome::Completed(value) => Outcome::Completed(f(value)),
            Outcome::Cancelled => Outcome::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<u8>>,
    }

    impl ProgressReporter for Recorder {
        fn on_progress(&self, _phase: Phase, percent: u8) {
            self.seen.lock().unwrap().push(percent);
        }
    }

    #[test]
    fn test_gauge_never_goes_backwards() {
        let recorder = Recorder::default();
        let gauge = PercentGauge::new(&recorder, Phase::Sort);
        gauge.report(10);
        gauge.report(5);
        gauge.report(10);
        gauge.report(40);
        gauge.report(250);
        assert_eq!(*recorder.seen.lock().unwrap(), vec![10, 40, 100]);
    }

    #[test]
    fn test_gauge_scales_fraction_into_range() {
        let recorder = Recorder::default();
        let gauge = PercentGauge::new(&recorder, Phase::Enrich);
        gauge.report_fraction(1, 2, 50, 100);
        assert_eq!(gauge.current(), 75);
        gauge.report_fraction(0, 0, 0, 50);
        assert_eq!(gauge.current(), 75);
    }

    #[test]
    fn test_cancel_token_is_shared_between_clones() {
        let token = CancelToken::new();
        let worker = token.clone();
        assert!(!worker.is_cancelled());
        token.cancel();
        assert!(worker.is_cancelled());
        worker.reset();
        assert!(!token.is_cancelled());
    }
}
