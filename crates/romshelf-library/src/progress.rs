//! Scan progress reporting and cooperative cancellation

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Pipeline phases of a scan session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Discovering,
    Grouping,
    RemovingDead,
    Scraping,
}

impl ScanPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanPhase::Discovering => "discovering",
            ScanPhase::Grouping => "grouping",
            ScanPhase::RemovingDead => "removing-dead",
            ScanPhase::Scraping => "scraping",
        }
    }
}

impl fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scan session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanState {
    #[default]
    Idle,
    Running {
        phase: ScanPhase,
        current: usize,
        total: usize,
    },
    Completed,
    Cancelled,
    Failed,
}

impl ScanState {
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            ScanState::Completed | ScanState::Cancelled | ScanState::Failed
        )
    }
}

/// Host-side progress display (dialog, progress bar, log)
pub trait ProgressReporter: Send + Sync {
    fn start_phase(&self, phase: ScanPhase, total: usize);

    fn advance(&self, index: usize, message: &str);

    /// Whether the user asked to stop (e.g. pressed "cancel" on a dialog)
    fn is_cancelled(&self) -> bool {
        false
    }

    fn end_phase(&self);
}

/// Reporter that only emits tracing events
#[derive(Debug, Default)]
pub struct TracingProgress;

impl ProgressReporter for TracingProgress {
    fn start_phase(&self, phase: ScanPhase, total: usize) {
        tracing::info!("Scan phase {} started ({} items)", phase, total);
    }

    fn advance(&self, index: usize, message: &str) {
        tracing::debug!("[{}] {}", index, message);
    }

    fn end_phase(&self) {
        tracing::debug!("Scan phase finished");
    }
}

/// Cloneable handle used to cancel a running scan from another task
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Tracks the state machine of one scan and forwards to the reporter
pub struct ProgressController {
    reporter: Arc<dyn ProgressReporter>,
    cancel: CancelHandle,
    state: Mutex<ScanState>,
}

impl ProgressController {
    pub fn new(reporter: Arc<dyn ProgressReporter>) -> Self {
        Self {
            reporter,
            cancel: CancelHandle::new(),
            state: Mutex::new(ScanState::Idle),
        }
    }

    fn state_mut(&self) -> MutexGuard<'_, ScanState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Current state
    pub fn state(&self) -> ScanState {
        *self.state_mut()
    }

    /// Handle the host keeps to cancel this scan
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled() || self.reporter.is_cancelled()
    }

    /// Prepare for a new run.
    ///
    /// After a finished run the state returns to `Idle` and the cancel flag
    /// is cleared. A cancel requested before the first run still applies.
    pub fn begin(&self) {
        let mut state = self.state_mut();
        if state.is_finished() {
            *state = ScanState::Idle;
            self.cancel.reset();
        }
    }

    pub fn start_phase(&self, phase: ScanPhase, total: usize) {
        *self.state_mut() = ScanState::Running {
            phase,
            current: 0,
            total,
        };
        self.reporter.start_phase(phase, total);
    }

    pub fn advance(&self, index: usize, message: &str) {
        if let ScanState::Running { current, .. } = &mut *self.state_mut() {
            *current = index;
        }
        self.reporter.advance(index, message);
    }

    pub fn end_phase(&self) {
        self.reporter.end_phase();
    }

    /// Move to a terminal state; a finished scan keeps its first outcome
    pub fn finish(&self, outcome: ScanState) {
        let mut state = self.state_mut();
        if !state.is_finished() {
            *state = outcome;
        }
    }
}
