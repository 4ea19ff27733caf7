// Cross-run aggregate of test outcomes for one build

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::error::Result;
use crate::state::ResultKind;
use crate::time::{Clock, SystemClock};

/// Callback run once when the build finishes
pub type Finalizer = Box<dyn FnOnce(&GlobalCounter) -> Result<()> + Send>;

/// Totals read by the finalizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CounterSnapshot {
    pub success: u64,
    pub failure: u64,
    pub skipped: u64,
    pub elapsed_millis: i64,
}

impl CounterSnapshot {
    pub fn total(&self) -> u64 {
        self.success + self.failure + self.skipped
    }
}

/// Shared by every reporter attached within one build.
///
/// The first reporter to register owns the single finalizer; all of them
/// record results. Counts are plain atomics so recording never blocks.
pub struct GlobalCounter {
    success: AtomicU64,
    failure: AtomicU64,
    skipped: AtomicU64,
    start_time_millis: AtomicI64,
    hook_registered: AtomicBool,
    finalizer: Mutex<Option<Finalizer>>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for GlobalCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobalCounter")
            .field("success", &self.success.load(Ordering::Relaxed))
            .field("failure", &self.failure.load(Ordering::Relaxed))
            .field("skipped", &self.skipped.load(Ordering::Relaxed))
            .field("start_time_millis", &self.start_time_millis.load(Ordering::Relaxed))
            .field("hook_registered", &self.hook_registered.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for GlobalCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl GlobalCounter {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            success: AtomicU64::new(0),
            failure: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            start_time_millis: AtomicI64::new(0),
            hook_registered: AtomicBool::new(false),
            finalizer: Mutex::new(None),
            clock,
        }
    }

    /// Try to become the build's finalization owner.
    ///
    /// Exactly one caller per build cycle gets `true`. The winner only starts
    /// the build clock; counts are left alone since losers may already be
    /// recording. Counts from an aborted build are dropped with `reset`.
    pub fn register_once(&self, on_finalize: Finalizer) -> bool {
        if self
            .hook_registered
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        self.start_time_millis
            .store(self.clock.now_millis(), Ordering::Release);
        *self.lock_finalizer() = Some(on_finalize);
        debug!("registered build finalizer");
        true
    }

    pub fn record_result(&self, kind: ResultKind) {
        let counter = match kind {
            ResultKind::Success => &self.success,
            ResultKind::Failure => &self.failure,
            ResultKind::Skipped => &self.skipped,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Read the totals and elapsed time, then return to the initial state
    pub fn snapshot_and_reset(&self) -> CounterSnapshot {
        let start = self.start_time_millis.swap(0, Ordering::AcqRel);
        let snapshot = CounterSnapshot {
            success: self.success.swap(0, Ordering::AcqRel),
            failure: self.failure.swap(0, Ordering::AcqRel),
            skipped: self.skipped.swap(0, Ordering::AcqRel),
            elapsed_millis: self.clock.now_millis() - start,
        };
        self.hook_registered.store(false, Ordering::Release);
        snapshot
    }

    /// Build-finished notification from the host.
    ///
    /// Runs the stored finalizer, if any. Returns whether one ran.
    pub fn finish_build(&self) -> Result<bool> {
        let finalizer = self.lock_finalizer().take();
        match finalizer {
            Some(finalize) => {
                debug!("running build finalizer");
                finalize(self)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Drop all state, including a pending finalizer
    pub fn reset(&self) {
        self.lock_finalizer().take();
        self.clear_counts();
        self.start_time_millis.store(0, Ordering::Release);
        self.hook_registered.store(false, Ordering::Release);
    }

    pub fn is_registered(&self) -> bool {
        self.hook_registered.load(Ordering::Acquire)
    }

    pub fn success_count(&self) -> u64 {
        self.success.load(Ordering::Relaxed)
    }

    pub fn failure_count(&self) -> u64 {
        self.failure.load(Ordering::Relaxed)
    }

    pub fn skipped_count(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    fn clear_counts(&self) {
        self.success.store(0, Ordering::Relaxed);
        self.failure.store(0, Ordering::Relaxed);
        self.skipped.store(0, Ordering::Relaxed);
    }

    fn lock_finalizer(&self) -> std::sync::MutexGuard<'_, Option<Finalizer>> {
        self.finalizer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
