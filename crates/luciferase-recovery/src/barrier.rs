//! The in-flight operation barrier (§4.5 step 3, §4.7 External Balancer
//! contract, §5 "operation-pause wait").
//!
//! Shared between ordinary index operations and the recovery orchestrator:
//! `try_begin_operation` gates new work while paused, and `pause_and_wait`
//! blocks until every operation that started before the pause has finished.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use luciferase_error::{LuciferaseError, Result};
use parking_lot::{Condvar, Mutex};

/// Counts in-flight operations and gates new ones while paused. Idempotent
/// on repeated `pause`/`resume` calls, per §4.7.
#[derive(Default)]
pub struct OperationBarrier {
    paused: AtomicBool,
    in_flight: AtomicU64,
    quiescent: Mutex<()>,
    condvar: Condvar,
}

/// RAII guard returned by a successful [`OperationBarrier::try_begin_operation`]
/// call; decrements the in-flight counter and wakes any waiter on drop.
pub struct OperationGuard<'a> {
    barrier: &'a OperationBarrier,
}

impl Drop for OperationGuard<'_> {
    fn drop(&mut self) {
        self.barrier.end_operation();
    }
}

impl OperationBarrier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the start of an operation. Returns `None` while paused.
    #[must_use]
    pub fn try_begin_operation(&self) -> Option<OperationGuard<'_>> {
        if self.paused.load(Ordering::SeqCst) {
            return None;
        }
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        // Re-check: a pause that landed between the load above and the
        // increment must still be honored, so operations racing a pause
        // don't slip through uncounted.
        if self.paused.load(Ordering::SeqCst) {
            self.end_operation();
            return None;
        }
        Some(OperationGuard { barrier: self })
    }

    fn end_operation(&self) {
        let previous = self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if previous == 1 {
            let _guard = self.quiescent.lock();
            self.condvar.notify_all();
        }
    }

    /// Block new operations and wait up to `timeout` for the in-flight count
    /// to reach zero.
    ///
    /// # Errors
    /// Returns [`LuciferaseError::BarrierTimeout`] if operations are still
    /// in flight once `timeout` elapses.
    pub fn pause_and_wait(&self, timeout: Duration) -> Result<()> {
        self.paused.store(true, Ordering::SeqCst);
        let deadline = Instant::now() + timeout;
        let mut guard = self.quiescent.lock();
        while self.in_flight.load(Ordering::SeqCst) > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(LuciferaseError::BarrierTimeout {
                    waited_ms: timeout.as_millis() as u64,
                    limit_ms: timeout.as_millis() as u64,
                });
            }
            let result = self.condvar.wait_for(&mut guard, remaining);
            if result.timed_out() && self.in_flight.load(Ordering::SeqCst) > 0 {
                return Err(LuciferaseError::BarrierTimeout {
                    waited_ms: timeout.as_millis() as u64,
                    limit_ms: timeout.as_millis() as u64,
                });
            }
        }
        Ok(())
    }

    /// Unblock new operations. Idempotent if already resumed.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn in_flight_count(&self) -> u64 {
        self.in_flight.load(Ordering::SeqCst)
    }
}
