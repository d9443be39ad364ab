//! Injectable monotonic clock (§4.4, §5, §9 "runtime reflection" redesign
//! note).
//!
//! The fault detector, recovery orchestrator and butterfly balance protocol
//! all reason about elapsed milliseconds. Rather than calling
//! `Instant::now()` directly, every clock-consuming component is handed a
//! `Arc<dyn TimeSource>`: production code gets [`SystemTimeSource`], tests
//! get [`ManualTimeSource`] and drive it tick-by-tick.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// A source of monotonic milliseconds since some arbitrary epoch.
///
/// Implementations must be monotonic (never go backwards) but need not
/// track wall-clock time.
pub trait TimeSource: Send + Sync + std::fmt::Debug {
    /// Milliseconds elapsed since the source was created.
    fn now_ms(&self) -> u64;
}

/// Real clock backed by `std::time::Instant`.
#[derive(Debug)]
pub struct SystemTimeSource {
    start: Instant,
}

impl SystemTimeSource {
    #[must_use]
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Shared handle suitable for passing to multiple components.
    #[must_use]
    pub fn shared() -> Arc<dyn TimeSource> {
        Arc::new(Self::new())
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTimeSource {
    fn now_ms(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Manually-advanced clock for deterministic tests. Starts at zero and only
/// moves when [`ManualTimeSource::advance`] or
/// [`ManualTimeSource::set`] is called.
#[derive(Debug, Default)]
pub struct ManualTimeSource {
    millis: AtomicU64,
}

impl ManualTimeSource {
    #[must_use]
    pub fn new() -> Self {
        Self {
            millis: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Advance the clock forward by `delta_ms` and return the new value.
    pub fn advance(&self, delta_ms: u64) -> u64 {
        self.millis.fetch_add(delta_ms, Ordering::SeqCst) + delta_ms
    }

    /// Jump directly to an absolute time. Panics in debug builds if this
    /// would move the clock backwards, since that would violate the
    /// monotonicity contract every caller relies on.
    pub fn set(&self, absolute_ms: u64) {
        let previous = self.millis.swap(absolute_ms, Ordering::SeqCst);
        debug_assert!(
            absolute_ms >= previous,
            "ManualTimeSource must not move backwards"
        );
    }
}

impl TimeSource for ManualTimeSource {
    fn now_ms(&self) -> u64 {
        self.millis.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_time_source_advances_monotonically() {
        let clock = ManualTimeSource::new();
        assert_eq!(clock.now_ms(), 0);
        assert_eq!(clock.advance(100), 100);
        assert_eq!(clock.now_ms(), 100);
        clock.set(500);
        assert_eq!(clock.now_ms(), 500);
    }
}
