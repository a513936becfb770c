//! Time source abstraction.
//!
//! The engine reads time through a `Clock` so that ledger and ranking
//! behavior stays deterministic under test. Production code uses
//! `SystemClock`; tests drive a `ManualClock`.

use crate::scalars::TimeMicros;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Monotonic-enough microsecond time source.
pub trait Clock: Send + Sync {
    fn now_us(&self) -> TimeMicros;
}

/// Wall-clock time in microseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_us(&self) -> TimeMicros {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as u64)
            .unwrap_or(0)
    }
}

/// Settable clock for deterministic tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start_us: TimeMicros) -> Self {
        Self {
            now: AtomicU64::new(start_us),
        }
    }

    pub fn set(&self, now_us: TimeMicros) {
        self.now.store(now_us, Ordering::SeqCst);
    }

    /// Advance the clock, returning the new time.
    pub fn advance(&self, delta_us: TimeMicros) -> TimeMicros {
        self.now.fetch_add(delta_us, Ordering::SeqCst) + delta_us
    }
}

impl Clock for ManualClock {
    fn now_us(&self) -> TimeMicros {
        self.now.load(Ordering::SeqCst)
    }
}
