//! Distribution rounds and their status machine.
//!
//! Exactly one round is `Accumulating` at any time; the ledger store
//! enforces the transition order `Accumulating -> Distributing -> Closed`
//! with an atomic conditional update, never a process-wide flag.

use crate::errors::PoolError;
use crate::scalars::{RoundId, TimeMicros, Tokens};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundStatus {
    /// Accepting burns until the target total is reached
    Accumulating,
    /// Target reached; payouts being computed. Burns are rejected.
    Distributing,
    /// Payouts committed; immutable history
    Closed,
}

impl RoundStatus {
    /// Legal transitions: Accumulating -> Distributing -> Closed.
    pub fn can_transition_to(self, next: RoundStatus) -> bool {
        matches!(
            (self, next),
            (RoundStatus::Accumulating, RoundStatus::Distributing)
                | (RoundStatus::Distributing, RoundStatus::Closed)
        )
    }
}

/// One accumulation-to-distribution epoch of the pool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub id: RoundId,
    /// Pool size that triggers distribution
    pub target_total: Tokens,
    /// Running sum of this round's burn events
    pub current_total: Tokens,
    pub status: RoundStatus,
    pub opened_at_us: TimeMicros,
    pub closed_at_us: Option<TimeMicros>,
}

impl Round {
    /// Open a fresh accumulating round.
    pub fn open(id: RoundId, target_total: Tokens, opened_at_us: TimeMicros) -> Self {
        Self {
            id,
            target_total,
            current_total: 0,
            status: RoundStatus::Accumulating,
            opened_at_us,
            closed_at_us: None,
        }
    }

    /// Checked addition into the running total.
    pub fn accumulate(&mut self, amount: Tokens) -> Result<(), PoolError> {
        self.current_total = self
            .current_total
            .checked_add(amount)
            .ok_or(PoolError::Overflow("accumulating round total"))?;
        Ok(())
    }

    /// Progress toward the target, clamped to [0, 1].
    pub fn progress(&self) -> f64 {
        if self.target_total == 0 {
            return 1.0;
        }
        (self.current_total as f64 / self.target_total as f64).clamp(0.0, 1.0)
    }

    /// True once the running total has reached the target.
    pub fn target_reached(&self) -> bool {
        self.current_total >= self.target_total
    }
}
