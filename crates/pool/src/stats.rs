//! Read-only pool statistics for presentation layers.
//!
//! Aggregates over the ledger store; tolerates a brief staleness window
//! after a burn. The ledger remains the source of truth.

use ember_ledger::LedgerStore;
use ember_types::{Clock, PoolError, RoundId, Tokens, UserId, DAY_US};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Snapshot consumed by leaderboard and progress widgets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoolStats {
    pub round_id: RoundId,
    pub current_total: Tokens,
    pub target_total: Tokens,
    /// Progress toward the target, clamped to [0, 1]
    pub progress: f64,
    pub contributor_count: usize,
    /// Tokens burned across the pool in the last 24 hours
    pub today_burned: Tokens,
    pub top_contributor: Option<UserId>,
}

/// Pure read aggregation; no mutation capability.
pub struct PoolStatsFacade {
    ledger: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
}

impl PoolStatsFacade {
    pub fn new(ledger: Arc<dyn LedgerStore>, clock: Arc<dyn Clock>) -> Self {
        Self { ledger, clock }
    }

    pub fn snapshot(&self) -> Result<PoolStats, PoolError> {
        let round = self.ledger.active_round()?;
        let contributions = self.ledger.contributions(round.id)?;
        let since_us = self.clock.now_us().saturating_sub(DAY_US);
        let today_burned = self
            .ledger
            .events_since(since_us)?
            .iter()
            .fold(0u64, |acc, e| acc.saturating_add(e.amount));

        Ok(PoolStats {
            round_id: round.id,
            current_total: round.current_total,
            target_total: round.target_total,
            progress: round.progress(),
            contributor_count: contributions.len(),
            // Contributions arrive rank-ordered from the ledger
            top_contributor: contributions.first().map(|c| c.user),
            today_burned,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_ledger::MemoryLedger;
    use ember_types::{ManualClock, TokenRef};

    #[test]
    fn test_snapshot_aggregates() {
        let ledger = Arc::new(MemoryLedger::new(1000, 0));
        let clock = Arc::new(ManualClock::new(DAY_US * 2));
        ledger.credit_balance(UserId(1), 1_000).unwrap();
        ledger.credit_balance(UserId(2), 1_000).unwrap();

        // An old burn (outside the 24h window) and two recent ones
        ledger
            .record_burn(UserId(1), 100, &TokenRef::new("nft:a"), DAY_US / 2)
            .unwrap();
        ledger
            .record_burn(UserId(2), 300, &TokenRef::new("nft:b"), DAY_US + DAY_US / 2)
            .unwrap();
        ledger
            .record_burn(UserId(1), 150, &TokenRef::new("nft:c"), DAY_US * 2)
            .unwrap();

        let stats = PoolStatsFacade::new(ledger, clock).snapshot().unwrap();
        assert_eq!(stats.round_id, 1);
        assert_eq!(stats.current_total, 550);
        assert_eq!(stats.target_total, 1000);
        assert!((stats.progress - 0.55).abs() < 1e-9);
        assert_eq!(stats.contributor_count, 2);
        assert_eq!(stats.today_burned, 450);
        // User 2 leads: 300 vs 250
        assert_eq!(stats.top_contributor, Some(UserId(2)));
    }

    #[test]
    fn test_empty_pool_stats() {
        let ledger = Arc::new(MemoryLedger::new(1000, 0));
        let clock = Arc::new(ManualClock::new(0));
        let stats = PoolStatsFacade::new(ledger, clock).snapshot().unwrap();

        assert_eq!(stats.progress, 0.0);
        assert_eq!(stats.contributor_count, 0);
        assert_eq!(stats.today_burned, 0);
        assert_eq!(stats.top_contributor, None);
    }
}
