//! Pool engine facade wiring the tracker, rank engine, distribution
//! engine, and stats facade over one ledger store.

use crate::distribution::{DistributionEngine, DistributionPlan};
use crate::rank::{RankEngine, RankedContributor};
use crate::stats::{PoolStats, PoolStatsFacade};
use crate::tracker::{ContributionReceipt, ContributionTracker};
use ember_ledger::LedgerStore;
use ember_types::{Clock, PoolError, PoolParams, TokenRef, Tokens, UserId};
use std::sync::Arc;
use tracing::info;

/// The application-facing surface of the token pool.
pub struct PoolEngine {
    ledger: Arc<dyn LedgerStore>,
    rank: Arc<RankEngine>,
    tracker: ContributionTracker,
    distribution: DistributionEngine,
    stats: PoolStatsFacade,
}

impl PoolEngine {
    /// Build an engine over an existing ledger. Validates parameters and
    /// rebuilds the rank index from the active round's contributions, so
    /// a restarted process resumes with correct standings.
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        params: PoolParams,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, PoolError> {
        params.validate()?;

        let rank = Arc::new(RankEngine::new(params.max_leaderboard));
        let active = ledger.active_round()?;
        rank.rebuild(&ledger.contributions(active.id)?);
        info!(
            round = active.id,
            total = active.current_total,
            target_total = active.target_total,
            "pool engine started"
        );

        Ok(Self {
            tracker: ContributionTracker::new(ledger.clone(), rank.clone(), clock.clone()),
            distribution: DistributionEngine::new(
                ledger.clone(),
                rank.clone(),
                params,
                clock.clone(),
            ),
            stats: PoolStatsFacade::new(ledger.clone(), clock),
            rank,
            ledger,
        })
    }

    /// Burn tokens into the active round. See `ContributionTracker`.
    pub fn contribute(
        &self,
        user: UserId,
        amount: Tokens,
        token_ref: &TokenRef,
    ) -> Result<ContributionReceipt, PoolError> {
        self.tracker.contribute(user, amount, token_ref)
    }

    /// Current 1-based rank; `None` without burns this round.
    pub fn get_rank(&self, user: UserId) -> Option<usize> {
        self.rank.get_rank(user)
    }

    /// Hypothetical rank after burning `additional` more tokens.
    pub fn projected_rank(&self, user: UserId, additional: Tokens) -> usize {
        self.rank.projected_rank(user, additional)
    }

    /// Leaderboard rows, bounded by the configured maximum.
    pub fn top_contributors(&self, limit: usize) -> Vec<RankedContributor> {
        self.rank.top_contributors(limit)
    }

    /// Read-model snapshot for presentation layers.
    pub fn pool_stats(&self) -> Result<PoolStats, PoolError> {
        self.stats.snapshot()
    }

    /// Administrative: attempt the distribution transition without
    /// committing. Returns the computed plan if this caller won.
    pub fn trigger_distribution_if_eligible(
        &self,
    ) -> Result<Option<DistributionPlan>, PoolError> {
        self.distribution.trigger_if_eligible()
    }

    /// Administrative: commit a computed plan (idempotency-guarded by the
    /// ledger).
    pub fn commit_payouts(&self, plan: &DistributionPlan) -> Result<(), PoolError> {
        self.distribution.commit(plan)
    }

    /// Trigger and commit in one step; `Ok(None)` when the pool has not
    /// reached its target or another caller already triggered.
    pub fn maybe_distribute(&self) -> Result<Option<DistributionPlan>, PoolError> {
        self.distribution.run_cycle()
    }

    /// The underlying ledger store (balance grants, audit queries).
    pub fn ledger(&self) -> Arc<dyn LedgerStore> {
        self.ledger.clone()
    }
}
