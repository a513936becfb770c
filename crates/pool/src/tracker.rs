//! Contribution tracking — the front door for burns.

use crate::rank::RankEngine;
use ember_ledger::LedgerStore;
use ember_types::{BurnEvent, Clock, PoolError, TokenRef, Tokens, UserId};
use std::sync::Arc;
use tracing::debug;

/// Result of a successful contribution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContributionReceipt {
    pub event: BurnEvent,
    /// Cumulative tokens the user has burned this round
    pub new_total: Tokens,
    /// 1-based rank after this burn
    pub new_rank: usize,
}

/// Validates and records burns, keeping the rank index causally ordered
/// behind the ledger: a user's own `get_rank` call after a contribution
/// sees their just-committed burn.
pub struct ContributionTracker {
    ledger: Arc<dyn LedgerStore>,
    rank: Arc<RankEngine>,
    clock: Arc<dyn Clock>,
}

impl ContributionTracker {
    pub fn new(ledger: Arc<dyn LedgerStore>, rank: Arc<RankEngine>, clock: Arc<dyn Clock>) -> Self {
        Self {
            ledger,
            rank,
            clock,
        }
    }

    /// Burn `amount` tokens from `user` into the active round.
    ///
    /// Ledger failures (`InvalidAmount`, `InsufficientBalance`,
    /// `RoundClosed`) propagate unchanged; on any failure the user's
    /// balance and the pool total are untouched.
    pub fn contribute(
        &self,
        user: UserId,
        amount: Tokens,
        token_ref: &TokenRef,
    ) -> Result<ContributionReceipt, PoolError> {
        let now_us = self.clock.now_us();
        let event = self.ledger.record_burn(user, amount, token_ref, now_us)?;

        let standing = self
            .ledger
            .contribution_of(event.round, user)?
            .ok_or_else(|| PoolError::Storage("committed burn missing from contributions".into()))?;
        let new_rank = self
            .rank
            .apply_burn(user, standing.total, standing.last_burn_us);

        debug!(
            user = %user,
            amount,
            round = event.round,
            new_total = standing.total,
            new_rank,
            "contribution accepted"
        );
        Ok(ContributionReceipt {
            event,
            new_total: standing.total,
            new_rank,
        })
    }
}
