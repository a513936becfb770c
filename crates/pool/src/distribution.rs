//! Threshold-triggered payout distribution.
//!
//! State machine per round: `Accumulating -> Distributing -> Closed`.
//! The trigger is an atomic conditional update on the round record with a
//! single winner; payout computation is pure over the round's burn events,
//! so a crash before commit is retried safely and the ledger's idempotency
//! guard rejects double application.

use crate::rank::RankEngine;
use ember_ledger::{Contribution, LedgerStore};
use ember_types::{
    bps_of, mul_div_u64, CharityAllocation, Clock, Payout, PoolError, PoolParams, Round, RoundId,
    RoundStatus, TimeMicros, Tokens,
};
use std::cmp::Reverse;
use std::sync::Arc;
use tracing::{debug, info};

/// A computed, not-yet-committed distribution for one round.
#[derive(Clone, Debug)]
pub struct DistributionPlan {
    /// Round snapshot at `Distributing`
    pub round: Round,
    pub payouts: Vec<Payout>,
    pub charity: CharityAllocation,
}

/// Compute the payout set for a round.
///
/// Contributor pool = `contributor_bps` of the round total, split among
/// the top-K contributors proportionally to their share of ALL
/// contributions, truncating. The charity slice and every truncation
/// remainder (including the shares of contributors below the cutoff) are
/// accounted so that `sum(payouts) + charity == current_total` exactly:
/// the remainder is added to the top-ranked contributor's payout.
pub fn compute_payouts(
    round: &Round,
    contributions: &[Contribution],
    params: &PoolParams,
    now_us: TimeMicros,
) -> Result<(Vec<Payout>, CharityAllocation), PoolError> {
    let total = round.current_total;

    if contributions.is_empty() || total == 0 {
        // Nothing to split; the whole total (possibly zero) goes to
        // charity so the books still balance.
        return Ok((
            Vec::new(),
            CharityAllocation {
                round: round.id,
                amount: total,
                timestamp_us: now_us,
            },
        ));
    }

    let charity_amount = bps_of(total, params.charity_bps);
    let contributor_pool = total - charity_amount;

    // Rank order: amount desc, earliest last burn, user id
    let mut ranked: Vec<&Contribution> = contributions.iter().collect();
    ranked.sort_by_key(|c| (Reverse(c.total), c.last_burn_us, c.user));

    let mut payouts = Vec::with_capacity(params.top_k.min(ranked.len()));
    let mut distributed: Tokens = 0;
    for (i, c) in ranked.iter().take(params.top_k).enumerate() {
        let amount = mul_div_u64(contributor_pool, c.total, total)
            .ok_or(PoolError::Overflow("computing payout share"))?;
        let share_bps = mul_div_u64(c.total, 10_000, total).unwrap_or(0) as u16;
        distributed = distributed.saturating_add(amount);
        payouts.push(Payout {
            round: round.id,
            user: c.user,
            amount,
            share_bps,
            rank: (i + 1) as u32,
            timestamp_us: now_us,
        });
    }

    // Truncation remainder (and any below-cutoff share) rides on rank 1
    let remainder = contributor_pool - distributed;
    if let Some(top) = payouts.first_mut() {
        top.amount = top.amount.saturating_add(remainder);
    }

    Ok((
        payouts,
        CharityAllocation {
            round: round.id,
            amount: charity_amount,
            timestamp_us: now_us,
        },
    ))
}

/// Drives rounds through their distribution lifecycle.
pub struct DistributionEngine {
    ledger: Arc<dyn LedgerStore>,
    rank: Arc<RankEngine>,
    params: PoolParams,
    clock: Arc<dyn Clock>,
}

impl DistributionEngine {
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        rank: Arc<RankEngine>,
        params: PoolParams,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            ledger,
            rank,
            params,
            clock,
        }
    }

    /// Attempt the `Accumulating -> Distributing` transition and, on
    /// winning it, compute the distribution plan.
    ///
    /// Losing the race (or an unmet target) returns `Ok(None)`; callers
    /// decline silently rather than re-trigger.
    pub fn trigger_if_eligible(&self) -> Result<Option<DistributionPlan>, PoolError> {
        let active = self.ledger.active_round()?;
        if !self.ledger.try_begin_distribution(active.id)? {
            debug!(round = active.id, "distribution not triggered");
            return Ok(None);
        }
        Ok(Some(self.compute_plan(active.id)?))
    }

    /// Recompute the plan for a round already in `Distributing` (crash
    /// recovery path — derivable purely from burn events).
    pub fn compute_plan(&self, round_id: RoundId) -> Result<DistributionPlan, PoolError> {
        let round = self.ledger.round(round_id)?;
        if round.status != RoundStatus::Distributing {
            return Err(PoolError::InvalidTransition {
                from: round.status,
                to: RoundStatus::Distributing,
            });
        }
        let contributions = self.ledger.contributions(round_id)?;
        let (payouts, charity) =
            compute_payouts(&round, &contributions, &self.params, self.clock.now_us())?;
        Ok(DistributionPlan {
            round,
            payouts,
            charity,
        })
    }

    /// Commit a plan, carrying the closing round's target into the next.
    pub fn commit(&self, plan: &DistributionPlan) -> Result<(), PoolError> {
        self.commit_with_target(plan, plan.round.target_total)
    }

    /// Commit a plan, opening the next round at `next_target` (external
    /// policy hook).
    pub fn commit_with_target(
        &self,
        plan: &DistributionPlan,
        next_target: Tokens,
    ) -> Result<(), PoolError> {
        self.ledger.commit_payouts(
            plan.round.id,
            &plan.payouts,
            &plan.charity,
            next_target,
            self.clock.now_us(),
        )?;
        self.rank.reset();
        info!(
            round = plan.round.id,
            total = plan.round.current_total,
            payouts = plan.payouts.len(),
            charity = plan.charity.amount,
            "distribution committed"
        );
        Ok(())
    }

    /// Trigger and, if eligible, commit in one step.
    pub fn run_cycle(&self) -> Result<Option<DistributionPlan>, PoolError> {
        match self.trigger_if_eligible()? {
            Some(plan) => {
                self.commit(&plan)?;
                Ok(Some(plan))
            }
            None => Ok(None),
        }
    }
}
