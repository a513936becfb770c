//! In-memory reference ledger.
//!
//! A single `RwLock` over the whole ledger state serializes every
//! round-total mutation, which is what makes the burn path atomic and the
//! distribution trigger a true compare-and-swap.

use crate::{check_conservation, Contribution, LedgerStore};
use ember_types::{
    BurnEvent, CharityAllocation, Payout, PoolError, Round, RoundId, RoundStatus, TimeMicros,
    TokenRef, Tokens, UserId,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, error, info};

#[derive(Debug, Default)]
struct LedgerState {
    balances: HashMap<UserId, Tokens>,
    /// Append-only, across all rounds
    events: Vec<BurnEvent>,
    rounds: HashMap<RoundId, Round>,
    active_round: RoundId,
    payouts: HashMap<RoundId, Vec<Payout>>,
    charity: HashMap<RoundId, CharityAllocation>,
    burn_seq: u64,
}

/// Reference `LedgerStore` backed by process memory. Used directly in
/// tests and as the semantics baseline the sled implementation must match.
#[derive(Debug)]
pub struct MemoryLedger {
    state: RwLock<LedgerState>,
}

impl MemoryLedger {
    /// Create a ledger with round 1 open at the given target.
    pub fn new(target_total: Tokens, opened_at_us: TimeMicros) -> Self {
        let first = Round::open(1, target_total, opened_at_us);
        let mut rounds = HashMap::new();
        rounds.insert(first.id, first);
        Self {
            state: RwLock::new(LedgerState {
                active_round: 1,
                rounds,
                ..Default::default()
            }),
        }
    }
}

pub(crate) fn fold_contributions(events: &[BurnEvent], round: RoundId) -> Vec<Contribution> {
    let mut map: HashMap<UserId, Contribution> = HashMap::new();
    for event in events.iter().filter(|e| e.round == round) {
        let entry = map.entry(event.user).or_insert(Contribution {
            user: event.user,
            total: 0,
            last_burn_us: 0,
            burns: 0,
        });
        entry.total = entry.total.saturating_add(event.amount);
        entry.last_burn_us = entry.last_burn_us.max(event.timestamp_us);
        entry.burns += 1;
    }
    let mut contributions: Vec<Contribution> = map.into_values().collect();
    contributions.sort_by_key(|c| (std::cmp::Reverse(c.total), c.last_burn_us, c.user));
    contributions
}

impl LedgerStore for MemoryLedger {
    fn record_burn(
        &self,
        user: UserId,
        amount: Tokens,
        token_ref: &TokenRef,
        now_us: TimeMicros,
    ) -> Result<BurnEvent, PoolError> {
        if amount == 0 {
            return Err(PoolError::InvalidAmount);
        }
        let mut state = self.state.write();
        let round_id = state.active_round;
        let round = state
            .rounds
            .get(&round_id)
            .ok_or(PoolError::UnknownRound(round_id))?;
        if round.status != RoundStatus::Accumulating {
            return Err(PoolError::RoundClosed(round_id));
        }
        let new_total = round
            .current_total
            .checked_add(amount)
            .ok_or(PoolError::Overflow("accumulating round total"))?;
        let balance = state.balances.get(&user).copied().unwrap_or(0);
        if balance < amount {
            return Err(PoolError::InsufficientBalance {
                balance,
                requested: amount,
            });
        }

        // Every guard passed; the three mutations below happen under the
        // held write lock, so readers see all of them or none.
        let seq = state.burn_seq;
        state.burn_seq += 1;
        let event = BurnEvent::new(round_id, user, amount, token_ref.clone(), now_us, seq);
        state.balances.insert(user, balance - amount);
        if let Some(round) = state.rounds.get_mut(&round_id) {
            round.current_total = new_total;
        }
        state.events.push(event.clone());

        debug!(
            user = %user,
            amount,
            round = round_id,
            round_total = new_total,
            event = %event.id_hex(),
            "burn recorded"
        );
        Ok(event)
    }

    fn credit_balance(&self, user: UserId, amount: Tokens) -> Result<Tokens, PoolError> {
        let mut state = self.state.write();
        let balance = state.balances.get(&user).copied().unwrap_or(0);
        let new_balance = balance
            .checked_add(amount)
            .ok_or(PoolError::Overflow("crediting balance"))?;
        state.balances.insert(user, new_balance);
        Ok(new_balance)
    }

    fn balance_of(&self, user: UserId) -> Tokens {
        self.state.read().balances.get(&user).copied().unwrap_or(0)
    }

    fn active_round(&self) -> Result<Round, PoolError> {
        let state = self.state.read();
        state
            .rounds
            .get(&state.active_round)
            .cloned()
            .ok_or(PoolError::UnknownRound(state.active_round))
    }

    fn round(&self, round: RoundId) -> Result<Round, PoolError> {
        self.state
            .read()
            .rounds
            .get(&round)
            .cloned()
            .ok_or(PoolError::UnknownRound(round))
    }

    fn round_total(&self, round: RoundId) -> Result<Tokens, PoolError> {
        Ok(self.round(round)?.current_total)
    }

    fn burn_events(&self, round: RoundId) -> Result<Vec<BurnEvent>, PoolError> {
        Ok(self
            .state
            .read()
            .events
            .iter()
            .filter(|e| e.round == round)
            .cloned()
            .collect())
    }

    fn events_since(&self, since_us: TimeMicros) -> Result<Vec<BurnEvent>, PoolError> {
        Ok(self
            .state
            .read()
            .events
            .iter()
            .filter(|e| e.timestamp_us >= since_us)
            .cloned()
            .collect())
    }

    fn contributions(&self, round: RoundId) -> Result<Vec<Contribution>, PoolError> {
        Ok(fold_contributions(&self.state.read().events, round))
    }

    fn contribution_of(
        &self,
        round: RoundId,
        user: UserId,
    ) -> Result<Option<Contribution>, PoolError> {
        Ok(fold_contributions(&self.state.read().events, round)
            .into_iter()
            .find(|c| c.user == user))
    }

    fn try_begin_distribution(&self, round_id: RoundId) -> Result<bool, PoolError> {
        let mut state = self.state.write();
        let round = state
            .rounds
            .get_mut(&round_id)
            .ok_or(PoolError::UnknownRound(round_id))?;
        if round.status != RoundStatus::Accumulating {
            debug!(round = round_id, status = ?round.status, "distribution trigger declined");
            return Ok(false);
        }
        if !round.target_reached() {
            return Ok(false);
        }
        round.status = RoundStatus::Distributing;
        info!(
            round = round_id,
            total = round.current_total,
            target_total = round.target_total,
            "round entered distribution"
        );
        Ok(true)
    }

    fn commit_payouts(
        &self,
        round_id: RoundId,
        payouts: &[Payout],
        charity: &CharityAllocation,
        next_target: Tokens,
        now_us: TimeMicros,
    ) -> Result<(), PoolError> {
        let mut state = self.state.write();
        if state.payouts.contains_key(&round_id) {
            error!(round = round_id, "duplicate payout commit rejected");
            return Err(PoolError::AlreadyDistributed(round_id));
        }
        let round = state
            .rounds
            .get(&round_id)
            .ok_or(PoolError::UnknownRound(round_id))?;
        if round.status != RoundStatus::Distributing {
            return Err(PoolError::InvalidTransition {
                from: round.status,
                to: RoundStatus::Closed,
            });
        }
        check_conservation(round, payouts, charity)?;

        for payout in payouts {
            let balance = state.balances.get(&payout.user).copied().unwrap_or(0);
            state
                .balances
                .insert(payout.user, balance.saturating_add(payout.amount));
        }
        if let Some(round) = state.rounds.get_mut(&round_id) {
            round.status = RoundStatus::Closed;
            round.closed_at_us = Some(now_us);
        }
        state.payouts.insert(round_id, payouts.to_vec());
        state.charity.insert(round_id, charity.clone());

        let next = Round::open(round_id + 1, next_target, now_us);
        state.active_round = next.id;
        state.rounds.insert(next.id, next);

        info!(
            round = round_id,
            payouts = payouts.len(),
            charity = charity.amount,
            next_round = round_id + 1,
            next_target,
            "payouts committed, round closed"
        );
        Ok(())
    }

    fn payouts(&self, round: RoundId) -> Result<Vec<Payout>, PoolError> {
        Ok(self
            .state
            .read()
            .payouts
            .get(&round)
            .cloned()
            .unwrap_or_default())
    }

    fn charity_allocation(
        &self,
        round: RoundId,
    ) -> Result<Option<CharityAllocation>, PoolError> {
        Ok(self.state.read().charity.get(&round).cloned())
    }
}
