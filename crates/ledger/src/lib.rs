//! Ember Pool ledger store
//!
//! Durable, transactional record of per-user token balances, burn events,
//! rounds, and payouts. All other pool components read and write through
//! this crate.
//!
//! ## Key invariants
//! - A burn decrements the balance, appends the event, and bumps the round
//!   total as one atomic mutation; no partial state is observable.
//! - The sum of a round's burn events equals the round's current total.
//! - Exactly one round is `Accumulating` at any time.
//! - `Accumulating -> Distributing` is a compare-and-swap with a single
//!   winner; `commit_payouts` applies at most once per round.

pub mod memory;
pub mod mock;
pub mod sled_store;

pub use memory::MemoryLedger;
pub use mock::MockLedger;
pub use sled_store::SledLedger;

use ember_types::{
    BurnEvent, CharityAllocation, Payout, PoolError, Round, RoundId, TimeMicros, TokenRef, Tokens,
    UserId,
};
use serde::{Deserialize, Serialize};

/// Per-user cumulative contribution within one round. The rank engine's
/// rebuild feed; derived from burn events, never a second source of truth.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contribution {
    pub user: UserId,
    /// Cumulative tokens burned this round
    pub total: Tokens,
    /// Timestamp of the user's latest burn this round
    pub last_burn_us: TimeMicros,
    /// Number of burns this round
    pub burns: u32,
}

/// Interface to the pool's persisted state.
///
/// Errors carry the exact kind (`PoolError`); implementations never
/// translate one kind into another.
pub trait LedgerStore: Send + Sync {
    /// Record a burn against the active round.
    ///
    /// Fails with `InvalidAmount` for a zero amount, `InsufficientBalance`
    /// if the user's redeemable balance is short, and `RoundClosed` if the
    /// active round is not accumulating. On success the balance decrement,
    /// event append, and round-total increment are applied atomically.
    fn record_burn(
        &self,
        user: UserId,
        amount: Tokens,
        token_ref: &TokenRef,
        now_us: TimeMicros,
    ) -> Result<BurnEvent, PoolError>;

    /// Credit spendable tokens to a user (token grants and payouts).
    /// Returns the new balance.
    fn credit_balance(&self, user: UserId, amount: Tokens) -> Result<Tokens, PoolError>;

    /// A user's current spendable balance (zero if unknown).
    fn balance_of(&self, user: UserId) -> Tokens;

    /// Snapshot of the round currently accepting burns.
    fn active_round(&self) -> Result<Round, PoolError>;

    /// Snapshot of any round, open or closed.
    fn round(&self, round: RoundId) -> Result<Round, PoolError>;

    /// Running total for a round; always consistent with its events.
    fn round_total(&self, round: RoundId) -> Result<Tokens, PoolError>;

    /// All burn events of a round, in append order.
    fn burn_events(&self, round: RoundId) -> Result<Vec<BurnEvent>, PoolError>;

    /// All burn events at or after `since_us`, across rounds.
    fn events_since(&self, since_us: TimeMicros) -> Result<Vec<BurnEvent>, PoolError>;

    /// Per-user cumulative contributions for a round.
    fn contributions(&self, round: RoundId) -> Result<Vec<Contribution>, PoolError>;

    /// A single user's contribution in a round, if any.
    fn contribution_of(
        &self,
        round: RoundId,
        user: UserId,
    ) -> Result<Option<Contribution>, PoolError>;

    /// Atomic conditional transition `Accumulating -> Distributing`.
    ///
    /// Returns `Ok(true)` to exactly one caller once the round total has
    /// reached the target; every other caller (late, concurrent, or below
    /// target) observes `Ok(false)` and must not re-trigger.
    fn try_begin_distribution(&self, round: RoundId) -> Result<bool, PoolError>;

    /// Write a round's payouts and charity record, close the round, and
    /// open the next one — all in one transaction.
    ///
    /// Fails with `AlreadyDistributed` if payouts exist for the round
    /// (idempotency guard) and `InvalidTransition` unless the round is
    /// `Distributing`. The payout sum plus charity must equal the round
    /// total exactly.
    fn commit_payouts(
        &self,
        round: RoundId,
        payouts: &[Payout],
        charity: &CharityAllocation,
        next_target: Tokens,
        now_us: TimeMicros,
    ) -> Result<(), PoolError>;

    /// Payouts of a closed round, empty if none committed.
    fn payouts(&self, round: RoundId) -> Result<Vec<Payout>, PoolError>;

    /// Charity allocation of a closed round.
    fn charity_allocation(&self, round: RoundId)
        -> Result<Option<CharityAllocation>, PoolError>;
}

/// Shared commit-time conservation check: payouts + charity must equal the
/// round's current total exactly.
pub(crate) fn check_conservation(
    round: &Round,
    payouts: &[Payout],
    charity: &CharityAllocation,
) -> Result<(), PoolError> {
    let paid = ember_types::payout_sum(payouts) + charity.amount as u128;
    if paid != round.current_total as u128 {
        return Err(PoolError::ConservationViolation {
            expected: round.current_total,
            actual: paid.min(u64::MAX as u128) as Tokens,
        });
    }
    Ok(())
}
