//! Payout and charity records created when a round closes.

use crate::scalars::{RoundId, TimeMicros, Tokens, UserId};
use serde::{Deserialize, Serialize};

/// One contributor's payout for a closed round.
///
/// Created exactly once per (round, user) pair by the distribution engine;
/// the ledger's commit guard rejects duplicates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub round: RoundId,
    pub user: UserId,
    /// Tokens awarded, including any truncation remainder for rank 1
    pub amount: Tokens,
    /// Contribution share of the round total, in basis points
    pub share_bps: u16,
    /// Final rank at distribution time (1-based)
    pub rank: u32,
    pub timestamp_us: TimeMicros,
}

/// The fixed charity slice of a closed round. A single record per round,
/// written atomically with the round's payouts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharityAllocation {
    pub round: RoundId,
    pub amount: Tokens,
    pub timestamp_us: TimeMicros,
}

/// Sum of a payout set, widened so large sets cannot wrap.
pub fn payout_sum(payouts: &[Payout]) -> u128 {
    payouts.iter().map(|p| p.amount as u128).sum()
}
