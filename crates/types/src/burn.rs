//! Burn events — the append-only facts of the pool ledger.

use crate::scalars::{RoundId, TimeMicros, TokenRef, Tokens, UserId};
use serde::{Deserialize, Serialize};

/// Deterministic burn-event identifier derived from the (round, user,
/// sequence) triple. Two ledgers replaying the same burns produce the same
/// ids.
pub fn burn_event_id(round: RoundId, user: UserId, seq: u64) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"ember:burn:v1");
    hasher.update(&round.to_le_bytes());
    hasher.update(&user.0.to_le_bytes());
    hasher.update(&seq.to_le_bytes());
    *hasher.finalize().as_bytes()
}

/// Immutable record of a single burn. Append-only; never mutated or
/// deleted. The sum of a round's events equals the round's current total.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnEvent {
    /// Deterministic identifier (see `burn_event_id`)
    pub id: [u8; 32],
    /// User who burned the tokens
    pub user: UserId,
    /// Tokens removed from the user's balance and added to the pool
    pub amount: Tokens,
    /// Collectible consumed by this burn
    pub token_ref: TokenRef,
    /// Ledger time of the burn
    pub timestamp_us: TimeMicros,
    /// Round the burn was credited to
    pub round: RoundId,
    /// Ledger-wide append sequence, strictly increasing
    pub seq: u64,
}

impl BurnEvent {
    pub fn new(
        round: RoundId,
        user: UserId,
        amount: Tokens,
        token_ref: TokenRef,
        timestamp_us: TimeMicros,
        seq: u64,
    ) -> Self {
        Self {
            id: burn_event_id(round, user, seq),
            user,
            amount,
            token_ref,
            timestamp_us,
            round,
            seq,
        }
    }

    /// Hex rendering of the event id for logs and APIs.
    pub fn id_hex(&self) -> String {
        hex::encode(self.id)
    }
}
