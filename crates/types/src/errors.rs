use crate::round::RoundStatus;
use crate::scalars::{RoundId, Tokens};
use thiserror::Error;

/// Errors raised by the ledger store and pool engine.
///
/// Validation kinds (`InvalidAmount`, `InsufficientBalance`) are
/// user-correctable and surfaced verbatim by the calling layer.
/// `RoundClosed` is transient; callers retry against the new round.
/// Consistency guards (`AlreadyDistributed`, `InvalidTransition`,
/// `ConservationViolation`) indicate a retry or programming bug and are
/// handled internally, never shown to a user.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("burn amount must be a positive number of tokens")]
    InvalidAmount,

    #[error("insufficient balance: have {balance}, need {requested}")]
    InsufficientBalance { balance: Tokens, requested: Tokens },

    #[error("round {0} is not accepting burns")]
    RoundClosed(RoundId),

    #[error("round {0} has already been distributed")]
    AlreadyDistributed(RoundId),

    #[error("invalid round transition from {from:?} to {to:?}")]
    InvalidTransition { from: RoundStatus, to: RoundStatus },

    #[error("round {0} does not exist")]
    UnknownRound(RoundId),

    #[error("payout set does not conserve the round total: expected {expected}, got {actual}")]
    ConservationViolation { expected: Tokens, actual: Tokens },

    #[error("arithmetic overflow while {0}")]
    Overflow(&'static str),

    #[error("invalid pool parameter: {0}")]
    InvalidParameter(&'static str),

    #[error("storage error: {0}")]
    Storage(String),
}
