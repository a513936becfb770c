//! Scalar aliases and identifiers for the pool engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Token amount (whole collectible tokens)
pub type Tokens = u64;

/// Round index (monotonically increasing distribution epoch)
pub type RoundId = u64;

/// Microseconds since the Unix epoch
pub type TimeMicros = u64;

/// One day in microseconds, the window used for "today's burns" statistics
pub const DAY_US: TimeMicros = 24 * 60 * 60 * 1_000_000;

/// Application user identifier.
///
/// The surrounding application owns identity; this engine only needs a
/// stable, ordered key per user.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl UserId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user:{}", self.0)
    }
}

/// Reference to the collectible token/NFT consumed by a burn.
///
/// Opaque to the engine; the minting subsystem owns its format.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenRef(pub String);

impl TokenRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
