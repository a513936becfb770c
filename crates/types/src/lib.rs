//! Ember Pool core types
//!
//! Defines token scalars, user and round identifiers, burn events, payout
//! records, and the configurable pool parameters shared by the ledger and
//! pool engine crates.
//!
//! Monetary unit: whole collectible tokens (integer, no fractional burns).

pub mod burn;
pub mod clock;
pub mod errors;
pub mod math;
pub mod params;
pub mod payout;
pub mod round;
pub mod scalars;

pub use burn::*;
pub use clock::*;
pub use errors::*;
pub use math::*;
pub use params::*;
pub use payout::*;
pub use round::*;
pub use scalars::*;
