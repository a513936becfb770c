//! Ember Pool engine
//!
//! The contribution and distribution core of the token pool: users burn
//! collectible tokens into a shared round, accrue a rank by cumulative
//! contribution, and when the round total reaches its target the pool is
//! split between the top contributors (85%) and a fixed charity
//! allocation (15%).
//!
//! ## Key invariants
//! - Conservation: a round's total always equals the sum of its burn
//!   events, and after close `sum(payouts) + charity == total` exactly.
//! - Exactly one caller wins the `Accumulating -> Distributing`
//!   transition; payouts commit at most once per round.
//! - Payout computation is pure and re-derivable from burn events, so a
//!   crash between trigger and commit is retried safely.

pub mod distribution;
pub mod engine;
pub mod rank;
pub mod stats;
pub mod tracker;

pub use distribution::{compute_payouts, DistributionEngine, DistributionPlan};
pub use engine::PoolEngine;
pub use rank::{RankEngine, RankedContributor};
pub use stats::{PoolStats, PoolStatsFacade};
pub use tracker::{ContributionReceipt, ContributionTracker};
