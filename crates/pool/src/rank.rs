//! Contributor ranking.
//!
//! An incrementally maintained ordered index keyed by (amount descending,
//! last-burn timestamp ascending, user id ascending). First to reach an
//! amount wins the tie; the user-id leg only breaks exact
//! (amount, timestamp) collisions so the order is total.
//!
//! The index is a derived view, rebuildable from the ledger at any time —
//! never a second source of truth for totals.

use ember_ledger::Contribution;
use ember_types::{TimeMicros, Tokens, UserId};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct RankKey {
    amount: Reverse<Tokens>,
    last_burn_us: TimeMicros,
    user: UserId,
}

impl RankKey {
    fn new(amount: Tokens, last_burn_us: TimeMicros, user: UserId) -> Self {
        Self {
            amount: Reverse(amount),
            last_burn_us,
            user,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Standing {
    total: Tokens,
    last_burn_us: TimeMicros,
}

#[derive(Default)]
struct RankIndex {
    by_key: BTreeMap<RankKey, UserId>,
    standings: HashMap<UserId, Standing>,
}

/// One leaderboard row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedContributor {
    pub user: UserId,
    pub amount: Tokens,
    /// 1-based rank
    pub rank: usize,
}

/// Ordered view of the current round's contributors.
pub struct RankEngine {
    index: RwLock<RankIndex>,
    max_leaderboard: usize,
}

impl RankEngine {
    pub fn new(max_leaderboard: usize) -> Self {
        Self {
            index: RwLock::new(RankIndex::default()),
            max_leaderboard,
        }
    }

    /// Reindex a contributor after a committed burn and return their new
    /// 1-based rank.
    pub fn apply_burn(&self, user: UserId, new_total: Tokens, last_burn_us: TimeMicros) -> usize {
        let mut index = self.index.write();
        if let Some(old) = index.standings.get(&user).copied() {
            index
                .by_key
                .remove(&RankKey::new(old.total, old.last_burn_us, user));
        }
        let key = RankKey::new(new_total, last_burn_us, user);
        index.by_key.insert(key, user);
        index.standings.insert(
            user,
            Standing {
                total: new_total,
                last_burn_us,
            },
        );
        index.by_key.range(..key).count() + 1
    }

    /// Current 1-based rank; `None` if the user has no burns this round.
    pub fn get_rank(&self, user: UserId) -> Option<usize> {
        let index = self.index.read();
        let standing = index.standings.get(&user)?;
        let key = RankKey::new(standing.total, standing.last_burn_us, user);
        Some(index.by_key.range(..key).count() + 1)
    }

    /// Rank the user would occupy after immediately burning `additional`
    /// more tokens. Pure read: no state changes, stable across calls.
    ///
    /// The hypothetical burn would be the round's most recent, so it loses
    /// exact-total ties to contributors already at that amount.
    pub fn projected_rank(&self, user: UserId, additional: Tokens) -> usize {
        let index = self.index.read();
        let current = index
            .standings
            .get(&user)
            .map(|s| s.total)
            .unwrap_or(0);
        let hypothetical = RankKey::new(
            current.saturating_add(additional),
            TimeMicros::MAX,
            user,
        );
        let ahead = index
            .by_key
            .range(..hypothetical)
            .filter(|(_, ranked)| **ranked != user)
            .count();
        ahead + 1
    }

    /// Best-ranked contributors, at most `limit` rows. The limit is
    /// clamped to the configured maximum to bound the scan.
    pub fn top_contributors(&self, limit: usize) -> Vec<RankedContributor> {
        let limit = limit.min(self.max_leaderboard);
        self.index
            .read()
            .by_key
            .iter()
            .take(limit)
            .enumerate()
            .map(|(i, (key, user))| RankedContributor {
                user: *user,
                amount: key.amount.0,
                rank: i + 1,
            })
            .collect()
    }

    pub fn top_contributor(&self) -> Option<UserId> {
        self.index
            .read()
            .by_key
            .iter()
            .next()
            .map(|(_, user)| *user)
    }

    pub fn contributor_count(&self) -> usize {
        self.index.read().standings.len()
    }

    /// Rebuild the whole index from ledger contributions (engine start or
    /// round rollover).
    pub fn rebuild(&self, contributions: &[Contribution]) {
        let mut index = self.index.write();
        index.by_key.clear();
        index.standings.clear();
        for c in contributions {
            index
                .by_key
                .insert(RankKey::new(c.total, c.last_burn_us, c.user), c.user);
            index.standings.insert(
                c.user,
                Standing {
                    total: c.total,
                    last_burn_us: c.last_burn_us,
                },
            );
        }
        debug!(contributors = contributions.len(), "rank index rebuilt");
    }

    /// Drop all standings (new round opened).
    pub fn reset(&self) {
        let mut index = self.index.write();
        index.by_key.clear();
        index.standings.clear();
        debug!("rank index reset for new round");
    }
}
