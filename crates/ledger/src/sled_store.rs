//! Sled-backed durable ledger.
//!
//! One tree per record family, values JSON-encoded. A ledger-wide `RwLock`
//! guards multi-tree mutations so the burn path keeps the same atomicity
//! the in-memory ledger gets from its state lock: writers hold the write
//! guard across all tree updates, readers take the read guard.

use crate::memory::fold_contributions;
use crate::{check_conservation, Contribution, LedgerStore};
use ember_types::{
    BurnEvent, CharityAllocation, Payout, PoolError, Round, RoundId, RoundStatus, TimeMicros,
    TokenRef, Tokens, UserId,
};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::{Db, Tree};
use std::path::Path;
use tracing::{debug, error, info};

const ACTIVE_ROUND_KEY: &[u8] = b"active_round";
const BURN_SEQ_KEY: &[u8] = b"burn_seq";

fn storage<E: std::fmt::Display>(err: E) -> PoolError {
    PoolError::Storage(err.to_string())
}

fn get_json<T: DeserializeOwned>(tree: &Tree, key: &[u8]) -> Result<Option<T>, PoolError> {
    match tree.get(key).map_err(storage)? {
        Some(raw) => Ok(Some(serde_json::from_slice(&raw).map_err(storage)?)),
        None => Ok(None),
    }
}

fn put_json<T: Serialize>(tree: &Tree, key: &[u8], value: &T) -> Result<(), PoolError> {
    let raw = serde_json::to_vec(value).map_err(storage)?;
    tree.insert(key, raw).map_err(storage)?;
    Ok(())
}

/// Durable `LedgerStore` for a single application node.
pub struct SledLedger {
    db: Db,
    balances: Tree,
    events: Tree,
    rounds: Tree,
    payouts: Tree,
    charity: Tree,
    meta: Tree,
    guard: RwLock<()>,
}

impl SledLedger {
    /// Open (or initialize) a ledger at `path`. A fresh database gets
    /// round 1 opened at `initial_target`.
    pub fn open<P: AsRef<Path>>(
        path: P,
        initial_target: Tokens,
        now_us: TimeMicros,
    ) -> Result<Self, PoolError> {
        let db = sled::open(path).map_err(storage)?;
        let ledger = Self {
            balances: db.open_tree("balances").map_err(storage)?,
            events: db.open_tree("burn_events").map_err(storage)?,
            rounds: db.open_tree("rounds").map_err(storage)?,
            payouts: db.open_tree("payouts").map_err(storage)?,
            charity: db.open_tree("charity").map_err(storage)?,
            meta: db.open_tree("meta").map_err(storage)?,
            guard: RwLock::new(()),
            db,
        };

        if ledger.meta_u64(ACTIVE_ROUND_KEY)?.is_none() {
            let first = Round::open(1, initial_target, now_us);
            ledger.put_round(&first)?;
            ledger.put_meta_u64(ACTIVE_ROUND_KEY, first.id)?;
            ledger.put_meta_u64(BURN_SEQ_KEY, 0)?;
            info!(target_total = initial_target, "initialized fresh pool ledger");
        }
        Ok(ledger)
    }

    /// Flush pending writes to disk.
    pub fn flush(&self) -> Result<(), PoolError> {
        self.db.flush().map_err(storage)?;
        Ok(())
    }

    fn meta_u64(&self, key: &[u8]) -> Result<Option<u64>, PoolError> {
        match self.meta.get(key).map_err(storage)? {
            Some(raw) => {
                let bytes: [u8; 8] = raw
                    .as_ref()
                    .try_into()
                    .map_err(|_| PoolError::Storage("corrupt meta entry".into()))?;
                Ok(Some(u64::from_be_bytes(bytes)))
            }
            None => Ok(None),
        }
    }

    fn put_meta_u64(&self, key: &[u8], value: u64) -> Result<(), PoolError> {
        self.meta
            .insert(key, &value.to_be_bytes())
            .map_err(storage)?;
        Ok(())
    }

    fn active_round_id(&self) -> Result<RoundId, PoolError> {
        self.meta_u64(ACTIVE_ROUND_KEY)?
            .ok_or_else(|| PoolError::Storage("ledger missing active round".into()))
    }

    fn get_round(&self, round: RoundId) -> Result<Round, PoolError> {
        get_json(&self.rounds, &round.to_be_bytes())?.ok_or(PoolError::UnknownRound(round))
    }

    fn put_round(&self, round: &Round) -> Result<(), PoolError> {
        put_json(&self.rounds, &round.id.to_be_bytes(), round)
    }

    fn all_events(&self) -> Result<Vec<BurnEvent>, PoolError> {
        // Keys are big-endian sequence numbers, so iteration is append order
        let mut events = Vec::new();
        for item in self.events.iter() {
            let (_, raw) = item.map_err(storage)?;
            events.push(serde_json::from_slice(&raw).map_err(storage)?);
        }
        Ok(events)
    }

    fn read_balance(&self, user: UserId) -> Result<Tokens, PoolError> {
        Ok(get_json(&self.balances, &user.0.to_be_bytes())?.unwrap_or(0))
    }

    fn write_balance(&self, user: UserId, balance: Tokens) -> Result<(), PoolError> {
        put_json(&self.balances, &user.0.to_be_bytes(), &balance)
    }
}

impl LedgerStore for SledLedger {
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
        let _guard = self.guard.write();

        let round_id = self.active_round_id()?;
        let mut round = self.get_round(round_id)?;
        if round.status != RoundStatus::Accumulating {
            return Err(PoolError::RoundClosed(round_id));
        }
        round.accumulate(amount)?;
        let balance = self.read_balance(user)?;
        if balance < amount {
            return Err(PoolError::InsufficientBalance {
                balance,
                requested: amount,
            });
        }

        let seq = self.meta_u64(BURN_SEQ_KEY)?.unwrap_or(0);
        let event = BurnEvent::new(round_id, user, amount, token_ref.clone(), now_us, seq);

        self.write_balance(user, balance - amount)?;
        put_json(&self.events, &seq.to_be_bytes(), &event)?;
        self.put_round(&round)?;
        self.put_meta_u64(BURN_SEQ_KEY, seq + 1)?;

        debug!(
            user = %user,
            amount,
            round = round_id,
            round_total = round.current_total,
            event = %event.id_hex(),
            "burn recorded"
        );
        Ok(event)
    }

    fn credit_balance(&self, user: UserId, amount: Tokens) -> Result<Tokens, PoolError> {
        let _guard = self.guard.write();
        let balance = self.read_balance(user)?;
        let new_balance = balance
            .checked_add(amount)
            .ok_or(PoolError::Overflow("crediting balance"))?;
        self.write_balance(user, new_balance)?;
        Ok(new_balance)
    }

    fn balance_of(&self, user: UserId) -> Tokens {
        let _guard = self.guard.read();
        self.read_balance(user).unwrap_or(0)
    }

    fn active_round(&self) -> Result<Round, PoolError> {
        let _guard = self.guard.read();
        self.get_round(self.active_round_id()?)
    }

    fn round(&self, round: RoundId) -> Result<Round, PoolError> {
        let _guard = self.guard.read();
        self.get_round(round)
    }

    fn round_total(&self, round: RoundId) -> Result<Tokens, PoolError> {
        Ok(self.round(round)?.current_total)
    }

    fn burn_events(&self, round: RoundId) -> Result<Vec<BurnEvent>, PoolError> {
        let _guard = self.guard.read();
        Ok(self
            .all_events()?
            .into_iter()
            .filter(|e| e.round == round)
            .collect())
    }

    fn events_since(&self, since_us: TimeMicros) -> Result<Vec<BurnEvent>, PoolError> {
        let _guard = self.guard.read();
        Ok(self
            .all_events()?
            .into_iter()
            .filter(|e| e.timestamp_us >= since_us)
            .collect())
    }

    fn contributions(&self, round: RoundId) -> Result<Vec<Contribution>, PoolError> {
        let _guard = self.guard.read();
        Ok(fold_contributions(&self.all_events()?, round))
    }

    fn contribution_of(
        &self,
        round: RoundId,
        user: UserId,
    ) -> Result<Option<Contribution>, PoolError> {
        Ok(self
            .contributions(round)?
            .into_iter()
            .find(|c| c.user == user))
    }

    fn try_begin_distribution(&self, round_id: RoundId) -> Result<bool, PoolError> {
        let _guard = self.guard.write();
        let mut round = self.get_round(round_id)?;
        if round.status != RoundStatus::Accumulating {
            debug!(round = round_id, status = ?round.status, "distribution trigger declined");
            return Ok(false);
        }
        if !round.target_reached() {
            return Ok(false);
        }
        round.status = RoundStatus::Distributing;
        self.put_round(&round)?;
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
        let _guard = self.guard.write();

        let existing: Option<Vec<Payout>> = get_json(&self.payouts, &round_id.to_be_bytes())?;
        if existing.is_some() {
            error!(round = round_id, "duplicate payout commit rejected");
            return Err(PoolError::AlreadyDistributed(round_id));
        }
        let mut round = self.get_round(round_id)?;
        if round.status != RoundStatus::Distributing {
            return Err(PoolError::InvalidTransition {
                from: round.status,
                to: RoundStatus::Closed,
            });
        }
        check_conservation(&round, payouts, charity)?;

        for payout in payouts {
            let balance = self.read_balance(payout.user)?;
            self.write_balance(payout.user, balance.saturating_add(payout.amount))?;
        }
        round.status = RoundStatus::Closed;
        round.closed_at_us = Some(now_us);
        self.put_round(&round)?;
        put_json(&self.payouts, &round_id.to_be_bytes(), &payouts.to_vec())?;
        put_json(&self.charity, &round_id.to_be_bytes(), charity)?;

        let next = Round::open(round_id + 1, next_target, now_us);
        self.put_round(&next)?;
        self.put_meta_u64(ACTIVE_ROUND_KEY, next.id)?;
        self.db.flush().map_err(storage)?;

        info!(
            round = round_id,
            payouts = payouts.len(),
            charity = charity.amount,
            next_round = next.id,
            next_target,
            "payouts committed, round closed"
        );
        Ok(())
    }

    fn payouts(&self, round: RoundId) -> Result<Vec<Payout>, PoolError> {
        let _guard = self.guard.read();
        Ok(get_json(&self.payouts, &round.to_be_bytes())?.unwrap_or_default())
    }

    fn charity_allocation(
        &self,
        round: RoundId,
    ) -> Result<Option<CharityAllocation>, PoolError> {
        let _guard = self.guard.read();
        get_json(&self.charity, &round.to_be_bytes())
    }
}
