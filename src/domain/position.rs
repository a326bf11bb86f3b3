//! Held positions and the book that tracks them across confirmations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use super::error::DomainError;
use super::id::{PositionId, TxHash};
use super::opportunity::Opportunity;

/// Balances at or below this are treated as fully withdrawn.
pub const DUST_THRESHOLD: Decimal = dec!(0.00000001);

/// A current balance in an opportunity, as seen by the rebalancer.
///
/// Holdings come either from the position book or straight from an account
/// balance snapshot, so they carry no deposit history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Holding {
    opportunity: Opportunity,
    balance: Decimal,
}

impl Holding {
    /// Create a holding.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NegativeBalance` if `balance` is negative.
    pub fn new(opportunity: Opportunity, balance: Decimal) -> Result<Self, DomainError> {
        if balance < Decimal::ZERO {
            return Err(DomainError::NegativeBalance { balance });
        }
        Ok(Self {
            opportunity,
            balance,
        })
    }

    #[must_use]
    pub const fn opportunity(&self) -> &Opportunity {
        &self.opportunity
    }

    #[must_use]
    pub const fn balance(&self) -> Decimal {
        self.balance
    }

    /// `(platform asset symbol, protocol key)`.
    #[must_use]
    pub fn key(&self) -> (&str, &str) {
        self.opportunity.position_key()
    }

    /// Same holding with its opportunity replaced by a fresher snapshot.
    #[must_use]
    pub fn with_opportunity(self, opportunity: Opportunity) -> Self {
        Self {
            opportunity,
            balance: self.balance,
        }
    }
}

/// A position opened by a confirmed deposit.
#[derive(Debug, Clone, Serialize)]
pub struct Position {
    id: PositionId,
    opportunity: Opportunity,
    amount_deposited: Decimal,
    deposited_at: DateTime<Utc>,
    tx_hash: TxHash,
    current_value: Option<Decimal>,
    earned_yield: Option<Decimal>,
    last_updated: DateTime<Utc>,
}

impl Position {
    /// Create a new position.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NonPositiveAmount` if `amount` is not positive.
    pub fn new(
        id: PositionId,
        opportunity: Opportunity,
        amount: Decimal,
        tx_hash: TxHash,
        deposited_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if amount <= Decimal::ZERO {
            return Err(DomainError::NonPositiveAmount { amount });
        }
        Ok(Self {
            id,
            opportunity,
            amount_deposited: amount,
            deposited_at,
            tx_hash,
            current_value: None,
            earned_yield: None,
            last_updated: deposited_at,
        })
    }

    #[must_use]
    pub const fn id(&self) -> PositionId {
        self.id
    }

    #[must_use]
    pub const fn opportunity(&self) -> &Opportunity {
        &self.opportunity
    }

    #[must_use]
    pub const fn amount_deposited(&self) -> Decimal {
        self.amount_deposited
    }

    #[must_use]
    pub const fn deposited_at(&self) -> DateTime<Utc> {
        self.deposited_at
    }

    /// Hash of the transaction that last changed this position.
    #[must_use]
    pub const fn tx_hash(&self) -> &TxHash {
        &self.tx_hash
    }

    #[must_use]
    pub const fn current_value(&self) -> Option<Decimal> {
        self.current_value
    }

    #[must_use]
    pub const fn earned_yield(&self) -> Option<Decimal> {
        self.earned_yield
    }

    #[must_use]
    pub const fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    /// Current balance: the refreshed value if known, otherwise principal.
    #[must_use]
    pub fn balance(&self) -> Decimal {
        self.current_value.unwrap_or(self.amount_deposited)
    }

    /// Record a fresh valuation of this position.
    pub fn refresh_value(&mut self, value: Decimal, at: DateTime<Utc>) {
        self.current_value = Some(value);
        self.earned_yield = Some(value - self.amount_deposited);
        self.last_updated = at;
    }

    /// View this position as a rebalancer input.
    #[must_use]
    pub fn holding(&self) -> Holding {
        Holding {
            opportunity: self.opportunity.clone(),
            balance: self.balance(),
        }
    }

    fn add(&mut self, amount: Decimal, tx_hash: TxHash, at: DateTime<Utc>) {
        self.amount_deposited += amount;
        self.current_value = self.current_value.map(|v| v + amount);
        self.tx_hash = tx_hash;
        self.last_updated = at;
    }

    fn reduce(&mut self, amount: Decimal, tx_hash: TxHash, at: DateTime<Utc>) {
        self.amount_deposited = (self.amount_deposited - amount).max(Decimal::ZERO);
        self.current_value = self.current_value.map(|v| (v - amount).max(Decimal::ZERO));
        if let Some(value) = self.current_value {
            self.earned_yield = Some(value - self.amount_deposited);
        }
        self.tx_hash = tx_hash;
        self.last_updated = at;
    }
}

/// Tracks open positions, keyed by `(asset, protocol key)`.
#[derive(Debug)]
pub struct PositionBook {
    positions: Vec<Position>,
    next_id: u64,
}

impl Default for PositionBook {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionBook {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            positions: Vec::new(),
            next_id: 1,
        }
    }

    fn next_id(&mut self) -> PositionId {
        let id = PositionId::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// Apply a confirmed deposit: opens a position or tops up the existing
    /// one with the same key.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NonPositiveAmount` if `amount` is not positive.
    pub fn apply_deposit(
        &mut self,
        opportunity: &Opportunity,
        amount: Decimal,
        tx_hash: TxHash,
        at: DateTime<Utc>,
    ) -> Result<PositionId, DomainError> {
        if amount <= Decimal::ZERO {
            return Err(DomainError::NonPositiveAmount { amount });
        }
        let key = opportunity.position_key();
        if let Some(existing) = self
            .positions
            .iter_mut()
            .find(|p| p.opportunity.position_key() == key)
        {
            existing.add(amount, tx_hash, at);
            return Ok(existing.id);
        }

        let id = self.next_id();
        self.positions
            .push(Position::new(id, opportunity.clone(), amount, tx_hash, at)?);
        Ok(id)
    }

    /// Apply a confirmed withdrawal. Returns the remaining balance, or `None`
    /// if no position matches. Positions drained to dust are removed.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NonPositiveAmount` if `amount` is not positive.
    pub fn apply_withdraw(
        &mut self,
        key: (&str, &str),
        amount: Decimal,
        tx_hash: TxHash,
        at: DateTime<Utc>,
    ) -> Result<Option<Decimal>, DomainError> {
        if amount <= Decimal::ZERO {
            return Err(DomainError::NonPositiveAmount { amount });
        }
        let Some(index) = self
            .positions
            .iter()
            .position(|p| p.opportunity.position_key() == key)
        else {
            return Ok(None);
        };

        let position = &mut self.positions[index];
        position.reduce(amount, tx_hash, at);
        let remaining = position.balance();
        if remaining <= DUST_THRESHOLD {
            self.positions.remove(index);
            return Ok(Some(Decimal::ZERO));
        }
        Ok(Some(remaining))
    }

    #[must_use]
    pub fn get(&self, id: PositionId) -> Option<&Position> {
        self.positions.iter().find(|p| p.id == id)
    }

    pub fn get_mut(&mut self, id: PositionId) -> Option<&mut Position> {
        self.positions.iter_mut().find(|p| p.id == id)
    }

    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.iter()
    }

    /// Snapshot of current holdings for the rebalancer.
    #[must_use]
    pub fn holdings(&self) -> Vec<Holding> {
        self.positions.iter().map(Position::holding).collect()
    }

    /// Sum of current balances.
    #[must_use]
    pub fn total_value(&self) -> Decimal {
        self.positions
            .iter()
            .map(Position::balance)
            .fold(Decimal::ZERO, |acc, v| acc + v)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
