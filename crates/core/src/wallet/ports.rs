//! Ports to the collaborators of the wallet service.
//!
//! The SQL repositories in `saku-db`, the HTTP identity client in
//! `saku-api`, and the in-memory adapters in [`super::memory`] implement
//! these traits.

use std::collections::HashSet;

use async_trait::async_trait;
use rust_decimal::Decimal;
use saku_shared::types::{ExchangeRateId, PageRequest};
use thiserror::Error;

use super::types::{BalanceChange, NewTransaction, NewWallet, Transaction, Wallet, WalletType};
use crate::currency::{ExchangeRate, ExchangeRateUpdate, NewExchangeRate};

/// Errors reported by persistence and provider adapters.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The addressed row does not exist.
    #[error("Record not found")]
    NotFound,

    /// A uniqueness constraint rejected the insert.
    #[error("Duplicate record")]
    Duplicate,

    /// The row changed since it was read.
    #[error("Version conflict")]
    VersionConflict,

    /// A conditional decrement found less than the requested amount.
    #[error("Insufficient balance in {wallet_type} wallet: {available} available")]
    InsufficientBalance {
        /// Wallet whose guard failed.
        wallet_type: WalletType,
        /// Balance seen by the guard.
        available: Decimal,
    },

    /// A multi-wallet decrement stopped after applying only some changes.
    #[error("Debit stopped after {} of the wallets: {reason}", applied.len())]
    PartialDebit {
        /// Changes that were applied and not undone.
        applied: Vec<BalanceChange>,
        /// What stopped the batch.
        reason: String,
    },

    /// The backend could not be reached or failed.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Durable record of one balance per (user, wallet type).
#[async_trait]
pub trait WalletStore: Send + Sync {
    /// All wallets of a user, in no particular order.
    async fn find_by_user(&self, user_id: &str) -> Result<Vec<Wallet>, StoreError>;

    /// One wallet of a user.
    async fn find_one(
        &self,
        user_id: &str,
        wallet_type: WalletType,
    ) -> Result<Option<Wallet>, StoreError>;

    /// Inserts a zero-balance wallet.
    ///
    /// Returns `StoreError::Duplicate` if the (user, type) pair exists.
    async fn insert(&self, wallet: NewWallet) -> Result<Wallet, StoreError>;

    /// Adds `delta` to a wallet if its version still equals
    /// `expected_version`, bumping the version.
    ///
    /// Returns `StoreError::VersionConflict` if the version moved.
    async fn increment_balance(
        &self,
        user_id: &str,
        wallet_type: WalletType,
        delta: Decimal,
        expected_version: i64,
    ) -> Result<Wallet, StoreError>;

    /// Subtracts each change from its wallet, guarded by `balance >= amount`.
    ///
    /// All changes apply or none do. A store that cannot guarantee this
    /// reports the changes it already applied as `StoreError::PartialDebit`.
    async fn decrement_balances(
        &self,
        user_id: &str,
        changes: &[BalanceChange],
    ) -> Result<Vec<Wallet>, StoreError>;

    /// Adds each change back to its wallet without a version guard.
    ///
    /// Used to compensate a partial debit or reverse one whose ledger entry
    /// could not be written.
    async fn restore_balances(
        &self,
        user_id: &str,
        changes: &[BalanceChange],
    ) -> Result<(), StoreError>;
}

/// Append-only log of balance-affecting events.
#[async_trait]
pub trait TransactionLedger: Send + Sync {
    /// Appends one entry.
    async fn append(&self, entry: NewTransaction) -> Result<Transaction, StoreError>;

    /// One page of a user's entries, newest first, plus the total count.
    async fn list_by_user(
        &self,
        user_id: &str,
        page: PageRequest,
    ) -> Result<(Vec<Transaction>, u64), StoreError>;
}

/// Source of the currently active conversion rate.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExchangeRateProvider: Send + Sync {
    /// The most recently created record with `active = true`, if any.
    async fn active_rate(&self) -> Result<Option<ExchangeRate>, StoreError>;
}

/// Management of exchange rate records.
#[async_trait]
pub trait ExchangeRateStore: Send + Sync {
    /// Stores a validated rate.
    async fn create_rate(&self, rate: NewExchangeRate) -> Result<ExchangeRate, StoreError>;

    /// One page of rates, newest first, plus the total count.
    async fn list_rates(&self, page: PageRequest)
    -> Result<(Vec<ExchangeRate>, u64), StoreError>;

    /// One rate by ID.
    async fn get_rate(&self, id: ExchangeRateId) -> Result<Option<ExchangeRate>, StoreError>;

    /// Applies a validated partial update and bumps `updated_at`.
    ///
    /// Returns `StoreError::NotFound` if no such rate exists.
    async fn update_rate(
        &self,
        id: ExchangeRateId,
        update: ExchangeRateUpdate,
    ) -> Result<ExchangeRate, StoreError>;

    /// Removes a rate.
    ///
    /// Returns `StoreError::NotFound` if no such rate exists.
    async fn delete_rate(&self, id: ExchangeRateId) -> Result<(), StoreError>;
}

/// Source of the set of valid user identifiers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Every user ID known to the identity service.
    async fn list_user_ids(&self) -> Result<HashSet<String>, StoreError>;
}
