//! In-memory adapters for the wallet ports.
//!
//! Used by unit and property tests and by the API tests. The wallet store
//! can be configured to misbehave the way a real backend might (non-atomic
//! batches, failing writes) so recovery paths can be exercised.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::Decimal;
use saku_shared::types::{ExchangeRateId, PageRequest, TransactionId, WalletId};
use tokio::sync::RwLock;

use super::ports::{
    ExchangeRateProvider, ExchangeRateStore, IdentityProvider, StoreError, TransactionLedger,
    WalletStore,
};
use super::types::{BalanceChange, NewTransaction, NewWallet, Transaction, Wallet, WalletType};
use crate::currency::{ExchangeRate, ExchangeRateUpdate, NewExchangeRate};

/// Wallets keyed by user; one map entry holds every wallet of that user so a
/// batch on one user is applied under a single shard lock.
#[derive(Debug, Default)]
pub struct InMemoryWalletStore {
    wallets: DashMap<String, BTreeMap<WalletType, Wallet>>,
    non_atomic_batches: bool,
    fail_decrement_of: Option<WalletType>,
    fail_restores: bool,
    forced_conflicts: AtomicU32,
}

impl InMemoryWalletStore {
    /// Creates an empty, well-behaved store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies debit batches one wallet at a time, reporting partial progress.
    #[must_use]
    pub const fn with_non_atomic_batches(mut self) -> Self {
        self.non_atomic_batches = true;
        self
    }

    /// Makes every decrement of `wallet_type` fail as unavailable.
    #[must_use]
    pub const fn with_failing_decrement_of(mut self, wallet_type: WalletType) -> Self {
        self.fail_decrement_of = Some(wallet_type);
        self
    }

    /// Makes every restore fail.
    #[must_use]
    pub const fn with_failing_restores(mut self) -> Self {
        self.fail_restores = true;
        self
    }

    /// Makes the next `count` increments report a version conflict.
    #[must_use]
    pub fn with_forced_conflicts(self, count: u32) -> Self {
        self.forced_conflicts.store(count, Ordering::SeqCst);
        self
    }

    /// Current balance of a wallet, if it exists.
    #[must_use]
    pub fn balance(&self, user_id: &str, wallet_type: WalletType) -> Option<Decimal> {
        self.wallets
            .get(user_id)
            .and_then(|user| user.get(&wallet_type).map(|w| w.balance))
    }

    /// Number of wallets held for a user.
    #[must_use]
    pub fn wallet_count(&self, user_id: &str) -> usize {
        self.wallets.get(user_id).map_or(0, |user| user.len())
    }

    fn take_forced_conflict(&self) -> bool {
        self.forced_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

fn apply_delta(wallet: &mut Wallet, delta: Decimal) -> Result<(), StoreError> {
    wallet.balance = wallet
        .balance
        .checked_add(delta)
        .ok_or_else(|| StoreError::Unavailable("balance overflow".to_string()))?;
    wallet.version += 1;
    wallet.updated_at = Utc::now();
    Ok(())
}

#[async_trait]
impl WalletStore for InMemoryWalletStore {
    async fn find_by_user(&self, user_id: &str) -> Result<Vec<Wallet>, StoreError> {
        Ok(self
            .wallets
            .get(user_id)
            .map(|user| user.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn find_one(
        &self,
        user_id: &str,
        wallet_type: WalletType,
    ) -> Result<Option<Wallet>, StoreError> {
        Ok(self
            .wallets
            .get(user_id)
            .and_then(|user| user.get(&wallet_type).cloned()))
    }

    async fn insert(&self, wallet: NewWallet) -> Result<Wallet, StoreError> {
        let mut user = self.wallets.entry(wallet.user_id.clone()).or_default();
        if user.contains_key(&wallet.wallet_type) {
            return Err(StoreError::Duplicate);
        }

        let now = Utc::now();
        let stored = Wallet {
            id: WalletId::new(),
            user_id: wallet.user_id,
            wallet_type: wallet.wallet_type,
            balance: Decimal::ZERO,
            version: 0,
            created_at: now,
            updated_at: now,
        };
        user.insert(stored.wallet_type, stored.clone());
        Ok(stored)
    }

    async fn increment_balance(
        &self,
        user_id: &str,
        wallet_type: WalletType,
        delta: Decimal,
        expected_version: i64,
    ) -> Result<Wallet, StoreError> {
        if self.take_forced_conflict() {
            return Err(StoreError::VersionConflict);
        }

        let mut user = self.wallets.get_mut(user_id).ok_or(StoreError::NotFound)?;
        let wallet = user.get_mut(&wallet_type).ok_or(StoreError::NotFound)?;
        if wallet.version != expected_version {
            return Err(StoreError::VersionConflict);
        }

        apply_delta(wallet, delta)?;
        Ok(wallet.clone())
    }

    async fn decrement_balances(
        &self,
        user_id: &str,
        changes: &[BalanceChange],
    ) -> Result<Vec<Wallet>, StoreError> {
        let mut user = self.wallets.get_mut(user_id).ok_or(StoreError::NotFound)?;

        if self.non_atomic_batches {
            let mut applied = Vec::new();
            let mut updated = Vec::new();
            for change in changes {
                let outcome = match user.get_mut(&change.wallet_type) {
                    None => Err(StoreError::NotFound),
                    Some(_) if self.fail_decrement_of == Some(change.wallet_type) => Err(
                        StoreError::Unavailable(format!("{} wallet write failed", change.wallet_type)),
                    ),
                    Some(wallet) if wallet.balance < change.amount => {
                        Err(StoreError::InsufficientBalance {
                            wallet_type: change.wallet_type,
                            available: wallet.balance,
                        })
                    }
                    Some(wallet) => apply_delta(wallet, -change.amount).map(|()| wallet.clone()),
                };

                match outcome {
                    Ok(wallet) => {
                        applied.push(*change);
                        updated.push(wallet);
                    }
                    Err(err) if applied.is_empty() => return Err(err),
                    Err(err) => {
                        return Err(StoreError::PartialDebit {
                            applied,
                            reason: err.to_string(),
                        });
                    }
                }
            }
            return Ok(updated);
        }

        for change in changes {
            if self.fail_decrement_of == Some(change.wallet_type) {
                return Err(StoreError::Unavailable(format!(
                    "{} wallet write failed",
                    change.wallet_type
                )));
            }
            let wallet = user.get(&change.wallet_type).ok_or(StoreError::NotFound)?;
            if wallet.balance < change.amount {
                return Err(StoreError::InsufficientBalance {
                    wallet_type: change.wallet_type,
                    available: wallet.balance,
                });
            }
        }

        let mut updated = Vec::with_capacity(changes.len());
        for change in changes {
            let wallet = user.get_mut(&change.wallet_type).ok_or(StoreError::NotFound)?;
            apply_delta(wallet, -change.amount)?;
            updated.push(wallet.clone());
        }
        Ok(updated)
    }

    async fn restore_balances(
        &self,
        user_id: &str,
        changes: &[BalanceChange],
    ) -> Result<(), StoreError> {
        if self.fail_restores {
            return Err(StoreError::Unavailable("restore failed".to_string()));
        }

        let mut user = self.wallets.get_mut(user_id).ok_or(StoreError::NotFound)?;
        for change in changes {
            let wallet = user.get_mut(&change.wallet_type).ok_or(StoreError::NotFound)?;
            apply_delta(wallet, change.amount)?;
        }
        Ok(())
    }
}

/// Ledger kept in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    entries: RwLock<Vec<Transaction>>,
    fail_appends: bool,
}

impl InMemoryLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every append fail.
    #[must_use]
    pub const fn with_failing_appends(mut self) -> Self {
        self.fail_appends = true;
        self
    }

    /// Snapshot of a user's entries in insertion order.
    pub async fn entries_for(&self, user_id: &str) -> Vec<Transaction> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl TransactionLedger for InMemoryLedger {
    async fn append(&self, entry: NewTransaction) -> Result<Transaction, StoreError> {
        if self.fail_appends {
            return Err(StoreError::Unavailable("ledger unavailable".to_string()));
        }

        let transaction = Transaction {
            id: TransactionId::new(),
            user_id: entry.user_id,
            kind: entry.kind,
            amount: entry.amount,
            money: entry.money,
            currency: entry.currency,
            order_id: entry.order_id,
            admin_id: entry.admin_id,
            created_at: Utc::now(),
        };
        self.entries.write().await.push(transaction.clone());
        Ok(transaction)
    }

    async fn list_by_user(
        &self,
        user_id: &str,
        page: PageRequest,
    ) -> Result<(Vec<Transaction>, u64), StoreError> {
        let entries = self.entries.read().await;
        let matching: Vec<&Transaction> =
            entries.iter().rev().filter(|t| t.user_id == user_id).collect();
        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(page.limit()).unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok((items, total))
    }
}

/// Exchange rates kept in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryExchangeRates {
    rates: RwLock<Vec<ExchangeRate>>,
}

impl InMemoryExchangeRates {
    /// Creates an empty rate table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table holding one active rate.
    #[must_use]
    pub fn with_active(currency: &str, rate: Decimal) -> Self {
        let now = Utc::now();
        Self {
            rates: RwLock::new(vec![ExchangeRate {
                id: ExchangeRateId::new(),
                currency: currency.to_string(),
                rate,
                active: true,
                created_at: now,
                updated_at: now,
            }]),
        }
    }
}

#[async_trait]
impl ExchangeRateProvider for InMemoryExchangeRates {
    async fn active_rate(&self) -> Result<Option<ExchangeRate>, StoreError> {
        // max_by_key keeps the last of equal keys, so later inserts win ties.
        Ok(self
            .rates
            .read()
            .await
            .iter()
            .filter(|r| r.active)
            .max_by_key(|r| r.created_at)
            .cloned())
    }
}

#[async_trait]
impl ExchangeRateStore for InMemoryExchangeRates {
    async fn create_rate(&self, rate: NewExchangeRate) -> Result<ExchangeRate, StoreError> {
        let now = Utc::now();
        let stored = ExchangeRate {
            id: ExchangeRateId::new(),
            currency: rate.currency,
            rate: rate.rate,
            active: rate.active,
            created_at: now,
            updated_at: now,
        };
        self.rates.write().await.push(stored.clone());
        Ok(stored)
    }

    async fn list_rates(
        &self,
        page: PageRequest,
    ) -> Result<(Vec<ExchangeRate>, u64), StoreError> {
        let rates = self.rates.read().await;
        let total = rates.len() as u64;
        let items = rates
            .iter()
            .rev()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(page.limit()).unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok((items, total))
    }

    async fn get_rate(&self, id: ExchangeRateId) -> Result<Option<ExchangeRate>, StoreError> {
        Ok(self.rates.read().await.iter().find(|r| r.id == id).cloned())
    }

    async fn update_rate(
        &self,
        id: ExchangeRateId,
        update: ExchangeRateUpdate,
    ) -> Result<ExchangeRate, StoreError> {
        let mut rates = self.rates.write().await;
        let rate = rates
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound)?;
        update.apply_to(rate);
        rate.updated_at = Utc::now();
        Ok(rate.clone())
    }

    async fn delete_rate(&self, id: ExchangeRateId) -> Result<(), StoreError> {
        let mut rates = self.rates.write().await;
        let before = rates.len();
        rates.retain(|r| r.id != id);
        if rates.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

/// Identity provider backed by a fixed user set.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityProvider {
    users: HashSet<String>,
}

impl StaticIdentityProvider {
    /// Creates a provider that knows exactly `users`.
    #[must_use]
    pub fn new<I, S>(users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            users: users.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn list_user_ids(&self) -> Result<HashSet<String>, StoreError> {
        Ok(self.users.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    async fn funded(store: &InMemoryWalletStore, store_balance: Decimal, service_balance: Decimal) {
        for wallet_type in WalletType::ALL {
            store.insert(NewWallet::empty("u1", wallet_type)).await.unwrap();
        }
        store
            .restore_balances(
                "u1",
                &[
                    BalanceChange::new(WalletType::Store, store_balance),
                    BalanceChange::new(WalletType::Service, service_balance),
                ],
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate() {
        let store = InMemoryWalletStore::new();
        store.insert(NewWallet::empty("u1", WalletType::Store)).await.unwrap();
        let err = store
            .insert(NewWallet::empty("u1", WalletType::Store))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate));
        assert_eq!(store.wallet_count("u1"), 1);
    }

    #[tokio::test]
    async fn test_increment_checks_version() {
        let store = InMemoryWalletStore::new();
        let wallet = store.insert(NewWallet::empty("u1", WalletType::Store)).await.unwrap();

        let updated = store
            .increment_balance("u1", WalletType::Store, dec!(5), wallet.version)
            .await
            .unwrap();
        assert_eq!(updated.balance, dec!(5));
        assert_eq!(updated.version, wallet.version + 1);

        let stale = store
            .increment_balance("u1", WalletType::Store, dec!(5), wallet.version)
            .await;
        assert!(matches!(stale, Err(StoreError::VersionConflict)));
        assert_eq!(store.balance("u1", WalletType::Store), Some(dec!(5)));
    }

    #[tokio::test]
    async fn test_atomic_batch_applies_nothing_on_shortfall() {
        let store = InMemoryWalletStore::new();
        funded(&store, dec!(10), dec!(1)).await;

        let err = store
            .decrement_balances(
                "u1",
                &[
                    BalanceChange::new(WalletType::Store, dec!(5)),
                    BalanceChange::new(WalletType::Service, dec!(2)),
                ],
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            StoreError::InsufficientBalance { wallet_type: WalletType::Service, available } if available == dec!(1)
        ));
        assert_eq!(store.balance("u1", WalletType::Store), Some(dec!(10)));
        assert_eq!(store.balance("u1", WalletType::Service), Some(dec!(1)));
    }

    #[tokio::test]
    async fn test_non_atomic_batch_reports_applied_changes() {
        let store = InMemoryWalletStore::new()
            .with_non_atomic_batches()
            .with_failing_decrement_of(WalletType::Store);
        funded(&store, dec!(10), dec!(10)).await;

        let err = store
            .decrement_balances(
                "u1",
                &[
                    BalanceChange::new(WalletType::Service, dec!(4)),
                    BalanceChange::new(WalletType::Store, dec!(3)),
                ],
            )
            .await
            .unwrap_err();

        match err {
            StoreError::PartialDebit { applied, .. } => {
                assert_eq!(applied, vec![BalanceChange::new(WalletType::Service, dec!(4))]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(store.balance("u1", WalletType::Service), Some(dec!(6)));
        assert_eq!(store.balance("u1", WalletType::Store), Some(dec!(10)));
    }

    #[tokio::test]
    async fn test_forced_conflicts_are_consumed() {
        let store = InMemoryWalletStore::new().with_forced_conflicts(1);
        let wallet = store.insert(NewWallet::empty("u1", WalletType::Store)).await.unwrap();

        let first = store
            .increment_balance("u1", WalletType::Store, dec!(1), wallet.version)
            .await;
        assert!(matches!(first, Err(StoreError::VersionConflict)));

        let second = store
            .increment_balance("u1", WalletType::Store, dec!(1), wallet.version)
            .await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_ledger_lists_newest_first() {
        let ledger = InMemoryLedger::new();
        for amount in [dec!(1), dec!(2), dec!(3)] {
            ledger
                .append(NewTransaction::purchase("u1", amount, "USD"))
                .await
                .unwrap();
        }
        ledger
            .append(NewTransaction::purchase("u2", dec!(9), "USD"))
            .await
            .unwrap();

        let (items, total) = ledger
            .list_by_user("u1", PageRequest { page: 1, per_page: 2 })
            .await
            .unwrap();
        assert_eq!(total, 3);
        let amounts: Vec<_> = items.iter().map(|t| t.amount).collect();
        assert_eq!(amounts, vec![dec!(3), dec!(2)]);
    }

    #[tokio::test]
    async fn test_active_rate_prefers_latest_active() {
        let rates = InMemoryExchangeRates::with_active("USD", dec!(1500));
        rates
            .create_rate(NewExchangeRate {
                currency: "EUR".into(),
                rate: dec!(1600),
                active: true,
            })
            .await
            .unwrap();
        rates
            .create_rate(NewExchangeRate {
                currency: "JPY".into(),
                rate: dec!(10),
                active: false,
            })
            .await
            .unwrap();

        let active = rates.active_rate().await.unwrap().unwrap();
        assert_eq!(active.currency, "EUR");
    }

    #[tokio::test]
    async fn test_no_active_rate() {
        let rates = InMemoryExchangeRates::new();
        assert!(rates.active_rate().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_deactivating_newest_rate_falls_back() {
        let rates = InMemoryExchangeRates::with_active("USD", dec!(1500));
        let newest = rates
            .create_rate(NewExchangeRate {
                currency: "EUR".into(),
                rate: dec!(1600),
                active: true,
            })
            .await
            .unwrap();

        let updated = rates
            .update_rate(
                newest.id,
                ExchangeRateUpdate {
                    active: Some(false),
                    ..ExchangeRateUpdate::default()
                },
            )
            .await
            .unwrap();
        assert!(!updated.active);
        assert!(updated.updated_at >= newest.updated_at);
        assert_eq!(updated.created_at, newest.created_at);

        let active = rates.active_rate().await.unwrap().unwrap();
        assert_eq!(active.currency, "USD");
    }

    #[tokio::test]
    async fn test_get_and_delete_rate() {
        let rates = InMemoryExchangeRates::new();
        let rate = rates
            .create_rate(NewExchangeRate {
                currency: "USD".into(),
                rate: dec!(1500),
                active: true,
            })
            .await
            .unwrap();

        assert_eq!(rates.get_rate(rate.id).await.unwrap(), Some(rate.clone()));
        rates.delete_rate(rate.id).await.unwrap();
        assert!(rates.get_rate(rate.id).await.unwrap().is_none());
        assert!(matches!(
            rates.delete_rate(rate.id).await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_update_unknown_rate() {
        let rates = InMemoryExchangeRates::new();
        let result = rates
            .update_rate(
                ExchangeRateId::new(),
                ExchangeRateUpdate {
                    rate: Some(dec!(1)),
                    ..ExchangeRateUpdate::default()
                },
            )
            .await;
        assert!(matches!(result, Err(StoreError::NotFound)));
    }
}
