//! Wallet service orchestrating balance mutations.
//!
//! The service holds no locks of its own. Correctness under concurrency
//! comes from the store: unique (user, type) rows, version-guarded credits,
//! and all-or-nothing debit batches.

use std::sync::Arc;

use rust_decimal::Decimal;
use saku_shared::config::{LedgerFailurePolicy, WalletConfig};
use saku_shared::types::{PageRequest, PageResponse};
use tracing::{debug, error, info, warn};

use super::error::WalletError;
use super::ports::{ExchangeRateProvider, IdentityProvider, StoreError, TransactionLedger, WalletStore};
use super::types::{
    AddBalanceRequest, BalanceChange, DeductBalanceRequest, NewTransaction, NewWallet,
    Transaction, Wallet, WalletBalance, WalletType, WalletsByUser,
};
use super::validation::{validate_add_balance, validate_deduct_balance};
use crate::currency::{ExchangeRate, to_internal_units};

impl From<StoreError> for WalletError {
    fn from(err: StoreError) -> Self {
        Self::StoreUnavailable(err.to_string())
    }
}

/// Balance change to reverse when a ledger append fails.
enum Reversal<'a> {
    Credit(BalanceChange),
    Debit(&'a [BalanceChange]),
}

/// Wallet service.
#[derive(Clone)]
pub struct WalletService {
    wallets: Arc<dyn WalletStore>,
    ledger: Arc<dyn TransactionLedger>,
    rates: Arc<dyn ExchangeRateProvider>,
    identity: Arc<dyn IdentityProvider>,
    config: WalletConfig,
}

impl std::fmt::Debug for WalletService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl WalletService {
    /// Creates a service with default wallet settings.
    #[must_use]
    pub fn new(
        wallets: Arc<dyn WalletStore>,
        ledger: Arc<dyn TransactionLedger>,
        rates: Arc<dyn ExchangeRateProvider>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self::with_config(wallets, ledger, rates, identity, WalletConfig::default())
    }

    /// Creates a service with explicit wallet settings.
    #[must_use]
    pub fn with_config(
        wallets: Arc<dyn WalletStore>,
        ledger: Arc<dyn TransactionLedger>,
        rates: Arc<dyn ExchangeRateProvider>,
        identity: Arc<dyn IdentityProvider>,
        config: WalletConfig,
    ) -> Self {
        Self {
            wallets,
            ledger,
            rates,
            identity,
            config,
        }
    }

    /// Creates the store and service wallets of a user with zero balance.
    ///
    /// A wallet inserted concurrently by another request is not an error.
    ///
    /// # Errors
    ///
    /// Returns `WalletError::Validation` for an empty user ID and
    /// `WalletError::AlreadyExists` if the user has any wallet.
    pub async fn create_wallet(&self, user_id: &str) -> Result<(), WalletError> {
        let user_id = require_user_id(user_id)?;

        if !self.wallets.find_by_user(user_id).await?.is_empty() {
            return Err(WalletError::AlreadyExists(user_id.to_string()));
        }

        for wallet_type in WalletType::ALL {
            match self.wallets.insert(NewWallet::empty(user_id, wallet_type)).await {
                Ok(_) => {}
                Err(StoreError::Duplicate) => {
                    debug!(user_id = %user_id, wallet_type = %wallet_type, "Wallet created concurrently");
                }
                Err(e) => {
                    error!(user_id = %user_id, wallet_type = %wallet_type, error = %e, "Failed to create wallet");
                    return Err(e.into());
                }
            }
        }

        info!(user_id = %user_id, "Wallets created");
        Ok(())
    }

    /// Returns every wallet of a user, creating both wallets on first access.
    ///
    /// # Errors
    ///
    /// Returns `WalletError::Validation` for an empty user ID or
    /// `WalletError::StoreUnavailable` if the store fails.
    pub async fn get_wallets_by_user(&self, user_id: &str) -> Result<WalletsByUser, WalletError> {
        let user_id = require_user_id(user_id)?;

        let mut wallets = self.wallets.find_by_user(user_id).await?;
        if wallets.is_empty() {
            match self.create_wallet(user_id).await {
                Ok(()) | Err(WalletError::AlreadyExists(_)) => {}
                Err(e) => return Err(e),
            }
            wallets = self.wallets.find_by_user(user_id).await?;
        }

        wallets.sort_by_key(|w| w.wallet_type);
        Ok(WalletsByUser {
            user_id: user_id.to_string(),
            wallet: wallets
                .into_iter()
                .map(|w| WalletBalance {
                    balance: w.balance,
                    wallet_type: w.wallet_type,
                })
                .collect(),
        })
    }

    /// Converts external money at the active rate and credits one wallet.
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad input,
    /// `WalletError::ExchangeRateUnavailable` without a usable rate,
    /// `WalletError::Overflow` if the balance would not grow,
    /// `WalletError::ConcurrentModification` if every attempt lost a race,
    /// and `WalletError::LedgerWriteFailed` if the audit entry is missing.
    pub async fn add_balance(
        &self,
        request: Option<&AddBalanceRequest>,
        operator_id: &str,
    ) -> Result<Wallet, WalletError> {
        let credit = validate_add_balance(request, operator_id)?;

        self.get_wallets_by_user(&credit.user_id).await?;

        let rate = self.active_rate().await?;
        if !rate.is_usable() {
            warn!(rate_id = %rate.id, rate = %rate.rate, "Active exchange rate is not usable");
            return Err(WalletError::ExchangeRateUnavailable);
        }

        let amount = to_internal_units(credit.money, rate.rate)
            .ok_or(WalletError::Overflow(credit.wallet_type))?;

        let mut attempt = 0;
        let wallet = loop {
            let current = self
                .wallets
                .find_one(&credit.user_id, credit.wallet_type)
                .await?
                .ok_or_else(|| WalletError::NotFound {
                    user_id: credit.user_id.clone(),
                    wallet_type: credit.wallet_type,
                })?;

            current
                .balance
                .checked_add(amount)
                .filter(|next| *next > current.balance)
                .ok_or(WalletError::Overflow(credit.wallet_type))?;

            match self
                .wallets
                .increment_balance(&credit.user_id, credit.wallet_type, amount, current.version)
                .await
            {
                Ok(wallet) => break wallet,
                Err(StoreError::VersionConflict) if attempt < self.config.max_credit_retries => {
                    attempt += 1;
                    debug!(
                        user_id = %credit.user_id,
                        wallet_type = %credit.wallet_type,
                        attempt,
                        "Credit lost a version race, retrying"
                    );
                }
                Err(StoreError::VersionConflict) => {
                    warn!(
                        user_id = %credit.user_id,
                        wallet_type = %credit.wallet_type,
                        attempts = attempt + 1,
                        "Credit retries exhausted"
                    );
                    return Err(WalletError::ConcurrentModification);
                }
                Err(e) => return Err(e.into()),
            }
        };

        let entry = NewTransaction::deposit(
            &credit.user_id,
            amount,
            credit.money,
            &rate.currency,
            &credit.operator_id,
        );
        if let Err(e) = self.ledger.append(entry).await {
            let change = BalanceChange::new(credit.wallet_type, amount);
            return Err(self
                .on_ledger_failure(&credit.user_id, Reversal::Credit(change), &e)
                .await);
        }

        info!(
            user_id = %credit.user_id,
            wallet_type = %credit.wallet_type,
            money = %credit.money,
            currency = %rate.currency,
            amount = %amount,
            admin_id = %credit.operator_id,
            "Balance added"
        );

        Ok(wallet)
    }

    /// Debits the store and/or service wallet of the paying user.
    ///
    /// Either every requested wallet is decremented or none is.
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad input,
    /// `WalletError::UserNotFound` for a user unknown to the identity service,
    /// `WalletError::InsufficientFunds` if any wallet cannot cover its price,
    /// `WalletError::PartialDebitFailure` if a partial debit could not be
    /// compensated, and `WalletError::LedgerWriteFailed` if the audit entry is
    /// missing.
    pub async fn deduct_balance(
        &self,
        request: Option<&DeductBalanceRequest>,
        user_id: &str,
    ) -> Result<Vec<Wallet>, WalletError> {
        let debit = validate_deduct_balance(request, user_id)?;
        let total = debit
            .total()
            .ok_or_else(|| WalletError::Validation("Total price is too large".to_string()))?;

        let rate = self.active_rate().await?;

        self.get_wallets_by_user(&debit.user_id).await?;

        let users = self.identity.list_user_ids().await?;
        if !users.contains(&debit.user_id) {
            return Err(WalletError::UserNotFound(debit.user_id));
        }

        for change in &debit.changes {
            let wallet = self
                .wallets
                .find_one(&debit.user_id, change.wallet_type)
                .await?
                .ok_or_else(|| WalletError::NotFound {
                    user_id: debit.user_id.clone(),
                    wallet_type: change.wallet_type,
                })?;
            if wallet.balance < change.amount {
                return Err(WalletError::InsufficientFunds {
                    wallet_type: change.wallet_type,
                    have: wallet.balance,
                    need: change.amount,
                });
            }
        }

        let updated = match self
            .wallets
            .decrement_balances(&debit.user_id, &debit.changes)
            .await
        {
            Ok(updated) => updated,
            Err(StoreError::InsufficientBalance {
                wallet_type,
                available,
            }) => {
                let need = debit
                    .changes
                    .iter()
                    .find(|c| c.wallet_type == wallet_type)
                    .map_or(Decimal::ZERO, |c| c.amount);
                return Err(WalletError::InsufficientFunds {
                    wallet_type,
                    have: available,
                    need,
                });
            }
            Err(StoreError::PartialDebit { applied, reason }) => {
                return Err(self.compensate(&debit.user_id, &applied, &reason).await);
            }
            Err(e) => return Err(e.into()),
        };

        let entry = NewTransaction::purchase(&debit.user_id, total, &rate.currency);
        if let Err(e) = self.ledger.append(entry).await {
            return Err(self
                .on_ledger_failure(&debit.user_id, Reversal::Debit(&debit.changes), &e)
                .await);
        }

        info!(
            user_id = %debit.user_id,
            amount = %total,
            currency = %rate.currency,
            wallets = debit.changes.len(),
            "Balance deducted"
        );

        Ok(updated)
    }

    /// One page of a user's ledger entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns `WalletError::Validation` for an empty user ID or
    /// `WalletError::StoreUnavailable` if the ledger fails.
    pub async fn list_transactions(
        &self,
        user_id: &str,
        page: PageRequest,
    ) -> Result<PageResponse<Transaction>, WalletError> {
        let user_id = require_user_id(user_id)?;
        let page = page.normalized();
        let (items, total) = self.ledger.list_by_user(user_id, page).await?;
        Ok(PageResponse::new(items, page, total))
    }

    async fn active_rate(&self) -> Result<ExchangeRate, WalletError> {
        self.rates
            .active_rate()
            .await?
            .ok_or(WalletError::ExchangeRateUnavailable)
    }

    /// Re-credits the wallets a non-atomic store already decremented.
    async fn compensate(
        &self,
        user_id: &str,
        applied: &[BalanceChange],
        reason: &str,
    ) -> WalletError {
        if !self.config.compensate_partial_debits {
            error!(
                user_id = %user_id,
                applied = ?applied,
                reason = %reason,
                reconciliation_required = true,
                "Debit partially applied, compensation disabled"
            );
            return WalletError::PartialDebitFailure(reason.to_string());
        }

        match self.wallets.restore_balances(user_id, applied).await {
            Ok(()) => {
                warn!(user_id = %user_id, applied = ?applied, reason = %reason, "Partial debit compensated");
                WalletError::StoreUnavailable(reason.to_string())
            }
            Err(e) => {
                error!(
                    user_id = %user_id,
                    applied = ?applied,
                    reason = %reason,
                    error = %e,
                    reconciliation_required = true,
                    "Partial debit compensation failed"
                );
                WalletError::PartialDebitFailure(format!("{reason}; compensation failed: {e}"))
            }
        }
    }

    async fn on_ledger_failure(
        &self,
        user_id: &str,
        reversal: Reversal<'_>,
        cause: &StoreError,
    ) -> WalletError {
        if self.config.ledger_failure_policy == LedgerFailurePolicy::AcceptGap {
            error!(
                user_id = %user_id,
                error = %cause,
                reconciliation_required = true,
                "Balance changed but ledger write failed"
            );
            return WalletError::LedgerWriteFailed(cause.to_string());
        }

        let reverted = match reversal {
            Reversal::Credit(change) => self
                .wallets
                .decrement_balances(user_id, &[change])
                .await
                .map(|_| ()),
            Reversal::Debit(changes) => self.wallets.restore_balances(user_id, changes).await,
        };

        match reverted {
            Ok(()) => {
                warn!(user_id = %user_id, error = %cause, "Ledger write failed, balance change reverted");
                WalletError::StoreUnavailable(format!("ledger write failed: {cause}"))
            }
            Err(e) => {
                error!(
                    user_id = %user_id,
                    error = %cause,
                    revert_error = %e,
                    reconciliation_required = true,
                    "Ledger write failed and balance change could not be reverted"
                );
                WalletError::LedgerWriteFailed(format!("{cause}; revert failed: {e}"))
            }
        }
    }
}

fn require_user_id(user_id: &str) -> Result<&str, WalletError> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(WalletError::Validation("User ID is required".to_string()));
    }
    Ok(user_id)
}
