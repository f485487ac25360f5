//! Credit and debit request validation.
//!
//! Checks run in a fixed order and the first failure wins, so a caller
//! always sees the same error for the same bad request.

use rust_decimal::Decimal;

use super::error::WalletError;
use super::types::{AddBalanceRequest, BalanceChange, DeductBalanceRequest, WalletType};

/// A credit request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCredit {
    /// Target user.
    pub user_id: String,
    /// Target wallet.
    pub wallet_type: WalletType,
    /// External money amount, strictly positive.
    pub money: Decimal,
    /// Operator performing the credit.
    pub operator_id: String,
}

/// A debit request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedDebit {
    /// Paying user.
    pub user_id: String,
    /// Nonzero components, service wallet first.
    pub changes: Vec<BalanceChange>,
}

impl ValidatedDebit {
    /// Sum of all prices.
    ///
    /// Returns `None` if the sum does not fit in a `Decimal`.
    #[must_use]
    pub fn total(&self) -> Option<Decimal> {
        self.changes
            .iter()
            .try_fold(Decimal::ZERO, |acc, c| acc.checked_add(c.amount))
    }
}

/// Validates an operator credit.
///
/// Order: request present, amount positive, user ID present, wallet type
/// known, operator ID present.
///
/// # Errors
///
/// Returns `WalletError::Validation` or `WalletError::InvalidWalletType` for
/// the first failing check.
pub fn validate_add_balance(
    request: Option<&AddBalanceRequest>,
    operator_id: &str,
) -> Result<ValidatedCredit, WalletError> {
    let request =
        request.ok_or_else(|| WalletError::Validation("Request body is required".to_string()))?;

    if request.balance <= Decimal::ZERO {
        return Err(WalletError::Validation(
            "Balance must be greater than zero".to_string(),
        ));
    }

    let user_id = request.user_id.trim();
    if user_id.is_empty() {
        return Err(WalletError::Validation("User ID is required".to_string()));
    }

    let wallet_type: WalletType = request
        .wallet_type
        .parse()
        .map_err(|_| WalletError::InvalidWalletType(request.wallet_type.clone()))?;

    let operator_id = operator_id.trim();
    if operator_id.is_empty() {
        return Err(WalletError::Validation("Admin ID is required".to_string()));
    }

    Ok(ValidatedCredit {
        user_id: user_id.to_string(),
        wallet_type,
        money: request.balance,
        operator_id: operator_id.to_string(),
    })
}

/// Validates a user debit.
///
/// Order: request present, user ID present, no negative price, at least one
/// positive price.
///
/// # Errors
///
/// Returns `WalletError::Validation` for the first failing check.
pub fn validate_deduct_balance(
    request: Option<&DeductBalanceRequest>,
    user_id: &str,
) -> Result<ValidatedDebit, WalletError> {
    let request =
        request.ok_or_else(|| WalletError::Validation("Request body is required".to_string()))?;

    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(WalletError::Validation("User ID is required".to_string()));
    }

    if request.price_store < Decimal::ZERO || request.price_service < Decimal::ZERO {
        return Err(WalletError::Validation(
            "Prices cannot be negative".to_string(),
        ));
    }

    let changes: Vec<BalanceChange> = [
        BalanceChange::new(WalletType::Service, request.price_service),
        BalanceChange::new(WalletType::Store, request.price_store),
    ]
    .into_iter()
    .filter(|c| c.amount > Decimal::ZERO)
    .collect();

    if changes.is_empty() {
        return Err(WalletError::Validation(
            "At least one price must be greater than zero".to_string(),
        ));
    }

    Ok(ValidatedDebit {
        user_id: user_id.to_string(),
        changes,
    })
}
