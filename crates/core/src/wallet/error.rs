//! Wallet error types.
//!
//! Every failure kind maps to its own stable error code and HTTP status.
//! Two kinds mean a balance and its audit trail may disagree and need an
//! operator to reconcile them; see [`WalletError::requires_reconciliation`].

use rust_decimal::Decimal;
use thiserror::Error;

use super::types::WalletType;

/// Errors that can occur during wallet operations.
#[derive(Debug, Error)]
pub enum WalletError {
    // ========== Validation Errors ==========
    /// Malformed or missing input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Wallet type is empty or not one of the known kinds.
    #[error("Invalid wallet type: '{0}'")]
    InvalidWalletType(String),

    // ========== State Errors ==========
    /// The user already has wallets.
    #[error("Wallets already exist for user {0}")]
    AlreadyExists(String),

    /// The requested wallet does not exist.
    #[error("Wallet not found: user {user_id}, type {wallet_type}")]
    NotFound {
        /// Owner.
        user_id: String,
        /// Missing wallet kind.
        wallet_type: WalletType,
    },

    /// No active, positive exchange rate is configured.
    #[error("No active exchange rate available")]
    ExchangeRateUnavailable,

    /// The credited balance would not fit or would not grow.
    #[error("Balance overflow for {0} wallet")]
    Overflow(WalletType),

    /// The identity service does not know the paying user.
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// A wallet holds less than the requested price.
    #[error("Insufficient funds in {wallet_type} wallet: have {have}, need {need}")]
    InsufficientFunds {
        /// Wallet that cannot cover its price.
        wallet_type: WalletType,
        /// Current balance.
        have: Decimal,
        /// Requested price.
        need: Decimal,
    },

    // ========== Concurrency Errors ==========
    /// Optimistic credit kept losing to concurrent writers.
    #[error("Concurrent modification detected, please retry")]
    ConcurrentModification,

    // ========== Reconciliation Errors ==========
    /// The balance changed but the ledger entry was not written.
    #[error("Balance updated but ledger write failed: {0}")]
    LedgerWriteFailed(String),

    /// Some wallets of a debit were decremented and could not be restored.
    #[error("Debit partially applied and not compensated: {0}")]
    PartialDebitFailure(String),

    // ========== Infrastructure Errors ==========
    /// Persistence or a provider failed before any effect was kept.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl WalletError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "ERR_VALIDATION",
            Self::InvalidWalletType(_) => "ERR_INVALID_WALLET_TYPE",
            Self::AlreadyExists(_) => "ERR_WALLET_EXISTS",
            Self::NotFound { .. } => "ERR_WALLET_NOT_FOUND",
            Self::ExchangeRateUnavailable => "ERR_EXCHANGE_RATE_UNAVAILABLE",
            Self::Overflow(_) => "ERR_BALANCE_OVERFLOW",
            Self::UserNotFound(_) => "ERR_USER_NOT_FOUND",
            Self::InsufficientFunds { .. } => "ERR_INSUFFICIENT_FUNDS",
            Self::ConcurrentModification => "ERR_CONCURRENT_MODIFICATION",
            Self::LedgerWriteFailed(_) => "ERR_LEDGER_WRITE_FAILED",
            Self::PartialDebitFailure(_) => "ERR_PARTIAL_DEBIT",
            Self::StoreUnavailable(_) => "ERR_STORE_UNAVAILABLE",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::Validation(_) | Self::InvalidWalletType(_) => 400,

            // 404 Not Found
            Self::NotFound { .. } | Self::UserNotFound(_) => 404,

            // 409 Conflict
            Self::AlreadyExists(_) | Self::ConcurrentModification => 409,

            // 422 Unprocessable Entity - business rule violations
            Self::InsufficientFunds { .. } | Self::Overflow(_) => 422,

            // 503 Service Unavailable
            Self::ExchangeRateUnavailable | Self::StoreUnavailable(_) => 503,

            // 500 Internal Server Error
            Self::LedgerWriteFailed(_) | Self::PartialDebitFailure(_) => 500,
        }
    }

    /// Whether balances and ledger may now disagree.
    #[must_use]
    pub const fn requires_reconciliation(&self) -> bool {
        matches!(self, Self::LedgerWriteFailed(_) | Self::PartialDebitFailure(_))
    }
}
