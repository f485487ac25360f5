//! Per-user wallets and their balance mutations.
//!
//! This module implements the wallet core:
//! - Closed wallet type enumeration and domain records
//! - Input validation for credit and debit requests
//! - The error taxonomy surfaced to callers
//! - Ports to the wallet store, ledger, rate provider, and identity provider
//! - The `WalletService` orchestrating credit and debit
//! - In-memory adapters for tests and local runs

pub mod error;
pub mod memory;
pub mod ports;
pub mod service;
pub mod types;
pub mod validation;

#[cfg(test)]
mod service_props;

pub use error::WalletError;
pub use ports::{
    ExchangeRateProvider, ExchangeRateStore, IdentityProvider, StoreError, TransactionLedger,
    WalletStore,
};
pub use service::WalletService;
pub use types::{
    AddBalanceRequest, BalanceChange, DeductBalanceRequest, NewTransaction, NewWallet,
    Transaction, TransactionKind, Wallet, WalletBalance, WalletType, WalletsByUser,
};
pub use validation::{ValidatedCredit, ValidatedDebit, validate_add_balance, validate_deduct_balance};
