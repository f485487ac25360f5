//! Repository implementations of the wallet ports.

mod exchange_rate;
mod transaction;
mod wallet;

pub use exchange_rate::ExchangeRateRepository;
pub use transaction::TransactionRepository;
pub use wallet::WalletRepository;

use sea_orm::{DbErr, SqlErr};
use saku_core::wallet::StoreError;

/// Maps a database error onto the port error, recognizing unique violations.
pub(crate) fn store_error(err: DbErr) -> StoreError {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        return StoreError::Duplicate;
    }
    StoreError::Unavailable(err.to_string())
}
