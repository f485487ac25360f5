//! Exchange rates and conversion into internal balance units.

pub mod conversion;
pub mod exchange;

pub use conversion::{BALANCE_SCALE, convert_amount, to_internal_units};
pub use exchange::{ExchangeRate, ExchangeRateUpdate, NewExchangeRate, RateValidationError};
