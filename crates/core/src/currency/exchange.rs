//! Exchange rate records.
//!
//! Only one rate matters to wallets: the most recently created record with
//! `active = true`. Rates are written by operators and read by the credit and
//! debit paths.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use saku_shared::types::ExchangeRateId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A stored exchange rate: 1 unit of `currency` = `rate` internal units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    /// Record ID.
    pub id: ExchangeRateId,
    /// ISO-style currency code of the external money, e.g. "USD".
    pub currency: String,
    /// Internal units per unit of external money.
    pub rate: Decimal,
    /// Whether this record may be used for conversion.
    pub active: bool,
    /// Creation time; newest active record wins.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl ExchangeRate {
    /// A rate can convert money only if it is active and strictly positive.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.active && self.rate > Decimal::ZERO
    }
}

/// Rejected exchange rate input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RateValidationError {
    /// Rate must be positive.
    #[error("Exchange rate must be positive")]
    NonPositiveRate,

    /// Currency code must be three ASCII letters.
    #[error("Invalid currency code: '{0}'")]
    InvalidCurrency(String),

    /// An update must change at least one field.
    #[error("No fields to update")]
    NoFieldsToUpdate,
}

/// Input for creating an exchange rate.
#[derive(Debug, Clone, Deserialize)]
pub struct NewExchangeRate {
    /// Currency code, normalized to upper case.
    pub currency: String,
    /// Internal units per unit of external money.
    pub rate: Decimal,
    /// Whether the new record is active.
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl NewExchangeRate {
    /// Validates and normalizes the input.
    ///
    /// # Errors
    ///
    /// Returns an error if the rate is not positive or the currency code is
    /// not three ASCII letters.
    pub fn validated(self) -> Result<Self, RateValidationError> {
        check_rate(self.rate)?;
        let currency = normalize_currency(&self.currency)?;
        Ok(Self { currency, ..self })
    }
}

/// Partial update of an exchange rate; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExchangeRateUpdate {
    /// New currency code.
    #[serde(default)]
    pub currency: Option<String>,
    /// New rate.
    #[serde(default)]
    pub rate: Option<Decimal>,
    /// New active flag.
    #[serde(default)]
    pub active: Option<bool>,
}

impl ExchangeRateUpdate {
    /// Validates and normalizes the fields that are present.
    ///
    /// # Errors
    ///
    /// Returns `RateValidationError::NoFieldsToUpdate` if every field is
    /// absent, otherwise the same errors as [`NewExchangeRate::validated`].
    pub fn validated(self) -> Result<Self, RateValidationError> {
        if self.currency.is_none() && self.rate.is_none() && self.active.is_none() {
            return Err(RateValidationError::NoFieldsToUpdate);
        }
        if let Some(rate) = self.rate {
            check_rate(rate)?;
        }
        let currency = self.currency.as_deref().map(normalize_currency).transpose()?;
        Ok(Self { currency, ..self })
    }

    /// Applies the present fields to a stored rate.
    pub fn apply_to(&self, rate: &mut ExchangeRate) {
        if let Some(currency) = &self.currency {
            rate.currency.clone_from(currency);
        }
        if let Some(value) = self.rate {
            rate.rate = value;
        }
        if let Some(active) = self.active {
            rate.active = active;
        }
    }
}

fn check_rate(rate: Decimal) -> Result<(), RateValidationError> {
    if rate <= Decimal::ZERO {
        return Err(RateValidationError::NonPositiveRate);
    }
    Ok(())
}

fn normalize_currency(raw: &str) -> Result<String, RateValidationError> {
    let currency = raw.trim().to_ascii_uppercase();
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(RateValidationError::InvalidCurrency(raw.to_string()));
    }
    Ok(currency)
}
