//! Core business logic for Saku.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Persistence and the identity service are reached through the traits in
//! [`wallet::ports`]; adapters live in `saku-db` and `saku-api`.
//!
//! # Modules
//!
//! - `currency` - Exchange rate records and external-to-internal conversion
//! - `wallet` - Wallet lifecycle, credit and debit orchestration

pub mod currency;
pub mod wallet;
