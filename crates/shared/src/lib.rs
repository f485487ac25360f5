//! Shared types, errors, and configuration for Saku.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for wallet, transaction, and exchange rate records
//! - Pagination types for list endpoints
//! - Application-wide error types
//! - Configuration management
//! - JWT claims and token validation

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;
pub mod types;

pub use auth::Claims;
pub use config::{AppConfig, IdentityConfig, LedgerFailurePolicy, WalletConfig};
pub use error::{AppError, AppResult};
pub use jwt::{JwtConfig, JwtError, JwtService};
