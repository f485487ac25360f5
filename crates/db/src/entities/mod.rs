//! `SeaORM` entity definitions.

pub mod exchange_rates;
pub mod sea_orm_active_enums;
pub mod wallet_transactions;
pub mod wallets;
