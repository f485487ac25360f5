//! Postgres enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "wallet_type")]
pub enum WalletType {
    #[sea_orm(string_value = "store")]
    Store,
    #[sea_orm(string_value = "service")]
    Service,
}

impl From<saku_core::wallet::WalletType> for WalletType {
    fn from(value: saku_core::wallet::WalletType) -> Self {
        match value {
            saku_core::wallet::WalletType::Store => Self::Store,
            saku_core::wallet::WalletType::Service => Self::Service,
        }
    }
}

impl From<WalletType> for saku_core::wallet::WalletType {
    fn from(value: WalletType) -> Self {
        match value {
            WalletType::Store => Self::Store,
            WalletType::Service => Self::Service,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_kind")]
pub enum TransactionKind {
    #[sea_orm(string_value = "deposit")]
    Deposit,
    #[sea_orm(string_value = "purchase")]
    Purchase,
}

impl From<saku_core::wallet::TransactionKind> for TransactionKind {
    fn from(value: saku_core::wallet::TransactionKind) -> Self {
        match value {
            saku_core::wallet::TransactionKind::Deposit => Self::Deposit,
            saku_core::wallet::TransactionKind::Purchase => Self::Purchase,
        }
    }
}

impl From<TransactionKind> for saku_core::wallet::TransactionKind {
    fn from(value: TransactionKind) -> Self {
        match value {
            TransactionKind::Deposit => Self::Deposit,
            TransactionKind::Purchase => Self::Purchase,
        }
    }
}
