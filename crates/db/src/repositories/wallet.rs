//! Wallet repository.
//!
//! Credits are version-guarded single-row updates. A debit runs every
//! conditional decrement inside one database transaction, so it applies to
//! all requested wallets or to none.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use saku_core::wallet::{BalanceChange, NewWallet, StoreError, Wallet, WalletStore, WalletType};
use saku_shared::types::WalletId;
use tracing::debug;
use uuid::Uuid;

use super::store_error;
use crate::entities::{sea_orm_active_enums, wallets};

impl From<wallets::Model> for Wallet {
    fn from(model: wallets::Model) -> Self {
        Self {
            id: WalletId::from_uuid(model.id),
            user_id: model.user_id,
            wallet_type: model.wallet_type.into(),
            balance: model.balance,
            version: model.version,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

/// Wallet repository backed by the `wallets` table.
#[derive(Debug, Clone)]
pub struct WalletRepository {
    db: DatabaseConnection,
}

impl WalletRepository {
    /// Creates a new wallet repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

async fn find_wallet<C: ConnectionTrait>(
    conn: &C,
    user_id: &str,
    wallet_type: WalletType,
) -> Result<Option<wallets::Model>, StoreError> {
    wallets::Entity::find()
        .filter(wallets::Column::UserId.eq(user_id))
        .filter(wallets::Column::WalletType.eq(sea_orm_active_enums::WalletType::from(wallet_type)))
        .one(conn)
        .await
        .map_err(store_error)
}

/// Adds `delta` to one wallet, optionally guarded by the current version and
/// by `balance >= minimum`.
async fn shift_balance<C: ConnectionTrait>(
    conn: &C,
    user_id: &str,
    wallet_type: WalletType,
    delta: Decimal,
    expected_version: Option<i64>,
    minimum: Option<Decimal>,
) -> Result<Option<wallets::Model>, StoreError> {
    let mut update = wallets::Entity::update_many()
        .col_expr(
            wallets::Column::Balance,
            Expr::col(wallets::Column::Balance).add(delta),
        )
        .col_expr(
            wallets::Column::Version,
            Expr::col(wallets::Column::Version).add(1),
        )
        .col_expr(wallets::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(wallets::Column::UserId.eq(user_id))
        .filter(wallets::Column::WalletType.eq(sea_orm_active_enums::WalletType::from(wallet_type)));

    if let Some(version) = expected_version {
        update = update.filter(wallets::Column::Version.eq(version));
    }
    if let Some(minimum) = minimum {
        update = update.filter(wallets::Column::Balance.gte(minimum));
    }

    let rows = update.exec_with_returning(conn).await.map_err(store_error)?;
    Ok(rows.into_iter().next())
}

#[async_trait]
impl WalletStore for WalletRepository {
    async fn find_by_user(&self, user_id: &str) -> Result<Vec<Wallet>, StoreError> {
        let rows = wallets::Entity::find()
            .filter(wallets::Column::UserId.eq(user_id))
            .all(&self.db)
            .await
            .map_err(store_error)?;
        Ok(rows.into_iter().map(Wallet::from).collect())
    }

    async fn find_one(
        &self,
        user_id: &str,
        wallet_type: WalletType,
    ) -> Result<Option<Wallet>, StoreError> {
        Ok(find_wallet(&self.db, user_id, wallet_type)
            .await?
            .map(Wallet::from))
    }

    async fn insert(&self, wallet: NewWallet) -> Result<Wallet, StoreError> {
        let now = Utc::now().into();
        let model = wallets::ActiveModel {
            id: Set(Uuid::now_v7()),
            user_id: Set(wallet.user_id),
            wallet_type: Set(wallet.wallet_type.into()),
            balance: Set(Decimal::ZERO),
            version: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let inserted = model.insert(&self.db).await.map_err(store_error)?;
        Ok(inserted.into())
    }

    async fn increment_balance(
        &self,
        user_id: &str,
        wallet_type: WalletType,
        delta: Decimal,
        expected_version: i64,
    ) -> Result<Wallet, StoreError> {
        if let Some(updated) = shift_balance(
            &self.db,
            user_id,
            wallet_type,
            delta,
            Some(expected_version),
            None,
        )
        .await?
        {
            return Ok(updated.into());
        }

        match find_wallet(&self.db, user_id, wallet_type).await? {
            None => Err(StoreError::NotFound),
            Some(current) => {
                debug!(
                    user_id = %user_id,
                    wallet_type = %wallet_type,
                    expected_version,
                    actual_version = current.version,
                    "Wallet version moved"
                );
                Err(StoreError::VersionConflict)
            }
        }
    }

    async fn decrement_balances(
        &self,
        user_id: &str,
        changes: &[BalanceChange],
    ) -> Result<Vec<Wallet>, StoreError> {
        let txn = self.db.begin().await.map_err(store_error)?;
        let mut updated = Vec::with_capacity(changes.len());

        for change in changes {
            let row = shift_balance(
                &txn,
                user_id,
                change.wallet_type,
                -change.amount,
                None,
                Some(change.amount),
            )
            .await?;

            if let Some(row) = row {
                updated.push(row.into());
                continue;
            }

            let current = find_wallet(&txn, user_id, change.wallet_type).await?;
            txn.rollback().await.map_err(store_error)?;
            return Err(match current {
                None => StoreError::NotFound,
                Some(wallet) => StoreError::InsufficientBalance {
                    wallet_type: change.wallet_type,
                    available: wallet.balance,
                },
            });
        }

        txn.commit().await.map_err(store_error)?;
        Ok(updated)
    }

    async fn restore_balances(
        &self,
        user_id: &str,
        changes: &[BalanceChange],
    ) -> Result<(), StoreError> {
        let txn = self.db.begin().await.map_err(store_error)?;

        for change in changes {
            let row = shift_balance(&txn, user_id, change.wallet_type, change.amount, None, None)
                .await?;
            if row.is_none() {
                txn.rollback().await.map_err(store_error)?;
                return Err(StoreError::NotFound);
            }
        }

        txn.commit().await.map_err(store_error)?;
        Ok(())
    }
}
