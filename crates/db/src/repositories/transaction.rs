//! Ledger repository backed by the append-only `wallet_transactions` table.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use saku_core::wallet::{NewTransaction, StoreError, Transaction, TransactionLedger};
use saku_shared::types::{PageRequest, TransactionId};
use uuid::Uuid;

use super::store_error;
use crate::entities::wallet_transactions;

impl From<wallet_transactions::Model> for Transaction {
    fn from(model: wallet_transactions::Model) -> Self {
        Self {
            id: TransactionId::from_uuid(model.id),
            user_id: model.user_id,
            kind: model.kind.into(),
            amount: model.amount,
            money: model.money,
            currency: model.currency,
            order_id: model.order_id,
            admin_id: model.admin_id,
            created_at: model.created_at.into(),
        }
    }
}

/// Transaction repository for ledger entries.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    db: DatabaseConnection,
}

impl TransactionRepository {
    /// Creates a new transaction repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TransactionLedger for TransactionRepository {
    async fn append(&self, entry: NewTransaction) -> Result<Transaction, StoreError> {
        let model = wallet_transactions::ActiveModel {
            id: Set(Uuid::now_v7()),
            user_id: Set(entry.user_id),
            kind: Set(entry.kind.into()),
            amount: Set(entry.amount),
            money: Set(entry.money),
            currency: Set(entry.currency),
            order_id: Set(entry.order_id),
            admin_id: Set(entry.admin_id),
            created_at: Set(Utc::now().into()),
        };

        let inserted = model.insert(&self.db).await.map_err(store_error)?;
        Ok(inserted.into())
    }

    async fn list_by_user(
        &self,
        user_id: &str,
        page: PageRequest,
    ) -> Result<(Vec<Transaction>, u64), StoreError> {
        let query = wallet_transactions::Entity::find()
            .filter(wallet_transactions::Column::UserId.eq(user_id));

        let total = query.clone().count(&self.db).await.map_err(store_error)?;

        let rows = query
            .order_by_desc(wallet_transactions::Column::CreatedAt)
            .order_by_desc(wallet_transactions::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(store_error)?;

        Ok((rows.into_iter().map(Transaction::from).collect(), total))
    }
}
