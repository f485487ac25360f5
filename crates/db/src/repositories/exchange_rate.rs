//! Exchange rate repository.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use saku_core::currency::{ExchangeRate, ExchangeRateUpdate, NewExchangeRate};
use saku_core::wallet::{ExchangeRateProvider, ExchangeRateStore, StoreError};
use saku_shared::types::{ExchangeRateId, PageRequest};
use uuid::Uuid;

use super::store_error;
use crate::entities::exchange_rates;

impl From<exchange_rates::Model> for ExchangeRate {
    fn from(model: exchange_rates::Model) -> Self {
        Self {
            id: ExchangeRateId::from_uuid(model.id),
            currency: model.currency,
            rate: model.rate,
            active: model.active,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

/// Exchange rate repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct ExchangeRateRepository {
    db: DatabaseConnection,
}

impl ExchangeRateRepository {
    /// Creates a new exchange rate repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ExchangeRateProvider for ExchangeRateRepository {
    async fn active_rate(&self) -> Result<Option<ExchangeRate>, StoreError> {
        let rate = exchange_rates::Entity::find()
            .filter(exchange_rates::Column::Active.eq(true))
            .order_by_desc(exchange_rates::Column::CreatedAt)
            .order_by_desc(exchange_rates::Column::Id)
            .one(&self.db)
            .await
            .map_err(store_error)?;
        Ok(rate.map(ExchangeRate::from))
    }
}

#[async_trait]
impl ExchangeRateStore for ExchangeRateRepository {
    async fn create_rate(&self, rate: NewExchangeRate) -> Result<ExchangeRate, StoreError> {
        let now = Utc::now().into();
        let model = exchange_rates::ActiveModel {
            id: Set(Uuid::now_v7()),
            currency: Set(rate.currency),
            rate: Set(rate.rate),
            active: Set(rate.active),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let inserted = model.insert(&self.db).await.map_err(store_error)?;
        Ok(inserted.into())
    }

    async fn list_rates(
        &self,
        page: PageRequest,
    ) -> Result<(Vec<ExchangeRate>, u64), StoreError> {
        let total = exchange_rates::Entity::find()
            .count(&self.db)
            .await
            .map_err(store_error)?;

        let rows = exchange_rates::Entity::find()
            .order_by_desc(exchange_rates::Column::CreatedAt)
            .order_by_desc(exchange_rates::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(store_error)?;

        Ok((rows.into_iter().map(ExchangeRate::from).collect(), total))
    }

    async fn get_rate(&self, id: ExchangeRateId) -> Result<Option<ExchangeRate>, StoreError> {
        let rate = exchange_rates::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(store_error)?;
        Ok(rate.map(ExchangeRate::from))
    }

    async fn update_rate(
        &self,
        id: ExchangeRateId,
        update: ExchangeRateUpdate,
    ) -> Result<ExchangeRate, StoreError> {
        let existing = exchange_rates::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(store_error)?
            .ok_or(StoreError::NotFound)?;

        let mut model = existing.into_active_model();
        if let Some(currency) = update.currency {
            model.currency = Set(currency);
        }
        if let Some(rate) = update.rate {
            model.rate = Set(rate);
        }
        if let Some(active) = update.active {
            model.active = Set(active);
        }
        model.updated_at = Set(Utc::now().into());

        let updated = model.update(&self.db).await.map_err(store_error)?;
        Ok(updated.into())
    }

    async fn delete_rate(&self, id: ExchangeRateId) -> Result<(), StoreError> {
        let result = exchange_rates::Entity::delete_by_id(id.into_inner())
            .exec(&self.db)
            .await
            .map_err(store_error)?;
        if result.rows_affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
