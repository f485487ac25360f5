//! Exchange rate management routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
};
use saku_core::currency::{ExchangeRateUpdate, NewExchangeRate};
use saku_core::wallet::{StoreError, WalletError};
use saku_shared::{
    AppError,
    types::{ExchangeRateId, PageRequest, PageResponse},
};
use tracing::{error, info};

use crate::AppState;
use crate::middleware::AuthUser;
use crate::response::{ApiResult, success};

/// Routes reachable without a token.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/exchange-rates", get(list_rates))
        .route("/exchange-rates/active", get(active_rate))
        .route("/exchange-rates/{id}", get(get_rate))
}

/// Routes behind the auth middleware.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/exchange-rates", post(create_rate))
        .route("/exchange-rates/{id}", put(update_rate).delete(delete_rate))
}

fn parse_rate_id(raw: &str) -> Result<ExchangeRateId, AppError> {
    raw.parse()
        .map_err(|_| AppError::Validation(format!("Invalid exchange rate ID: '{raw}'")))
}

fn rate_store_error(id: ExchangeRateId, err: StoreError) -> AppError {
    match err {
        StoreError::NotFound => AppError::NotFound(format!("Exchange rate {id} not found")),
        other => AppError::Database(other.to_string()),
    }
}

/// GET `/exchange-rates/active` - The rate used for conversion.
async fn active_rate(State(state): State<AppState>) -> ApiResult {
    let rate = state
        .rate_provider
        .active_rate()
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or(WalletError::ExchangeRateUnavailable)?;
    Ok(success(StatusCode::OK, Some(rate)))
}

/// GET `/exchange-rates` - All rates, newest first.
async fn list_rates(State(state): State<AppState>, Query(page): Query<PageRequest>) -> ApiResult {
    let page = page.normalized();
    let (items, total) = state
        .rate_store
        .list_rates(page)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    Ok(success(StatusCode::OK, Some(PageResponse::new(items, page, total))))
}

/// POST `/exchange-rates` - Create a rate (admin only).
async fn create_rate(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<NewExchangeRate>,
) -> ApiResult {
    auth.require_admin()?;

    let input = payload
        .validated()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let rate = state.rate_store.create_rate(input).await.map_err(|e| {
        error!(error = %e, "Failed to create exchange rate");
        AppError::Database(e.to_string())
    })?;

    info!(
        rate_id = %rate.id,
        currency = %rate.currency,
        rate = %rate.rate,
        active = rate.active,
        created_by = %auth.user_id(),
        "Exchange rate created"
    );

    Ok(success(StatusCode::CREATED, Some(rate)))
}

/// GET `/exchange-rates/{id}` - One rate.
async fn get_rate(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let id = parse_rate_id(&id)?;
    let rate = state
        .rate_store
        .get_rate(id)
        .await
        .map_err(|e| rate_store_error(id, e))?
        .ok_or_else(|| rate_store_error(id, StoreError::NotFound))?;
    Ok(success(StatusCode::OK, Some(rate)))
}

/// PUT `/exchange-rates/{id}` - Partial update (admin only).
async fn update_rate(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<ExchangeRateUpdate>,
) -> ApiResult {
    auth.require_admin()?;
    let id = parse_rate_id(&id)?;

    let update = payload
        .validated()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let rate = state
        .rate_store
        .update_rate(id, update)
        .await
        .map_err(|e| rate_store_error(id, e))?;

    info!(
        rate_id = %rate.id,
        currency = %rate.currency,
        rate = %rate.rate,
        active = rate.active,
        updated_by = %auth.user_id(),
        "Exchange rate updated"
    );

    Ok(success(StatusCode::OK, Some(rate)))
}

/// DELETE `/exchange-rates/{id}` - Remove a rate (admin only).
async fn delete_rate(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult {
    auth.require_admin()?;
    let id = parse_rate_id(&id)?;

    state
        .rate_store
        .delete_rate(id)
        .await
        .map_err(|e| rate_store_error(id, e))?;

    info!(rate_id = %id, deleted_by = %auth.user_id(), "Exchange rate deleted");

    Ok(success::<()>(StatusCode::OK, None))
}
