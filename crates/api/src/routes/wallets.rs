//! Wallet routes.
//!
//! Wallet creation and lookup are open; balance changes and ledger listing
//! require a bearer token. The operator of a credit and the payer of a debit
//! are both taken from the token subject.

use axum::{
    Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use saku_core::wallet::{AddBalanceRequest, DeductBalanceRequest};
use saku_shared::{AppError, types::PageRequest};
use serde::de::DeserializeOwned;
use tracing::info;

use crate::AppState;
use crate::middleware::AuthUser;
use crate::response::{ApiResult, success};

/// Routes reachable without a token.
pub fn public_routes() -> Router<AppState> {
    Router::new().route(
        "/wallet/{user_id}",
        get(get_wallets).post(create_wallet),
    )
}

/// Routes behind the auth middleware.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/wallet/add_balance", post(add_balance))
        .route("/wallet/deduct_balance", post(deduct_balance))
        .route("/wallet/{user_id}/transactions", get(list_transactions))
}

/// Parses an optional JSON body; an empty body yields `None`.
fn optional_json<T: DeserializeOwned>(body: &Bytes) -> Result<Option<T>, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| AppError::Validation(format!("Invalid request body: {e}")))
}

/// POST `/wallet/{user_id}` - Create the wallet pair of a user.
async fn create_wallet(State(state): State<AppState>, Path(user_id): Path<String>) -> ApiResult {
    state.wallet_service.create_wallet(&user_id).await?;
    Ok(success::<()>(StatusCode::OK, None))
}

/// GET `/wallet/{user_id}` - Balances of a user, creating wallets on first access.
async fn get_wallets(State(state): State<AppState>, Path(user_id): Path<String>) -> ApiResult {
    let wallets = state.wallet_service.get_wallets_by_user(&user_id).await?;
    Ok(success(StatusCode::OK, Some(wallets)))
}

/// POST `/wallet/add_balance` - Operator credit.
async fn add_balance(State(state): State<AppState>, auth: AuthUser, body: Bytes) -> ApiResult {
    let request: Option<AddBalanceRequest> = optional_json(&body)?;

    let wallet = state
        .wallet_service
        .add_balance(request.as_ref(), auth.user_id())
        .await?;

    info!(
        admin_id = %auth.user_id(),
        user_id = %wallet.user_id,
        wallet_type = %wallet.wallet_type,
        "Credit request completed"
    );

    Ok(success::<()>(StatusCode::OK, None))
}

/// POST `/wallet/deduct_balance` - Debit of the caller's own wallets.
async fn deduct_balance(State(state): State<AppState>, auth: AuthUser, body: Bytes) -> ApiResult {
    let request: Option<DeductBalanceRequest> = optional_json(&body)?;

    let updated = state
        .wallet_service
        .deduct_balance(request.as_ref(), auth.user_id())
        .await?;

    info!(user_id = %auth.user_id(), wallets = updated.len(), "Debit request completed");

    Ok(success::<()>(StatusCode::OK, None))
}

/// GET `/wallet/{user_id}/transactions` - Ledger entries, newest first.
async fn list_transactions(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(user_id): Path<String>,
    Query(page): Query<PageRequest>,
) -> ApiResult {
    let page = state.wallet_service.list_transactions(&user_id, page).await?;
    Ok(success(StatusCode::OK, Some(page)))
}
