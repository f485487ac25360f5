//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes for wallets and exchange rates
//! - Authentication middleware
//! - The response envelope and error mapping
//! - The HTTP identity service client

pub mod identity;
pub mod middleware;
pub mod response;
pub mod routes;

use axum::Router;
use saku_core::wallet::{ExchangeRateProvider, ExchangeRateStore, WalletService};
use saku_shared::JwtService;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Wallet orchestration.
    pub wallet_service: Arc<WalletService>,
    /// Exchange rate management.
    pub rate_store: Arc<dyn ExchangeRateStore>,
    /// Active exchange rate lookup.
    pub rate_provider: Arc<dyn ExchangeRateProvider>,
    /// JWT service for token validation.
    pub jwt_service: Arc<JwtService>,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
