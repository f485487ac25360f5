//! Saku wallet server
//!
//! Main entry point for the wallet service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use saku_api::{AppState, create_router, identity::HttpIdentityProvider};
use saku_core::wallet::WalletService;
use saku_db::{ExchangeRateRepository, TransactionRepository, WalletRepository, connect};
use saku_shared::{AppConfig, JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "saku=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = connect(&config.database).await?;
    info!("Connected to database");

    let identity = HttpIdentityProvider::new(&config.identity)?;
    info!(base_url = %config.identity.base_url, "Identity service configured");

    let rates = Arc::new(ExchangeRateRepository::new(db.clone()));
    let wallet_service = WalletService::with_config(
        Arc::new(WalletRepository::new(db.clone())),
        Arc::new(TransactionRepository::new(db)),
        rates.clone(),
        Arc::new(identity),
        config.wallet,
    );
    info!(
        ledger_failure_policy = ?config.wallet.ledger_failure_policy,
        compensate_partial_debits = config.wallet.compensate_partial_debits,
        max_credit_retries = config.wallet.max_credit_retries,
        "Wallet service configured"
    );

    let jwt_service = JwtService::new(JwtConfig {
        secret: config.jwt.secret.clone(),
        access_token_expires_minutes: i64::try_from(config.jwt.access_token_expiry_secs / 60)
            .unwrap_or(i64::MAX),
    });

    let state = AppState {
        wallet_service: Arc::new(wallet_service),
        rate_store: rates.clone(),
        rate_provider: rates,
        jwt_service: Arc::new(jwt_service),
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
