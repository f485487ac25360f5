//! Database seeder for local development.
//!
//! Seeds an active exchange rate when none exists and, if `SEED_USER_ID` is
//! set, the wallet pair of that user.
//!
//! Usage: cargo run --bin seeder

use std::str::FromStr;

use anyhow::Context;
use rust_decimal::Decimal;
use saku_core::currency::NewExchangeRate;
use saku_core::wallet::{
    ExchangeRateProvider, ExchangeRateStore, NewWallet, StoreError, WalletStore, WalletType,
};
use saku_db::{ExchangeRateRepository, WalletRepository};
use saku_shared::config::DatabaseConfig;

/// Default currency of the seeded rate.
const DEFAULT_CURRENCY: &str = "USD";
/// Internal units per unit of the default currency.
const DEFAULT_RATE: &str = "1500";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set in environment")?;

    println!("Connecting to database...");
    let db = saku_db::connect(&DatabaseConfig {
        url,
        max_connections: 2,
        min_connections: 1,
    })
    .await
    .context("Failed to connect to database")?;

    println!("Seeding exchange rate...");
    seed_exchange_rate(&ExchangeRateRepository::new(db.clone())).await?;

    if let Ok(user_id) = std::env::var("SEED_USER_ID") {
        println!("Seeding wallets for {user_id}...");
        seed_wallets(&WalletRepository::new(db), &user_id).await?;
    }

    println!("Seeding complete!");
    Ok(())
}

async fn seed_exchange_rate(rates: &ExchangeRateRepository) -> anyhow::Result<()> {
    if let Some(active) = rates.active_rate().await? {
        println!(
            "  Active rate {} {} already exists, skipping...",
            active.currency, active.rate
        );
        return Ok(());
    }

    let input = NewExchangeRate {
        currency: DEFAULT_CURRENCY.to_string(),
        rate: Decimal::from_str(DEFAULT_RATE)?,
        active: true,
    }
    .validated()?;

    let rate = rates.create_rate(input).await?;
    println!("  Created {} rate {}", rate.currency, rate.rate);
    Ok(())
}

async fn seed_wallets(wallets: &WalletRepository, user_id: &str) -> anyhow::Result<()> {
    for wallet_type in WalletType::ALL {
        match wallets.insert(NewWallet::empty(user_id, wallet_type)).await {
            Ok(_) => println!("  Created {wallet_type} wallet"),
            Err(StoreError::Duplicate) => {
                println!("  {wallet_type} wallet already exists, skipping...");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
