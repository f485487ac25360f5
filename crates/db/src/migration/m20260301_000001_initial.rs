//! Initial database migration.
//!
//! Creates the wallet, exchange rate, and ledger tables plus the trigger that
//! keeps the ledger append-only.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: TABLES
        // ============================================================
        db.execute_unprepared(WALLETS_SQL).await?;
        db.execute_unprepared(EXCHANGE_RATES_SQL).await?;
        db.execute_unprepared(WALLET_TRANSACTIONS_SQL).await?;

        // ============================================================
        // PART 3: TRIGGERS
        // ============================================================
        db.execute_unprepared(APPEND_ONLY_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_SQL).await?;
        Ok(())
    }
}

// Amount and rate columns are unconstrained NUMERIC so every rust_decimal
// value round-trips without rounding or a precision error.
const ENUMS_SQL: &str = r"
CREATE TYPE wallet_type AS ENUM ('store', 'service');
CREATE TYPE transaction_kind AS ENUM ('deposit', 'purchase');
";

const WALLETS_SQL: &str = r"
CREATE TABLE wallets (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id VARCHAR(255) NOT NULL,
    wallet_type wallet_type NOT NULL,
    balance NUMERIC NOT NULL DEFAULT 0,
    version BIGINT NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_wallets_user_type UNIQUE (user_id, wallet_type),
    CONSTRAINT chk_wallet_balance_non_negative CHECK (balance >= 0)
);
";

const EXCHANGE_RATES_SQL: &str = r"
CREATE TABLE exchange_rates (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    currency VARCHAR(3) NOT NULL,
    rate NUMERIC NOT NULL,
    active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_rate_positive CHECK (rate > 0)
);

CREATE INDEX idx_exchange_rates_active_created
    ON exchange_rates (created_at DESC, id DESC)
    WHERE active;
";

const WALLET_TRANSACTIONS_SQL: &str = r"
CREATE TABLE wallet_transactions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id VARCHAR(255) NOT NULL,
    kind transaction_kind NOT NULL,
    amount NUMERIC NOT NULL,
    money NUMERIC,
    currency VARCHAR(3),
    order_id VARCHAR(255),
    admin_id VARCHAR(255),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_transaction_amount_positive CHECK (amount > 0)
);

CREATE INDEX idx_wallet_transactions_user_created
    ON wallet_transactions (user_id, created_at DESC, id DESC);
";

const APPEND_ONLY_SQL: &str = r"
-- ============================================================
-- FUNCTION: prevent_wallet_transaction_modification
-- Ledger rows are written once and never changed
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_wallet_transaction_modification()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'wallet_transactions is append-only: % rejected', TG_OP;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_wallet_transactions_append_only
BEFORE UPDATE OR DELETE ON wallet_transactions
FOR EACH ROW
EXECUTE FUNCTION prevent_wallet_transaction_modification();
";

const DROP_SQL: &str = r"
DROP TRIGGER IF EXISTS trg_wallet_transactions_append_only ON wallet_transactions;
DROP FUNCTION IF EXISTS prevent_wallet_transaction_modification();
DROP TABLE IF EXISTS wallet_transactions;
DROP TABLE IF EXISTS exchange_rates;
DROP TABLE IF EXISTS wallets;
DROP TYPE IF EXISTS transaction_kind;
DROP TYPE IF EXISTS wallet_type;
";
