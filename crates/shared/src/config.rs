//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// Identity service configuration.
    pub identity: IdentityConfig,
    /// Wallet behavior knobs.
    #[serde(default)]
    pub wallet: WalletConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8009
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT settings as read from configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key shared with the identity service.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    900 // 15 minutes
}

/// Where to find the identity service.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    /// Base URL, e.g. `http://identity:8001`.
    pub base_url: String,
    /// Bearer token presented when listing users.
    #[serde(default)]
    pub service_token: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_identity_timeout")]
    pub timeout_secs: u64,
}

fn default_identity_timeout() -> u64 {
    5
}

/// What to do when a balance write succeeded but the ledger append failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerFailurePolicy {
    /// Keep the balance change and report the missing audit record.
    #[default]
    AcceptGap,
    /// Reverse the balance change, then report the failure.
    Rollback,
}

/// Wallet behavior knobs.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WalletConfig {
    /// Ledger failure handling.
    #[serde(default)]
    pub ledger_failure_policy: LedgerFailurePolicy,
    /// Re-credit wallets already decremented when a multi-wallet debit
    /// fails halfway through on a store without multi-row transactions.
    #[serde(default = "default_compensate")]
    pub compensate_partial_debits: bool,
    /// Retries of a version-guarded credit after a version conflict.
    #[serde(default = "default_max_credit_retries")]
    pub max_credit_retries: u32,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            ledger_failure_policy: LedgerFailurePolicy::default(),
            compensate_partial_debits: default_compensate(),
            max_credit_retries: default_max_credit_retries(),
        }
    }
}

fn default_compensate() -> bool {
    true
}

fn default_max_credit_retries() -> u32 {
    3
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, later ones winning: `config/default`, `config/{RUN_MODE}`,
    /// then `SAKU__SECTION__KEY` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("SAKU").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
