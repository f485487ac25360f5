//! Wallet domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use saku_shared::types::{TransactionId, WalletId};
use serde::{Deserialize, Serialize};

/// The two independently tracked wallet kinds every user owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletType {
    /// Balance spent in the store.
    Store,
    /// Balance spent on services.
    Service,
}

impl WalletType {
    /// Every wallet type, in bootstrap order.
    pub const ALL: [Self; 2] = [Self::Store, Self::Service];

    /// Returns the wire name of the wallet type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Store => "store",
            Self::Service => "service",
        }
    }
}

impl std::fmt::Display for WalletType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WalletType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "store" => Ok(Self::Store),
            "service" => Ok(Self::Service),
            other => Err(format!("Unknown wallet type: {other}")),
        }
    }
}

/// A stored wallet row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Wallet {
    /// Row ID.
    pub id: WalletId,
    /// Owner as issued by the identity service.
    pub user_id: String,
    /// Which of the user's wallets this is.
    pub wallet_type: WalletType,
    /// Current balance in internal units, never negative.
    pub balance: Decimal,
    /// Incremented on every balance change.
    pub version: i64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last balance change.
    pub updated_at: DateTime<Utc>,
}

/// Input for inserting an empty wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWallet {
    /// Owner.
    pub user_id: String,
    /// Wallet kind.
    pub wallet_type: WalletType,
}

impl NewWallet {
    /// Creates an insert request for a zero-balance wallet.
    #[must_use]
    pub fn empty(user_id: &str, wallet_type: WalletType) -> Self {
        Self {
            user_id: user_id.to_string(),
            wallet_type,
        }
    }
}

/// An amount applied to one wallet of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BalanceChange {
    /// Target wallet.
    pub wallet_type: WalletType,
    /// Positive amount in internal units.
    pub amount: Decimal,
}

impl BalanceChange {
    /// Creates a balance change.
    #[must_use]
    pub const fn new(wallet_type: WalletType, amount: Decimal) -> Self {
        Self {
            wallet_type,
            amount,
        }
    }
}

/// Balance view of one wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletBalance {
    /// Current balance.
    pub balance: Decimal,
    /// Wallet kind.
    pub wallet_type: WalletType,
}

/// All wallets of one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletsByUser {
    /// Owner.
    pub user_id: String,
    /// One entry per wallet, store first.
    pub wallet: Vec<WalletBalance>,
}

/// Credit request as received from an operator.
///
/// `wallet_type` stays a raw string so an unknown value is reported as an
/// invalid wallet type rather than a deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddBalanceRequest {
    /// Target user.
    #[serde(default)]
    pub user_id: String,
    /// Target wallet, "store" or "service".
    #[serde(default)]
    pub wallet_type: String,
    /// External money amount to convert.
    #[serde(default)]
    pub balance: Decimal,
}

/// Debit request as received from the paying user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeductBalanceRequest {
    /// Amount taken from the store wallet.
    #[serde(default)]
    pub price_store: Decimal,
    /// Amount taken from the service wallet.
    #[serde(default)]
    pub price_service: Decimal,
}

/// Kind of balance-affecting event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Operator credit of converted external money.
    Deposit,
    /// User debit of one or both wallets.
    Purchase,
}

impl TransactionKind {
    /// Returns the wire name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Purchase => "purchase",
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ledger entry to append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    /// Affected user.
    pub user_id: String,
    /// Event kind.
    pub kind: TransactionKind,
    /// Internal units actually applied.
    pub amount: Decimal,
    /// External money amount (deposits).
    pub money: Option<Decimal>,
    /// Currency of the active rate at the time of the event.
    pub currency: Option<String>,
    /// Order reference (purchases placed by an order service).
    pub order_id: Option<String>,
    /// Operator who performed a deposit.
    pub admin_id: Option<String>,
}

impl NewTransaction {
    /// Ledger entry for an operator credit.
    #[must_use]
    pub fn deposit(
        user_id: &str,
        amount: Decimal,
        money: Decimal,
        currency: &str,
        admin_id: &str,
    ) -> Self {
        Self {
            user_id: user_id.to_string(),
            kind: TransactionKind::Deposit,
            amount,
            money: Some(money),
            currency: Some(currency.to_string()),
            order_id: None,
            admin_id: Some(admin_id.to_string()),
        }
    }

    /// Ledger entry for a user debit.
    #[must_use]
    pub fn purchase(user_id: &str, amount: Decimal, currency: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            kind: TransactionKind::Purchase,
            amount,
            money: None,
            currency: Some(currency.to_string()),
            order_id: None,
            admin_id: None,
        }
    }
}

/// Immutable ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    /// Entry ID.
    pub id: TransactionId,
    /// Affected user.
    pub user_id: String,
    /// Event kind.
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// Internal units applied.
    pub amount: Decimal,
    /// External money amount (deposits).
    pub money: Option<Decimal>,
    /// Currency tag.
    pub currency: Option<String>,
    /// Order reference.
    pub order_id: Option<String>,
    /// Operator reference.
    pub admin_id: Option<String>,
    /// When the entry was written.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    #[test]
    fn test_wallet_type_round_trip_names() {
        for wallet_type in WalletType::ALL {
            assert_eq!(WalletType::from_str(wallet_type.as_str()), Ok(wallet_type));
        }
    }

    #[test]
    fn test_wallet_type_is_case_sensitive() {
        assert!(WalletType::from_str("Store").is_err());
        assert!(WalletType::from_str("wallet").is_err());
        assert!(WalletType::from_str("").is_err());
    }

    #[test]
    fn test_requests_default_missing_fields() {
        let req: DeductBalanceRequest = serde_json::from_str(r#"{"price_store": "5"}"#).unwrap();
        assert_eq!(req.price_store, dec!(5));
        assert_eq!(req.price_service, Decimal::ZERO);
    }

    #[test]
    fn test_add_balance_accepts_numbers() {
        let req: AddBalanceRequest =
            serde_json::from_str(r#"{"user_id":"u1","wallet_type":"store","balance":10}"#).unwrap();
        assert_eq!(req.balance, dec!(10));
        assert_eq!(req.wallet_type, "store");
    }

    #[test]
    fn test_transaction_serializes_kind_as_type() {
        let tx = Transaction {
            id: TransactionId::new(),
            user_id: "u1".into(),
            kind: TransactionKind::Deposit,
            amount: dec!(15000),
            money: Some(dec!(10)),
            currency: Some("USD".into()),
            order_id: None,
            admin_id: Some("op".into()),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["type"], "deposit");
        assert_eq!(json["admin_id"], "op");
    }
}
