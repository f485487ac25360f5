//! Property-based tests for `WalletService`.
//!
//! - Property 1: Bootstrap idempotence
//! - Property 2: Credit conversion
//! - Property 3: Overdraft leaves balances untouched
//! - Property 4: Successful debit accounting
//! - Property 5: Input rejection

use std::sync::Arc;

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::error::WalletError;
use super::memory::{InMemoryExchangeRates, InMemoryLedger, InMemoryWalletStore, StaticIdentityProvider};
use super::service::WalletService;
use super::types::{AddBalanceRequest, DeductBalanceRequest, TransactionKind, WalletType};
use crate::currency::to_internal_units;

/// Strategy to generate positive money amounts (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate positive exchange rates (0.01 to 2,000.00).
fn positive_rate() -> impl Strategy<Value = Decimal> {
    (1i64..200_000i64).prop_map(|v| Decimal::new(v, 2))
}

/// Strategy to generate non-negative prices in internal units.
fn price() -> impl Strategy<Value = Decimal> {
    (0i64..5_000_000i64).prop_map(|v| Decimal::new(v, 2))
}

fn wallet_type() -> impl Strategy<Value = WalletType> {
    prop_oneof![Just(WalletType::Store), Just(WalletType::Service)]
}

struct Fixture {
    store: Arc<InMemoryWalletStore>,
    ledger: Arc<InMemoryLedger>,
    service: WalletService,
}

fn fixture(rate: Decimal) -> Fixture {
    let store = Arc::new(InMemoryWalletStore::new());
    let ledger = Arc::new(InMemoryLedger::new());
    let service = WalletService::new(
        store.clone(),
        ledger.clone(),
        Arc::new(InMemoryExchangeRates::with_active("USD", rate)),
        Arc::new(StaticIdentityProvider::new(["u1"])),
    );
    Fixture {
        store,
        ledger,
        service,
    }
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(future)
}

fn credit(wallet_type: WalletType, money: Decimal) -> AddBalanceRequest {
    AddBalanceRequest {
        user_id: "u1".to_string(),
        wallet_type: wallet_type.to_string(),
        balance: money,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // =========================================================================
    // Property 1: Bootstrap idempotence
    // =========================================================================

    /// Reading wallets repeatedly never creates more than one pair.
    #[test]
    fn prop_get_wallets_idempotent(reads in 1usize..6) {
        let f = fixture(Decimal::ONE);
        block_on(async {
            let first = f.service.get_wallets_by_user("u1").await.unwrap();
            for _ in 0..reads {
                let again = f.service.get_wallets_by_user("u1").await.unwrap();
                assert_eq!(again, first);
            }
        });
        prop_assert_eq!(f.store.wallet_count("u1"), 2);
    }

    // =========================================================================
    // Property 2: Credit conversion
    // =========================================================================

    /// Post-credit balance equals pre-credit balance plus rate * amount, and a
    /// deposit with that amount is recorded.
    #[test]
    fn prop_credit_adds_converted_amount(
        rate in positive_rate(),
        first in positive_amount(),
        second in positive_amount(),
        target in wallet_type(),
    ) {
        let f = fixture(rate);
        let expected = to_internal_units(second, rate).unwrap();

        let (before, after) = block_on(async {
            f.service.add_balance(Some(&credit(target, first)), "admin").await.unwrap();
            let before = f.store.balance("u1", target).unwrap();
            f.service.add_balance(Some(&credit(target, second)), "admin").await.unwrap();
            (before, f.store.balance("u1", target).unwrap())
        });

        prop_assert_eq!(after, before + expected);

        let entries = block_on(f.ledger.entries_for("u1"));
        let last = entries.last().unwrap();
        prop_assert_eq!(last.kind, TransactionKind::Deposit);
        prop_assert_eq!(last.amount, expected);
        prop_assert_eq!(last.money, Some(second));
    }

    // =========================================================================
    // Property 3: Overdraft leaves balances untouched
    // =========================================================================

    /// A debit above either balance fails with `InsufficientFunds` and
    /// changes nothing.
    #[test]
    fn prop_overdraft_changes_nothing(
        store_money in positive_amount(),
        service_money in positive_amount(),
        excess in positive_amount(),
        overdrawn in wallet_type(),
    ) {
        let f = fixture(Decimal::ONE);

        let result = block_on(async {
            f.service.add_balance(Some(&credit(WalletType::Store, store_money)), "admin").await.unwrap();
            f.service.add_balance(Some(&credit(WalletType::Service, service_money)), "admin").await.unwrap();

            let request = match overdrawn {
                WalletType::Store => DeductBalanceRequest {
                    price_store: store_money + excess,
                    price_service: service_money,
                },
                WalletType::Service => DeductBalanceRequest {
                    price_store: store_money,
                    price_service: service_money + excess,
                },
            };
            f.service.deduct_balance(Some(&request), "u1").await
        });

        let is_insufficient = matches!(
            result,
            Err(WalletError::InsufficientFunds { wallet_type, .. }) if wallet_type == overdrawn
        );
        prop_assert!(is_insufficient);
        prop_assert_eq!(f.store.balance("u1", WalletType::Store), Some(store_money));
        prop_assert_eq!(f.store.balance("u1", WalletType::Service), Some(service_money));
        prop_assert_eq!(block_on(f.ledger.entries_for("u1")).len(), 2);
    }

    // =========================================================================
    // Property 4: Successful debit accounting
    // =========================================================================

    /// A covered debit lowers each wallet by its price and records exactly
    /// one purchase for the sum.
    #[test]
    fn prop_debit_accounting(
        price_store in price(),
        price_service in price(),
    ) {
        prop_assume!(price_store > Decimal::ZERO || price_service > Decimal::ZERO);
        let f = fixture(Decimal::ONE);
        let funding = Decimal::new(100_000, 0);

        block_on(async {
            f.service.add_balance(Some(&credit(WalletType::Store, funding)), "admin").await.unwrap();
            f.service.add_balance(Some(&credit(WalletType::Service, funding)), "admin").await.unwrap();
            let request = DeductBalanceRequest { price_store, price_service };
            f.service.deduct_balance(Some(&request), "u1").await.unwrap();
        });

        prop_assert_eq!(f.store.balance("u1", WalletType::Store), Some(funding - price_store));
        prop_assert_eq!(f.store.balance("u1", WalletType::Service), Some(funding - price_service));

        let purchases: Vec<_> = block_on(f.ledger.entries_for("u1"))
            .into_iter()
            .filter(|t| t.kind == TransactionKind::Purchase)
            .collect();
        prop_assert_eq!(purchases.len(), 1);
        prop_assert_eq!(purchases[0].amount, price_store + price_service);
    }

    // =========================================================================
    // Property 5: Input rejection
    // =========================================================================

    /// Wallet types outside the closed set are rejected.
    #[test]
    fn prop_unknown_wallet_type_rejected(name in "[a-zA-Z]{0,12}") {
        prop_assume!(name != "store" && name != "service");
        let f = fixture(Decimal::ONE);
        let request = AddBalanceRequest {
            user_id: "u1".to_string(),
            wallet_type: name,
            balance: Decimal::ONE,
        };
        let result = block_on(f.service.add_balance(Some(&request), "admin"));
        prop_assert!(matches!(result, Err(WalletError::InvalidWalletType(_))));
    }

    /// Non-positive credit amounts are rejected.
    #[test]
    fn prop_non_positive_credit_rejected(cents in -1_000_000i64..=0) {
        let f = fixture(Decimal::ONE);
        let result = block_on(
            f.service.add_balance(Some(&credit(WalletType::Store, Decimal::new(cents, 2))), "admin"),
        );
        prop_assert!(matches!(result, Err(WalletError::Validation(_))));
        prop_assert_eq!(f.store.wallet_count("u1"), 0);
    }

    /// Negative prices are rejected whatever the other price is.
    #[test]
    fn prop_negative_price_rejected(
        negative in (1i64..1_000_000i64).prop_map(|v| Decimal::new(-v, 2)),
        other in price(),
        negative_on_store in any::<bool>(),
    ) {
        let f = fixture(Decimal::ONE);
        let request = if negative_on_store {
            DeductBalanceRequest { price_store: negative, price_service: other }
        } else {
            DeductBalanceRequest { price_store: other, price_service: negative }
        };
        let result = block_on(f.service.deduct_balance(Some(&request), "u1"));
        prop_assert!(matches!(result, Err(WalletError::Validation(_))));
    }
}
