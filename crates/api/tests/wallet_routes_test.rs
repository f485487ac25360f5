//! Router tests against the in-memory adapters.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use rust_decimal_macros::dec;
use saku_api::{AppState, create_router};
use saku_core::wallet::memory::{
    InMemoryExchangeRates, InMemoryLedger, InMemoryWalletStore, StaticIdentityProvider,
};
use saku_core::wallet::{WalletService, WalletType};
use saku_shared::{JwtConfig, JwtService};
use serde_json::{Value, json};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    store: Arc<InMemoryWalletStore>,
    jwt: Arc<JwtService>,
}

fn test_app() -> TestApp {
    let store = Arc::new(InMemoryWalletStore::new());
    let rates = Arc::new(InMemoryExchangeRates::with_active("USD", dec!(1500)));
    let jwt = Arc::new(JwtService::new(JwtConfig {
        secret: "router-test-secret".to_string(),
        access_token_expires_minutes: 15,
    }));

    let wallet_service = WalletService::new(
        store.clone(),
        Arc::new(InMemoryLedger::new()),
        rates.clone(),
        Arc::new(StaticIdentityProvider::new(["u1"])),
    );

    let state = AppState {
        wallet_service: Arc::new(wallet_service),
        rate_store: rates.clone(),
        rate_provider: rates,
        jwt_service: jwt.clone(),
    };

    TestApp {
        router: create_router(state),
        store,
        jwt,
    }
}

impl TestApp {
    fn token(&self, user_id: &str, role: &str) -> String {
        self.jwt.generate_access_token(user_id, role).unwrap()
    }

    async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }
}

#[tokio::test]
async fn test_health() {
    let app = test_app();
    let (status, body) = app.call(Method::GET, "/api/v1/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_get_wallets_bootstraps() {
    let app = test_app();
    let (status, body) = app.call(Method::GET, "/api/v1/wallet/u1", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status_code"], 200);
    assert_eq!(body["data"]["user_id"], "u1");
    assert_eq!(body["data"]["wallet"][0]["wallet_type"], "store");
    assert_eq!(body["data"]["wallet"][1]["wallet_type"], "service");
    assert_eq!(app.store.wallet_count("u1"), 2);
}

#[tokio::test]
async fn test_create_wallet_twice_conflicts() {
    let app = test_app();
    let (first, _) = app.call(Method::POST, "/api/v1/wallet/u1", None, None).await;
    assert_eq!(first, StatusCode::OK);

    let (second, body) = app.call(Method::POST, "/api/v1/wallet/u1", None, None).await;
    assert_eq!(second, StatusCode::CONFLICT);
    assert_eq!(body["error_code"], "ERR_WALLET_EXISTS");
}

#[tokio::test]
async fn test_add_balance_requires_token() {
    let app = test_app();
    let (status, body) = app
        .call(
            Method::POST,
            "/api/v1/wallet/add_balance",
            None,
            Some(json!({"user_id": "u1", "wallet_type": "store", "balance": 10})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error_code"], "ERR_UNAUTHORIZED");
}

#[tokio::test]
async fn test_credit_then_overdraw() {
    let app = test_app();
    let admin = app.token("admin-1", "admin");
    let user = app.token("u1", "customer");

    let (status, body) = app
        .call(
            Method::POST,
            "/api/v1/wallet/add_balance",
            Some(&admin),
            Some(json!({"user_id": "u1", "wallet_type": "store", "balance": 10})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "success");
    assert!(body.get("data").is_none());
    assert_eq!(app.store.balance("u1", WalletType::Store), Some(dec!(15000)));

    let (status, body) = app
        .call(
            Method::POST,
            "/api/v1/wallet/deduct_balance",
            Some(&user),
            Some(json!({"price_store": 20000, "price_service": 0})),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error_code"], "ERR_INSUFFICIENT_FUNDS");
    assert_eq!(app.store.balance("u1", WalletType::Store), Some(dec!(15000)));
}

#[tokio::test]
async fn test_deduct_balance_succeeds() {
    let app = test_app();
    let admin = app.token("admin-1", "admin");
    let user = app.token("u1", "customer");

    app.call(
        Method::POST,
        "/api/v1/wallet/add_balance",
        Some(&admin),
        Some(json!({"user_id": "u1", "wallet_type": "service", "balance": 1})),
    )
    .await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/v1/wallet/deduct_balance",
            Some(&user),
            Some(json!({"price_service": 500})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("data").is_none());
    assert_eq!(app.store.balance("u1", WalletType::Service), Some(dec!(1000)));

    let (status, body) = app
        .call(Method::GET, "/api/v1/wallet/u1/transactions", Some(&user), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["meta"]["total"], 2);
    assert_eq!(body["data"]["items"][0]["type"], "purchase");
}

#[tokio::test]
async fn test_missing_body_is_validation_error() {
    let app = test_app();
    let user = app.token("u1", "customer");
    let (status, body) = app
        .call(Method::POST, "/api/v1/wallet/deduct_balance", Some(&user), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "ERR_VALIDATION");
}

#[tokio::test]
async fn test_unknown_wallet_type() {
    let app = test_app();
    let admin = app.token("admin-1", "admin");
    let (status, body) = app
        .call(
            Method::POST,
            "/api/v1/wallet/add_balance",
            Some(&admin),
            Some(json!({"user_id": "u1", "wallet_type": "gift", "balance": 10})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "ERR_INVALID_WALLET_TYPE");
}

#[tokio::test]
async fn test_unknown_payer() {
    let app = test_app();
    let stranger = app.token("u9", "customer");
    let (status, body) = app
        .call(
            Method::POST,
            "/api/v1/wallet/deduct_balance",
            Some(&stranger),
            Some(json!({"price_store": 1})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_code"], "ERR_USER_NOT_FOUND");
}

#[tokio::test]
async fn test_exchange_rate_management() {
    let app = test_app();

    let (status, body) = app
        .call(Method::GET, "/api/v1/exchange-rates/active", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["currency"], "USD");

    let customer = app.token("u1", "customer");
    let (status, _) = app
        .call(
            Method::POST,
            "/api/v1/exchange-rates",
            Some(&customer),
            Some(json!({"currency": "eur", "rate": "1600"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = app.token("admin-1", "admin");
    let (status, body) = app
        .call(
            Method::POST,
            "/api/v1/exchange-rates",
            Some(&admin),
            Some(json!({"currency": "eur", "rate": "1600"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["currency"], "EUR");

    let (status, body) = app
        .call(Method::GET, "/api/v1/exchange-rates?per_page=1", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["meta"]["total"], 2);
    assert_eq!(body["data"]["items"][0]["currency"], "EUR");
}

#[tokio::test]
async fn test_invalid_rate_rejected() {
    let app = test_app();
    let admin = app.token("admin-1", "admin");
    let (status, body) = app
        .call(
            Method::POST,
            "/api/v1/exchange-rates",
            Some(&admin),
            Some(json!({"currency": "USD", "rate": "0"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "ERR_VALIDATION");
}

#[tokio::test]
async fn test_rate_update_and_delete() {
    let app = test_app();
    let admin = app.token("admin-1", "admin");

    let (_, created) = app
        .call(
            Method::POST,
            "/api/v1/exchange-rates",
            Some(&admin),
            Some(json!({"currency": "EUR", "rate": "1600"})),
        )
        .await;
    let id = created["data"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/v1/exchange-rates/{id}");

    let (status, body) = app.call(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["currency"], "EUR");

    let (status, body) = app
        .call(Method::PUT, &uri, Some(&admin), Some(json!({"active": false})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["active"], false);

    let (_, body) = app
        .call(Method::GET, "/api/v1/exchange-rates/active", None, None)
        .await;
    assert_eq!(body["data"]["currency"], "USD");

    let (status, _) = app.call(Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.call(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_code"], "ERR_NOT_FOUND");
}

#[tokio::test]
async fn test_rate_update_rejections() {
    let app = test_app();
    let admin = app.token("admin-1", "admin");
    let customer = app.token("u1", "customer");

    let (_, active) = app
        .call(Method::GET, "/api/v1/exchange-rates/active", None, None)
        .await;
    let uri = format!(
        "/api/v1/exchange-rates/{}",
        active["data"]["id"].as_str().unwrap()
    );

    let (status, body) = app
        .call(Method::PUT, &uri, Some(&admin), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "ERR_VALIDATION");

    let (status, _) = app
        .call(Method::PUT, &uri, Some(&customer), Some(json!({"active": false})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.call(Method::DELETE, &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .call(Method::GET, "/api/v1/exchange-rates/not-a-uuid", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "ERR_VALIDATION");

    let missing = format!("/api/v1/exchange-rates/{}", saku_shared::types::ExchangeRateId::new());
    let (status, _) = app
        .call(Method::DELETE, &missing, Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
