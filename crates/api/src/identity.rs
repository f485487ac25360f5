//! HTTP client for the identity service.
//!
//! Lists users via `GET {base_url}/api/v1/users`. The service answers with
//! either the standard envelope (`{"data": [...]}`) or a bare array; each
//! item carries a `user_id`.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use saku_core::wallet::{IdentityProvider, StoreError};
use saku_shared::IdentityConfig;
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct UserItem {
    user_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum UsersBody {
    Envelope { data: Vec<UserItem> },
    Bare(Vec<UserItem>),
}

impl UsersBody {
    fn into_ids(self) -> HashSet<String> {
        let items = match self {
            Self::Envelope { data } => data,
            Self::Bare(items) => items,
        };
        items.into_iter().map(|u| u.user_id).collect()
    }
}

/// Identity provider backed by the identity service's REST API.
#[derive(Debug, Clone)]
pub struct HttpIdentityProvider {
    client: Client,
    users_url: String,
    service_token: Option<String>,
}

impl HttpIdentityProvider {
    /// Creates a client for the configured identity service.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &IdentityConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            users_url: format!("{}/api/v1/users", config.base_url.trim_end_matches('/')),
            service_token: config.service_token.clone(),
        })
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn list_user_ids(&self) -> Result<HashSet<String>, StoreError> {
        let mut request = self.client.get(&self.users_url);
        if let Some(token) = &self.service_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            warn!(url = %self.users_url, error = %e, "Identity service unreachable");
            StoreError::Unavailable(format!("identity service unreachable: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %self.users_url, status = %status, "Identity service returned an error");
            return Err(StoreError::Unavailable(format!(
                "identity service returned {status}"
            )));
        }

        let body: UsersBody = response.json().await.map_err(|e| {
            StoreError::Unavailable(format!("identity service sent an unreadable body: {e}"))
        })?;

        let ids = body.into_ids();
        debug!(users = ids.len(), "Fetched user list from identity service");
        Ok(ids)
    }
}
