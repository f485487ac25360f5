//! Authentication claims carried by bearer tokens.
//!
//! Tokens are issued by the identity service; this service only validates
//! them and reads the subject and role.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role name that grants access to operator-only endpoints.
pub const ADMIN_ROLE: &str = "admin";

/// JWT claims for access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID as issued by the identity service).
    pub sub: String,
    /// Role of the subject.
    #[serde(default)]
    pub role: String,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user.
    #[must_use]
    pub fn new(user_id: &str, role: &str, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id.to_string(),
            role: role.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the user ID from claims.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.sub
    }

    /// Whether the subject may manage exchange rates.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role.eq_ignore_ascii_case(ADMIN_ROLE)
    }
}
