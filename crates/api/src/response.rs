//! Response envelope and error mapping.
//!
//! Every response body has the shape
//! `{status_code, message | error, error_code, data?}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use saku_core::wallet::WalletError;
use saku_shared::AppError;
use serde::Serialize;
use tracing::{error, warn};

/// Response envelope.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    /// HTTP status code, repeated in the body.
    pub status_code: u16,
    /// Outcome message for successful calls.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message for failed calls.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Stable error code for failed calls.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
}

/// Builds a successful response with an optional payload.
pub fn success<T: Serialize>(status: StatusCode, data: Option<T>) -> Response {
    let body = Envelope {
        status_code: status.as_u16(),
        message: Some("success".to_string()),
        data,
        error: None,
        error_code: None,
    };
    (status, Json(body)).into_response()
}

/// Builds an error response.
fn failure(status: u16, message: String, code: &'static str) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Envelope<()> = Envelope {
        status_code: status.as_u16(),
        message: None,
        data: None,
        error: Some(message),
        error_code: Some(code),
    };
    (status, Json(body)).into_response()
}

/// Any error a handler can return.
#[derive(Debug)]
pub enum ApiError {
    /// Wallet domain failure.
    Wallet(WalletError),
    /// Everything around the wallet domain.
    App(AppError),
}

impl From<WalletError> for ApiError {
    fn from(err: WalletError) -> Self {
        Self::Wallet(err)
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self::App(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Wallet(err) => {
                let status = err.http_status_code();
                if err.requires_reconciliation() {
                    error!(
                        error = %err,
                        error_code = err.error_code(),
                        reconciliation_required = true,
                        "Wallet operation needs reconciliation"
                    );
                } else if status >= 500 {
                    warn!(error = %err, error_code = err.error_code(), "Wallet operation failed");
                }
                failure(status, err.to_string(), err.error_code())
            }
            Self::App(err) => {
                let status = err.status_code();
                if status >= 500 {
                    error!(error = %err, error_code = err.error_code(), "Request failed");
                }
                failure(status, err.to_string(), err.error_code())
            }
        }
    }
}

/// Result type for handlers.
pub type ApiResult = Result<Response, ApiError>;
