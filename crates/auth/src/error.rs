//! Error taxonomy for the unified authentication layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Authentication error surfaced to callers and the UI layer.
///
/// Adapters map vendor failures onto this taxonomy; the facade passes
/// errors through unmodified.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AuthError {
    /// Client-correctable input problem (malformed email, weak password,
    /// address already registered).
    #[error("invalid input: {0}")]
    Validation(String),

    /// Email/password pair rejected by the vendor.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Transport-level failure talking to the vendor backend; retryable.
    #[error("network error: {0}")]
    Network(String),

    /// Opaque vendor-side failure.
    #[error("provider error: {0}")]
    Provider(String),

    /// The user closed the federated sign-in window before completing
    /// the flow. Non-fatal; the UI should allow a silent retry.
    #[error("sign-in window was closed before completing")]
    PopupClosed,

    /// The session-change listener could not be attached.
    #[error("session listener setup failed: {0}")]
    SubscriptionSetup(String),

    /// Missing or malformed configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl AuthError {
    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::Validation(_) => "VALIDATION_ERROR",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::Network(_) => "NETWORK_ERROR",
            AuthError::Provider(_) => "PROVIDER_ERROR",
            AuthError::PopupClosed => "POPUP_CLOSED",
            AuthError::SubscriptionSetup(_) => "SUBSCRIPTION_SETUP_ERROR",
            AuthError::Configuration(_) => "CONFIGURATION_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::Network(_) => StatusCode::BAD_GATEWAY,
            AuthError::Provider(_) => StatusCode::BAD_GATEWAY,
            AuthError::PopupClosed => StatusCode::BAD_REQUEST,
            AuthError::SubscriptionSetup(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        AuthError::Network(err.to_string())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        }));

        (self.status(), body).into_response()
    }
}
