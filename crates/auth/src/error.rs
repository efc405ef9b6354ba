use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Auth errors for the plotdeck_auth crate.
///
/// Wraps the core `AuthError` and adds crate-specific variants for I/O that
/// can't live in the functional core. The `IntoResponse` impl covers the
/// JSON endpoints (link/unlink); the browser callback maps errors to
/// redirects instead.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Error from the core auth module (linking, validation, signing).
    #[error(transparent)]
    Core(#[from] plotdeck_core::auth::AuthError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        use plotdeck_core::auth::AuthError as CoreError;

        let (status, message) = match &self {
            AuthError::Core(core_err) => match core_err {
                CoreError::NotConfigured => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
                CoreError::Validation(_)
                | CoreError::CodeExchange(_)
                | CoreError::InvalidToken(_)
                | CoreError::InvalidState => (StatusCode::BAD_REQUEST, self.to_string()),
                CoreError::Conflict(_) => (StatusCode::CONFLICT, self.to_string()),
                CoreError::InvalidPassword => (StatusCode::UNAUTHORIZED, self.to_string()),
                CoreError::Provider(_) | CoreError::Signing(_) | CoreError::Storage(_) => {
                    tracing::error!("Auth error: {}", self);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal server error".to_string(),
                    )
                }
            },
            AuthError::Config(_) => {
                tracing::error!("Config error: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server configuration error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
