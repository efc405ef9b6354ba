//! HTTP handlers for the Azure AD auth routes.

use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use plotdeck_core::account::User;
use plotdeck_core::auth::{
    generate_state, is_flow_expired, AuthError as CoreError, AuthFlowState, LinkOutcome,
};

use crate::error::AuthError;
use crate::extractors::CurrentUser;
use crate::AuthState;

/// Query parameters Azure sends to the callback.
#[derive(Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

#[derive(Deserialize)]
pub struct LinkBody {
    pub code: Option<String>,
}

#[derive(Deserialize)]
pub struct UnlinkBody {
    pub password: Option<String>,
}

/// Creates the auth router with all Azure AD routes.
///
/// Routes:
/// - `GET /api/azure/auth` - Return the provider-hosted login URL
/// - `GET /api/azure/auth/callback` - Handle the Azure callback, redirect to the browser app
/// - `POST /api/azure/link` - Link Azure to the authenticated account
/// - `DELETE /api/azure/unlink` - Unlink Azure from the authenticated account
pub fn auth_routes() -> Router<AuthState> {
    Router::new()
        .route("/api/azure/auth", get(azure_auth))
        .route("/api/azure/auth/callback", get(azure_callback))
        .route("/api/azure/link", post(azure_link))
        .route("/api/azure/unlink", delete(azure_unlink))
}

/// Initiates the login flow: stores a fresh CSRF state and returns the
/// authorization URL the browser should navigate to.
async fn azure_auth(State(state): State<AuthState>) -> Result<Json<serde_json::Value>, AuthError> {
    let provider = state.azure().ok_or(CoreError::NotConfigured)?;

    let csrf_state = generate_state();
    state
        .flows
        .store_auth_flow(&csrf_state, &AuthFlowState::new())
        .await?;

    let auth_url = provider.authorization_url(&csrf_state).await?;
    Ok(Json(json!({ "authUrl": auth_url.to_string() })))
}

/// Handles the provider callback. Always responds with a redirect to the
/// browser app: `/azure-callback` with a token on success, `/login` with an
/// error code otherwise.
async fn azure_callback(
    State(state): State<AuthState>,
    Query(query): Query<CallbackQuery>,
) -> Redirect {
    match run_callback(&state, query).await {
        Ok((token, outcome)) => success_redirect(&state.config.client_url, &token, outcome),
        Err(err) => {
            tracing::warn!(code = err.code(), "Azure callback failed");
            error_redirect(&state.config.client_url, &err)
        }
    }
}

/// Links an Azure identity to the authenticated account. The Azure email
/// must match the account email.
async fn azure_link(
    State(state): State<AuthState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<LinkBody>,
) -> Result<Json<User>, AuthError> {
    let provider = state.azure().ok_or(CoreError::NotConfigured)?;

    let code = body
        .code
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| CoreError::Validation("authorization code is required".to_string()))?;

    let claims = provider.exchange_code(code).await?;
    let updated = state.linker().link_to_account(&user, &claims).await?;
    Ok(Json(updated))
}

/// Unlinks the Azure identity, guarded by password re-verification.
async fn azure_unlink(
    State(state): State<AuthState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<UnlinkBody>,
) -> Result<Json<User>, AuthError> {
    let updated = state
        .linker()
        .unlink(&user, body.password.as_deref())
        .await?;
    Ok(Json(updated))
}

/// Failure exits of the callback flow, each with its browser-visible code.
#[derive(Debug)]
enum CallbackError {
    NotConfigured,
    AuthFailed(String),
    NoCode,
    InvalidState,
    NoEmail,
    EmailAlreadyLinked,
    CallbackFailed(String),
    TokenGeneration,
}

impl CallbackError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotConfigured => "azure_not_configured",
            Self::AuthFailed(_) => "azure_auth_failed",
            Self::NoCode => "no_authorization_code",
            Self::InvalidState => "invalid_state",
            Self::NoEmail => "no_email_from_azure",
            Self::EmailAlreadyLinked => "email_already_linked",
            Self::CallbackFailed(_) => "azure_callback_failed",
            Self::TokenGeneration => "token_generation_failed",
        }
    }

    /// Human-readable detail, only ever derived from the provider's own
    /// description, never from internal errors.
    fn message(&self) -> Option<&str> {
        match self {
            Self::AuthFailed(detail) | Self::CallbackFailed(detail) if !detail.is_empty() => {
                Some(detail)
            }
            _ => None,
        }
    }
}

impl From<CoreError> for CallbackError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotConfigured => Self::NotConfigured,
            CoreError::InvalidState => Self::InvalidState,
            CoreError::Validation(_) => Self::NoEmail,
            CoreError::Conflict(_) => Self::EmailAlreadyLinked,
            CoreError::Signing(_) => Self::TokenGeneration,
            CoreError::Provider(detail)
            | CoreError::CodeExchange(detail)
            | CoreError::InvalidToken(detail) => Self::CallbackFailed(detail),
            // Internal failures stay internal; the browser only sees the code.
            CoreError::InvalidPassword | CoreError::Storage(_) => {
                Self::CallbackFailed(String::new())
            }
        }
    }
}

/// The callback pipeline: validate the request, exchange the code, resolve
/// the account, mint a token. Each stage exits to a named error code.
async fn run_callback(
    state: &AuthState,
    query: CallbackQuery,
) -> Result<(String, LinkOutcome), CallbackError> {
    let provider = state.azure().ok_or(CallbackError::NotConfigured)?;

    if let Some(error) = query.error {
        return Err(CallbackError::AuthFailed(
            query.error_description.unwrap_or(error),
        ));
    }

    let code = query.code.ok_or(CallbackError::NoCode)?;

    // CSRF binding: the state must be one we issued, unexpired, used once.
    let csrf_state = query.state.ok_or(CallbackError::InvalidState)?;
    let flow = state
        .flows
        .take_auth_flow(&csrf_state)
        .await?
        .ok_or(CallbackError::InvalidState)?;
    if is_flow_expired(&flow, Utc::now()) {
        return Err(CallbackError::InvalidState);
    }

    let claims = provider.exchange_code(&code).await?;
    let (user, outcome) = state.linker().resolve_or_create(&claims).await?;
    let token = state.tokens.issue(&user)?;

    Ok((token, outcome))
}

fn client_path(client: &Url, path: &str, query: &str) -> String {
    let base = client.as_str().trim_end_matches('/');
    format!("{base}/{path}?{query}")
}

fn success_redirect(client: &Url, token: &str, outcome: LinkOutcome) -> Redirect {
    let mut query = format!("token={}", urlencoding::encode(token));
    match outcome {
        LinkOutcome::Created => query.push_str("&new=true"),
        LinkOutcome::Linked => query.push_str("&linked=true"),
        LinkOutcome::LoggedIn => {}
    }
    Redirect::to(&client_path(client, "azure-callback", &query))
}

fn error_redirect(client: &Url, err: &CallbackError) -> Redirect {
    let mut query = format!("error={}", err.code());
    if let Some(message) = err.message() {
        query.push_str("&message=");
        query.push_str(&urlencoding::encode(message));
    }
    Redirect::to(&client_path(client, "login", &query))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_path_handles_trailing_slash() {
        let client: Url = "http://localhost:3000".parse().unwrap();
        assert_eq!(
            client_path(&client, "login", "error=no_authorization_code"),
            "http://localhost:3000/login?error=no_authorization_code"
        );
    }

    #[test]
    fn callback_error_codes_match_the_client_contract() {
        assert_eq!(CallbackError::NotConfigured.code(), "azure_not_configured");
        assert_eq!(CallbackError::NoCode.code(), "no_authorization_code");
        assert_eq!(CallbackError::NoEmail.code(), "no_email_from_azure");
        assert_eq!(
            CallbackError::EmailAlreadyLinked.code(),
            "email_already_linked"
        );
        assert_eq!(
            CallbackError::TokenGeneration.code(),
            "token_generation_failed"
        );
    }

    #[test]
    fn only_provider_detail_is_surfaced_as_message() {
        assert_eq!(
            CallbackError::AuthFailed("user cancelled".to_string()).message(),
            Some("user cancelled")
        );
        assert_eq!(CallbackError::InvalidState.message(), None);
        assert_eq!(CallbackError::TokenGeneration.message(), None);
    }

    #[test]
    fn conflict_maps_to_email_already_linked() {
        let err: CallbackError = CoreError::Conflict("taken".to_string()).into();
        assert!(matches!(err, CallbackError::EmailAlreadyLinked));
    }

    #[test]
    fn validation_maps_to_no_email() {
        let err: CallbackError = CoreError::Validation("no email".to_string()).into();
        assert!(matches!(err, CallbackError::NoEmail));
    }
}
