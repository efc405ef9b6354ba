//! Axum extractors for authentication.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
};

use plotdeck_core::account::User;

use crate::AuthState;

/// Extractor for the authenticated user. Returns 401 if the request carries
/// no valid Bearer session token.
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or((StatusCode::UNAUTHORIZED, "Missing authorization header"))?;

        let token = header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or((StatusCode::UNAUTHORIZED, "Invalid authorization header"))?;

        let claims = auth_state
            .tokens
            .verify(token)
            .map_err(|_| (StatusCode::UNAUTHORIZED, "Invalid or expired token"))?;

        let user = auth_state
            .accounts
            .get_account(claims.id)
            .await
            .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, "User lookup failed"))?
            .ok_or((StatusCode::UNAUTHORIZED, "User not found"))?;

        if !user.active {
            return Err((StatusCode::UNAUTHORIZED, "Account is deactivated"));
        }

        Ok(CurrentUser(user))
    }
}
