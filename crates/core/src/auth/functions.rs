use chrono::{DateTime, Duration, Utc};
use rand::{distr::Alphanumeric, Rng};

use super::{AuthFlowState, AzureClaims};

/// How long a stored CSRF state remains valid, in minutes.
pub const FLOW_TTL_MINUTES: i64 = 10;

/// Generate a random state parameter for CSRF protection.
pub fn generate_state() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

/// Check whether a stored auth flow has outlived [`FLOW_TTL_MINUTES`].
pub fn is_flow_expired(flow: &AuthFlowState, now: DateTime<Utc>) -> bool {
    now - flow.created_at > Duration::minutes(FLOW_TTL_MINUTES)
}

/// Short uppercase initials derived from the first two characters of the
/// name, or a fixed placeholder for nameless identities.
pub fn initials_icon(name: Option<&str>) -> String {
    match name {
        Some(name) if !name.trim().is_empty() => name
            .trim()
            .chars()
            .take(2)
            .flat_map(char::to_uppercase)
            .collect(),
        _ => "AZ".to_string(),
    }
}

/// Display name for a new account: the provider's name claim, falling back
/// to the email address.
pub fn display_name(claims: &AzureClaims) -> String {
    claims
        .name
        .clone()
        .or_else(|| claims.email.clone())
        .unwrap_or_else(|| "User".to_string())
}
