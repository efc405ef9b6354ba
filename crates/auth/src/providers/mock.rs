//! Mock provider for tests and local development.

use async_trait::async_trait;
use base64::Engine;
use plotdeck_core::auth::{AuthError, AzureClaims, AzureProviderClient, Result};
use url::Url;

/// Fake Azure provider whose authorization codes are base64-encoded JSON
/// carrying the identity they resolve to. No network involved.
pub struct MockProvider {
    authorize_url: Url,
    redirect_uri: Url,
}

impl MockProvider {
    pub fn new(authorize_url: Url, redirect_uri: Url) -> Self {
        Self {
            authorize_url,
            redirect_uri,
        }
    }

    /// Builds the authorization code `exchange_code` expects for the given
    /// identity.
    pub fn encode_code(oid: &str, email: Option<&str>, name: Option<&str>) -> String {
        let payload = serde_json::json!({
            "oid": oid,
            "email": email,
            "name": name,
        });
        base64::engine::general_purpose::STANDARD.encode(payload.to_string())
    }
}

#[async_trait]
impl AzureProviderClient for MockProvider {
    async fn authorization_url(&self, state: &str) -> Result<Url> {
        let mut url = self.authorize_url.clone();
        url.query_pairs_mut()
            .append_pair("state", state)
            .append_pair("redirect_uri", self.redirect_uri.as_str());
        Ok(url)
    }

    async fn exchange_code(&self, code: &str) -> Result<AzureClaims> {
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(code)
            .map_err(|e| AuthError::CodeExchange(e.to_string()))?;

        let json: serde_json::Value =
            serde_json::from_slice(&decoded).map_err(|e| AuthError::CodeExchange(e.to_string()))?;

        let subject = json["oid"]
            .as_str()
            .ok_or_else(|| AuthError::CodeExchange("no oid in mock code".to_string()))?;

        Ok(AzureClaims {
            subject: subject.to_string(),
            email: json["email"].as_str().map(String::from),
            name: json["name"].as_str().map(String::from),
        })
    }
}
