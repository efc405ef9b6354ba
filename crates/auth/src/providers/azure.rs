//! Azure AD (Entra ID) OIDC provider implementation.

use async_trait::async_trait;
use openidconnect::{
    core::{
        CoreAuthDisplay, CoreAuthPrompt, CoreAuthenticationFlow, CoreErrorResponseType,
        CoreGenderClaim, CoreJsonWebKey, CoreJweContentEncryptionAlgorithm,
        CoreJwsSigningAlgorithm, CoreProviderMetadata, CoreRevocableToken,
        CoreRevocationErrorResponse, CoreTokenIntrospectionResponse, CoreTokenType,
    },
    reqwest, AdditionalClaims, AuthorizationCode, Client, ClientId, ClientSecret, CsrfToken,
    EmptyExtraTokenFields, EndpointMaybeSet, EndpointNotSet, EndpointSet, IdTokenFields,
    IssuerUrl, Nonce, RedirectUrl, Scope, StandardErrorResponse, StandardTokenResponse,
    TokenResponse,
};
use plotdeck_core::auth::{
    generate_state, AuthError, AzureClaims, AzureProviderClient, Result,
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::AzureConfig;

/// Azure claims outside the OIDC standard set.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AzureTokenClaims {
    /// Immutable directory object identifier. Preferred over `sub`, which is
    /// pairwise per application.
    oid: Option<String>,
}

impl AdditionalClaims for AzureTokenClaims {}

type AzureIdTokenFields = IdTokenFields<
    AzureTokenClaims,
    EmptyExtraTokenFields,
    CoreGenderClaim,
    CoreJweContentEncryptionAlgorithm,
    CoreJwsSigningAlgorithm,
>;

type AzureTokenResponse = StandardTokenResponse<AzureIdTokenFields, CoreTokenType>;

/// Type alias for the client configured from provider metadata.
///
/// `from_provider_metadata` returns a client with:
/// - HasAuthUrl = EndpointSet (always set from discovery)
/// - HasDeviceAuthUrl = EndpointNotSet
/// - HasIntrospectionUrl = EndpointNotSet
/// - HasRevocationUrl = EndpointNotSet
/// - HasTokenUrl = EndpointMaybeSet (may or may not be in discovery)
/// - HasUserInfoUrl = EndpointMaybeSet (may or may not be in discovery)
///
/// Calling `set_redirect_uri` preserves these type parameters.
type ConfiguredAzureClient = Client<
    AzureTokenClaims,
    CoreAuthDisplay,
    CoreGenderClaim,
    CoreJweContentEncryptionAlgorithm,
    CoreJsonWebKey,
    CoreAuthPrompt,
    StandardErrorResponse<CoreErrorResponseType>,
    AzureTokenResponse,
    CoreTokenIntrospectionResponse,
    CoreRevocableToken,
    CoreRevocationErrorResponse,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointMaybeSet,
    EndpointMaybeSet,
>;

/// Azure AD OIDC provider.
pub struct AzureProvider {
    client: ConfiguredAzureClient,
    http_client: reqwest::Client,
}

impl AzureProvider {
    /// Create a new Azure provider by discovering the OIDC metadata for the
    /// configured authority.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The authority URL is invalid
    /// - Discovery fails (network error or invalid metadata)
    /// - The redirect URI is invalid
    pub async fn new(config: &AzureConfig) -> Result<Self> {
        let issuer_url = IssuerUrl::new(config.authority.to_string())
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        // Build HTTP client without redirect following (security requirement)
        let http_client = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| AuthError::Provider(format!("Failed to build HTTP client: {}", e)))?;

        let provider_metadata = CoreProviderMetadata::discover_async(issuer_url, &http_client)
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        let client = ConfiguredAzureClient::from_provider_metadata(
            provider_metadata,
            ClientId::new(config.client_id.clone()),
            Some(ClientSecret::new(config.client_secret.clone())),
        )
        .set_redirect_uri(
            RedirectUrl::new(config.redirect_uri.to_string())
                .map_err(|e| AuthError::Provider(e.to_string()))?,
        );

        Ok(Self {
            client,
            http_client,
        })
    }
}

#[async_trait]
impl AzureProviderClient for AzureProvider {
    async fn authorization_url(&self, state: &str) -> Result<Url> {
        let state_owned = state.to_string();

        let (auth_url, _csrf_token, _nonce) = self
            .client
            .authorize_url(
                CoreAuthenticationFlow::AuthorizationCode,
                move || CsrfToken::new(state_owned),
                || Nonce::new(generate_state()),
            )
            .add_scope(Scope::new("openid".to_string()))
            .add_scope(Scope::new("profile".to_string()))
            .add_scope(Scope::new("email".to_string()))
            .add_scope(Scope::new("User.Read".to_string()))
            .url();

        Ok(auth_url)
    }

    async fn exchange_code(&self, code: &str) -> Result<AzureClaims> {
        let token_response = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .map_err(|e| AuthError::CodeExchange(e.to_string()))?
            .request_async(&self.http_client)
            .await
            .map_err(|e| AuthError::CodeExchange(e.to_string()))?;

        let id_token = token_response
            .id_token()
            .ok_or_else(|| AuthError::InvalidToken("No ID token in response".to_string()))?;

        let claims = id_token
            .claims(&self.client.id_token_verifier(), |_: Option<&Nonce>| Ok(()))
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        Ok(AzureClaims {
            subject: claims
                .additional_claims()
                .oid
                .clone()
                .unwrap_or_else(|| claims.subject().to_string()),
            email: claims
                .email()
                .map(|e| e.to_string())
                .or_else(|| claims.preferred_username().map(|u| u.to_string())),
            name: claims
                .name()
                .and_then(|n| n.get(None))
                .map(|n| n.to_string()),
        })
    }
}
