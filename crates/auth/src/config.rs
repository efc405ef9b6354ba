use chrono::Duration;
use url::Url;

/// Azure AD application registration.
#[derive(Debug, Clone)]
pub struct AzureConfig {
    pub client_id: String,
    pub client_secret: String,
    /// OIDC authority, e.g. `https://login.microsoftonline.com/<tenant>/v2.0`.
    pub authority: Url,
    pub redirect_uri: Url,
}

/// Complete auth configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// `None` disables the Azure integration entirely.
    pub azure: Option<AzureConfig>,
    /// Base URL of the browser application, target of all redirects.
    pub client_url: Url,
    /// Symmetric key used to sign session tokens.
    pub encryption_key: String,
    pub token_ttl: Duration,
}

impl AuthConfig {
    /// Load from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CLIENT_HOST`: Browser app base URL (default: `http://localhost:3000`)
    /// - `ENCRYPTION_KEY`: JWT signing key (required)
    /// - `AZURE_AD_CLIENT_ID`: Azure application (client) ID
    /// - `AZURE_AD_CLIENT_SECRET`: Azure client secret
    /// - `AZURE_AD_AUTHORITY`: Full authority URL; derived from
    ///   `AZURE_AD_TENANT_ID` when absent
    /// - `AZURE_AD_REDIRECT_URI`: Callback URL registered with Azure
    /// - `TOKEN_TTL_DAYS`: Session token TTL in days (default: 30)
    ///
    /// Azure is enabled only when client id, secret, authority (or tenant),
    /// and redirect URI are all present; a partial configuration leaves it
    /// disabled rather than erroring.
    ///
    /// # Errors
    ///
    /// Returns an error if `ENCRYPTION_KEY` is missing.
    pub fn from_env() -> Result<Self, std::env::VarError> {
        let client_url: Url = std::env::var("CLIENT_HOST")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .parse()
            .expect("CLIENT_HOST must be a valid URL");

        let encryption_key = std::env::var("ENCRYPTION_KEY")?;

        let authority = env_opt("AZURE_AD_AUTHORITY")
            .and_then(|a| a.parse::<Url>().ok())
            .or_else(|| env_opt("AZURE_AD_TENANT_ID").map(|t| authority_from_tenant(&t)));

        let azure = match (
            env_opt("AZURE_AD_CLIENT_ID"),
            env_opt("AZURE_AD_CLIENT_SECRET"),
            authority,
            env_opt("AZURE_AD_REDIRECT_URI").and_then(|r| r.parse::<Url>().ok()),
        ) {
            (Some(client_id), Some(client_secret), Some(authority), Some(redirect_uri)) => {
                Some(AzureConfig {
                    client_id,
                    client_secret,
                    authority,
                    redirect_uri,
                })
            }
            _ => None,
        };

        let token_ttl = std::env::var("TOKEN_TTL_DAYS")
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .map(Duration::days)
            .unwrap_or_else(|| Duration::days(30));

        Ok(Self {
            azure,
            client_url,
            encryption_key,
            token_ttl,
        })
    }

    pub fn is_azure_enabled(&self) -> bool {
        self.azure.is_some()
    }
}

/// OIDC authority for an Azure tenant.
pub fn authority_from_tenant(tenant_id: &str) -> Url {
    format!("https://login.microsoftonline.com/{tenant_id}/v2.0")
        .parse()
        .expect("tenant authority must be a valid URL")
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
