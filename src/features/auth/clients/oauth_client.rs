//! OAuth2 authorization-code flow against Google and GitHub.

use rand::{distributions::Alphanumeric, Rng};
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

use crate::core::config::{OAuthConfig, OAuthProviderCredentials};
use crate::core::error::{AppError, Result};

const STATE_LENGTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OAuthProvider {
    Google,
    Github,
}

struct ProviderEndpoints {
    authorize_url: &'static str,
    token_url: &'static str,
    userinfo_url: &'static str,
    scopes: &'static [&'static str],
}

impl OAuthProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            OAuthProvider::Google => "google",
            OAuthProvider::Github => "github",
        }
    }

    /// Resolve a provider from its URL segment; unknown names are not found
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "google" => Ok(OAuthProvider::Google),
            "github" => Ok(OAuthProvider::Github),
            other => Err(AppError::NotFound(format!(
                "OAuth2 provider '{}' is not supported",
                other
            ))),
        }
    }

    fn endpoints(self) -> ProviderEndpoints {
        match self {
            OAuthProvider::Google => ProviderEndpoints {
                authorize_url: "https://accounts.google.com/o/oauth2/auth",
                token_url: "https://accounts.google.com/o/oauth2/token",
                userinfo_url: "https://www.googleapis.com/oauth2/v3/userinfo",
                scopes: &["https://www.googleapis.com/auth/userinfo.email"],
            },
            OAuthProvider::Github => ProviderEndpoints {
                authorize_url: "https://github.com/login/oauth/authorize",
                token_url: "https://github.com/login/oauth/access_token",
                userinfo_url: "https://api.github.com/user/emails",
                scopes: &["user:email"],
            },
        }
    }

    /// Pull the verified e-mail address out of the provider's user-info payload.
    ///
    /// Addresses the provider has not verified are ignored.
    pub fn extract_email(self, payload: &Value) -> Option<String> {
        let email = match self {
            OAuthProvider::Google => Some(payload)
                .filter(|p| is_true(p.get("email_verified")))
                .and_then(|p| p.get("email")),
            OAuthProvider::Github => {
                let verified: Vec<&Value> = payload
                    .as_array()?
                    .iter()
                    .filter(|entry| is_true(entry.get("verified")))
                    .collect();
                verified
                    .iter()
                    .copied()
                    .find(|entry| is_true(entry.get("primary")))
                    .or_else(|| verified.first().copied())
                    .and_then(|entry| entry.get("email"))
            }
        };

        email
            .and_then(Value::as_str)
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
    }
}

// Google has sent `email_verified` both as a boolean and as a string
fn is_true(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s == "true",
        _ => false,
    }
}

/// Query string the provider sends back to the callback
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

/// Random anti-CSRF value stored in the session before redirecting
pub fn generate_state() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_LENGTH)
        .map(char::from)
        .collect()
}

/// Check the callback parameters and return the authorization code.
///
/// The provider must not report an error, the state must equal the one
/// stored in the session, and a code must be present.
pub fn validate_callback(query: &OAuthCallbackQuery, expected_state: Option<&str>) -> Result<String> {
    if let Some(error) = &query.error {
        tracing::debug!(
            "OAuth2 provider returned error {}: {}",
            error,
            query.error_description.as_deref().unwrap_or("-")
        );
        return Err(AppError::Unauthorized(format!("Authorization failed: {}", error)));
    }

    match (query.state.as_deref(), expected_state) {
        (Some(received), Some(expected)) if !expected.is_empty() && received == expected => {}
        _ => {
            tracing::debug!("OAuth2 state mismatch");
            return Err(AppError::Unauthorized("Authorization failed".to_string()));
        }
    }

    query
        .code
        .clone()
        .filter(|code| !code.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Authorization failed".to_string()))
}

/// HTTP client for the configured OAuth2 providers
pub struct OAuthClient {
    http_client: reqwest::Client,
    config: OAuthConfig,
    public_base_url: String,
}

impl OAuthClient {
    pub fn new(config: OAuthConfig, public_base_url: &str) -> Result<Self> {
        // GitHub's API rejects requests without a user agent
        let http_client = reqwest::Client::builder()
            .user_agent("RipotiTaka/1.0")
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            config,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Names of providers with credentials configured
    pub fn configured(&self) -> Vec<OAuthProvider> {
        [OAuthProvider::Google, OAuthProvider::Github]
            .into_iter()
            .filter(|p| self.credentials(*p).is_ok())
            .collect()
    }

    fn credentials(&self, provider: OAuthProvider) -> Result<&OAuthProviderCredentials> {
        let credentials = match provider {
            OAuthProvider::Google => self.config.google.as_ref(),
            OAuthProvider::Github => self.config.github.as_ref(),
        };
        credentials.ok_or_else(|| {
            AppError::NotFound(format!("OAuth2 provider '{}' is not configured", provider.as_str()))
        })
    }

    fn redirect_uri(&self, provider: OAuthProvider) -> String {
        format!(
            "{}/api/auth/oauth2/{}/callback",
            self.public_base_url,
            provider.as_str()
        )
    }

    /// Provider URL the browser is sent to
    pub fn authorize_url(&self, provider: OAuthProvider, state: &str) -> Result<String> {
        let credentials = self.credentials(provider)?;
        let endpoints = provider.endpoints();

        Ok(format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
            endpoints.authorize_url,
            urlencoding::encode(&credentials.client_id),
            urlencoding::encode(&self.redirect_uri(provider)),
            urlencoding::encode(&endpoints.scopes.join(" ")),
            urlencoding::encode(state)
        ))
    }

    /// Exchange the authorization code and fetch the account's e-mail address
    pub async fn fetch_email(&self, provider: OAuthProvider, code: &str) -> Result<String> {
        let access_token = self.exchange_code(provider, code).await?;

        let response = self
            .http_client
            .get(provider.endpoints().userinfo_url)
            .bearer_auth(&access_token)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("OAuth2 user-info request failed: {}", e);
                AppError::Unauthorized("Authorization failed".to_string())
            })?;

        if !response.status().is_success() {
            tracing::warn!(
                "OAuth2 user-info request to {} returned {}",
                provider.as_str(),
                response.status()
            );
            return Err(AppError::Unauthorized("Authorization failed".to_string()));
        }

        let payload: Value = response.json().await.map_err(|e| {
            tracing::warn!("Failed to parse OAuth2 user-info response: {}", e);
            AppError::Unauthorized("Authorization failed".to_string())
        })?;

        provider.extract_email(&payload).ok_or_else(|| {
            tracing::warn!("OAuth2 user-info from {} has no e-mail", provider.as_str());
            AppError::Unauthorized("Authorization failed".to_string())
        })
    }

    async fn exchange_code(&self, provider: OAuthProvider, code: &str) -> Result<String> {
        let credentials = self.credentials(provider)?;
        let redirect_uri = self.redirect_uri(provider);

        let params = [
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri.as_str()),
        ];

        let response = self
            .http_client
            .post(provider.endpoints().token_url)
            .header(ACCEPT, "application/json")
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("OAuth2 token exchange failed: {}", e);
                AppError::Unauthorized("Authorization failed".to_string())
            })?;

        if !response.status().is_success() {
            tracing::warn!(
                "OAuth2 token exchange with {} returned {}",
                provider.as_str(),
                response.status()
            );
            return Err(AppError::Unauthorized("Authorization failed".to_string()));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            tracing::warn!("Failed to parse OAuth2 token response: {}", e);
            AppError::Unauthorized("Authorization failed".to_string())
        })?;

        token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Unauthorized("Authorization failed".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(google: bool) -> OAuthClient {
        let credentials = OAuthProviderCredentials {
            client_id: "client-id".to_string(),
            client_secret: "client-secret".to_string(),
        };
        let config = OAuthConfig {
            google: google.then(|| credentials.clone()),
            github: None,
        };
        OAuthClient::new(config, "http://localhost:3000/").unwrap()
    }

    fn query(code: Option<&str>, state: Option<&str>, error: Option<&str>) -> OAuthCallbackQuery {
        OAuthCallbackQuery {
            code: code.map(String::from),
            state: state.map(String::from),
            error: error.map(String::from),
            error_description: None,
        }
    }

    #[test]
    fn test_state_is_random_alphanumeric() {
        let a = generate_state();
        let b = generate_state();
        assert_eq!(a.len(), STATE_LENGTH);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_callback_accepts_matching_state() {
        let code = validate_callback(&query(Some("abc"), Some("s1"), None), Some("s1")).unwrap();
        assert_eq!(code, "abc");
    }

    #[test]
    fn test_callback_rejections() {
        let cases = [
            (query(Some("abc"), Some("s1"), Some("access_denied")), Some("s1")),
            (query(Some("abc"), Some("s2"), None), Some("s1")),
            (query(Some("abc"), None, None), Some("s1")),
            (query(Some("abc"), Some("s1"), None), None),
            (query(None, Some("s1"), None), Some("s1")),
            (query(Some(""), Some("s1"), None), Some("s1")),
            (query(Some("abc"), Some(""), None), Some("")),
        ];

        for (q, expected) in cases {
            assert!(matches!(
                validate_callback(&q, expected),
                Err(AppError::Unauthorized(_))
            ));
        }
    }

    #[test]
    fn test_extract_email_per_provider() {
        let google = json!({"sub": "1", "email": "Alice@Example.com", "email_verified": true});
        assert_eq!(
            OAuthProvider::Google.extract_email(&google).as_deref(),
            Some("alice@example.com")
        );

        let github = json!([
            {"email": "old@example.com", "primary": false, "verified": true},
            {"email": "main@example.com", "primary": true, "verified": true}
        ]);
        assert_eq!(
            OAuthProvider::Github.extract_email(&github).as_deref(),
            Some("main@example.com")
        );

        let github_no_primary = json!([{"email": "first@example.com", "verified": true}]);
        assert_eq!(
            OAuthProvider::Github.extract_email(&github_no_primary).as_deref(),
            Some("first@example.com")
        );

        assert_eq!(OAuthProvider::Google.extract_email(&json!({})), None);
        assert_eq!(OAuthProvider::Github.extract_email(&json!([])), None);
        assert_eq!(OAuthProvider::Github.extract_email(&json!({"email": "x"})), None);
    }

    #[test]
    fn test_extract_email_rejects_unverified_google_address() {
        let unverified = json!({"email": "victim@example.com", "email_verified": false});
        assert_eq!(OAuthProvider::Google.extract_email(&unverified), None);

        let missing_flag = json!({"email": "victim@example.com"});
        assert_eq!(OAuthProvider::Google.extract_email(&missing_flag), None);

        let string_flag = json!({"email": "owner@example.com", "email_verified": "true"});
        assert_eq!(
            OAuthProvider::Google.extract_email(&string_flag).as_deref(),
            Some("owner@example.com")
        );
    }

    #[test]
    fn test_extract_email_rejects_unverified_github_address() {
        let unverified = json!([
            {"email": "victim@example.com", "primary": true, "verified": false}
        ]);
        assert_eq!(OAuthProvider::Github.extract_email(&unverified), None);

        // An unverified primary falls back to a verified secondary address
        let mixed = json!([
            {"email": "victim@example.com", "primary": true, "verified": false},
            {"email": "own@example.com", "primary": false, "verified": true}
        ]);
        assert_eq!(
            OAuthProvider::Github.extract_email(&mixed).as_deref(),
            Some("own@example.com")
        );
    }

    #[test]
    fn test_authorize_url_for_configured_provider() {
        let client = client(true);
        let url = client.authorize_url(OAuthProvider::Google, "state123").unwrap();

        assert!(url.starts_with("https://accounts.google.com/o/oauth2/auth?"));
        assert!(url.contains("client_id=client-id"));
        assert!(url.contains("state=state123"));
        assert!(url.contains(
            "redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fapi%2Fauth%2Foauth2%2Fgoogle%2Fcallback"
        ));
        assert_eq!(client.configured(), vec![OAuthProvider::Google]);
    }

    #[test]
    fn test_provider_from_name() {
        assert_eq!(OAuthProvider::from_name("github").unwrap(), OAuthProvider::Github);
        assert!(matches!(
            OAuthProvider::from_name("facebook"),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_unconfigured_provider_is_not_found() {
        let client = client(false);
        assert!(matches!(
            client.authorize_url(OAuthProvider::Github, "s"),
            Err(AppError::NotFound(_))
        ));
        assert!(client.configured().is_empty());
    }
}
