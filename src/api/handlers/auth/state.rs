//! Auth configuration and shared state for the login bridge.

use anyhow::{Context, Result};
use rand::{rngs::OsRng, RngCore};
use secrecy::SecretString;

const DEFAULT_SESSION_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;
const DEFAULT_LOGIN_STATE_TTL_SECONDS: i64 = 10 * 60;
const DEFAULT_LOGIN_LINK_TTL_SECONDS: i64 = 10 * 60;

const DEFAULT_AUTH_URL: &str = "https://api.vipps.no/access-management-1.0/access/oauth2/auth";
const DEFAULT_TOKEN_URL: &str = "https://api.vipps.no/access-management-1.0/access/oauth2/token";
const DEFAULT_USERINFO_URL: &str = "https://api.vipps.no/vipps-userinfo-api/userinfo/";

/// Scopes requested from the identity provider.
const OAUTH_SCOPE: &str = "openid name email phoneNumber address birthDate nin";

/// Identity provider endpoints and credentials.
#[derive(Clone, Debug)]
pub struct ProviderConfig {
    client_id: String,
    client_secret: SecretString,
    auth_url: String,
    token_url: String,
    userinfo_url: String,
    redirect_uri: String,
    merchant_serial: Option<String>,
}

impl ProviderConfig {
    #[must_use]
    pub fn new(client_id: String, client_secret: SecretString, redirect_uri: String) -> Self {
        Self {
            client_id,
            client_secret,
            auth_url: DEFAULT_AUTH_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            userinfo_url: DEFAULT_USERINFO_URL.to_string(),
            redirect_uri,
            merchant_serial: None,
        }
    }

    #[must_use]
    pub fn with_auth_url(mut self, url: String) -> Self {
        self.auth_url = url;
        self
    }

    #[must_use]
    pub fn with_token_url(mut self, url: String) -> Self {
        self.token_url = url;
        self
    }

    #[must_use]
    pub fn with_userinfo_url(mut self, url: String) -> Self {
        self.userinfo_url = url;
        self
    }

    #[must_use]
    pub fn with_merchant_serial(mut self, serial: Option<String>) -> Self {
        self.merchant_serial = serial;
        self
    }

    pub(super) fn client_id(&self) -> &str {
        &self.client_id
    }

    pub(super) fn client_secret(&self) -> &SecretString {
        &self.client_secret
    }

    pub(super) fn auth_url(&self) -> &str {
        &self.auth_url
    }

    pub(super) fn token_url(&self) -> &str {
        &self.token_url
    }

    pub(super) fn userinfo_url(&self) -> &str {
        &self.userinfo_url
    }

    pub(super) fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    pub(super) fn merchant_serial(&self) -> Option<&str> {
        self.merchant_serial.as_deref()
    }

    pub(super) fn scope(&self) -> &'static str {
        OAUTH_SCOPE
    }
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    frontend_base_url: String,
    provider: ProviderConfig,
    session_ttl_seconds: i64,
    login_state_ttl_seconds: i64,
    login_link_ttl_seconds: i64,
}

impl AuthConfig {
    #[must_use]
    pub fn new(frontend_base_url: String, provider: ProviderConfig) -> Self {
        Self {
            frontend_base_url,
            provider,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            login_state_ttl_seconds: DEFAULT_LOGIN_STATE_TTL_SECONDS,
            login_link_ttl_seconds: DEFAULT_LOGIN_LINK_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_login_state_ttl_seconds(mut self, seconds: i64) -> Self {
        self.login_state_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_login_link_ttl_seconds(mut self, seconds: i64) -> Self {
        self.login_link_ttl_seconds = seconds;
        self
    }

    pub(crate) fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    pub(super) fn provider(&self) -> &ProviderConfig {
        &self.provider
    }

    pub(super) fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    pub(super) fn login_state_ttl_seconds(&self) -> i64 {
        self.login_state_ttl_seconds
    }

    pub(super) fn login_link_ttl_seconds(&self) -> i64 {
        self.login_link_ttl_seconds
    }

    /// Only mark cookies secure when the frontend is served over HTTPS.
    pub(super) fn cookie_secure(&self) -> bool {
        self.frontend_base_url.starts_with("https://")
    }
}

/// Shared auth state: configuration, outbound HTTP client, and the
/// per-process secret used to sign state cookies.
///
/// A restart rotates the signing secret, which invalidates in-flight logins;
/// the flow is restartable from the login endpoint by design.
pub struct AuthState {
    config: AuthConfig,
    http: reqwest::Client,
    state_signing_secret: [u8; 32],
}

impl AuthState {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built or the signing
    /// secret cannot be generated.
    pub fn new(config: AuthConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .build()
            .context("failed to build provider HTTP client")?;

        let mut state_signing_secret = [0u8; 32];
        OsRng
            .try_fill_bytes(&mut state_signing_secret)
            .context("failed to generate state signing secret")?;

        Ok(Self {
            config,
            http,
            state_signing_secret,
        })
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub(super) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(super) fn state_signing_secret(&self) -> &[u8; 32] {
        &self.state_signing_secret
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn provider() -> ProviderConfig {
        ProviderConfig::new(
            "client-id".to_string(),
            SecretString::from("client-secret".to_string()),
            "https://cards.example/v1/auth/callback".to_string(),
        )
    }

    #[test]
    fn provider_config_defaults_and_overrides() {
        let config = provider();
        assert_eq!(config.auth_url(), super::DEFAULT_AUTH_URL);
        assert_eq!(config.token_url(), super::DEFAULT_TOKEN_URL);
        assert_eq!(config.userinfo_url(), super::DEFAULT_USERINFO_URL);
        assert_eq!(config.merchant_serial(), None);
        assert!(config.scope().contains("openid"));

        let config = config
            .with_auth_url("https://provider.test/auth".to_string())
            .with_token_url("https://provider.test/token".to_string())
            .with_userinfo_url("https://provider.test/userinfo".to_string())
            .with_merchant_serial(Some("123456".to_string()));

        assert_eq!(config.auth_url(), "https://provider.test/auth");
        assert_eq!(config.token_url(), "https://provider.test/token");
        assert_eq!(config.userinfo_url(), "https://provider.test/userinfo");
        assert_eq!(config.merchant_serial(), Some("123456"));
    }

    #[test]
    fn auth_config_defaults_and_overrides() {
        let config = AuthConfig::new("https://cards.example".to_string(), provider());

        assert_eq!(config.frontend_base_url(), "https://cards.example");
        assert_eq!(
            config.session_ttl_seconds(),
            super::DEFAULT_SESSION_TTL_SECONDS
        );
        assert_eq!(
            config.login_state_ttl_seconds(),
            super::DEFAULT_LOGIN_STATE_TTL_SECONDS
        );
        assert!(config.cookie_secure());

        let config = config
            .with_session_ttl_seconds(3600)
            .with_login_state_ttl_seconds(120)
            .with_login_link_ttl_seconds(60);

        assert_eq!(config.session_ttl_seconds(), 3600);
        assert_eq!(config.login_state_ttl_seconds(), 120);
        assert_eq!(config.login_link_ttl_seconds(), 60);
    }

    #[test]
    fn cookie_secure_follows_frontend_scheme() {
        let config = AuthConfig::new("http://localhost:3000".to_string(), provider());
        assert!(!config.cookie_secure());
    }

    #[test]
    fn auth_state_generates_signing_secret() {
        let config = AuthConfig::new("https://cards.example".to_string(), provider());
        let state = AuthState::new(config).expect("auth state builds");
        assert_ne!(state.state_signing_secret(), &[0u8; 32]);
    }
}
