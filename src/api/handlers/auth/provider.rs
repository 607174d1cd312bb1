//! Outbound calls to the identity provider's token and userinfo endpoints.
//!
//! Both calls are single-attempt: a failed token exchange is terminal for the
//! login, while a failed userinfo fetch degrades to placeholder claims.

use anyhow::{anyhow, Context, Result};
use secrecy::ExposeSecret;
use serde_json::Value;
use tracing::{debug, info_span, warn, Instrument};
use url::Url;

use super::state::{AuthState, ProviderConfig};
use super::types::{IdentityClaims, TokenExchangeResult};
use super::utils::unix_millis;

/// Build the provider authorization URL for a fresh login attempt.
///
/// # Errors
/// Returns an error if the configured authorization endpoint is not a valid URL.
pub(super) fn build_authorization_url(config: &ProviderConfig, state: &str) -> Result<String> {
    let mut url = Url::parse(config.auth_url())
        .with_context(|| format!("invalid authorization endpoint: {}", config.auth_url()))?;

    url.query_pairs_mut()
        .append_pair("response_type", "code")
        .append_pair("client_id", config.client_id())
        .append_pair("redirect_uri", config.redirect_uri())
        .append_pair("state", state)
        .append_pair("scope", config.scope());

    Ok(url.into())
}

/// Exchange the callback code for an access token. One POST, no retry.
pub(super) async fn exchange_code(
    auth_state: &AuthState,
    code: &str,
) -> Result<TokenExchangeResult> {
    let config = auth_state.config().provider();
    let params = [
        ("grant_type", "authorization_code"),
        ("code", code),
        ("redirect_uri", config.redirect_uri()),
    ];

    let span = info_span!(
        "oauth.token_exchange",
        http.method = "POST",
        url = %config.token_url()
    );
    let response = auth_state
        .http()
        .post(config.token_url())
        .basic_auth(
            config.client_id(),
            Some(config.client_secret().expose_secret()),
        )
        .form(&params)
        .send()
        .instrument(span)
        .await
        .context("token exchange request failed")?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(anyhow!("token exchange failed: {status} {body}"));
    }

    let token: TokenExchangeResult = response
        .json()
        .await
        .context("token endpoint returned invalid JSON")?;

    debug!(
        token_type = token.token_type.as_deref().unwrap_or("unknown"),
        scope = token.scope.as_deref().unwrap_or(""),
        "token exchange succeeded"
    );

    Ok(token)
}

/// Fetch identity claims with the bearer token.
///
/// A failing userinfo call does not abort the login; it falls back to
/// synthesized placeholder claims.
pub(super) async fn fetch_claims(auth_state: &AuthState, access_token: &str) -> IdentityClaims {
    match fetch_userinfo(auth_state, access_token).await {
        Ok(userinfo) => IdentityClaims::from_userinfo(&userinfo, unix_millis()),
        Err(err) => {
            warn!("userinfo fetch failed, using placeholder claims: {err}");
            IdentityClaims::placeholder(unix_millis())
        }
    }
}

async fn fetch_userinfo(auth_state: &AuthState, access_token: &str) -> Result<Value> {
    let config = auth_state.config().provider();

    let span = info_span!(
        "oauth.userinfo",
        http.method = "GET",
        url = %config.userinfo_url()
    );
    let mut request = auth_state
        .http()
        .get(config.userinfo_url())
        .bearer_auth(access_token)
        .header("Vipps-System-Name", env!("CARGO_PKG_NAME"))
        .header("Vipps-System-Version", env!("CARGO_PKG_VERSION"));

    if let Some(serial) = config.merchant_serial() {
        request = request.header("Merchant-Serial-Number", serial);
    }

    let response = request
        .send()
        .instrument(span)
        .await
        .context("userinfo request failed")?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(anyhow!("userinfo returned {status}: {body}"));
    }

    response
        .json()
        .await
        .context("userinfo returned invalid JSON")
}

#[cfg(test)]
mod tests {
    use super::build_authorization_url;
    use crate::api::handlers::auth::ProviderConfig;
    use secrecy::SecretString;
    use url::Url;

    fn provider() -> ProviderConfig {
        ProviderConfig::new(
            "client-id".to_string(),
            SecretString::from("client-secret".to_string()),
            "https://cards.example/v1/auth/callback".to_string(),
        )
    }

    #[test]
    fn authorization_url_carries_expected_params() {
        let url = build_authorization_url(&provider(), "state-token").expect("url builds");
        let parsed = Url::parse(&url).expect("url parses");

        let pairs: Vec<(String, String)> = parsed
            .query_pairs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        assert!(pairs.contains(&("response_type".to_string(), "code".to_string())));
        assert!(pairs.contains(&("client_id".to_string(), "client-id".to_string())));
        assert!(pairs.contains(&("state".to_string(), "state-token".to_string())));
        assert!(pairs.contains(&(
            "redirect_uri".to_string(),
            "https://cards.example/v1/auth/callback".to_string()
        )));
        assert!(pairs
            .iter()
            .any(|(k, v)| k == "scope" && v.contains("openid") && v.contains("nin")));
    }

    #[test]
    fn authorization_url_rejects_invalid_endpoint() {
        let config = provider().with_auth_url("not a url".to_string());
        assert!(build_authorization_url(&config, "state").is_err());
    }
}
