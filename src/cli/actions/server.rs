use crate::{
    api,
    api::handlers::auth::{AuthConfig, ProviderConfig},
    cli::commands::oauth,
};
use anyhow::{Context, Result};
use url::Url;

/// Everything needed to start the API server.
#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub oauth: oauth::Options,
}

/// Execute the server action.
///
/// # Errors
/// Returns an error if the DSN is invalid or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let dsn = Url::parse(&args.dsn)
        .context("invalid database DSN")?
        .to_string();

    let provider = ProviderConfig::new(
        args.oauth.client_id,
        args.oauth.client_secret,
        args.oauth.redirect_uri,
    )
    .with_auth_url(args.oauth.auth_url)
    .with_token_url(args.oauth.token_url)
    .with_userinfo_url(args.oauth.userinfo_url)
    .with_merchant_serial(args.oauth.merchant_serial);

    let auth_config = AuthConfig::new(args.oauth.frontend_base_url, provider)
        .with_session_ttl_seconds(args.oauth.session_ttl_seconds)
        .with_login_state_ttl_seconds(args.oauth.login_state_ttl_seconds)
        .with_login_link_ttl_seconds(args.oauth.login_link_ttl_seconds);

    api::new(args.port, dsn, auth_config).await
}
