//! Login start: build the authorization URL and hand the browser to the provider.

use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect},
};
use std::sync::Arc;
use tracing::error;

use super::provider::build_authorization_url;
use super::state::AuthState;
use super::utils::{build_cookie, generate_token, sign_state, STATE_COOKIE_NAME};

#[utoipa::path(
    get,
    path = "/v1/auth/login",
    responses(
        (status = 307, description = "Redirect to the identity provider"),
        (status = 500, description = "Login could not be started", body = String)
    ),
    tag = "auth"
)]
pub async fn login(auth_state: Extension<Arc<AuthState>>) -> impl IntoResponse {
    let state_token = match generate_token() {
        Ok(token) => token,
        Err(err) => {
            error!("Failed to generate login state: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to start login".to_string(),
            )
                .into_response();
        }
    };

    let url = match build_authorization_url(auth_state.config().provider(), &state_token) {
        Ok(url) => url,
        Err(err) => {
            error!("Failed to build authorization URL: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to start login".to_string(),
            )
                .into_response();
        }
    };

    let signed = sign_state(&state_token, auth_state.state_signing_secret());
    let cookie = build_cookie(
        STATE_COOKIE_NAME,
        &signed,
        auth_state.config().login_state_ttl_seconds(),
        auth_state.config().cookie_secure(),
    );

    let mut headers = HeaderMap::new();
    match cookie {
        Ok(cookie) => {
            headers.insert(SET_COOKIE, cookie);
        }
        Err(err) => {
            error!("Failed to build state cookie: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to start login".to_string(),
            )
                .into_response();
        }
    }

    (headers, Redirect::temporary(&url)).into_response()
}
