//! Session introspection, logout, and the one-shot login claims endpoint.

use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use super::callback::decode_cookie_json;
use super::state::AuthState;
use super::storage::{delete_session, lookup_session, SessionRecord};
use super::types::{DisplayClaims, SessionResponse};
use super::utils::{
    clear_cookie, extract_cookie, extract_session_token, hash_token, CLAIMS_COOKIE_NAME,
    SESSION_COOKIE_NAME,
};

/// Resolve the request's session token to a user, touching `last_seen_at`.
///
/// `Ok(None)` covers both a missing token and one that is unknown or expired.
pub(crate) async fn authenticate_session(
    pool: &PgPool,
    headers: &HeaderMap,
) -> anyhow::Result<Option<SessionRecord>> {
    let Some(token) = extract_session_token(headers) else {
        return Ok(None);
    };
    lookup_session(pool, &hash_token(&token)).await
}

#[utoipa::path(
    get,
    path = "/v1/auth/session",
    responses(
        (status = 200, description = "Authenticated session", body = SessionResponse),
        (status = 204, description = "No valid session"),
        (status = 503, description = "Session store unavailable")
    ),
    tag = "auth"
)]
pub async fn session(pool: Extension<PgPool>, headers: HeaderMap) -> Response {
    match authenticate_session(&pool, &headers).await {
        Ok(Some(record)) => Json(SessionResponse {
            user_id: record.user_id.to_string(),
            email: record.email,
            display_name: record.display_name,
        })
        .into_response(),
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            error!("Session lookup failed: {err}");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    responses(
        (status = 204, description = "Session removed; also returned when no session existed"),
        (status = 503, description = "Session store unavailable")
    ),
    tag = "auth"
)]
pub async fn logout(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    headers: HeaderMap,
) -> Response {
    if let Some(token) = extract_session_token(&headers) {
        if let Err(err) = delete_session(&pool, &hash_token(&token)).await {
            error!("Logout failed: {err}");
            return StatusCode::SERVICE_UNAVAILABLE.into_response();
        }
    }

    let mut response_headers = HeaderMap::new();
    let secure = auth_state.config().cookie_secure();
    if let Ok(cookie) = clear_cookie(SESSION_COOKIE_NAME, secure) {
        response_headers.append(SET_COOKIE, cookie);
    }

    (StatusCode::NO_CONTENT, response_headers).into_response()
}

#[utoipa::path(
    get,
    path = "/v1/auth/claims",
    responses(
        (status = 200, description = "Display claims from the last completed login", body = DisplayClaims),
        (status = 400, description = "Claims cookie is malformed"),
        (status = 404, description = "No claims cookie present")
    ),
    tag = "auth"
)]
pub async fn login_claims(auth_state: Extension<Arc<AuthState>>, headers: HeaderMap) -> Response {
    let Some(raw) = extract_cookie(&headers, CLAIMS_COOKIE_NAME) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    // The cookie is read once; clear it on every outcome.
    let mut response_headers = HeaderMap::new();
    let secure = auth_state.config().cookie_secure();
    if let Ok(cookie) = clear_cookie(CLAIMS_COOKIE_NAME, secure) {
        response_headers.append(SET_COOKIE, cookie);
    }

    let claims = decode_cookie_json(&raw)
        .and_then(|json| serde_json::from_str::<DisplayClaims>(&json).ok());

    match claims {
        Some(claims) => (response_headers, Json(claims)).into_response(),
        None => (StatusCode::BAD_REQUEST, response_headers).into_response(),
    }
}
