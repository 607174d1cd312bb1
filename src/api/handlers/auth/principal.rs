//! Authenticated caller identity shared by the protected endpoints.

use axum::http::{HeaderMap, StatusCode};
use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

use super::session::authenticate_session;

/// The user behind a valid session token.
#[derive(Debug, Clone)]
pub(crate) struct Principal {
    pub(crate) user_id: Uuid,
    pub(crate) email: String,
    pub(crate) display_name: String,
}

/// Resolve the caller or fail with the status the handler should return:
/// 401 without a valid session, 503 when the session store is unreachable.
pub(crate) async fn require_auth(
    pool: &PgPool,
    headers: &HeaderMap,
) -> Result<Principal, StatusCode> {
    match authenticate_session(pool, headers).await {
        Ok(Some(record)) => Ok(Principal {
            user_id: record.user_id,
            email: record.email,
            display_name: record.display_name,
        }),
        Ok(None) => Err(StatusCode::UNAUTHORIZED),
        Err(err) => {
            error!("Session lookup failed: {err}");
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}
