//! Card collection endpoints. Everything except the leaderboard requires a
//! valid session; card reads and writes are always scoped to the caller.

use axum::{
    extract::{Extension, Path, Query},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::error;
use utoipa::IntoParams;
use uuid::Uuid;

use super::auth::principal::require_auth;

mod storage;
pub(crate) mod types;

use types::{CardResponse, CreateCardRequest, LeaderboardEntry};

const DEFAULT_LEADERBOARD_LIMIT: i64 = 10;
const MAX_LEADERBOARD_LIMIT: i64 = 100;

#[derive(Deserialize, IntoParams, Debug)]
pub(crate) struct LeaderboardQuery {
    /// Number of entries to return, capped at 100.
    limit: Option<i64>,
}

#[utoipa::path(
    post,
    path = "/v1/cards",
    request_body = CreateCardRequest,
    responses(
        (status = 201, description = "Card created", body = CardResponse),
        (status = 400, description = "Missing or empty name, or quantity below 1"),
        (status = 401, description = "No valid session"),
        (status = 503, description = "Database unavailable")
    ),
    tag = "cards"
)]
pub async fn create_card(
    pool: Extension<PgPool>,
    headers: HeaderMap,
    payload: Option<Json<CreateCardRequest>>,
) -> Response {
    let principal = match require_auth(&pool, &headers).await {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };

    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    if request.name.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "Card name is required".to_string()).into_response();
    }
    if request.quantity < 1 {
        return (
            StatusCode::BAD_REQUEST,
            "Quantity must be at least 1".to_string(),
        )
            .into_response();
    }

    match storage::insert_card(&pool, principal.user_id, &request).await {
        Ok(card) => (StatusCode::CREATED, Json(card)).into_response(),
        Err(err) => {
            error!("Card insert failed: {err}");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/v1/cards",
    responses(
        (status = 200, description = "The caller's cards, newest first", body = [CardResponse]),
        (status = 401, description = "No valid session"),
        (status = 503, description = "Database unavailable")
    ),
    tag = "cards"
)]
pub async fn list_cards(pool: Extension<PgPool>, headers: HeaderMap) -> Response {
    let principal = match require_auth(&pool, &headers).await {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };

    match storage::list_cards(&pool, principal.user_id).await {
        Ok(cards) => Json(cards).into_response(),
        Err(err) => {
            error!("Card listing failed: {err}");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/v1/cards/{id}",
    params(("id" = Uuid, Path, description = "Card id")),
    responses(
        (status = 200, description = "The card", body = CardResponse),
        (status = 401, description = "No valid session"),
        (status = 404, description = "Card does not exist or belongs to another user"),
        (status = 503, description = "Database unavailable")
    ),
    tag = "cards"
)]
pub async fn get_card(
    pool: Extension<PgPool>,
    headers: HeaderMap,
    Path(card_id): Path<Uuid>,
) -> Response {
    let principal = match require_auth(&pool, &headers).await {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };

    match storage::get_card(&pool, principal.user_id, card_id).await {
        Ok(Some(card)) => Json(card).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!("Card fetch failed: {err}");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}

#[utoipa::path(
    delete,
    path = "/v1/cards/{id}",
    params(("id" = Uuid, Path, description = "Card id")),
    responses(
        (status = 204, description = "Card deleted"),
        (status = 401, description = "No valid session"),
        (status = 404, description = "Card does not exist or belongs to another user"),
        (status = 503, description = "Database unavailable")
    ),
    tag = "cards"
)]
pub async fn delete_card(
    pool: Extension<PgPool>,
    headers: HeaderMap,
    Path(card_id): Path<Uuid>,
) -> Response {
    let principal = match require_auth(&pool, &headers).await {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };

    match storage::delete_card(&pool, principal.user_id, card_id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!("Card deletion failed: {err}");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/v1/leaderboard",
    params(LeaderboardQuery),
    responses(
        (status = 200, description = "Collectors ranked by unique card names", body = [LeaderboardEntry]),
        (status = 503, description = "Database unavailable")
    ),
    tag = "cards"
)]
pub async fn leaderboard(
    pool: Extension<PgPool>,
    Query(query): Query<LeaderboardQuery>,
) -> Response {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LEADERBOARD_LIMIT)
        .clamp(1, MAX_LEADERBOARD_LIMIT);

    match storage::leaderboard(&pool, limit).await {
        Ok(entries) => Json(entries).into_response(),
        Err(err) => {
            error!("Leaderboard query failed: {err}");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}
