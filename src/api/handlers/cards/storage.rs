//! Database helpers for the card collection and the leaderboard.

use anyhow::{Context, Result};
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::types::{CardResponse, CreateCardRequest, LeaderboardEntry};

const CARD_COLUMNS: &str = r"
    id, user_id, name, card_type, rarity, set_name, card_number,
    condition, description, quantity, is_graded, grade_company,
    grade_score, for_sale, price, front_image_url, back_image_url,
    damage_images, created_at::text AS created_at
";

fn card_from_row(row: &PgRow) -> CardResponse {
    let id: Uuid = row.get("id");
    let user_id: Uuid = row.get("user_id");
    CardResponse {
        id: id.to_string(),
        user_id: user_id.to_string(),
        name: row.get("name"),
        card_type: row.get("card_type"),
        rarity: row.get("rarity"),
        set_name: row.get("set_name"),
        card_number: row.get("card_number"),
        condition: row.get("condition"),
        description: row.get("description"),
        quantity: row.get("quantity"),
        is_graded: row.get("is_graded"),
        grade_company: row.get("grade_company"),
        grade_score: row.get("grade_score"),
        for_sale: row.get("for_sale"),
        price: row.get("price"),
        front_image_url: row.get("front_image_url"),
        back_image_url: row.get("back_image_url"),
        damage_images: row.get("damage_images"),
        created_at: row.get("created_at"),
    }
}

pub(super) async fn insert_card(
    pool: &PgPool,
    user_id: Uuid,
    request: &CreateCardRequest,
) -> Result<CardResponse> {
    let query = format!(
        r"
        INSERT INTO cards
            (user_id, name, card_type, rarity, set_name, card_number,
             condition, description, quantity, is_graded, grade_company,
             grade_score, for_sale, price, front_image_url, back_image_url,
             damage_images)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                $15, $16, $17)
        RETURNING {CARD_COLUMNS}
    "
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(user_id)
        .bind(request.name.trim())
        .bind(&request.card_type)
        .bind(&request.rarity)
        .bind(&request.set_name)
        .bind(&request.card_number)
        .bind(&request.condition)
        .bind(&request.description)
        .bind(request.quantity)
        .bind(request.is_graded)
        .bind(&request.grade_company)
        .bind(&request.grade_score)
        .bind(request.for_sale)
        .bind(request.price)
        .bind(&request.front_image_url)
        .bind(&request.back_image_url)
        .bind(&request.damage_images)
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to insert card")?;

    Ok(card_from_row(&row))
}

pub(super) async fn list_cards(pool: &PgPool, user_id: Uuid) -> Result<Vec<CardResponse>> {
    let query = format!(
        r"
        SELECT {CARD_COLUMNS}
        FROM cards
        WHERE user_id = $1
        ORDER BY created_at DESC, id
    "
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let rows = sqlx::query(&query)
        .bind(user_id)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to list cards")?;

    Ok(rows.iter().map(card_from_row).collect())
}

pub(super) async fn get_card(
    pool: &PgPool,
    user_id: Uuid,
    card_id: Uuid,
) -> Result<Option<CardResponse>> {
    // Scoped by owner so foreign cards are indistinguishable from absent ones.
    let query = format!(
        r"
        SELECT {CARD_COLUMNS}
        FROM cards
        WHERE id = $1 AND user_id = $2
    "
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(card_id)
        .bind(user_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to fetch card")?;

    Ok(row.as_ref().map(card_from_row))
}

/// Returns `true` when a row was deleted.
pub(super) async fn delete_card(pool: &PgPool, user_id: Uuid, card_id: Uuid) -> Result<bool> {
    let query = "DELETE FROM cards WHERE id = $1 AND user_id = $2";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(card_id)
        .bind(user_id)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to delete card")?;

    Ok(result.rows_affected() > 0)
}

// Names are deduplicated case-insensitively, and the left join keeps users
// with empty collections on the board.
const LEADERBOARD_SQL: &str = r"
    SELECT
        users.id AS user_id,
        users.display_name,
        COALESCE(SUM(cards.quantity), 0)::BIGINT AS total_cards,
        COUNT(DISTINCT LOWER(cards.name)) AS unique_names,
        COALESCE(SUM(cards.quantity) FILTER (
            WHERE cards.rarity ILIKE '%rare%'
               OR cards.rarity ILIKE '%ultra%'
               OR cards.rarity ILIKE '%secret%'
        ), 0)::BIGINT AS rare_cards
    FROM users
    LEFT JOIN cards ON cards.user_id = users.id
    GROUP BY users.id, users.display_name
    ORDER BY unique_names DESC, total_cards DESC
    LIMIT $1
";

/// Collectors ranked by distinct card names, total copies as tie-break.
/// Rarity buckets counted as "rare" match on the rarity label.
pub(super) async fn leaderboard(pool: &PgPool, limit: i64) -> Result<Vec<LeaderboardEntry>> {
    let query = LEADERBOARD_SQL;
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let rows = sqlx::query(query)
        .bind(limit)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to build leaderboard")?;

    let entries = rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let user_id: Uuid = row.get("user_id");
            LeaderboardEntry {
                rank: index + 1,
                user_id: user_id.to_string(),
                display_name: row.get("display_name"),
                total_cards: row.get("total_cards"),
                unique_names: row.get("unique_names"),
                rare_cards: row.get("rare_cards"),
            }
        })
        .collect();

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::LEADERBOARD_SQL;

    #[test]
    fn leaderboard_counts_names_case_insensitively() {
        // "Pikachu" and "pikachu" are the same card for ranking purposes.
        assert!(LEADERBOARD_SQL.contains("COUNT(DISTINCT LOWER(cards.name))"));
    }

    #[test]
    fn leaderboard_keeps_users_without_cards() {
        assert!(LEADERBOARD_SQL.contains("LEFT JOIN cards"));
        assert!(LEADERBOARD_SQL.contains("COALESCE(SUM(cards.quantity), 0)"));
    }

    #[test]
    fn leaderboard_orders_by_breadth_then_volume() {
        assert!(LEADERBOARD_SQL.contains("ORDER BY unique_names DESC, total_cards DESC"));
    }
}
