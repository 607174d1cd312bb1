//! Database helpers for accounts, login-link tokens, and sessions.

use anyhow::{anyhow, Context, Result};
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::types::IdentityClaims;
use super::utils::{generate_token, hash_token, is_unique_violation};

/// Minimal data returned for a valid session token.
pub(crate) struct SessionRecord {
    pub(crate) user_id: Uuid,
    pub(crate) email: String,
    pub(crate) display_name: String,
}

/// Create or update the account keyed by email.
///
/// The unique index on `email` is the only serialization point for
/// concurrent logins with the same address; a second login overwrites the
/// provider metadata instead of creating a duplicate row.
// Conflicting on email makes a repeat login an update, never a second row.
const UPSERT_ACCOUNT_SQL: &str = r"
    INSERT INTO users
        (email, phone, provider_subject, display_name, given_name,
         family_name, middle_name, birth_date, address, national_id,
         last_login_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9::jsonb, $10, NOW())
    ON CONFLICT (email) DO UPDATE SET
        phone = EXCLUDED.phone,
        provider_subject = EXCLUDED.provider_subject,
        display_name = EXCLUDED.display_name,
        given_name = EXCLUDED.given_name,
        family_name = EXCLUDED.family_name,
        middle_name = EXCLUDED.middle_name,
        birth_date = EXCLUDED.birth_date,
        address = EXCLUDED.address,
        national_id = EXCLUDED.national_id,
        last_login_at = NOW(),
        updated_at = NOW()
    RETURNING id
";

pub(super) async fn upsert_account(pool: &PgPool, claims: &IdentityClaims) -> Result<Uuid> {
    let address_json = claims
        .address
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .context("failed to serialize address claims")?;

    let query = UPSERT_ACCOUNT_SQL;
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(&claims.email)
        .bind(&claims.phone)
        .bind(&claims.subject)
        .bind(&claims.display_name)
        .bind(&claims.given_name)
        .bind(&claims.family_name)
        .bind(&claims.middle_name)
        .bind(&claims.birth_date)
        .bind(address_json)
        .bind(&claims.national_id)
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to upsert account")?;

    Ok(row.get("id"))
}

/// Issue a single-use login-link token for the user.
/// The raw token is returned; the database stores only its hash.
pub(super) async fn issue_login_link(
    pool: &PgPool,
    user_id: Uuid,
    ttl_seconds: i64,
) -> Result<String> {
    let query = r"
        INSERT INTO login_link_tokens (user_id, token_hash, expires_at)
        VALUES ($1, $2, NOW() + ($3 * INTERVAL '1 second'))
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );

    let token = generate_token()?;
    let token_hash = hash_token(&token);
    sqlx::query(query)
        .bind(user_id)
        .bind(token_hash)
        .bind(ttl_seconds)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to insert login link token")?;

    Ok(token)
}

/// Consume a login-link token and mint a session in one transaction.
///
/// Returns `Ok(None)` when the token is unknown, expired, or already used.
/// The raw session token is returned so the caller can set the cookie.
pub(super) async fn consume_login_link(
    pool: &PgPool,
    token_hash: &[u8],
    session_ttl_seconds: i64,
) -> Result<Option<String>> {
    let mut tx = pool.begin().await.context("begin session transaction")?;

    let query = r"
        UPDATE login_link_tokens
        SET consumed_at = NOW()
        WHERE token_hash = $1
          AND consumed_at IS NULL
          AND expires_at > NOW()
        RETURNING user_id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(token_hash)
        .fetch_optional(&mut *tx)
        .instrument(span)
        .await
        .context("failed to consume login link token")?;

    let Some(row) = row else {
        let _ = tx.rollback().await;
        return Ok(None);
    };

    let user_id: Uuid = row.get("user_id");

    let query = r"
        INSERT INTO user_sessions (user_id, session_hash, expires_at)
        VALUES ($1, $2, NOW() + ($3 * INTERVAL '1 second'))
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );

    // Retry only on the (vanishingly unlikely) hash collision.
    for _ in 0..3 {
        let token = generate_token()?;
        let session_hash = hash_token(&token);
        let result = sqlx::query(query)
            .bind(user_id)
            .bind(session_hash)
            .bind(session_ttl_seconds)
            .execute(&mut *tx)
            .instrument(span.clone())
            .await;

        match result {
            Ok(_) => {
                tx.commit().await.context("commit session transaction")?;
                return Ok(Some(token));
            }
            Err(err) if is_unique_violation(&err) => {}
            Err(err) => return Err(err).context("failed to insert session"),
        }
    }

    Err(anyhow!("failed to generate unique session token"))
}

pub(super) async fn lookup_session(
    pool: &PgPool,
    token_hash: &[u8],
) -> Result<Option<SessionRecord>> {
    // Only accept unexpired sessions.
    let query = r"
        SELECT users.id, users.email, users.display_name
        FROM user_sessions
        JOIN users ON users.id = user_sessions.user_id
        WHERE user_sessions.session_hash = $1
          AND user_sessions.expires_at > NOW()
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(token_hash)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup session")?;

    if row.is_none() {
        return Ok(None);
    }

    // Record activity for audit/visibility without extending the session TTL.
    let query = r"
        UPDATE user_sessions
        SET last_seen_at = NOW()
        WHERE session_hash = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(token_hash)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to update session last_seen_at")?;

    Ok(row.map(|row| SessionRecord {
        user_id: row.get("id"),
        email: row.get("email"),
        display_name: row.get("display_name"),
    }))
}

pub(super) async fn delete_session(pool: &PgPool, token_hash: &[u8]) -> Result<()> {
    // Logout is idempotent; it's fine if no rows are deleted.
    let query = "DELETE FROM user_sessions WHERE session_hash = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(token_hash)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to delete session")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{SessionRecord, UPSERT_ACCOUNT_SQL};
    use uuid::Uuid;

    #[test]
    fn account_upsert_updates_instead_of_duplicating() {
        // A second login with the same email must hit the conflict arm and
        // rewrite provider metadata on the existing row.
        assert!(UPSERT_ACCOUNT_SQL.contains("ON CONFLICT (email) DO UPDATE"));
        assert!(UPSERT_ACCOUNT_SQL.contains("provider_subject = EXCLUDED.provider_subject"));
        assert!(UPSERT_ACCOUNT_SQL.contains("RETURNING id"));
    }

    #[test]
    fn session_record_holds_values() {
        let record = SessionRecord {
            user_id: Uuid::nil(),
            email: "kari@example.no".to_string(),
            display_name: "Kari".to_string(),
        };
        assert_eq!(record.user_id, Uuid::nil());
        assert_eq!(record.email, "kari@example.no");
        assert_eq!(record.display_name, "Kari");
    }
}
