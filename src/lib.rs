//! # Cardkeep (Trading Card Collection Service)
//!
//! `cardkeep` is the backend for a trading-card collection application. It
//! brokers login against a national digital-ID provider (Vipps-style OAuth2
//! authorization code + userinfo) and owns accounts, sessions, and card
//! records in Postgres.
//!
//! ## Login Bridge
//!
//! The login flow is a linear, single-attempt sequence: build the provider
//! authorization URL with a signed state cookie, exchange the callback code
//! for an access token, fetch identity claims (degrading to placeholder
//! claims when the userinfo endpoint misbehaves), upsert the account keyed by
//! email, and mint a cookie-backed session through a single-use login-link
//! token. Failures redirect back to the frontend with a coarse error code and
//! are never retried; the user restarts from the login endpoint.
//!
//! ## Sessions
//!
//! Session and login-link tokens are random 32-byte values; only SHA-256
//! hashes are stored. The session cookie is `HttpOnly`, `SameSite=Lax`, and
//! marked `Secure` whenever the frontend is served over HTTPS.
//!
//! ## Cards
//!
//! Card records belong to the authenticated user. The leaderboard ranks
//! collectors by distinct card names, then by total cards, computed in SQL.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
