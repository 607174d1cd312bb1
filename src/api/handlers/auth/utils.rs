//! Token generation, hashing, and cookie helpers for the login bridge.

use anyhow::{Context, Result};
use axum::http::{
    header::{InvalidHeaderValue, AUTHORIZATION, COOKIE},
    HeaderMap, HeaderValue,
};
use base64::Engine;
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};

pub(super) const STATE_COOKIE_NAME: &str = "cardkeep_oauth_state";
pub(super) const SESSION_COOKIE_NAME: &str = "cardkeep_session";
pub(super) const CLAIMS_COOKIE_NAME: &str = "cardkeep_login_claims";

/// Create a random 32-byte token, URL-safe base64 encoded.
///
/// Used for OAuth state, login-link, and session tokens. Raw values are only
/// handed to the client; the database stores a hash.
pub(super) fn generate_token() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate random token")?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}

/// Hash a token so raw values never touch the database.
pub(super) fn hash_token(token: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().to_vec()
}

/// Milliseconds since the Unix epoch, for timestamped placeholder claims.
pub(super) fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis())
}

fn state_mac(state: &str, secret: &[u8; 32]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(state.as_bytes());
    hasher.update(secret);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Build the signed state cookie value: `state.mac`.
pub(super) fn sign_state(state: &str, secret: &[u8; 32]) -> String {
    format!("{state}.{}", state_mac(state, secret))
}

/// Compare MACs through one more round of hashing so the comparison time is
/// independent of where the values diverge.
fn mac_equal(left: &str, right: &str) -> bool {
    Sha256::digest(left.as_bytes()) == Sha256::digest(right.as_bytes())
}

/// Recover the state from a signed cookie value, rejecting bad signatures.
pub(super) fn verify_signed_state<'a>(value: &'a str, secret: &[u8; 32]) -> Option<&'a str> {
    let (state, mac) = value.split_once('.')?;
    if state.is_empty() || !mac_equal(mac, &state_mac(state, secret)) {
        return None;
    }
    Some(state)
}

/// Build a cookie header value. `max_age` of zero clears the cookie.
pub(super) fn build_cookie(
    name: &str,
    value: &str,
    max_age: i64,
    secure: bool,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub(super) fn clear_cookie(name: &str, secure: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    build_cookie(name, "", 0, secure)
}

/// Extract a cookie value by name from the request headers.
pub(super) fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == name {
            return Some(val.to_string());
        }
    }
    None
}

/// Extract the session token from a bearer header or the session cookie.
pub(super) fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = extract_bearer_token(headers) {
        return Some(token);
    }
    extract_cookie(headers, SESSION_COOKIE_NAME)
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

pub(super) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    const SECRET: [u8; 32] = [7u8; 32];

    #[test]
    fn generate_token_is_32_random_bytes() {
        let token = generate_token().expect("token generates");
        let decoded = URL_SAFE_NO_PAD.decode(&token).expect("token is base64");
        assert_eq!(decoded.len(), 32);
        assert_ne!(token, generate_token().expect("token generates"));
    }

    #[test]
    fn hash_token_is_sha256() {
        let hash = hash_token("token");
        assert_eq!(hash.len(), 32);
        assert_eq!(hash, hash_token("token"));
        assert_ne!(hash, hash_token("other"));
    }

    #[test]
    fn signed_state_round_trips() {
        let signed = sign_state("abc123", &SECRET);
        assert_eq!(verify_signed_state(&signed, &SECRET), Some("abc123"));
    }

    #[test]
    fn signed_state_rejects_wrong_secret() {
        let signed = sign_state("abc123", &SECRET);
        assert_eq!(verify_signed_state(&signed, &[8u8; 32]), None);
    }

    #[test]
    fn mac_comparison_accepts_only_exact_values() {
        let mac = state_mac("abc123", &SECRET);
        assert!(mac_equal(&mac, &state_mac("abc123", &SECRET)));

        // Same length, last character flipped.
        let mut near_miss = mac.clone();
        let last = near_miss.pop().expect("mac is non-empty");
        near_miss.push(if last == 'A' { 'B' } else { 'A' });
        assert!(!mac_equal(&near_miss, &mac));

        assert!(!mac_equal("", &mac));
    }

    #[test]
    fn signed_state_rejects_tampered_value() {
        let signed = sign_state("abc123", &SECRET);
        let tampered = signed.replacen("abc123", "abc124", 1);
        assert_eq!(verify_signed_state(&tampered, &SECRET), None);
        assert_eq!(verify_signed_state("no-separator", &SECRET), None);
        assert_eq!(verify_signed_state(".mac-only", &SECRET), None);
    }

    #[test]
    fn build_cookie_sets_attributes() {
        let cookie = build_cookie("name", "value", 600, true).expect("cookie builds");
        let cookie = cookie.to_str().expect("cookie is ascii");
        assert!(cookie.starts_with("name=value;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=600"));
        assert!(cookie.contains("Secure"));
    }

    #[test]
    fn build_cookie_omits_secure_for_http() {
        let cookie = build_cookie("name", "value", 600, false).expect("cookie builds");
        assert!(!cookie.to_str().expect("ascii").contains("Secure"));
    }

    #[test]
    fn extract_cookie_finds_named_value() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("a=1; cardkeep_session=token; b=2"),
        );
        assert_eq!(
            extract_cookie(&headers, "cardkeep_session").as_deref(),
            Some("token")
        );
        assert_eq!(extract_cookie(&headers, "missing"), None);
    }

    #[test]
    fn extract_session_token_prefers_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(COOKIE, HeaderValue::from_static("cardkeep_session=def"));
        assert_eq!(extract_session_token(&headers).as_deref(), Some("abc"));

        headers.remove(AUTHORIZATION);
        assert_eq!(extract_session_token(&headers).as_deref(), Some("def"));
    }

    #[test]
    fn unix_millis_is_monotonic_enough() {
        let first = unix_millis();
        assert!(first > 0);
        assert!(unix_millis() >= first);
    }
}
