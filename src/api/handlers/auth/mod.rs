//! OAuth login bridge and session handlers.
//!
//! The login flow is a five-step linear sequence with no retries:
//!
//! 1. `GET /v1/auth/login` builds the provider authorization URL, sets a
//!    signed state cookie, and redirects the browser.
//! 2. `GET /v1/auth/callback` verifies the returned state against the cookie.
//! 3. The code is exchanged for an access token (one POST, Basic auth).
//! 4. Identity claims are fetched from the userinfo endpoint; a failing
//!    userinfo call degrades to placeholder claims instead of aborting.
//! 5. The account is upserted by email and a session is minted through a
//!    single-use login-link token.
//!
//! Any external failure redirects back to the frontend with a coarse error
//! code (`invalid_state`, `no_code`, `oauth_failed`, `session_failed`); the
//! user restarts from step 1.
//!
//! The provider's identity token signature is not verified locally; trust is
//! delegated to the TLS channel of the server-to-server token exchange.

pub(crate) mod callback;
pub(crate) mod login;
pub(crate) mod principal;
mod provider;
pub(crate) mod session;
mod state;
mod storage;
pub(crate) mod types;
mod utils;

pub use state::{AuthConfig, AuthState, ProviderConfig};
