//! Request/response types and identity claims for the login bridge.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::{IntoParams, ToSchema};

/// Placeholder display name when the provider omits every name field.
const PLACEHOLDER_NAME: &str = "Vipps User";

/// Token endpoint response; held in-memory for one callback request only.
#[derive(Deserialize, Debug)]
pub(super) struct TokenExchangeResult {
    pub(super) access_token: String,
    #[serde(default)]
    pub(super) token_type: Option<String>,
    #[serde(default)]
    pub(super) scope: Option<String>,
}

/// Query parameters the provider sends to the callback endpoint.
#[derive(Deserialize, IntoParams, Debug)]
pub(crate) struct CallbackQuery {
    pub(super) code: Option<String>,
    pub(super) state: Option<String>,
    pub(super) error: Option<String>,
}

/// Identity claims mapped from the provider's userinfo response.
///
/// Every field may be absent upstream; `subject`, `email`, and
/// `display_name` always carry a deterministic fallback so the account
/// upsert never sees a null key.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct IdentityClaims {
    pub subject: String,
    pub email: String,
    pub display_name: String,
    pub phone: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub middle_name: Option<String>,
    pub birth_date: Option<String>,
    pub address: Option<Value>,
    pub national_id: Option<String>,
}

impl IdentityClaims {
    /// Map a userinfo payload onto claims, tolerating the provider's
    /// alternate field names and absent fields.
    pub(super) fn from_userinfo(value: &Value, now_millis: u128) -> Self {
        let text = |keys: &[&str]| -> Option<String> {
            keys.iter()
                .find_map(|key| value.get(*key).and_then(Value::as_str))
                .map(ToString::to_string)
        };

        let subject = text(&["sub", "user_id"]).unwrap_or_else(|| format!("vipps_{now_millis}"));
        let email = text(&["email", "email_address"])
            .unwrap_or_else(|| Self::placeholder_email(now_millis));
        let display_name =
            text(&["name", "given_name"]).unwrap_or_else(|| PLACEHOLDER_NAME.to_string());
        let given_name = text(&["given_name", "name"]);

        let address = value
            .get("address")
            .filter(|address| !address.is_null())
            .cloned()
            .or_else(|| synthesize_address(value));

        Self {
            subject,
            email,
            display_name,
            phone: text(&["phone_number", "phone"]),
            given_name,
            family_name: text(&["family_name"]),
            middle_name: text(&["middle_name"]),
            birth_date: text(&["birth_date", "birthdate"]),
            address,
            national_id: text(&["nin", "national_identity_number"]),
        }
    }

    /// Synthesized claims used when the userinfo endpoint is unavailable.
    pub(super) fn placeholder(now_millis: u128) -> Self {
        Self {
            subject: format!("vipps_{now_millis}"),
            email: Self::placeholder_email(now_millis),
            display_name: PLACEHOLDER_NAME.to_string(),
            phone: None,
            given_name: None,
            family_name: None,
            middle_name: None,
            birth_date: None,
            address: None,
            national_id: None,
        }
    }

    // Timestamped so concurrent degraded logins never collide on email.
    fn placeholder_email(now_millis: u128) -> String {
        format!("vipps-user-{now_millis}@placeholder.invalid")
    }

    /// The subset of claims exposed to the success page cookie.
    pub(super) fn display(&self) -> DisplayClaims {
        DisplayClaims {
            display_name: self.display_name.clone(),
            given_name: self.given_name.clone(),
            email: self.email.clone(),
        }
    }
}

fn synthesize_address(value: &Value) -> Option<Value> {
    let field = |key: &str| value.get(key).and_then(Value::as_str);
    let street = field("street_address");
    let postal = field("postal_code");
    let city = field("city");
    if street.is_none() && postal.is_none() && city.is_none() {
        return None;
    }
    Some(json!({
        "street_address": street,
        "postal_code": postal,
        "city": city,
        "country": field("country").unwrap_or("NO"),
    }))
}

/// Claims shown on the post-login success page, carried in a short-lived cookie.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct DisplayClaims {
    pub display_name: String,
    pub given_name: Option<String>,
    pub email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SessionResponse {
    pub user_id: String,
    pub email: String,
    pub display_name: String,
}
