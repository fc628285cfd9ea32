use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::utils::jwt::{parse_jwt, token_exp};

/// Decoded profile claims of the signed-in user.
pub type Profile = Map<String, Value>;

/// The user record persisted by the identity-provider client: the tokens of one
/// sign-in plus the profile claims that came with them.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct User {
    pub id_token: Option<String>,
    pub session_state: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub token_type: Option<String>,
    /// Space separated granted scopes.
    pub scope: Option<String>,
    #[serde(default)]
    pub profile: Profile,
    /// Unix seconds.
    pub expires_at: Option<i64>,
    /// Round-trip state the application attached to the sign-in request.
    pub state: Option<Value>,
}

impl User {
    /// Builds a record from raw tokens: the profile comes from the id token's claims and
    /// the expiry from the access token (or the id token when there is no access token).
    pub fn from_tokens(id_token: Option<String>, access_token: Option<String>) -> Self {
        let profile = id_token.as_deref().map(parse_jwt).unwrap_or_default();
        let expires_at = token_exp(access_token.as_deref())
            .or_else(|| token_exp(id_token.as_deref()))
            .map(|exp| exp.timestamp());
        User {
            id_token,
            access_token,
            token_type: Some("Bearer".to_string()),
            profile,
            expires_at,
            ..Default::default()
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn with_expires_at(mut self, expires_at: i64) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Granted scopes, split from `scope`.
    pub fn scopes(&self) -> Option<Vec<String>> {
        self.scope
            .as_deref()
            .map(|s| s.split_whitespace().map(str::to_string).collect())
    }

    /// Seconds until expiry; `None` when the record carries no expiry.
    pub fn expires_in(&self, now: DateTime<Utc>) -> Option<i64> {
        self.expires_at.map(|at| at - now.timestamp())
    }

    /// A record without an expiry never counts as expired.
    pub fn expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_in(now).map_or(false, |left| left <= 0)
    }

    /// The `sub` claim, for log lines.
    pub fn subject(&self) -> &str {
        self.profile
            .get("sub")
            .and_then(Value::as_str)
            .unwrap_or("<unknown>")
    }
}
