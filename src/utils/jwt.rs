//! JWT payload helpers.
//!
//! Tokens are decoded without signature verification: the store only needs the `exp`
//! claim to decide whether a token it already holds is still usable. Verification is
//! the identity provider client's (and the resource server's) job.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use tracing::trace;

/// Decodes the payload segment of `token`.
///
/// Anything that is not a three-part token with a base64url JSON object payload yields
/// an empty map rather than an error.
pub fn parse_jwt(token: &str) -> Map<String, Value> {
    let mut parts = token.split('.');
    let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => {
            trace!("Token is not a three-part JWT");
            return Map::new();
        }
    };

    // Some issuers pad the segment even though base64url forbids it.
    let decoded = match URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')) {
        Ok(bytes) => bytes,
        Err(e) => {
            trace!("Failed to decode JWT payload: {}", e);
            return Map::new();
        }
    };

    match serde_json::from_slice::<Value>(&decoded) {
        Ok(Value::Object(claims)) => claims,
        Ok(_) | Err(_) => Map::new(),
    }
}

/// Expiry of `token` taken from its `exp` claim (unix seconds).
pub fn token_exp(token: Option<&str>) -> Option<DateTime<Utc>> {
    let claims = parse_jwt(token?);
    let exp = claims.get("exp")?;
    let seconds = exp.as_i64().or_else(|| exp.as_f64().map(|f| f as i64))?;
    Utc.timestamp_opt(seconds, 0).single()
}

/// True when `token` is absent, carries no readable `exp`, or expired before `now`.
pub fn token_is_expired(token: Option<&str>, now: DateTime<Utc>) -> bool {
    match token_exp(token) {
        Some(exp) => exp <= now,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn token_with_payload(payload: &str) -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload);
        format!("{}.{}.signature", header, body)
    }

    #[test]
    fn parses_claims_from_payload() {
        let token = token_with_payload(r#"{"sub":"alice","exp":1700000000}"#);
        let claims = parse_jwt(&token);
        assert_eq!(claims.get("sub"), Some(&Value::from("alice")));
        assert_eq!(claims.get("exp"), Some(&Value::from(1_700_000_000)));
    }

    #[test]
    fn garbage_parses_to_empty_claims() {
        assert!(parse_jwt("not-a-token").is_empty());
        assert!(parse_jwt("a.!!!.c").is_empty());
        assert!(parse_jwt(&token_with_payload("[1,2,3]")).is_empty());
    }

    #[test]
    fn past_exp_is_expired_and_future_exp_is_not() {
        let now = Utc::now();
        let past = token_with_payload(&format!(r#"{{"exp":{}}}"#, (now - Duration::hours(1)).timestamp()));
        let future = token_with_payload(&format!(r#"{{"exp":{}}}"#, (now + Duration::hours(1)).timestamp()));

        assert!(token_is_expired(Some(&past), now));
        assert!(!token_is_expired(Some(&future), now));
    }

    #[test]
    fn unreadable_or_missing_tokens_count_as_expired() {
        let now = Utc::now();
        assert!(token_is_expired(None, now));
        assert!(token_is_expired(Some("opaque"), now));
        assert!(token_is_expired(Some(&token_with_payload(r#"{"sub":"x"}"#)), now));
    }

    #[test]
    fn token_exp_reads_seconds() {
        let token = token_with_payload(r#"{"exp":1861920000}"#);
        let exp = token_exp(Some(&token)).expect("exp should be readable");
        assert_eq!(exp.timestamp(), 1_861_920_000);
    }
}
