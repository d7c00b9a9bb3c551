//! Token payload decoding and identity claim resolution
//!
//! The client never verifies signatures. It only reads the payload segment to
//! learn the expiry and the acting user, so every check here is a convenience
//! for the user; the backend validates the token on each request.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Identity claims in precedence order
pub const IDENTITY_CLAIMS: [&str; 4] = ["user_id", "sub", "userId", "id"];

/// Decoded token payload
#[derive(Debug, Clone, PartialEq)]
pub struct TokenClaims {
    /// Expiration time (seconds since the epoch)
    pub exp: Option<i64>,
    claims: Map<String, Value>,
}

impl TokenClaims {
    /// Raw claim by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    /// Check if the token expired before `now`
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.exp.is_some_and(|exp| exp < now)
    }

    /// Seconds left before expiry, negative once expired
    pub fn seconds_until_expiry(&self, now: i64) -> Option<i64> {
        self.exp.map(|exp| exp - now)
    }
}

/// Decode the payload segment of a `header.payload.signature` token
pub fn decode_claims(token: &str) -> Result<TokenClaims> {
    let segments: Vec<&str> = token.split('.').collect();
    let [header, payload, _signature] = segments.as_slice() else {
        return Err(Error::Token(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    };
    if header.is_empty() || payload.is_empty() {
        return Err(Error::Token("empty header or payload segment".to_string()));
    }

    let bytes = decode_segment(payload)?;
    let value: Value = serde_json::from_slice(&bytes)
        .map_err(|e| Error::Token(format!("payload is not JSON: {}", e)))?;
    let Value::Object(claims) = value else {
        return Err(Error::Token("payload is not a JSON object".to_string()));
    };

    let exp = match claims.get("exp") {
        None | Some(Value::Null) => None,
        Some(value) => Some(
            value
                .as_i64()
                .or_else(|| value.as_f64().map(|secs| secs as i64))
                .ok_or_else(|| Error::Token("exp claim is not numeric".to_string()))?,
        ),
    };

    Ok(TokenClaims { exp, claims })
}

/// Accepts both base64url and standard alphabets, padded or not
fn decode_segment(segment: &str) -> Result<Vec<u8>> {
    let normalized: String = segment
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    URL_SAFE_NO_PAD
        .decode(normalized.as_bytes())
        .map_err(|e| Error::Token(format!("payload is not base64: {}", e)))
}

/// Which claims identify the acting user, and in what order.
///
/// Strings count only when non-empty; numeric ids are rendered in decimal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimPolicy {
    order: &'static [&'static str],
}

impl ClaimPolicy {
    /// Policy trying the claims in `order`, first match wins
    pub const fn new(order: &'static [&'static str]) -> Self {
        Self { order }
    }

    /// Claim names in the order they are tried
    pub fn order(&self) -> &'static [&'static str] {
        self.order
    }

    /// First populated identity claim
    pub fn resolve(&self, claims: &TokenClaims) -> Option<String> {
        self.order
            .iter()
            .find_map(|name| match claims.get(name)? {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
    }

    /// Decode `token` and resolve its identity claim, `None` on any failure
    pub fn user_id(&self, token: &str) -> Option<String> {
        match decode_claims(token) {
            Ok(claims) => self.resolve(&claims),
            Err(e) => {
                tracing::debug!("Cannot resolve user from token: {}", e);
                None
            }
        }
    }
}

impl Default for ClaimPolicy {
    fn default() -> Self {
        Self::new(&IDENTITY_CLAIMS)
    }
}

/// Shorten a token for display and logs
pub fn mask_token(token: &str) -> String {
    if token.chars().count() <= 16 {
        return "***".to_string();
    }
    let prefix: String = token.chars().take(12).collect();
    format!("{}...", prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use serde_json::json;

    fn token_with(payload: Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string());
        format!("{}.{}.signature", header, body)
    }

    #[test]
    fn test_decode_exp_and_claims() {
        let token = token_with(json!({"sub": "42", "exp": 1_900_000_000}));
        let claims = decode_claims(&token).expect("decode");
        assert_eq!(claims.exp, Some(1_900_000_000));
        assert_eq!(claims.get("sub"), Some(&json!("42")));
    }

    #[test]
    fn test_decode_float_exp() {
        let token = token_with(json!({"exp": 1_900_000_000.75}));
        let claims = decode_claims(&token).expect("decode");
        assert_eq!(claims.exp, Some(1_900_000_000));
    }

    #[test]
    fn test_decode_padded_standard_alphabet() {
        let header = STANDARD.encode(br#"{"alg":"none"}"#);
        let body = STANDARD.encode(br#"{"id":7}"#);
        let token = format!("{}.{}.", header, body);
        let claims = decode_claims(&token).expect("decode");
        assert_eq!(ClaimPolicy::default().resolve(&claims), Some("7".to_string()));
    }

    #[test]
    fn test_rejects_wrong_segment_count() {
        assert!(decode_claims("onlyone").is_err());
        assert!(decode_claims("two.parts").is_err());
        assert!(decode_claims("a.b.c.d").is_err());
        assert!(decode_claims("").is_err());
    }

    #[test]
    fn test_rejects_bad_payload() {
        assert!(decode_claims("header.!!!not-base64!!!.sig").is_err());

        let not_json = URL_SAFE_NO_PAD.encode("not json");
        assert!(decode_claims(&format!("h.{}.s", not_json)).is_err());

        let array = URL_SAFE_NO_PAD.encode("[1,2,3]");
        assert!(decode_claims(&format!("h.{}.s", array)).is_err());

        let string_exp = token_with(json!({"exp": "tomorrow"}));
        assert!(decode_claims(&string_exp).is_err());
    }

    #[test]
    fn test_claim_precedence() {
        let policy = ClaimPolicy::default();

        let all = token_with(json!({"user_id": "u", "sub": "s", "userId": "c", "id": 1}));
        assert_eq!(policy.user_id(&all), Some("u".to_string()));

        let no_user_id = token_with(json!({"sub": "s", "userId": "c", "id": 1}));
        assert_eq!(policy.user_id(&no_user_id), Some("s".to_string()));

        let empty_first = token_with(json!({"user_id": "", "userId": "c"}));
        assert_eq!(policy.user_id(&empty_first), Some("c".to_string()));

        let numeric = token_with(json!({"id": 12}));
        assert_eq!(policy.user_id(&numeric), Some("12".to_string()));

        let none = token_with(json!({"email": "a@b.c"}));
        assert_eq!(policy.user_id(&none), None);

        assert_eq!(policy.user_id("garbage"), None);
    }

    #[test]
    fn test_expiry_helpers() {
        let claims = decode_claims(&token_with(json!({"exp": 1000}))).expect("decode");
        assert!(claims.is_expired_at(1001));
        assert!(!claims.is_expired_at(1000));
        assert_eq!(claims.seconds_until_expiry(900), Some(100));

        let forever = decode_claims(&token_with(json!({"sub": "1"}))).expect("decode");
        assert!(!forever.is_expired_at(i64::MAX));
        assert_eq!(forever.seconds_until_expiry(0), None);
    }

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("short"), "***");
        assert_eq!(mask_token("eyJhbGciOiJIUzI1NiJ9.payload"), "eyJhbGciOiJI...");
    }
}
