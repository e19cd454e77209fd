use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::Deserialize;

/// Payload fields of an access token that are useful to show the user.
///
/// The signature is NOT verified: the client has no key and the server is
/// the only authority on validity. Use this for display, never for access
/// decisions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl TokenClaims {
    pub fn decode(token: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)?;
        Ok(data.claims)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().map(|at| now >= at).unwrap_or(false)
    }

    /// Get minutes remaining until expiry (for display)
    pub fn minutes_until_expiry(&self, now: DateTime<Utc>) -> Option<i64> {
        self.expires_at()
            .map(|at| (at - now).num_minutes().max(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    fn token(claims: serde_json::Value) -> String {
        encode(&Header::default(), &claims, &EncodingKey::from_secret(b"server-only-secret"))
            .expect("encode test token")
    }

    #[test]
    fn test_decode_without_server_key() {
        let now = Utc::now();
        let exp = (now + Duration::minutes(5)).timestamp();
        let claims = TokenClaims::decode(&token(json!({
            "exp": exp,
            "iat": now.timestamp(),
            "token_type": "access",
            "user_id": 7,
        })))
        .expect("decode");

        assert_eq!(claims.exp, Some(exp));
        assert_eq!(claims.token_type.as_deref(), Some("access"));
        assert!(!claims.is_expired(now));
        let minutes = claims.minutes_until_expiry(now).unwrap();
        assert!((4..=5).contains(&minutes));
    }

    #[test]
    fn test_expired_token_still_decodes() {
        let now = Utc::now();
        let claims = TokenClaims::decode(&token(json!({
            "exp": (now - Duration::hours(1)).timestamp(),
        })))
        .expect("decode");

        assert!(claims.is_expired(now));
        assert_eq!(claims.minutes_until_expiry(now), Some(0));
    }

    #[test]
    fn test_missing_exp_never_expires() {
        let claims = TokenClaims::decode(&token(json!({"token_type": "access"}))).unwrap();
        assert_eq!(claims.expires_at(), None);
        assert!(!claims.is_expired(Utc::now()));
    }

    #[test]
    fn test_opaque_token_is_an_error() {
        assert!(TokenClaims::decode("not-a-jwt").is_err());
    }
}
