//! Signed, expiring bearer tokens (JWT, HMAC family).
//!
//! Tokens are stateless: they are valid until `exp` and cannot be revoked.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shopfront_core::Attributes;

use crate::{Role, Subject};

/// Default token lifetime.
pub const DEFAULT_TTL_HOURS: i64 = 24;

/// Algorithm used when issuing.
const ISSUE_ALGORITHM: Algorithm = Algorithm::HS256;

/// Algorithms accepted when verifying. Anything outside the HMAC family is
/// rejected before the signature is even considered.
const ACCEPTED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Claims written into issued tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject identifier.
    pub sub: String,
    pub role: String,
    /// Absolute expiry, unix seconds.
    pub exp: i64,
    pub attr: Attributes,
}

impl TokenClaims {
    pub fn for_subject(subject: &Subject, expires_at: DateTime<Utc>) -> Self {
        Self {
            sub: subject.id.clone(),
            role: subject.role.as_str().to_string(),
            exp: expires_at.timestamp(),
            attr: subject.attributes.clone(),
        }
    }

    /// Rebuild a subject from decoded claims.
    ///
    /// Decoding is lenient: a missing or mistyped `sub`/`role` becomes empty
    /// and a missing or mistyped `attr` becomes an empty map.
    fn subject_from_raw(raw: &serde_json::Map<String, serde_json::Value>) -> Subject {
        let text = |key: &str| {
            raw.get(key)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };
        let attributes = raw
            .get("attr")
            .and_then(|v| v.as_object())
            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();

        Subject::new(text("sub"), Role::from(text("role"))).with_attributes(attributes)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("token has expired")]
    Expired,

    #[error("token encoding failed: {0}")]
    Encode(String),
}

/// Issues and verifies tokens under a single symmetric secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let secret = secret.as_ref();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl: Duration::hours(DEFAULT_TTL_HOURS),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `subject`, expiring `ttl` from now.
    pub fn issue(&self, subject: &Subject) -> Result<String, TokenError> {
        let expires_at = Utc::now()
            .checked_add_signed(self.ttl)
            .ok_or_else(|| TokenError::Encode(format!("ttl {} overflows the expiry", self.ttl)))?;
        self.issue_until(subject, expires_at)
    }

    /// Issue a token with an explicit absolute expiry.
    pub fn issue_until(&self, subject: &Subject, expires_at: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = TokenClaims::for_subject(subject, expires_at);
        jsonwebtoken::encode(&Header::new(ISSUE_ALGORITHM), &claims, &self.encoding)
            .map_err(|e| TokenError::Encode(e.to_string()))
    }

    /// Verify signature, algorithm and expiry, then rebuild the subject.
    pub fn verify(&self, token: &str) -> Result<Subject, TokenError> {
        let mut validation = Validation::new(ISSUE_ALGORITHM);
        validation.algorithms = ACCEPTED_ALGORITHMS.to_vec();
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp"]);

        let data = jsonwebtoken::decode::<serde_json::Map<String, serde_json::Value>>(
            token,
            &self.decoding,
            &validation,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::InvalidToken(e.to_string()),
        })?;

        Ok(TokenClaims::subject_from_raw(&data.claims))
    }
}

impl core::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SECRET: &str = "test-secret-key";

    fn alice() -> Subject {
        let mut attrs = Attributes::new();
        attrs.insert("department".to_string(), json!("sales"));
        attrs.insert("level".to_string(), json!(3));
        Subject::new("u-alice", Role::USER)
            .with_username("alice")
            .with_attributes(attrs)
    }

    fn sign_raw(header: Header, claims: &serde_json::Value, secret: &[u8]) -> String {
        jsonwebtoken::encode(&header, claims, &EncodingKey::from_secret(secret)).unwrap()
    }

    #[test]
    fn verify_returns_issued_identity() {
        let codec = TokenCodec::new(SECRET);
        let subject = alice();

        let token = codec.issue(&subject).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let verified = codec.verify(&token).unwrap();
        assert_eq!(verified.id, subject.id);
        assert_eq!(verified.role, subject.role);
        assert_eq!(verified.attributes, subject.attributes);
        // Username is not a claim.
        assert!(verified.username.is_empty());
    }

    #[test]
    fn default_expiry_is_twenty_four_hours_out() {
        let codec = TokenCodec::new(SECRET);
        let before = Utc::now();
        let token = codec.issue(&alice()).unwrap();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        let data = jsonwebtoken::decode::<TokenClaims>(&token, &DecodingKey::from_secret(b""), &validation).unwrap();

        let expected = (before + Duration::hours(24)).timestamp();
        assert!((data.claims.exp - expected).abs() <= 2);
        assert_eq!(data.claims.sub, "u-alice");
        assert_eq!(data.claims.role, "user");
    }

    #[test]
    fn expired_token_is_rejected_as_expired() {
        let codec = TokenCodec::new(SECRET);
        let token = codec
            .issue_until(&alice(), Utc::now() - Duration::seconds(5))
            .unwrap();

        assert_eq!(codec.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn foreign_secret_is_an_invalid_signature() {
        let issuer = TokenCodec::new("some-other-key");
        let verifier = TokenCodec::new(SECRET);
        let token = issuer.issue(&alice()).unwrap();

        assert!(matches!(verifier.verify(&token), Err(TokenError::InvalidToken(_))));
    }

    #[test]
    fn expired_token_with_foreign_secret_is_invalid_not_expired() {
        let issuer = TokenCodec::new("some-other-key");
        let verifier = TokenCodec::new(SECRET);
        let token = issuer
            .issue_until(&alice(), Utc::now() - Duration::hours(1))
            .unwrap();

        assert!(matches!(verifier.verify(&token), Err(TokenError::InvalidToken(_))));
    }

    #[test]
    fn other_hmac_strengths_are_accepted() {
        let codec = TokenCodec::new(SECRET);
        let exp = (Utc::now() + Duration::minutes(5)).timestamp();
        let token = sign_raw(
            Header::new(Algorithm::HS512),
            &json!({ "sub": "u-1", "role": "admin", "exp": exp, "attr": {} }),
            SECRET.as_bytes(),
        );

        let subject = codec.verify(&token).unwrap();
        assert_eq!(subject.role, Role::ADMIN);
    }

    #[test]
    fn unsigned_token_is_rejected() {
        let codec = TokenCodec::new(SECRET);
        let exp = (Utc::now() + Duration::minutes(5)).timestamp();
        // {"alg":"none","typ":"JWT"}
        let header = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0";
        let payload = sign_raw(
            Header::new(Algorithm::HS256),
            &json!({ "sub": "u-1", "role": "admin", "exp": exp }),
            SECRET.as_bytes(),
        )
        .split('.')
        .nth(1)
        .unwrap()
        .to_string();

        let forged = format!("{header}.{payload}.");
        assert!(matches!(codec.verify(&forged), Err(TokenError::InvalidToken(_))));
    }

    #[test]
    fn missing_exp_or_garbage_is_invalid() {
        let codec = TokenCodec::new(SECRET);
        let no_exp = sign_raw(
            Header::new(Algorithm::HS256),
            &json!({ "sub": "u-1", "role": "admin" }),
            SECRET.as_bytes(),
        );

        assert!(matches!(codec.verify(&no_exp), Err(TokenError::InvalidToken(_))));
        assert!(matches!(codec.verify("not-a-token"), Err(TokenError::InvalidToken(_))));
        assert!(matches!(codec.verify(""), Err(TokenError::InvalidToken(_))));
    }

    #[test]
    fn garbled_claims_default_to_empty() {
        let codec = TokenCodec::new(SECRET);
        let exp = (Utc::now() + Duration::minutes(5)).timestamp();
        let token = sign_raw(
            Header::new(Algorithm::HS256),
            &json!({ "sub": 17, "exp": exp, "attr": "nope" }),
            SECRET.as_bytes(),
        );

        let subject = codec.verify(&token).unwrap();
        assert_eq!(subject.id, "");
        assert!(subject.role.is_empty());
        assert!(subject.attributes.is_empty());
    }

    #[test]
    fn debug_output_redacts_the_secret() {
        let rendered = format!("{:?}", TokenCodec::new("super-secret-value"));
        assert!(!rendered.contains("super-secret-value"));
        assert!(rendered.contains("redacted"));
    }

    #[test]
    fn ttl_past_the_calendar_is_an_encode_error() {
        let codec = TokenCodec::new(SECRET).with_ttl(Duration::days(1_000_000_000));
        assert!(matches!(codec.issue(&alice()), Err(TokenError::Encode(_))));
    }
}
