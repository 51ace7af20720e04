//! Stateless session tokens.
//!
//! The whole session is a signed claim stored in a cookie, so it survives
//! restarts without a database. There is no server-side revocation; a token
//! dies when `exp` passes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::token::{Signer, Verifier, unix_now};
use crate::types::Username;

/// Session lifetime: 24 hours.
pub const SESSION_TTL_SECS: i64 = 60 * 60 * 24;

/// Claims embedded in a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub username: Username,
    pub iat: i64,
    pub exp: i64,
}

/// Encodes and decodes session tokens with a shared secret.
#[derive(Clone)]
pub struct SessionCodec {
    signer: Arc<dyn Signer>,
    verifier: Arc<dyn Verifier>,
    ttl_secs: i64,
}

impl SessionCodec {
    #[must_use]
    pub fn new(signer: Arc<dyn Signer>, verifier: Arc<dyn Verifier>) -> Self {
        Self {
            signer,
            verifier,
            ttl_secs: SESSION_TTL_SECS,
        }
    }

    #[must_use]
    pub fn with_ttl_secs(mut self, ttl_secs: i64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    /// Create a signed session token for `username`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if `username` is empty or whitespace, or
    /// `Error::Token` if signing fails.
    pub fn create_session_token(&self, username: &str) -> Result<String, Error> {
        let username: Username = username.parse()?;
        self.create_session_token_at(username, unix_now())
    }

    fn create_session_token_at(&self, username: Username, iat: i64) -> Result<String, Error> {
        let claims = SessionClaims {
            username,
            iat,
            exp: iat + self.ttl_secs,
        };
        let value = serde_json::to_value(&claims).map_err(|e| Error::Token(e.to_string()))?;
        self.signer.sign(&value)
    }

    /// Returns the username if the token verifies and has not expired.
    ///
    /// Every failure is `None`; callers treat it as "unauthenticated".
    #[must_use]
    pub fn verify_session_token(&self, token: &str) -> Option<Username> {
        let claims: SessionClaims = self.verifier.verify(token)?.deserialize().ok()?;
        (unix_now() < claims.exp).then_some(claims.username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::HmacKey;

    fn codec() -> SessionCodec {
        let key = Arc::new(HmacKey::from_secret(b"session-test-secret").unwrap());
        SessionCodec::new(key.clone(), key)
    }

    #[test]
    fn roundtrip_returns_username() {
        let codec = codec();
        for name in ["alice", "bob smith", "ünïcødé", " padded "] {
            let token = codec.create_session_token(name).unwrap();
            assert_eq!(codec.verify_session_token(&token).unwrap().as_str(), name);
        }
    }

    #[test]
    fn blank_username_is_validation_error() {
        let codec = codec();
        assert!(matches!(
            codec.create_session_token(""),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            codec.create_session_token("   "),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn expired_session_is_none() {
        let codec = codec();
        let issued = unix_now() - SESSION_TTL_SECS - 5;
        let token = codec
            .create_session_token_at("alice".parse().unwrap(), issued)
            .unwrap();

        assert!(codec.verify_session_token(&token).is_none());
    }

    #[test]
    fn session_just_inside_window_is_valid() {
        let codec = codec();
        let issued = unix_now() - SESSION_TTL_SECS + 60;
        let token = codec
            .create_session_token_at("alice".parse().unwrap(), issued)
            .unwrap();

        assert!(codec.verify_session_token(&token).is_some());
    }

    #[test]
    fn token_from_other_secret_is_none() {
        let other_key = Arc::new(HmacKey::from_secret(b"other").unwrap());
        let other = SessionCodec::new(other_key.clone(), other_key);
        let token = other.create_session_token("alice").unwrap();

        assert!(codec().verify_session_token(&token).is_none());
    }

    #[test]
    fn malformed_token_is_none() {
        let codec = codec();
        assert!(codec.verify_session_token("").is_none());
        assert!(codec.verify_session_token("garbage").is_none());
    }

    #[test]
    fn token_without_username_is_none() {
        let key = Arc::new(HmacKey::from_secret(b"session-test-secret").unwrap());
        let token = key
            .sign(&serde_json::json!({ "sub": "x", "exp": unix_now() + 60 }))
            .unwrap();

        assert!(codec().verify_session_token(&token).is_none());
    }

    #[test]
    fn ttl_is_24_hours() {
        let codec = codec();
        let key = HmacKey::from_secret(b"session-test-secret").unwrap();
        let token = codec.create_session_token("alice").unwrap();
        let claims: SessionClaims = key.verify(&token).unwrap().deserialize().unwrap();

        assert_eq!(claims.exp - claims.iat, SESSION_TTL_SECS);
    }
}
