use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::error::Error;

/// Produces signed tokens from a JSON claims object.
pub trait Signer: Send + Sync + 'static {
    /// Sign `claims` and return the compact token string.
    ///
    /// # Errors
    ///
    /// Returns `Error::Token` if the claims cannot be encoded or signed.
    fn sign(&self, claims: &JsonValue) -> Result<String, Error>;
}

/// Checks token signatures and expiry.
pub trait Verifier: Send + Sync + 'static {
    /// Returns the claims if the signature verifies and `exp` has not passed.
    ///
    /// Every failure (malformed input, bad signature, expiry) is `None`.
    fn verify(&self, token: &str) -> Option<VerifiedClaims>;
}

/// Claims from a token whose signature has been checked.
#[derive(Debug, Clone)]
pub struct VerifiedClaims {
    inner: JsonValue,
}

impl VerifiedClaims {
    /// Gets a claim value by key.
    #[must_use]
    pub fn get_claim(&self, key: &str) -> Option<&JsonValue> {
        self.inner.get(key)
    }

    /// Gets the inner JSON value.
    #[must_use]
    pub fn as_json(&self) -> &JsonValue {
        &self.inner
    }

    /// Deserialize the claims into a typed struct.
    ///
    /// # Errors
    ///
    /// Returns `Error::Token` if a required claim is missing or mistyped.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_value(self.inner.clone()).map_err(|e| Error::Token(e.to_string()))
    }
}

/// HMAC-SHA256 JWT key. Signs and verifies with the same shared secret.
#[derive(Clone)]
pub struct HmacKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl HmacKey {
    /// Build a key from a shared secret.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the secret is empty.
    pub fn from_secret(secret: &[u8]) -> Result<Self, Error> {
        if secret.is_empty() {
            return Err(Error::Config("signing secret must not be empty".into()));
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        })
    }

    /// Generate a random 256-bit key. Tokens signed with it do not survive a restart.
    #[must_use]
    pub fn generate() -> Self {
        let secret: [u8; 32] = rand::rng().random();
        Self {
            encoding: EncodingKey::from_secret(&secret),
            decoding: DecodingKey::from_secret(&secret),
        }
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        // Assertions carry an arbitrary RP audience; callers check `aud` themselves.
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);
        validation
    }
}

impl std::fmt::Debug for HmacKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("HmacKey(..)")
    }
}

impl Signer for HmacKey {
    fn sign(&self, claims: &JsonValue) -> Result<String, Error> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| Error::Token(format!("JWT encode: {e}")))
    }
}

impl Verifier for HmacKey {
    fn verify(&self, token: &str) -> Option<VerifiedClaims> {
        match jsonwebtoken::decode::<JsonValue>(token, &self.decoding, &Self::validation()) {
            Ok(data) => Some(VerifiedClaims { inner: data.claims }),
            Err(e) => {
                tracing::debug!(error = %e, "Token verification failed");
                None
            }
        }
    }
}

/// Current Unix time in seconds.
pub(crate) fn unix_now() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}
