use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::token::{Signer, unix_now};
use crate::types::{AccountId, ClientId};

/// Identity assertion lifetime: one hour.
pub const ASSERTION_TTL_SECS: i64 = 3600;

/// Claims of an identity assertion returned to the RP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionClaims {
    /// Account id chosen in the FedCM dialog.
    pub sub: AccountId,
    /// Requesting RP.
    pub aud: ClientId,
    /// IdP domain.
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    /// Unique token id (ULID).
    pub jti: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

/// Mints signed identity assertions.
///
/// A pure signer: the caller has already checked that `account_id` belongs
/// to the current session.
#[derive(Clone)]
pub struct AssertionIssuer {
    signer: Arc<dyn Signer>,
    issuer: String,
}

impl AssertionIssuer {
    #[must_use]
    pub fn new(signer: Arc<dyn Signer>, issuer: impl Into<String>) -> Self {
        Self {
            signer,
            issuer: issuer.into(),
        }
    }

    /// Issuer (`iss`) stamped on every assertion.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Issue a token binding `account_id` to `client_id`, valid for one hour.
    ///
    /// # Errors
    ///
    /// Returns `Error::Token` if signing fails.
    pub fn issue_token(
        &self,
        account_id: &AccountId,
        client_id: &ClientId,
        nonce: Option<&str>,
    ) -> Result<String, Error> {
        let iat = unix_now();
        let claims = AssertionClaims {
            sub: account_id.clone(),
            aud: client_id.clone(),
            iss: self.issuer.clone(),
            iat,
            exp: iat + ASSERTION_TTL_SECS,
            jti: ulid::Ulid::new().to_string(),
            nonce: nonce.map(str::to_owned),
        };
        let value = serde_json::to_value(&claims).map_err(|e| Error::Token(e.to_string()))?;
        self.signer.sign(&value)
    }
}
