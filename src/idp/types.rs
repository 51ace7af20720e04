use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use super::error::FedCmError;

/// Endpoints served under the FedCM path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FedCmRoute {
    /// `config.json` or `manifest`.
    Manifest,
    Accounts,
    ClientMetadata,
    Token,
    Disconnect,
}

impl FromStr for FedCmRoute {
    type Err = FedCmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "config.json" | "manifest" => Ok(Self::Manifest),
            "accounts" => Ok(Self::Accounts),
            "client-metadata" => Ok(Self::ClientMetadata),
            "token" => Ok(Self::Token),
            "disconnect" => Ok(Self::Disconnect),
            _ => Err(FedCmError::InvalidRoute),
        }
    }
}

/// Identity assertion request from the browser.
///
/// Browsers send it form-encoded, where every value is a string, so
/// `disclosure_text_shown` accepts both `true` and `"true"`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenRequest {
    pub account_id: String,
    pub client_id: String,
    #[serde(default)]
    pub nonce: Option<String>,
    #[serde(default, deserialize_with = "bool_or_string")]
    pub disclosure_text_shown: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientMetadataQuery {
    #[serde(default)]
    pub client_id: Option<String>,
}

/// Login form. The password is accepted and ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub username: String,
}

/// Body of `GET` on a login flow route.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginFlowCreated {
    pub flow_id: String,
}

/// Credentials submitted to a login flow.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginFlowSubmission {
    #[serde(default)]
    pub flow_id: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginFlowCompleted {
    pub success: bool,
    pub identity_id: String,
}

fn bool_or_string<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        String(String),
    }

    match BoolOrString::deserialize(deserializer)? {
        BoolOrString::Bool(b) => Ok(b),
        BoolOrString::String(s) => Ok(s.eq_ignore_ascii_case("true")),
    }
}
