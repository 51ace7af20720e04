use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::error::Error;
use crate::session_service::{ExternalSession, Identity, LoginFlowResult, SessionService};

const DEFAULT_BASE_URL: &str = "https://playground.projects.oryapis.com";

/// Upper bound on every call to Ory.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Ory Network Frontend API client.
///
/// Uses the native ("api") login flow so the session token comes back in the
/// response body rather than as an Ory-domain cookie.
pub struct OryClient {
    base_url: String,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct LoginFlow {
    id: String,
}

#[derive(Deserialize)]
struct SuccessfulLogin {
    #[serde(default)]
    session_token: Option<String>,
    #[serde(default)]
    session: Option<ExternalSession>,
}

impl OryClient {
    /// Create a client with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the HTTP client cannot be built.
    pub fn new(base_url: Url) -> Result<Self, Error> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// # Errors
    ///
    /// Returns [`Error::Http`] if the HTTP client cannot be built.
    pub fn with_timeout(base_url: Url, timeout: Duration) -> Result<Self, Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Create a client from `ORY_BASE_PATH` (default: the public playground).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `ORY_BASE_PATH` is not a valid URL.
    pub fn from_env() -> Result<Self, Error> {
        let base = std::env::var("ORY_BASE_PATH").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let url: Url = base
            .parse()
            .map_err(|e| Error::Config(format!("ORY_BASE_PATH: {e}")))?;
        Self::new(url)
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Checks HTTP response status; returns the response on success or an error with details.
    async fn ensure_success(
        response: reqwest::Response,
        operation: &'static str,
    ) -> Result<reqwest::Response, Error> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(Error::SessionService {
            operation,
            status: Some(status),
            detail: body,
        })
    }
}

impl SessionService for OryClient {
    async fn create_login_flow(&self) -> Result<String, Error> {
        let response = self
            .http
            .get(self.endpoint("/self-service/login/api"))
            .send()
            .await?;
        let response = Self::ensure_success(response, "create login flow").await?;
        Ok(response.json::<LoginFlow>().await?.id)
    }

    async fn update_login_flow(
        &self,
        flow_id: &str,
        identifier: &str,
        secret: &str,
    ) -> Result<LoginFlowResult, Error> {
        let body = json!({
            "method": "password",
            "identifier": identifier,
            "password": secret,
        });
        let response = self
            .http
            .post(self.endpoint("/self-service/login"))
            .query(&[("flow", flow_id)])
            .json(&body)
            .send()
            .await?;
        let response = Self::ensure_success(response, "update login flow").await?;
        let login: SuccessfulLogin = response.json().await?;

        let missing = |what: &str| Error::SessionService {
            operation: "update login flow",
            status: None,
            detail: format!("no {what} returned from login flow"),
        };
        let session = login.session.ok_or_else(|| missing("session"))?;
        let session_token = login
            .session_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| missing("session token"))?;

        Ok(LoginFlowResult {
            session_token,
            identity_id: session.identity.map(|i| i.id).unwrap_or_default(),
        })
    }

    async fn validate_session(&self, session_token: &str) -> Result<ExternalSession, Error> {
        let response = self
            .http
            .get(self.endpoint("/sessions/whoami"))
            .header("X-Session-Token", session_token)
            .send()
            .await?;
        let response = Self::ensure_success(response, "validate session").await?;
        Ok(response.json().await?)
    }

    async fn get_identity(&self, session_token: &str, identity_id: &str) -> Result<Identity, Error> {
        // Frontend API only exposes the caller's own identity.
        let session = self.validate_session(session_token).await?;
        match session.identity {
            Some(identity) if identity.id == identity_id => Ok(identity),
            _ => Err(Error::SessionService {
                operation: "get identity",
                status: None,
                detail: "identity does not belong to this session".into(),
            }),
        }
    }
}
