//! External session-management service.
//!
//! Instead of signing its own session cookie, the IdP can delegate login and
//! session validation to a hosted identity service (Ory Network via
//! [`OryClient`](crate::ory::OryClient) with the `ory` feature). The cookie
//! then carries that service's session token and the accounts endpoint lists
//! the single identity behind it.

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::accounts::Account;
use crate::error::Error;
use crate::idp::AccountResolver;
use crate::types::ClientId;

/// Result of a completed login flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginFlowResult {
    pub session_token: String,
    pub identity_id: String,
}

/// Session as reported by the external service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[non_exhaustive]
pub struct ExternalSession {
    pub id: String,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub identity: Option<Identity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Identity {
    pub id: String,
    #[serde(default)]
    pub traits: IdentityTraits,
    #[serde(default)]
    pub metadata_public: Option<IdentityMetadata>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityTraits {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<IdentityName>,
    #[serde(default)]
    pub picture: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityName {
    #[serde(default)]
    pub first: Option<String>,
    #[serde(default)]
    pub last: Option<String>,
    #[serde(default)]
    pub full: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityMetadata {
    #[serde(default)]
    pub approved_clients: Option<Vec<String>>,
}

/// Login and session operations the IdP needs from the external service.
pub trait SessionService: Send + Sync + 'static {
    /// Start a login flow and return its id.
    fn create_login_flow(&self) -> impl Future<Output = Result<String, Error>> + Send;

    /// Submit credentials to a login flow.
    fn update_login_flow(
        &self,
        flow_id: &str,
        identifier: &str,
        secret: &str,
    ) -> impl Future<Output = Result<LoginFlowResult, Error>> + Send;

    /// Look up the session behind a session token.
    fn validate_session(
        &self,
        session_token: &str,
    ) -> impl Future<Output = Result<ExternalSession, Error>> + Send;

    /// Fetch an identity the session token is allowed to see.
    fn get_identity(
        &self,
        session_token: &str,
        identity_id: &str,
    ) -> impl Future<Output = Result<Identity, Error>> + Send;
}

/// Map an external identity to a FedCM account.
#[must_use]
pub fn identity_to_account(identity: &Identity) -> Account {
    let traits = &identity.traits;
    let email = traits.email.clone().unwrap_or_default();
    let name = traits
        .name
        .as_ref()
        .and_then(|n| n.full.clone())
        .unwrap_or_else(|| email.clone());
    let approved = identity
        .metadata_public
        .as_ref()
        .and_then(|m| m.approved_clients.clone())
        .unwrap_or_default()
        .into_iter()
        .map(ClientId)
        .collect();

    let mut account = Account::new(&identity.id, name, email).with_approved_clients(approved);
    if let Some(first) = traits.name.as_ref().and_then(|n| n.first.clone()) {
        account = account.with_given_name(first);
    }
    if let Some(picture) = &traits.picture {
        account = account.with_picture(picture);
    }
    account
}

/// Account resolver backed by a [`SessionService`].
///
/// Lists the one identity behind the session token. Any service error
/// propagates to the dispatcher, which treats it as "signed out".
pub struct SessionServiceResolver<S> {
    service: Arc<S>,
}

impl<S> SessionServiceResolver<S> {
    #[must_use]
    pub fn new(service: Arc<S>) -> Self {
        Self { service }
    }
}

impl<S> Clone for SessionServiceResolver<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
        }
    }
}

impl<S: SessionService> AccountResolver for SessionServiceResolver<S> {
    async fn resolve_accounts(
        &self,
        session_token: Option<&str>,
    ) -> Result<Vec<Account>, Box<dyn std::error::Error + Send + Sync>> {
        let Some(token) = session_token else {
            return Ok(Vec::new());
        };

        let session = self.service.validate_session(token).await?;
        if session.active == Some(false) {
            return Ok(Vec::new());
        }
        let Some(identity_id) = session.identity.map(|i| i.id) else {
            return Ok(Vec::new());
        };

        let identity = self.service.get_identity(token, &identity_id).await?;
        Ok(vec![identity_to_account(&identity)])
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// In-memory service: one user, password "secret", token "tok-{flow}".
    pub(crate) struct FakeService {
        pub(crate) fail: bool,
    }

    fn dana() -> Identity {
        Identity {
            id: "id-dana".into(),
            traits: IdentityTraits {
                email: Some("dana@example.com".into()),
                name: Some(IdentityName {
                    first: Some("Dana".into()),
                    last: Some("Scully".into()),
                    full: Some("Dana Scully".into()),
                }),
                picture: Some("https://pics.example/dana.png".into()),
            },
            metadata_public: Some(IdentityMetadata {
                approved_clients: Some(vec!["rp.example".into()]),
            }),
        }
    }

    fn unavailable(operation: &'static str) -> Error {
        Error::SessionService {
            operation,
            status: Some(503),
            detail: "unavailable".into(),
        }
    }

    impl SessionService for FakeService {
        async fn create_login_flow(&self) -> Result<String, Error> {
            if self.fail {
                return Err(unavailable("create login flow"));
            }
            Ok("flow-1".into())
        }

        async fn update_login_flow(
            &self,
            flow_id: &str,
            identifier: &str,
            secret: &str,
        ) -> Result<LoginFlowResult, Error> {
            if self.fail || identifier != "dana@example.com" || secret != "secret" {
                return Err(unavailable("update login flow"));
            }
            Ok(LoginFlowResult {
                session_token: format!("tok-{flow_id}"),
                identity_id: "id-dana".into(),
            })
        }

        async fn validate_session(&self, session_token: &str) -> Result<ExternalSession, Error> {
            if self.fail || !session_token.starts_with("tok-") {
                return Err(unavailable("validate session"));
            }
            Ok(ExternalSession {
                id: "sess-1".into(),
                active: Some(true),
                identity: Some(dana()),
            })
        }

        async fn get_identity(
            &self,
            _session_token: &str,
            identity_id: &str,
        ) -> Result<Identity, Error> {
            if identity_id == "id-dana" {
                Ok(dana())
            } else {
                Err(unavailable("get identity"))
            }
        }
    }

    #[test]
    fn maps_full_identity() {
        let account = identity_to_account(&dana());

        assert_eq!(account.id.as_str(), "id-dana");
        assert_eq!(account.name, "Dana Scully");
        assert_eq!(account.email, "dana@example.com");
        assert_eq!(account.given_name.as_deref(), Some("Dana"));
        assert_eq!(account.picture.as_deref(), Some("https://pics.example/dana.png"));
        assert_eq!(account.approved_clients, vec![ClientId("rp.example".into())]);
    }

    #[test]
    fn name_falls_back_to_email() {
        let identity: Identity = serde_json::from_value(serde_json::json!({
            "id": "id-1",
            "traits": { "email": "x@example.com" }
        }))
        .unwrap();
        let account = identity_to_account(&identity);

        assert_eq!(account.name, "x@example.com");
        assert!(account.given_name.is_none());
        assert!(account.approved_clients.is_empty());
    }

    #[tokio::test]
    async fn resolver_lists_session_identity() {
        let resolver = SessionServiceResolver::new(Arc::new(FakeService { fail: false }));
        let accounts = resolver.resolve_accounts(Some("tok-flow-1")).await.unwrap();

        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].id.as_str(), "id-dana");
    }

    #[tokio::test]
    async fn resolver_without_cookie_is_empty() {
        let resolver = SessionServiceResolver::new(Arc::new(FakeService { fail: false }));
        assert!(resolver.resolve_accounts(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn resolver_propagates_service_errors() {
        let resolver = SessionServiceResolver::new(Arc::new(FakeService { fail: true }));
        assert!(resolver.resolve_accounts(Some("tok-flow-1")).await.is_err());
    }
}
