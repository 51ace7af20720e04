use std::future::Future;

use crate::accounts::{Account, MockAccountDirectory};
use crate::session::SessionCodec;

/// Resolves the FedCM accounts behind a session cookie.
///
/// The accounts and token endpoints both go through this, so the token
/// endpoint only accepts an `account_id` the accounts endpoint would list.
///
/// Return an empty list when the caller is not signed in. Errors are logged
/// by the dispatcher and treated the same way (fail closed).
///
/// # Example
///
/// ```rust,ignore
/// impl AccountResolver for MyDirectory {
///     async fn resolve_accounts(
///         &self,
///         session_token: Option<&str>,
///     ) -> Result<Vec<Account>, Box<dyn std::error::Error + Send + Sync>> {
///         let Some(token) = session_token else { return Ok(Vec::new()) };
///         Ok(self.db.accounts_for_session(token).await?)
///     }
/// }
/// ```
pub trait AccountResolver: Send + Sync + 'static {
    /// Accounts for the raw session cookie value, if any.
    fn resolve_accounts(
        &self,
        session_token: Option<&str>,
    ) -> impl Future<Output = Result<Vec<Account>, Box<dyn std::error::Error + Send + Sync>>> + Send;
}

/// Default resolver: verifies the signed session cookie and derives the two
/// mock accounts from its username.
#[derive(Clone)]
pub struct SessionAccountResolver {
    codec: SessionCodec,
    directory: MockAccountDirectory,
}

impl SessionAccountResolver {
    #[must_use]
    pub fn new(codec: SessionCodec, directory: MockAccountDirectory) -> Self {
        Self { codec, directory }
    }

    /// Resolver wired to the config's signing key and picture URL.
    #[must_use]
    pub fn from_config(config: &super::IdpConfig) -> Self {
        Self::new(
            config.session_codec(),
            MockAccountDirectory::new(config.account_picture_url()),
        )
    }
}

impl AccountResolver for SessionAccountResolver {
    fn resolve_accounts(
        &self,
        session_token: Option<&str>,
    ) -> impl Future<Output = Result<Vec<Account>, Box<dyn std::error::Error + Send + Sync>>> + Send
    {
        let username = session_token.and_then(|t| self.codec.verify_session_token(t));
        std::future::ready(Ok(self.directory.list_accounts(username.as_ref())))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::token::HmacKey;

    fn resolver() -> (SessionAccountResolver, SessionCodec) {
        let key = Arc::new(HmacKey::from_secret(b"resolver-secret").unwrap());
        let codec = SessionCodec::new(key.clone(), key);
        (
            SessionAccountResolver::new(codec.clone(), MockAccountDirectory::new("pic")),
            codec,
        )
    }

    #[tokio::test]
    async fn no_cookie_no_accounts() {
        let (resolver, _) = resolver();
        assert!(resolver.resolve_accounts(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_cookie_no_accounts() {
        let (resolver, _) = resolver();
        assert!(
            resolver
                .resolve_accounts(Some("forged"))
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn valid_cookie_two_accounts() {
        let (resolver, codec) = resolver();
        let token = codec.create_session_token("carol").unwrap();
        let accounts = resolver.resolve_accounts(Some(&token)).await.unwrap();

        let ids: Vec<_> = accounts.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["carol-personal", "carol-work"]);
    }
}
