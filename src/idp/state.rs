use std::sync::Arc;

use crate::accounts::Account;
use crate::assertion::AssertionIssuer;
use crate::session::SessionCodec;

use super::config::IdpConfig;
use super::traits::AccountResolver;

/// Shared state for FedCM route handlers.
pub(super) struct IdpState<R> {
    pub(super) config: Arc<IdpConfig>,
    pub(super) sessions: SessionCodec,
    pub(super) issuer: AssertionIssuer,
    pub(super) resolver: Arc<R>,
}

// Manual Clone: avoid derive adding an `R: Clone` bound.
impl<R> Clone for IdpState<R> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            sessions: self.sessions.clone(),
            issuer: self.issuer.clone(),
            resolver: self.resolver.clone(),
        }
    }
}

impl<R: AccountResolver> IdpState<R> {
    pub(super) fn new(config: IdpConfig, resolver: R) -> Self {
        Self {
            sessions: config.session_codec(),
            issuer: config.assertion_issuer(),
            config: Arc::new(config),
            resolver: Arc::new(resolver),
        }
    }

    /// Resolver errors count as "signed out".
    pub(super) async fn accounts_for(&self, session_token: Option<&str>) -> Vec<Account> {
        match self.resolver.resolve_accounts(session_token).await {
            Ok(accounts) => accounts,
            Err(e) => {
                tracing::warn!(error = %e, "Account resolution failed, treating as signed out");
                Vec::new()
            }
        }
    }
}
