use serde::{Deserialize, Serialize};

/// `/.well-known/web-identity` discovery document.
///
/// Lists the config URLs the browser may fetch for this IdP's eTLD+1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct WebIdentityDocument {
    pub provider_urls: Vec<String>,
}

impl WebIdentityDocument {
    #[must_use]
    pub fn new(provider_urls: Vec<String>) -> Self {
        Self { provider_urls }
    }
}
