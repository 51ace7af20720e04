use serde::{Deserialize, Serialize};

use crate::types::ClientId;

/// IdP config file served at `config.json` / `manifest`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct ManifestDocument {
    pub accounts_endpoint: String,
    pub client_metadata_endpoint: String,
    pub id_assertion_endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disconnect_endpoint: Option<String>,
    pub login_url: String,
    pub branding: Branding,
}

impl ManifestDocument {
    /// Build a manifest whose endpoints all live under `endpoint_base`.
    #[must_use]
    pub fn new(endpoint_base: &str, login_url: impl Into<String>, branding: Branding) -> Self {
        let base = endpoint_base.trim_end_matches('/');
        Self {
            accounts_endpoint: format!("{base}/accounts"),
            client_metadata_endpoint: format!("{base}/client-metadata"),
            id_assertion_endpoint: format!("{base}/token"),
            disconnect_endpoint: Some(format!("{base}/disconnect")),
            login_url: login_url.into(),
            branding,
        }
    }
}

/// Branding shown in the browser's FedCM dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Branding {
    pub name: String,
    pub background_color: String,
    pub color: String,
    pub icons: Vec<BrandingIcon>,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            name: "FedCM Mock IdP".into(),
            background_color: "#ffffff".into(),
            color: "#000000".into(),
            icons: Vec::new(),
        }
    }
}

impl Branding {
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_background_color(mut self, color: impl Into<String>) -> Self {
        self.background_color = color.into();
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    #[must_use]
    pub fn with_icon(mut self, url: impl Into<String>, size: u32) -> Self {
        self.icons.push(BrandingIcon {
            url: url.into(),
            size,
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandingIcon {
    pub url: String,
    pub size: u32,
}

/// Client metadata endpoint body.
///
/// No registry: URLs are derived from the client id itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMetadata {
    pub privacy_policy_url: String,
    pub terms_of_service_url: String,
}

impl ClientMetadata {
    #[must_use]
    pub fn for_client(client_id: &ClientId) -> Self {
        Self {
            privacy_policy_url: format!("https://{client_id}/privacy"),
            terms_of_service_url: format!("https://{client_id}/terms"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_under_base() {
        let manifest = ManifestDocument::new("/api/fedcm/", "/idp/login", Branding::default());

        assert_eq!(manifest.accounts_endpoint, "/api/fedcm/accounts");
        assert_eq!(manifest.client_metadata_endpoint, "/api/fedcm/client-metadata");
        assert_eq!(manifest.id_assertion_endpoint, "/api/fedcm/token");
        assert_eq!(
            manifest.disconnect_endpoint.as_deref(),
            Some("/api/fedcm/disconnect")
        );
        assert_eq!(manifest.login_url, "/idp/login");
    }

    #[test]
    fn default_branding() {
        let branding = Branding::default();
        assert_eq!(branding.name, "FedCM Mock IdP");
        assert_eq!(branding.background_color, "#ffffff");
        assert_eq!(branding.color, "#000000");
    }

    #[test]
    fn branding_serializes_icons() {
        let branding = Branding::default().with_icon("https://idp.example/icon.png", 32);
        let json = serde_json::to_value(&branding).unwrap();

        assert_eq!(json["icons"][0]["url"], "https://idp.example/icon.png");
        assert_eq!(json["icons"][0]["size"], 32);
    }

    #[test]
    fn client_metadata_uses_client_id_verbatim() {
        let meta = ClientMetadata::for_client(&ClientId("rp.example".into()));
        assert_eq!(meta.privacy_policy_url, "https://rp.example/privacy");
        assert_eq!(meta.terms_of_service_url, "https://rp.example/terms");
    }
}
