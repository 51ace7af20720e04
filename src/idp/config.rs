use std::str::FromStr;
use std::sync::Arc;

use crate::assertion::AssertionIssuer;
use crate::error::Error;
use crate::manifest::{Branding, ManifestDocument};
use crate::session::{SESSION_TTL_SECS, SessionCodec};
use crate::token::HmacKey;
use crate::well_known::WebIdentityDocument;

use super::gate;

/// Deployment mode (`APP_ENV`, falling back to `NODE_ENV`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeploymentMode {
    Production,
    #[default]
    Development,
    Test,
}

impl FromStr for DeploymentMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "development" | "dev" => Ok(Self::Development),
            "test" => Ok(Self::Test),
            other => Err(Error::Config(format!("unknown deployment mode: {other}"))),
        }
    }
}

/// Mock IdP configuration.
///
/// Built once at startup, either from the environment with
/// [`from_env()`](IdpConfig::from_env) or with [`new()`](IdpConfig::new) plus
/// `with_*` methods, then handed to [`fedcm_routes`](super::fedcm_routes).
/// Nothing downstream reads the environment.
#[derive(Debug, Clone)]
pub struct IdpConfig {
    pub(crate) signing_key: HmacKey,
    pub(crate) mode: DeploymentMode,
    pub(crate) idp_domain: String,
    pub(crate) branding: Branding,
    pub(crate) bypass_sec_fetch_check: bool,
    pub(crate) use_https: Option<bool>,
    pub(crate) session_cookie_name: String,
    pub(crate) session_ttl_secs: i64,
    pub(crate) fedcm_path: String,
    pub(crate) auth_path: String,
    pub(crate) mock_login: bool,
    pub(crate) login_url: String,
    pub(crate) default_client_id: Option<String>,
    pub(crate) account_picture_url: Option<String>,
}

impl IdpConfig {
    /// Create config with the required signing key.
    #[must_use]
    pub fn new(signing_key: HmacKey) -> Self {
        Self {
            signing_key,
            mode: DeploymentMode::default(),
            idp_domain: "localhost:3000".into(),
            branding: Branding::default(),
            bypass_sec_fetch_check: false,
            use_https: None,
            session_cookie_name: "fedcm_session".into(),
            session_ttl_secs: SESSION_TTL_SECS,
            fedcm_path: "/api/fedcm".into(),
            auth_path: "/api/auth".into(),
            mock_login: true,
            login_url: "/idp/login".into(),
            default_client_id: Some("mockfedcm".into()),
            account_picture_url: None,
        }
    }

    /// Create config from environment variables.
    ///
    /// # Env vars
    /// - `APP_ENV` / `NODE_ENV`: `production`, `development` (default) or `test`
    /// - `JWT_SECRET`: signing secret; required in production, otherwise an
    ///   ephemeral random key is generated
    /// - `APP_FQDN`: IdP domain (default `localhost:3000`)
    /// - `FEDCM_PROVIDER_NAME`, `FEDCM_BACKGROUND_COLOR`, `FEDCM_TEXT_COLOR`: branding
    /// - `BYPASS_SEC_FETCH_CHECK`: `"1"` or `"true"` skips the `Sec-Fetch-Dest`
    ///   check outside production
    /// - `USE_HTTPS`: force HTTPS on or off
    /// - `FEDCM_DEFAULT_CLIENT_ID`: client id assumed when `client_id` is
    ///   missing; empty disables the default
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the mode is unknown or `JWT_SECRET` is
    /// missing in production.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mode = match lookup("APP_ENV").or_else(|| lookup("NODE_ENV")) {
            Some(m) => m.parse()?,
            None => DeploymentMode::default(),
        };

        let signing_key = match lookup("JWT_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) => HmacKey::from_secret(secret.as_bytes())?,
            None if mode == DeploymentMode::Production => {
                return Err(Error::Config("JWT_SECRET is required in production".into()));
            }
            None => {
                tracing::warn!("JWT_SECRET not set; sessions will not survive a restart");
                HmacKey::generate()
            }
        };

        let mut config = Self::new(signing_key).with_mode(mode);

        if let Some(domain) = lookup("APP_FQDN").filter(|s| !s.is_empty()) {
            config = config.with_idp_domain(domain);
        }
        if let Some(name) = lookup("FEDCM_PROVIDER_NAME") {
            config.branding = config.branding.with_name(name);
        }
        if let Some(color) = lookup("FEDCM_BACKGROUND_COLOR") {
            config.branding = config.branding.with_background_color(color);
        }
        if let Some(color) = lookup("FEDCM_TEXT_COLOR") {
            config.branding = config.branding.with_color(color);
        }
        if let Some(https) = lookup("USE_HTTPS") {
            config = config.with_use_https(is_truthy(&https));
        }
        if let Some(client_id) = lookup("FEDCM_DEFAULT_CLIENT_ID") {
            config.default_client_id = Some(client_id).filter(|c| !c.is_empty());
        }

        let bypass = lookup("BYPASS_SEC_FETCH_CHECK").is_some_and(|v| is_truthy(&v));
        if bypass && mode == DeploymentMode::Production {
            tracing::warn!("BYPASS_SEC_FETCH_CHECK is ignored in production");
        }

        Ok(config.with_bypass_sec_fetch_check(bypass))
    }

    #[must_use]
    pub fn with_mode(mut self, mode: DeploymentMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_idp_domain(mut self, domain: impl Into<String>) -> Self {
        self.idp_domain = domain.into();
        self
    }

    #[must_use]
    pub fn with_branding(mut self, branding: Branding) -> Self {
        self.branding = branding;
        self
    }

    #[must_use]
    pub fn with_bypass_sec_fetch_check(mut self, bypass: bool) -> Self {
        self.bypass_sec_fetch_check = bypass;
        self
    }

    #[must_use]
    pub fn with_use_https(mut self, https: bool) -> Self {
        self.use_https = Some(https);
        self
    }

    #[must_use]
    pub fn with_session_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.session_cookie_name = name.into();
        self
    }

    #[must_use]
    pub fn with_session_ttl_secs(mut self, secs: i64) -> Self {
        self.session_ttl_secs = secs;
        self
    }

    /// Mount point of the FedCM endpoints. A missing leading `/` is added
    /// and trailing slashes are dropped.
    #[must_use]
    pub fn with_fedcm_path(mut self, path: impl AsRef<str>) -> Self {
        self.fedcm_path = mount_path(path.as_ref());
        self
    }

    /// Mount point of the mock login endpoint, normalised like
    /// [`with_fedcm_path`](Self::with_fedcm_path).
    #[must_use]
    pub fn with_auth_path(mut self, path: impl AsRef<str>) -> Self {
        self.auth_path = mount_path(path.as_ref());
        self
    }

    /// Whether [`fedcm_routes`](super::fedcm_routes) mounts the mock
    /// username login at `auth_path` (default on).
    ///
    /// Turn it off when an external session service owns the session
    /// cookie, otherwise the mock login would overwrite that service's token.
    #[must_use]
    pub fn with_mock_login(mut self, enabled: bool) -> Self {
        self.mock_login = enabled;
        self
    }

    #[must_use]
    pub fn with_login_url(mut self, url: impl Into<String>) -> Self {
        self.login_url = url.into();
        self
    }

    #[must_use]
    pub fn with_default_client_id(mut self, client_id: Option<String>) -> Self {
        self.default_client_id = client_id;
        self
    }

    #[must_use]
    pub fn with_account_picture_url(mut self, url: impl Into<String>) -> Self {
        self.account_picture_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn mode(&self) -> DeploymentMode {
        self.mode
    }

    #[must_use]
    pub fn idp_domain(&self) -> &str {
        &self.idp_domain
    }

    #[must_use]
    pub fn fedcm_path(&self) -> &str {
        &self.fedcm_path
    }

    #[must_use]
    pub fn session_cookie_name(&self) -> &str {
        &self.session_cookie_name
    }

    /// HTTPS unless configured otherwise; production defaults to on.
    #[must_use]
    pub fn https_enabled(&self) -> bool {
        self.use_https
            .unwrap_or(self.mode == DeploymentMode::Production)
    }

    /// Whether the `Sec-Fetch-Dest` check is skipped.
    #[must_use]
    pub fn bypass_active(&self) -> bool {
        gate::bypass_active(self.mode, self.bypass_sec_fetch_check)
    }

    /// `scheme://domain` of this IdP.
    #[must_use]
    pub fn base_url(&self) -> String {
        let scheme = if self.https_enabled() { "https" } else { "http" };
        format!("{scheme}://{}", self.idp_domain)
    }

    /// The IdP config file. Recomputed on every call.
    #[must_use]
    pub fn manifest(&self) -> ManifestDocument {
        let mut branding = self.branding.clone();
        if branding.icons.is_empty() {
            branding = branding.with_icon(format!("{}/icon.png", self.base_url()), 32);
        }
        ManifestDocument::new(&self.fedcm_path, &self.login_url, branding)
    }

    /// The `/.well-known/web-identity` document.
    #[must_use]
    pub fn web_identity(&self) -> WebIdentityDocument {
        let base = self.fedcm_path.trim_end_matches('/');
        WebIdentityDocument::new(vec![format!("{}{base}/config.json", self.base_url())])
    }

    pub(crate) fn account_picture_url(&self) -> String {
        self.account_picture_url
            .clone()
            .unwrap_or_else(|| format!("{}/avatar.png", self.base_url()))
    }

    pub(crate) fn session_codec(&self) -> SessionCodec {
        let key = Arc::new(self.signing_key.clone());
        SessionCodec::new(key.clone(), key).with_ttl_secs(self.session_ttl_secs)
    }

    pub(crate) fn assertion_issuer(&self) -> AssertionIssuer {
        AssertionIssuer::new(Arc::new(self.signing_key.clone()), &self.idp_domain)
    }
}

/// `"api/fedcm/"` becomes `"/api/fedcm"`; an empty path becomes `"/"`.
pub(super) fn mount_path(path: &str) -> String {
    format!("/{}", path.trim().trim_matches('/'))
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "TRUE" | "True")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_map(vars: &[(&str, &str)]) -> Result<IdpConfig, Error> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        IdpConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_without_env() {
        let config = from_map(&[]).unwrap();

        assert_eq!(config.mode(), DeploymentMode::Development);
        assert_eq!(config.idp_domain(), "localhost:3000");
        assert!(!config.https_enabled());
        assert!(!config.bypass_active());
        assert_eq!(config.default_client_id.as_deref(), Some("mockfedcm"));
    }

    #[test]
    fn production_requires_secret() {
        assert!(matches!(
            from_map(&[("APP_ENV", "production")]),
            Err(Error::Config(_))
        ));
        assert!(from_map(&[("APP_ENV", "production"), ("JWT_SECRET", "s3cret")]).is_ok());
    }

    #[test]
    fn node_env_is_fallback() {
        let config = from_map(&[("NODE_ENV", "test")]).unwrap();
        assert_eq!(config.mode(), DeploymentMode::Test);
    }

    #[test]
    fn unknown_mode_rejected() {
        assert!(from_map(&[("APP_ENV", "staging")]).is_err());
    }

    #[test]
    fn bypass_ignored_in_production() {
        let config = from_map(&[
            ("APP_ENV", "production"),
            ("JWT_SECRET", "s3cret"),
            ("BYPASS_SEC_FETCH_CHECK", "true"),
        ])
        .unwrap();
        assert!(!config.bypass_active());

        let config = from_map(&[("BYPASS_SEC_FETCH_CHECK", "true")]).unwrap();
        assert!(config.bypass_active());
    }

    #[test]
    fn production_defaults_to_https() {
        let config = from_map(&[
            ("APP_ENV", "production"),
            ("JWT_SECRET", "s3cret"),
            ("APP_FQDN", "idp.example"),
        ])
        .unwrap();

        assert_eq!(config.base_url(), "https://idp.example");

        let config = from_map(&[
            ("APP_ENV", "production"),
            ("JWT_SECRET", "s3cret"),
            ("USE_HTTPS", "false"),
        ])
        .unwrap();
        assert!(!config.https_enabled());
    }

    #[test]
    fn branding_from_env() {
        let config = from_map(&[
            ("FEDCM_PROVIDER_NAME", "Test IdP"),
            ("FEDCM_BACKGROUND_COLOR", "#123456"),
        ])
        .unwrap();
        let manifest = config.manifest();

        assert_eq!(manifest.branding.name, "Test IdP");
        assert_eq!(manifest.branding.background_color, "#123456");
        assert_eq!(manifest.branding.color, "#000000");
        assert_eq!(manifest.branding.icons[0].url, "http://localhost:3000/icon.png");
        assert_eq!(manifest.branding.icons[0].size, 32);
    }

    #[test]
    fn empty_default_client_id_disables_default() {
        let config = from_map(&[("FEDCM_DEFAULT_CLIENT_ID", "")]).unwrap();
        assert!(config.default_client_id.is_none());
    }

    #[test]
    fn manifest_endpoints_follow_fedcm_path() {
        let config = IdpConfig::new(HmacKey::generate()).with_fedcm_path("/idp/api/fedcm");
        let manifest = config.manifest();

        assert_eq!(manifest.accounts_endpoint, "/idp/api/fedcm/accounts");
        assert_eq!(manifest.id_assertion_endpoint, "/idp/api/fedcm/token");
    }

    #[test]
    fn mount_paths_are_normalised() {
        let config = IdpConfig::new(HmacKey::generate())
            .with_fedcm_path("idp/api/fedcm/")
            .with_auth_path("login");

        assert_eq!(config.fedcm_path(), "/idp/api/fedcm");
        assert_eq!(config.auth_path, "/login");
        assert_eq!(config.manifest().accounts_endpoint, "/idp/api/fedcm/accounts");

        let config = IdpConfig::new(HmacKey::generate()).with_fedcm_path("");
        assert_eq!(config.fedcm_path(), "/");
        assert_eq!(config.manifest().id_assertion_endpoint, "/token");
    }

    #[test]
    fn mock_login_on_by_default() {
        let config = IdpConfig::new(HmacKey::generate());
        assert!(config.mock_login);
        assert!(!config.with_mock_login(false).mock_login);
    }

    #[test]
    fn web_identity_points_at_config_json() {
        let config = IdpConfig::new(HmacKey::generate()).with_idp_domain("idp.example");
        assert_eq!(
            config.web_identity().provider_urls,
            vec!["http://idp.example/api/fedcm/config.json".to_string()]
        );
    }
}
