use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    CONTENT_TYPE, HeaderName,
};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use super::config::DeploymentMode;

/// Fetch-metadata header the browser attaches to FedCM requests.
pub const SEC_FETCH_DEST: &str = "sec-fetch-dest";

/// `Sec-Fetch-Dest` value for FedCM-originated requests.
pub const WEBIDENTITY: &str = "webidentity";

/// Headers on every FedCM endpoint response.
pub const FEDCM_HEADERS: [(HeaderName, &str); 4] = [
    (ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
    (ACCESS_CONTROL_ALLOW_METHODS, "GET, POST, OPTIONS"),
    (ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type, Sec-Fetch-Dest"),
    (CONTENT_TYPE, "application/json"),
];

/// The bypass applies only when explicitly flagged and not in production.
#[must_use]
pub fn bypass_active(mode: DeploymentMode, flag: bool) -> bool {
    flag && mode != DeploymentMode::Production
}

/// True when `Sec-Fetch-Dest` equals `expected_dest` exactly, or the bypass is active.
#[must_use]
pub fn is_fedcm_request(headers: &HeaderMap, expected_dest: &str, bypass: bool) -> bool {
    if bypass {
        return true;
    }
    headers
        .get(SEC_FETCH_DEST)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|dest| dest == expected_dest)
}

/// CORS preflight answer: 204, headers only.
pub(crate) fn preflight() -> Response {
    (StatusCode::NO_CONTENT, FEDCM_HEADERS).into_response()
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers_with_dest(dest: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(SEC_FETCH_DEST, HeaderValue::from_static(dest));
        headers
    }

    #[test]
    fn exact_match_passes() {
        assert!(is_fedcm_request(&headers_with_dest("webidentity"), WEBIDENTITY, false));
    }

    #[test]
    fn other_destinations_fail() {
        assert!(!is_fedcm_request(&headers_with_dest("document"), WEBIDENTITY, false));
        assert!(!is_fedcm_request(&headers_with_dest("empty"), WEBIDENTITY, false));
        assert!(!is_fedcm_request(&headers_with_dest("WebIdentity"), WEBIDENTITY, false));
        assert!(!is_fedcm_request(&HeaderMap::new(), WEBIDENTITY, false));
    }

    #[test]
    fn bypass_skips_header_check() {
        assert!(is_fedcm_request(&HeaderMap::new(), WEBIDENTITY, true));
    }

    #[test]
    fn bypass_requires_flag_and_non_production() {
        assert!(bypass_active(DeploymentMode::Development, true));
        assert!(bypass_active(DeploymentMode::Test, true));
        assert!(!bypass_active(DeploymentMode::Production, true));
        assert!(!bypass_active(DeploymentMode::Development, false));
    }

    #[test]
    fn preflight_is_empty_204() {
        let response = preflight();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
        assert_eq!(
            response.headers().get(ACCESS_CONTROL_ALLOW_METHODS).unwrap(),
            "GET, POST, OPTIONS"
        );
    }
}
