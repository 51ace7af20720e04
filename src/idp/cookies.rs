use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

/// Create the session cookie.
///
/// Over HTTPS the cookie is `Secure; SameSite=None` so the browser sends it
/// on cross-site FedCM fetches; over plain HTTP it falls back to `Lax`.
pub(super) fn session_cookie(
    name: &str,
    token: &str,
    ttl_secs: i64,
    https: bool,
) -> Cookie<'static> {
    Cookie::build((name.to_string(), token.to_string()))
        .http_only(true)
        .secure(https)
        .same_site(if https { SameSite::None } else { SameSite::Lax })
        .path("/".to_string())
        .max_age(Duration::seconds(ttl_secs))
        .build()
}

/// True if the request reached us over HTTPS, directly or via a proxy.
pub(super) fn is_request_https(headers: &HeaderMap) -> bool {
    headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|proto| proto.eq_ignore_ascii_case("https"))
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn https_cookie_is_cross_site() {
        let cookie = session_cookie("fedcm_session", "tok", 86_400, true);

        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::None));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(Duration::days(1)));
    }

    #[test]
    fn http_cookie_is_lax() {
        let cookie = session_cookie("fedcm_session", "tok", 86_400, false);

        assert_eq!(cookie.secure(), Some(false));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    }

    #[test]
    fn forwarded_proto_detection() {
        let mut headers = HeaderMap::new();
        assert!(!is_request_https(&headers));

        headers.insert("x-forwarded-proto", HeaderValue::from_static("https"));
        assert!(is_request_https(&headers));

        headers.insert("x-forwarded-proto", HeaderValue::from_static("http"));
        assert!(!is_request_https(&headers));
    }
}
