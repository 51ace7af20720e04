use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;

use super::state::IdpState;
use super::traits::AccountResolver;

/// Raw session cookie value, if the request carried one.
///
/// Never rejects: whether the value is a valid session is decided by the
/// [`AccountResolver`], and a missing cookie just means "signed out".
///
/// ```rust,ignore
/// async fn handler(SessionToken(token): SessionToken) -> impl IntoResponse {
///     match token {
///         Some(_) => "cookie present",
///         None => "no cookie",
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub(crate) struct SessionToken(pub(crate) Option<String>);

impl<R: AccountResolver> FromRequestParts<IdpState<R>> for SessionToken {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &IdpState<R>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        Ok(Self(
            jar.get(state.config.session_cookie_name())
                .map(|c| c.value().to_string())
                .filter(|v| !v.is_empty()),
        ))
    }
}
