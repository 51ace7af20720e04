use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use super::gate::FEDCM_HEADERS;

/// Errors returned from FedCM and login endpoints.
///
/// Always rendered as `{"error": "..."}` with the FedCM header set. The
/// message is fixed per variant; details are logged, never returned.
#[derive(Debug, thiserror::Error)]
pub enum FedCmError {
    /// Missing or malformed input.
    #[error("{0}")]
    Validation(String),

    /// Route segment is not a FedCM endpoint.
    #[error("Invalid route")]
    InvalidRoute,

    /// Failed `Sec-Fetch-Dest` check or no valid session.
    #[error("Unauthorized")]
    Unauthorized,

    /// Credentials rejected by the external session service.
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// Known route, wrong HTTP method.
    #[error("Route not supported")]
    MethodNotAllowed,

    /// Signing or another server-side failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl FedCmError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidRoute => StatusCode::BAD_REQUEST,
            Self::Unauthorized | Self::AuthenticationFailed => StatusCode::UNAUTHORIZED,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for FedCmError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::Internal(_) => {
                tracing::error!(error = %self, "FedCM internal error");
                "Internal error".to_string()
            }
            other => other.to_string(),
        };
        let body = Json(ErrorBody { error: &message });
        (self.status(), FEDCM_HEADERS, body).into_response()
    }
}

impl From<crate::error::Error> for FedCmError {
    fn from(e: crate::error::Error) -> Self {
        match e {
            crate::error::Error::Validation(msg) => Self::Validation(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}
