#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Token error: {0}")]
    Token(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[cfg(feature = "ory")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Session service error: {operation} failed (status {status:?}): {detail}")]
    SessionService {
        operation: &'static str,
        status: Option<u16>,
        detail: String,
    },
}
