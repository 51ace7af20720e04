//! FedCM identity provider endpoints for Axum.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use mockfedcm::idp::{IdpConfig, SessionAccountResolver, fedcm_routes};
//!
//! // 1. Configure from environment
//! let config = IdpConfig::from_env()?;
//!
//! // 2. Pick an account resolver (signed-cookie mock accounts here)
//! let resolver = SessionAccountResolver::from_config(&config);
//!
//! // 3. Mount the IdP routes
//! let app = axum::Router::new().merge(fedcm_routes(config, resolver));
//! ```

mod config;
mod cookies;
mod error;
mod extractor;
pub mod gate;
mod routes;
mod state;
mod traits;
mod types;

pub use config::{DeploymentMode, IdpConfig};
pub use error::FedCmError;
pub use gate::{bypass_active, is_fedcm_request};
pub use routes::{fedcm_routes, login_flow_routes, session_service_routes};
pub use traits::{AccountResolver, SessionAccountResolver};
pub use types::{FedCmRoute, TokenRequest, TokenResponse};
