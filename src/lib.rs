#![doc = include_str!("../README.md")]

pub mod accounts;
pub mod assertion;
pub mod error;
pub mod idp;
pub mod manifest;
#[cfg(feature = "ory")]
pub mod ory;
pub mod session;
pub mod session_service;
pub mod token;
pub mod types;
pub mod well_known;

// Re-exports for convenient access
pub use accounts::{Account, AccountsResponse, MockAccountDirectory};
pub use assertion::{AssertionClaims, AssertionIssuer};
pub use error::Error;
pub use idp::{AccountResolver, IdpConfig, SessionAccountResolver, fedcm_routes};
pub use manifest::{Branding, BrandingIcon, ClientMetadata, ManifestDocument};
#[cfg(feature = "ory")]
pub use ory::OryClient;
pub use session::{SessionClaims, SessionCodec};
pub use session_service::{SessionService, SessionServiceResolver};
pub use token::{HmacKey, Signer, VerifiedClaims, Verifier};
pub use types::{AccountId, ClientId, Username};
pub use well_known::WebIdentityDocument;
