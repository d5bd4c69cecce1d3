//! Signer back-end handlers
//!
//! Concrete implementations of the back-end interfaces consumed by
//! `warden-signature`.

pub mod credential;
pub mod identity;

pub use credential::Ed25519CredentialHandler;
pub use identity::{IdentityClaim, IssuerAttestationHandler};
