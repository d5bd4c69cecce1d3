//! # Warden Signature - Layer 2: Verification
//!
//! Builds the canonical message every validator of an operation signs, and
//! dispatches verification and signing to the external back-end of each
//! signer kind.
//!
//! ## What Belongs Here
//!
//! - Canonical message encoding ([`CanonicalMessage`])
//! - The back-end interfaces the engine consumes ([`CredentialVerifier`], [`IdentitySigner`])
//! - Per-kind text encodings and the closed set of signer variants
//! - [`SignerVerifierRegistry`], the single entry point used by the coordinator
//!
//! ## What Does NOT Belong Here
//!
//! - Concrete signature schemes (`warden-effects` handlers)
//! - Quorum and policy decisions (`warden-policy`, `warden-coordinator`)

#![forbid(unsafe_code)]

pub mod backend;
pub mod capability;
pub mod encoding;
pub mod message;
pub mod registry;

pub use backend::{CredentialVerifier, IdentitySigner};
pub use capability::{
    CredentialBoundSigner, FederatedIdentitySigner, SignerBackend, SignerCapability,
};
pub use encoding::SignatureEncoding;
pub use message::{CanonicalMessage, MessagePayload, MESSAGE_DOMAIN};
pub use registry::{
    SignerVerifierRegistry, SignerVerifierRegistryBuilder, DEFAULT_VERIFICATION_TIMEOUT,
};
