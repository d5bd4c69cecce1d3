//! External signer back-end interfaces
//!
//! The engine never implements signature schemes. It talks to two
//! collaborators: a credential verifier for hardware or biometric bound keys,
//! and an identity signer for federated (social login) identities. Handlers
//! for both live in `warden-effects`.

use async_trait::async_trait;
use warden_core::types::{PublicMaterial, ValidatorId};
use warden_core::WardenResult;

/// Credential-bound back-end.
///
/// `public_material` is the bound public key. `sign` is addressed by the
/// validator id, which the back-end maps to its credential handle.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Verify raw signature bytes over `message`
    async fn verify(
        &self,
        message: &[u8],
        signature: &[u8],
        public_material: &PublicMaterial,
    ) -> WardenResult<bool>;

    /// Produce raw signature bytes over `message`
    async fn sign(&self, message: &[u8], credential_ref: &ValidatorId) -> WardenResult<Vec<u8>>;

    /// Canonical key bound by `public_material`.
    ///
    /// Errors when the material is malformed for this back-end. Two
    /// materials with equal binding keys accept the same signatures.
    fn binding_key(&self, public_material: &PublicMaterial) -> WardenResult<Vec<u8>> {
        Ok(public_material.as_bytes().to_vec())
    }
}

/// Federated identity back-end.
///
/// `public_material` is the claimed (issuer, address) pair; verification
/// checks an issuer-backed assertion binding that address to `message`.
#[async_trait]
pub trait IdentitySigner: Send + Sync {
    /// Verify raw assertion bytes over `message`
    async fn verify(
        &self,
        message: &[u8],
        signature: &[u8],
        public_material: &PublicMaterial,
    ) -> WardenResult<bool>;

    /// Produce raw assertion bytes over `message`
    async fn sign(&self, message: &[u8], identity_ref: &ValidatorId) -> WardenResult<Vec<u8>>;

    /// Canonical identity bound by `public_material`, see
    /// [`CredentialVerifier::binding_key`]
    fn binding_key(&self, public_material: &PublicMaterial) -> WardenResult<Vec<u8>> {
        Ok(public_material.as_bytes().to_vec())
    }
}
