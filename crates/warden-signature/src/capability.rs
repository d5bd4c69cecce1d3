//! Signer capability and its two variants
//!
//! The capability is exactly `verify` and `sign`. Each variant owns the text
//! encoding of its kind and wraps one external back-end. Verification never
//! errors: malformed input or a back-end failure yields `false`.

use crate::backend::{CredentialVerifier, IdentitySigner};
use crate::encoding::SignatureEncoding;
use crate::message::CanonicalMessage;
use async_trait::async_trait;
use std::sync::Arc;
use warden_core::types::{EncodedSignature, PublicMaterial, SignerKind, Validator};
use warden_core::WardenResult;

/// Verify/sign capability of one signer kind.
#[async_trait]
pub trait SignerCapability: Send + Sync {
    /// Kind served by this capability
    fn kind(&self) -> SignerKind;

    /// Whether `signature` is `validator`'s signature over `message`
    async fn verify(
        &self,
        message: &CanonicalMessage,
        signature: &EncodedSignature,
        validator: &Validator,
    ) -> bool;

    /// Sign `message` as `validator`
    async fn sign(
        &self,
        message: &CanonicalMessage,
        validator: &Validator,
    ) -> WardenResult<EncodedSignature>;

    /// Canonical key behind `public_material`; fails when it is malformed
    fn binding_key(&self, public_material: &PublicMaterial) -> WardenResult<Vec<u8>>;
}

/// Credential-bound variant (base64 signatures).
#[derive(Clone)]
pub struct CredentialBoundSigner {
    backend: Arc<dyn CredentialVerifier>,
}

impl CredentialBoundSigner {
    /// Wrap a credential verifier
    pub fn new(backend: Arc<dyn CredentialVerifier>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl SignerCapability for CredentialBoundSigner {
    fn kind(&self) -> SignerKind {
        SignerKind::CredentialBound
    }

    async fn verify(
        &self,
        message: &CanonicalMessage,
        signature: &EncodedSignature,
        validator: &Validator,
    ) -> bool {
        let Some(raw) = SignatureEncoding::Base64.decode(signature) else {
            tracing::debug!(validator = %validator.id, "malformed base64 signature");
            return false;
        };
        match self
            .backend
            .verify(message.as_bytes(), &raw, &validator.public_material)
            .await
        {
            Ok(valid) => valid,
            Err(e) => {
                tracing::warn!(validator = %validator.id, error = %e, "credential verifier failed");
                false
            }
        }
    }

    async fn sign(
        &self,
        message: &CanonicalMessage,
        validator: &Validator,
    ) -> WardenResult<EncodedSignature> {
        let raw = self.backend.sign(message.as_bytes(), &validator.id).await?;
        Ok(SignatureEncoding::Base64.encode(&raw))
    }

    fn binding_key(&self, public_material: &PublicMaterial) -> WardenResult<Vec<u8>> {
        self.backend.binding_key(public_material)
    }
}

/// Federated identity variant (`0x` hex signatures).
#[derive(Clone)]
pub struct FederatedIdentitySigner {
    backend: Arc<dyn IdentitySigner>,
}

impl FederatedIdentitySigner {
    /// Wrap an identity signer
    pub fn new(backend: Arc<dyn IdentitySigner>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl SignerCapability for FederatedIdentitySigner {
    fn kind(&self) -> SignerKind {
        SignerKind::FederatedIdentity
    }

    async fn verify(
        &self,
        message: &CanonicalMessage,
        signature: &EncodedSignature,
        validator: &Validator,
    ) -> bool {
        let Some(raw) = SignatureEncoding::PrefixedHex.decode(signature) else {
            tracing::debug!(validator = %validator.id, "malformed hex signature");
            return false;
        };
        match self
            .backend
            .verify(message.as_bytes(), &raw, &validator.public_material)
            .await
        {
            Ok(valid) => valid,
            Err(e) => {
                tracing::warn!(validator = %validator.id, error = %e, "identity verifier failed");
                false
            }
        }
    }

    async fn sign(
        &self,
        message: &CanonicalMessage,
        validator: &Validator,
    ) -> WardenResult<EncodedSignature> {
        let raw = self.backend.sign(message.as_bytes(), &validator.id).await?;
        Ok(SignatureEncoding::PrefixedHex.encode(&raw))
    }

    fn binding_key(&self, public_material: &PublicMaterial) -> WardenResult<Vec<u8>> {
        self.backend.binding_key(public_material)
    }
}

/// Closed set of signer variants.
///
/// Dispatch is a match, not a lookup table: adding a kind forces every call
/// site to handle it.
#[derive(Clone)]
pub enum SignerBackend {
    /// Hardware or biometric bound credential
    CredentialBound(CredentialBoundSigner),
    /// Federated identity assertion
    FederatedIdentity(FederatedIdentitySigner),
}

#[async_trait]
impl SignerCapability for SignerBackend {
    fn kind(&self) -> SignerKind {
        match self {
            SignerBackend::CredentialBound(signer) => signer.kind(),
            SignerBackend::FederatedIdentity(signer) => signer.kind(),
        }
    }

    async fn verify(
        &self,
        message: &CanonicalMessage,
        signature: &EncodedSignature,
        validator: &Validator,
    ) -> bool {
        match self {
            SignerBackend::CredentialBound(signer) => {
                signer.verify(message, signature, validator).await
            }
            SignerBackend::FederatedIdentity(signer) => {
                signer.verify(message, signature, validator).await
            }
        }
    }

    async fn sign(
        &self,
        message: &CanonicalMessage,
        validator: &Validator,
    ) -> WardenResult<EncodedSignature> {
        match self {
            SignerBackend::CredentialBound(signer) => signer.sign(message, validator).await,
            SignerBackend::FederatedIdentity(signer) => signer.sign(message, validator).await,
        }
    }

    fn binding_key(&self, public_material: &PublicMaterial) -> WardenResult<Vec<u8>> {
        match self {
            SignerBackend::CredentialBound(signer) => signer.binding_key(public_material),
            SignerBackend::FederatedIdentity(signer) => signer.binding_key(public_material),
        }
    }
}
