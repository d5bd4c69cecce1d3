//! Signer verifier registry
//!
//! Dispatches verification and signing to the variant matching a signer
//! kind. A kind without a configured back-end is a hard
//! [`WardenError::UnsupportedSignerKind`] error; everything past that point
//! (unknown validator, kind mismatch, malformed encoding, back-end failure or
//! timeout) is a plain `false`.

use crate::backend::{CredentialVerifier, IdentitySigner};
use crate::capability::{
    CredentialBoundSigner, FederatedIdentitySigner, SignerBackend, SignerCapability,
};
use crate::message::CanonicalMessage;
use std::sync::Arc;
use std::time::Duration;
use warden_core::types::{
    EncodedSignature, PublicMaterial, SignerKind, Validator, ValidatorId, ValidatorLookup,
};
use warden_core::{WardenError, WardenResult};

/// Default upper bound on a single back-end verification
pub const DEFAULT_VERIFICATION_TIMEOUT: Duration = Duration::from_secs(2);

/// Per-kind signer dispatch.
#[derive(Clone)]
pub struct SignerVerifierRegistry {
    credential_bound: Option<CredentialBoundSigner>,
    federated_identity: Option<FederatedIdentitySigner>,
    verification_timeout: Duration,
}

impl std::fmt::Debug for SignerVerifierRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignerVerifierRegistry")
            .field("credential_bound", &self.credential_bound.is_some())
            .field("federated_identity", &self.federated_identity.is_some())
            .field("verification_timeout", &self.verification_timeout)
            .finish()
    }
}

impl SignerVerifierRegistry {
    /// Start building a registry with no back-ends
    pub fn builder() -> SignerVerifierRegistryBuilder {
        SignerVerifierRegistryBuilder::default()
    }

    /// Whether a back-end is configured for `kind`
    pub fn supports(&self, kind: SignerKind) -> bool {
        self.backend_for(kind).is_ok()
    }

    /// Configured verification timeout
    pub fn verification_timeout(&self) -> Duration {
        self.verification_timeout
    }

    /// Same back-ends under a different verification timeout
    pub fn with_verification_timeout(mut self, timeout: Duration) -> Self {
        self.verification_timeout = timeout;
        self
    }

    /// Back-end for `kind`.
    pub fn backend_for(&self, kind: SignerKind) -> WardenResult<SignerBackend> {
        let backend = match kind {
            SignerKind::CredentialBound => self
                .credential_bound
                .clone()
                .map(SignerBackend::CredentialBound),
            SignerKind::FederatedIdentity => self
                .federated_identity
                .clone()
                .map(SignerBackend::FederatedIdentity),
        };
        backend.ok_or_else(|| WardenError::unsupported_signer_kind(kind.as_str()))
    }

    /// Verify with the back-end of `kind`, bounded by the verification timeout.
    ///
    /// Errors only when `kind` has no back-end.
    pub async fn verify(
        &self,
        kind: SignerKind,
        message: &CanonicalMessage,
        signature: &EncodedSignature,
        validator: &Validator,
    ) -> WardenResult<bool> {
        let backend = self.backend_for(kind)?;
        match tokio::time::timeout(
            self.verification_timeout,
            backend.verify(message, signature, validator),
        )
        .await
        {
            Ok(valid) => Ok(valid),
            Err(_) => {
                tracing::warn!(
                    validator = %validator.id,
                    kind = %kind,
                    timeout_ms = self.verification_timeout.as_millis() as u64,
                    "signature verification timed out"
                );
                Ok(false)
            }
        }
    }

    /// Sign `message` as `validator` with the back-end of its kind
    pub async fn sign(
        &self,
        message: &CanonicalMessage,
        validator: &Validator,
    ) -> WardenResult<EncodedSignature> {
        let backend = self.backend_for(validator.kind)?;
        backend.sign(message, validator).await
    }

    /// Canonical key behind `public_material` for a validator of `kind`.
    ///
    /// Validators of one kind with equal binding keys accept each other's
    /// signatures. Fails when `kind` has no back-end or the material is
    /// malformed.
    pub fn binding_key(
        &self,
        kind: SignerKind,
        public_material: &PublicMaterial,
    ) -> WardenResult<Vec<u8>> {
        self.backend_for(kind)?.binding_key(public_material)
    }

    /// Verify a submission from `validator_id` declaring `declared_kind`.
    ///
    /// Unknown validators, revoked validators, and a declared kind that
    /// differs from the enrolled one all yield `false` without reaching a
    /// back-end.
    pub async fn verify_signature<L>(
        &self,
        lookup: &L,
        validator_id: &ValidatorId,
        signature: &EncodedSignature,
        declared_kind: SignerKind,
        message: &CanonicalMessage,
    ) -> WardenResult<bool>
    where
        L: ValidatorLookup + Sync + ?Sized,
    {
        self.backend_for(declared_kind)?;

        let Some(validator) = lookup.validator(validator_id) else {
            tracing::debug!(validator = %validator_id, "signature from unknown validator");
            return Ok(false);
        };
        if !validator.is_active() {
            tracing::debug!(validator = %validator_id, "signature from revoked validator");
            return Ok(false);
        }
        if validator.kind != declared_kind {
            tracing::debug!(
                validator = %validator_id,
                declared = %declared_kind,
                enrolled = %validator.kind,
                "declared signer kind does not match enrollment"
            );
            return Ok(false);
        }

        self.verify(declared_kind, message, signature, validator).await
    }
}

/// Builder for [`SignerVerifierRegistry`].
#[derive(Default)]
pub struct SignerVerifierRegistryBuilder {
    credential_bound: Option<CredentialBoundSigner>,
    federated_identity: Option<FederatedIdentitySigner>,
    verification_timeout: Option<Duration>,
}

impl SignerVerifierRegistryBuilder {
    /// Configure the credential-bound back-end
    pub fn with_credential_verifier(mut self, backend: Arc<dyn CredentialVerifier>) -> Self {
        self.credential_bound = Some(CredentialBoundSigner::new(backend));
        self
    }

    /// Configure the federated identity back-end
    pub fn with_identity_signer(mut self, backend: Arc<dyn IdentitySigner>) -> Self {
        self.federated_identity = Some(FederatedIdentitySigner::new(backend));
        self
    }

    /// Bound every back-end verification
    pub fn with_verification_timeout(mut self, timeout: Duration) -> Self {
        self.verification_timeout = Some(timeout);
        self
    }

    /// Finish
    pub fn build(self) -> SignerVerifierRegistry {
        SignerVerifierRegistry {
            credential_bound: self.credential_bound,
            federated_identity: self.federated_identity,
            verification_timeout: self
                .verification_timeout
                .unwrap_or(DEFAULT_VERIFICATION_TIMEOUT),
        }
    }
}
