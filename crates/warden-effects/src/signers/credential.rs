//! Ed25519 credential back-end
//!
//! Stands in for a hardware or biometric authenticator: each validator's
//! credential is an Ed25519 key pair, its public half enrolled as the
//! validator's public material and its secret half held in this handler's
//! keystore under the validator id.

use async_trait::async_trait;
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use warden_core::types::{PublicMaterial, ValidatorId};
use warden_core::{WardenError, WardenResult};
use warden_signature::CredentialVerifier;

/// Ed25519 credential verifier with an in-process keystore
#[derive(Clone, Default)]
pub struct Ed25519CredentialHandler {
    keystore: Arc<RwLock<HashMap<ValidatorId, SigningKey>>>,
}

impl std::fmt::Debug for Ed25519CredentialHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ed25519CredentialHandler")
            .field("credentials", &self.keystore.read().len())
            .finish()
    }
}

impl Ed25519CredentialHandler {
    /// Handler with an empty keystore
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a credential from a 32-byte secret; returns its public material
    pub fn bind_credential(&self, validator_id: &ValidatorId, secret: [u8; 32]) -> PublicMaterial {
        let signing_key = SigningKey::from_bytes(&secret);
        let material = PublicMaterial::new(signing_key.verifying_key().to_bytes().to_vec());
        self.keystore.write().insert(validator_id.clone(), signing_key);
        material
    }

    /// Drop a credential from the keystore
    pub fn unbind_credential(&self, validator_id: &ValidatorId) -> bool {
        self.keystore.write().remove(validator_id).is_some()
    }
}

#[async_trait]
impl CredentialVerifier for Ed25519CredentialHandler {
    async fn verify(
        &self,
        message: &[u8],
        signature: &[u8],
        public_material: &PublicMaterial,
    ) -> WardenResult<bool> {
        let verifying_key = verifying_key(public_material)?;

        let Ok(sig_bytes) = <[u8; 64]>::try_from(signature) else {
            return Ok(false);
        };
        let signature = Signature::from_bytes(&sig_bytes);

        Ok(verifying_key.verify_strict(message, &signature).is_ok())
    }

    async fn sign(&self, message: &[u8], credential_ref: &ValidatorId) -> WardenResult<Vec<u8>> {
        let keystore = self.keystore.read();
        let signing_key = keystore.get(credential_ref).ok_or_else(|| {
            WardenError::crypto(format!("no credential bound for {credential_ref}"))
        })?;
        Ok(signing_key.sign(message).to_bytes().to_vec())
    }

    fn binding_key(&self, public_material: &PublicMaterial) -> WardenResult<Vec<u8>> {
        Ok(verifying_key(public_material)?.to_bytes().to_vec())
    }
}

fn verifying_key(public_material: &PublicMaterial) -> WardenResult<VerifyingKey> {
    let Ok(key_bytes) = <[u8; 32]>::try_from(public_material.as_bytes()) else {
        return Err(WardenError::crypto("Ed25519 public key must be 32 bytes"));
    };
    VerifyingKey::from_bytes(&key_bytes)
        .map_err(|e| WardenError::crypto(format!("Invalid Ed25519 public key: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bound_credential_signs_and_verifies() {
        let handler = Ed25519CredentialHandler::new();
        let id = ValidatorId::new("phone");
        let material = handler.bind_credential(&id, [11; 32]);

        let signature = handler.sign(b"approve", &id).await.unwrap();
        assert_eq!(signature.len(), 64);
        assert!(handler.verify(b"approve", &signature, &material).await.unwrap());
        assert!(!handler.verify(b"approve!", &signature, &material).await.unwrap());
        assert!(!handler.verify(b"approve", &signature[..63], &material).await.unwrap());
    }

    #[tokio::test]
    async fn other_key_does_not_verify() {
        let handler = Ed25519CredentialHandler::new();
        let a = ValidatorId::new("a");
        let b = ValidatorId::new("b");
        handler.bind_credential(&a, [1; 32]);
        let material_b = handler.bind_credential(&b, [2; 32]);

        let signature = handler.sign(b"msg", &a).await.unwrap();
        assert!(!handler.verify(b"msg", &signature, &material_b).await.unwrap());
    }

    #[tokio::test]
    async fn unbound_credential_cannot_sign() {
        let handler = Ed25519CredentialHandler::new();
        let id = ValidatorId::new("gone");
        handler.bind_credential(&id, [3; 32]);
        assert!(handler.unbind_credential(&id));
        assert!(handler.sign(b"msg", &id).await.is_err());
        assert!(handler
            .verify(b"msg", &[0; 64], &PublicMaterial::new(vec![1, 2, 3]))
            .await
            .is_err());
    }

    #[test]
    fn binding_key_is_the_verifying_key() {
        let handler = Ed25519CredentialHandler::new();
        let material = handler.bind_credential(&ValidatorId::new("a"), [4; 32]);
        assert_eq!(handler.binding_key(&material).unwrap(), material.as_bytes());
        assert!(handler
            .binding_key(&PublicMaterial::new(vec![1; 31]))
            .is_err());
    }
}
