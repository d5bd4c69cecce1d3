//! Issuer-attested identity back-end
//!
//! A federated identity validator enrolls an [`IdentityClaim`]: the identity
//! issuer and the on-chain address it vouches for. An assertion is the
//! issuer's Ed25519 signature over `address || 0x00 || message`, so it binds
//! one address to one canonical message. Only issuers registered as trusted
//! are accepted.

use async_trait::async_trait;
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use warden_core::types::{PublicMaterial, ValidatorId};
use warden_core::{WardenError, WardenResult};
use warden_signature::IdentitySigner;

/// Issuer and address pair carried in a validator's public material
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaim {
    /// Identity issuer (e.g. an OAuth provider's identifier)
    pub issuer: String,
    /// Address the issuer vouches for
    pub address: String,
}

impl IdentityClaim {
    /// New claim
    pub fn new(issuer: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            address: address.into(),
        }
    }

    /// Encode as public material (JSON)
    pub fn to_material(&self) -> WardenResult<PublicMaterial> {
        Ok(PublicMaterial::new(serde_json::to_vec(self)?))
    }

    /// Decode from public material
    pub fn from_material(material: &PublicMaterial) -> WardenResult<Self> {
        Ok(serde_json::from_slice(material.as_bytes())?)
    }

    /// Issuer and address with ASCII case folded, the identity two claims
    /// must not share
    pub fn binding_key(&self) -> Vec<u8> {
        let mut key = Vec::with_capacity(self.issuer.len() + 1 + self.address.len());
        key.extend_from_slice(self.issuer.to_ascii_lowercase().as_bytes());
        key.push(0);
        key.extend_from_slice(self.address.to_ascii_lowercase().as_bytes());
        key
    }

    fn bound_payload(&self, message: &[u8]) -> Vec<u8> {
        let mut payload = Vec::with_capacity(self.address.len() + 1 + message.len());
        payload.extend_from_slice(self.address.as_bytes());
        payload.push(0);
        payload.extend_from_slice(message);
        payload
    }
}

#[derive(Default)]
struct IssuerState {
    trusted: HashMap<String, VerifyingKey>,
    issuing_keys: HashMap<String, SigningKey>,
    identities: HashMap<ValidatorId, IdentityClaim>,
}

/// Identity signer verifying issuer attestations
#[derive(Clone, Default)]
pub struct IssuerAttestationHandler {
    state: Arc<RwLock<IssuerState>>,
}

impl std::fmt::Debug for IssuerAttestationHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("IssuerAttestationHandler")
            .field("trusted_issuers", &state.trusted.keys().collect::<Vec<_>>())
            .field("identities", &state.identities.len())
            .finish()
    }
}

impl IssuerAttestationHandler {
    /// Handler trusting no issuer
    pub fn new() -> Self {
        Self::default()
    }

    /// Trust assertions from `issuer` signed by `key`
    pub fn trust_issuer(&self, issuer: impl Into<String>, key: VerifyingKey) {
        self.state.write().trusted.insert(issuer.into(), key);
    }

    /// Stop trusting `issuer`
    pub fn distrust_issuer(&self, issuer: &str) -> bool {
        self.state.write().trusted.remove(issuer).is_some()
    }

    /// Register a local issuer from a 32-byte secret and trust it; this
    /// handler can then produce assertions on the issuer's behalf
    pub fn register_issuer(&self, issuer: impl Into<String>, secret: [u8; 32]) -> VerifyingKey {
        let issuer = issuer.into();
        let signing_key = SigningKey::from_bytes(&secret);
        let verifying_key = signing_key.verifying_key();
        let mut state = self.state.write();
        state.trusted.insert(issuer.clone(), verifying_key);
        state.issuing_keys.insert(issuer, signing_key);
        verifying_key
    }

    /// Link a validator to its claim so `sign` can produce assertions for it
    pub fn link_identity(
        &self,
        validator_id: &ValidatorId,
        claim: IdentityClaim,
    ) -> WardenResult<PublicMaterial> {
        let material = claim.to_material()?;
        self.state.write().identities.insert(validator_id.clone(), claim);
        Ok(material)
    }
}

#[async_trait]
impl IdentitySigner for IssuerAttestationHandler {
    async fn verify(
        &self,
        message: &[u8],
        signature: &[u8],
        public_material: &PublicMaterial,
    ) -> WardenResult<bool> {
        let claim = IdentityClaim::from_material(public_material)?;
        let Some(issuer_key) = self.state.read().trusted.get(&claim.issuer).copied() else {
            tracing::debug!(issuer = %claim.issuer, "assertion from untrusted issuer");
            return Ok(false);
        };
        let Ok(sig_bytes) = <[u8; 64]>::try_from(signature) else {
            return Ok(false);
        };
        let signature = Signature::from_bytes(&sig_bytes);
        Ok(issuer_key
            .verify_strict(&claim.bound_payload(message), &signature)
            .is_ok())
    }

    async fn sign(&self, message: &[u8], identity_ref: &ValidatorId) -> WardenResult<Vec<u8>> {
        let state = self.state.read();
        let claim = state.identities.get(identity_ref).ok_or_else(|| {
            WardenError::crypto(format!("no identity linked for {identity_ref}"))
        })?;
        let issuer = state.issuing_keys.get(&claim.issuer).ok_or_else(|| {
            WardenError::crypto(format!("issuer {} cannot sign locally", claim.issuer))
        })?;
        Ok(issuer
            .sign(&claim.bound_payload(message))
            .to_bytes()
            .to_vec())
    }

    fn binding_key(&self, public_material: &PublicMaterial) -> WardenResult<Vec<u8>> {
        let claim = IdentityClaim::from_material(public_material)?;
        if claim.issuer.is_empty() || claim.address.is_empty() {
            return Err(WardenError::invalid("identity claim needs an issuer and an address"));
        }
        Ok(claim.binding_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn handler_with(
        validator: &ValidatorId,
        address: &str,
    ) -> (IssuerAttestationHandler, PublicMaterial) {
        let handler = IssuerAttestationHandler::new();
        handler.register_issuer("accounts.example", [5; 32]);
        let material = handler
            .link_identity(validator, IdentityClaim::new("accounts.example", address))
            .unwrap();
        (handler, material)
    }

    #[tokio::test]
    async fn assertion_binds_address_and_message() {
        let id = ValidatorId::new("social");
        let (handler, material) = handler_with(&id, "0xaaa");
        let assertion = handler.sign(b"op", &id).await.unwrap();

        assert!(handler.verify(b"op", &assertion, &material).await.unwrap());
        assert!(!handler.verify(b"other", &assertion, &material).await.unwrap());

        let other = IdentityClaim::new("accounts.example", "0xbbb")
            .to_material()
            .unwrap();
        assert!(!handler.verify(b"op", &assertion, &other).await.unwrap());
    }

    #[tokio::test]
    async fn untrusted_issuer_never_verifies() {
        let id = ValidatorId::new("social");
        let (handler, material) = handler_with(&id, "0xaaa");
        let assertion = handler.sign(b"op", &id).await.unwrap();

        assert!(handler.distrust_issuer("accounts.example"));
        assert!(!handler.verify(b"op", &assertion, &material).await.unwrap());
    }

    #[tokio::test]
    async fn garbage_material_is_an_error() {
        let handler = IssuerAttestationHandler::new();
        assert_matches!(
            handler
                .verify(b"op", &[0; 64], &PublicMaterial::new(b"not json".to_vec()))
                .await,
            Err(WardenError::Serialization { .. })
        );
    }

    #[test]
    fn claims_differing_only_in_case_share_a_binding() {
        let handler = IssuerAttestationHandler::new();
        let lower = IdentityClaim::new("accounts.example", "0xabc")
            .to_material()
            .unwrap();
        let upper = IdentityClaim::new("Accounts.Example", "0xABC")
            .to_material()
            .unwrap();
        assert_eq!(
            handler.binding_key(&lower).unwrap(),
            handler.binding_key(&upper).unwrap()
        );

        let empty = IdentityClaim::new("accounts.example", "").to_material().unwrap();
        assert_matches!(handler.binding_key(&empty), Err(WardenError::Invalid { .. }));
        assert!(handler
            .binding_key(&PublicMaterial::new(b"{}".to_vec()))
            .is_err());
    }
}
