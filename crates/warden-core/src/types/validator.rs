//! Validator (signer) records

use super::identifiers::ValidatorId;
use crate::errors::WardenError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Signer back-end family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SignerKind {
    /// Hardware or biometric bound credential (public key held in `public_material`)
    CredentialBound,
    /// Federated identity assertion (issuer and address held in `public_material`)
    FederatedIdentity,
}

impl SignerKind {
    /// Stable wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            SignerKind::CredentialBound => "credential_bound",
            SignerKind::FederatedIdentity => "federated_identity",
        }
    }
}

impl fmt::Display for SignerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignerKind {
    type Err = WardenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credential_bound" => Ok(SignerKind::CredentialBound),
            "federated_identity" => Ok(SignerKind::FederatedIdentity),
            other => Err(WardenError::unsupported_signer_kind(other)),
        }
    }
}

/// Role of a validator within its account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidatorRole {
    /// The account's primary signer
    Primary,
    /// Any additional signer
    Additional,
}

/// Validator status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidatorStatus {
    /// Validator may sign and counts toward quorum
    Active,
    /// Validator is retained for audit only
    Revoked,
}

/// Kind-specific public material (bound key, or issuer/address claim).
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicMaterial(#[serde(with = "hex::serde")] Vec<u8>);

impl PublicMaterial {
    /// Wrap raw bytes
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Borrow the raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for PublicMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicMaterial({})", hex::encode(&self.0))
    }
}

/// A registered signer capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    /// Unique identifier
    pub id: ValidatorId,
    /// Back-end family
    pub kind: SignerKind,
    /// Human readable label
    pub display_name: String,
    /// Key or identity material interpreted by the back-end
    pub public_material: PublicMaterial,
    /// Primary or additional
    pub role: ValidatorRole,
    /// Active or revoked
    pub status: ValidatorStatus,
    /// Enrollment time (ms since epoch)
    pub created_at: u64,
    /// Last accepted signature (ms since epoch)
    pub last_used_at: Option<u64>,
}

impl Validator {
    /// New active validator.
    pub fn new(
        id: impl Into<ValidatorId>,
        kind: SignerKind,
        display_name: impl Into<String>,
        public_material: PublicMaterial,
        role: ValidatorRole,
        created_at: u64,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            display_name: display_name.into(),
            public_material,
            role,
            status: ValidatorStatus::Active,
            created_at,
            last_used_at: None,
        }
    }

    /// Whether the validator may sign and count toward quorum
    pub fn is_active(&self) -> bool {
        self.status == ValidatorStatus::Active
    }

    /// Whether this is the active primary
    pub fn is_active_primary(&self) -> bool {
        self.is_active() && self.role == ValidatorRole::Primary
    }
}

impl From<String> for ValidatorId {
    fn from(id: String) -> Self {
        ValidatorId::new(id)
    }
}

/// Read access to enrolled validators by id.
pub trait ValidatorLookup {
    /// Resolve a validator, active or revoked
    fn validator(&self, id: &ValidatorId) -> Option<&Validator>;
}
