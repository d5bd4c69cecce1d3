//! Pending operations and collected signatures

use super::identifiers::{AccountId, OperationId, ValidatorId};
use super::policy::{OperationCategory, Wei};
use super::validator::{SignerKind, ValidatorLookup};
use crate::errors::{WardenError, WardenResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// What an operation does once executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Native value transfer
    Transfer,
    /// Arbitrary contract call
    ContractInteraction,
    /// NFT transfer
    NftTransfer,
    /// Token allowance approval
    TokenApproval,
    /// Enroll a new signer
    AddSigner,
    /// Revoke a signer
    RemoveSigner,
    /// Replace the signing policy
    UpdatePolicy,
}

impl OperationKind {
    /// Policy category, or `None` for account governance operations
    pub fn category(&self) -> Option<OperationCategory> {
        match self {
            OperationKind::Transfer => Some(OperationCategory::Transfer),
            OperationKind::ContractInteraction => Some(OperationCategory::ContractInteraction),
            OperationKind::NftTransfer => Some(OperationCategory::NftTransfer),
            OperationKind::TokenApproval => Some(OperationCategory::TokenApproval),
            OperationKind::AddSigner
            | OperationKind::RemoveSigner
            | OperationKind::UpdatePolicy => None,
        }
    }

    /// Stable wire name, also bound into canonical messages
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Transfer => "transfer",
            OperationKind::ContractInteraction => "contract_interaction",
            OperationKind::NftTransfer => "nft_transfer",
            OperationKind::TokenApproval => "token_approval",
            OperationKind::AddSigner => "add_signer",
            OperationKind::RemoveSigner => "remove_signer",
            OperationKind::UpdatePolicy => "update_policy",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The intent signers approve: target, value and call data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationIntent {
    /// Destination address, contract, or governance subject
    pub target: String,
    /// Value moved by the operation
    pub value: Wei,
    /// Kind-specific payload (call data, encoded policy, signer record)
    #[serde(with = "hex::serde")]
    pub data: Vec<u8>,
}

impl OperationIntent {
    /// Intent with empty payload
    pub fn new(target: impl Into<String>, value: impl Into<Wei>) -> Self {
        Self {
            target: target.into(),
            value: value.into(),
            data: Vec::new(),
        }
    }

    /// Attach payload bytes
    pub fn with_data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.data = data.into();
        self
    }
}

/// Signature exactly as submitted, in the back-end's text encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EncodedSignature(String);

impl EncodedSignature {
    /// Wrap an encoded signature
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Borrow the encoded text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EncodedSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One validator's approval of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorSignature {
    /// Signing validator
    pub validator_id: ValidatorId,
    /// Signature over the canonical message
    pub signature: EncodedSignature,
    /// Kind declared at submission
    pub signer_kind: SignerKind,
    /// Submission time (ms since epoch)
    pub signed_at: u64,
}

/// Operation lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationState {
    /// Collecting signatures
    Open,
    /// Quorum reached
    Complete,
    /// TTL elapsed before quorum
    Expired,
    /// Force-rejected or frozen
    Rejected,
}

impl OperationState {
    /// Terminal states never transition again
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OperationState::Open)
    }
}

impl fmt::Display for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationState::Open => "open",
            OperationState::Complete => "complete",
            OperationState::Expired => "expired",
            OperationState::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// Why an operation was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    /// Rejecting validator; `None` when the engine froze the operation
    pub rejected_by: Option<ValidatorId>,
    /// Human readable reason
    pub reason: String,
    /// Rejection time (ms since epoch)
    pub rejected_at: u64,
}

/// An operation awaiting quorum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOperation {
    /// Operation identifier
    pub id: OperationId,
    /// Owning account
    pub account_id: AccountId,
    /// Operation kind
    pub kind: OperationKind,
    /// Intent being approved
    pub intent: OperationIntent,
    /// Per-operation nonce bound into the canonical message
    #[serde(with = "hex::serde")]
    pub nonce: [u8; 32],
    /// Distinct active signatures needed
    pub required_signatures: u32,
    /// Signatures in submission order, one per validator
    pub collected_signatures: Vec<ValidatorSignature>,
    /// Creation time, also the canonical message's issuance time (ms)
    pub created_at: u64,
    /// Expiry (ms); submissions after this instant fail
    pub expires_at: u64,
    /// Lifecycle state
    pub state: OperationState,
    /// Time quorum was reached (ms)
    pub completed_at: Option<u64>,
    /// Maturation delay applied after completion (seconds)
    pub maturation_delay_secs: Option<u64>,
    /// Rejection details when `state == Rejected`
    pub rejection: Option<Rejection>,
    /// Optimistic concurrency version, bumped on every persisted change
    pub version: u64,
}

impl PendingOperation {
    /// Insert or replace the entry for `signature.validator_id`.
    ///
    /// A replacement moves the entry to the end so order keeps matching
    /// submission order. Returns `true` when the validator had no prior entry.
    pub fn upsert_signature(&mut self, signature: ValidatorSignature) -> bool {
        let previous = self
            .collected_signatures
            .iter()
            .position(|existing| existing.validator_id == signature.validator_id);
        if let Some(index) = previous {
            self.collected_signatures.remove(index);
        }
        self.collected_signatures.push(signature);
        previous.is_none()
    }

    /// Entry submitted by a validator, if any
    pub fn signature_from(&self, validator_id: &ValidatorId) -> Option<&ValidatorSignature> {
        self.collected_signatures
            .iter()
            .find(|sig| &sig.validator_id == validator_id)
    }

    /// Distinct validators whose entries count toward quorum right now.
    ///
    /// Entries from revoked or unknown validators are discounted but stay in
    /// `collected_signatures` for audit.
    pub fn counted_signers<L: ValidatorLookup + ?Sized>(
        &self,
        lookup: &L,
    ) -> BTreeSet<ValidatorId> {
        self.collected_signatures
            .iter()
            .filter(|sig| {
                lookup
                    .validator(&sig.validator_id)
                    .map(|v| v.is_active() && v.kind == sig.signer_kind)
                    .unwrap_or(false)
            })
            .map(|sig| sig.validator_id.clone())
            .collect()
    }

    /// Whether quorum is met under the current validator set
    pub fn quorum_met<L: ValidatorLookup + ?Sized>(&self, lookup: &L) -> bool {
        self.counted_signers(lookup).len() as u64 >= u64::from(self.required_signatures)
    }

    /// Whether `now_ms` is past expiry
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms > self.expires_at
    }

    /// Earliest instant execution may be reported allowed, once complete
    pub fn matures_at(&self) -> Option<u64> {
        let completed_at = self.completed_at?;
        let delay_ms = self
            .maturation_delay_secs
            .unwrap_or(0)
            .saturating_mul(1000);
        Some(completed_at.saturating_add(delay_ms))
    }

    /// Move from `Open` to a terminal state.
    pub fn transition(&mut self, to: OperationState) -> WardenResult<()> {
        if self.state.is_terminal() || to == OperationState::Open {
            return Err(WardenError::invalid_transition(self.state, to));
        }
        self.state = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::validator::{PublicMaterial, Validator, ValidatorRole, ValidatorStatus};
    use std::collections::HashMap;

    struct Lookup(HashMap<ValidatorId, Validator>);

    impl ValidatorLookup for Lookup {
        fn validator(&self, id: &ValidatorId) -> Option<&Validator> {
            self.0.get(id)
        }
    }

    fn validator(id: &str, status: ValidatorStatus) -> Validator {
        let mut v = Validator::new(
            id,
            SignerKind::CredentialBound,
            id,
            PublicMaterial::new(vec![1; 32]),
            ValidatorRole::Additional,
            0,
        );
        v.status = status;
        v
    }

    fn signature(id: &str, at: u64) -> ValidatorSignature {
        ValidatorSignature {
            validator_id: ValidatorId::new(id),
            signature: EncodedSignature::new(format!("sig-{id}-{at}")),
            signer_kind: SignerKind::CredentialBound,
            signed_at: at,
        }
    }

    fn operation() -> PendingOperation {
        PendingOperation {
            id: OperationId::from_entropy([1; 16]),
            account_id: AccountId::new("acct"),
            kind: OperationKind::Transfer,
            intent: OperationIntent::new("0xdest", 10u128),
            nonce: [0; 32],
            required_signatures: 2,
            collected_signatures: Vec::new(),
            created_at: 1_000,
            expires_at: 2_000,
            state: OperationState::Open,
            completed_at: None,
            maturation_delay_secs: None,
            rejection: None,
            version: 0,
        }
    }

    #[test]
    fn upsert_replaces_and_moves_to_end() {
        let mut op = operation();
        assert!(op.upsert_signature(signature("a", 1)));
        assert!(op.upsert_signature(signature("b", 2)));
        assert!(!op.upsert_signature(signature("a", 3)));

        let order: Vec<_> = op
            .collected_signatures
            .iter()
            .map(|s| s.validator_id.as_str().to_string())
            .collect();
        assert_eq!(order, vec!["b", "a"]);
        assert_eq!(op.signature_from(&ValidatorId::new("a")).map(|s| s.signed_at), Some(3));
    }

    #[test]
    fn revoked_entries_are_discounted() {
        let mut op = operation();
        op.upsert_signature(signature("a", 1));
        op.upsert_signature(signature("c", 2));

        let lookup = Lookup(HashMap::from([
            (ValidatorId::new("a"), validator("a", ValidatorStatus::Active)),
            (ValidatorId::new("c"), validator("c", ValidatorStatus::Revoked)),
        ]));

        assert_eq!(op.counted_signers(&lookup).len(), 1);
        assert!(!op.quorum_met(&lookup));
        assert_eq!(op.collected_signatures.len(), 2);
    }

    #[test]
    fn terminal_states_do_not_transition() {
        let mut op = operation();
        op.transition(OperationState::Complete).unwrap();
        assert!(op.transition(OperationState::Rejected).is_err());
        assert!(op.transition(OperationState::Open).is_err());
    }

    #[test]
    fn maturity_adds_delay() {
        let mut op = operation();
        assert_eq!(op.matures_at(), None);
        op.completed_at = Some(5_000);
        op.maturation_delay_secs = Some(60);
        assert_eq!(op.matures_at(), Some(65_000));
    }
}
