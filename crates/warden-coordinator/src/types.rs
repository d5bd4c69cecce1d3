//! Request and result types of the coordinator API

use serde::Serialize;
use warden_core::types::{
    AccountId, EncodedSignature, OperationId, OperationIntent, OperationKind, OperationState,
    PendingOperation, PublicMaterial, SignerKind, ValidatorId, ValidatorRole,
};
use warden_signature::CanonicalMessage;

/// What a caller wants approved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRequest {
    /// Owning account
    pub account_id: AccountId,
    /// Operation kind
    pub kind: OperationKind,
    /// Target, value and payload
    pub intent: OperationIntent,
}

impl OperationRequest {
    /// New request
    pub fn new(account_id: AccountId, kind: OperationKind, intent: OperationIntent) -> Self {
        Self {
            account_id,
            kind,
            intent,
        }
    }
}

/// A prepared but not yet persisted operation.
///
/// Fixes the id, issuance time and nonce up front so the submitter can sign
/// the canonical message before the operation is created. Only the
/// coordinator constructs drafts.
#[derive(Debug, Clone)]
pub struct OperationDraft {
    pub(crate) id: OperationId,
    pub(crate) account_id: AccountId,
    pub(crate) kind: OperationKind,
    pub(crate) intent: OperationIntent,
    pub(crate) issued_at: u64,
    pub(crate) nonce: [u8; 32],
    pub(crate) required_signatures: u32,
    pub(crate) message: CanonicalMessage,
}

impl OperationDraft {
    /// Identifier the operation will carry
    pub fn id(&self) -> OperationId {
        self.id
    }

    /// Owning account
    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    /// Operation kind
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Intent being approved
    pub fn intent(&self) -> &OperationIntent {
        &self.intent
    }

    /// Issuance time, which becomes the creation time (ms)
    pub fn issued_at(&self) -> u64 {
        self.issued_at
    }

    /// Required signatures under the policy at preparation time
    pub fn required_signatures(&self) -> u32 {
        self.required_signatures
    }

    /// Message every validator signs
    pub fn message(&self) -> &CanonicalMessage {
        &self.message
    }
}

/// A signature as submitted by a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureSubmission {
    /// Claimed signer
    pub validator_id: ValidatorId,
    /// Encoded signature over the canonical message
    pub signature: EncodedSignature,
    /// Kind the caller declares for the signer
    pub signer_kind: SignerKind,
}

impl SignatureSubmission {
    /// New submission
    pub fn new(
        validator_id: impl Into<ValidatorId>,
        signature: EncodedSignature,
        signer_kind: SignerKind,
    ) -> Self {
        Self {
            validator_id: validator_id.into(),
            signature,
            signer_kind,
        }
    }
}

/// Result of an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionOutcome {
    /// Operation signed
    pub operation_id: OperationId,
    /// State after the submission
    pub state: OperationState,
    /// Entries recorded, including discounted ones
    pub collected_signatures: usize,
    /// Entries counting toward quorum
    pub counted_signatures: usize,
    /// Required distinct signatures
    pub required_signatures: u32,
    /// Whether this validator had no prior entry
    pub newly_added: bool,
}

impl SubmissionOutcome {
    pub(crate) fn of(
        operation: &PendingOperation,
        counted_signatures: usize,
        newly_added: bool,
    ) -> Self {
        Self {
            operation_id: operation.id,
            state: operation.state,
            collected_signatures: operation.collected_signatures.len(),
            counted_signatures,
            required_signatures: operation.required_signatures,
            newly_added,
        }
    }
}

/// Snapshot returned by `get_operation_status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationStatus {
    /// Stored operation
    pub operation: PendingOperation,
    /// Validators counting toward quorum right now
    pub counted_signers: Vec<ValidatorId>,
    /// Whether execution may proceed now
    pub executable: bool,
    /// When a complete operation matures (ms)
    pub matures_at: Option<u64>,
}

/// A validator to enroll; the coordinator stamps `created_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentRequest {
    /// Unique id within the account
    pub id: ValidatorId,
    /// Back-end family
    pub kind: SignerKind,
    /// Label
    pub display_name: String,
    /// Key or identity material
    pub public_material: PublicMaterial,
    /// Primary or additional
    pub role: ValidatorRole,
}

impl EnrollmentRequest {
    /// New enrollment request
    pub fn new(
        id: impl Into<ValidatorId>,
        kind: SignerKind,
        display_name: impl Into<String>,
        public_material: PublicMaterial,
        role: ValidatorRole,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            display_name: display_name.into(),
            public_material,
            role,
        }
    }
}
