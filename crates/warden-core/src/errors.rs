//! Unified error system for Warden
//!
//! Every crate in the workspace returns [`WardenError`]. Variants name the
//! concrete failure; [`WardenError::category`] groups them into the recovery
//! classes callers act on (fix input, change intent, retry, or stop).

use serde::{Deserialize, Serialize};

/// Recovery class of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Malformed input. Surfaced verbatim, never retried.
    Validation,
    /// A referenced account, validator or operation does not exist.
    NotFound,
    /// The request conflicts with policy or validator state.
    Policy,
    /// Lock contention or a stale write. Retry the single mutating call.
    Concurrency,
    /// The persistence port is unavailable. Transient.
    Storage,
    /// A security invariant was broken. Fatal for the operation involved.
    Security,
    /// Unexpected internal failure.
    Internal,
}

/// Unified error type for all Warden operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum WardenError {
    /// Invalid input or configuration
    #[error("Invalid: {message}")]
    Invalid {
        /// Error message describing the invalid input
        message: String,
    },

    /// No back-end is configured for the signer kind, or the kind is unknown
    #[error("Unsupported signer kind: {kind}")]
    UnsupportedSignerKind {
        /// Kind as declared by the caller
        kind: String,
    },

    /// A validator with this id is already enrolled
    #[error("Validator already enrolled: {validator_id}")]
    DuplicateValidator {
        /// Conflicting validator id
        validator_id: String,
    },

    /// Revoking the validator would leave the account without an active primary
    #[error("Cannot revoke last active primary validator: {validator_id}")]
    CannotRevokeLastPrimary {
        /// Primary validator id
        validator_id: String,
    },

    /// Unknown validator
    #[error("Validator not found: {validator_id}")]
    ValidatorNotFound {
        /// Missing validator id
        validator_id: String,
    },

    /// The validator exists but is not active
    #[error("Validator not active: {validator_id}")]
    ValidatorNotActive {
        /// Revoked validator id
        validator_id: String,
    },

    /// Operation kind is not in the policy's allowed set
    #[error("Operation kind not permitted by policy: {kind}")]
    OperationNotPermitted {
        /// Rejected operation kind
        kind: String,
    },

    /// Threshold exceeds the number of active validators
    #[error("Threshold {threshold} unreachable with {active} active validators")]
    ThresholdUnreachable {
        /// Requested threshold
        threshold: u32,
        /// Active validator count
        active: u32,
    },

    /// Other policy rule violated
    #[error("Policy violation: {message}")]
    PolicyViolation {
        /// Error message describing the violated rule
        message: String,
    },

    /// Unknown operation
    #[error("Operation not found: {operation_id}")]
    OperationNotFound {
        /// Missing operation id
        operation_id: String,
    },

    /// The operation expired before reaching quorum
    #[error("Operation {operation_id} expired at {expired_at_ms}")]
    OperationExpired {
        /// Expired operation id
        operation_id: String,
        /// Expiry instant in milliseconds since the epoch
        expired_at_ms: u64,
    },

    /// The operation was rejected and accepts no further input
    #[error("Operation {operation_id} is closed: {reason}")]
    OperationClosed {
        /// Closed operation id
        operation_id: String,
        /// Rejection reason
        reason: String,
    },

    /// Signature failed verification
    #[error("Invalid signature from validator {validator_id}")]
    InvalidSignature {
        /// Validator the signature was attributed to
        validator_id: String,
    },

    /// A transition was attempted from a state that does not allow it
    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition {
        /// Current state
        from: String,
        /// Requested state
        to: String,
    },

    /// Lock contention or stale version on write
    #[error("Concurrency conflict: {message}")]
    Concurrency {
        /// Error message describing the conflict
        message: String,
    },

    /// Persistence port unavailable
    #[error("Storage unavailable: {message}")]
    StorageUnavailable {
        /// Error message describing the storage failure
        message: String,
    },

    /// A security invariant was violated; the operation is frozen
    #[error("Security invariant violation: {message}")]
    SecurityInvariantViolation {
        /// Error message describing the broken invariant
        message: String,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message describing the serialization failure
        message: String,
    },

    /// Cryptographic back-end failure
    #[error("Crypto error: {message}")]
    Crypto {
        /// Error message describing the cryptographic failure
        message: String,
    },

    /// Internal system error
    #[error("Internal error: {message}")]
    Internal {
        /// Error message describing the internal error
        message: String,
    },
}

impl WardenError {
    /// Create an invalid input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create an unsupported signer kind error
    pub fn unsupported_signer_kind(kind: impl Into<String>) -> Self {
        Self::UnsupportedSignerKind { kind: kind.into() }
    }

    /// Create a duplicate validator error
    pub fn duplicate_validator(validator_id: impl ToString) -> Self {
        Self::DuplicateValidator {
            validator_id: validator_id.to_string(),
        }
    }

    /// Create a validator not found error
    pub fn validator_not_found(validator_id: impl ToString) -> Self {
        Self::ValidatorNotFound {
            validator_id: validator_id.to_string(),
        }
    }

    /// Create a validator not active error
    pub fn validator_not_active(validator_id: impl ToString) -> Self {
        Self::ValidatorNotActive {
            validator_id: validator_id.to_string(),
        }
    }

    /// Create a policy violation error
    pub fn policy(message: impl Into<String>) -> Self {
        Self::PolicyViolation {
            message: message.into(),
        }
    }

    /// Create an operation not found error
    pub fn operation_not_found(operation_id: impl ToString) -> Self {
        Self::OperationNotFound {
            operation_id: operation_id.to_string(),
        }
    }

    /// Create an invalid signature error
    pub fn invalid_signature(validator_id: impl ToString) -> Self {
        Self::InvalidSignature {
            validator_id: validator_id.to_string(),
        }
    }

    /// Create an invalid state transition error
    pub fn invalid_transition(from: impl ToString, to: impl ToString) -> Self {
        Self::InvalidStateTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Create a concurrency error
    pub fn concurrency(message: impl Into<String>) -> Self {
        Self::Concurrency {
            message: message.into(),
        }
    }

    /// Create a storage unavailable error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::StorageUnavailable {
            message: message.into(),
        }
    }

    /// Create a security invariant violation
    pub fn security(message: impl Into<String>) -> Self {
        Self::SecurityInvariantViolation {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a crypto error
    pub fn crypto(message: impl Into<String>) -> Self {
        Self::Crypto {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Recovery class of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Invalid { .. }
            | Self::UnsupportedSignerKind { .. }
            | Self::InvalidSignature { .. }
            | Self::Serialization { .. } => ErrorCategory::Validation,
            Self::ValidatorNotFound { .. } | Self::OperationNotFound { .. } => {
                ErrorCategory::NotFound
            }
            Self::DuplicateValidator { .. }
            | Self::CannotRevokeLastPrimary { .. }
            | Self::ValidatorNotActive { .. }
            | Self::OperationNotPermitted { .. }
            | Self::ThresholdUnreachable { .. }
            | Self::PolicyViolation { .. }
            | Self::OperationExpired { .. }
            | Self::OperationClosed { .. }
            | Self::InvalidStateTransition { .. } => ErrorCategory::Policy,
            Self::Concurrency { .. } => ErrorCategory::Concurrency,
            Self::StorageUnavailable { .. } => ErrorCategory::Storage,
            Self::SecurityInvariantViolation { .. } => ErrorCategory::Security,
            Self::Crypto { .. } | Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Whether repeating the same call may succeed without changing it.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Concurrency | ErrorCategory::Storage
        )
    }
}

/// Standard Result type for Warden operations
pub type WardenResult<T> = std::result::Result<T, WardenError>;

impl From<serde_json::Error> for WardenError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<std::io::Error> for WardenError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::invalid(err.to_string()),
            _ => Self::internal(err.to_string()),
        }
    }
}
