//! Persistence port
//!
//! The engine never owns storage. Every read and write of validators, policy
//! and operations goes through [`PersistenceEffects`]; any call may fail with
//! [`WardenError::StorageUnavailable`](crate::WardenError::StorageUnavailable),
//! which callers treat as blocking and retryable.
//!
//! Operation writes are optimistic: `save_pending_operation` takes the version
//! the caller read and fails with a concurrency error when the stored copy has
//! moved on. That is what keeps two coordinator instances from both declaring
//! the same operation complete.

use crate::errors::WardenResult;
use crate::types::{AccountId, OperationId, PendingOperation, SigningPolicy, Validator};
use async_trait::async_trait;

/// Abstract load/save of account state.
#[async_trait]
pub trait PersistenceEffects: Send + Sync {
    /// All validators of an account, active and revoked
    async fn load_validators(&self, account: &AccountId) -> WardenResult<Vec<Validator>>;

    /// Replace the validator set of an account
    async fn save_validators(&self, account: &AccountId, validators: &[Validator])
        -> WardenResult<()>;

    /// Stored policy, if one was ever saved
    async fn load_policy(&self, account: &AccountId) -> WardenResult<Option<SigningPolicy>>;

    /// Replace the policy of an account
    async fn save_policy(&self, account: &AccountId, policy: &SigningPolicy) -> WardenResult<()>;

    /// Operations not yet archived
    async fn load_pending_operations(&self, account: &AccountId)
        -> WardenResult<Vec<PendingOperation>>;

    /// One operation, pending or archived
    async fn load_operation(
        &self,
        account: &AccountId,
        operation_id: &OperationId,
    ) -> WardenResult<Option<PendingOperation>>;

    /// Insert (`expected_version == None`) or compare-and-swap an operation.
    ///
    /// Inserting an id that exists, or updating with a version that does not
    /// match the stored copy, fails with a concurrency error.
    async fn save_pending_operation(
        &self,
        account: &AccountId,
        operation: &PendingOperation,
        expected_version: Option<u64>,
    ) -> WardenResult<()>;

    /// Move a terminal operation out of the pending set. Idempotent.
    async fn archive_operation(
        &self,
        account: &AccountId,
        operation_id: &OperationId,
    ) -> WardenResult<()>;
}
