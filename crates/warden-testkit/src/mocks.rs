//! Fault-injecting persistence
//!
//! Wraps [`MemoryPersistenceHandler`] with switches that fail selected
//! writes while reads keep working, so tests can observe that a failed
//! commit leaves stored state untouched.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use warden_core::effects::PersistenceEffects;
use warden_core::types::{AccountId, OperationId, PendingOperation, SigningPolicy, Validator};
use warden_core::{WardenError, WardenResult};
use warden_effects::MemoryPersistenceHandler;

/// Persistence whose operation writes and archiving can be made to fail
#[derive(Debug, Clone, Default)]
pub struct FaultyPersistence {
    inner: MemoryPersistenceHandler,
    fail_operation_writes: Arc<AtomicBool>,
    fail_archive: Arc<AtomicBool>,
}

impl FaultyPersistence {
    /// Healthy store
    pub fn new() -> Self {
        Self::default()
    }

    /// Underlying memory store
    pub fn inner(&self) -> &MemoryPersistenceHandler {
        &self.inner
    }

    /// Fail every `save_pending_operation` while set
    pub fn fail_operation_writes(&self, fail: bool) {
        self.fail_operation_writes.store(fail, Ordering::SeqCst);
    }

    /// Fail every `archive_operation` while set
    pub fn fail_archive(&self, fail: bool) {
        self.fail_archive.store(fail, Ordering::SeqCst);
    }

    /// Take the whole store offline
    pub fn set_available(&self, available: bool) {
        self.inner.set_available(available);
    }
}

#[async_trait]
impl PersistenceEffects for FaultyPersistence {
    async fn load_validators(&self, account: &AccountId) -> WardenResult<Vec<Validator>> {
        self.inner.load_validators(account).await
    }

    async fn save_validators(
        &self,
        account: &AccountId,
        validators: &[Validator],
    ) -> WardenResult<()> {
        self.inner.save_validators(account, validators).await
    }

    async fn load_policy(&self, account: &AccountId) -> WardenResult<Option<SigningPolicy>> {
        self.inner.load_policy(account).await
    }

    async fn save_policy(&self, account: &AccountId, policy: &SigningPolicy) -> WardenResult<()> {
        self.inner.save_policy(account, policy).await
    }

    async fn load_pending_operations(
        &self,
        account: &AccountId,
    ) -> WardenResult<Vec<PendingOperation>> {
        self.inner.load_pending_operations(account).await
    }

    async fn load_operation(
        &self,
        account: &AccountId,
        operation_id: &OperationId,
    ) -> WardenResult<Option<PendingOperation>> {
        self.inner.load_operation(account, operation_id).await
    }

    async fn save_pending_operation(
        &self,
        account: &AccountId,
        operation: &PendingOperation,
        expected_version: Option<u64>,
    ) -> WardenResult<()> {
        if self.fail_operation_writes.load(Ordering::SeqCst) {
            return Err(WardenError::storage("injected operation write failure"));
        }
        self.inner
            .save_pending_operation(account, operation, expected_version)
            .await
    }

    async fn archive_operation(
        &self,
        account: &AccountId,
        operation_id: &OperationId,
    ) -> WardenResult<()> {
        if self.fail_archive.load(Ordering::SeqCst) {
            return Err(WardenError::storage("injected archive failure"));
        }
        self.inner.archive_operation(account, operation_id).await
    }
}
