//! Composed effect system
//!
//! Bundles one handler per effect trait behind `Arc<dyn ...>` so hosts can
//! swap in their own persistence while keeping the stock clock and entropy.

use crate::persistence::MemoryPersistenceHandler;
use crate::random::{OsRandomHandler, SeededRandomHandler};
use crate::time::{SimulatedClockHandler, SystemClockHandler};
use async_trait::async_trait;
use std::sync::Arc;
use warden_core::effects::{
    PersistenceEffects, PhysicalTime, PhysicalTimeEffects, RandomEffects,
};
use warden_core::types::{AccountId, OperationId, PendingOperation, SigningPolicy, Validator};
use warden_core::WardenResult;

/// Start of simulated time used by [`WardenEffectSystem::for_testing`]
pub const TEST_EPOCH_MS: u64 = 1_700_000_000_000;

/// Time, randomness and persistence handlers
#[derive(Clone)]
pub struct WardenEffectSystem {
    time: Arc<dyn PhysicalTimeEffects>,
    random: Arc<dyn RandomEffects>,
    persistence: Arc<dyn PersistenceEffects>,
}

impl std::fmt::Debug for WardenEffectSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WardenEffectSystem").finish_non_exhaustive()
    }
}

impl WardenEffectSystem {
    /// Compose explicit handlers
    pub fn new(
        time: Arc<dyn PhysicalTimeEffects>,
        random: Arc<dyn RandomEffects>,
        persistence: Arc<dyn PersistenceEffects>,
    ) -> Self {
        Self {
            time,
            random,
            persistence,
        }
    }

    /// System clock, OS entropy and in-memory persistence
    pub fn production() -> Self {
        Self::new(
            Arc::new(SystemClockHandler::new()),
            Arc::new(OsRandomHandler::new()),
            Arc::new(MemoryPersistenceHandler::new()),
        )
    }

    /// Simulated clock at [`TEST_EPOCH_MS`], seeded entropy, in-memory persistence
    pub fn for_testing(seed: u64) -> Self {
        Self::new(
            Arc::new(SimulatedClockHandler::new(TEST_EPOCH_MS)),
            Arc::new(SeededRandomHandler::new(seed)),
            Arc::new(MemoryPersistenceHandler::new()),
        )
    }

    /// Replace the clock
    pub fn with_time(mut self, time: Arc<dyn PhysicalTimeEffects>) -> Self {
        self.time = time;
        self
    }

    /// Replace the entropy source
    pub fn with_random(mut self, random: Arc<dyn RandomEffects>) -> Self {
        self.random = random;
        self
    }

    /// Replace persistence
    pub fn with_persistence(mut self, persistence: Arc<dyn PersistenceEffects>) -> Self {
        self.persistence = persistence;
        self
    }
}

#[async_trait]
impl PhysicalTimeEffects for WardenEffectSystem {
    async fn physical_time(&self) -> WardenResult<PhysicalTime> {
        self.time.physical_time().await
    }
}

#[async_trait]
impl RandomEffects for WardenEffectSystem {
    async fn random_bytes_32(&self) -> [u8; 32] {
        self.random.random_bytes_32().await
    }

    async fn random_bytes_16(&self) -> [u8; 16] {
        self.random.random_bytes_16().await
    }
}

#[async_trait]
impl PersistenceEffects for WardenEffectSystem {
    async fn load_validators(&self, account: &AccountId) -> WardenResult<Vec<Validator>> {
        self.persistence.load_validators(account).await
    }

    async fn save_validators(
        &self,
        account: &AccountId,
        validators: &[Validator],
    ) -> WardenResult<()> {
        self.persistence.save_validators(account, validators).await
    }

    async fn load_policy(&self, account: &AccountId) -> WardenResult<Option<SigningPolicy>> {
        self.persistence.load_policy(account).await
    }

    async fn save_policy(&self, account: &AccountId, policy: &SigningPolicy) -> WardenResult<()> {
        self.persistence.save_policy(account, policy).await
    }

    async fn load_pending_operations(
        &self,
        account: &AccountId,
    ) -> WardenResult<Vec<PendingOperation>> {
        self.persistence.load_pending_operations(account).await
    }

    async fn load_operation(
        &self,
        account: &AccountId,
        operation_id: &OperationId,
    ) -> WardenResult<Option<PendingOperation>> {
        self.persistence.load_operation(account, operation_id).await
    }

    async fn save_pending_operation(
        &self,
        account: &AccountId,
        operation: &PendingOperation,
        expected_version: Option<u64>,
    ) -> WardenResult<()> {
        self.persistence
            .save_pending_operation(account, operation, expected_version)
            .await
    }

    async fn archive_operation(
        &self,
        account: &AccountId,
        operation_id: &OperationId,
    ) -> WardenResult<()> {
        self.persistence.archive_operation(account, operation_id).await
    }
}
