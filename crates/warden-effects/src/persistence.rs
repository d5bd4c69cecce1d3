//! In-memory persistence handler
//!
//! Backs the persistence port with process memory. Clones share state, so a
//! test can hold one handle while the coordinator holds another. The
//! availability switch makes every call fail with `StorageUnavailable`,
//! which is how storage outages are exercised.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use warden_core::effects::PersistenceEffects;
use warden_core::types::{AccountId, OperationId, PendingOperation, SigningPolicy, Validator};
use warden_core::{WardenError, WardenResult};

#[derive(Debug, Default)]
struct AccountState {
    validators: Vec<Validator>,
    policy: Option<SigningPolicy>,
    pending: HashMap<OperationId, PendingOperation>,
    archived: HashMap<OperationId, PendingOperation>,
}

/// In-memory persistence for tests and embedding
#[derive(Debug, Clone)]
pub struct MemoryPersistenceHandler {
    accounts: Arc<RwLock<HashMap<AccountId, AccountState>>>,
    available: Arc<AtomicBool>,
}

impl MemoryPersistenceHandler {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            accounts: Arc::new(RwLock::new(HashMap::new())),
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Toggle simulated outage
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Whether calls currently succeed
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// Archived operations of an account
    pub async fn archived_operations(&self, account: &AccountId) -> Vec<PendingOperation> {
        let accounts = self.accounts.read().await;
        accounts
            .get(account)
            .map(|state| state.archived.values().cloned().collect())
            .unwrap_or_default()
    }

    fn check_available(&self) -> WardenResult<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(WardenError::storage("memory store marked unavailable"))
        }
    }
}

impl Default for MemoryPersistenceHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PersistenceEffects for MemoryPersistenceHandler {
    async fn load_validators(&self, account: &AccountId) -> WardenResult<Vec<Validator>> {
        self.check_available()?;
        let accounts = self.accounts.read().await;
        Ok(accounts
            .get(account)
            .map(|state| state.validators.clone())
            .unwrap_or_default())
    }

    async fn save_validators(
        &self,
        account: &AccountId,
        validators: &[Validator],
    ) -> WardenResult<()> {
        self.check_available()?;
        let mut accounts = self.accounts.write().await;
        accounts.entry(account.clone()).or_default().validators = validators.to_vec();
        Ok(())
    }

    async fn load_policy(&self, account: &AccountId) -> WardenResult<Option<SigningPolicy>> {
        self.check_available()?;
        let accounts = self.accounts.read().await;
        Ok(accounts.get(account).and_then(|state| state.policy.clone()))
    }

    async fn save_policy(&self, account: &AccountId, policy: &SigningPolicy) -> WardenResult<()> {
        self.check_available()?;
        let mut accounts = self.accounts.write().await;
        accounts.entry(account.clone()).or_default().policy = Some(policy.clone());
        Ok(())
    }

    async fn load_pending_operations(
        &self,
        account: &AccountId,
    ) -> WardenResult<Vec<PendingOperation>> {
        self.check_available()?;
        let accounts = self.accounts.read().await;
        let mut operations: Vec<_> = accounts
            .get(account)
            .map(|state| state.pending.values().cloned().collect())
            .unwrap_or_default();
        operations.sort_by_key(|op: &PendingOperation| (op.created_at, op.id.uuid()));
        Ok(operations)
    }

    async fn load_operation(
        &self,
        account: &AccountId,
        operation_id: &OperationId,
    ) -> WardenResult<Option<PendingOperation>> {
        self.check_available()?;
        let accounts = self.accounts.read().await;
        Ok(accounts.get(account).and_then(|state| {
            state
                .pending
                .get(operation_id)
                .or_else(|| state.archived.get(operation_id))
                .cloned()
        }))
    }

    async fn save_pending_operation(
        &self,
        account: &AccountId,
        operation: &PendingOperation,
        expected_version: Option<u64>,
    ) -> WardenResult<()> {
        self.check_available()?;
        let mut accounts = self.accounts.write().await;
        let state = accounts.entry(account.clone()).or_default();
        let stored = state
            .pending
            .get(&operation.id)
            .or_else(|| state.archived.get(&operation.id))
            .map(|op| op.version);

        match (stored, expected_version) {
            (None, None) => {}
            (Some(_), None) => {
                return Err(WardenError::concurrency(format!(
                    "operation {} already exists",
                    operation.id
                )));
            }
            (None, Some(_)) => return Err(WardenError::operation_not_found(operation.id)),
            (Some(current), Some(expected)) if current != expected => {
                return Err(WardenError::concurrency(format!(
                    "operation {} is at version {current}, expected {expected}",
                    operation.id
                )));
            }
            (Some(_), Some(_)) => {}
        }

        if state.archived.contains_key(&operation.id) {
            state.archived.insert(operation.id, operation.clone());
        } else {
            state.pending.insert(operation.id, operation.clone());
        }
        Ok(())
    }

    async fn archive_operation(
        &self,
        account: &AccountId,
        operation_id: &OperationId,
    ) -> WardenResult<()> {
        self.check_available()?;
        let mut accounts = self.accounts.write().await;
        if let Some(state) = accounts.get_mut(account) {
            if let Some(operation) = state.pending.remove(operation_id) {
                state.archived.insert(*operation_id, operation);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use warden_core::types::{OperationIntent, OperationKind, OperationState, Wei};

    fn operation(id: u8) -> PendingOperation {
        PendingOperation {
            id: OperationId::from_entropy([id; 16]),
            account_id: AccountId::new("acct"),
            kind: OperationKind::Transfer,
            intent: OperationIntent::new("0xdest", Wei(1)),
            nonce: [id; 32],
            required_signatures: 1,
            collected_signatures: Vec::new(),
            created_at: u64::from(id),
            expires_at: 1_000,
            state: OperationState::Open,
            completed_at: None,
            maturation_delay_secs: None,
            rejection: None,
            version: 0,
        }
    }

    #[tokio::test]
    async fn compare_and_swap() {
        let store = MemoryPersistenceHandler::new();
        let account = AccountId::new("acct");
        let mut op = operation(1);
        store.save_pending_operation(&account, &op, None).await.unwrap();
        assert_matches!(
            store.save_pending_operation(&account, &op, None).await,
            Err(WardenError::Concurrency { .. })
        );

        op.version = 1;
        store
            .save_pending_operation(&account, &op, Some(0))
            .await
            .unwrap();
        assert_matches!(
            store.save_pending_operation(&account, &op, Some(0)).await,
            Err(WardenError::Concurrency { .. })
        );
        let loaded = store.load_operation(&account, &op.id).await.unwrap().unwrap();
        assert_eq!(loaded.version, 1);
    }

    #[tokio::test]
    async fn archive_hides_from_pending_only() {
        let store = MemoryPersistenceHandler::new();
        let account = AccountId::new("acct");
        let op = operation(2);
        store.save_pending_operation(&account, &op, None).await.unwrap();
        store.archive_operation(&account, &op.id).await.unwrap();
        store.archive_operation(&account, &op.id).await.unwrap();

        assert!(store.load_pending_operations(&account).await.unwrap().is_empty());
        assert!(store.load_operation(&account, &op.id).await.unwrap().is_some());
        assert_eq!(store.archived_operations(&account).await.len(), 1);
    }

    #[tokio::test]
    async fn outage_fails_every_call() {
        let store = MemoryPersistenceHandler::new();
        let account = AccountId::new("acct");
        store.set_available(false);
        assert_matches!(
            store.load_validators(&account).await,
            Err(WardenError::StorageUnavailable { .. })
        );
        assert_matches!(
            store.save_policy(&account, &SigningPolicy::default()).await,
            Err(WardenError::StorageUnavailable { .. })
        );
        store.set_available(true);
        assert!(store.load_policy(&account).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn pending_listed_by_creation() {
        let store = MemoryPersistenceHandler::new();
        let account = AccountId::new("acct");
        for id in [3u8, 1, 2] {
            store
                .save_pending_operation(&account, &operation(id), None)
                .await
                .unwrap();
        }
        let created: Vec<_> = store
            .load_pending_operations(&account)
            .await
            .unwrap()
            .iter()
            .map(|op| op.created_at)
            .collect();
        assert_eq!(created, vec![1, 2, 3]);
    }
}
