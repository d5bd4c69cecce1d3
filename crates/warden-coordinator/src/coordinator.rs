//! Pending operation coordinator
//!
//! Owns the `Open -> {Complete, Expired, Rejected}` state machine. Every
//! transition follows the same discipline:
//!
//! 1. Verify signatures against the canonical message with no lock held
//! 2. Take the per-operation lock (bounded wait)
//! 3. Reload the operation and re-check its state and the validator set
//! 4. Apply the verdict to a copy and write it back with a version check
//!
//! A failed write discards the copy, so storage errors never leave a
//! transition half applied. Expiry is lazy: whichever call first observes
//! `now > expires_at` on an open operation persists the `Expired` state.

use crate::effects::CoordinatorEffects;
use crate::events::{EventBus, OperationEvent, DEFAULT_EVENT_CAPACITY};
use crate::locks::{KeyedGuard, LockTable};
use crate::types::{
    OperationDraft, OperationRequest, OperationStatus, SignatureSubmission, SubmissionOutcome,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use warden_core::types::{
    AccountId, EncodedSignature, OperationId, OperationState, PendingOperation, Rejection,
    SigningPolicy, ValidatorId, ValidatorSignature,
};
use warden_core::{CoordinatorConfig, WardenConfig, WardenError, WardenResult};
use warden_policy::{SigningPolicyEvaluator, ValidatorRegistry};
use warden_signature::{CanonicalMessage, MessagePayload, SignerVerifierRegistry};

/// Stateful core of the engine.
///
/// Holds no operation state of its own; everything is read from and written
/// to the persistence effect. Cloning shares the lock tables and event
/// stream, so clones may serve requests concurrently.
pub struct PendingOperationCoordinator<E: CoordinatorEffects> {
    pub(crate) effects: Arc<E>,
    pub(crate) signers: SignerVerifierRegistry,
    pub(crate) evaluator: SigningPolicyEvaluator,
    pub(crate) config: CoordinatorConfig,
    pub(crate) default_policy: SigningPolicy,
    pub(crate) operation_locks: LockTable<OperationId>,
    pub(crate) account_locks: LockTable<AccountId>,
    pub(crate) events: EventBus,
}

impl<E: CoordinatorEffects> Clone for PendingOperationCoordinator<E> {
    fn clone(&self) -> Self {
        Self {
            effects: Arc::clone(&self.effects),
            signers: self.signers.clone(),
            evaluator: self.evaluator,
            config: self.config.clone(),
            default_policy: self.default_policy.clone(),
            operation_locks: self.operation_locks.clone(),
            account_locks: self.account_locks.clone(),
            events: self.events.clone(),
        }
    }
}

impl<E: CoordinatorEffects> PendingOperationCoordinator<E> {
    /// Create a coordinator.
    ///
    /// `default_policy` applies to accounts with no stored policy. The
    /// signer registry adopts the configured verification timeout.
    pub fn new(
        effects: Arc<E>,
        signers: SignerVerifierRegistry,
        config: CoordinatorConfig,
        default_policy: SigningPolicy,
    ) -> Self {
        let signers = signers.with_verification_timeout(config.verification_timeout());
        Self {
            effects,
            signers,
            evaluator: SigningPolicyEvaluator::new(),
            config,
            default_policy,
            operation_locks: LockTable::new(),
            account_locks: LockTable::new(),
            events: EventBus::new(DEFAULT_EVENT_CAPACITY),
        }
    }

    /// Create a coordinator from loaded configuration
    pub fn from_config(
        config: &WardenConfig,
        effects: Arc<E>,
        signers: SignerVerifierRegistry,
    ) -> Self {
        Self::new(
            effects,
            signers,
            config.coordinator.clone(),
            config.default_policy.clone(),
        )
    }

    /// Get the effect system
    pub fn effect_system(&self) -> &Arc<E> {
        &self.effects
    }

    /// Signer dispatch in use
    pub fn signers(&self) -> &SignerVerifierRegistry {
        &self.signers
    }

    /// Timing configuration
    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Stream of committed transitions
    pub fn subscribe(&self) -> broadcast::Receiver<OperationEvent> {
        self.events.subscribe()
    }

    // =========================================================================
    // CREATION
    // =========================================================================

    /// Fix id, issuance time and nonce for a new operation.
    ///
    /// Evaluates the policy so disallowed kinds fail before anyone signs.
    /// Nothing is persisted; the draft must reach
    /// [`create_operation`](Self::create_operation) within the operation TTL.
    pub async fn prepare_operation(
        &self,
        request: OperationRequest,
    ) -> WardenResult<OperationDraft> {
        let now = self.now_ms().await?;
        let registry = self.load_registry(&request.account_id).await?;
        let policy = self.get_policy(&request.account_id).await?;
        let requirement = self.evaluator.required_signatures(
            request.kind,
            request.intent.value,
            &policy,
            registry.active_count(),
        )?;

        let id = OperationId::from_entropy(self.effects.random_bytes_16().await);
        let nonce = self.effects.random_bytes_32().await;
        let message = CanonicalMessage::build(
            &id,
            &MessagePayload {
                account_id: &request.account_id,
                kind: request.kind,
                intent: &request.intent,
                issued_at_ms: now,
                nonce: &nonce,
            },
        );

        debug!(
            operation = %id,
            account = %request.account_id,
            kind = %request.kind,
            required = requirement.required,
            message = %message.digest_hex(),
            "operation prepared"
        );

        Ok(OperationDraft {
            id,
            account_id: request.account_id,
            kind: request.kind,
            intent: request.intent,
            issued_at: now,
            nonce,
            required_signatures: requirement.required,
            message,
        })
    }

    /// Persist a prepared operation, optionally with the submitter's signature.
    ///
    /// The policy is evaluated again against the current validator set. When
    /// one signature suffices and `inline` carries it, the operation is
    /// created already complete. An invalid inline signature fails the whole
    /// call and nothing is persisted.
    pub async fn create_operation(
        &self,
        draft: OperationDraft,
        inline: Option<SignatureSubmission>,
    ) -> WardenResult<PendingOperation> {
        let now = self.now_ms().await?;
        let expires_at = draft.issued_at.saturating_add(self.config.operation_ttl_ms());
        if now > expires_at {
            return Err(WardenError::OperationExpired {
                operation_id: draft.id.to_string(),
                expired_at_ms: expires_at,
            });
        }

        let account_id = draft.account_id.clone();
        let registry = self.load_registry(&account_id).await?;
        let policy = self.get_policy(&account_id).await?;
        let requirement = self.evaluator.required_signatures(
            draft.kind,
            draft.intent.value,
            &policy,
            registry.active_count(),
        )?;

        let mut operation = PendingOperation {
            id: draft.id,
            account_id: account_id.clone(),
            kind: draft.kind,
            intent: draft.intent,
            nonce: draft.nonce,
            required_signatures: requirement.required,
            collected_signatures: Vec::new(),
            created_at: draft.issued_at,
            expires_at,
            state: OperationState::Open,
            completed_at: None,
            maturation_delay_secs: requirement.maturation_delay_secs,
            rejection: None,
            version: 0,
        };

        let mut counted = 0;
        if let Some(submission) = &inline {
            let message = CanonicalMessage::for_operation(&operation);
            self.verify_submission(&registry, submission, &message).await?;

            operation.upsert_signature(ValidatorSignature {
                validator_id: submission.validator_id.clone(),
                signature: submission.signature.clone(),
                signer_kind: submission.signer_kind,
                signed_at: now,
            });
            counted = operation.counted_signers(&registry).len();
            if operation.quorum_met(&registry) {
                if let Some(reason) = quorum_invariant_violation(&operation, counted) {
                    error!(
                        operation = %operation.id,
                        %reason,
                        "security invariant violated at creation"
                    );
                    return Err(WardenError::security(reason));
                }
                operation.transition(OperationState::Complete)?;
                operation.completed_at = Some(now);
            }
        }

        self.effects
            .save_pending_operation(&account_id, &operation, None)
            .await?;
        self.archive_terminal(&account_id, &operation).await;

        info!(
            operation = %operation.id,
            account = %account_id,
            kind = %operation.kind,
            required = operation.required_signatures,
            state = %operation.state,
            "operation created"
        );
        self.events.publish(OperationEvent::Created {
            account_id: account_id.clone(),
            operation_id: operation.id,
            required_signatures: operation.required_signatures,
        });

        if let Some(submission) = inline {
            self.record_validator_use(&account_id, &submission.validator_id, now)
                .await;
            self.events.publish(OperationEvent::SignatureAccepted {
                account_id: account_id.clone(),
                operation_id: operation.id,
                validator_id: submission.validator_id,
                counted: counted as u32,
                required: operation.required_signatures,
            });
        }
        if operation.state == OperationState::Complete {
            self.publish_completed(&operation, now);
        }

        Ok(operation)
    }

    // =========================================================================
    // SIGNATURES
    // =========================================================================

    /// Record one validator's signature.
    ///
    /// A valid signature on a complete operation succeeds without changing
    /// anything. A failed verification changes nothing.
    pub async fn submit_signature(
        &self,
        account_id: &AccountId,
        operation_id: &OperationId,
        submission: SignatureSubmission,
    ) -> WardenResult<SubmissionOutcome> {
        let now = self.now_ms().await?;
        let mut operation = self.load_operation(account_id, operation_id).await?;
        if operation.state == OperationState::Open && operation.is_expired_at(now) {
            operation = self.expire_if_due(account_id, operation_id, now).await?;
        }
        if matches!(
            operation.state,
            OperationState::Expired | OperationState::Rejected
        ) {
            return Err(closed_error(&operation));
        }

        let registry = self.load_registry(account_id).await?;
        let message = CanonicalMessage::for_operation(&operation);
        self.verify_submission(&registry, &submission, &message).await?;

        if operation.state == OperationState::Complete {
            debug!(
                operation = %operation_id,
                validator = %submission.validator_id,
                "valid signature for complete operation ignored"
            );
            let counted = operation.counted_signers(&registry).len();
            return Ok(SubmissionOutcome::of(&operation, counted, false));
        }

        self.apply_signature(account_id, operation_id, submission)
            .await
    }

    async fn verify_submission(
        &self,
        registry: &ValidatorRegistry,
        submission: &SignatureSubmission,
        message: &CanonicalMessage,
    ) -> WardenResult<()> {
        self.signers.backend_for(submission.signer_kind)?;
        if registry
            .get(&submission.validator_id)
            .is_some_and(|v| !v.is_active())
        {
            return Err(WardenError::validator_not_active(&submission.validator_id));
        }

        let valid = self
            .signers
            .verify_signature(
                registry,
                &submission.validator_id,
                &submission.signature,
                submission.signer_kind,
                message,
            )
            .await?;
        if !valid {
            warn!(
                validator = %submission.validator_id,
                kind = %submission.signer_kind,
                message = %message.digest_hex(),
                "signature failed verification"
            );
            return Err(WardenError::invalid_signature(&submission.validator_id));
        }
        Ok(())
    }

    async fn apply_signature(
        &self,
        account_id: &AccountId,
        operation_id: &OperationId,
        submission: SignatureSubmission,
    ) -> WardenResult<SubmissionOutcome> {
        let guard = self.lock_operation(operation_id).await?;
        let now = self.now_ms().await?;
        let current = self.load_operation(account_id, operation_id).await?;
        match current.state {
            OperationState::Open if current.is_expired_at(now) => {
                let expired = self.expire_locked(account_id, &current, now).await?;
                return Err(closed_error(&expired));
            }
            OperationState::Open => {}
            OperationState::Complete => {
                let registry = self.load_registry(account_id).await?;
                let counted = current.counted_signers(&registry).len();
                return Ok(SubmissionOutcome::of(&current, counted, false));
            }
            OperationState::Expired | OperationState::Rejected => {
                return Err(closed_error(&current));
            }
        }

        // The validator set may have changed while verification ran.
        let registry = self.load_registry(account_id).await?;
        let Some(validator) = registry.get(&submission.validator_id) else {
            return Err(WardenError::invalid_signature(&submission.validator_id));
        };
        if !validator.is_active() {
            return Err(WardenError::validator_not_active(&submission.validator_id));
        }
        if validator.kind != submission.signer_kind {
            return Err(WardenError::invalid_signature(&submission.validator_id));
        }

        let validator_id = submission.validator_id.clone();
        let mut next = current.clone();
        let newly_added = next.upsert_signature(ValidatorSignature {
            validator_id: submission.validator_id,
            signature: submission.signature,
            signer_kind: submission.signer_kind,
            signed_at: now,
        });
        let counted = next.counted_signers(&registry).len();

        if next.quorum_met(&registry) {
            if let Some(reason) = quorum_invariant_violation(&next, counted) {
                return Err(self.freeze(account_id, &current, next, reason, now).await);
            }
            next.transition(OperationState::Complete)?;
            next.completed_at = Some(now);
        }

        let committed = self.commit(account_id, &current, next).await?;
        drop(guard);

        debug!(
            operation = %operation_id,
            validator = %validator_id,
            counted,
            required = committed.required_signatures,
            "signature accepted"
        );
        self.record_validator_use(account_id, &validator_id, now).await;
        self.events.publish(OperationEvent::SignatureAccepted {
            account_id: account_id.clone(),
            operation_id: *operation_id,
            validator_id,
            counted: counted as u32,
            required: committed.required_signatures,
        });
        if committed.state == OperationState::Complete {
            self.publish_completed(&committed, now);
        }

        Ok(SubmissionOutcome::of(&committed, counted, newly_added))
    }

    /// Canonical message of a stored operation
    pub async fn canonical_message(
        &self,
        account_id: &AccountId,
        operation_id: &OperationId,
    ) -> WardenResult<CanonicalMessage> {
        let operation = self.load_operation(account_id, operation_id).await?;
        Ok(CanonicalMessage::for_operation(&operation))
    }

    /// Sign `message` with an active validator's back-end
    pub async fn sign_with_validator(
        &self,
        account_id: &AccountId,
        validator_id: &ValidatorId,
        message: &CanonicalMessage,
    ) -> WardenResult<EncodedSignature> {
        let registry = self.load_registry(account_id).await?;
        let validator = registry
            .get(validator_id)
            .ok_or_else(|| WardenError::validator_not_found(validator_id))?;
        if !validator.is_active() {
            return Err(WardenError::validator_not_active(validator_id));
        }
        self.signers.sign(message, validator).await
    }

    // =========================================================================
    // REJECTION AND EXPIRY
    // =========================================================================

    /// Force-reject an open operation.
    ///
    /// Any active validator of the account may reject. Rejecting an already
    /// rejected operation returns it unchanged.
    pub async fn reject_operation(
        &self,
        account_id: &AccountId,
        operation_id: &OperationId,
        rejected_by: &ValidatorId,
        reason: impl Into<String>,
    ) -> WardenResult<PendingOperation> {
        let reason = reason.into();
        let registry = self.load_registry(account_id).await?;
        let validator = registry
            .get(rejected_by)
            .ok_or_else(|| WardenError::validator_not_found(rejected_by))?;
        if !validator.is_active() {
            return Err(WardenError::validator_not_active(rejected_by));
        }

        let guard = self.lock_operation(operation_id).await?;
        let now = self.now_ms().await?;
        let current = self.load_operation(account_id, operation_id).await?;
        match current.state {
            OperationState::Rejected => return Ok(current),
            OperationState::Open if current.is_expired_at(now) => {
                let expired = self.expire_locked(account_id, &current, now).await?;
                return Err(closed_error(&expired));
            }
            _ => {}
        }

        let mut next = current.clone();
        next.transition(OperationState::Rejected)?;
        next.rejection = Some(Rejection {
            rejected_by: Some(rejected_by.clone()),
            reason: reason.clone(),
            rejected_at: now,
        });
        let committed = self.commit(account_id, &current, next).await?;
        drop(guard);

        info!(
            operation = %operation_id,
            validator = %rejected_by,
            %reason,
            "operation rejected"
        );
        self.events.publish(OperationEvent::Rejected {
            account_id: account_id.clone(),
            operation_id: *operation_id,
            rejected_by: rejected_by.clone(),
            reason,
        });
        Ok(committed)
    }

    /// Expire every open operation past its expiry and archive terminal
    /// leftovers. Returns the ids expired by this pass.
    pub async fn sweep_expired(&self, account_id: &AccountId) -> WardenResult<Vec<OperationId>> {
        let now = self.now_ms().await?;
        let mut expired = Vec::new();
        for operation in self.effects.load_pending_operations(account_id).await? {
            match operation.state {
                OperationState::Open if operation.is_expired_at(now) => {
                    let after = self.expire_if_due(account_id, &operation.id, now).await?;
                    if after.state == OperationState::Expired {
                        expired.push(operation.id);
                    }
                }
                OperationState::Open => {}
                _ => self.archive_terminal(account_id, &operation).await,
            }
        }
        if !expired.is_empty() {
            info!(account = %account_id, count = expired.len(), "expiry sweep finished");
        }
        Ok(expired)
    }

    async fn expire_if_due(
        &self,
        account_id: &AccountId,
        operation_id: &OperationId,
        now: u64,
    ) -> WardenResult<PendingOperation> {
        let _guard = self.lock_operation(operation_id).await?;
        let current = self.load_operation(account_id, operation_id).await?;
        self.expire_locked(account_id, &current, now).await
    }

    /// Caller holds the operation lock.
    async fn expire_locked(
        &self,
        account_id: &AccountId,
        current: &PendingOperation,
        now: u64,
    ) -> WardenResult<PendingOperation> {
        if current.state != OperationState::Open || !current.is_expired_at(now) {
            return Ok(current.clone());
        }
        let mut next = current.clone();
        next.transition(OperationState::Expired)?;
        let committed = self.commit(account_id, current, next).await?;

        info!(
            operation = %current.id,
            account = %account_id,
            expires_at = current.expires_at,
            collected = current.collected_signatures.len(),
            "operation expired"
        );
        self.events.publish(OperationEvent::Expired {
            account_id: account_id.clone(),
            operation_id: current.id,
            expired_at: now,
        });
        Ok(committed)
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Current state of an operation, expiring it first if due
    pub async fn get_operation_status(
        &self,
        account_id: &AccountId,
        operation_id: &OperationId,
    ) -> WardenResult<OperationStatus> {
        let now = self.now_ms().await?;
        let mut operation = self.load_operation(account_id, operation_id).await?;
        if operation.state == OperationState::Open && operation.is_expired_at(now) {
            operation = self.expire_if_due(account_id, operation_id, now).await?;
        }

        let registry = self.load_registry(account_id).await?;
        let counted_signers = operation.counted_signers(&registry).into_iter().collect();
        let executable = executable_at(&operation, &registry, now);
        let matures_at = match operation.state {
            OperationState::Complete => operation.matures_at(),
            _ => None,
        };
        Ok(OperationStatus {
            operation,
            counted_signers,
            executable,
            matures_at,
        })
    }

    /// Open operations of an account, oldest first. Expired ones found along
    /// the way are transitioned and left out.
    pub async fn list_pending_operations(
        &self,
        account_id: &AccountId,
    ) -> WardenResult<Vec<PendingOperation>> {
        let now = self.now_ms().await?;
        let mut open = Vec::new();
        for operation in self.effects.load_pending_operations(account_id).await? {
            if operation.state != OperationState::Open {
                continue;
            }
            if operation.is_expired_at(now) {
                self.expire_if_due(account_id, &operation.id, now).await?;
                continue;
            }
            open.push(operation);
        }
        Ok(open)
    }

    /// Whether a complete operation may execute now.
    ///
    /// Requires the maturation delay (if any) to have elapsed and the
    /// signers counted at completion to still meet quorum.
    pub async fn is_executable(
        &self,
        account_id: &AccountId,
        operation_id: &OperationId,
    ) -> WardenResult<bool> {
        let now = self.now_ms().await?;
        let operation = self.load_operation(account_id, operation_id).await?;
        let registry = self.load_registry(account_id).await?;
        Ok(executable_at(&operation, &registry, now))
    }

    /// Stored policy, or the configured default
    pub async fn get_policy(&self, account_id: &AccountId) -> WardenResult<SigningPolicy> {
        Ok(self
            .effects
            .load_policy(account_id)
            .await?
            .unwrap_or_else(|| self.default_policy.clone()))
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    pub(crate) async fn now_ms(&self) -> WardenResult<u64> {
        Ok(self.effects.physical_time().await?.ts_ms)
    }

    pub(crate) async fn load_registry(
        &self,
        account_id: &AccountId,
    ) -> WardenResult<ValidatorRegistry> {
        ValidatorRegistry::from_validators(self.effects.load_validators(account_id).await?)
    }

    async fn load_operation(
        &self,
        account_id: &AccountId,
        operation_id: &OperationId,
    ) -> WardenResult<PendingOperation> {
        self.effects
            .load_operation(account_id, operation_id)
            .await?
            .ok_or_else(|| WardenError::operation_not_found(operation_id))
    }

    async fn lock_operation(
        &self,
        operation_id: &OperationId,
    ) -> WardenResult<KeyedGuard<OperationId>> {
        self.operation_locks
            .acquire(operation_id, self.config.lock_timeout())
            .await
    }

    pub(crate) async fn lock_account(
        &self,
        account_id: &AccountId,
    ) -> WardenResult<KeyedGuard<AccountId>> {
        self.account_locks
            .acquire(account_id, self.config.lock_timeout())
            .await
    }

    /// Write `next` over `current` with a version check. Caller holds the
    /// operation lock.
    async fn commit(
        &self,
        account_id: &AccountId,
        current: &PendingOperation,
        mut next: PendingOperation,
    ) -> WardenResult<PendingOperation> {
        next.version = current.version.saturating_add(1);
        if let Err(e) = self
            .effects
            .save_pending_operation(account_id, &next, Some(current.version))
            .await
        {
            warn!(
                operation = %current.id,
                from = %current.state,
                to = %next.state,
                error = %e,
                "operation commit failed; transition discarded"
            );
            return Err(e);
        }
        self.archive_terminal(account_id, &next).await;
        Ok(next)
    }

    /// Move `current` to Rejected after a broken quorum invariant. Caller
    /// holds the operation lock.
    async fn freeze(
        &self,
        account_id: &AccountId,
        current: &PendingOperation,
        mut next: PendingOperation,
        reason: String,
        now: u64,
    ) -> WardenError {
        error!(
            operation = %current.id,
            account = %account_id,
            required = current.required_signatures,
            %reason,
            "security invariant violated; freezing operation"
        );
        next.state = OperationState::Rejected;
        next.completed_at = None;
        next.rejection = Some(Rejection {
            rejected_by: None,
            reason: reason.clone(),
            rejected_at: now,
        });
        match self.commit(account_id, current, next).await {
            Ok(_) => self.events.publish(OperationEvent::Frozen {
                account_id: account_id.clone(),
                operation_id: current.id,
                reason: reason.clone(),
            }),
            Err(e) => error!(
                operation = %current.id,
                error = %e,
                "failed to persist frozen operation"
            ),
        }
        WardenError::security(reason)
    }

    async fn archive_terminal(&self, account_id: &AccountId, operation: &PendingOperation) {
        if !operation.state.is_terminal() {
            return;
        }
        if let Err(e) = self
            .effects
            .archive_operation(account_id, &operation.id)
            .await
        {
            warn!(
                operation = %operation.id,
                error = %e,
                "archiving terminal operation failed; the next sweep retries"
            );
        }
    }

    async fn record_validator_use(
        &self,
        account_id: &AccountId,
        validator_id: &ValidatorId,
        now: u64,
    ) {
        let result = async {
            let _guard = self.lock_account(account_id).await?;
            let mut registry = self.load_registry(account_id).await?;
            registry.record_use(validator_id, now)?;
            self.effects
                .save_validators(account_id, registry.as_slice())
                .await
        }
        .await;
        if let Err(e) = result {
            warn!(
                validator = %validator_id,
                error = %e,
                "failed to record validator use"
            );
        }
    }

    fn publish_completed(&self, operation: &PendingOperation, now: u64) {
        info!(
            operation = %operation.id,
            account = %operation.account_id,
            signatures = operation.collected_signatures.len(),
            required = operation.required_signatures,
            matures_at = ?operation.matures_at(),
            "operation complete"
        );
        self.events.publish(OperationEvent::Completed {
            account_id: operation.account_id.clone(),
            operation_id: operation.id,
            completed_at: now,
        });
    }
}

/// Why `operation` must not be reported complete with `counted` signers, if
/// it must not.
fn quorum_invariant_violation(operation: &PendingOperation, counted: usize) -> Option<String> {
    if operation.required_signatures == 0 {
        return Some(format!(
            "operation {} requires zero signatures",
            operation.id
        ));
    }
    if (counted as u64) < u64::from(operation.required_signatures) {
        return Some(format!(
            "operation {} has {counted} distinct active signers, needs {}",
            operation.id, operation.required_signatures
        ));
    }
    None
}

fn executable_at(operation: &PendingOperation, registry: &ValidatorRegistry, now: u64) -> bool {
    if operation.state != OperationState::Complete {
        return false;
    }
    let counted = operation.counted_signers(registry).len();
    if let Some(reason) = quorum_invariant_violation(operation, counted) {
        warn!(operation = %operation.id, %reason, "complete operation no longer meets quorum");
        return false;
    }
    operation
        .matures_at()
        .map(|matures_at| now >= matures_at)
        .unwrap_or(false)
}

fn closed_error(operation: &PendingOperation) -> WardenError {
    match operation.state {
        OperationState::Expired => WardenError::OperationExpired {
            operation_id: operation.id.to_string(),
            expired_at_ms: operation.expires_at,
        },
        _ => WardenError::OperationClosed {
            operation_id: operation.id.to_string(),
            reason: operation
                .rejection
                .as_ref()
                .map(|r| r.reason.clone())
                .unwrap_or_else(|| operation.state.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::types::{AccountId, OperationIntent, OperationKind, Wei};

    fn operation(required: u32) -> PendingOperation {
        PendingOperation {
            id: OperationId::from_entropy([1; 16]),
            account_id: AccountId::new("acct"),
            kind: OperationKind::Transfer,
            intent: OperationIntent::new("0xdest", Wei(1)),
            nonce: [0; 32],
            required_signatures: required,
            collected_signatures: Vec::new(),
            created_at: 0,
            expires_at: 10,
            state: OperationState::Open,
            completed_at: None,
            maturation_delay_secs: None,
            rejection: None,
            version: 0,
        }
    }

    #[test]
    fn zero_required_is_a_violation() {
        assert!(quorum_invariant_violation(&operation(0), 5).is_some());
        assert!(quorum_invariant_violation(&operation(2), 1).is_some());
        assert!(quorum_invariant_violation(&operation(2), 2).is_none());
    }

    #[test]
    fn closed_errors_name_the_state() {
        let mut op = operation(1);
        op.state = OperationState::Expired;
        assert!(matches!(
            closed_error(&op),
            WardenError::OperationExpired { expired_at_ms: 10, .. }
        ));

        op.state = OperationState::Rejected;
        op.rejection = Some(Rejection {
            rejected_by: None,
            reason: "fraud".to_string(),
            rejected_at: 3,
        });
        assert!(matches!(
            closed_error(&op),
            WardenError::OperationClosed { reason, .. } if reason == "fraud"
        ));
    }

    #[test]
    fn open_operations_are_never_executable() {
        let registry = ValidatorRegistry::new();
        assert!(!executable_at(&operation(1), &registry, 100));
    }
}
