//! Account administration: validator set and signing policy
//!
//! Changes are serialized per account. Revoking a validator takes effect on
//! open operations immediately: its recorded signatures stop counting, but
//! operations already complete are not reopened.

use crate::coordinator::PendingOperationCoordinator;
use crate::effects::CoordinatorEffects;
use crate::types::EnrollmentRequest;
use tracing::{info, warn};
use warden_core::types::{AccountId, SigningPolicy, Validator, ValidatorId};
use warden_core::{WardenError, WardenResult};

impl<E: CoordinatorEffects> PendingOperationCoordinator<E> {
    /// Replace the account's signing policy.
    ///
    /// Refuses a threshold the current active validators cannot reach.
    pub async fn update_policy(
        &self,
        account_id: &AccountId,
        policy: SigningPolicy,
    ) -> WardenResult<()> {
        let _guard = self.lock_account(account_id).await?;
        let registry = self.load_registry(account_id).await?;
        self.evaluator
            .validate_policy(&policy, registry.active_count())?;
        self.effects.save_policy(account_id, &policy).await?;

        info!(
            account = %account_id,
            threshold = policy.threshold,
            require_multi_sig = policy.require_multi_sig,
            "signing policy updated"
        );
        Ok(())
    }

    /// Enroll a validator, stamping its creation time.
    ///
    /// The kind's back-end must accept the public material. Material whose
    /// binding key matches an active validator of the same kind is refused.
    pub async fn enroll_validator(
        &self,
        account_id: &AccountId,
        request: EnrollmentRequest,
    ) -> WardenResult<Validator> {
        if !self.signers.supports(request.kind) {
            return Err(WardenError::unsupported_signer_kind(request.kind.as_str()));
        }
        let binding = self
            .signers
            .binding_key(request.kind, &request.public_material)
            .map_err(|e| {
                WardenError::invalid(format!(
                    "public material for validator {} rejected: {e}",
                    request.id
                ))
            })?;

        let _guard = self.lock_account(account_id).await?;
        let now = self.now_ms().await?;
        let mut registry = self.load_registry(account_id).await?;
        let holder = registry.active_holder(request.kind, |existing| {
            match self.signers.binding_key(existing.kind, &existing.public_material) {
                Ok(existing_binding) => existing_binding == binding,
                Err(e) => {
                    warn!(
                        account = %account_id,
                        validator = %existing.id,
                        error = %e,
                        "stored public material has no binding key"
                    );
                    false
                }
            }
        });
        if let Some(holder) = holder {
            return Err(WardenError::policy(format!(
                "public material of {} is already held by active validator {}",
                request.id, holder.id
            )));
        }
        let validator = Validator::new(
            request.id,
            request.kind,
            request.display_name,
            request.public_material,
            request.role,
            now,
        );
        registry.enroll(validator.clone())?;
        self.effects
            .save_validators(account_id, registry.as_slice())
            .await?;

        info!(
            account = %account_id,
            validator = %validator.id,
            kind = %validator.kind,
            active = registry.active_count(),
            "validator enrolled"
        );
        Ok(validator)
    }

    /// Revoke a validator. Returns `false` when it was already revoked.
    ///
    /// Revoking the primary requires a `replacement` that is promoted in the
    /// same step.
    pub async fn revoke_validator(
        &self,
        account_id: &AccountId,
        validator_id: &ValidatorId,
        replacement: Option<&ValidatorId>,
    ) -> WardenResult<bool> {
        let _guard = self.lock_account(account_id).await?;
        let mut registry = self.load_registry(account_id).await?;
        if !registry.revoke(validator_id, replacement)? {
            return Ok(false);
        }
        self.effects
            .save_validators(account_id, registry.as_slice())
            .await?;

        let policy = self.get_policy(account_id).await?;
        let active = registry.active_count();
        if active < policy.threshold {
            warn!(
                account = %account_id,
                threshold = policy.threshold,
                active,
                "active validators below policy threshold; requirements will be clamped"
            );
        }
        info!(
            account = %account_id,
            validator = %validator_id,
            replacement = ?replacement.map(ValidatorId::as_str),
            active,
            "validator revoked"
        );
        Ok(true)
    }

    /// Hand the primary role to an active validator
    pub async fn promote_validator(
        &self,
        account_id: &AccountId,
        validator_id: &ValidatorId,
    ) -> WardenResult<()> {
        let _guard = self.lock_account(account_id).await?;
        let mut registry = self.load_registry(account_id).await?;
        registry.promote_to_primary(validator_id)?;
        self.effects
            .save_validators(account_id, registry.as_slice())
            .await
    }

    /// All validators of the account, revoked ones included, oldest first
    pub async fn list_validators(&self, account_id: &AccountId) -> WardenResult<Vec<Validator>> {
        Ok(self.load_registry(account_id).await?.into_validators())
    }

    /// Active validators of the account, oldest first
    pub async fn list_active_validators(
        &self,
        account_id: &AccountId,
    ) -> WardenResult<Vec<Validator>> {
        let registry = self.load_registry(account_id).await?;
        Ok(registry.list_active().cloned().collect())
    }
}
