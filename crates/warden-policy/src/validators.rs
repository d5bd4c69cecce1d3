//! Validator registry
//!
//! The enrolled signers of one account. The registry is a plain value: the
//! coordinator loads it from persistence, mutates it under the account lock,
//! and saves it back. Revoked validators stay in the set for audit.
//!
//! Invariant: at most one active validator holds the primary role. Zero is
//! only expected while an account is being provisioned.

use std::iter::FusedIterator;
use warden_core::types::{
    SignerKind, Validator, ValidatorId, ValidatorLookup, ValidatorRole, ValidatorStatus,
};
use warden_core::{WardenError, WardenResult};

/// Enrolled validators of an account, ordered by `created_at`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatorRegistry {
    validators: Vec<Validator>,
}

impl ValidatorRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from a persisted set, checking the registry invariants.
    pub fn from_validators(validators: Vec<Validator>) -> WardenResult<Self> {
        let mut registry = Self::new();
        for validator in validators {
            if registry.contains(&validator.id) {
                return Err(WardenError::duplicate_validator(&validator.id));
            }
            registry.insert_ordered(validator);
        }

        let primaries = registry
            .validators
            .iter()
            .filter(|v| v.is_active_primary())
            .count();
        if primaries > 1 {
            return Err(WardenError::internal(format!(
                "stored validator set has {primaries} active primaries"
            )));
        }
        Ok(registry)
    }

    /// All validators, for persistence
    pub fn into_validators(self) -> Vec<Validator> {
        self.validators
    }

    /// All validators, active and revoked
    pub fn as_slice(&self) -> &[Validator] {
        &self.validators
    }

    /// Number of enrolled validators, active and revoked
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    /// Whether nothing was ever enrolled
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Whether `id` is enrolled, active or revoked
    pub fn contains(&self, id: &ValidatorId) -> bool {
        self.get(id).is_some()
    }

    /// Look up a validator
    pub fn get(&self, id: &ValidatorId) -> Option<&Validator> {
        self.validators.iter().find(|v| &v.id == id)
    }

    fn get_mut(&mut self, id: &ValidatorId) -> Option<&mut Validator> {
        self.validators.iter_mut().find(|v| &v.id == id)
    }

    /// The active primary, if provisioned
    pub fn active_primary(&self) -> Option<&Validator> {
        self.validators.iter().find(|v| v.is_active_primary())
    }

    /// Active validators ordered by `created_at` ascending.
    ///
    /// The iterator borrows the registry and can be cloned to restart.
    pub fn list_active(&self) -> ActiveValidators<'_> {
        ActiveValidators {
            inner: self.validators.iter(),
        }
    }

    /// Number of active validators
    pub fn active_count(&self) -> u32 {
        // A registry never approaches u32::MAX members.
        self.list_active().count() as u32
    }

    /// Active validator of `kind` whose public material satisfies `same_key`
    pub fn active_holder<F>(&self, kind: SignerKind, mut same_key: F) -> Option<&Validator>
    where
        F: FnMut(&Validator) -> bool,
    {
        self.list_active().find(|existing| existing.kind == kind && same_key(existing))
    }

    /// Enroll a new validator.
    ///
    /// Fails with `DuplicateValidator` when the id is taken, and with a policy
    /// violation when enrolling a second active primary; use
    /// [`promote_to_primary`](Self::promote_to_primary) to hand the role over.
    /// An active validator of the same kind already holding identical public
    /// material is also a policy violation: one key would count twice toward
    /// quorum.
    pub fn enroll(&mut self, validator: Validator) -> WardenResult<()> {
        if self.contains(&validator.id) {
            return Err(WardenError::duplicate_validator(&validator.id));
        }
        if validator.status != ValidatorStatus::Active {
            return Err(WardenError::invalid(format!(
                "validator {} must be active when enrolled",
                validator.id
            )));
        }
        if let Some(holder) = self.active_holder(validator.kind, |existing| {
            existing.public_material == validator.public_material
        }) {
            return Err(WardenError::policy(format!(
                "public material of {} is already held by active validator {}",
                validator.id, holder.id
            )));
        }
        if validator.role == ValidatorRole::Primary {
            if let Some(primary) = self.active_primary() {
                return Err(WardenError::policy(format!(
                    "account already has active primary {}; promote instead",
                    primary.id
                )));
            }
        }

        tracing::debug!(
            validator = %validator.id,
            kind = %validator.kind,
            role = ?validator.role,
            "validator enrolled"
        );
        self.insert_ordered(validator);
        Ok(())
    }

    /// Revoke a validator.
    ///
    /// Idempotent: revoking an already revoked validator returns `Ok(false)`.
    /// Revoking the active primary requires `replacement`, an active validator
    /// promoted in the same step.
    pub fn revoke(
        &mut self,
        id: &ValidatorId,
        replacement: Option<&ValidatorId>,
    ) -> WardenResult<bool> {
        let target = self
            .get(id)
            .ok_or_else(|| WardenError::validator_not_found(id))?;
        if !target.is_active() {
            return Ok(false);
        }

        if target.is_active_primary() {
            let Some(replacement) = replacement else {
                return Err(WardenError::CannotRevokeLastPrimary {
                    validator_id: id.to_string(),
                });
            };
            if replacement == id {
                return Err(WardenError::invalid(
                    "a validator cannot replace itself as primary",
                ));
            }
            self.promote_to_primary(replacement)?;
        } else if replacement.is_some() {
            return Err(WardenError::invalid(format!(
                "validator {id} is not the primary; a replacement only applies to the primary"
            )));
        }

        let target = self
            .get_mut(id)
            .ok_or_else(|| WardenError::validator_not_found(id))?;
        target.status = ValidatorStatus::Revoked;
        tracing::info!(validator = %id, "validator revoked");
        Ok(true)
    }

    /// Make `id` the primary, demoting the previous primary.
    pub fn promote_to_primary(&mut self, id: &ValidatorId) -> WardenResult<()> {
        let target = self
            .get(id)
            .ok_or_else(|| WardenError::validator_not_found(id))?;
        if !target.is_active() {
            return Err(WardenError::validator_not_active(id));
        }
        if target.role == ValidatorRole::Primary {
            return Ok(());
        }

        for validator in &mut self.validators {
            if validator.role == ValidatorRole::Primary && validator.is_active() {
                validator.role = ValidatorRole::Additional;
                tracing::debug!(validator = %validator.id, "primary demoted");
            }
            if &validator.id == id {
                validator.role = ValidatorRole::Primary;
            }
        }
        tracing::info!(validator = %id, "validator promoted to primary");
        Ok(())
    }

    /// Record an accepted signature from `id`
    pub fn record_use(&mut self, id: &ValidatorId, at_ms: u64) -> WardenResult<()> {
        let validator = self
            .get_mut(id)
            .ok_or_else(|| WardenError::validator_not_found(id))?;
        validator.last_used_at = Some(at_ms);
        Ok(())
    }

    fn insert_ordered(&mut self, validator: Validator) {
        // Equal timestamps keep enrollment order.
        let index = self
            .validators
            .partition_point(|v| v.created_at <= validator.created_at);
        self.validators.insert(index, validator);
    }
}

impl ValidatorLookup for ValidatorRegistry {
    fn validator(&self, id: &ValidatorId) -> Option<&Validator> {
        self.get(id)
    }
}

/// Iterator over active validators, see [`ValidatorRegistry::list_active`].
#[derive(Debug, Clone)]
pub struct ActiveValidators<'a> {
    inner: std::slice::Iter<'a, Validator>,
}

impl<'a> Iterator for ActiveValidators<'a> {
    type Item = &'a Validator;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.by_ref().find(|v| v.is_active())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.inner.size_hint().1)
    }
}

impl FusedIterator for ActiveValidators<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use warden_core::types::PublicMaterial;

    fn validator(id: &str, role: ValidatorRole, created_at: u64) -> Validator {
        Validator::new(
            id,
            SignerKind::CredentialBound,
            id.to_uppercase(),
            PublicMaterial::new(id.as_bytes().to_vec()),
            role,
            created_at,
        )
    }

    fn registry() -> ValidatorRegistry {
        let mut registry = ValidatorRegistry::new();
        registry
            .enroll(validator("a", ValidatorRole::Primary, 10))
            .unwrap();
        registry
            .enroll(validator("b", ValidatorRole::Additional, 20))
            .unwrap();
        registry
    }

    fn id(raw: &str) -> ValidatorId {
        ValidatorId::new(raw)
    }

    #[test]
    fn duplicate_enrollment_fails() {
        let mut registry = registry();
        assert_matches!(
            registry.enroll(validator("b", ValidatorRole::Additional, 30)),
            Err(WardenError::DuplicateValidator { .. })
        );
    }

    #[test]
    fn shared_material_is_refused_while_the_holder_is_active() {
        let mut registry = registry();
        let mut twin = validator("c", ValidatorRole::Additional, 30);
        twin.public_material = registry.get(&id("b")).unwrap().public_material.clone();
        assert_matches!(
            registry.enroll(twin.clone()),
            Err(WardenError::PolicyViolation { .. })
        );
        assert_eq!(registry.active_count(), 2);

        // Another kind binds the bytes to a different signer.
        let mut other_kind = twin.clone();
        other_kind.kind = SignerKind::FederatedIdentity;
        registry.enroll(other_kind).unwrap();

        // Once the holder is revoked the key may be enrolled again.
        let mut rebind = twin;
        rebind.id = id("d");
        registry.revoke(&id("b"), None).unwrap();
        registry.enroll(rebind).unwrap();
    }

    #[test]
    fn second_primary_is_refused() {
        let mut registry = registry();
        assert_matches!(
            registry.enroll(validator("c", ValidatorRole::Primary, 30)),
            Err(WardenError::PolicyViolation { .. })
        );
    }

    #[test]
    fn revoke_is_idempotent() {
        let mut registry = registry();
        assert!(registry.revoke(&id("b"), None).unwrap());
        assert!(!registry.revoke(&id("b"), None).unwrap());
        assert_eq!(registry.active_count(), 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn primary_needs_replacement() {
        let mut registry = registry();
        assert_matches!(
            registry.revoke(&id("a"), None),
            Err(WardenError::CannotRevokeLastPrimary { .. })
        );
        assert!(registry.get(&id("a")).unwrap().is_active_primary());

        assert!(registry.revoke(&id("a"), Some(&id("b"))).unwrap());
        assert_eq!(registry.active_primary().map(|v| v.id.clone()), Some(id("b")));
        assert!(!registry.get(&id("a")).unwrap().is_active());
    }

    #[test]
    fn revoked_replacement_is_refused() {
        let mut registry = registry();
        registry.revoke(&id("b"), None).unwrap();
        assert_matches!(
            registry.revoke(&id("a"), Some(&id("b"))),
            Err(WardenError::ValidatorNotActive { .. })
        );
        assert!(registry.get(&id("a")).unwrap().is_active_primary());
    }

    #[test]
    fn promotion_demotes_previous_primary() {
        let mut registry = registry();
        registry.promote_to_primary(&id("b")).unwrap();

        let primaries: Vec<_> = registry
            .list_active()
            .filter(|v| v.role == ValidatorRole::Primary)
            .map(|v| v.id.clone())
            .collect();
        assert_eq!(primaries, vec![id("b")]);
        assert_eq!(registry.get(&id("a")).unwrap().role, ValidatorRole::Additional);
    }

    #[test]
    fn list_active_is_ordered_and_restartable() {
        let mut registry = ValidatorRegistry::new();
        registry
            .enroll(validator("late", ValidatorRole::Additional, 300))
            .unwrap();
        registry
            .enroll(validator("early", ValidatorRole::Primary, 100))
            .unwrap();
        registry
            .enroll(validator("mid", ValidatorRole::Additional, 200))
            .unwrap();
        registry.revoke(&id("mid"), None).unwrap();

        let active = registry.list_active();
        let first: Vec<_> = active.clone().map(|v| v.id.as_str()).collect();
        let second: Vec<_> = active.map(|v| v.id.as_str()).collect();
        assert_eq!(first, vec!["early", "late"]);
        assert_eq!(first, second);
    }

    #[test]
    fn persisted_set_round_trips() {
        let registry = registry();
        let stored = registry.clone().into_validators();
        assert_eq!(ValidatorRegistry::from_validators(stored).unwrap(), registry);

        let mut corrupt = registry.into_validators();
        corrupt[1].role = ValidatorRole::Primary;
        assert!(ValidatorRegistry::from_validators(corrupt).is_err());
    }

    #[test]
    fn record_use_sets_last_used() {
        let mut registry = registry();
        registry.record_use(&id("b"), 99).unwrap();
        assert_eq!(registry.get(&id("b")).unwrap().last_used_at, Some(99));
        assert_matches!(
            registry.record_use(&id("zz"), 1),
            Err(WardenError::ValidatorNotFound { .. })
        );
    }
}
