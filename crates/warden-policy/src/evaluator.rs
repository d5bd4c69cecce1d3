//! Signing policy evaluation
//!
//! Pure decisions over a [`SigningPolicy`]: how many signatures an operation
//! needs, whether a maturation delay applies, and whether a proposed policy
//! can be satisfied by the current validator set.

use serde::{Deserialize, Serialize};
use warden_core::types::{OperationKind, SigningPolicy, Wei};
use warden_core::{WardenError, WardenResult};

/// Outcome of evaluating an operation against a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRequirement {
    /// Distinct active signatures needed
    pub required: u32,
    /// Whether the value reached the high-value cutoff
    pub high_value: bool,
    /// Delay between completion and executability, high-value path only
    pub maturation_delay_secs: Option<u64>,
    /// Whether `required` was lowered to the active validator count
    pub clamped: bool,
}

/// Stateless policy evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct SigningPolicyEvaluator;

impl SigningPolicyEvaluator {
    /// Create an evaluator
    pub fn new() -> Self {
        Self
    }

    /// Required signatures for an operation of `kind` moving `value`.
    ///
    /// Account governance kinds (signer and policy changes) have no category
    /// and are always permitted. The result is clamped to `active_count`;
    /// policy updates already refuse unreachable thresholds, so a clamp here
    /// means the validator set shrank underneath the policy.
    pub fn required_signatures(
        &self,
        kind: OperationKind,
        value: Wei,
        policy: &SigningPolicy,
        active_count: u32,
    ) -> WardenResult<SignatureRequirement> {
        if let Some(category) = kind.category() {
            if !policy.allows(category) {
                return Err(WardenError::OperationNotPermitted {
                    kind: kind.to_string(),
                });
            }
        }
        if active_count == 0 {
            return Err(WardenError::policy("account has no active validators"));
        }

        let high_value = policy.is_high_value(value);
        let wanted = if policy.require_multi_sig || high_value {
            policy.threshold.max(1)
        } else {
            1
        };
        let required = wanted.min(active_count);
        let clamped = required < wanted;
        if clamped {
            tracing::warn!(
                kind = %kind,
                threshold = wanted,
                active = active_count,
                "required signatures clamped to active validator count"
            );
        }

        Ok(SignatureRequirement {
            required,
            high_value,
            maturation_delay_secs: if high_value {
                policy.time_delay_seconds
            } else {
                None
            },
            clamped,
        })
    }

    /// Check a proposed policy against the current active validator count.
    pub fn validate_policy(&self, policy: &SigningPolicy, active_count: u32) -> WardenResult<()> {
        if policy.threshold == 0 {
            return Err(WardenError::invalid("policy threshold must be at least 1"));
        }
        if policy.allowed_operation_kinds.is_empty() {
            return Err(WardenError::invalid(
                "policy must allow at least one operation kind",
            ));
        }
        if policy.threshold > active_count {
            return Err(WardenError::ThresholdUnreachable {
                threshold: policy.threshold,
                active: active_count,
            });
        }
        Ok(())
    }
}
