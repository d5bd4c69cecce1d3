//! Builders for test policies

use std::collections::BTreeSet;
use warden_core::types::{OperationCategory, SigningPolicy, Wei};

/// Fluent [`SigningPolicy`] construction.
///
/// Starts from the single-signer policy allowing every category.
#[derive(Debug, Clone)]
pub struct PolicyBuilder {
    policy: SigningPolicy,
}

impl Default for PolicyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyBuilder {
    /// Single signer, everything allowed
    pub fn new() -> Self {
        Self {
            policy: SigningPolicy::single_signer(),
        }
    }

    /// Always require `threshold` signatures
    pub fn multi_sig(mut self, threshold: u32) -> Self {
        self.policy.require_multi_sig = true;
        self.policy.threshold = threshold;
        self
    }

    /// Threshold used on the multi-sig path without forcing it
    pub fn threshold(mut self, threshold: u32) -> Self {
        self.policy.threshold = threshold;
        self
    }

    /// Force multi-sig at or above `cutoff`
    pub fn high_value_at(mut self, cutoff: Wei) -> Self {
        self.policy.high_value_threshold_wei = Some(cutoff);
        self
    }

    /// Maturation delay for high-value operations
    pub fn delay_secs(mut self, seconds: u64) -> Self {
        self.policy.time_delay_seconds = Some(seconds);
        self
    }

    /// Replace the allowed categories
    pub fn allow_only(mut self, categories: impl IntoIterator<Item = OperationCategory>) -> Self {
        self.policy.allowed_operation_kinds = categories.into_iter().collect::<BTreeSet<_>>();
        self
    }

    /// Finish
    pub fn build(self) -> SigningPolicy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_high_value_policy() {
        let policy = PolicyBuilder::new()
            .threshold(2)
            .high_value_at(Wei(100))
            .delay_secs(60)
            .build();
        assert!(!policy.require_multi_sig);
        assert!(policy.is_high_value(Wei(100)));
        assert_eq!(policy.time_delay_seconds, Some(60));
        assert!(policy.allows(OperationCategory::NftTransfer));
    }

    #[test]
    fn allow_only_narrows_categories() {
        let policy = PolicyBuilder::new()
            .allow_only([OperationCategory::Transfer])
            .build();
        assert!(policy.allows(OperationCategory::Transfer));
        assert!(!policy.allows(OperationCategory::TokenApproval));
    }
}
