//! Account signing policy

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

/// Native-unit amount in wei.
///
/// Serialized as a decimal string: the range exceeds what JSON numbers and
/// TOML integers carry losslessly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Wei(pub u128);

impl Wei {
    /// Zero value
    pub const ZERO: Wei = Wei(0);

    /// Raw amount
    pub fn get(&self) -> u128 {
        self.0
    }
}

impl fmt::Display for Wei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u128> for Wei {
    fn from(value: u128) -> Self {
        Self(value)
    }
}

impl Serialize for Wei {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Wei {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse::<u128>()
            .map(Wei)
            .map_err(|e| serde::de::Error::custom(format!("invalid wei amount '{raw}': {e}")))
    }
}

/// Operation categories a policy may allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationCategory {
    /// Native value transfer
    Transfer,
    /// Arbitrary contract call
    ContractInteraction,
    /// NFT transfer
    NftTransfer,
    /// Token allowance approval
    TokenApproval,
    /// Wildcard: every category
    All,
}

impl fmt::Display for OperationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationCategory::Transfer => "transfer",
            OperationCategory::ContractInteraction => "contract_interaction",
            OperationCategory::NftTransfer => "nft_transfer",
            OperationCategory::TokenApproval => "token_approval",
            OperationCategory::All => "all",
        };
        f.write_str(name)
    }
}

/// Account-level signing rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningPolicy {
    /// Always require `threshold` signatures
    pub require_multi_sig: bool,
    /// Signatures required on the multi-sig path (>= 1)
    pub threshold: u32,
    /// Values at or above this force multi-sig
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_value_threshold_wei: Option<Wei>,
    /// Maturation delay after completion for high-value operations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_delay_seconds: Option<u64>,
    /// Permitted operation categories
    pub allowed_operation_kinds: BTreeSet<OperationCategory>,
}

impl SigningPolicy {
    /// Single-signer policy allowing everything.
    pub fn single_signer() -> Self {
        Self {
            require_multi_sig: false,
            threshold: 1,
            high_value_threshold_wei: None,
            time_delay_seconds: None,
            allowed_operation_kinds: BTreeSet::from([OperationCategory::All]),
        }
    }

    /// Whether a category is permitted
    pub fn allows(&self, category: OperationCategory) -> bool {
        self.allowed_operation_kinds.contains(&OperationCategory::All)
            || self.allowed_operation_kinds.contains(&category)
    }

    /// Whether `value` reaches the high-value cutoff
    pub fn is_high_value(&self, value: Wei) -> bool {
        self.high_value_threshold_wei
            .map(|cutoff| value >= cutoff)
            .unwrap_or(false)
    }
}

impl Default for SigningPolicy {
    fn default() -> Self {
        Self::single_signer()
    }
}
