//! Property test strategies for Warden types

use proptest::prelude::*;

// Re-export proptest for convenience
pub use proptest;

use warden_core::types::{OperationKind, Wei};

/// Validator count `n` in `1..=max` with a threshold `t` in `1..=n`
pub fn arb_threshold_setup(max: u32) -> impl Strategy<Value = (u32, u32)> {
    (1..=max.max(1)).prop_flat_map(|n| (Just(n), 1..=n))
}

/// A permutation of `0..n`, the order validators sign in
pub fn arb_signing_order(n: u32) -> impl Strategy<Value = Vec<u32>> {
    Just((0..n).collect::<Vec<_>>()).prop_shuffle()
}

/// Amounts clustered around a cutoff so both sides get exercised
pub fn arb_wei_around(cutoff: u128) -> impl Strategy<Value = Wei> {
    prop_oneof![
        Just(Wei(cutoff)),
        (0..cutoff.max(1)).prop_map(Wei),
        (cutoff..cutoff.saturating_mul(4).max(cutoff + 1)).prop_map(Wei),
    ]
}

/// Any operation kind
pub fn arb_operation_kind() -> impl Strategy<Value = OperationKind> {
    prop_oneof![
        Just(OperationKind::Transfer),
        Just(OperationKind::ContractInteraction),
        Just(OperationKind::NftTransfer),
        Just(OperationKind::TokenApproval),
        Just(OperationKind::AddSigner),
        Just(OperationKind::RemoveSigner),
        Just(OperationKind::UpdatePolicy),
    ]
}
