//! Quorum properties over random validator counts, thresholds and signing
//! orders.

use proptest::prelude::*;
use warden_core::types::OperationState;
use warden_testkit::strategies::{arb_signing_order, arb_threshold_setup};
use warden_testkit::*;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
}

fn validator_name(index: u32) -> String {
    format!("v{index}")
}

async fn harness_with(n: u32, t: u32) -> TestHarness {
    let h = TestHarness::new();
    for i in 0..n {
        let role = if i == 0 {
            ValidatorRole::Primary
        } else {
            ValidatorRole::Additional
        };
        h.enroll_credential(&validator_name(i), role).await;
    }
    h.set_policy(PolicyBuilder::new().multi_sig(t).build()).await;
    h
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Complete exactly when the t-th distinct active validator signs.
    #[test]
    fn completes_at_the_threshold(
        (n, t, order) in arb_threshold_setup(5)
            .prop_flat_map(|(n, t)| (Just(n), Just(t), arb_signing_order(n)))
    ) {
        runtime().block_on(async {
            let h = harness_with(n, t).await;
            let op = h.open(OperationKind::Transfer, Wei(1)).await;
            assert_eq!(op.required_signatures, t);

            for (signed, index) in order.iter().enumerate() {
                let outcome = h.submit(op.id, &validator_name(*index)).await.unwrap();
                let expected = if signed as u32 + 1 >= t {
                    OperationState::Complete
                } else {
                    OperationState::Open
                };
                assert_eq!(outcome.state, expected);
                assert!(outcome.collected_signatures <= t as usize);
            }
        });
    }

    /// Signatures from revoked validators never count, whatever the order.
    #[test]
    fn revoked_signatures_never_reach_quorum(
        (n, t) in arb_threshold_setup(5).prop_filter("needs a spare validator", |(n, t)| t < n),
    ) {
        runtime().block_on(async {
            let h = harness_with(n, t).await;
            let op = h.open(OperationKind::Transfer, Wei(1)).await;

            // t - 1 additional validators sign and are then revoked.
            let signers: Vec<_> = (1..n).map(validator_name).collect();
            let take = (t as usize - 1).min(signers.len());
            for name in &signers[..take] {
                h.submit(op.id, name).await.unwrap();
            }
            for name in &signers[..take] {
                h.coordinator
                    .revoke_validator(&h.account, &ValidatorId::from(name.as_str()), None)
                    .await
                    .unwrap();
            }

            let outcome = h.submit(op.id, &validator_name(0)).await.unwrap();
            assert_eq!(outcome.counted_signatures, 1);
            assert_eq!(
                outcome.state == OperationState::Complete,
                op.required_signatures <= 1
            );
        });
    }
}
