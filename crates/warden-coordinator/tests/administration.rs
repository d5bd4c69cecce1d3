//! Validator enrollment, revocation and policy updates through the
//! coordinator.

use assert_matches::assert_matches;
use std::time::Duration;
use warden_coordinator::EnrollmentRequest;
use warden_core::types::{OperationState, PublicMaterial, ValidatorStatus};
use warden_core::{ErrorCategory, WardenError};
use warden_effects::IdentityClaim;
use warden_testkit::*;

#[tokio::test]
async fn unreachable_threshold_leaves_policy_unchanged() {
    let h = TestHarness::new();
    h.enroll_credential("a", ValidatorRole::Primary).await;
    h.enroll_credential("b", ValidatorRole::Additional).await;
    let two = PolicyBuilder::new().multi_sig(2).build();
    h.set_policy(two.clone()).await;

    let err = h
        .coordinator
        .update_policy(&h.account, PolicyBuilder::new().multi_sig(3).build())
        .await
        .unwrap_err();
    assert_matches!(err, WardenError::ThresholdUnreachable { threshold: 3, active: 2 });
    assert_eq!(err.category(), ErrorCategory::Policy);
    assert_eq!(h.coordinator.get_policy(&h.account).await.unwrap(), two);
}

#[tokio::test]
async fn malformed_policies_are_invalid() {
    let h = TestHarness::new();
    h.enroll_credential("a", ValidatorRole::Primary).await;

    let err = h
        .coordinator
        .update_policy(&h.account, PolicyBuilder::new().threshold(0).build())
        .await
        .unwrap_err();
    assert_matches!(err, WardenError::Invalid { .. });

    let err = h
        .coordinator
        .update_policy(&h.account, PolicyBuilder::new().allow_only(Vec::new()).build())
        .await
        .unwrap_err();
    assert_matches!(err, WardenError::Invalid { .. });
}

#[tokio::test]
async fn accounts_without_a_stored_policy_use_the_default() {
    let h = TestHarness::new();
    assert_eq!(
        h.coordinator.get_policy(&h.account).await.unwrap(),
        SigningPolicy::single_signer()
    );
}

#[tokio::test]
async fn enrollment_stamps_creation_time_and_orders_validators() {
    let h = TestHarness::new();
    let a = h.enroll_credential("a", ValidatorRole::Primary).await;
    h.advance(Duration::from_secs(5));
    let b = h.enroll_credential("b", ValidatorRole::Additional).await;

    assert_eq!(a.created_at, TEST_EPOCH_MS);
    assert_eq!(b.created_at, TEST_EPOCH_MS + 5_000);
    assert_eq!(a.status, ValidatorStatus::Active);

    let ids: Vec<_> = h
        .coordinator
        .list_active_validators(&h.account)
        .await
        .unwrap()
        .into_iter()
        .map(|v| v.id)
        .collect();
    assert_eq!(ids, vec![ValidatorId::from("a"), ValidatorId::from("b")]);
}

#[tokio::test]
async fn duplicate_and_second_primary_are_refused() {
    let h = TestHarness::new();
    h.enroll_credential("a", ValidatorRole::Primary).await;

    let material = h
        .credentials
        .bind_credential(&ValidatorId::from("b"), secret_from_seed("b"));
    let err = h
        .coordinator
        .enroll_validator(
            &h.account,
            EnrollmentRequest::new(
                "a",
                SignerKind::CredentialBound,
                "dup",
                material.clone(),
                ValidatorRole::Additional,
            ),
        )
        .await
        .unwrap_err();
    assert_matches!(err, WardenError::DuplicateValidator { .. });

    let err = h
        .coordinator
        .enroll_validator(
            &h.account,
            EnrollmentRequest::new(
                "b",
                SignerKind::CredentialBound,
                "second primary",
                material,
                ValidatorRole::Primary,
            ),
        )
        .await
        .unwrap_err();
    assert_matches!(err, WardenError::PolicyViolation { .. });
}

fn credential_request(id: &str, material: PublicMaterial) -> EnrollmentRequest {
    EnrollmentRequest::new(
        id,
        SignerKind::CredentialBound,
        id.to_uppercase(),
        material,
        ValidatorRole::Additional,
    )
}

#[tokio::test]
async fn one_key_cannot_back_two_active_validators() {
    let h = TestHarness::new();
    h.enroll_credential("a", ValidatorRole::Primary).await;
    h.enroll_credential("b", ValidatorRole::Additional).await;
    h.set_policy(PolicyBuilder::new().multi_sig(2).build()).await;

    let shared = h
        .credentials
        .bind_credential(&ValidatorId::from("c"), secret_from_seed("b"));
    let err = h
        .coordinator
        .enroll_validator(&h.account, credential_request("c", shared.clone()))
        .await
        .unwrap_err();
    assert_matches!(err, WardenError::PolicyViolation { .. });
    let active = h.coordinator.list_active_validators(&h.account).await.unwrap();
    assert_eq!(active.len(), 2);

    // b's signature alone still leaves a 2-of-2 pending.
    let op = h.open(OperationKind::Transfer, Wei(1)).await;
    let after_b = h.submit(op.id, "b").await.unwrap();
    assert_eq!(after_b.state, OperationState::Open);
    assert_eq!(after_b.counted_signatures, 1);

    // The key is free again once its holder is revoked.
    h.coordinator
        .revoke_validator(&h.account, &ValidatorId::from("b"), None)
        .await
        .unwrap();
    h.coordinator
        .enroll_validator(&h.account, credential_request("c", shared))
        .await
        .unwrap();
}

#[tokio::test]
async fn identity_claims_are_compared_by_issuer_and_address() {
    let h = TestHarness::new();
    h.enroll_identity("x", "acme", ValidatorRole::Primary).await;

    let twin = h
        .identities
        .link_identity(&ValidatorId::from("y"), IdentityClaim::new("ACME", "X@Acme"))
        .unwrap();
    let err = h
        .coordinator
        .enroll_validator(
            &h.account,
            EnrollmentRequest::new(
                "y",
                SignerKind::FederatedIdentity,
                "Y",
                twin,
                ValidatorRole::Additional,
            ),
        )
        .await
        .unwrap_err();
    assert_matches!(err, WardenError::PolicyViolation { .. });
}

#[tokio::test]
async fn malformed_material_is_refused_at_enrollment() {
    let h = TestHarness::new();
    h.identities.register_issuer("acme", secret_from_seed("acme"));

    let err = h
        .coordinator
        .enroll_validator(
            &h.account,
            credential_request("short", PublicMaterial::new(vec![1; 31])),
        )
        .await
        .unwrap_err();
    assert_matches!(err, WardenError::Invalid { .. });

    let err = h
        .coordinator
        .enroll_validator(
            &h.account,
            EnrollmentRequest::new(
                "garbled",
                SignerKind::FederatedIdentity,
                "GARBLED",
                PublicMaterial::new(b"not json".to_vec()),
                ValidatorRole::Primary,
            ),
        )
        .await
        .unwrap_err();
    assert_matches!(err, WardenError::Invalid { .. });
    assert!(h
        .coordinator
        .list_active_validators(&h.account)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn primary_revocation_needs_a_replacement() {
    let h = TestHarness::new();
    h.enroll_credential("a", ValidatorRole::Primary).await;
    h.enroll_credential("b", ValidatorRole::Additional).await;
    let a = ValidatorId::from("a");
    let b = ValidatorId::from("b");

    let err = h
        .coordinator
        .revoke_validator(&h.account, &a, None)
        .await
        .unwrap_err();
    assert_matches!(err, WardenError::CannotRevokeLastPrimary { .. });

    assert!(h
        .coordinator
        .revoke_validator(&h.account, &a, Some(&b))
        .await
        .unwrap());
    let validators = h.coordinator.list_validators(&h.account).await.unwrap();
    let revoked = validators.iter().find(|v| v.id == a).unwrap();
    let promoted = validators.iter().find(|v| v.id == b).unwrap();
    assert_eq!(revoked.status, ValidatorStatus::Revoked);
    assert_eq!(promoted.role, ValidatorRole::Primary);

    // Idempotent on an already revoked validator.
    assert!(!h
        .coordinator
        .revoke_validator(&h.account, &a, None)
        .await
        .unwrap());
}

#[tokio::test]
async fn promotion_hands_over_the_primary_role() {
    let h = TestHarness::new();
    h.enroll_credential("a", ValidatorRole::Primary).await;
    h.enroll_credential("b", ValidatorRole::Additional).await;

    h.coordinator
        .promote_validator(&h.account, &ValidatorId::from("b"))
        .await
        .unwrap();
    let validators = h.coordinator.list_validators(&h.account).await.unwrap();
    let primaries: Vec<_> = validators
        .iter()
        .filter(|v| v.role == ValidatorRole::Primary)
        .map(|v| v.id.as_str())
        .collect();
    assert_eq!(primaries, vec!["b"]);
}

#[tokio::test]
async fn revocation_discounts_collected_signatures() {
    let h = TestHarness::new();
    for (id, role) in [
        ("a", ValidatorRole::Primary),
        ("b", ValidatorRole::Additional),
        ("c", ValidatorRole::Additional),
        ("d", ValidatorRole::Additional),
    ] {
        h.enroll_credential(id, role).await;
    }
    h.set_policy(PolicyBuilder::new().multi_sig(3).build()).await;
    let op = h.open(OperationKind::Transfer, Wei(1)).await;

    h.submit(op.id, "a").await.unwrap();
    h.submit(op.id, "b").await.unwrap();
    h.coordinator
        .revoke_validator(&h.account, &ValidatorId::from("b"), None)
        .await
        .unwrap();

    let after_c = h.submit(op.id, "c").await.unwrap();
    assert_eq!(after_c.state, OperationState::Open);
    assert_eq!(after_c.collected_signatures, 3);
    assert_eq!(after_c.counted_signatures, 2);

    let done = h.submit(op.id, "d").await.unwrap();
    assert_eq!(done.state, OperationState::Complete);

    let status = h
        .coordinator
        .get_operation_status(&h.account, &op.id)
        .await
        .unwrap();
    assert!(!status.counted_signers.contains(&ValidatorId::from("b")));
    assert_eq!(status.counted_signers.len(), 3);
    // Kept for audit.
    assert!(status
        .operation
        .signature_from(&ValidatorId::from("b"))
        .is_some());
}

#[tokio::test]
async fn accepted_signatures_update_last_use() {
    let h = TestHarness::new();
    h.enroll_credential("a", ValidatorRole::Primary).await;
    h.enroll_credential("b", ValidatorRole::Additional).await;
    h.set_policy(PolicyBuilder::new().multi_sig(2).build()).await;
    let op = h.open(OperationKind::Transfer, Wei(1)).await;

    h.advance(Duration::from_secs(30));
    h.submit(op.id, "a").await.unwrap();

    let validators = h.coordinator.list_validators(&h.account).await.unwrap();
    let a = validators.iter().find(|v| v.id.as_str() == "a").unwrap();
    let b = validators.iter().find(|v| v.id.as_str() == "b").unwrap();
    assert_eq!(a.last_used_at, Some(h.now_ms()));
    assert_eq!(b.last_used_at, None);
}

#[tokio::test]
async fn identity_validators_sign_alongside_credentials() {
    let h = TestHarness::new();
    h.enroll_credential("a", ValidatorRole::Primary).await;
    h.enroll_identity("carol", "https://id.example", ValidatorRole::Additional)
        .await;
    h.set_policy(PolicyBuilder::new().multi_sig(2).build()).await;

    let op = h.open(OperationKind::NftTransfer, Wei(0)).await;
    let carol = h.submission(op.id, "carol").await;
    assert!(carol.signature.as_str().starts_with("0x"));
    h.coordinator
        .submit_signature(&h.account, &op.id, carol)
        .await
        .unwrap();
    let done = h.submit(op.id, "a").await.unwrap();
    assert_eq!(done.state, OperationState::Complete);

    // Assertions from an issuer no longer trusted stop verifying.
    h.identities.distrust_issuer("https://id.example");
    let next = h.open(OperationKind::NftTransfer, Wei(0)).await;
    let err = h.submit(next.id, "carol").await.unwrap_err();
    assert_matches!(err, WardenError::InvalidSignature { .. });
}

#[tokio::test]
async fn shrinking_the_validator_set_clamps_requirements() {
    let h = TestHarness::new();
    h.enroll_credential("a", ValidatorRole::Primary).await;
    h.enroll_credential("b", ValidatorRole::Additional).await;
    h.enroll_credential("c", ValidatorRole::Additional).await;
    h.set_policy(PolicyBuilder::new().multi_sig(3).build()).await;

    h.coordinator
        .revoke_validator(&h.account, &ValidatorId::from("c"), None)
        .await
        .unwrap();
    let op = h.open(OperationKind::Transfer, Wei(1)).await;
    assert_eq!(op.required_signatures, 2);
}
