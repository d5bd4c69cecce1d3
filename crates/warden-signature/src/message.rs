//! Canonical operation messages
//!
//! Every signer of an operation signs the same byte string, rebuilt here from
//! the operation's stored intent and creation time. The encoding is a fixed
//! sequence of length-prefixed fields behind a domain tag:
//!
//! ```text
//! tag | operation id | account | kind | target | value (u128 BE) | data | issued_at (u64 BE) | nonce
//! ```
//!
//! Binding both `issued_at` and a random 32-byte nonce means two operations
//! with the same target, value and data never share a message, so a signature
//! collected for one cannot be replayed against the other. The signer
//! back-ends are not assumed to provide any replay protection themselves.

use warden_core::hash;
use warden_core::types::{AccountId, OperationId, OperationIntent, OperationKind, PendingOperation};

/// Domain separation tag, bumped whenever the layout changes
pub const MESSAGE_DOMAIN: &[u8] = b"warden.operation.v1";

/// Everything a canonical message commits to besides the operation id.
#[derive(Debug, Clone, Copy)]
pub struct MessagePayload<'a> {
    /// Owning account
    pub account_id: &'a AccountId,
    /// Operation kind
    pub kind: OperationKind,
    /// Target, value and data
    pub intent: &'a OperationIntent,
    /// Issuance time (ms since epoch)
    pub issued_at_ms: u64,
    /// Per-operation nonce
    pub nonce: &'a [u8; 32],
}

impl<'a> MessagePayload<'a> {
    /// Payload of a stored operation. Uses the creation time, never the
    /// current time, so every submitter signs identical bytes.
    pub fn of(operation: &'a PendingOperation) -> Self {
        Self {
            account_id: &operation.account_id,
            kind: operation.kind,
            intent: &operation.intent,
            issued_at_ms: operation.created_at,
            nonce: &operation.nonce,
        }
    }
}

/// Bytes signed by every validator of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalMessage(Vec<u8>);

impl CanonicalMessage {
    /// Build the message for `operation_id` and `payload`. Pure.
    pub fn build(operation_id: &OperationId, payload: &MessagePayload<'_>) -> Self {
        let intent = payload.intent;
        let mut out = Vec::with_capacity(
            128 + intent.target.len() + intent.data.len() + payload.account_id.as_str().len(),
        );
        put_field(&mut out, MESSAGE_DOMAIN);
        put_field(&mut out, operation_id.as_bytes());
        put_field(&mut out, payload.account_id.as_str().as_bytes());
        put_field(&mut out, payload.kind.as_str().as_bytes());
        put_field(&mut out, intent.target.as_bytes());
        put_field(&mut out, &intent.value.get().to_be_bytes());
        put_field(&mut out, &intent.data);
        put_field(&mut out, &payload.issued_at_ms.to_be_bytes());
        put_field(&mut out, payload.nonce);
        Self(out)
    }

    /// Message of a stored operation
    pub fn for_operation(operation: &PendingOperation) -> Self {
        Self::build(&operation.id, &MessagePayload::of(operation))
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Hex SHA-256 of the message, for logs
    pub fn digest_hex(&self) -> String {
        hash::hash_hex(&self.0)
    }
}

impl AsRef<[u8]> for CanonicalMessage {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

fn put_field(out: &mut Vec<u8>, field: &[u8]) {
    // Fields beyond u32::MAX bytes cannot come from a single operation intent.
    out.extend_from_slice(&(field.len() as u32).to_be_bytes());
    out.extend_from_slice(field);
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use warden_core::types::Wei;

    fn build(
        id: [u8; 16],
        intent: &OperationIntent,
        issued_at_ms: u64,
        nonce: [u8; 32],
    ) -> CanonicalMessage {
        let account = AccountId::new("0xwallet");
        CanonicalMessage::build(
            &OperationId::from_entropy(id),
            &MessagePayload {
                account_id: &account,
                kind: OperationKind::Transfer,
                intent,
                issued_at_ms,
                nonce: &nonce,
            },
        )
    }

    #[test]
    fn deterministic_for_fixed_inputs() {
        let intent = OperationIntent::new("0xdest", Wei(5)).with_data(vec![1, 2, 3]);
        assert_eq!(build([1; 16], &intent, 10, [9; 32]), build([1; 16], &intent, 10, [9; 32]));
    }

    #[test]
    fn field_boundaries_are_unambiguous() {
        let a = OperationIntent::new("ab", Wei(0)).with_data(b"c".to_vec());
        let b = OperationIntent::new("a", Wei(0)).with_data(b"bc".to_vec());
        assert_ne!(build([1; 16], &a, 10, [0; 32]), build([1; 16], &b, 10, [0; 32]));
    }

    #[test]
    fn message_starts_with_domain_tag() {
        let message = build([1; 16], &OperationIntent::new("t", Wei(1)), 1, [0; 32]);
        assert_eq!(&message.as_bytes()[4..4 + MESSAGE_DOMAIN.len()], MESSAGE_DOMAIN);
        assert_eq!(message.digest_hex().len(), 64);
    }

    proptest! {
        #[test]
        fn identical_intents_at_different_times_never_collide(
            value in any::<u128>(),
            data in proptest::collection::vec(any::<u8>(), 0..64),
            t1 in any::<u64>(),
            t2 in any::<u64>(),
        ) {
            prop_assume!(t1 != t2);
            let intent = OperationIntent::new("0xdest", Wei(value)).with_data(data);
            prop_assert_ne!(
                build([3; 16], &intent, t1, [7; 32]),
                build([3; 16], &intent, t2, [7; 32])
            );
        }

        #[test]
        fn distinct_nonces_never_collide(n1 in any::<[u8; 32]>(), n2 in any::<[u8; 32]>()) {
            prop_assume!(n1 != n2);
            let intent = OperationIntent::new("0xdest", Wei(1));
            prop_assert_ne!(build([3; 16], &intent, 5, n1), build([3; 16], &intent, 5, n2));
        }
    }
}
