//! Operation lifecycle events
//!
//! Published after each committed transition. Delivery is best-effort: with
//! no subscribers events are dropped, and a slow subscriber observes
//! `RecvError::Lagged` rather than blocking the coordinator.

use serde::Serialize;
use tokio::sync::broadcast;
use warden_core::types::{AccountId, OperationId, ValidatorId};

/// Default broadcast buffer
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// A committed operation transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OperationEvent {
    /// An operation was opened
    Created {
        /// Owning account
        account_id: AccountId,
        /// Operation concerned
        operation_id: OperationId,
        /// Distinct signatures needed
        required_signatures: u32,
    },
    /// A verified signature was recorded
    SignatureAccepted {
        /// Owning account
        account_id: AccountId,
        /// Operation concerned
        operation_id: OperationId,
        /// Signing validator
        validator_id: ValidatorId,
        /// Signatures counting toward quorum
        counted: u32,
        /// Signatures needed
        required: u32,
    },
    /// Quorum was reached
    Completed {
        /// Owning account
        account_id: AccountId,
        /// Operation concerned
        operation_id: OperationId,
        /// Completion time (ms)
        completed_at: u64,
    },
    /// A validator force-rejected the operation
    Rejected {
        /// Owning account
        account_id: AccountId,
        /// Operation concerned
        operation_id: OperationId,
        /// Rejecting validator
        rejected_by: ValidatorId,
        /// Stated reason
        reason: String,
    },
    /// The TTL elapsed before quorum
    Expired {
        /// Owning account
        account_id: AccountId,
        /// Operation concerned
        operation_id: OperationId,
        /// Time expiry was observed (ms)
        expired_at: u64,
    },
    /// A security invariant broke and the operation was frozen as rejected
    Frozen {
        /// Owning account
        account_id: AccountId,
        /// Operation concerned
        operation_id: OperationId,
        /// Stated reason
        reason: String,
    },
}

impl OperationEvent {
    /// Operation the event is about
    pub fn operation_id(&self) -> OperationId {
        match self {
            OperationEvent::Created { operation_id, .. }
            | OperationEvent::SignatureAccepted { operation_id, .. }
            | OperationEvent::Completed { operation_id, .. }
            | OperationEvent::Rejected { operation_id, .. }
            | OperationEvent::Expired { operation_id, .. }
            | OperationEvent::Frozen { operation_id, .. } => *operation_id,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct EventBus {
    sender: broadcast::Sender<OperationEvent>,
}

impl EventBus {
    pub(crate) fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<OperationEvent> {
        self.sender.subscribe()
    }

    pub(crate) fn publish(&self, event: OperationEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!("operation event dropped: no subscribers");
        }
    }
}
