//! # Warden Coordinator - Layer 4: Orchestration
//!
//! Tracks pending operations from creation to a terminal state and enforces
//! the quorum rules of each account.
//!
//! ## Architecture Constraints
//!
//! This crate depends on:
//! - **Layer 1** (warden-core): Types, effects, errors, configuration
//! - **Layer 2** (warden-policy, warden-signature): Authorization rules and verification
//!
//! Effect handlers are injected; nothing here touches a clock, an RNG or
//! storage directly.
//!
//! ## What Belongs Here
//!
//! - The pending operation state machine ([`PendingOperationCoordinator`])
//! - Validator and policy administration for an account
//! - Per-operation and per-account locking
//! - Lifecycle events ([`OperationEvent`])
//!
//! ## Guarantees
//!
//! - An operation completes only with `required_signatures` distinct,
//!   currently active validators whose signatures verified
//! - Terminal states never change
//! - A failed verification or failed write leaves stored state untouched

#![forbid(unsafe_code)]

pub mod admin;
pub mod coordinator;
pub mod effects;
pub mod events;
pub mod locks;
pub mod types;

pub use coordinator::PendingOperationCoordinator;
pub use effects::CoordinatorEffects;
pub use events::{OperationEvent, DEFAULT_EVENT_CAPACITY};
pub use locks::{KeyedGuard, LockTable};
pub use types::{
    EnrollmentRequest, OperationDraft, OperationRequest, OperationStatus, SignatureSubmission,
    SubmissionOutcome,
};
