//! Warden Testing Infrastructure
//!
//! Common setup for coordinator and end-to-end tests: deterministic key
//! material, policy builders, fault-injecting persistence and a harness
//! that wires a coordinator to simulated time and real signer back-ends.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
//!
//! # Usage
//!
//! Add this to your crate's `Cargo.toml` dev-dependencies:
//! ```toml
//! [dev-dependencies]
//! warden-testkit = { path = "../warden-testkit" }
//! ```
//!
//! Then in your tests:
//! ```rust,ignore
//! use warden_testkit::*;
//!
//! #[tokio::test]
//! async fn my_test() {
//!     let harness = TestHarness::new();
//!     harness.enroll_credential("a", ValidatorRole::Primary).await;
//!     let op = harness.open(OperationKind::Transfer, Wei(1)).await;
//!     harness.submit(op.id, "a").await.unwrap();
//! }
//! ```

pub mod builders;
pub mod harness;
pub mod keys;
pub mod mocks;
pub mod strategies;

pub use builders::PolicyBuilder;
pub use harness::{init_test_logging, TestHarness, TEST_ACCOUNT};
pub use keys::secret_from_seed;
pub use mocks::FaultyPersistence;

// Re-export commonly used types for convenience
pub use warden_core::types::{
    AccountId, OperationCategory, OperationId, OperationIntent, OperationKind, OperationState,
    SignerKind, SigningPolicy, ValidatorId, ValidatorRole, Wei,
};
pub use warden_effects::TEST_EPOCH_MS;
