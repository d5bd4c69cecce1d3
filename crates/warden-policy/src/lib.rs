//! # Warden Policy - Layer 2: Authorization Rules
//!
//! Who may sign for an account and how many of them must.
//!
//! - [`ValidatorRegistry`]: enrollment, revocation and the single-primary rule
//! - [`SigningPolicyEvaluator`]: required signature counts and policy checks
//!
//! Both are synchronous and free of effects; the coordinator supplies loaded
//! state and persists the results.

#![forbid(unsafe_code)]

pub mod evaluator;
pub mod validators;

pub use evaluator::{SignatureRequirement, SigningPolicyEvaluator};
pub use validators::{ActiveValidators, ValidatorRegistry};
