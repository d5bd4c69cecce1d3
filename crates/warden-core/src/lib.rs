//! # Warden Core - Layer 1: Foundation
//!
//! Shared vocabulary of the multi-signer policy and verification engine.
//!
//! ## What Belongs Here
//!
//! - The data model: validators, signing policy, pending operations
//! - The unified error type and its recovery categories
//! - Effect traits for time, randomness and persistence
//! - Configuration loading and validation
//!
//! ## What Does NOT Belong Here
//!
//! - Signature dispatch and message encoding (`warden-signature`)
//! - Validator registry and policy evaluation (`warden-policy`)
//! - Effect handler implementations (`warden-effects`)
//! - The pending operation state machine (`warden-coordinator`)

#![forbid(unsafe_code)]

pub mod config;
pub mod effects;
pub mod errors;
pub mod hash;
pub mod types;

pub use config::{CoordinatorConfig, LoggingConfig, WardenConfig};
pub use errors::{ErrorCategory, WardenError, WardenResult};
pub use types::*;
