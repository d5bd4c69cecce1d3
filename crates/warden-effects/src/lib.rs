//! # Warden Effects - Layer 3: Handlers
//!
//! Stateless and in-memory implementations of the effect traits defined in
//! `warden-core`, plus the concrete signer back-ends consumed by
//! `warden-signature`.
//!
//! | Effect | Production | Testing |
//! |--------|-----------|---------|
//! | Time | [`SystemClockHandler`] | [`SimulatedClockHandler`] |
//! | Randomness | [`OsRandomHandler`] | [`SeededRandomHandler`] |
//! | Persistence | [`MemoryPersistenceHandler`] (hosts supply their own) | [`MemoryPersistenceHandler`] |
//! | Credential signer | [`Ed25519CredentialHandler`] | same |
//! | Identity signer | [`IssuerAttestationHandler`] | same |

#![forbid(unsafe_code)]

pub mod logging;
pub mod persistence;
pub mod random;
pub mod signers;
pub mod system;
pub mod time;

pub use logging::init_logging;
pub use persistence::MemoryPersistenceHandler;
pub use random::{OsRandomHandler, SeededRandomHandler};
pub use signers::{Ed25519CredentialHandler, IdentityClaim, IssuerAttestationHandler};
pub use system::{WardenEffectSystem, TEST_EPOCH_MS};
pub use time::{SimulatedClockHandler, SystemClockHandler};
