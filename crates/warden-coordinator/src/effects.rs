//! Effect composition for the coordinator
//!
//! The coordinator needs exactly three capabilities:
//!
//! - **PhysicalTimeEffects**: creation, expiry and maturation timestamps
//! - **RandomEffects**: operation ids and message nonces
//! - **PersistenceEffects**: validators, policy and operations
//!
//! Signer back-ends are not effects here; they arrive through the
//! `SignerVerifierRegistry` handed to the coordinator.

use warden_core::effects::{PersistenceEffects, PhysicalTimeEffects, RandomEffects};

/// Composed effects required by [`PendingOperationCoordinator`](crate::PendingOperationCoordinator).
pub trait CoordinatorEffects:
    PhysicalTimeEffects + RandomEffects + PersistenceEffects + Send + Sync
{
}

/// Blanket implementation for any type that implements all required traits.
impl<T> CoordinatorEffects for T where
    T: PhysicalTimeEffects + RandomEffects + PersistenceEffects + Send + Sync
{
}
