//! Random effect handlers
//!
//! `OsRandomHandler` is the only place the engine touches system entropy.
//! `SeededRandomHandler` replays a fixed ChaCha20 stream for deterministic
//! tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::RngCore;
use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;
use std::sync::Arc;
use warden_core::effects::RandomEffects;

/// Cryptographically secure randomness from the operating system
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandomHandler;

impl OsRandomHandler {
    /// Create a new OS randomness handler
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RandomEffects for OsRandomHandler {
    async fn random_bytes_32(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        bytes
    }
}

/// Deterministic randomness. Clones draw from the same stream.
#[derive(Debug, Clone)]
pub struct SeededRandomHandler {
    rng: Arc<Mutex<ChaCha20Rng>>,
}

impl SeededRandomHandler {
    /// Stream determined by `seed`
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Arc::new(Mutex::new(ChaCha20Rng::seed_from_u64(seed))),
        }
    }
}

#[async_trait]
impl RandomEffects for SeededRandomHandler {
    async fn random_bytes_32(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        self.rng.lock().fill_bytes(&mut bytes);
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_seed_same_stream() {
        let a = SeededRandomHandler::new(7);
        let b = SeededRandomHandler::new(7);
        assert_eq!(a.random_bytes_32().await, b.random_bytes_32().await);
        assert_ne!(a.random_bytes_32().await, a.random_bytes_32().await);
    }

    #[tokio::test]
    async fn os_draws_differ() {
        let rng = OsRandomHandler::new();
        assert_ne!(rng.random_bytes_32().await, rng.random_bytes_32().await);
    }
}
