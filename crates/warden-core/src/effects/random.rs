//! Randomness effect for identifiers and nonces

use async_trait::async_trait;

/// Source of entropy.
#[async_trait]
pub trait RandomEffects: Send + Sync {
    /// 32 random bytes
    async fn random_bytes_32(&self) -> [u8; 32];

    /// 16 random bytes, taken from a fresh 32-byte draw
    async fn random_bytes_16(&self) -> [u8; 16] {
        let wide = self.random_bytes_32().await;
        let mut out = [0u8; 16];
        out.copy_from_slice(&wide[..16]);
        out
    }
}
