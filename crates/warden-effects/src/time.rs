//! Time effect handlers

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use warden_core::effects::{PhysicalTime, PhysicalTimeEffects};
use warden_core::{WardenError, WardenResult};

/// Wall-clock handler for production use
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClockHandler;

impl SystemClockHandler {
    /// Create a new system clock handler
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PhysicalTimeEffects for SystemClockHandler {
    async fn physical_time(&self) -> WardenResult<PhysicalTime> {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| WardenError::internal(format!("system clock before epoch: {e}")))?;
        Ok(PhysicalTime::from_ms(elapsed.as_millis() as u64))
    }
}

/// Simulated clock for tests. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct SimulatedClockHandler {
    current_ms: Arc<Mutex<u64>>,
}

impl SimulatedClockHandler {
    /// Clock frozen at `start_ms`
    pub fn new(start_ms: u64) -> Self {
        Self {
            current_ms: Arc::new(Mutex::new(start_ms)),
        }
    }

    /// Move time forward
    pub fn advance(&self, by: Duration) {
        let mut now = self.current_ms.lock();
        *now = now.saturating_add(by.as_millis() as u64);
    }

    /// Move time forward by milliseconds
    pub fn advance_ms(&self, ms: u64) {
        let mut now = self.current_ms.lock();
        *now = now.saturating_add(ms);
    }

    /// Set the absolute instant
    pub fn set_ms(&self, ms: u64) {
        *self.current_ms.lock() = ms;
    }

    /// Current simulated instant
    pub fn now_ms(&self) -> u64 {
        *self.current_ms.lock()
    }
}

impl Default for SimulatedClockHandler {
    fn default() -> Self {
        Self::new(0)
    }
}

#[async_trait]
impl PhysicalTimeEffects for SimulatedClockHandler {
    async fn physical_time(&self) -> WardenResult<PhysicalTime> {
        Ok(PhysicalTime::from_ms(self.now_ms()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn simulated_clock_is_shared_between_clones() {
        let clock = SimulatedClockHandler::new(1_000);
        let other = clock.clone();
        other.advance(Duration::from_secs(2));
        assert_eq!(clock.physical_time().await.unwrap().ts_ms, 3_000);
        clock.set_ms(10);
        assert_eq!(other.now_ms(), 10);
    }

    #[tokio::test]
    async fn system_clock_is_after_2020() {
        let now = SystemClockHandler.physical_time().await.unwrap();
        assert!(now.ts_ms > 1_577_836_800_000);
    }
}
