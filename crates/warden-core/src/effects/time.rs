//! Physical time effect
//!
//! Expiry and maturation comparisons across every coordinator instance must
//! read the same trusted clock, so time is only ever observed through this
//! trait.

use crate::errors::WardenResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Wall-clock instant in milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PhysicalTime {
    /// Milliseconds since the Unix epoch
    pub ts_ms: u64,
}

impl PhysicalTime {
    /// Construct from milliseconds
    pub fn from_ms(ts_ms: u64) -> Self {
        Self { ts_ms }
    }
}

/// Source of physical time.
#[async_trait]
pub trait PhysicalTimeEffects: Send + Sync {
    /// Current time
    async fn physical_time(&self) -> WardenResult<PhysicalTime>;
}
