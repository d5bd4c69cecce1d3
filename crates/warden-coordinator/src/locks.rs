//! Keyed exclusive locks
//!
//! One async mutex per key, created on first use and dropped once no task
//! holds or waits on it. Waiting is bounded: a caller that cannot acquire
//! within the timeout gets a concurrency error and may retry.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OwnedMutexGuard;
use warden_core::{WardenError, WardenResult};

type Slot = Arc<tokio::sync::Mutex<()>>;

/// Table of per-key locks.
#[derive(Debug)]
pub struct LockTable<K> {
    slots: Arc<Mutex<HashMap<K, Slot>>>,
}

impl<K> Clone for LockTable<K> {
    fn clone(&self) -> Self {
        Self {
            slots: Arc::clone(&self.slots),
        }
    }
}

impl<K> Default for LockTable<K> {
    fn default() -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<K> LockTable<K>
where
    K: Eq + Hash + Clone + Display,
{
    /// Empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for `key`, waiting at most `timeout`.
    pub async fn acquire(&self, key: &K, timeout: Duration) -> WardenResult<KeyedGuard<K>> {
        let slot = {
            let mut slots = self.slots.lock();
            Arc::clone(slots.entry(key.clone()).or_default())
        };

        match tokio::time::timeout(timeout, slot.lock_owned()).await {
            Ok(guard) => Ok(KeyedGuard {
                key: key.clone(),
                table: self.clone(),
                guard: Some(guard),
            }),
            Err(_) => {
                tracing::warn!(
                    key = %key,
                    timeout_ms = timeout.as_millis() as u64,
                    "lock wait timed out"
                );
                self.release_slot(key);
                Err(WardenError::concurrency(format!(
                    "timed out waiting for lock on {key}"
                )))
            }
        }
    }

    /// Number of keys with a live lock
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    /// Whether no key is locked or awaited
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn release_slot(&self, key: &K) {
        let mut slots = self.slots.lock();
        let idle = slots
            .get(key)
            .map(|slot| Arc::strong_count(slot) == 1)
            .unwrap_or(false);
        if idle {
            slots.remove(key);
        }
    }
}

/// Held lock; released on drop.
pub struct KeyedGuard<K>
where
    K: Eq + Hash + Clone + Display,
{
    key: K,
    table: LockTable<K>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl<K> Drop for KeyedGuard<K>
where
    K: Eq + Hash + Clone + Display,
{
    fn drop(&mut self) {
        // Release the mutex before checking whether the slot is idle.
        drop(self.guard.take());
        self.table.release_slot(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_acquire_times_out_while_held() {
        let table = LockTable::<String>::new();
        let key = "op".to_string();
        let held = table.acquire(&key, Duration::from_millis(50)).await.unwrap();

        let err = table
            .acquire(&key, Duration::from_millis(20))
            .await
            .err()
            .unwrap();
        assert!(err.is_retryable());

        drop(held);
        let _again = table.acquire(&key, Duration::from_millis(20)).await.unwrap();
    }

    #[tokio::test]
    async fn idle_slots_are_dropped() {
        let table = LockTable::<u32>::new();
        {
            let _a = table.acquire(&1, Duration::from_millis(10)).await.unwrap();
            let _b = table.acquire(&2, Duration::from_millis(10)).await.unwrap();
            assert_eq!(table.len(), 2);
        }
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn distinct_keys_do_not_contend() {
        let table = LockTable::<u32>::new();
        let _a = table.acquire(&1, Duration::from_millis(10)).await.unwrap();
        assert!(table.acquire(&2, Duration::from_millis(10)).await.is_ok());
    }
}
