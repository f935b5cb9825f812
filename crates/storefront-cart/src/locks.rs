//! # Keyed Locks
//!
//! One async mutex per key, created on demand.
//!
//! ## Lock Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  session lock (sess-a)                                                 │
//! │     │                                                                   │
//! │     └──► stock lock (cart_id "mug")   only for tracked products        │
//! │             │                                                           │
//! │             ├── SUM held by other sessions                             │
//! │             ├── mutate cart                                            │
//! │             └── persist cart rows                                      │
//! │          released                                                      │
//! │  released                                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! A stock lock is never held while waiting on a session lock, so the two
//! tables cannot deadlock.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Entries whose mutex nobody holds are dropped once the table grows past
/// this many keys.
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Debug, Default)]
pub struct KeyedLocks {
    table: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for and takes the lock for `key`.
    pub async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        let mutex = {
            let mut table = self.table.lock().await;
            if table.len() >= PRUNE_THRESHOLD {
                table.retain(|_, m| Arc::strong_count(m) > 1);
            }
            table.entry(key.to_string()).or_default().clone()
        };

        mutex.lock_owned().await
    }

    /// Drops entries nobody is holding or waiting on.
    pub async fn prune(&self) -> usize {
        let mut table = self.table.lock().await;
        let before = table.len();
        table.retain(|_, m| Arc::strong_count(m) > 1);
        before - table.len()
    }

    pub async fn len(&self) -> usize {
        self.table.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_is_exclusive() {
        let locks = Arc::new(KeyedLocks::new());
        let guard = locks.lock("a").await;

        let locks2 = locks.clone();
        let waiter = tokio::spawn(async move {
            let _g = locks2.lock("a").await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn test_different_keys_do_not_block() {
        let locks = KeyedLocks::new();
        let _a = locks.lock("a").await;
        let _b = locks.lock("b").await;
        assert_eq!(locks.len().await, 2);
    }

    #[tokio::test]
    async fn test_prune_keeps_held_entries() {
        let locks = KeyedLocks::new();
        let held = locks.lock("held").await;
        drop(locks.lock("free").await);

        assert_eq!(locks.prune().await, 1);
        assert_eq!(locks.len().await, 1);
        drop(held);
    }
}
