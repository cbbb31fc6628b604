// SPDX-FileCopyrightText: 2026 Paychannel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-session turn serialization.
//!
//! Turns for the same session id run one at a time; different ids never
//! contend. Lock entries are dropped as soon as nobody holds or waits on them.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Default)]
pub struct TurnLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

/// Held for the duration of one turn.
#[derive(Debug)]
pub struct TurnGuard<'a> {
    locks: &'a TurnLocks,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl TurnLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other turn for `key` is running.
    pub async fn acquire(&self, key: &str) -> TurnGuard<'_> {
        let lock = self.locks.entry(key.to_string()).or_default().clone();
        let guard = lock.lock_owned().await;
        TurnGuard {
            locks: self,
            key: key.to_string(),
            guard: Some(guard),
        }
    }

    /// Number of keys with a live lock entry.
    pub fn active(&self) -> usize {
        self.locks.len()
    }
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        // Only the map's own reference left: no holder, no waiter.
        self.locks
            .locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn entries_are_released() {
        let locks = TurnLocks::new();
        {
            let _a = locks.acquire("s1").await;
            let _b = locks.acquire("s2").await;
            assert_eq!(locks.active(), 2);
        }
        assert_eq!(locks.active(), 0);
    }

    #[tokio::test]
    async fn same_key_is_serialized() {
        let locks = Arc::new(TurnLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = Arc::clone(&locks);
            let inside = Arc::clone(&inside);
            let max_seen = Arc::clone(&max_seen);
            handles.push(tokio::spawn(async move {
                let _turn = locks.acquire("same").await;
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
        assert_eq!(locks.active(), 0);
    }
}
