// SPDX-FileCopyrightText: 2026 Paychannel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background eviction of expired dialogue sessions.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::session::SessionStore;

/// Spawns a task that calls [`SessionStore::evict_expired`] every `every`
/// until `cancel` fires.
pub fn spawn_session_sweeper(
    store: Arc<dyn SessionStore>,
    every: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match store.evict_expired().await {
                        Ok(0) => {}
                        Ok(n) => debug!(evicted = n, "expired sessions swept"),
                        Err(e) => warn!(error = %e, "session sweep failed"),
                    }
                }
                _ = cancel.cancelled() => {
                    info!("session sweeper stopped");
                    break;
                }
            }
        }
    })
}
