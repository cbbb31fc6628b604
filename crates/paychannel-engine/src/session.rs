// SPDX-FileCopyrightText: 2026 Paychannel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dialogue session state and the store that holds it between turns.
//!
//! Sessions live only as long as the handset conversation. The in-memory
//! store applies a sliding inactivity TTL: every successful `get` or `update`
//! pushes the deadline forward, expired entries are invisible immediately,
//! and [`SessionStore::evict_expired`] reclaims their memory.

use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use paychannel_core::PaychannelError;
use tokio::time::Instant;

/// Where a session is in the dialogue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogueState {
    /// Channel shown, waiting for `1` (confirm) or `2` (cancel).
    AwaitingConfirmation,
    /// Charge initiated and the provider asked for a one-time password.
    AwaitingOtp { reference: String },
}

/// Per-session state kept between turns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogueSession {
    pub channel_id: String,
    pub state: DialogueState,
}

impl DialogueSession {
    /// A fresh session for a channel that was just dialled.
    pub fn new(channel_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            state: DialogueState::AwaitingConfirmation,
        }
    }

    pub fn awaiting_otp(&self) -> bool {
        matches!(self.state, DialogueState::AwaitingOtp { .. })
    }

    /// Reference of the charge initiated in this session, if any.
    pub fn payment_reference(&self) -> Option<&str> {
        match &self.state {
            DialogueState::AwaitingOtp { reference } => Some(reference),
            DialogueState::AwaitingConfirmation => None,
        }
    }
}

/// In-place mutation applied by [`SessionStore::update`].
pub type SessionUpdate = Box<dyn FnOnce(&mut DialogueSession) + Send>;

/// Keyed, ephemeral storage for dialogue sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Stores `session` under `id`, replacing any existing entry.
    async fn create(&self, id: &str, session: DialogueSession) -> Result<(), PaychannelError>;

    /// Returns the live session for `id`.
    async fn get(&self, id: &str) -> Result<Option<DialogueSession>, PaychannelError>;

    /// Atomically applies `update` to the live session and returns the result.
    ///
    /// Returns `None` without calling `update` when no live session exists.
    async fn update(
        &self,
        id: &str,
        update: SessionUpdate,
    ) -> Result<Option<DialogueSession>, PaychannelError>;

    /// Removes the session, returning it if it was still live.
    async fn delete(&self, id: &str) -> Result<Option<DialogueSession>, PaychannelError>;

    /// Drops every expired entry and returns how many were removed.
    async fn evict_expired(&self) -> Result<usize, PaychannelError>;
}

#[derive(Debug)]
struct Entry {
    session: DialogueSession,
    expires_at: Instant,
}

/// [`SessionStore`] backed by a concurrent hash map.
#[derive(Debug)]
pub struct InMemorySessionStore {
    entries: DashMap<String, Entry>,
    ttl: Duration,
}

impl InMemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Number of entries held, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn drop_if_expired(&self, id: &str, now: Instant) -> bool {
        self.entries
            .remove_if(id, |_, entry| entry.expires_at <= now)
            .is_some()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, id: &str, session: DialogueSession) -> Result<(), PaychannelError> {
        self.entries.insert(
            id.to_string(),
            Entry {
                session,
                expires_at: Instant::now() + self.ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<DialogueSession>, PaychannelError> {
        let now = Instant::now();
        if self.drop_if_expired(id, now) {
            return Ok(None);
        }
        Ok(self.entries.get_mut(id).map(|mut entry| {
            entry.expires_at = now + self.ttl;
            entry.session.clone()
        }))
    }

    async fn update(
        &self,
        id: &str,
        update: SessionUpdate,
    ) -> Result<Option<DialogueSession>, PaychannelError> {
        let now = Instant::now();
        if self.drop_if_expired(id, now) {
            return Ok(None);
        }
        Ok(self.entries.get_mut(id).map(|mut entry| {
            update(&mut entry.session);
            entry.expires_at = now + self.ttl;
            entry.session.clone()
        }))
    }

    async fn delete(&self, id: &str) -> Result<Option<DialogueSession>, PaychannelError> {
        let now = Instant::now();
        Ok(self
            .entries
            .remove(id)
            .filter(|(_, entry)| entry.expires_at > now)
            .map(|(_, entry)| entry.session))
    }

    async fn evict_expired(&self) -> Result<usize, PaychannelError> {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        Ok(before.saturating_sub(self.entries.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> InMemorySessionStore {
        InMemorySessionStore::new(Duration::from_secs(120))
    }

    #[tokio::test]
    async fn create_get_delete() {
        let store = store();
        store.create("s1", DialogueSession::new("ch-1")).await.unwrap();

        let session = store.get("s1").await.unwrap().unwrap();
        assert_eq!(session.channel_id, "ch-1");
        assert!(!session.awaiting_otp());
        assert_eq!(session.payment_reference(), None);

        assert!(store.delete("s1").await.unwrap().is_some());
        assert!(store.get("s1").await.unwrap().is_none());
        assert!(store.delete("s1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_overwrites() {
        let store = store();
        store.create("s1", DialogueSession::new("ch-1")).await.unwrap();
        store.create("s1", DialogueSession::new("ch-2")).await.unwrap();
        assert_eq!(store.get("s1").await.unwrap().unwrap().channel_id, "ch-2");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn update_moves_to_awaiting_otp() {
        let store = store();
        store.create("s1", DialogueSession::new("ch-1")).await.unwrap();
        let updated = store
            .update(
                "s1",
                Box::new(|s| {
                    s.state = DialogueState::AwaitingOtp {
                        reference: "PAY-1".into(),
                    }
                }),
            )
            .await
            .unwrap()
            .unwrap();
        assert!(updated.awaiting_otp());
        assert_eq!(updated.payment_reference(), Some("PAY-1"));

        let missing = store
            .update("nope", Box::new(|_| panic!("must not run")))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_inactivity() {
        let store = store();
        store.create("s1", DialogueSession::new("ch-1")).await.unwrap();

        tokio::time::advance(Duration::from_secs(119)).await;
        assert!(store.get("s1").await.unwrap().is_some());

        // The read above slid the deadline forward.
        tokio::time::advance(Duration::from_secs(119)).await;
        assert!(store.get("s1").await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(121)).await;
        assert!(store.get("s1").await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn expired_sessions_cannot_be_updated_or_deleted() {
        let store = store();
        store.create("s1", DialogueSession::new("ch-1")).await.unwrap();
        tokio::time::advance(Duration::from_secs(121)).await;

        assert!(store.update("s1", Box::new(|_| {})).await.unwrap().is_none());
        store.create("s2", DialogueSession::new("ch-1")).await.unwrap();
        tokio::time::advance(Duration::from_secs(121)).await;
        assert!(store.delete("s2").await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn evict_expired_reclaims_memory() {
        let store = store();
        store.create("old", DialogueSession::new("ch-1")).await.unwrap();
        tokio::time::advance(Duration::from_secs(60)).await;
        store.create("new", DialogueSession::new("ch-1")).await.unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;

        assert_eq!(store.len(), 2);
        assert_eq!(store.evict_expired().await.unwrap(), 1);
        assert_eq!(store.len(), 1);
        assert!(store.get("new").await.unwrap().is_some());
    }
}
