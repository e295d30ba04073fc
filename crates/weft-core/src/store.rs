//! Persistence interfaces for per-conversation state.
//!
//! The bridge persists two small pieces of state outside the engine core:
//! per-(user, portal) read markers and reaction rows. The traits here are
//! the seam a database-backed implementation plugs into; the in-memory
//! implementations serve tests and single-process deployments.
//!
//! Caches are owned per store instance, each behind its own lock, and are
//! invalidated explicitly on removal. Nothing here is a process-wide
//! singleton.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::event::PortalKey;

/// Failure in a backing store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend rejected or failed the operation.
    #[error("store backend failed: {reason}")]
    Backend {
        /// Backend-provided failure description.
        reason: String,
    },
}

/// One persisted reaction row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionRow {
    /// Remote id of the reacted-to message.
    pub message_id: String,
    /// Remote thread key.
    pub thread_id: i64,
    /// Remote id of the receiving account.
    pub thread_receiver: i64,
    /// Remote id of the reacting user.
    pub sender: i64,
    /// The reaction emoji.
    pub emoji: String,
}

impl ReactionRow {
    fn key(&self) -> (String, i64, i64) {
        (self.message_id.clone(), self.thread_receiver, self.sender)
    }
}

/// Keyed CRUD over reaction rows.
///
/// A reaction is uniquely keyed by (message, receiver, sender) because the
/// remote network allows at most one reaction per message and sender.
#[async_trait]
pub trait ReactionStore: Send + Sync {
    /// Look up a reaction row by its key.
    async fn get(
        &self,
        message_id: &str,
        thread_receiver: i64,
        sender: i64,
    ) -> Result<Option<ReactionRow>, StoreError>;

    /// Insert a new reaction row.
    async fn insert(&self, row: ReactionRow) -> Result<(), StoreError>;

    /// Update an existing reaction row (matched by key).
    async fn update(&self, row: ReactionRow) -> Result<(), StoreError>;

    /// Delete a reaction row by its key.
    async fn delete(
        &self,
        message_id: &str,
        thread_receiver: i64,
        sender: i64,
    ) -> Result<(), StoreError>;
}

/// In-memory [`ReactionStore`].
#[derive(Debug, Default)]
pub struct MemoryReactionStore {
    rows: Mutex<HashMap<(String, i64, i64), ReactionRow>>,
}

impl MemoryReactionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReactionStore for MemoryReactionStore {
    async fn get(
        &self,
        message_id: &str,
        thread_receiver: i64,
        sender: i64,
    ) -> Result<Option<ReactionRow>, StoreError> {
        let rows = self.rows.lock().await;
        Ok(rows.get(&(message_id.to_string(), thread_receiver, sender)).cloned())
    }

    async fn insert(&self, row: ReactionRow) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().await;
        rows.insert(row.key(), row);
        Ok(())
    }

    async fn update(&self, row: ReactionRow) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().await;
        rows.insert(row.key(), row);
        Ok(())
    }

    async fn delete(
        &self,
        message_id: &str,
        thread_receiver: i64,
        sender: i64,
    ) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().await;
        rows.remove(&(message_id.to_string(), thread_receiver, sender));
        Ok(())
    }
}

/// Per-(user, portal) read state.
///
/// `last_read_ts` writes are monotonic: a write is applied only when
/// strictly newer than the stored value. `in_space` writes are idempotent:
/// once true, the flag stays true.
#[async_trait]
pub trait UserPortalStore: Send + Sync {
    /// Last read timestamp in unix milliseconds, if any.
    async fn last_read_ts(&self, user: &str, portal: &PortalKey) -> Result<Option<i64>, StoreError>;

    /// Record a read marker. Writes older than or equal to the stored value
    /// are dropped.
    async fn set_last_read_ts(
        &self,
        user: &str,
        portal: &PortalKey,
        ts_ms: i64,
    ) -> Result<(), StoreError>;

    /// Whether the portal has been added to the user's space.
    async fn is_in_space(&self, user: &str, portal: &PortalKey) -> Result<bool, StoreError>;

    /// Mark the portal as added to the user's space.
    async fn mark_in_space(&self, user: &str, portal: &PortalKey) -> Result<(), StoreError>;

    /// Drop any cached state for the pair, e.g. when the portal is removed.
    async fn invalidate(&self, user: &str, portal: &PortalKey);
}

type UserPortal = (String, PortalKey);

/// In-memory [`UserPortalStore`] with explicit per-field caches.
///
/// The caches mirror what a database-backed implementation would keep in
/// front of its queries; keeping them here means the monotonicity and
/// invalidation semantics are exercised even without a real backend.
#[derive(Debug, Default)]
pub struct MemoryUserPortalStore {
    rows: Mutex<HashMap<UserPortal, (i64, bool)>>,
    last_read_cache: Mutex<HashMap<UserPortal, i64>>,
    in_space_cache: Mutex<HashMap<UserPortal, bool>>,
}

impl MemoryUserPortalStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserPortalStore for MemoryUserPortalStore {
    async fn last_read_ts(&self, user: &str, portal: &PortalKey) -> Result<Option<i64>, StoreError> {
        let key = (user.to_string(), portal.clone());
        {
            let cache = self.last_read_cache.lock().await;
            if let Some(cached) = cache.get(&key) {
                return Ok(Some(*cached));
            }
        }

        let rows = self.rows.lock().await;
        let ts = rows.get(&key).map(|(ts, _)| *ts).filter(|ts| *ts > 0);
        if let Some(ts) = ts {
            self.last_read_cache.lock().await.insert(key, ts);
        }
        Ok(ts)
    }

    async fn set_last_read_ts(
        &self,
        user: &str,
        portal: &PortalKey,
        ts_ms: i64,
    ) -> Result<(), StoreError> {
        let key = (user.to_string(), portal.clone());

        let mut rows = self.rows.lock().await;
        let entry = rows.entry(key.clone()).or_insert((0, false));
        if ts_ms <= entry.0 {
            tracing::debug!(user, ts_ms, "Dropping non-monotonic read marker write");
            return Ok(());
        }
        entry.0 = ts_ms;
        drop(rows);

        self.last_read_cache.lock().await.insert(key, ts_ms);
        Ok(())
    }

    async fn is_in_space(&self, user: &str, portal: &PortalKey) -> Result<bool, StoreError> {
        let key = (user.to_string(), portal.clone());
        {
            let cache = self.in_space_cache.lock().await;
            if let Some(cached) = cache.get(&key) {
                return Ok(*cached);
            }
        }

        let rows = self.rows.lock().await;
        let in_space = rows.get(&key).is_some_and(|(_, in_space)| *in_space);
        drop(rows);

        self.in_space_cache.lock().await.insert(key, in_space);
        Ok(in_space)
    }

    async fn mark_in_space(&self, user: &str, portal: &PortalKey) -> Result<(), StoreError> {
        let key = (user.to_string(), portal.clone());

        let mut rows = self.rows.lock().await;
        rows.entry(key.clone()).or_insert((0, false)).1 = true;
        drop(rows);

        self.in_space_cache.lock().await.insert(key, true);
        Ok(())
    }

    async fn invalidate(&self, user: &str, portal: &PortalKey) {
        let key = (user.to_string(), portal.clone());
        self.last_read_cache.lock().await.remove(&key);
        self.in_space_cache.lock().await.remove(&key);
    }
}
