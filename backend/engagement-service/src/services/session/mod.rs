// ============================================
// Reader Session
// ============================================
//
// Session-scoped state for one reader:
// - Read set (grows monotonically, never shrinks)
// - Focus tracker feeding dwell commits
// - Interaction ledger (votes, comment threads)
// - Declared genre preferences and optional business profile
// - Insight output slot
//
// Every mutation goes through the session's mutex, so a reader's state has
// exactly one writer at a time. The registry partitions sessions by reader id.

use super::insight::{BusinessProfile, InsightSlot};
use super::ledger::{CommentAuthor, InteractionLedger};
use super::realtime::dwell_timer::TimerToken;
use super::realtime::FocusTracker;
use crate::catalog::Catalog;
use crate::models::{ItemId, ReaderId};
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::join_all;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    SessionNotFound(ReaderId),

    #[error("Session already active: {0}")]
    AlreadyActive(ReaderId),
}

pub type Result<T> = std::result::Result<T, SessionError>;

pub type SessionHandle = Arc<Mutex<ReaderSession>>;

/// Item ids the reader has read. There is no removal.
#[derive(Debug, Clone, Default)]
pub struct ReadSet {
    ids: HashSet<ItemId>,
}

impl ReadSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the id was not already present
    pub fn insert(&mut self, item_id: impl Into<ItemId>) -> bool {
        self.ids.insert(item_id.into())
    }

    pub fn contains(&self, item_id: &str) -> bool {
        self.ids.contains(item_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &HashSet<ItemId> {
        &self.ids
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReaderProfile {
    pub reader_id: ReaderId,
    pub display_name: String,
    pub avatar_ref: String,
}

impl ReaderProfile {
    pub fn author(&self) -> CommentAuthor {
        CommentAuthor {
            display_name: self.display_name.clone(),
            avatar_ref: self.avatar_ref.clone(),
        }
    }
}

/// Snapshot returned when a session ends
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub reader_id: ReaderId,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub read_count: usize,
}

#[derive(Debug)]
pub struct ReaderSession {
    pub profile: ReaderProfile,
    pub started_at: DateTime<Utc>,
    pub read_set: ReadSet,
    pub focus: FocusTracker,
    pub ledger: InteractionLedger,
    pub preferred_genres: Vec<String>,
    pub business_profile: Option<BusinessProfile>,
    pub insight: InsightSlot,
}

impl ReaderSession {
    pub fn new(profile: ReaderProfile, catalog: &Catalog) -> Self {
        Self {
            profile,
            started_at: Utc::now(),
            read_set: ReadSet::new(),
            focus: FocusTracker::new(),
            ledger: InteractionLedger::seeded(catalog),
            preferred_genres: Vec::new(),
            business_profile: None,
            insight: InsightSlot::new(),
        }
    }

    pub fn reader_id(&self) -> ReaderId {
        self.profile.reader_id
    }

    /// Add to the read set. Idempotent; returns `true` only on first insert.
    pub fn mark_read(&mut self, item_id: &str) -> bool {
        let inserted = self.read_set.insert(item_id);
        if inserted {
            info!(
                reader_id = %self.profile.reader_id,
                item_id = item_id,
                read_count = self.read_set.len(),
                "Item marked as read"
            );
        }
        inserted
    }

    /// Dwell timer callback. Commits only if `token` is still the armed timer.
    pub fn fire_dwell(&mut self, token: TimerToken) -> Option<ItemId> {
        let item_id = self.focus.fire(token)?;
        debug!(
            reader_id = %self.profile.reader_id,
            item_id = %item_id,
            "Dwell completed"
        );
        self.mark_read(&item_id);
        Some(item_id)
    }

    pub fn set_preferred_genres(&mut self, genres: Vec<String>) {
        debug!(
            reader_id = %self.profile.reader_id,
            genres = ?genres,
            "Genre preferences updated"
        );
        self.preferred_genres = genres;
    }
}

/// Live sessions keyed by reader
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<ReaderId, SessionHandle>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_session(
        &self,
        profile: ReaderProfile,
        catalog: &Catalog,
    ) -> Result<SessionHandle> {
        let reader_id = profile.reader_id;

        match self.sessions.entry(reader_id) {
            Entry::Occupied(_) => Err(SessionError::AlreadyActive(reader_id)),
            Entry::Vacant(slot) => {
                let handle = Arc::new(Mutex::new(ReaderSession::new(profile, catalog)));
                slot.insert(handle.clone());

                info!(reader_id = %reader_id, "Session started");
                Ok(handle)
            }
        }
    }

    pub fn get(&self, reader_id: ReaderId) -> Result<SessionHandle> {
        self.sessions
            .get(&reader_id)
            .map(|entry| entry.value().clone())
            .ok_or(SessionError::SessionNotFound(reader_id))
    }

    pub fn is_active(&self, reader_id: ReaderId) -> bool {
        self.sessions.contains_key(&reader_id)
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Dispose of a session. Pending dwell timers are cancelled without committing.
    pub async fn end_session(&self, reader_id: ReaderId) -> Result<SessionSummary> {
        let (_, handle) = self
            .sessions
            .remove(&reader_id)
            .ok_or(SessionError::SessionNotFound(reader_id))?;

        let mut session = handle.lock().await;
        session.focus.teardown();
        session.insight.cancel().await;

        let summary = SessionSummary {
            reader_id,
            started_at: session.started_at,
            ended_at: Utc::now(),
            read_count: session.read_set.len(),
        };

        info!(
            reader_id = %reader_id,
            read_count = summary.read_count,
            "Session ended"
        );

        Ok(summary)
    }

    /// End every live session concurrently
    pub async fn end_all(&self) -> Vec<SessionSummary> {
        let readers: Vec<ReaderId> = self.sessions.iter().map(|entry| *entry.key()).collect();

        join_all(readers.into_iter().map(|reader_id| self.end_session(reader_id)))
            .await
            .into_iter()
            .filter_map(|result| result.ok())
            .collect()
    }
}
