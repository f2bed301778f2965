// ============================================
// Read-State Tracker
// ============================================
//
// Tokio driver for the focus/dwell state machine of one stream view.
//
// Each focus change spawns a task that sleeps for the dwell duration and then
// fires its token under the session lock. Superseded tasks are aborted; a task
// that wakes anyway presents a stale token and commits nothing.

use super::dwell_timer::TimerToken;
use super::focus_tracker::VisibilityEvent;
use crate::catalog::Catalog;
use crate::config::TrackerConfig;
use crate::services::session::SessionHandle;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::AbortHandle;
use tracing::debug;

pub struct ReadStateTracker {
    session: SessionHandle,
    dwell: Duration,
    focus_threshold: f64,
    catalog: Option<Arc<Catalog>>,
    pending: Option<AbortHandle>,
}

impl ReadStateTracker {
    pub fn new(session: SessionHandle, config: &TrackerConfig) -> Self {
        Self {
            session,
            dwell: Duration::from_millis(config.dwell_ms),
            focus_threshold: config.focus_threshold,
            catalog: None,
            pending: None,
        }
    }

    /// Ignore reports for items the catalog does not contain
    pub fn with_catalog(mut self, catalog: Arc<Catalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    fn is_known(&self, item_id: &str) -> bool {
        self.catalog
            .as_ref()
            .map_or(true, |catalog| catalog.contains(item_id))
    }

    pub fn dwell(&self) -> Duration {
        self.dwell
    }

    /// Single visibility report
    pub async fn on_visibility_change(&mut self, item_id: &str, is_focused: bool) {
        if !self.is_known(item_id) {
            debug!(item_id = %item_id, "Ignoring visibility report for unknown item");
            return;
        }

        let token = {
            let mut session = self.session.lock().await;
            session.focus.on_visibility_change(item_id, is_focused)
        };
        if let Some(token) = token {
            self.schedule(token);
        }
    }

    /// Raw intersection ratio, classified against the configured threshold
    pub async fn on_intersection(&mut self, item_id: &str, ratio: f64) {
        let event = VisibilityEvent::from_ratio(item_id, ratio, self.focus_threshold);
        self.on_visibility_change(&event.item_id, event.is_focused).await;
    }

    /// Reports delivered together; the last focused one wins
    pub async fn on_visibility_batch(&mut self, events: &[VisibilityEvent]) {
        let known: Vec<VisibilityEvent> = events
            .iter()
            .filter(|event| self.is_known(&event.item_id))
            .cloned()
            .collect();
        if known.len() < events.len() {
            debug!(
                ignored = events.len() - known.len(),
                "Ignoring visibility reports for unknown items"
            );
        }

        let token = {
            let mut session = self.session.lock().await;
            session.focus.observe_batch(&known)
        };
        if let Some(token) = token {
            self.schedule(token);
        }
    }

    fn schedule(&mut self, token: TimerToken) {
        if let Some(previous) = self.pending.take() {
            previous.abort();
        }

        let session = self.session.clone();
        let dwell = self.dwell;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(dwell).await;
            let mut session = session.lock().await;
            session.fire_dwell(token);
        });

        debug!(
            generation = token.generation(),
            dwell_ms = dwell.as_millis() as u64,
            "Dwell timer started"
        );

        self.pending = Some(handle.abort_handle());
    }

    /// Leave the stream view. Any outstanding timer is cancelled without committing.
    pub async fn stop(mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }

        let cancelled = self.session.lock().await.focus.teardown();
        if let Some(item_id) = cancelled {
            debug!(item_id = %item_id, "Pending dwell cancelled");
        }
    }
}

impl Drop for ReadStateTracker {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }

        // Without this the focus stays armed on the old item and a later
        // tracker focusing the same item would never schedule a timer.
        // Attaching a new tracker tears down again if the lock is busy here.
        if let Ok(mut session) = self.session.try_lock() {
            if let Some(item_id) = session.focus.teardown() {
                debug!(item_id = %item_id, "Pending dwell dropped with tracker");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures;
    use crate::models::{PrimaryMetric, ReaderId};
    use crate::services::session::{ReaderProfile, ReaderSession};
    use tokio::sync::Mutex;
    use tokio::time::sleep;

    fn session() -> SessionHandle {
        let profile = ReaderProfile {
            reader_id: ReaderId::new(),
            display_name: "You".to_string(),
            avatar_ref: "me.png".to_string(),
        };
        Arc::new(Mutex::new(ReaderSession::new(profile, &Catalog::default())))
    }

    async fn read_ids(session: &SessionHandle) -> Vec<String> {
        let mut ids: Vec<String> = session.lock().await.read_set.ids().iter().cloned().collect();
        ids.sort();
        ids
    }

    #[tokio::test(start_paused = true)]
    async fn test_switching_focus_before_dwell_skips_item() {
        let session = session();
        let mut tracker = ReadStateTracker::new(session.clone(), &TrackerConfig::default());

        tracker.on_visibility_change("a", true).await;
        sleep(Duration::from_millis(1000)).await;
        tracker.on_visibility_change("b", true).await;

        sleep(Duration::from_millis(2900)).await; // t = 3900
        assert!(read_ids(&session).await.is_empty());

        sleep(Duration::from_millis(200)).await; // t = 4100
        assert_eq!(read_ids(&session).await, vec!["b".to_string()]);

        sleep(Duration::from_millis(10_000)).await;
        assert_eq!(read_ids(&session).await, vec!["b".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_outstanding_timer() {
        let session = session();
        let mut tracker = ReadStateTracker::new(session.clone(), &TrackerConfig::default());

        tracker.on_visibility_change("a", true).await;
        sleep(Duration::from_millis(2999)).await;
        tracker.stop().await;

        sleep(Duration::from_millis(5000)).await;
        assert!(read_ids(&session).await.is_empty());
        assert!(session.lock().await.focus.pending().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_batches_and_ratios_drive_focus() {
        let session = session();
        let mut tracker = ReadStateTracker::new(session.clone(), &TrackerConfig::default());

        tracker
            .on_visibility_batch(&[
                VisibilityEvent::new("a", true),
                VisibilityEvent::new("b", true),
            ])
            .await;
        sleep(Duration::from_millis(3100)).await;
        assert_eq!(read_ids(&session).await, vec!["b".to_string()]);

        // Below the 80% threshold: focus stays on b, nothing new is read
        tracker.on_intersection("c", 0.5).await;
        sleep(Duration::from_millis(3100)).await;
        assert_eq!(read_ids(&session).await, vec!["b".to_string()]);

        tracker.on_intersection("c", 0.95).await;
        sleep(Duration::from_millis(3100)).await;
        assert_eq!(
            read_ids(&session).await,
            vec!["b".to_string(), "c".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_returning_to_read_item_is_idempotent() {
        let session = session();
        let mut tracker = ReadStateTracker::new(session.clone(), &TrackerConfig::default());

        for item in ["a", "b", "a"] {
            tracker.on_visibility_change(item, true).await;
            sleep(Duration::from_millis(3500)).await;
        }

        assert_eq!(
            read_ids(&session).await,
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_tracker_releases_focus() {
        let session = session();
        {
            let mut tracker = ReadStateTracker::new(session.clone(), &TrackerConfig::default());
            tracker.on_visibility_change("a", true).await;
            sleep(Duration::from_millis(1000)).await;
        }
        assert!(session.lock().await.focus.pending().is_none());
        assert!(session.lock().await.focus.current_focus().is_none());

        let mut tracker = ReadStateTracker::new(session.clone(), &TrackerConfig::default());
        tracker.on_visibility_change("a", true).await;
        sleep(Duration::from_millis(3100)).await;
        assert_eq!(read_ids(&session).await, vec!["a".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_items_are_ignored_with_catalog() {
        let session = session();
        let item = fixtures::item("a", "Science", PrimaryMetric::SentimentIntensity);
        let catalog = Catalog::new(vec![item]).unwrap();
        let mut tracker = ReadStateTracker::new(session.clone(), &TrackerConfig::default())
            .with_catalog(Arc::new(catalog));

        tracker.on_visibility_change("ghost", true).await;
        sleep(Duration::from_millis(3100)).await;
        assert!(read_ids(&session).await.is_empty());

        tracker
            .on_visibility_batch(&[
                VisibilityEvent::new("a", true),
                VisibilityEvent::new("ghost", true),
            ])
            .await;
        sleep(Duration::from_millis(3100)).await;
        assert_eq!(read_ids(&session).await, vec!["a".to_string()]);
    }
}
