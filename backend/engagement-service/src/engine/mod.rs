// ============================================
// Engagement Engine
// ============================================
//
// Composition root. Wires the catalog, the per-reader session registry and
// the stateless engines together and is the single entry point for
// presentation code:
//
//   visibility ──▶ ReadStateTracker ──▶ ReadSet ──▶ AnalyticsEngine
//                                                        │
//                                                        ▼
//                                               InsightCoordinator
//   preferences ─▶ RankingLayer ──▶ feed
//   votes / comments ──▶ InteractionLedger
//   free text / item + business profile ──▶ verification / impact analysis

use crate::catalog::{Catalog, CatalogError};
use crate::config::{Config, ConfigError};
use crate::models::{Comment, ContentItem, ReaderId};
use crate::services::analytics::{
    explain_headline, AnalyticsEngine, HeadlineMetric, ReadingAnalytics,
};
use crate::services::insight::{
    provider_from_config, BusinessProfile, ImpactRequest, InsightCoordinator, InsightError,
    InsightProvider, InsightRequest, InsightState, VerificationResult, NO_READING_DATA_MESSAGE,
};
use crate::services::ledger::{LedgerError, PollTally};
use crate::services::ranking::RankingLayer;
use crate::services::realtime::ReadStateTracker;
use crate::services::session::{
    ReaderProfile, SessionError, SessionHandle, SessionRegistry, SessionSummary,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Most genres a reader may prefer at once
pub const MAX_PREFERRED_GENRES: usize = 10;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Insight error: {0}")]
    Insight(#[from] InsightError),

    #[error("Unknown item: {0}")]
    UnknownItem(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No business profile set for reader {0}")]
    MissingBusinessProfile(ReaderId),
}

pub type Result<T> = std::result::Result<T, EngineError>;

pub struct EngagementEngine {
    catalog: Arc<Catalog>,
    sessions: SessionRegistry,
    ranking: RankingLayer,
    analytics: AnalyticsEngine,
    insight: InsightCoordinator,
    config: Config,
}

impl EngagementEngine {
    pub fn new(catalog: Catalog, config: Config, provider: Arc<dyn InsightProvider>) -> Self {
        let insight =
            InsightCoordinator::new(provider, Duration::from_secs(config.insight.timeout_secs));

        Self {
            catalog: Arc::new(catalog),
            sessions: SessionRegistry::new(),
            ranking: RankingLayer::new(),
            analytics: AnalyticsEngine::new(&config.analytics),
            insight,
            config,
        }
    }

    /// Load the catalog from `config.catalog.path` and pick the insight provider
    pub fn from_config(config: Config) -> Result<Self> {
        config.validate()?;
        let catalog = Catalog::load(&config.catalog.path)?;
        let provider = provider_from_config(&config.insight)?;

        info!(
            service = %config.service.name,
            items = catalog.len(),
            dwell_ms = config.tracker.dwell_ms,
            "Engagement engine initialized"
        );

        Ok(Self::new(catalog, config, provider))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // ========================================
    // Session lifecycle
    // ========================================

    /// Start a session for `reader_id` using the configured reader identity
    pub fn start_session(&self, reader_id: ReaderId) -> Result<SessionHandle> {
        let profile = ReaderProfile {
            reader_id,
            display_name: self.config.reader.display_name.clone(),
            avatar_ref: self.config.reader.avatar_ref.clone(),
        };
        self.start_session_with(profile)
    }

    pub fn start_session_with(&self, profile: ReaderProfile) -> Result<SessionHandle> {
        Ok(self.sessions.start_session(profile, &self.catalog)?)
    }

    pub async fn end_session(&self, reader_id: ReaderId) -> Result<SessionSummary> {
        Ok(self.sessions.end_session(reader_id).await?)
    }

    /// End all live sessions, discarding pending dwell timers and insight requests
    pub async fn shutdown(&self) -> Vec<SessionSummary> {
        let summaries = self.sessions.end_all().await;
        info!(sessions = summaries.len(), "Engagement engine shut down");
        summaries
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.active_sessions()
    }

    fn session(&self, reader_id: ReaderId) -> Result<SessionHandle> {
        Ok(self.sessions.get(reader_id)?)
    }

    // ========================================
    // Feed and read tracking
    // ========================================

    /// Genres offered at onboarding, in catalog order
    pub fn genres(&self) -> Vec<&str> {
        self.catalog.genres()
    }

    /// Between one and [`MAX_PREFERRED_GENRES`] genres; duplicates collapse
    pub async fn set_preferred_genres(
        &self,
        reader_id: ReaderId,
        genres: Vec<String>,
    ) -> Result<()> {
        let mut unique: Vec<String> = Vec::with_capacity(genres.len());
        for genre in genres {
            if !unique.contains(&genre) {
                unique.push(genre);
            }
        }
        if unique.is_empty() || unique.len() > MAX_PREFERRED_GENRES {
            return Err(EngineError::InvalidInput(format!(
                "expected 1 to {} preferred genres, got {}",
                MAX_PREFERRED_GENRES,
                unique.len()
            )));
        }
        let genres = unique;

        let session = self.session(reader_id)?;
        session.lock().await.set_preferred_genres(genres);
        Ok(())
    }

    /// The whole catalog, preferred genres first
    pub async fn feed(&self, reader_id: ReaderId) -> Result<Vec<&ContentItem>> {
        let preferred = self.session(reader_id)?.lock().await.preferred_genres.clone();
        Ok(self.ranking.rank(self.catalog.items(), &preferred))
    }

    /// Items eligible for the snapping stream, in catalog order
    pub fn carousel(&self) -> Vec<&ContentItem> {
        self.catalog.carousel_items()
    }

    /// Tracker for one stream view. Call [`ReadStateTracker::stop`] when leaving it.
    ///
    /// Focus left over from an earlier view is cleared first, so the new view
    /// starts from a clean slate. Reports for items outside the catalog are ignored.
    pub async fn tracker(&self, reader_id: ReaderId) -> Result<ReadStateTracker> {
        let session = self.session(reader_id)?;
        if let Some(item_id) = session.lock().await.focus.teardown() {
            debug!(reader_id = %reader_id, item_id = %item_id, "Stale dwell cleared");
        }
        Ok(ReadStateTracker::new(session, &self.config.tracker).with_catalog(self.catalog.clone()))
    }

    /// Select an item from the feed. Opening counts as reading it.
    pub async fn open_item(&self, reader_id: ReaderId, item_id: &str) -> Result<&ContentItem> {
        let item = self
            .catalog
            .get(item_id)
            .ok_or_else(|| EngineError::UnknownItem(item_id.to_string()))?;

        let session = self.session(reader_id)?;
        session.lock().await.mark_read(item_id);

        Ok(item)
    }

    /// Items the reader has read, in catalog order
    pub async fn read_items(&self, reader_id: ReaderId) -> Result<Vec<&ContentItem>> {
        let session = self.session(reader_id)?;
        let session = session.lock().await;
        Ok(self.catalog.resolve(session.read_set.ids()))
    }

    pub fn related(&self, item_id: &str) -> Result<Vec<&ContentItem>> {
        if !self.catalog.contains(item_id) {
            return Err(EngineError::UnknownItem(item_id.to_string()));
        }
        Ok(self.catalog.related(item_id))
    }

    pub fn explain_headline(&self, item_id: &str) -> Result<HeadlineMetric> {
        self.catalog
            .get(item_id)
            .map(explain_headline)
            .ok_or_else(|| EngineError::UnknownItem(item_id.to_string()))
    }

    // ========================================
    // Interactions
    // ========================================

    pub async fn cast_vote(
        &self,
        reader_id: ReaderId,
        poll_id: &str,
        option_id: &str,
    ) -> Result<PollTally> {
        let poll = self
            .catalog
            .poll(poll_id)
            .ok_or_else(|| LedgerError::UnknownPoll(poll_id.to_string()))?;

        let session = self.session(reader_id)?;
        let mut session = session.lock().await;
        session.ledger.cast_vote(poll, option_id)?;

        info!(
            reader_id = %reader_id,
            poll_id = poll_id,
            option_id = option_id,
            "Vote cast"
        );

        Ok(session.ledger.tally(poll))
    }

    pub async fn poll_tally(&self, reader_id: ReaderId, poll_id: &str) -> Result<PollTally> {
        let poll = self
            .catalog
            .poll(poll_id)
            .ok_or_else(|| LedgerError::UnknownPoll(poll_id.to_string()))?;

        let session = self.session(reader_id)?;
        let tally = session.lock().await.ledger.tally(poll);
        Ok(tally)
    }

    /// Append a comment as the session's reader. `None` when the text is blank.
    pub async fn add_comment(
        &self,
        reader_id: ReaderId,
        item_id: &str,
        text: &str,
    ) -> Result<Option<Comment>> {
        if !self.catalog.contains(item_id) {
            return Err(LedgerError::UnknownItem(item_id.to_string()).into());
        }

        let session = self.session(reader_id)?;
        let mut session = session.lock().await;
        let author = session.profile.author();
        let comment = session.ledger.add_comment(item_id, text, &author).cloned();

        if comment.is_none() {
            debug!(reader_id = %reader_id, item_id = item_id, "Blank comment ignored");
        }

        Ok(comment)
    }

    pub async fn comments(&self, reader_id: ReaderId, item_id: &str) -> Result<Vec<Comment>> {
        let session = self.session(reader_id)?;
        let comments = session.lock().await.ledger.comments(item_id).to_vec();
        Ok(comments)
    }

    // ========================================
    // Analytics and insight
    // ========================================

    /// Statistics over the read set. `None` when nothing has been read.
    pub async fn analytics(&self, reader_id: ReaderId) -> Result<Option<ReadingAnalytics>> {
        let history = self.read_items(reader_id).await?;
        Ok(self.analytics.compute(&history))
    }

    /// Ask the collaborator for a narrative. The newest request always wins.
    ///
    /// Returns the background task, or `None` when there was nothing to
    /// analyse and the slot was resolved immediately.
    pub async fn request_insight(&self, reader_id: ReaderId) -> Result<Option<JoinHandle<()>>> {
        let history = self.read_items(reader_id).await?;
        let slot = self.session(reader_id)?.lock().await.insight.clone();

        let Some(analytics) = self.analytics.compute(&history) else {
            slot.settle(NO_READING_DATA_MESSAGE).await;
            return Ok(None);
        };

        info!(
            reader_id = %reader_id,
            total_reads = analytics.total_reads,
            "Insight requested"
        );

        let request = InsightRequest {
            read_item_ids: history.iter().map(|item| item.id.clone()).collect(),
            analytics,
        };

        Ok(Some(self.insight.request(&slot, request).await))
    }

    pub async fn insight_state(&self, reader_id: ReaderId) -> Result<InsightState> {
        let slot = self.session(reader_id)?.lock().await.insight.clone();
        Ok(slot.state().await)
    }

    // ========================================
    // Verification and business intelligence
    // ========================================

    /// Fact-check pasted text. Independent of any session.
    pub async fn verify_text(&self, text: &str) -> Result<VerificationResult> {
        if text.trim().is_empty() {
            return Err(EngineError::InvalidInput("nothing to verify".to_string()));
        }
        Ok(self.insight.verify(text).await?)
    }

    /// Declare the industry and focus used for impact analysis
    pub async fn set_business_profile(
        &self,
        reader_id: ReaderId,
        industry: &str,
        focus: &str,
    ) -> Result<BusinessProfile> {
        let profile = BusinessProfile::new(industry, focus).ok_or_else(|| {
            EngineError::InvalidInput("industry and focus are both required".to_string())
        })?;

        let session = self.session(reader_id)?;
        session.lock().await.business_profile = Some(profile.clone());

        info!(
            reader_id = %reader_id,
            industry = %profile.industry,
            "Business profile set"
        );

        Ok(profile)
    }

    /// Impact of one item on the reader's declared business
    pub async fn impact_analysis(&self, reader_id: ReaderId, item_id: &str) -> Result<String> {
        let item = self
            .catalog
            .get(item_id)
            .ok_or_else(|| EngineError::UnknownItem(item_id.to_string()))?;

        let profile = self
            .session(reader_id)?
            .lock()
            .await
            .business_profile
            .clone()
            .ok_or(EngineError::MissingBusinessProfile(reader_id))?;

        debug!(reader_id = %reader_id, item_id = item_id, "Impact analysis requested");
        let request = ImpactRequest::new(item, profile);
        Ok(self.insight.impact(&request).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::*;
    use crate::models::PrimaryMetric;
    use crate::services::insight::MockInsightProvider;

    fn engine(provider: MockInsightProvider) -> EngagementEngine {
        let catalog = Catalog::new(vec![
            political("p1", "Politics", Some(-0.5)),
            item("s1", "Sports", PrimaryMetric::SentimentIntensity),
            with_poll(political("p2", "Politics", Some(0.3)), "poll-1", &[("a", 10), ("b", 5)]),
            factual("h1", "Health", Some(0.8)),
        ])
        .unwrap();
        EngagementEngine::new(catalog, Config::default(), Arc::new(provider))
    }

    #[tokio::test]
    async fn test_unknown_reader_is_rejected() {
        let engine = engine(MockInsightProvider::new());
        let stranger = ReaderId::new();

        assert!(matches!(
            engine.feed(stranger).await,
            Err(EngineError::Session(SessionError::SessionNotFound(_)))
        ));
        assert!(engine.tracker(stranger).await.is_err());
    }

    #[tokio::test]
    async fn test_feed_follows_preferences() {
        let engine = engine(MockInsightProvider::new());
        let reader = ReaderId::new();
        engine.start_session(reader).unwrap();

        let ids =
            |items: Vec<&ContentItem>| items.iter().map(|i| i.id.clone()).collect::<Vec<_>>();

        assert_eq!(ids(engine.feed(reader).await.unwrap()), vec!["p1", "s1", "p2", "h1"]);

        engine
            .set_preferred_genres(reader, vec!["Health".to_string(), "Sports".to_string()])
            .await
            .unwrap();
        assert_eq!(ids(engine.feed(reader).await.unwrap()), vec!["s1", "h1", "p1", "p2"]);
    }

    #[tokio::test]
    async fn test_genre_preferences_are_bounded() {
        let engine = engine(MockInsightProvider::new());
        let reader = ReaderId::new();
        engine.start_session(reader).unwrap();
        engine.set_preferred_genres(reader, vec!["Health".to_string()]).await.unwrap();

        assert!(matches!(
            engine.set_preferred_genres(reader, vec![]).await,
            Err(EngineError::InvalidInput(_))
        ));
        let too_many: Vec<String> = (0..=MAX_PREFERRED_GENRES)
            .map(|i| format!("g{}", i))
            .collect();
        assert!(matches!(
            engine.set_preferred_genres(reader, too_many).await,
            Err(EngineError::InvalidInput(_))
        ));

        let mut repeated = vec!["Sports".to_string(); 12];
        repeated.push("Health".to_string());
        engine.set_preferred_genres(reader, repeated).await.unwrap();

        let session = engine.session(reader).unwrap();
        assert_eq!(session.lock().await.preferred_genres, vec!["Sports", "Health"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_tracker_recovers_from_dropped_one() {
        let engine = engine(MockInsightProvider::new());
        let reader = ReaderId::new();
        engine.start_session(reader).unwrap();

        let mut first = engine.tracker(reader).await.unwrap();
        first.on_visibility_change("p1", true).await;
        tokio::time::sleep(Duration::from_millis(1000)).await;
        drop(first);

        let mut second = engine.tracker(reader).await.unwrap();
        second.on_visibility_change("p1", true).await;
        second.on_visibility_change("ghost", true).await;
        tokio::time::sleep(Duration::from_millis(3100)).await;
        second.stop().await;

        let read: Vec<_> = engine
            .read_items(reader)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.id.as_str())
            .collect();
        assert_eq!(read, vec!["p1"]);

        let summary = engine.end_session(reader).await.unwrap();
        assert_eq!(summary.read_count, 1);
    }

    #[tokio::test]
    async fn test_open_item_marks_read() {
        let engine = engine(MockInsightProvider::new());
        let reader = ReaderId::new();
        engine.start_session(reader).unwrap();

        engine.open_item(reader, "h1").await.unwrap();
        engine.open_item(reader, "p1").await.unwrap();
        engine.open_item(reader, "h1").await.unwrap();
        assert!(matches!(
            engine.open_item(reader, "missing").await,
            Err(EngineError::UnknownItem(_))
        ));

        let read: Vec<_> = engine
            .read_items(reader)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.id.as_str())
            .collect();
        assert_eq!(read, vec!["p1", "h1"]);
    }

    #[tokio::test]
    async fn test_vote_errors_leave_state_unchanged() {
        let engine = engine(MockInsightProvider::new());
        let reader = ReaderId::new();
        engine.start_session(reader).unwrap();

        engine.cast_vote(reader, "poll-1", "b").await.unwrap();
        assert!(matches!(
            engine.cast_vote(reader, "poll-1", "zzz").await,
            Err(EngineError::Ledger(LedgerError::UnknownOption { .. }))
        ));
        assert!(matches!(
            engine.cast_vote(reader, "nope", "a").await,
            Err(EngineError::Ledger(LedgerError::UnknownPoll(_)))
        ));

        let tally = engine.poll_tally(reader, "poll-1").await.unwrap();
        assert_eq!(tally.total_votes, 16);
        assert!(tally.options[1].chosen);
    }

    #[tokio::test]
    async fn test_comments_are_stamped_with_reader_identity() {
        let engine = engine(MockInsightProvider::new());
        let reader = ReaderId::new();
        engine.start_session(reader).unwrap();

        assert!(engine.add_comment(reader, "p1", "   ").await.unwrap().is_none());
        let comment = engine
            .add_comment(reader, "p1", "  Worth reading.  ")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(comment.text, "Worth reading.");
        assert_eq!(comment.author, "You");
        assert!(matches!(
            engine.add_comment(reader, "missing", "hi").await,
            Err(EngineError::Ledger(LedgerError::UnknownItem(_)))
        ));

        assert_eq!(engine.comments(reader, "p1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_insight_without_history_skips_provider() {
        let mut provider = MockInsightProvider::new();
        provider.expect_generate().never();
        let engine = engine(provider);
        let reader = ReaderId::new();
        engine.start_session(reader).unwrap();

        assert!(engine.analytics(reader).await.unwrap().is_none());
        assert!(engine.request_insight(reader).await.unwrap().is_none());
        assert_eq!(
            engine.insight_state(reader).await.unwrap(),
            InsightState::Ready(NO_READING_DATA_MESSAGE.to_string())
        );
    }

    #[tokio::test]
    async fn test_insight_receives_read_history() {
        let mut provider = MockInsightProvider::new();
        provider
            .expect_generate()
            .withf(|req| req.read_item_ids == vec!["p1".to_string(), "p2".to_string()])
            .times(1)
            .returning(|req| Ok(format!("{} political reads", req.analytics.total_reads)));
        let engine = engine(provider);
        let reader = ReaderId::new();
        engine.start_session(reader).unwrap();

        engine.open_item(reader, "p2").await.unwrap();
        engine.open_item(reader, "p1").await.unwrap();

        let analytics = engine.analytics(reader).await.unwrap().unwrap();
        assert!((analytics.average_bias - (-0.1)).abs() < 1e-9);

        let task = engine.request_insight(reader).await.unwrap().unwrap();
        task.await.unwrap();
        assert_eq!(
            engine.insight_state(reader).await.unwrap(),
            InsightState::Ready("2 political reads".to_string())
        );
    }

    #[test]
    fn test_related_and_headline_lookups() {
        let engine = engine(MockInsightProvider::new());

        assert!(engine.related("p1").unwrap().is_empty());
        assert!(engine.related("missing").is_err());

        let headline = engine.explain_headline("p1").unwrap();
        assert_eq!(headline.direction, Some("Left"));
        assert!(engine.explain_headline("missing").is_err());
    }

    #[tokio::test]
    async fn test_verify_text_rejects_blank_input() {
        let mut provider = MockInsightProvider::new();
        provider.expect_verify().never();
        let engine = engine(provider);

        assert!(matches!(
            engine.verify_text("  \n ").await,
            Err(EngineError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_impact_analysis_uses_business_profile() {
        let mut provider = MockInsightProvider::new();
        provider
            .expect_impact()
            .withf(|req| req.title == "Article h1" && req.profile.industry == "Healthcare")
            .times(1)
            .returning(|req| Ok(format!("- **Impact on {}**", req.profile.focus)));
        let engine = engine(provider);
        let reader = ReaderId::new();
        engine.start_session(reader).unwrap();

        assert!(matches!(
            engine.impact_analysis(reader, "h1").await,
            Err(EngineError::MissingBusinessProfile(_))
        ));
        assert!(matches!(
            engine.set_business_profile(reader, "Healthcare", " ").await,
            Err(EngineError::InvalidInput(_))
        ));

        engine
            .set_business_profile(reader, "Healthcare", "clinical trials")
            .await
            .unwrap();
        assert!(matches!(
            engine.impact_analysis(reader, "missing").await,
            Err(EngineError::UnknownItem(_))
        ));
        assert_eq!(
            engine.impact_analysis(reader, "h1").await.unwrap(),
            "- **Impact on clinical trials**"
        );
    }
}
