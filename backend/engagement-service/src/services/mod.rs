pub mod analytics;
pub mod insight;
pub mod ledger;
pub mod ranking;
pub mod realtime;
pub mod session;

pub use analytics::{AnalyticsEngine, ReadingAnalytics};
pub use insight::{InsightCoordinator, InsightProvider, InsightSlot, InsightState};
pub use ledger::{InteractionLedger, PollTally};
pub use ranking::RankingLayer;
pub use realtime::{ReadStateTracker, VisibilityEvent};
pub use session::{ReaderProfile, ReaderSession, SessionRegistry};
