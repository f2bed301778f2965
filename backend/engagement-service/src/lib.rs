pub mod catalog;
pub mod config;
pub mod engine;
pub mod models;
pub mod services;
pub mod telemetry;

pub use catalog::Catalog;
pub use config::Config;
pub use engine::{EngagementEngine, EngineError};
pub use services::{
    AnalyticsEngine, InsightProvider, InsightState, RankingLayer, ReadStateTracker,
    SessionRegistry, VisibilityEvent,
};
