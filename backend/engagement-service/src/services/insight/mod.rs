// ============================================
// Reading Insight (external narrative collaborator)
// ============================================
//
// Hands the analytics bundle to a text-generation provider and exposes the
// outcome through a per-reader output slot:
//
//   Idle ──request──▶ Loading ──ok──▶ Ready(text)
//                        │
//                        └──error/timeout──▶ Failed(generic message)
//
// A newer request supersedes an older one (last request wins). Failures are
// never retried automatically.
//
// The same provider also answers two one-shot requests that bypass the slot:
// claim verification of free text and business impact analysis of one item.

pub mod impact;
pub mod prompt;
pub mod provider;
pub mod slot;
pub mod verification;

pub use impact::{
    build_impact_prompt, BusinessProfile, ImpactRequest, IMPACT_UNAVAILABLE_MESSAGE,
};
pub use prompt::{build_insight_prompt, InsightPrompt};
pub use provider::{
    provider_from_config, DisabledProvider, GeminiProvider, ASSISTANT_UNAVAILABLE_MESSAGE,
};
pub use slot::{InsightCoordinator, InsightSlot, InsightState};
pub use verification::{
    build_verification_prompt, parse_verification, ClaimVerification, Verdict, VerificationResult,
};

use crate::models::ItemId;
use crate::services::analytics::ReadingAnalytics;
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Shown to the reader whenever generation fails, whatever the cause
pub const INSIGHT_FAILURE_MESSAGE: &str = "Failed to generate insight. Please try again.";

/// Narrative used when there is nothing to analyse yet
pub const NO_READING_DATA_MESSAGE: &str = "No reading data available to analyze.";

#[derive(Debug, Error)]
pub enum InsightError {
    #[error("Provider request failed: {0}")]
    Transport(String),

    #[error("Provider returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),

    #[error("Insight generation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Assistant unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, InsightError>;

/// What the collaborator receives
#[derive(Debug, Clone, Serialize)]
pub struct InsightRequest {
    pub read_item_ids: Vec<ItemId>,
    pub analytics: ReadingAnalytics,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InsightProvider: Send + Sync {
    /// Produce narrative text for the request
    async fn generate(&self, request: &InsightRequest) -> Result<String>;

    /// Fact-check free text
    async fn verify(&self, text: &str) -> Result<VerificationResult>;

    /// Business impact of one article for the given profile, as markdown bullets
    async fn impact(&self, request: &ImpactRequest) -> Result<String>;

    fn name(&self) -> &str;
}
