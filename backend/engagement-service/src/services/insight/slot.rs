use super::{
    ImpactRequest, InsightError, InsightProvider, InsightRequest, Result, VerificationResult,
    INSIGHT_FAILURE_MESSAGE,
};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum InsightState {
    #[default]
    Idle,
    Loading,
    Ready(String),
    Failed(String),
}

#[derive(Debug, Default)]
struct SlotInner {
    generation: u64,
    state: InsightState,
    in_flight: Option<AbortHandle>,
}

impl SlotInner {
    /// Invalidate whatever is outstanding and hand out the next generation
    fn supersede(&mut self) -> u64 {
        if let Some(previous) = self.in_flight.take() {
            previous.abort();
        }
        self.generation += 1;
        self.generation
    }
}

/// Per-reader insight output. Only the most recent request may write it.
#[derive(Debug, Clone, Default)]
pub struct InsightSlot {
    inner: Arc<Mutex<SlotInner>>,
}

impl InsightSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn state(&self) -> InsightState {
        self.inner.lock().await.state.clone()
    }

    /// Resolve immediately with `text`, superseding any in-flight request
    pub async fn settle(&self, text: impl Into<String>) {
        let mut inner = self.inner.lock().await;
        inner.supersede();
        inner.state = InsightState::Ready(text.into());
    }

    /// Drop any in-flight request. A slot left loading goes back to idle.
    pub async fn cancel(&self) {
        let mut inner = self.inner.lock().await;
        inner.supersede();
        if inner.state == InsightState::Loading {
            inner.state = InsightState::Idle;
        }
    }

    async fn publish(&self, generation: u64, state: InsightState) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.generation != generation {
            debug!(generation, current = inner.generation, "Discarding superseded insight");
            return false;
        }
        inner.state = state;
        inner.in_flight = None;
        true
    }
}

/// Runs requests against a provider, each bounded by the same timeout
#[derive(Clone)]
pub struct InsightCoordinator {
    provider: Arc<dyn InsightProvider>,
    timeout: Duration,
}

impl InsightCoordinator {
    pub fn new(provider: Arc<dyn InsightProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Put the slot into `Loading` and generate in the background.
    ///
    /// Any earlier request for the same slot is aborted and can no longer
    /// write its result. Failures are not retried.
    pub async fn request(&self, slot: &InsightSlot, request: InsightRequest) -> JoinHandle<()> {
        let mut inner = slot.inner.lock().await;
        let generation = inner.supersede();
        inner.state = InsightState::Loading;

        let provider = self.provider.clone();
        let timeout = self.timeout;
        let target = slot.clone();
        let total_reads = request.analytics.total_reads;

        let handle = tokio::spawn(async move {
            let outcome = match tokio::time::timeout(timeout, provider.generate(&request)).await {
                Ok(result) => result,
                Err(_) => Err(InsightError::Timeout(timeout)),
            };

            let state = match outcome {
                Ok(text) => {
                    info!(generation, total_reads, "Insight generated");
                    InsightState::Ready(text)
                }
                Err(e) => {
                    warn!(generation, error = %e, "Insight generation failed");
                    InsightState::Failed(INSIGHT_FAILURE_MESSAGE.to_string())
                }
            };

            target.publish(generation, state).await;
        });

        inner.in_flight = Some(handle.abort_handle());
        debug!(generation, "Insight requested");
        handle
    }

    /// Fact-check `text`. Runs in the caller's task and bypasses any slot.
    pub async fn verify(&self, text: &str) -> Result<VerificationResult> {
        let result = self.bounded(self.provider.verify(text)).await;
        match &result {
            Ok(verification) => info!(
                verdict = verification.overall_verdict.as_str(),
                claims = verification.claims.len(),
                "Text verified"
            ),
            Err(e) => warn!(error = %e, "Verification failed"),
        }
        result
    }

    pub async fn impact(&self, request: &ImpactRequest) -> Result<String> {
        let result = self.bounded(self.provider.impact(request)).await;
        if let Err(e) = &result {
            warn!(industry = %request.profile.industry, error = %e, "Impact analysis failed");
        }
        result
    }

    async fn bounded<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| InsightError::Timeout(self.timeout))?
    }
}
