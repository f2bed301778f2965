use super::impact::{
    build_impact_prompt, ImpactRequest, IMPACT_TEMPERATURE, IMPACT_UNAVAILABLE_MESSAGE,
};
use super::prompt::{build_insight_prompt, InsightPrompt};
use super::verification::{
    build_verification_prompt, parse_verification, response_schema, VerificationResult,
    VERIFICATION_TEMPERATURE,
};
use super::{InsightError, InsightProvider, InsightRequest, Result};
use crate::config::InsightConfig;
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Narrative returned when no provider credentials are configured
pub const ASSISTANT_UNAVAILABLE_MESSAGE: &str =
    "The insight assistant is unavailable. An API key may be missing.";

/// Pick the provider for this configuration. No API key selects [`DisabledProvider`].
pub fn provider_from_config(config: &InsightConfig) -> Result<Arc<dyn InsightProvider>> {
    let provider: Arc<dyn InsightProvider> = match config.api_key.as_deref() {
        Some(key) if !key.trim().is_empty() => Arc::new(GeminiProvider::new(config, key)?),
        _ => {
            warn!("INSIGHT_API_KEY not set, insight assistant disabled");
            Arc::new(DisabledProvider)
        }
    };

    info!(
        provider = provider.name(),
        model = %config.model,
        "Insight provider initialized"
    );

    Ok(provider)
}

// ============================================
// Gemini Provider
// ============================================

pub struct GeminiProvider {
    client: HttpClient,
    api_key: String,
    model: String,
    endpoint: String,
    temperature: f32,
}

impl GeminiProvider {
    pub fn new(config: &InsightConfig, api_key: &str) -> Result<Self> {
        let client = HttpClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| InsightError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            model: config.model.clone(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            temperature: config.temperature,
        })
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    /// One generateContent round trip; returns the first candidate's text
    async fn generate_content(
        &self,
        prompt: InsightPrompt,
        generation_config: GenerationConfig,
    ) -> Result<String> {
        let body = GenerateContentRequest::new(prompt, generation_config);

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| InsightError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(InsightError::Upstream {
                status: status.as_u16(),
                body: error_text,
            });
        }

        let result: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| InsightError::InvalidResponse(format!("Parse error: {}", e)))?;

        result
            .text()
            .ok_or_else(|| InsightError::InvalidResponse("response contained no text".to_string()))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: GeminiContent,
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
}

impl GenerationConfig {
    fn text(temperature: f32) -> Self {
        Self {
            temperature,
            response_mime_type: None,
            response_schema: None,
        }
    }

    fn json(temperature: f32, schema: Value) -> Self {
        Self {
            temperature,
            response_mime_type: Some("application/json".to_string()),
            response_schema: Some(schema),
        }
    }
}

impl GenerateContentRequest {
    fn new(prompt: InsightPrompt, generation_config: GenerationConfig) -> Self {
        Self {
            system_instruction: GeminiContent {
                role: None,
                parts: vec![GeminiPart {
                    text: prompt.system_instruction,
                }],
            },
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: prompt.user_prompt,
                }],
            }],
            generation_config,
        }
    }
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content.parts.iter().map(|p| p.text.as_str()).collect();
        let trimmed = text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

#[async_trait]
impl InsightProvider for GeminiProvider {
    async fn generate(&self, request: &InsightRequest) -> Result<String> {
        let prompt = build_insight_prompt(request);
        self.generate_content(prompt, GenerationConfig::text(self.temperature)).await
    }

    async fn verify(&self, text: &str) -> Result<VerificationResult> {
        let prompt = build_verification_prompt(text);
        let config = GenerationConfig::json(VERIFICATION_TEMPERATURE, response_schema());
        let raw = self.generate_content(prompt, config).await?;
        parse_verification(&raw)
    }

    async fn impact(&self, request: &ImpactRequest) -> Result<String> {
        let prompt = build_impact_prompt(request);
        self.generate_content(prompt, GenerationConfig::text(IMPACT_TEMPERATURE)).await
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

// ============================================
// Disabled Provider
// ============================================

/// Stand-in used when the assistant is not configured
pub struct DisabledProvider;

#[async_trait]
impl InsightProvider for DisabledProvider {
    async fn generate(&self, _request: &InsightRequest) -> Result<String> {
        Ok(ASSISTANT_UNAVAILABLE_MESSAGE.to_string())
    }

    async fn verify(&self, _text: &str) -> Result<VerificationResult> {
        Err(InsightError::Unavailable("verification requires an API key".to_string()))
    }

    async fn impact(&self, _request: &ImpactRequest) -> Result<String> {
        Ok(IMPACT_UNAVAILABLE_MESSAGE.to_string())
    }

    fn name(&self) -> &str {
        "disabled"
    }
}
