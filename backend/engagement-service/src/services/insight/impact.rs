// ============================================
// Business Impact Analysis
// ============================================
//
// Per-article briefing for a reader who declared an industry and a business
// focus. The provider answers in two or three markdown bullet points.

use super::InsightPrompt;
use crate::models::ContentItem;
use serde::Serialize;

pub const IMPACT_TEMPERATURE: f32 = 0.4;

/// Returned instead of an analysis when no provider credentials are configured
pub const IMPACT_UNAVAILABLE_MESSAGE: &str =
    "Business Intelligence Assistant is unavailable. API Key may be missing.";

/// Industry and focus declared by a business reader
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BusinessProfile {
    pub industry: String,
    pub focus: String,
}

impl BusinessProfile {
    /// Both fields are trimmed; `None` when either is blank
    pub fn new(industry: &str, focus: &str) -> Option<Self> {
        let industry = industry.trim();
        let focus = focus.trim();
        if industry.is_empty() || focus.is_empty() {
            return None;
        }
        Some(Self {
            industry: industry.to_string(),
            focus: focus.to_string(),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImpactRequest {
    pub title: String,
    pub source: String,
    pub summary: String,
    pub profile: BusinessProfile,
}

impl ImpactRequest {
    pub fn new(item: &ContentItem, profile: BusinessProfile) -> Self {
        Self {
            title: item.title.clone(),
            source: item.source.clone(),
            summary: item.summary.clone(),
            profile,
        }
    }
}

pub fn build_impact_prompt(request: &ImpactRequest) -> InsightPrompt {
    let profile = &request.profile;

    let system_instruction = format!(
        "You are a world-class business intelligence analyst. Your client operates in the \
**{}** sector, with a specific business focus on **\"{}\"**. Analyze the following news \
article and give a concise, actionable insight on its potential impact on their business.\n\n\
Structure your response as 2-3 short markdown bullet points:\n\
- Start with a direct statement of the impact (e.g. \"**Increased R&D costs:**\").\n\
- Briefly explain why, based on the article's content.\n\
- Close with a strategic consideration or a question for the business leader.\n\n\
Keep a professional, executive tone without conversational filler. Cover only what is \
relevant to the client's industry and focus.",
        profile.industry, profile.focus
    );

    let user_prompt = format!(
        "Analyze the following article for its business impact:\n\
- **Article Title:** \"{}\"\n\
- **Source:** {}\n\
- **Summary:** {}",
        request.title, request.source, request.summary
    );

    InsightPrompt {
        system_instruction,
        user_prompt,
    }
}
