// ============================================
// Claim Verification
// ============================================
//
// Free-text fact check. The provider is asked for a JSON document matching
// `response_schema()`; anything that does not parse into a
// `VerificationResult` is rejected as a malformed response.

use super::{InsightError, InsightPrompt, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Low temperature keeps verdicts repeatable
pub const VERIFICATION_TEMPERATURE: f32 = 0.1;

const SYSTEM_INSTRUCTION: &str = "You are an expert fact-checker. Analyze the provided text \
and determine its factual accuracy by cross-referencing its claims against trusted news \
sources, official statements and fact-checking organizations.
1. Extract the main factual claims from the text.
2. For each claim, decide whether it is True, False, Partially True or Unverified.
3. Give an overall verdict for the whole text.
4. Give a confidence score from 0 to 100 for the overall verdict.
5. Describe the framing and tone of the text (for example sensationalized, neutral, emotionally charged).
6. List the names of credible sources that confirm or deny the claims.
7. Respond ONLY with a JSON object matching the provided schema, without conversational text or markdown.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    True,
    False,
    #[serde(rename = "Partially True")]
    PartiallyTrue,
    Unverified,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::True => "True",
            Verdict::False => "False",
            Verdict::PartiallyTrue => "Partially True",
            Verdict::Unverified => "Unverified",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimVerification {
    pub claim: String,
    pub status: Verdict,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub overall_verdict: Verdict,
    /// 0 to 100
    pub confidence_score: f64,
    pub claims: Vec<ClaimVerification>,
    pub framing_analysis: String,
    pub verified_sources: Vec<String>,
}

pub fn build_verification_prompt(text: &str) -> InsightPrompt {
    InsightPrompt {
        system_instruction: SYSTEM_INSTRUCTION.to_string(),
        user_prompt: text.trim().to_string(),
    }
}

/// Structured-output schema sent with verification requests
pub fn response_schema() -> Value {
    let verdicts = json!(["True", "False", "Partially True", "Unverified"]);
    json!({
        "type": "OBJECT",
        "properties": {
            "overallVerdict": { "type": "STRING", "enum": verdicts },
            "confidenceScore": { "type": "NUMBER" },
            "claims": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "claim": { "type": "STRING" },
                        "status": { "type": "STRING", "enum": verdicts }
                    },
                    "required": ["claim", "status"]
                }
            },
            "framingAnalysis": { "type": "STRING" },
            "verifiedSources": { "type": "ARRAY", "items": { "type": "STRING" } }
        },
        "required": [
            "overallVerdict",
            "confidenceScore",
            "claims",
            "framingAnalysis",
            "verifiedSources"
        ]
    })
}

/// Decode the provider's JSON answer
pub fn parse_verification(raw: &str) -> Result<VerificationResult> {
    let result: VerificationResult = serde_json::from_str(raw.trim())
        .map_err(|e| InsightError::InvalidResponse(format!("verification result: {}", e)))?;

    if !(0.0..=100.0).contains(&result.confidence_score) {
        return Err(InsightError::InvalidResponse(format!(
            "confidence score {} outside 0-100",
            result.confidence_score
        )));
    }

    Ok(result)
}
