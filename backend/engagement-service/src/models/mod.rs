use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ItemId = String;
pub type PollId = String;
pub type OptionId = String;

/// Reader identity used to partition session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReaderId(pub Uuid);

impl ReaderId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ReaderId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ReaderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A scored content item as loaded from the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: ItemId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub publication_date: String,
    pub genre: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub full_text: Option<String>,
    pub analysis: AnalysisRecord,
    /// Groups related coverage of the same story
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub hook: Option<String>,
    #[serde(default)]
    pub bullets: Option<Vec<String>>,
    #[serde(default)]
    pub poll: Option<Poll>,
    /// Seed comments shipped with the catalog
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl ContentItem {
    /// Only items with a hook and bullet points are shown in the snapping stream
    pub fn is_carousel_eligible(&self) -> bool {
        self.hook.is_some() && self.bullets.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PrimaryMetric {
    IdeologicalLeaning,
    FactualIntegrity,
    HypeBias,
    SentimentIntensity,
}

impl PrimaryMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimaryMetric::IdeologicalLeaning => "ideologicalLeaning",
            PrimaryMetric::FactualIntegrity => "factualIntegrity",
            PrimaryMetric::HypeBias => "hypeBias",
            PrimaryMetric::SentimentIntensity => "sentimentIntensity",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            PrimaryMetric::IdeologicalLeaning => "Ideological Leaning",
            PrimaryMetric::FactualIntegrity => "Factual Integrity",
            PrimaryMetric::HypeBias => "Hype / Fear Bias",
            PrimaryMetric::SentimentIntensity => "Sentiment Intensity",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub primary_metric: PrimaryMetric,
    #[serde(default)]
    pub metrics: Metrics,
    pub sentiment: Sentiment,
    #[serde(default)]
    pub source_credibility: f64,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub claims: Vec<Claim>,
    #[serde(default)]
    pub explainability: Vec<String>,
}

/// Sparse metric values. Absent metrics stay `None`; defaulting happens in analytics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    /// -1 (Left) to +1 (Right)
    pub ideological_leaning: Option<f64>,
    pub establishment_bias: Option<f64>,
    /// 0 to 1
    pub factual_integrity: Option<f64>,
    pub opinionation: Option<f64>,
    pub sensationalism: Option<f64>,
    /// -1 (Fear) to +1 (Hype)
    pub hype_bias: Option<f64>,
    /// 0 to 1
    pub sentiment_intensity: Option<f64>,
}

impl Metrics {
    pub fn get(&self, metric: PrimaryMetric) -> Option<f64> {
        match metric {
            PrimaryMetric::IdeologicalLeaning => self.ideological_leaning,
            PrimaryMetric::FactualIntegrity => self.factual_integrity,
            PrimaryMetric::HypeBias => self.hype_bias,
            PrimaryMetric::SentimentIntensity => self.sentiment_intensity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sentiment {
    #[serde(rename = "score")]
    pub label: SentimentLabel,
    /// Signed magnitude
    #[serde(default)]
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    pub statement: String,
    pub corroboration: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Poll {
    pub id: PollId,
    #[serde(default)]
    pub question: String,
    pub options: Vec<PollOption>,
}

impl Poll {
    pub fn option(&self, option_id: &str) -> Option<&PollOption> {
        self.options.iter().find(|o| o.id == option_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollOption {
    pub id: OptionId,
    pub text: String,
    /// Immutable base count; the reader's own vote is layered on top
    #[serde(rename = "votes")]
    pub base_vote_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    #[serde(alias = "user")]
    pub author: String,
    #[serde(alias = "avatar")]
    pub avatar_ref: String,
    pub text: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_catalog_item() {
        let json = r#"{
            "id": "15",
            "title": "Opposition Parties Form Alliance",
            "source": "Political Observer",
            "publicationDate": "2023-10-16",
            "genre": "Politics",
            "summary": "Several parties announced an alliance.",
            "hook": "A new alliance forms.",
            "bullets": ["Three parties united."],
            "analysis": {
                "primaryMetric": "ideologicalLeaning",
                "metrics": { "ideologicalLeaning": -0.4, "sensationalism": 0.2 },
                "sentiment": { "score": "Neutral", "value": 0.0 },
                "sourceCredibility": 0.88
            },
            "poll": {
                "id": "poll-15",
                "question": "Will it work?",
                "options": [{ "id": "opt1", "text": "Yes", "votes": 124 }]
            },
            "comments": [
                { "id": "c1", "user": "Ana", "avatar": "a.png", "text": "Interesting" }
            ]
        }"#;

        let item: ContentItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.analysis.primary_metric, PrimaryMetric::IdeologicalLeaning);
        assert_eq!(item.analysis.metrics.ideological_leaning, Some(-0.4));
        assert_eq!(item.analysis.metrics.factual_integrity, None);
        assert_eq!(item.analysis.sentiment.label, SentimentLabel::Neutral);
        assert!(item.is_carousel_eligible());
        assert_eq!(item.poll.as_ref().unwrap().options[0].base_vote_count, 124);
        assert_eq!(item.comments[0].author, "Ana");
        assert!(item.event_id.is_none());
    }

    #[test]
    fn test_metric_lookup_by_primary_metric() {
        let metrics = Metrics {
            hype_bias: Some(0.7),
            ..Default::default()
        };
        assert_eq!(metrics.get(PrimaryMetric::HypeBias), Some(0.7));
        assert_eq!(metrics.get(PrimaryMetric::SentimentIntensity), None);
    }
}
