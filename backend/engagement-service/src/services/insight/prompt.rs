use super::InsightRequest;
use crate::models::SentimentLabel;
use crate::services::analytics::{format_percent, format_score};

const SYSTEM_INSTRUCTION: &str = "You are a media literacy mentor. Analyze a reader's news \
reading habits from the provided statistics and write a brief, insightful and encouraging \
summary. Be factual, balanced and constructive, never judgmental. The goal is to promote \
self-awareness and conscious media consumption. Answer in two parts: 1) a short paragraph \
summarizing the key patterns, 2) a single, actionable suggestion for how the reader could \
broaden their perspective.";

#[derive(Debug, Clone, PartialEq)]
pub struct InsightPrompt {
    pub system_instruction: String,
    pub user_prompt: String,
}

/// Render the reading statistics into the reading-habits prompt
pub fn build_insight_prompt(request: &InsightRequest) -> InsightPrompt {
    let analytics = &request.analytics;
    let sentiment = &analytics.sentiment;

    let sentiment_summary = format!(
        "Positive: {}, Neutral: {}, Negative: {}",
        format_percent(sentiment.percentage(SentimentLabel::Positive)),
        format_percent(sentiment.percentage(SentimentLabel::Neutral)),
        format_percent(sentiment.percentage(SentimentLabel::Negative)),
    );

    let genre_bias = if analytics.genre_bias_breakdown.is_empty() {
        "N/A".to_string()
    } else {
        analytics
            .genre_bias_breakdown
            .iter()
            .map(|g| format!("{}: {}", g.genre, format_score(g.average_leaning)))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut user_prompt = String::new();
    user_prompt.push_str("Here are my reading statistics:\n");
    user_prompt.push_str(&format!(
        "- Total Articles Read: {}\n",
        analytics.total_reads
    ));
    user_prompt.push_str(&format!(
        "- Reading Diversity Index (RDI): {}\n",
        format_percent(analytics.diversity_index)
    ));
    user_prompt.push_str(&format!(
        "- Overall Average Ideological Bias (from political news): {} ({})\n",
        format_score(analytics.average_bias),
        analytics.bias_label().describe()
    ));
    if let Some(integrity) = analytics.average_factual_integrity {
        user_prompt.push_str(&format!(
            "- Average Factual Integrity (science and health news): {}\n",
            format_percent(integrity * 100.0)
        ));
    }
    user_prompt.push_str(&format!("- Sentiment Distribution: {}\n", sentiment_summary));
    user_prompt.push_str(&format!(
        "- Average Ideological Bias by Genre: {}\n",
        genre_bias
    ));
    user_prompt.push_str(
        "\nBased on these stats, please provide a short summary of my reading patterns and one \
concrete suggestion on how I could diversify my reading. Focus on the ideological bias if \
available, otherwise comment on genre diversity.",
    );

    InsightPrompt {
        system_instruction: SYSTEM_INSTRUCTION.to_string(),
        user_prompt,
    }
}
