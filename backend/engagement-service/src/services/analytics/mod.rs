// ============================================
// Analytics Engine
// ============================================
//
// Reduces the reader's history into a fixed statistics bundle:
// - average ideological leaning (political items only)
// - average factual integrity (science/health items only, may be unavailable)
// - reading diversity index
// - sentiment distribution
// - top genres and per-genre leaning breakdown
//
// Pure function of (history, catalog). All values keep full precision;
// rounding belongs to the presentation helpers at the bottom of this file.

use crate::config::AnalyticsConfig;
use crate::models::{ContentItem, PrimaryMetric, SentimentLabel};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Leaning and hype scores within this band of zero count as neutral
const DIRECTION_DEADBAND: f64 = 0.1;

pub struct AnalyticsEngine {
    top_genres_limit: usize,
    genre_bias_limit: usize,
}

impl Default for AnalyticsEngine {
    fn default() -> Self {
        Self::new(&AnalyticsConfig::default())
    }
}

impl AnalyticsEngine {
    pub fn new(config: &AnalyticsConfig) -> Self {
        Self {
            top_genres_limit: config.top_genres_limit,
            genre_bias_limit: config.genre_bias_limit,
        }
    }

    /// Compute the statistics bundle. `None` means there is no history to report on.
    pub fn compute(&self, history: &[&ContentItem]) -> Option<ReadingAnalytics> {
        let total_reads = history.len();
        if total_reads == 0 {
            return None;
        }

        let political: Vec<&ContentItem> = history
            .iter()
            .copied()
            .filter(|i| i.analysis.primary_metric == PrimaryMetric::IdeologicalLeaning)
            .collect();
        let average_bias = mean(
            political
                .iter()
                .map(|i| metric_or_default(i, PrimaryMetric::IdeologicalLeaning)),
        )
        .unwrap_or(0.0);

        let average_factual_integrity = mean(
            history
                .iter()
                .filter(|i| i.analysis.primary_metric == PrimaryMetric::FactualIntegrity)
                .map(|i| metric_or_default(i, PrimaryMetric::FactualIntegrity)),
        );

        let genre_counts = count_genres(history);
        let diversity_index = genre_counts.len() as f64 / total_reads as f64 * 100.0;

        let mut sentiment = SentimentDistribution::default();
        for item in history {
            sentiment.record(item.analysis.sentiment.label);
        }

        let top_genres = genre_counts
            .iter()
            .take(self.top_genres_limit)
            .cloned()
            .collect();

        let genre_bias_breakdown = self.genre_bias_breakdown(&genre_counts, &political);

        Some(ReadingAnalytics {
            total_reads,
            average_bias,
            average_factual_integrity,
            diversity_index,
            sentiment,
            top_genres,
            genre_bias_breakdown,
        })
    }

    /// Mean leaning per genre over political items, ordered like `top_genres`
    fn genre_bias_breakdown(
        &self,
        genre_counts: &[GenreCount],
        political: &[&ContentItem],
    ) -> Vec<GenreBias> {
        let mut sums: HashMap<&str, (f64, usize)> = HashMap::new();
        for item in political {
            let entry = sums.entry(item.genre.as_str()).or_insert((0.0, 0));
            entry.0 += metric_or_default(item, PrimaryMetric::IdeologicalLeaning);
            entry.1 += 1;
        }

        genre_counts
            .iter()
            .filter_map(|gc| {
                sums.get(gc.genre.as_str()).map(|&(total, count)| GenreBias {
                    genre: gc.genre.clone(),
                    average_leaning: total / count as f64,
                    items: count,
                })
            })
            .take(self.genre_bias_limit)
            .collect()
    }
}

/// Genre read counts, highest first; ties keep first-encountered order
fn count_genres(history: &[&ContentItem]) -> Vec<GenreCount> {
    let mut counts: Vec<GenreCount> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for item in history {
        match index.get(item.genre.as_str()) {
            Some(&idx) => counts[idx].count += 1,
            None => {
                index.insert(item.genre.as_str(), counts.len());
                counts.push(GenreCount {
                    genre: item.genre.clone(),
                    count: 1,
                });
            }
        }
    }

    // Stable sort preserves encounter order between equal counts
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Metric value with the missing-data default applied
pub fn metric_or_default(item: &ContentItem, metric: PrimaryMetric) -> f64 {
    item.analysis.metrics.get(metric).unwrap_or(0.0)
}

/// The item's headline metric; an absent value reads as 0
pub fn headline_value(item: &ContentItem) -> f64 {
    metric_or_default(item, item.analysis.primary_metric)
}

/// Headline metric with its directional reading, for item detail views
pub fn explain_headline(item: &ContentItem) -> HeadlineMetric {
    let metric = item.analysis.primary_metric;
    let value = headline_value(item);
    let direction = match metric {
        PrimaryMetric::IdeologicalLeaning => Some(LeaningLabel::from_value(value).as_str()),
        PrimaryMetric::HypeBias => Some(if value > DIRECTION_DEADBAND {
            "Hype"
        } else if value < -DIRECTION_DEADBAND {
            "Fear"
        } else {
            "Balanced"
        }),
        PrimaryMetric::FactualIntegrity | PrimaryMetric::SentimentIntensity => None,
    };

    HeadlineMetric {
        metric,
        title: metric.title(),
        value,
        direction,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HeadlineMetric {
    pub metric: PrimaryMetric,
    pub title: &'static str,
    pub value: f64,
    pub direction: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReadingAnalytics {
    pub total_reads: usize,
    /// Mean leaning of political reads, 0 when there are none
    pub average_bias: f64,
    /// `None` when no factual-integrity items were read
    pub average_factual_integrity: Option<f64>,
    /// Distinct genres / total reads * 100, in (0, 100]
    pub diversity_index: f64,
    pub sentiment: SentimentDistribution,
    pub top_genres: Vec<GenreCount>,
    pub genre_bias_breakdown: Vec<GenreBias>,
}

impl ReadingAnalytics {
    pub fn bias_label(&self) -> LeaningLabel {
        LeaningLabel::from_value(self.average_bias)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SentimentDistribution {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
}

impl SentimentDistribution {
    fn record(&mut self, label: SentimentLabel) {
        match label {
            SentimentLabel::Positive => self.positive += 1,
            SentimentLabel::Neutral => self.neutral += 1,
            SentimentLabel::Negative => self.negative += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.positive + self.neutral + self.negative
    }

    pub fn count(&self, label: SentimentLabel) -> usize {
        match label {
            SentimentLabel::Positive => self.positive,
            SentimentLabel::Neutral => self.neutral,
            SentimentLabel::Negative => self.negative,
        }
    }

    /// Share of all reads, 0..=100
    pub fn percentage(&self, label: SentimentLabel) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.count(label) as f64 / total as f64 * 100.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenreCount {
    pub genre: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenreBias {
    pub genre: String,
    pub average_leaning: f64,
    pub items: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeaningLabel {
    Left,
    Neutral,
    Right,
}

impl LeaningLabel {
    pub fn from_value(value: f64) -> Self {
        if value > DIRECTION_DEADBAND {
            LeaningLabel::Right
        } else if value < -DIRECTION_DEADBAND {
            LeaningLabel::Left
        } else {
            LeaningLabel::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LeaningLabel::Left => "Left",
            LeaningLabel::Neutral => "Neutral",
            LeaningLabel::Right => "Right",
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            LeaningLabel::Left => "Left-Leaning",
            LeaningLabel::Neutral => "Neutral",
            LeaningLabel::Right => "Right-Leaning",
        }
    }
}

// Presentation helpers

/// Whole-number percentage, e.g. `67%`
pub fn format_percent(value: f64) -> String {
    format!("{:.0}%", value)
}

/// Two-decimal score, e.g. `-0.40`
pub fn format_score(value: f64) -> String {
    format!("{:.2}", value)
}
