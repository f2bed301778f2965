//! Ranking Module
//!
//! Orders the catalog for display, pulling the reader's preferred genres to the
//! front without reshuffling anything else.
//!
//! # Algorithm
//! A stable partition: preferred items first, non-preferred after, each group
//! in its original catalog order. There is no secondary key, so ties keep
//! source order and the output is always a permutation of the input.

use crate::models::ContentItem;
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::debug;

/// Ranking Layer - preference-aware feed ordering
pub struct RankingLayer;

impl Default for RankingLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl RankingLayer {
    pub fn new() -> Self {
        Self
    }

    /// Order items so that preferred genres come first
    pub fn rank<'a>(
        &self,
        items: impl IntoIterator<Item = &'a ContentItem>,
        preferred_genres: &[String],
    ) -> Vec<&'a ContentItem> {
        let preferred: HashSet<&str> = preferred_genres.iter().map(String::as_str).collect();
        let mut ranked: Vec<&ContentItem> = items.into_iter().collect();

        // sort_by is stable; equal keys keep catalog order
        ranked.sort_by(|a, b| {
            let a_preferred = preferred.contains(a.genre.as_str());
            let b_preferred = preferred.contains(b.genre.as_str());
            match (a_preferred, b_preferred) {
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                _ => Ordering::Equal,
            }
        });

        debug!(
            items = ranked.len(),
            preferred_genres = preferred.len(),
            "Preference ranking applied"
        );

        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::item;
    use crate::models::PrimaryMetric;

    fn ids<'a>(items: &[&'a ContentItem]) -> Vec<&'a str> {
        items.iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn test_preferred_genres_move_ahead_stably() {
        let items = vec![
            item("p1", "Politics", PrimaryMetric::IdeologicalLeaning),
            item("n1", "Sports", PrimaryMetric::SentimentIntensity),
            item("p2", "Politics", PrimaryMetric::IdeologicalLeaning),
            item("n2", "Science", PrimaryMetric::FactualIntegrity),
        ];

        let ranked = RankingLayer::new().rank(&items, &["Politics".to_string()]);

        assert_eq!(ids(&ranked), vec!["p1", "p2", "n1", "n2"]);
    }

    #[test]
    fn test_no_preferences_keeps_catalog_order() {
        let items = vec![
            item("a", "Tech", PrimaryMetric::HypeBias),
            item("b", "Sports", PrimaryMetric::SentimentIntensity),
            item("c", "Tech", PrimaryMetric::HypeBias),
        ];

        let ranked = RankingLayer::new().rank(&items, &[]);

        assert_eq!(ids(&ranked), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_output_is_permutation_of_input() {
        let genres = ["Politics", "Science", "Sports", "Tech", "Health"];
        let items: Vec<ContentItem> = (0..25)
            .map(|i| {
                item(
                    &format!("item-{}", i),
                    genres[(i * 7) % genres.len()],
                    PrimaryMetric::IdeologicalLeaning,
                )
            })
            .collect();
        let preferred = vec!["Sports".to_string(), "Health".to_string()];

        let ranked = RankingLayer::new().rank(&items, &preferred);

        assert_eq!(ranked.len(), items.len());
        let mut input_ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        let mut output_ids = ids(&ranked);
        input_ids.sort_unstable();
        output_ids.sort_unstable();
        assert_eq!(input_ids, output_ids);

        // Every preferred item precedes every other item
        let first_other = ranked
            .iter()
            .position(|i| !preferred.contains(&i.genre))
            .unwrap_or(ranked.len());
        assert!(ranked[first_other..]
            .iter()
            .all(|i| !preferred.contains(&i.genre)));

        // Relative order inside each partition matches the input
        let position = |id: &str| items.iter().position(|i| i.id == id).unwrap();
        for window in ranked[..first_other].windows(2) {
            assert!(position(&window[0].id) < position(&window[1].id));
        }
        for window in ranked[first_other..].windows(2) {
            assert!(position(&window[0].id) < position(&window[1].id));
        }
    }
}
