// ============================================
// Item Catalog
// ============================================
//
// Ordered, read-only collection of analysed content items.
// Loaded once at startup; every lookup preserves catalog order.

use crate::models::{ContentItem, Poll};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate item id: {0}")]
    DuplicateItem(String),

    #[error("Duplicate poll id: {0}")]
    DuplicatePoll(String),
}

pub type Result<T> = std::result::Result<T, CatalogError>;

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<ContentItem>,
    by_id: HashMap<String, usize>,
    polls: HashMap<String, usize>,
}

impl Catalog {
    pub fn new(items: Vec<ContentItem>) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(items.len());
        let mut polls = HashMap::new();

        for (idx, item) in items.iter().enumerate() {
            if by_id.insert(item.id.clone(), idx).is_some() {
                return Err(CatalogError::DuplicateItem(item.id.clone()));
            }
            if let Some(poll) = &item.poll {
                if polls.insert(poll.id.clone(), idx).is_some() {
                    return Err(CatalogError::DuplicatePoll(poll.id.clone()));
                }
            }
        }

        Ok(Self {
            items,
            by_id,
            polls,
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let items: Vec<ContentItem> = serde_json::from_str(json)?;
        Self::new(items)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let catalog = Self::from_json(&json)?;

        info!(
            path = %path.display(),
            items = catalog.len(),
            polls = catalog.polls.len(),
            "Catalog loaded"
        );

        Ok(catalog)
    }

    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, item_id: &str) -> Option<&ContentItem> {
        self.by_id.get(item_id).map(|&idx| &self.items[idx])
    }

    pub fn contains(&self, item_id: &str) -> bool {
        self.by_id.contains_key(item_id)
    }

    pub fn poll(&self, poll_id: &str) -> Option<&Poll> {
        self.polls
            .get(poll_id)
            .and_then(|&idx| self.items[idx].poll.as_ref())
    }

    /// Resolve a set of ids into items, in catalog order. Unknown ids are skipped.
    pub fn resolve<'a>(&'a self, ids: &HashSet<String>) -> Vec<&'a ContentItem> {
        self.items
            .iter()
            .filter(|item| ids.contains(&item.id))
            .collect()
    }

    /// Other coverage of the same story, excluding the item itself
    pub fn related(&self, item_id: &str) -> Vec<&ContentItem> {
        let Some(event_id) = self.get(item_id).and_then(|i| i.event_id.as_deref()) else {
            return Vec::new();
        };

        self.items
            .iter()
            .filter(|i| i.id != item_id && i.event_id.as_deref() == Some(event_id))
            .collect()
    }

    /// Items shown in the snapping stream
    pub fn carousel_items(&self) -> Vec<&ContentItem> {
        self.items.iter().filter(|i| i.is_carousel_eligible()).collect()
    }

    /// Distinct genres in first-seen catalog order, offered at onboarding
    pub fn genres(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.items
            .iter()
            .map(|i| i.genre.as_str())
            .filter(|g| seen.insert(*g))
            .collect()
    }
}
