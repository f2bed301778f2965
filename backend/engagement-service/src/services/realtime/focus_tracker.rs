// ============================================
// Focus Tracker
// ============================================
//
// Turns raw visibility reports into a single "in focus" item.
//
// - An item is focused when it covers at least the focus threshold of the viewport
// - The most recent focused report wins; in a batch that is the last one in stream order
// - Reports that an item is *not* focused never move focus
// - A focus change restarts the dwell timer for the new item

use super::dwell_timer::{DwellTimer, TimerToken};
use crate::models::ItemId;
use serde::{Deserialize, Serialize};

/// One visibility report from the scrolling stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibilityEvent {
    pub item_id: ItemId,
    pub is_focused: bool,
}

impl VisibilityEvent {
    pub fn new(item_id: impl Into<ItemId>, is_focused: bool) -> Self {
        Self {
            item_id: item_id.into(),
            is_focused,
        }
    }

    /// Build from an intersection ratio in [0, 1]
    pub fn from_ratio(item_id: impl Into<ItemId>, ratio: f64, threshold: f64) -> Self {
        Self::new(item_id, ratio >= threshold)
    }
}

#[derive(Debug, Default)]
pub struct FocusTracker {
    current_focus: Option<ItemId>,
    timer: DwellTimer,
}

impl FocusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_focus(&self) -> Option<&str> {
        self.current_focus.as_deref()
    }

    pub fn pending(&self) -> Option<&str> {
        self.timer.pending()
    }

    /// Apply a single report. Returns a token when a new dwell timer must be scheduled.
    pub fn on_visibility_change(&mut self, item_id: &str, is_focused: bool) -> Option<TimerToken> {
        if !is_focused || self.current_focus.as_deref() == Some(item_id) {
            return None;
        }

        self.current_focus = Some(item_id.to_string());
        Some(self.timer.start(item_id.to_string()))
    }

    /// Apply a batch of reports delivered together
    pub fn observe_batch(&mut self, events: &[VisibilityEvent]) -> Option<TimerToken> {
        let last_focused = events.iter().rev().find(|e| e.is_focused)?;
        self.on_visibility_change(&last_focused.item_id, true)
    }

    /// Timer callback; yields the item to commit if the token is still current
    pub fn fire(&mut self, token: TimerToken) -> Option<ItemId> {
        self.timer.fire(token)
    }

    /// Stop observing. Focus is forgotten and nothing pending is committed.
    pub fn teardown(&mut self) -> Option<ItemId> {
        self.current_focus = None;
        self.timer.cancel()
    }
}
