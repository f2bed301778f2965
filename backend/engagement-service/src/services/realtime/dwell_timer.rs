// ============================================
// Dwell Timer (cancellable one-shot timer)
// ============================================
//
// Runtime-independent start / cancel / fire state machine.
//
// Every start bumps a generation counter and hands out a token. Whoever
// schedules the real wake-up passes that token back to `fire`; a token from an
// earlier generation, or one presented after `cancel`, fires nothing. A timer
// that has fired is disarmed, so a later cancel cannot undo its commit.

use crate::models::ItemId;

/// Proof of a particular `start` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerToken {
    generation: u64,
}

impl TimerToken {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Default)]
pub struct DwellTimer {
    generation: u64,
    armed: Option<(u64, ItemId)>,
}

impl DwellTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the timer for `item_id`, implicitly cancelling any pending one
    pub fn start(&mut self, item_id: ItemId) -> TimerToken {
        self.generation += 1;
        self.armed = Some((self.generation, item_id));
        TimerToken {
            generation: self.generation,
        }
    }

    /// Disarm without firing. Returns the item that was pending, if any.
    pub fn cancel(&mut self) -> Option<ItemId> {
        self.armed.take().map(|(_, item_id)| item_id)
    }

    /// Fire the timer if `token` is the armed generation
    pub fn fire(&mut self, token: TimerToken) -> Option<ItemId> {
        match &self.armed {
            Some((generation, _)) if *generation == token.generation => {
                self.armed.take().map(|(_, item_id)| item_id)
            }
            _ => None,
        }
    }

    pub fn pending(&self) -> Option<&str> {
        self.armed.as_ref().map(|(_, item_id)| item_id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fire_returns_armed_item_once() {
        let mut timer = DwellTimer::new();
        let token = timer.start("a".to_string());

        assert_eq!(timer.pending(), Some("a"));
        assert_eq!(timer.fire(token), Some("a".to_string()));
        assert_eq!(timer.fire(token), None);
        assert_eq!(timer.pending(), None);
    }

    #[test]
    fn test_restart_invalidates_previous_token() {
        let mut timer = DwellTimer::new();
        let first = timer.start("a".to_string());
        let second = timer.start("b".to_string());

        assert_ne!(first.generation(), second.generation());
        assert_eq!(timer.fire(first), None);
        assert_eq!(timer.fire(second), Some("b".to_string()));
    }

    #[test]
    fn test_cancelled_timer_never_fires() {
        let mut timer = DwellTimer::new();
        let token = timer.start("a".to_string());

        assert_eq!(timer.cancel(), Some("a".to_string()));
        assert_eq!(timer.fire(token), None);
    }

    #[test]
    fn test_cancel_after_fire_is_noop() {
        let mut timer = DwellTimer::new();
        let token = timer.start("a".to_string());
        assert!(timer.fire(token).is_some());

        assert_eq!(timer.cancel(), None);
    }
}
