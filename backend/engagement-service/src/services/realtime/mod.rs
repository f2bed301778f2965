// ============================================
// Real-time Read Detection Module
// ============================================
//
// Dwell-based "read" detection over a snapping item stream:
// 1. Visibility reports pick the single item in focus
// 2. A focus change restarts a one-shot dwell timer
// 3. A timer that fires undisturbed commits the item to the read set
// 4. Leaving the stream cancels whatever is pending

pub mod dwell_timer;
pub mod focus_tracker;
pub mod read_tracker;

pub use dwell_timer::{DwellTimer, TimerToken};
pub use focus_tracker::{FocusTracker, VisibilityEvent};
pub use read_tracker::ReadStateTracker;
