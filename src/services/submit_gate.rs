//! Guard deciding whether a wizard step may be shown.

use crate::models::{MAX_STEP, Step};

/// What the step tracker knows about the add-on behind a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    /// Steps 1 and 2 run before an add-on exists.
    NoAddon,
    /// The add-on exists but its submission is no longer tracked.
    Missing,
    /// Persisted step of an unfinished submission.
    Stored(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Proceed(Step),
    Redirect(i32),
}

/// Decide what happens to a request for wizard step `declared`.
///
/// An add-on without a tracker row has finished its submission, so only the
/// final page is reachable for it.
pub fn gate(declared: i32, tracker: TrackerState) -> GateDecision {
    match tracker {
        TrackerState::NoAddon => GateDecision::Proceed(Step {
            current: declared,
            max: MAX_STEP,
        }),
        TrackerState::Stored(stored) if stored < declared => GateDecision::Redirect(stored),
        TrackerState::Stored(stored) => GateDecision::Proceed(Step {
            current: declared,
            max: stored,
        }),
        TrackerState::Missing if declared != MAX_STEP => GateDecision::Redirect(MAX_STEP),
        TrackerState::Missing => GateDecision::Proceed(Step {
            current: MAX_STEP,
            max: MAX_STEP,
        }),
    }
}

impl From<Option<i32>> for TrackerState {
    fn from(stored: Option<i32>) -> Self {
        match stored {
            Some(step) => TrackerState::Stored(step),
            None => TrackerState::Missing,
        }
    }
}

/// Step the tracker moves to after `completed` succeeds, if it moves at all.
pub fn next_tracked_step(completed: i32) -> Option<i32> {
    (3..=5).contains(&completed).then_some(completed + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proceed(current: i32, max: i32) -> GateDecision {
        GateDecision::Proceed(Step { current, max })
    }

    #[test]
    fn test_no_addon_proceeds_with_full_range() {
        assert_eq!(gate(1, TrackerState::NoAddon), proceed(1, 7));
        assert_eq!(gate(2, TrackerState::NoAddon), proceed(2, 7));
    }

    #[test]
    fn test_stored_step_behind_redirects_back() {
        assert_eq!(gate(5, TrackerState::Stored(3)), GateDecision::Redirect(3));
        assert_eq!(gate(4, TrackerState::Stored(3)), GateDecision::Redirect(3));
    }

    #[test]
    fn test_revisiting_earlier_step_is_allowed() {
        assert_eq!(gate(3, TrackerState::Stored(5)), proceed(3, 5));
        assert_eq!(gate(5, TrackerState::Stored(5)), proceed(5, 5));
    }

    #[test]
    fn test_untracked_addon_is_sent_to_done() {
        for step in 3..=6 {
            assert_eq!(gate(step, TrackerState::Missing), GateDecision::Redirect(7));
        }
        assert_eq!(gate(7, TrackerState::Missing), proceed(7, 7));
    }

    #[test]
    fn test_done_page_with_tracker_row_behind() {
        assert_eq!(gate(7, TrackerState::Stored(4)), GateDecision::Redirect(4));
    }

    #[test]
    fn test_next_tracked_step() {
        assert_eq!(next_tracked_step(3), Some(4));
        assert_eq!(next_tracked_step(5), Some(6));
        assert_eq!(next_tracked_step(2), None);
        assert_eq!(next_tracked_step(6), None);
    }

    #[test]
    fn test_tracker_state_from_row() {
        assert_eq!(TrackerState::from(Some(4)), TrackerState::Stored(4));
        assert_eq!(TrackerState::from(None), TrackerState::Missing);
    }
}
