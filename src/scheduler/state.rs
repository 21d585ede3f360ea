//! Scheduler timing state.

use tokio::time::Instant;

/// Timing state owned by one widget session.
///
/// `landed_at` is captured once at activation and anchors the first wait;
/// after the first successful presentation `last_shown_at` takes over as
/// the anchor. The pending deadline itself is not stored here: the runtime
/// holds it as its single armed sleep, so re-arming structurally replaces
/// the previous one.
#[derive(Debug, Clone)]
pub struct SchedulerState {
    /// Instant the session began (subscription start)
    pub landed_at: Instant,
    /// Instant of the most recent successful presentation
    pub last_shown_at: Option<Instant>,
    /// True until the first successful presentation this session
    pub first_load: bool,
    /// Whether the popup is currently presented
    pub visible: bool,
}

impl SchedulerState {
    /// Fresh state for a session starting at `landed_at`.
    pub fn new(landed_at: Instant) -> Self {
        Self {
            landed_at,
            last_shown_at: None,
            first_load: true,
            visible: false,
        }
    }

    /// The instant delays are measured from: `landed_at` before the first
    /// show, `last_shown_at` afterwards.
    pub fn anchor(&self) -> Instant {
        if self.first_load {
            self.landed_at
        } else {
            self.last_shown_at.unwrap_or(self.landed_at)
        }
    }
}
