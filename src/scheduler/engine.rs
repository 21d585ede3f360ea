//! Display scheduling engine.
//!
//! Pure decision core of the widget: given change events, deadline fires
//! and user input, it decides when the popup shows, enforces the display
//! quota, and drives the presentation steps. It never sleeps itself; every
//! operation takes `now` and either acts synchronously or hands back the
//! absolute instant the runtime should arm its single deadline for.

use tokio::time::Instant;

use super::state::SchedulerState;
use crate::domain::{PopupConfiguration, ResponseRecord};
use crate::presentation::{PopupView, Presentation, Step};
use crate::session::{ClientStore, DISPLAY_COUNT_KEY};

/// Result of a display attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowOutcome {
    /// Popup became visible
    Shown,
    /// No current configuration (stale trigger after a removal)
    NoConfig,
    /// Popup is already on screen
    AlreadyVisible,
    /// Display quota for this session is spent
    QuotaExhausted,
}

impl ShowOutcome {
    /// Whether the popup actually became visible.
    pub fn shown(&self) -> bool {
        matches!(self, ShowOutcome::Shown)
    }
}

/// Result of applying a configuration snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reschedule {
    /// Arm the single pending deadline for this instant
    Armed(Instant),
    /// The target had already passed; the show attempt ran synchronously
    Fired(ShowOutcome),
}

/// Result of the advance control.
#[derive(Debug, Clone, PartialEq)]
pub enum AdvanceOutcome {
    /// Popup is not on screen; nothing to advance
    NotVisible,
    /// Rating step with no rating recorded; no transition
    Rejected,
    /// Moved from the rating step to the review step
    MovedToReview,
    /// Review submitted: popup hidden, record ready for the sink, and the
    /// next frequency-based deadline to arm
    Submitted {
        record: ResponseRecord,
        next_deadline: Instant,
    },
}

/// The widget's display scheduler.
///
/// Owns all session-scoped state; single-threaded by construction (the
/// runtime drives it from one task, one event at a time).
pub struct PopupEngine<S: ClientStore> {
    tenant: String,
    session: S,
    config: Option<PopupConfiguration>,
    state: SchedulerState,
    presentation: Presentation,
}

impl<S: ClientStore> PopupEngine<S> {
    /// Create an engine for one session, anchored at `landed_at`.
    pub fn new(tenant: impl Into<String>, session: S, landed_at: Instant) -> Self {
        Self {
            tenant: tenant.into(),
            session,
            config: None,
            state: SchedulerState::new(landed_at),
            presentation: Presentation::new(),
        }
    }

    /// Apply a configuration snapshot (initial delivery or live change).
    ///
    /// Recomputes the wait from the original anchor so the user experiences
    /// the delay the latest configuration would have produced had it been
    /// in effect the whole time. Returns where the runtime's single
    /// deadline must point, or the outcome of the synchronous show attempt
    /// when the recomputed target has already passed.
    pub fn apply_config(&mut self, config: PopupConfiguration, now: Instant) -> Reschedule {
        log::debug!(
            "Applying configuration for tenant {} (first_load={})",
            self.tenant,
            self.state.first_load
        );

        let base = if self.state.first_load {
            config.wait_delay()
        } else {
            config.frequency_delay()
        };
        self.config = Some(config);
        self.ensure_display_count();

        let target = self.state.anchor() + base;
        if target <= now {
            Reschedule::Fired(self.attempt_show(now))
        } else {
            Reschedule::Armed(target)
        }
    }

    /// The armed deadline fired.
    pub fn deadline_fired(&mut self, now: Instant) -> ShowOutcome {
        self.attempt_show(now)
    }

    /// The configuration record was removed.
    ///
    /// Hides the popup unconditionally and clears the snapshot; a deadline
    /// already armed may still fire later, but [`Self::deadline_fired`]
    /// will find no configuration and do nothing.
    pub fn config_removed(&mut self) {
        log::debug!("Configuration removed for tenant {}", self.tenant);
        self.config = None;
        self.state.visible = false;
        self.presentation.reset();
    }

    /// Record a rating; only meaningful while the rating step is showing.
    pub fn set_rating(&mut self, rating: u8) {
        if self.state.visible && self.presentation.step == Step::Rating {
            self.presentation.set_rating(rating);
        }
    }

    /// Replace the review text; only meaningful while the review step is
    /// showing.
    pub fn set_review(&mut self, review: impl Into<String>) {
        if self.state.visible && self.presentation.step == Step::Review {
            self.presentation.set_review(review);
        }
    }

    /// Drive the advance control.
    ///
    /// Submission hides the popup optimistically and arms the next wait a
    /// full display frequency from the submission instant.
    pub fn advance(&mut self, now: Instant) -> AdvanceOutcome {
        if !self.state.visible {
            return AdvanceOutcome::NotVisible;
        }
        match self.presentation.step {
            Step::Rating => {
                if !self.presentation.can_advance() {
                    log::debug!("Advance rejected: no rating recorded");
                    return AdvanceOutcome::Rejected;
                }
                self.presentation.step = Step::Review;
                AdvanceOutcome::MovedToReview
            }
            Step::Review => {
                let Some(config) = self.config.as_ref() else {
                    // Configuration vanished mid-dialog; treat as hidden.
                    self.state.visible = false;
                    return AdvanceOutcome::NotVisible;
                };
                self.state.visible = false;
                let record = ResponseRecord::new(
                    self.tenant.clone(),
                    self.presentation.rating,
                    self.presentation.review.clone(),
                );
                AdvanceOutcome::Submitted {
                    record,
                    next_deadline: now + config.frequency_delay(),
                }
            }
        }
    }

    /// Gate and perform a display attempt.
    ///
    /// The single path by which the popup becomes visible. Every miss is a
    /// logged no-op: absent configuration, popup already visible, or
    /// display quota spent.
    fn attempt_show(&mut self, now: Instant) -> ShowOutcome {
        let Some(config) = self.config.as_ref() else {
            log::debug!("Display trigger with no configuration, ignoring");
            return ShowOutcome::NoConfig;
        };
        if self.state.visible {
            log::debug!("Display trigger while already visible, ignoring");
            return ShowOutcome::AlreadyVisible;
        }
        let count = self.display_count();
        if count >= config.max_display {
            log::debug!(
                "Display quota reached ({}/{}), ignoring",
                count,
                config.max_display
            );
            return ShowOutcome::QuotaExhausted;
        }

        self.presentation.reset();
        self.set_display_count(count + 1);
        self.state.first_load = false;
        self.state.last_shown_at = Some(now);
        self.state.visible = true;
        log::info!(
            "Showing popup for tenant {} (display {}/{})",
            self.tenant,
            count + 1,
            config.max_display
        );
        ShowOutcome::Shown
    }

    /// Completed presentations this session.
    pub fn display_count(&self) -> u32 {
        self.session
            .get(DISPLAY_COUNT_KEY)
            .ok()
            .flatten()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    fn set_display_count(&self, count: u32) {
        if let Err(e) = self.session.set(DISPLAY_COUNT_KEY, &count.to_string()) {
            log::error!("Failed to persist display count: {}", e);
        }
    }

    fn ensure_display_count(&self) {
        match self.session.get(DISPLAY_COUNT_KEY) {
            Ok(None) => self.set_display_count(0),
            Ok(Some(_)) => {}
            Err(e) => log::error!("Failed to read display count: {}", e),
        }
    }

    /// Snapshot of the visible dialog, if any.
    pub fn view(&self) -> Option<PopupView> {
        if !self.state.visible {
            return None;
        }
        let config = self.config.as_ref()?;
        let title = match self.presentation.step {
            Step::Rating => config.rating_title(),
            Step::Review => config.comment_title(),
        };
        Some(PopupView {
            title: title.to_string(),
            placeholder: config.placeholder().to_string(),
            step: self.presentation.step,
            rating: self.presentation.rating,
            review: self.presentation.review.clone(),
        })
    }

    /// Whether the popup is currently presented.
    pub fn visible(&self) -> bool {
        self.state.visible
    }

    /// Whether the first presentation has not happened yet.
    pub fn first_load(&self) -> bool {
        self.state.first_load
    }

    /// Current presentation step.
    pub fn step(&self) -> Step {
        self.presentation.step
    }

    /// Current configuration snapshot.
    pub fn config(&self) -> Option<&PopupConfiguration> {
        self.config.as_ref()
    }

    /// Tenant this engine is bound to.
    pub fn tenant(&self) -> &str {
        &self.tenant
    }
}
