//! Display scheduler - decides when the popup shows.
//!
//! The engine owns the timing decisions (delays anchored at landing or at
//! the last show, quota enforcement, the single-pending-deadline rule);
//! the runtime drives it from one task per widget session.

pub mod engine;
pub mod runtime;
pub mod state;

pub use engine::{AdvanceOutcome, PopupEngine, Reschedule, ShowOutcome};
pub use runtime::{WidgetCommand, WidgetEvent, WidgetHandle, activate};
pub use state::SchedulerState;
