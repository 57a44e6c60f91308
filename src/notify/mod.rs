//! Timer side effects.
//!
//! The controller reports what happens during a brew through two injected
//! collaborators: a [`NotificationSink`] that receives every [`TimerEvent`],
//! and a [`StepAlert`] that is poked once per completed step. Both are
//! best-effort. A returned [`SinkError`] is logged by the controller and
//! never reaches the timer's own state.

pub mod sinks;

use serde::Serialize;

use crate::error::SinkError;
use crate::recipe::RecipeStep;

pub use sinks::{FanOut, NoAlert, RecordingSink, TerminalBell, TracingSink};

// ============================================================================
// Events
// ============================================================================

/// Something observable that happened to a timer session.
///
/// Serialized with a `"type"` tag holding [`kind`](Self::kind).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimerEvent {
    /// First transition to running.
    RecipeStarted {
        /// Recipe id.
        recipe_id: String,
        /// Recipe display name.
        recipe_name: String,
        /// Total brew time in seconds.
        total_time: u32,
    },

    /// Running to paused.
    TimerPaused {
        /// Recipe id.
        recipe_id: String,
        /// Elapsed seconds when paused.
        elapsed_time: u32,
        /// Active step when paused.
        step_index: usize,
    },

    /// Paused to running.
    TimerResumed {
        /// Recipe id.
        recipe_id: String,
        /// Elapsed seconds when resumed.
        elapsed_time: u32,
        /// Active step when resumed.
        step_index: usize,
    },

    /// The clock crossed a step's end boundary.
    StepCompleted {
        /// Recipe id.
        recipe_id: String,
        /// Step that closed.
        step_index: usize,
        /// That step's own duration in seconds.
        step_duration: u32,
    },
}

impl TimerEvent {
    /// Wire name of the event.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::RecipeStarted { .. } => "recipe_started",
            Self::TimerPaused { .. } => "timer_paused",
            Self::TimerResumed { .. } => "timer_resumed",
            Self::StepCompleted { .. } => "step_completed",
        }
    }

    /// Recipe the event belongs to.
    #[must_use]
    pub fn recipe_id(&self) -> &str {
        match self {
            Self::RecipeStarted { recipe_id, .. }
            | Self::TimerPaused { recipe_id, .. }
            | Self::TimerResumed { recipe_id, .. }
            | Self::StepCompleted { recipe_id, .. } => recipe_id,
        }
    }
}

// ============================================================================
// Collaborator Traits
// ============================================================================

/// Receives timer events.
///
/// Called synchronously from the timer loop, so implementations must not
/// block. The return value is only inspected for logging.
pub trait NotificationSink: Send + Sync {
    /// Delivers one event.
    ///
    /// # Errors
    ///
    /// Returns a [`SinkError`] if delivery failed.
    fn notify(&self, event: &TimerEvent) -> Result<(), SinkError>;
}

/// Audible or visual cue fired when a step completes.
pub trait StepAlert: Send + Sync {
    /// Signals that `step` has just completed.
    ///
    /// # Errors
    ///
    /// Returns a [`SinkError`] if the alert could not be raised.
    fn step_completed(&self, step: &RecipeStep) -> Result<(), SinkError>;
}
