//! Mutable per-brew state.

use serde::Serialize;

/// Lifecycle state of a timer session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerStatus {
    /// Never started, or reset.
    Idle,
    /// The clock is ticking.
    Running,
    /// Started and then paused.
    Paused,
}

impl std::fmt::Display for TimerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Paused => write!(f, "paused"),
        }
    }
}

/// State of one active brew.
///
/// Only the controller mutates it. `active_step_index` is a cache of the
/// step the clock has entered, kept so transitions can be detected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerSession {
    /// Seconds counted while running.
    pub elapsed_seconds: u32,
    /// Whether the clock is ticking.
    pub is_running: bool,
    /// Step the session is on.
    pub active_step_index: usize,
    /// Whether `recipe_started` has already been emitted.
    pub has_started: bool,
}

impl TimerSession {
    /// Creates a fresh idle session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Derived lifecycle state.
    #[must_use]
    pub const fn status(&self) -> TimerStatus {
        match (self.is_running, self.has_started) {
            (true, _) => TimerStatus::Running,
            (false, true) => TimerStatus::Paused,
            (false, false) => TimerStatus::Idle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_derivation() {
        let mut session = TimerSession::new();
        assert_eq!(session.status(), TimerStatus::Idle);
        session.is_running = true;
        session.has_started = true;
        assert_eq!(session.status(), TimerStatus::Running);
        session.is_running = false;
        assert_eq!(session.status(), TimerStatus::Paused);
        assert_eq!(session.status().to_string(), "paused");
    }
}
