//! Timer controller
//!
//! The `TimerController` owns one [`TimerSession`] and is the only thing
//! that mutates it. It knows nothing about wall-clock time: something else
//! (the [driver](super::driver), or a test) calls [`tick`](TimerController::tick)
//! once per second while the session is running.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::TimerError;
use crate::notify::{NotificationSink, StepAlert, TimerEvent};
use crate::observability::metrics::{self, NavDirection};
use crate::recipe::Recipe;

use super::resolver::{self, StepPosition};
use super::schedule::StepSchedule;
use super::session::{TimerSession, TimerStatus};
use super::water::{self, WaterUsage};

// ============================================================================
// Derived State
// ============================================================================

/// Everything a UI needs to render the timer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimerSnapshot {
    /// Recipe id.
    pub recipe_id: String,
    /// Lifecycle state.
    pub status: TimerStatus,
    /// Seconds counted so far.
    pub elapsed_seconds: u32,
    /// Seconds until the recipe's total time (0 once past it).
    pub remaining_seconds: u32,
    /// Active step.
    pub step_index: usize,
    /// Active step's title.
    pub step_title: String,
    /// Active step's start boundary.
    pub step_start: u32,
    /// Active step's end boundary.
    pub step_end: u32,
    /// Progress through the active step.
    pub step_progress_percent: f64,
    /// Progress through the recipe.
    pub overall_progress_percent: f64,
    /// Water accounting at the active step.
    pub water: WaterUsage,
    /// Whether `go_to_previous_step` would move.
    pub can_go_previous: bool,
    /// Whether `go_to_next_step` would move.
    pub can_go_next: bool,
    /// Overall progress has reached 100%.
    pub is_complete: bool,
}

/// What a processed tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickOutcome {
    /// Elapsed seconds after the tick.
    pub elapsed_seconds: u32,
    /// Active step after the tick.
    pub step_index: usize,
    /// Steps that completed during the tick, ascending.
    pub completed_steps: Vec<usize>,
}

// ============================================================================
// Controller
// ============================================================================

/// Drives one brew of one recipe.
pub struct TimerController {
    recipe: Arc<Recipe>,
    schedule: StepSchedule,
    session: TimerSession,
    sink: Arc<dyn NotificationSink>,
    alert: Arc<dyn StepAlert>,
}

impl std::fmt::Debug for TimerController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerController")
            .field("recipe_id", &self.recipe.id)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl TimerController {
    /// Binds a recipe to a fresh idle session.
    ///
    /// # Errors
    ///
    /// Returns `TimerError::InvalidRecipe` if the recipe has no steps or a
    /// step with zero duration.
    pub fn new(
        recipe: Arc<Recipe>,
        sink: Arc<dyn NotificationSink>,
        alert: Arc<dyn StepAlert>,
    ) -> Result<Self, TimerError> {
        if recipe.steps.is_empty() {
            return Err(TimerError::InvalidRecipe(format!(
                "recipe '{}' has no steps",
                recipe.id
            )));
        }
        if let Some(step) = recipe.steps.iter().find(|s| s.duration_seconds == 0) {
            return Err(TimerError::InvalidRecipe(format!(
                "step {} ('{}') of recipe '{}' has zero duration",
                step.step_index, step.title, recipe.id
            )));
        }

        let schedule = StepSchedule::build(&recipe.steps);
        if schedule.total_time() != recipe.total_time_seconds {
            debug!(
                recipe_id = %recipe.id,
                declared = recipe.total_time_seconds,
                computed = schedule.total_time(),
                "declared total time differs from step durations"
            );
        }

        Ok(Self {
            recipe,
            schedule,
            session: TimerSession::new(),
            sink,
            alert,
        })
    }

    /// The bound recipe.
    #[must_use]
    pub fn recipe(&self) -> &Recipe {
        &self.recipe
    }

    /// The derived step schedule.
    #[must_use]
    pub const fn schedule(&self) -> &StepSchedule {
        &self.schedule
    }

    /// Current session state.
    #[must_use]
    pub const fn session(&self) -> &TimerSession {
        &self.session
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn status(&self) -> TimerStatus {
        self.session.status()
    }

    /// Whether the clock is ticking.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.session.is_running
    }

    // ------------------------------------------------------------------------
    // Clock
    // ------------------------------------------------------------------------

    /// Starts, pauses or resumes the clock and returns the new state.
    ///
    /// Emits `timer_paused`, `recipe_started` (first start only) or
    /// `timer_resumed`.
    pub fn toggle(&mut self) -> TimerStatus {
        if self.session.is_running {
            self.session.is_running = false;
            debug!(elapsed = self.session.elapsed_seconds, "timer paused");
            self.emit(&TimerEvent::TimerPaused {
                recipe_id: self.recipe.id.clone(),
                elapsed_time: self.session.elapsed_seconds,
                step_index: self.session.active_step_index,
            });
        } else {
            self.session.is_running = true;
            if self.session.has_started {
                debug!(elapsed = self.session.elapsed_seconds, "timer resumed");
                self.emit(&TimerEvent::TimerResumed {
                    recipe_id: self.recipe.id.clone(),
                    elapsed_time: self.session.elapsed_seconds,
                    step_index: self.session.active_step_index,
                });
            } else {
                self.session.has_started = true;
                debug!(recipe_id = %self.recipe.id, "recipe started");
                self.emit(&TimerEvent::RecipeStarted {
                    recipe_id: self.recipe.id.clone(),
                    recipe_name: self.recipe.name.clone(),
                    total_time: self.schedule.total_time(),
                });
            }
        }
        self.session.status()
    }

    /// Advances the clock by one second.
    ///
    /// Returns `None` (and changes nothing) unless the clock is running.
    pub fn tick(&mut self) -> Option<TickOutcome> {
        self.advance(1)
    }

    /// Advances the clock by `seconds` at once.
    ///
    /// Every step whose end boundary is crossed gets its own
    /// `step_completed` event and alert, in ascending order, before the
    /// active step is updated.
    pub fn advance(&mut self, seconds: u32) -> Option<TickOutcome> {
        if !self.session.is_running {
            return None;
        }

        let previous = self.session.active_step_index;
        self.session.elapsed_seconds = self.session.elapsed_seconds.saturating_add(seconds);
        let entered = resolver::entered_step_index(&self.schedule, self.session.elapsed_seconds);

        let completed_steps: Vec<usize> = (previous..entered).collect();
        for &index in &completed_steps {
            self.complete_step(index);
        }
        self.session.active_step_index = entered.max(previous);

        metrics::record_tick();
        metrics::set_position(self.session.elapsed_seconds, self.session.active_step_index);

        Some(TickOutcome {
            elapsed_seconds: self.session.elapsed_seconds,
            step_index: self.session.active_step_index,
            completed_steps,
        })
    }

    /// Returns to the idle state at 0 seconds without emitting anything.
    pub fn reset(&mut self) {
        debug!(
            elapsed = self.session.elapsed_seconds,
            step_index = self.session.active_step_index,
            "timer reset"
        );
        self.session = TimerSession::new();
        metrics::set_position(0, 0);
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    /// Whether there is a step before the active one.
    #[must_use]
    pub const fn can_go_to_previous(&self) -> bool {
        self.session.active_step_index > 0
    }

    /// Whether there is a step after the active one.
    #[must_use]
    pub fn can_go_to_next(&self) -> bool {
        self.session.active_step_index < self.schedule.last_index()
    }

    /// Jumps back to the start of the previous step.
    ///
    /// Returns `false` (a no-op) on the first step.
    pub fn go_to_previous_step(&mut self) -> bool {
        if !self.can_go_to_previous() {
            return false;
        }
        let index = self.session.active_step_index - 1;
        self.jump_to(index, self.schedule.start_of(index));
        metrics::record_navigation(NavDirection::Previous);
        true
    }

    /// Jumps forward to the start of the next step.
    ///
    /// Returns `false` (a no-op) on the last step.
    pub fn go_to_next_step(&mut self) -> bool {
        if !self.can_go_to_next() {
            return false;
        }
        let current = self.session.active_step_index;
        self.jump_to(current + 1, self.schedule.end_of(current));
        metrics::record_navigation(NavDirection::Next);
        true
    }

    fn jump_to(&mut self, index: usize, elapsed: u32) {
        debug!(
            from = self.session.active_step_index,
            to = index,
            elapsed,
            "manual step navigation"
        );
        self.session.active_step_index = index;
        self.session.elapsed_seconds = elapsed;
        metrics::set_position(elapsed, index);
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Position of the active step at the current elapsed time.
    #[must_use]
    pub fn position(&self) -> StepPosition {
        resolver::position_at(
            &self.schedule,
            self.session.active_step_index,
            self.session.elapsed_seconds,
        )
    }

    /// Water accounting at the active step.
    #[must_use]
    pub fn water(&self) -> WaterUsage {
        water::compute(&self.schedule, self.session.active_step_index)
    }

    /// Whether elapsed time has reached the end of the recipe.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.session.elapsed_seconds >= self.schedule.total_time()
    }

    /// Derived state for rendering.
    #[must_use]
    pub fn snapshot(&self) -> TimerSnapshot {
        let position = self.position();
        let step_title = self
            .recipe
            .steps
            .get(position.step_index)
            .map(|s| s.title.clone())
            .unwrap_or_default();

        TimerSnapshot {
            recipe_id: self.recipe.id.clone(),
            status: self.status(),
            elapsed_seconds: self.session.elapsed_seconds,
            remaining_seconds: self
                .schedule
                .total_time()
                .saturating_sub(self.session.elapsed_seconds),
            step_index: position.step_index,
            step_title,
            step_start: position.step_start_time,
            step_end: position.step_end_time,
            step_progress_percent: position.step_progress_percent,
            overall_progress_percent: position.overall_progress_percent,
            water: self.water(),
            can_go_previous: self.can_go_to_previous(),
            can_go_next: self.can_go_to_next(),
            is_complete: self.is_complete(),
        }
    }

    // ------------------------------------------------------------------------
    // Side effects
    // ------------------------------------------------------------------------

    fn complete_step(&self, index: usize) {
        let Some(step) = self.recipe.steps.get(index) else {
            return;
        };
        debug!(step_index = index, title = %step.title, "step completed");
        metrics::record_step_completed();

        self.emit(&TimerEvent::StepCompleted {
            recipe_id: self.recipe.id.clone(),
            step_index: index,
            step_duration: step.duration_seconds,
        });

        if let Err(e) = self.alert.step_completed(step) {
            metrics::record_sink_failure("alert");
            warn!(step_index = index, error = %e, "step alert failed");
        }
    }

    fn emit(&self, event: &TimerEvent) {
        if let Err(e) = self.sink.notify(event) {
            metrics::record_sink_failure("notify");
            warn!(event = event.kind(), error = %e, "notification sink failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SinkError;
    use crate::notify::{NoAlert, RecordingSink};
    use proptest::prelude::*;

    fn pour_over() -> Arc<Recipe> {
        Arc::new(Recipe::from_steps(
            "v60",
            "V60",
            &[("Bloom", 45, 70), ("Pour", 45, 50), ("Drain", 45, 60)],
        ))
    }

    fn controller(recipe: Arc<Recipe>) -> (TimerController, Arc<RecordingSink>) {
        let recorder = Arc::new(RecordingSink::new());
        let controller = TimerController::new(
            recipe,
            Arc::clone(&recorder) as Arc<dyn NotificationSink>,
            Arc::clone(&recorder) as Arc<dyn StepAlert>,
        )
        .unwrap();
        (controller, recorder)
    }

    struct Failing;

    impl NotificationSink for Failing {
        fn notify(&self, _event: &TimerEvent) -> Result<(), SinkError> {
            Err(SinkError::Rejected("offline".to_string()))
        }
    }

    impl StepAlert for Failing {
        fn step_completed(&self, _step: &crate::recipe::RecipeStep) -> Result<(), SinkError> {
            Err(SinkError::Rejected("muted".to_string()))
        }
    }

    #[test]
    fn rejects_empty_recipe() {
        let recipe = Arc::new(Recipe::from_steps("e", "E", &[]));
        let err = TimerController::new(recipe, Arc::new(RecordingSink::new()), Arc::new(NoAlert))
            .unwrap_err();
        assert!(matches!(err, TimerError::InvalidRecipe(_)));
    }

    #[test]
    fn rejects_zero_duration() {
        let recipe = Arc::new(Recipe::from_steps("z", "Z", &[("a", 10, 0), ("b", 0, 0)]));
        let err = TimerController::new(recipe, Arc::new(RecordingSink::new()), Arc::new(NoAlert))
            .unwrap_err();
        assert!(err.to_string().contains("zero duration"));
    }

    #[test]
    fn toggle_emits_started_then_paused_then_resumed() {
        let (mut c, rec) = controller(pour_over());
        assert_eq!(c.status(), TimerStatus::Idle);
        assert_eq!(c.toggle(), TimerStatus::Running);
        c.tick();
        assert_eq!(c.toggle(), TimerStatus::Paused);
        assert_eq!(c.toggle(), TimerStatus::Running);
        assert_eq!(
            rec.kinds(),
            vec!["recipe_started", "timer_paused", "timer_resumed"]
        );
        assert_eq!(
            rec.events()[1],
            TimerEvent::TimerPaused {
                recipe_id: "v60".to_string(),
                elapsed_time: 1,
                step_index: 0,
            }
        );
    }

    #[test]
    fn tick_is_ignored_unless_running() {
        let (mut c, rec) = controller(pour_over());
        assert!(c.tick().is_none());
        assert_eq!(c.session().elapsed_seconds, 0);
        c.toggle();
        c.toggle();
        assert!(c.tick().is_none());
        assert_eq!(c.session().elapsed_seconds, 0);
        assert_eq!(rec.kinds(), vec!["recipe_started", "timer_paused"]);
    }

    #[test]
    fn crossing_first_boundary() {
        let (mut c, rec) = controller(pour_over());
        c.toggle();
        for _ in 0..44 {
            let outcome = c.tick().unwrap();
            assert!(outcome.completed_steps.is_empty());
        }
        assert_eq!(c.snapshot().water.used_ml, 70);

        let outcome = c.tick().unwrap();
        assert_eq!(outcome.completed_steps, vec![0]);
        assert_eq!(outcome.elapsed_seconds, 45);

        let snap = c.snapshot();
        assert_eq!(snap.step_index, 1);
        assert_eq!(snap.water.used_ml, 120);
        assert_eq!(snap.step_start, 45);
        assert_eq!(snap.step_title, "Pour");
        assert_eq!(
            rec.events().last().unwrap(),
            &TimerEvent::StepCompleted {
                recipe_id: "v60".to_string(),
                step_index: 0,
                step_duration: 45,
            }
        );
        assert_eq!(rec.alerts(), vec![0]);
    }

    #[test]
    fn advance_completes_skipped_steps_in_order() {
        let recipe = Arc::new(Recipe::from_steps(
            "fast",
            "Fast",
            &[("a", 1, 10), ("b", 1, 10), ("c", 1, 10), ("d", 10, 10)],
        ));
        let (mut c, rec) = controller(recipe);
        c.toggle();
        let outcome = c.advance(3).unwrap();
        assert_eq!(outcome.completed_steps, vec![0, 1, 2]);
        assert_eq!(outcome.step_index, 3);
        assert_eq!(rec.alerts(), vec![0, 1, 2]);

        let completed: Vec<_> = rec
            .events()
            .into_iter()
            .filter_map(|e| match e {
                TimerEvent::StepCompleted { step_index, .. } => Some(step_index),
                _ => None,
            })
            .collect();
        assert_eq!(completed, vec![0, 1, 2]);
    }

    #[test]
    fn last_step_never_completes_and_clock_keeps_running() {
        let (mut c, rec) = controller(pour_over());
        c.toggle();
        c.advance(135).unwrap();
        assert!(c.is_complete());
        c.advance(20).unwrap();
        let snap = c.snapshot();
        assert_eq!(snap.elapsed_seconds, 155);
        assert_eq!(snap.step_index, 2);
        assert!((snap.overall_progress_percent - 100.0).abs() < f64::EPSILON);
        assert_eq!(snap.remaining_seconds, 0);
        assert_eq!(snap.status, TimerStatus::Running);
        assert_eq!(rec.alerts(), vec![0, 1]);
    }

    #[test]
    fn reset_clears_session_silently() {
        let (mut c, rec) = controller(pour_over());
        c.toggle();
        c.advance(100).unwrap();
        assert_eq!(c.session().active_step_index, 2);
        let before = rec.events().len();

        c.reset();
        assert_eq!(c.session(), &TimerSession::new());
        assert_eq!(c.status(), TimerStatus::Idle);
        assert_eq!(rec.events().len(), before);

        c.toggle();
        assert_eq!(rec.kinds().last(), Some(&"recipe_started"));
    }

    #[test]
    fn navigation_moves_clock_to_boundaries() {
        let (mut c, rec) = controller(pour_over());
        assert!(c.go_to_next_step());
        assert_eq!(c.session().elapsed_seconds, 45);
        assert_eq!(c.session().active_step_index, 1);
        assert!(c.go_to_next_step());
        assert_eq!(c.session().elapsed_seconds, 90);
        assert!(c.go_to_previous_step());
        assert_eq!(c.session().elapsed_seconds, 45);
        assert_eq!(c.session().active_step_index, 1);
        assert!(c.go_to_previous_step());
        assert_eq!(c.session().elapsed_seconds, 0);
        assert!(!c.is_running());
        assert!(rec.events().is_empty());
    }

    #[test]
    fn navigation_no_ops_at_the_ends() {
        let (mut c, _) = controller(pour_over());
        assert!(!c.can_go_to_previous());
        assert!(!c.go_to_previous_step());
        assert_eq!(c.session(), &TimerSession::new());

        c.go_to_next_step();
        c.go_to_next_step();
        let before = c.session().clone();
        assert!(!c.can_go_to_next());
        assert!(!c.go_to_next_step());
        assert_eq!(c.session(), &before);
    }

    #[test]
    fn next_then_tick_does_not_complete_skipped_step() {
        let (mut c, rec) = controller(pour_over());
        c.toggle();
        c.go_to_next_step();
        let outcome = c.tick().unwrap();
        assert!(outcome.completed_steps.is_empty());
        assert_eq!(outcome.step_index, 1);
        assert_eq!(outcome.elapsed_seconds, 46);
        assert_eq!(rec.kinds(), vec!["recipe_started"]);
    }

    #[test]
    fn sink_failures_do_not_disturb_the_clock() {
        let failing = Arc::new(Failing);
        let mut c = TimerController::new(
            pour_over(),
            Arc::clone(&failing) as Arc<dyn NotificationSink>,
            failing as Arc<dyn StepAlert>,
        )
        .unwrap();
        c.toggle();
        let outcome = c.advance(50).unwrap();
        assert_eq!(outcome.completed_steps, vec![0]);
        assert_eq!(c.session().elapsed_seconds, 50);
        assert_eq!(c.status(), TimerStatus::Running);
    }

    #[test]
    fn snapshot_serializes() {
        let (c, _) = controller(pour_over());
        let json = serde_json::to_value(c.snapshot()).unwrap();
        assert_eq!(json["status"], "idle");
        assert_eq!(json["water"]["total_ml"], 180);
        assert_eq!(json["can_go_next"], true);
    }

    #[test]
    fn started_event_reports_scheduled_total() {
        let mut recipe = Recipe::from_steps("v60", "V60", &[("Bloom", 45, 70), ("Pour", 45, 50)]);
        recipe.total_time_seconds = 999;
        let (mut c, events) = controller(Arc::new(recipe));
        c.toggle();
        assert_eq!(
            events.events()[0],
            TimerEvent::RecipeStarted {
                recipe_id: "v60".to_string(),
                recipe_name: "V60".to_string(),
                total_time: 90,
            }
        );
        assert_eq!(c.snapshot().remaining_seconds, 90);
    }

    proptest! {
        #[test]
        fn ticking_is_monotonic_and_completes_each_step_once(
            durations in prop::collection::vec(1u32..20, 1..6),
            ticks in 0usize..150,
        ) {
            let steps: Vec<(&str, u32, u32)> = durations.iter().map(|&d| ("s", d, 5)).collect();
            let (mut c, rec) = controller(Arc::new(Recipe::from_steps("p", "P", &steps)));
            c.toggle();

            let mut previous = c.session().clone();
            for _ in 0..ticks {
                c.tick().unwrap();
                let now = c.session();
                prop_assert_eq!(now.elapsed_seconds, previous.elapsed_seconds + 1);
                prop_assert!(now.active_step_index >= previous.active_step_index);
                previous = now.clone();
            }

            let alerts = rec.alerts();
            let expected: Vec<usize> = (0..c.session().active_step_index).collect();
            prop_assert_eq!(alerts, expected);
        }
    }
}
