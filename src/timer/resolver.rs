//! Elapsed time to step position.
//!
//! Two boundary conventions coexist here. [`resolve`] attributes a boundary
//! second to the step it closes (`elapsed == end` is still that step).
//! [`entered_step_index`] treats the boundary as the start of the next step,
//! which is what the controller uses to decide that a step has completed.

use serde::Serialize;

use super::schedule::StepSchedule;

/// Where a given elapsed time falls within a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StepPosition {
    /// Active step.
    pub step_index: usize,
    /// Elapsed time at which the step starts.
    pub step_start_time: u32,
    /// Elapsed time at which the step ends.
    pub step_end_time: u32,
    /// Progress through the step, `0.0..=100.0`.
    pub step_progress_percent: f64,
    /// Progress through the whole recipe, `0.0..=100.0`.
    pub overall_progress_percent: f64,
}

/// Resolves `elapsed` to a step position.
///
/// The step index is the number of steps whose end lies strictly before
/// `elapsed`, pinned to the last step once the recipe has run out.
#[must_use]
pub fn resolve(schedule: &StepSchedule, elapsed: u32) -> StepPosition {
    let passed = schedule
        .cumulative_end_time()
        .iter()
        .take_while(|&&end| end < elapsed)
        .count();
    position_at(schedule, passed.min(schedule.last_index()), elapsed)
}

/// Index of the step whose start boundary `elapsed` has reached.
///
/// Differs from [`resolve`] only on exact boundaries: at `elapsed == end`
/// of step `i` this returns `i + 1` (unless `i` is the last step).
#[must_use]
pub fn entered_step_index(schedule: &StepSchedule, elapsed: u32) -> usize {
    schedule
        .cumulative_end_time()
        .iter()
        .take_while(|&&end| end <= elapsed)
        .count()
        .min(schedule.last_index())
}

/// Computes the position record for an explicitly chosen step.
#[must_use]
pub fn position_at(schedule: &StepSchedule, step_index: usize, elapsed: u32) -> StepPosition {
    let step_index = step_index.min(schedule.last_index());
    let step_start_time = schedule.start_of(step_index);
    let step_end_time = schedule.end_of(step_index);

    StepPosition {
        step_index,
        step_start_time,
        step_end_time,
        step_progress_percent: percent(
            elapsed.saturating_sub(step_start_time),
            step_end_time.saturating_sub(step_start_time),
        ),
        overall_progress_percent: percent(elapsed, schedule.total_time()),
    }
}

/// `part / whole * 100` clamped to `0..=100`; 0 when `whole` is 0.
fn percent(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (f64::from(part) / f64::from(whole) * 100.0).clamp(0.0, 100.0)
}
