//! Water accounting.

use serde::Serialize;

use super::schedule::StepSchedule;

/// Water poured so far, in total, and still to pour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WaterUsage {
    /// Poured through the end of the active step.
    pub used_ml: u32,
    /// Total for the recipe.
    pub total_ml: u32,
    /// `total_ml - used_ml`.
    pub remaining_ml: u32,
}

/// Computes water usage with `active_step_index` counted as poured.
#[must_use]
pub fn compute(schedule: &StepSchedule, active_step_index: usize) -> WaterUsage {
    let water = schedule.cumulative_water();
    let used_ml = water
        .get(active_step_index.min(schedule.last_index()))
        .copied()
        .unwrap_or(0);
    let total_ml = schedule.total_water();
    WaterUsage {
        used_ml,
        total_ml,
        remaining_ml: total_ml.saturating_sub(used_ml),
    }
}
