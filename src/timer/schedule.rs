//! Cumulative step boundaries.

use crate::recipe::RecipeStep;

/// Cumulative end times and water totals for a recipe's steps.
///
/// Built once per timer session and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSchedule {
    cumulative_end_time: Vec<u32>,
    cumulative_water: Vec<u32>,
}

impl StepSchedule {
    /// Builds the schedule with a single running sum over `steps`.
    ///
    /// `steps` must be non-empty with every duration at least 1 second.
    /// Callers validate this before a session exists; here it is only
    /// checked in debug builds.
    #[must_use]
    pub fn build(steps: &[RecipeStep]) -> Self {
        debug_assert!(!steps.is_empty(), "schedule needs at least one step");
        debug_assert!(
            steps.iter().all(|s| s.duration_seconds >= 1),
            "step durations must be positive"
        );

        let mut cumulative_end_time = Vec::with_capacity(steps.len());
        let mut cumulative_water = Vec::with_capacity(steps.len());
        let (mut time, mut water) = (0u32, 0u32);
        for step in steps {
            time = time.saturating_add(step.duration_seconds);
            water = water.saturating_add(step.water_amount_ml);
            cumulative_end_time.push(time);
            cumulative_water.push(water);
        }

        Self {
            cumulative_end_time,
            cumulative_water,
        }
    }

    /// Elapsed time at which each step ends.
    #[must_use]
    pub fn cumulative_end_time(&self) -> &[u32] {
        &self.cumulative_end_time
    }

    /// Water poured through the end of each step.
    #[must_use]
    pub fn cumulative_water(&self) -> &[u32] {
        &self.cumulative_water
    }

    /// Number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cumulative_end_time.len()
    }

    /// Always `false` for a schedule built from a valid recipe.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cumulative_end_time.is_empty()
    }

    /// Index of the final step.
    #[must_use]
    pub fn last_index(&self) -> usize {
        self.len().saturating_sub(1)
    }

    /// Sum of all step durations.
    #[must_use]
    pub fn total_time(&self) -> u32 {
        self.cumulative_end_time.last().copied().unwrap_or(0)
    }

    /// Sum of all step water amounts.
    #[must_use]
    pub fn total_water(&self) -> u32 {
        self.cumulative_water.last().copied().unwrap_or(0)
    }

    /// Start boundary of step `index` (clamped to the last step).
    #[must_use]
    pub fn start_of(&self, index: usize) -> u32 {
        let index = index.min(self.last_index());
        if index == 0 {
            0
        } else {
            self.cumulative_end_time[index - 1]
        }
    }

    /// End boundary of step `index` (clamped to the last step).
    #[must_use]
    pub fn end_of(&self, index: usize) -> u32 {
        self.cumulative_end_time
            .get(index.min(self.last_index()))
            .copied()
            .unwrap_or(0)
    }
}
