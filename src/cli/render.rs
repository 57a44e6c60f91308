//! Terminal rendering helpers.

use std::fmt::Write as _;

use crate::recipe::Recipe;
use crate::timer::{StepSchedule, TimerSnapshot};

/// Width of the progress bar in cells.
const BAR_WIDTH: usize = 20;

/// Formats seconds as `MM:SS`; hours roll into minutes (`75:00`).
#[must_use]
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Renders a fixed-width bar for `percent` (clamped to 0..=100).
#[must_use]
pub fn progress_bar(percent: f64, width: usize) -> String {
    let percent = percent.clamp(0.0, 100.0);
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let filled = ((percent / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

/// One status line for the running timer.
#[must_use]
pub fn status_line(snapshot: &TimerSnapshot, step_count: usize) -> String {
    format!(
        "{} {} {:>3.0}%  step {}/{} {:<20}  water {}/{} ml  [{}]",
        format_clock(snapshot.elapsed_seconds),
        progress_bar(snapshot.overall_progress_percent, BAR_WIDTH),
        snapshot.overall_progress_percent,
        snapshot.step_index + 1,
        step_count,
        snapshot.step_title,
        snapshot.water.used_ml,
        snapshot.water.total_ml,
        snapshot.status,
    )
}

/// Step table with cumulative end times and water.
#[must_use]
pub fn schedule_table(recipe: &Recipe, schedule: &StepSchedule) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", recipe.name, recipe.id);
    let _ = writeln!(
        out,
        "{:>3}  {:<24} {:>8} {:>8} {:>8} {:>9}",
        "#", "step", "duration", "ends at", "water", "poured"
    );
    for (step, (end, water)) in recipe.steps.iter().zip(
        schedule
            .cumulative_end_time()
            .iter()
            .zip(schedule.cumulative_water()),
    ) {
        let _ = writeln!(
            out,
            "{:>3}  {:<24} {:>8} {:>8} {:>5} ml {:>6} ml",
            step.step_index + 1,
            step.title,
            format_clock(step.duration_seconds),
            format_clock(*end),
            step.water_amount_ml,
            water,
        );
    }
    let _ = write!(
        out,
        "total {} / {} ml",
        format_clock(schedule.total_time()),
        schedule.total_water()
    );
    out
}
