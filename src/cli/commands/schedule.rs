//! `brewtimer schedule`

use serde_json::json;

use crate::cli::args::{OutputFormat, ScheduleArgs};
use crate::cli::render;
use crate::error::BrewError;
use crate::recipe::Recipe;
use crate::timer::StepSchedule;

/// Prints the cumulative step schedule of a recipe.
///
/// # Errors
///
/// Returns an error if the recipe cannot be loaded.
pub async fn run(args: &ScheduleArgs) -> Result<(), BrewError> {
    let recipe = super::resolve_recipe(&args.recipe, &args.library).await?;
    let schedule = StepSchedule::build(&recipe.steps);

    match args.format {
        OutputFormat::Human => println!("{}", render::schedule_table(&recipe, &schedule)),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&to_json(&recipe, &schedule))?);
        }
    }
    Ok(())
}

fn to_json(recipe: &Recipe, schedule: &StepSchedule) -> serde_json::Value {
    let steps: Vec<_> = recipe
        .steps
        .iter()
        .map(|step| {
            let i = step.step_index;
            json!({
                "step_index": i,
                "title": step.title,
                "description": step.description,
                "duration_seconds": step.duration_seconds,
                "water_ml": step.water_amount_ml,
                "starts_at": schedule.start_of(i),
                "ends_at": schedule.end_of(i),
                "cumulative_water_ml": schedule.cumulative_water()[i],
            })
        })
        .collect();

    json!({
        "id": recipe.id,
        "name": recipe.name,
        "total_time_seconds": schedule.total_time(),
        "total_water_ml": schedule.total_water(),
        "steps": steps,
    })
}
