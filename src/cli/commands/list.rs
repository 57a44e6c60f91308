//! `brewtimer list`

use crate::cli::args::{ListArgs, OutputFormat};
use crate::cli::render::format_clock;
use crate::error::BrewError;
use crate::recipe::{DirectorySource, RecipeSource};

/// Lists the recipes in the library directory.
///
/// # Errors
///
/// Returns an error if the library directory cannot be read.
pub async fn run(args: &ListArgs) -> Result<(), BrewError> {
    tracing::info!(library = %args.library.display(), "listing recipes");
    let summaries = DirectorySource::new(&args.library).list().await?;

    match args.format {
        OutputFormat::Human => {
            if summaries.is_empty() {
                println!("no recipes in {}", args.library.display());
            }
            for s in &summaries {
                println!(
                    "{:<24} {:<32} {:>2} steps  {}  {:>5} ml",
                    s.id,
                    s.name,
                    s.step_count,
                    format_clock(s.total_time_seconds),
                    s.total_water_ml
                );
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summaries)?),
    }
    Ok(())
}
