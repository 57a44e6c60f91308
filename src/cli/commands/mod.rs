//! CLI command dispatch and handlers
//!
//! Routes parsed CLI arguments to the appropriate command handler.

pub mod list;
pub mod run;
pub mod schedule;
pub mod validate;
pub mod version;

use std::path::Path;
use std::sync::Arc;

use crate::cli::args::{Cli, Commands};
use crate::error::BrewError;
use crate::recipe::{DirectorySource, Recipe, RecipeFormat, RecipeLoader, RecipeSource};

/// Dispatch a parsed CLI invocation to the appropriate command handler.
///
/// # Errors
///
/// Returns an error if the dispatched command handler fails.
pub async fn dispatch(cli: Cli) -> Result<(), BrewError> {
    match cli.command {
        Commands::Run(args) => run::run(&args, cli.quiet).await,
        Commands::Validate(args) => validate::run(&args),
        Commands::Schedule(args) => schedule::run(&args).await,
        Commands::List(args) => list::run(&args).await,
        Commands::Version(args) => {
            version::run(&args);
            Ok(())
        }
    }
}

/// Loads a recipe given either a file path or a library id.
///
/// Anything that exists on disk, or carries a recipe file extension, is
/// treated as a path; everything else is looked up in `library`.
pub(crate) async fn resolve_recipe(
    reference: &str,
    library: &Path,
) -> Result<Arc<Recipe>, BrewError> {
    let path = Path::new(reference);
    if path.exists() || RecipeFormat::is_recipe_path(path) {
        let result = RecipeLoader::with_defaults().load(path)?;
        for warning in &result.warnings {
            tracing::warn!(
                location = warning.location.as_deref().unwrap_or("<unknown>"),
                "{}",
                warning.message
            );
        }
        return Ok(result.recipe);
    }

    tracing::debug!(id = reference, library = %library.display(), "looking up recipe in library");
    Ok(DirectorySource::new(library).fetch(reference).await?)
}
