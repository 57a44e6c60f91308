//! Recipe loading, validation and lookup.
//!
//! Recipes are read from YAML or JSON, validated in full, and normalized
//! into the individual-duration model the timer runs on.

pub mod loader;
pub mod schema;
pub mod source;
pub mod validation;

pub use loader::{LoadResult, LoadWarning, LoaderOptions, RecipeFormat, RecipeLimits, RecipeLoader};
pub use schema::{Recipe, RecipeStep, RecipeSummary, TimeMode};
pub use source::{DirectorySource, RecipeSource};
