//! Recipe sources.
//!
//! The timer never talks to a recipe backend directly; it is handed an
//! already-loaded [`Recipe`]. [`RecipeSource`] is the seam a backend plugs
//! into. [`DirectorySource`] serves a directory of recipe files.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::RecipeError;
use crate::recipe::loader::{LoaderOptions, RecipeFormat, RecipeLoader};
use crate::recipe::schema::{Recipe, RecipeSummary};

/// Maximum edit distance for "did you mean" suggestions.
const SUGGESTION_DISTANCE: usize = 3;

/// Supplies validated recipes by id.
#[async_trait::async_trait]
pub trait RecipeSource: Send + Sync {
    /// Fetches one recipe.
    ///
    /// Returns `RecipeError::NotFound` when no recipe has this id.
    async fn fetch(&self, id: &str) -> Result<Arc<Recipe>, RecipeError>;

    /// Lists all available recipes, sorted by id.
    async fn list(&self) -> Result<Vec<RecipeSummary>, RecipeError>;
}

/// A directory of `.yaml`, `.yml` and `.json` recipe files.
///
/// Files that fail to load are skipped with a warning when listing, so one
/// broken recipe does not hide the rest of the library.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    options: LoaderOptions,
}

impl DirectorySource {
    /// Creates a source rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            options: LoaderOptions::default(),
        }
    }

    /// Overrides the loader options used for every file.
    #[must_use]
    pub fn with_options(mut self, options: LoaderOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the library root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Loads every recipe in the directory synchronously.
    fn load_all(root: &Path, options: LoaderOptions) -> Result<Vec<Arc<Recipe>>, RecipeError> {
        let entries = std::fs::read_dir(root)
            .map_err(|e| RecipeError::Library(format!("{}: {e}", root.display())))?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && RecipeFormat::is_recipe_path(path))
            .collect();
        paths.sort();

        let loader = RecipeLoader::new(options);
        let mut recipes = Vec::with_capacity(paths.len());
        for path in paths {
            match loader.load(&path) {
                Ok(result) => recipes.push(result.recipe),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unloadable recipe");
                }
            }
        }
        Ok(recipes)
    }

    async fn load_all_blocking(&self) -> Result<Vec<Arc<Recipe>>, RecipeError> {
        let root = self.root.clone();
        let options = self.options.clone();
        tokio::task::spawn_blocking(move || Self::load_all(&root, options))
            .await
            .map_err(|e| RecipeError::Library(format!("recipe scan task failed: {e}")))?
    }
}

#[async_trait::async_trait]
impl RecipeSource for DirectorySource {
    async fn fetch(&self, id: &str) -> Result<Arc<Recipe>, RecipeError> {
        let recipes = self.load_all_blocking().await?;
        if let Some(recipe) = recipes.iter().find(|r| r.id == id) {
            return Ok(Arc::clone(recipe));
        }
        let suggestion = suggest(id, recipes.iter().map(|r| r.id.as_str()));
        Err(RecipeError::NotFound {
            id: id.to_string(),
            suggestion,
        })
    }

    async fn list(&self) -> Result<Vec<RecipeSummary>, RecipeError> {
        let recipes = self.load_all_blocking().await?;
        let mut summaries: Vec<RecipeSummary> =
            recipes.iter().map(|r| RecipeSummary::from(r.as_ref())).collect();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(summaries)
    }
}

/// Suggests the closest known id for typo correction.
///
/// Returns the best match if its Damerau-Levenshtein distance is ≤ 3.
#[must_use]
pub fn suggest<'a>(input: &str, known: impl Iterator<Item = &'a str>) -> Option<String> {
    known
        .map(|id| (id, strsim::damerau_levenshtein(input, id)))
        .filter(|(_, dist)| *dist <= SUGGESTION_DISTANCE)
        .min_by_key(|(_, dist)| *dist)
        .map(|(id, _)| id.to_string())
}
