//! Recipe loader
//!
//! Loading pipeline:
//! 1. Size check
//! 2. Read raw content (strip a UTF-8 BOM)
//! 3. YAML or JSON parsing, chosen by file extension
//! 4. Validation (all issues collected)
//! 5. Time normalization (cumulative end times become durations)
//! 6. Freeze with `Arc`

use std::path::Path;
use std::sync::Arc;

use crate::error::RecipeError;
use crate::recipe::schema::{Recipe, RecipeFile, RecipeStep, TimeMode};
use crate::recipe::validation::Validator;

/// Path label used for recipes that do not come from a file.
const INLINE_PATH: &str = "<inline>";

// ============================================================================
// Public API
// ============================================================================

/// Serialization format of a recipe document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeFormat {
    /// YAML (`.yaml`, `.yml`); also the fallback for unknown extensions.
    Yaml,
    /// JSON (`.json`).
    Json,
}

impl RecipeFormat {
    /// Picks the format from a file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }

    /// Returns `true` if the path has a recognised recipe extension.
    #[must_use]
    pub fn is_recipe_path(path: &Path) -> bool {
        matches!(
            path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref(),
            Some("yaml" | "yml" | "json")
        )
    }
}

/// Limits applied while loading recipes.
#[derive(Debug, Clone)]
pub struct RecipeLimits {
    /// Maximum number of steps in one recipe.
    pub max_steps: usize,

    /// Maximum recipe file size in bytes.
    pub max_recipe_size: usize,
}

impl Default for RecipeLimits {
    fn default() -> Self {
        Self {
            max_steps: env_or("BREWTIMER_MAX_STEPS", 64),
            max_recipe_size: env_or("BREWTIMER_MAX_RECIPE_SIZE", 1024 * 1024),
        }
    }
}

/// Options for the recipe loader.
#[derive(Debug, Clone, Default)]
pub struct LoaderOptions {
    /// Loading limits.
    pub limits: RecipeLimits,
}

/// Result of loading a recipe.
#[derive(Debug)]
pub struct LoadResult {
    /// The loaded, validated and normalized recipe.
    pub recipe: Arc<Recipe>,

    /// Warnings encountered during loading.
    pub warnings: Vec<LoadWarning>,
}

/// Warning raised while loading a recipe.
#[derive(Debug, Clone)]
pub struct LoadWarning {
    /// Warning message.
    pub message: String,

    /// Field the warning refers to.
    pub location: Option<String>,
}

/// Recipe loader.
#[derive(Debug, Default)]
pub struct RecipeLoader {
    options: LoaderOptions,
}

impl RecipeLoader {
    /// Creates a new loader with the given options.
    #[must_use]
    pub const fn new(options: LoaderOptions) -> Self {
        Self { options }
    }

    /// Creates a new loader with default options.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(LoaderOptions::default())
    }

    /// Loads a recipe file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or too large, fails to
    /// parse, or fails validation.
    pub fn load(&self, path: &Path) -> Result<LoadResult, RecipeError> {
        let metadata = std::fs::metadata(path).map_err(|_| RecipeError::MissingFile {
            path: path.to_path_buf(),
        })?;

        let max = self.options.limits.max_recipe_size;
        let file_size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
        if file_size > max {
            return Err(RecipeError::InvalidValue {
                field: "file_size".to_string(),
                value: format!("{file_size} bytes"),
                expected: format!("at most {max} bytes"),
            });
        }

        let raw = std::fs::read_to_string(path).map_err(|_| RecipeError::MissingFile {
            path: path.to_path_buf(),
        })?;

        self.load_content(&raw, RecipeFormat::from_path(path), path)
    }

    /// Loads a recipe from an in-memory document.
    ///
    /// # Errors
    ///
    /// Returns an error if the content fails to parse or validate.
    pub fn load_from_str(
        &self,
        content: &str,
        format: RecipeFormat,
    ) -> Result<LoadResult, RecipeError> {
        self.load_content(content, format, Path::new(INLINE_PATH))
    }

    fn load_content(
        &self,
        content: &str,
        format: RecipeFormat,
        path: &Path,
    ) -> Result<LoadResult, RecipeError> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);

        if content.trim().is_empty() {
            return Err(RecipeError::ParseError {
                path: path.to_path_buf(),
                line: None,
                message: "Recipe file is empty".to_string(),
            });
        }

        let file = parse(content, format, path)?;

        let mut validator = Validator::new();
        let validation = validator.validate(&file, &self.options.limits);
        if validation.has_errors() {
            return Err(RecipeError::ValidationError {
                path: path.display().to_string(),
                errors: validation.errors,
            });
        }

        let warnings = validation
            .warnings
            .into_iter()
            .map(|issue| LoadWarning {
                message: issue.message,
                location: Some(issue.path),
            })
            .collect();

        let recipe = normalize(file)?;
        tracing::debug!(
            recipe_id = %recipe.id,
            steps = recipe.steps.len(),
            total_time = recipe.total_time_seconds,
            "recipe loaded"
        );

        Ok(LoadResult {
            recipe: Arc::new(recipe),
            warnings,
        })
    }
}

fn parse(content: &str, format: RecipeFormat, path: &Path) -> Result<RecipeFile, RecipeError> {
    match format {
        RecipeFormat::Yaml => serde_yaml::from_str(content).map_err(|e| RecipeError::ParseError {
            path: path.to_path_buf(),
            line: e.location().map(|l| l.line()),
            message: e.to_string(),
        }),
        RecipeFormat::Json => serde_json::from_str(content).map_err(|e| RecipeError::ParseError {
            path: path.to_path_buf(),
            line: Some(e.line()),
            message: e.to_string(),
        }),
    }
}

/// Converts a validated file into the runtime model.
///
/// The timer only ever sees individual per-step durations; cumulative
/// files are converted here by successive differences.
fn normalize(file: RecipeFile) -> Result<Recipe, RecipeError> {
    let mut steps = Vec::with_capacity(file.steps.len());
    let mut previous_end = 0u32;

    for (step_index, step) in file.steps.into_iter().enumerate() {
        let time = step
            .duration
            .to_seconds(&format!("steps[{step_index}].duration"))?;
        let duration_seconds = match file.time_mode {
            TimeMode::Individual => time,
            TimeMode::Cumulative => {
                let duration = time.saturating_sub(previous_end);
                previous_end = time;
                duration
            }
        };
        steps.push(RecipeStep {
            title: step.title,
            description: step.description.filter(|d| !d.trim().is_empty()),
            duration_seconds,
            water_amount_ml: step.water,
            step_index,
        });
    }

    let total_time_seconds = steps.iter().map(|s| s.duration_seconds).sum();

    Ok(Recipe {
        id: file.id,
        name: file.name,
        total_time_seconds,
        steps,
    })
}

/// Reads an environment variable, falling back to `default` if it is
/// unset or unparseable.
pub(crate) fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const V60: &str = r"
id: v60-classic
name: V60 Classic
total_time: 2m15s
steps:
  - title: Bloom
    description: Wet all the grounds
    duration: 45
    water: 70
  - title: First pour
    duration: 45s
    water: 50
  - title: Final pour
    duration: 45
    water: 60
";

    #[test]
    fn loads_yaml_from_str() {
        let result = RecipeLoader::with_defaults()
            .load_from_str(V60, RecipeFormat::Yaml)
            .unwrap();
        let recipe = &result.recipe;
        assert_eq!(recipe.id, "v60-classic");
        assert_eq!(recipe.total_time_seconds, 135);
        assert_eq!(recipe.steps.len(), 3);
        assert_eq!(recipe.steps[2].step_index, 2);
        assert_eq!(recipe.steps[0].description.as_deref(), Some("Wet all the grounds"));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn loads_json_from_str() {
        let json = r#"{"id":"j","name":"J","steps":[{"title":"a","duration":30,"water":100}]}"#;
        let result = RecipeLoader::with_defaults()
            .load_from_str(json, RecipeFormat::Json)
            .unwrap();
        assert_eq!(result.recipe.total_time_seconds, 30);
        assert_eq!(result.recipe.total_water_ml(), 100);
    }

    #[test]
    fn cumulative_times_are_normalized() {
        let yaml = r"
id: cumulative
name: Cumulative
time_mode: cumulative
steps:
  - { title: Bloom, duration: 45, water: 70 }
  - { title: Pour, duration: 90, water: 50 }
  - { title: Drain, duration: 135, water: 60 }
";
        let result = RecipeLoader::with_defaults()
            .load_from_str(yaml, RecipeFormat::Yaml)
            .unwrap();
        let durations: Vec<u32> = result
            .recipe
            .steps
            .iter()
            .map(|s| s.duration_seconds)
            .collect();
        assert_eq!(durations, vec![45, 45, 45]);
        assert_eq!(result.recipe.total_time_seconds, 135);
    }

    #[test]
    fn empty_content_is_parse_error() {
        let err = RecipeLoader::with_defaults()
            .load_from_str("  \n", RecipeFormat::Yaml)
            .unwrap_err();
        assert!(matches!(err, RecipeError::ParseError { .. }));
    }

    #[test]
    fn bom_is_stripped() {
        let content = format!("\u{feff}{V60}");
        assert!(
            RecipeLoader::with_defaults()
                .load_from_str(&content, RecipeFormat::Yaml)
                .is_ok()
        );
    }

    #[test]
    fn invalid_recipe_is_validation_error() {
        let yaml = "id: x\nname: X\nsteps: []\n";
        let err = RecipeLoader::with_defaults()
            .load_from_str(yaml, RecipeFormat::Yaml)
            .unwrap_err();
        match err {
            RecipeError::ValidationError { errors, .. } => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].path, "steps");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn warnings_are_surfaced() {
        let yaml = "id: x\nname: X\ntotal_time: 99\nsteps:\n  - { title: a, duration: 30 }\n";
        let result = RecipeLoader::with_defaults()
            .load_from_str(yaml, RecipeFormat::Yaml)
            .unwrap();
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].location.as_deref(), Some("total_time"));
        assert_eq!(result.recipe.total_time_seconds, 30);
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(V60.as_bytes()).unwrap();
        let result = RecipeLoader::with_defaults().load(file.path()).unwrap();
        assert_eq!(result.recipe.name, "V60 Classic");
    }

    #[test]
    fn missing_file_error() {
        let err = RecipeLoader::with_defaults()
            .load(Path::new("/nonexistent/recipe.yaml"))
            .unwrap_err();
        assert!(matches!(err, RecipeError::MissingFile { .. }));
    }

    #[test]
    fn oversized_file_rejected() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(V60.as_bytes()).unwrap();
        let loader = RecipeLoader::new(LoaderOptions {
            limits: RecipeLimits {
                max_recipe_size: 10,
                ..RecipeLimits::default()
            },
        });
        let err = loader.load(file.path()).unwrap_err();
        assert!(matches!(err, RecipeError::InvalidValue { .. }));
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(RecipeFormat::from_path(Path::new("a.json")), RecipeFormat::Json);
        assert_eq!(RecipeFormat::from_path(Path::new("a.JSON")), RecipeFormat::Json);
        assert_eq!(RecipeFormat::from_path(Path::new("a.yml")), RecipeFormat::Yaml);
        assert!(RecipeFormat::is_recipe_path(Path::new("a.yaml")));
        assert!(!RecipeFormat::is_recipe_path(Path::new("README.md")));
    }

    #[test]
    fn overflowing_water_is_rejected() {
        let yaml = r"
id: flood
name: Flood
steps:
  - { title: a, duration: 10, water: 3000000000 }
  - { title: b, duration: 10, water: 3000000000 }
";
        let err = RecipeLoader::with_defaults()
            .load_from_str(yaml, RecipeFormat::Yaml)
            .unwrap_err();
        let RecipeError::ValidationError { errors, .. } = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert!(errors.iter().any(|e| e.message.contains("water overflows")));
    }

    #[test]
    fn env_or_falls_back_on_missing_var() {
        assert_eq!(env_or("BREWTIMER_TEST_UNSET_VARIABLE", 7usize), 7);
    }
}
