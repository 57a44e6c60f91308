//! Recipe validation
//!
//! Runs on the deserialized [`RecipeFile`] before it is normalized into a
//! [`Recipe`](super::Recipe). Every issue is collected (the validator
//! never stops at the first one) so `brewtimer validate` can report a
//! recipe's problems in a single pass.

use crate::error::{Severity, ValidationIssue};
use crate::recipe::loader::RecipeLimits;
use crate::recipe::schema::{RecipeFile, TimeMode};

/// Names longer than this produce a warning.
const LONG_NAME_THRESHOLD: usize = 100;

// ============================================================================
// Public API
// ============================================================================

/// Result of recipe validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Validation errors (prevent loading).
    pub errors: Vec<ValidationIssue>,

    /// Validation warnings (informational).
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Returns `true` if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns `true` if validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Recipe validator.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

impl Validator {
    /// Creates a new validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a recipe file and returns every error and warning found.
    pub fn validate(&mut self, recipe: &RecipeFile, limits: &RecipeLimits) -> ValidationResult {
        self.errors.clear();
        self.warnings.clear();

        self.validate_metadata(recipe);
        self.validate_steps(recipe, limits);

        ValidationResult {
            errors: std::mem::take(&mut self.errors),
            warnings: std::mem::take(&mut self.warnings),
        }
    }

    // ========================================================================
    // Metadata
    // ========================================================================

    fn validate_metadata(&mut self, recipe: &RecipeFile) {
        if recipe.id.trim().is_empty() {
            self.add_error("id", "Recipe id is required and cannot be empty");
        } else if recipe.id.chars().any(char::is_whitespace) {
            self.add_error("id", "Recipe id cannot contain whitespace");
        }

        if recipe.name.trim().is_empty() {
            self.add_error("name", "Recipe name is required and cannot be empty");
        }

        if recipe.name.len() > LONG_NAME_THRESHOLD {
            self.add_warning("name", "Recipe name is unusually long (> 100 characters)");
        }
    }

    // ========================================================================
    // Steps
    // ========================================================================

    fn validate_steps(&mut self, recipe: &RecipeFile, limits: &RecipeLimits) {
        if recipe.steps.is_empty() {
            self.add_error("steps", "Recipe must have at least one step");
            return;
        }

        if recipe.steps.len() > limits.max_steps {
            self.add_error(
                "steps",
                &format!(
                    "Recipe has {} steps, exceeding the limit of {}",
                    recipe.steps.len(),
                    limits.max_steps
                ),
            );
        }

        // Parsed step times; `None` where parsing failed (already reported).
        let mut times = Vec::with_capacity(recipe.steps.len());
        for (i, step) in recipe.steps.iter().enumerate() {
            if step.title.trim().is_empty() {
                self.add_error(&format!("steps[{i}].title"), "Step title cannot be empty");
            }

            let path = format!("steps[{i}].duration");
            match step.duration.to_seconds(&path) {
                Ok(secs) => times.push(Some(secs)),
                Err(e) => {
                    self.add_error(&path, &e.to_string());
                    times.push(None);
                }
            }
        }

        if recipe
            .steps
            .iter()
            .try_fold(0u32, |acc, step| acc.checked_add(step.water))
            .is_none()
        {
            self.add_error("steps", "Total recipe water overflows");
        }

        if times.iter().any(Option::is_none) {
            return;
        }
        let times: Vec<u32> = times.into_iter().flatten().collect();

        let durations = match recipe.time_mode {
            TimeMode::Individual => {
                for (i, secs) in times.iter().enumerate() {
                    if *secs == 0 {
                        self.add_error(
                            &format!("steps[{i}].duration"),
                            "Step duration must be at least 1 second",
                        );
                    }
                }
                if looks_cumulative(&times, declared_total(recipe)) {
                    self.add_warning(
                        "time_mode",
                        "Step times are strictly increasing and end at total_time; \
                         did you mean time_mode: cumulative?",
                    );
                }
                times
            }
            TimeMode::Cumulative => {
                let mut previous = 0u32;
                for (i, secs) in times.iter().enumerate() {
                    if *secs <= previous {
                        self.add_error(
                            &format!("steps[{i}].duration"),
                            &format!(
                                "Cumulative time {secs}s must be greater than the previous step's {previous}s"
                            ),
                        );
                    }
                    previous = (*secs).max(previous);
                }
                return self.check_declared_total(recipe, times.last().copied());
            }
        };

        let sum = durations
            .iter()
            .try_fold(0u32, |acc, d| acc.checked_add(*d));
        if sum.is_none() {
            self.add_error("steps", "Total recipe time overflows");
        }
        self.check_declared_total(recipe, sum);
    }

    fn check_declared_total(&mut self, recipe: &RecipeFile, computed: Option<u32>) {
        let Some(declared) = &recipe.total_time else {
            return;
        };
        match declared.to_seconds("total_time") {
            Ok(declared) => {
                if let Some(computed) = computed
                    && declared != computed
                {
                    self.add_warning(
                        "total_time",
                        &format!(
                            "Declared total time {declared}s differs from the sum of step durations {computed}s"
                        ),
                    );
                }
            }
            Err(e) => self.add_error("total_time", &e.to_string()),
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn add_error(&mut self, path: &str, message: &str) {
        self.errors.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Error,
        });
    }

    fn add_warning(&mut self, path: &str, message: &str) {
        self.warnings.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Warning,
        });
    }
}

fn declared_total(recipe: &RecipeFile) -> Option<u32> {
    recipe
        .total_time
        .as_ref()
        .and_then(|t| t.to_seconds("total_time").ok())
}

/// Strictly increasing times whose last entry equals the declared total
/// suggest the author wrote cumulative end times.
fn looks_cumulative(times: &[u32], declared_total: Option<u32>) -> bool {
    let Some(total) = declared_total else {
        return false;
    };
    times.len() > 1
        && times.windows(2).all(|w| w[0] < w[1])
        && times.last() == Some(&total)
}
