//! Recipe data model
//!
//! Two layers live here: the on-disk shape ([`RecipeFile`], deserialized
//! from YAML or JSON) and the normalized runtime shape ([`Recipe`]) that a
//! timer session is built from. Conversion happens in the loader after
//! validation has passed.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::RecipeError;

// ============================================================================
// Runtime Model
// ============================================================================

/// A single timed phase of a brew.
///
/// `duration_seconds` and `water_amount_ml` are per-step amounts, never
/// cumulative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeStep {
    /// Short label shown while the step is active.
    pub title: String,
    /// Optional longer instruction.
    pub description: Option<String>,
    /// Length of this step in seconds (at least 1).
    pub duration_seconds: u32,
    /// Water poured during this step only.
    pub water_amount_ml: u32,
    /// Position in the recipe, contiguous from 0.
    pub step_index: usize,
}

/// A validated, normalized recipe ready to drive a timer session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    /// Stable identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Sum of all step durations.
    pub total_time_seconds: u32,
    /// Steps ordered by `step_index`.
    pub steps: Vec<RecipeStep>,
}

impl Recipe {
    /// Builds a recipe from `(title, duration, water)` triples, assigning
    /// step indices and the total time.
    ///
    /// Performs no validation; intended for embedded recipes and tests.
    #[must_use]
    pub fn from_steps(
        id: impl Into<String>,
        name: impl Into<String>,
        steps: &[(&str, u32, u32)],
    ) -> Self {
        let steps: Vec<RecipeStep> = steps
            .iter()
            .enumerate()
            .map(|(step_index, &(title, duration_seconds, water_amount_ml))| RecipeStep {
                title: title.to_string(),
                description: None,
                duration_seconds,
                water_amount_ml,
                step_index,
            })
            .collect();
        let total_time_seconds = steps.iter().map(|s| s.duration_seconds).sum();
        Self {
            id: id.into(),
            name: name.into(),
            total_time_seconds,
            steps,
        }
    }

    /// Total water across all steps, saturating at `u32::MAX`.
    #[must_use]
    pub fn total_water_ml(&self) -> u32 {
        self.steps
            .iter()
            .fold(0u32, |acc, s| acc.saturating_add(s.water_amount_ml))
    }
}

/// Lightweight listing entry for a recipe library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeSummary {
    /// Recipe id.
    pub id: String,
    /// Recipe name.
    pub name: String,
    /// Number of steps.
    pub step_count: usize,
    /// Total brew time in seconds.
    pub total_time_seconds: u32,
    /// Total water in millilitres.
    pub total_water_ml: u32,
}

impl From<&Recipe> for RecipeSummary {
    fn from(recipe: &Recipe) -> Self {
        Self {
            id: recipe.id.clone(),
            name: recipe.name.clone(),
            step_count: recipe.steps.len(),
            total_time_seconds: recipe.total_time_seconds,
            total_water_ml: recipe.total_water_ml(),
        }
    }
}

// ============================================================================
// File Model
// ============================================================================

/// How step times are expressed in a recipe file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeMode {
    /// Each step lists its own duration.
    #[default]
    Individual,
    /// Each step lists the elapsed time at which it ends.
    Cumulative,
}

/// A duration written either as whole seconds or as a `humantime` string
/// such as `"45s"` or `"1m30s"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    /// Whole seconds.
    Seconds(u64),
    /// Human-readable duration.
    Text(String),
}

impl DurationValue {
    /// Converts to whole seconds.
    ///
    /// # Errors
    ///
    /// Returns `RecipeError::InvalidValue` if the text does not parse, has a
    /// sub-second component, or does not fit in `u32`.
    pub fn to_seconds(&self, field: &str) -> Result<u32, RecipeError> {
        let invalid = |value: String, expected: &str| RecipeError::InvalidValue {
            field: field.to_string(),
            value,
            expected: expected.to_string(),
        };
        let duration = match self {
            Self::Seconds(secs) => Duration::from_secs(*secs),
            Self::Text(text) => humantime::parse_duration(text.trim())
                .map_err(|e| invalid(text.clone(), &format!("a duration like '45s' ({e})")))?,
        };
        if duration.subsec_nanos() != 0 {
            return Err(invalid(
                format!("{duration:?}"),
                "a whole number of seconds",
            ));
        }
        u32::try_from(duration.as_secs())
            .map_err(|_| invalid(duration.as_secs().to_string(), "at most u32::MAX seconds"))
    }
}

/// One step as written in a recipe file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepFile {
    /// Step label.
    pub title: String,
    /// Optional instruction text.
    #[serde(default)]
    pub description: Option<String>,
    /// Duration or cumulative end time, depending on [`TimeMode`].
    #[serde(alias = "time")]
    pub duration: DurationValue,
    /// Water for this step in millilitres.
    #[serde(default, alias = "water_ml")]
    pub water: u32,
}

/// A recipe document as written on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecipeFile {
    /// Stable identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Declared total brew time; trusted but cross-checked with a warning.
    #[serde(default)]
    pub total_time: Option<DurationValue>,
    /// Interpretation of step times.
    #[serde(default)]
    pub time_mode: TimeMode,
    /// Ordered steps.
    #[serde(default)]
    pub steps: Vec<StepFile>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_steps_assigns_indices_and_total() {
        let recipe = Recipe::from_steps("r", "R", &[("Bloom", 45, 70), ("Pour", 45, 50)]);
        assert_eq!(recipe.total_time_seconds, 90);
        assert_eq!(recipe.total_water_ml(), 120);
        assert_eq!(recipe.steps[1].step_index, 1);
        assert_eq!(recipe.steps[1].title, "Pour");
    }

    #[test]
    fn duration_value_accepts_integer_seconds() {
        assert_eq!(DurationValue::Seconds(45).to_seconds("d").unwrap(), 45);
    }

    #[test]
    fn duration_value_accepts_humantime() {
        let value = DurationValue::Text("1m30s".to_string());
        assert_eq!(value.to_seconds("d").unwrap(), 90);
    }

    #[test]
    fn duration_value_rejects_subsecond() {
        let value = DurationValue::Text("1500ms".to_string());
        assert!(matches!(
            value.to_seconds("d"),
            Err(RecipeError::InvalidValue { .. })
        ));
    }

    #[test]
    fn duration_value_rejects_garbage() {
        let value = DurationValue::Text("soon".to_string());
        let err = value.to_seconds("steps[0].duration").unwrap_err();
        assert!(err.to_string().contains("steps[0].duration"));
    }

    #[test]
    fn recipe_file_parses_mixed_durations() {
        let yaml = r"
id: v60
name: V60
steps:
  - title: Bloom
    duration: 45
    water: 70
  - title: Main pour
    duration: 1m
    water: 180
";
        let file: RecipeFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(file.time_mode, TimeMode::Individual);
        assert_eq!(file.steps.len(), 2);
        assert_eq!(file.steps[0].duration, DurationValue::Seconds(45));
        assert_eq!(file.steps[1].duration, DurationValue::Text("1m".to_string()));
    }

    #[test]
    fn recipe_file_rejects_unknown_fields() {
        let yaml = "id: a\nname: b\ngrind: fine\n";
        assert!(serde_yaml::from_str::<RecipeFile>(yaml).is_err());
    }

    #[test]
    fn summary_from_recipe() {
        let recipe = Recipe::from_steps("r", "R", &[("a", 10, 5), ("b", 20, 15)]);
        let summary = RecipeSummary::from(&recipe);
        assert_eq!(summary.step_count, 2);
        assert_eq!(summary.total_time_seconds, 30);
        assert_eq!(summary.total_water_ml, 20);
    }

    #[test]
    fn summary_water_saturates() {
        let recipe = Recipe::from_steps(
            "big",
            "Big",
            &[("a", 10, 3_000_000_000), ("b", 10, 3_000_000_000)],
        );
        assert_eq!(RecipeSummary::from(&recipe).total_water_ml, u32::MAX);
    }
}
