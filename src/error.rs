//! Error types for `brewtimer`
//!
//! One enum per concern (recipe loading, timer sessions, notification
//! sinks) aggregated under [`BrewError`], which also maps to process exit
//! codes for the CLI.

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Exit Codes
// ============================================================================

/// Process exit codes used by the `brewtimer` binary.
pub struct ExitCode;

impl ExitCode {
    /// Command finished normally
    pub const SUCCESS: i32 = 0;

    /// Recipe error (invalid file, validation failure, unknown id)
    pub const RECIPE_ERROR: i32 = 2;

    /// Could not read or write a file or stream
    pub const IO_ERROR: i32 = 3;

    /// Timer session error
    pub const TIMER_ERROR: i32 = 5;

    /// Bad command-line usage (`EX_USAGE`)
    pub const USAGE_ERROR: i32 = 64;

    /// Stopped by SIGINT
    pub const INTERRUPTED: i32 = 130;

    /// Stopped by SIGTERM
    pub const TERMINATED: i32 = 143;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Any failure a `brewtimer` command can report.
#[derive(Debug, Error)]
pub enum BrewError {
    /// Recipe loading or validation error
    #[error(transparent)]
    Recipe(#[from] RecipeError),

    /// Timer session error
    #[error(transparent)]
    Timer(#[from] TimerError),

    /// Invalid command-line usage
    #[error("usage error: {0}")]
    Usage(String),

    /// Reading or writing failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Output could not be encoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BrewError {
    /// Exit code the binary should terminate with.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Recipe(_) | Self::Json(_) => ExitCode::RECIPE_ERROR,
            Self::Timer(_) => ExitCode::TIMER_ERROR,
            Self::Usage(_) => ExitCode::USAGE_ERROR,
            Self::Io(_) => ExitCode::IO_ERROR,
        }
    }
}

// ============================================================================
// Recipe Errors
// ============================================================================

/// Recipe loading, validation and lookup errors.
#[derive(Debug, Error)]
pub enum RecipeError {
    /// YAML or JSON parsing failed
    #[error("parse error in {path}: {message}")]
    ParseError {
        /// Path to the recipe file (or `<inline>`)
        path: PathBuf,
        /// 1-based line, when the parser reports one
        line: Option<usize>,
        /// Parser message
        message: String,
    },

    /// One or more validation errors
    #[error("validation failed for {path}")]
    ValidationError {
        /// Path to the recipe file
        path: String,
        /// Every error found, in document order
        errors: Vec<ValidationIssue>,
    },

    /// Recipe file not found or unreadable
    #[error("file not found: {path}")]
    MissingFile {
        /// File that was requested
        path: PathBuf,
    },

    /// No recipe with the requested id
    #[error("recipe not found: '{id}'{}", suggestion.as_ref().map(|s| format!(" (did you mean '{s}'?)")).unwrap_or_default())]
    NotFound {
        /// Requested recipe id
        id: String,
        /// Closest known id, if any
        suggestion: Option<String>,
    },

    /// A field holds a value outside its domain
    #[error("invalid value for '{field}': got '{value}', expected {expected}")]
    InvalidValue {
        /// Dotted field path
        field: String,
        /// Offending value as written
        value: String,
        /// What would have been accepted
        expected: String,
    },

    /// Library directory could not be scanned
    #[error("recipe library error: {0}")]
    Library(String),
}

// ============================================================================
// Validation Types
// ============================================================================

/// One problem found in a recipe document.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Path to the problematic field (e.g., "steps[2].duration")
    pub path: String,
    /// Human-readable explanation
    pub message: String,
    /// Whether the issue blocks loading
    pub severity: Severity,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = if self.severity == Severity::Error {
            "error"
        } else {
            "warning"
        };
        write!(f, "{prefix}: {} at {}", self.message, self.path)
    }
}

/// How serious a [`ValidationIssue`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Prevents the recipe from being used
    Error,
    /// Informational; the recipe still loads
    Warning,
}

// ============================================================================
// Timer Errors
// ============================================================================

/// Timer session errors.
///
/// Stepping past either end of a recipe is a no-op and has no variant here.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimerError {
    /// Recipe cannot drive a timer session
    #[error("invalid recipe: {0}")]
    InvalidRecipe(String),

    /// The session task has shut down
    #[error("timer session closed")]
    SessionClosed,
}

// ============================================================================
// Sink Errors
// ============================================================================

/// Failures reported by notification sinks and alert collaborators.
///
/// The timer controller logs these and carries on.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Writing the event failed
    #[error("sink I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding the event failed
    #[error("sink encoding error: {0}")]
    Json(#[from] serde_json::Error),

    /// The sink refused the event
    #[error("sink rejected event: {0}")]
    Rejected(String),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitCode::SUCCESS, 0);
        assert_eq!(ExitCode::RECIPE_ERROR, 2);
        assert_eq!(ExitCode::IO_ERROR, 3);
        assert_eq!(ExitCode::TIMER_ERROR, 5);
        assert_eq!(ExitCode::USAGE_ERROR, 64);
        assert_eq!(ExitCode::INTERRUPTED, 130);
        assert_eq!(ExitCode::TERMINATED, 143);
    }

    #[test]
    fn test_timer_error_exit_code() {
        let err: BrewError = TimerError::SessionClosed.into();
        assert_eq!(err.exit_code(), ExitCode::TIMER_ERROR);
    }

    #[test]
    fn test_recipe_error_exit_code() {
        let err: BrewError = RecipeError::MissingFile {
            path: PathBuf::from("/test"),
        }
        .into();
        assert_eq!(err.exit_code(), ExitCode::RECIPE_ERROR);
    }

    #[test]
    fn test_io_exit_code() {
        let err = BrewError::from(std::io::Error::other("disk full"));
        assert_eq!(err.exit_code(), ExitCode::IO_ERROR);
    }

    #[test]
    fn test_usage_error_exit_code() {
        let err = BrewError::Usage("missing recipe".to_string());
        assert_eq!(err.exit_code(), ExitCode::USAGE_ERROR);
    }

    #[test]
    fn test_validation_issue_display() {
        let issue = ValidationIssue {
            path: "steps[0].duration".to_string(),
            message: "duration must be at least 1 second".to_string(),
            severity: Severity::Error,
        };
        assert_eq!(
            issue.to_string(),
            "error: duration must be at least 1 second at steps[0].duration"
        );
    }

    #[test]
    fn test_not_found_display_with_suggestion() {
        let err = RecipeError::NotFound {
            id: "v06".to_string(),
            suggestion: Some("v60".to_string()),
        };
        assert_eq!(err.to_string(), "recipe not found: 'v06' (did you mean 'v60'?)");
    }

    #[test]
    fn test_not_found_display_without_suggestion() {
        let err = RecipeError::NotFound {
            id: "aeropress".to_string(),
            suggestion: None,
        };
        assert_eq!(err.to_string(), "recipe not found: 'aeropress'");
    }

    #[test]
    fn test_parse_error_display() {
        let err = RecipeError::ParseError {
            path: PathBuf::from("v60.yaml"),
            line: Some(4),
            message: "unexpected token".to_string(),
        };
        assert!(err.to_string().contains("v60.yaml"));
        assert!(err.to_string().contains("unexpected token"));
    }
}
