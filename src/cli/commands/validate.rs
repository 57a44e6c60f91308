//! `brewtimer validate`

use std::path::Path;

use serde_json::json;

use crate::cli::args::{OutputFormat, ValidateArgs};
use crate::cli::render::format_clock;
use crate::error::{BrewError, RecipeError};
use crate::recipe::{LoadResult, RecipeLoader};

/// Outcome for one file.
struct FileReport {
    file: String,
    summary: Option<String>,
    errors: Vec<(String, String)>,
    warnings: Vec<(String, String)>,
}

impl FileReport {
    fn passed(&self, strict: bool) -> bool {
        self.errors.is_empty() && !(strict && !self.warnings.is_empty())
    }
}

/// Validates every file and reports all of them before failing.
///
/// # Errors
///
/// Returns `RecipeError::ValidationError` if any file fails (including
/// warnings under `--strict`).
pub fn run(args: &ValidateArgs) -> Result<(), BrewError> {
    let loader = RecipeLoader::with_defaults();
    let reports: Vec<FileReport> = args
        .files
        .iter()
        .map(|path| check(&loader, path))
        .collect();

    match args.format {
        OutputFormat::Human => print_human(&reports, args.strict),
        OutputFormat::Json => print_json(&reports, args.strict)?,
    }

    let failed = reports.iter().filter(|r| !r.passed(args.strict)).count();
    if failed > 0 {
        return Err(RecipeError::ValidationError {
            path: format!("{failed} of {} recipe file(s)", reports.len()),
            errors: Vec::new(),
        }
        .into());
    }
    Ok(())
}

fn check(loader: &RecipeLoader, path: &Path) -> FileReport {
    let file = path.display().to_string();
    tracing::info!(file = %file, "validating recipe");

    match loader.load(path) {
        Ok(LoadResult { recipe, warnings }) => FileReport {
            file,
            summary: Some(format!(
                "{}: {} step(s), {}, {} ml",
                recipe.id,
                recipe.steps.len(),
                format_clock(recipe.total_time_seconds),
                recipe.total_water_ml()
            )),
            errors: Vec::new(),
            warnings: warnings
                .into_iter()
                .map(|w| (w.location.unwrap_or_default(), w.message))
                .collect(),
        },
        Err(RecipeError::ValidationError { errors, .. }) => FileReport {
            file,
            summary: None,
            errors: errors.into_iter().map(|e| (e.path, e.message)).collect(),
            warnings: Vec::new(),
        },
        Err(e) => FileReport {
            file,
            summary: None,
            errors: vec![(String::new(), e.to_string())],
            warnings: Vec::new(),
        },
    }
}

fn print_human(reports: &[FileReport], strict: bool) {
    for report in reports {
        let mark = if report.passed(strict) { "ok" } else { "FAIL" };
        match &report.summary {
            Some(summary) => println!("{mark}  {} ({summary})", report.file),
            None => println!("{mark}  {}", report.file),
        }
        for (path, message) in &report.errors {
            println!("      error: {message}{}", at(path));
        }
        for (path, message) in &report.warnings {
            println!("      warning: {message}{}", at(path));
        }
    }
}

fn at(path: &str) -> String {
    if path.is_empty() {
        String::new()
    } else {
        format!(" at {path}")
    }
}

fn print_json(reports: &[FileReport], strict: bool) -> Result<(), BrewError> {
    let issues = |list: &[(String, String)]| {
        list.iter()
            .map(|(path, message)| json!({ "path": path, "message": message }))
            .collect::<Vec<_>>()
    };
    let out: Vec<_> = reports
        .iter()
        .map(|r| {
            json!({
                "file": r.file,
                "valid": r.passed(strict),
                "errors": issues(&r.errors),
                "warnings": issues(&r.warnings),
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn valid_file_passes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "ok.yaml",
            "id: ok\nname: OK\nsteps:\n  - { title: a, duration: 30, water: 50 }\n",
        );
        let report = check(&RecipeLoader::with_defaults(), &path);
        assert!(report.passed(true));
        assert!(report.summary.unwrap().contains("00:30"));
    }

    #[test]
    fn warnings_fail_only_in_strict_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "warn.yaml",
            "id: w\nname: W\ntotal_time: 99\nsteps:\n  - { title: a, duration: 30 }\n",
        );
        let report = check(&RecipeLoader::with_defaults(), &path);
        assert!(report.passed(false));
        assert!(!report.passed(true));
    }

    #[test]
    fn collects_validation_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "bad.yaml", "id: ''\nname: ''\nsteps: []\n");
        let report = check(&RecipeLoader::with_defaults(), &path);
        assert_eq!(report.errors.len(), 3);
    }

    #[test]
    fn run_fails_when_any_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let good = write(
            dir.path(),
            "ok.yaml",
            "id: ok\nname: OK\nsteps:\n  - { title: a, duration: 30 }\n",
        );
        let missing = dir.path().join("missing.yaml");
        let args = ValidateArgs {
            files: vec![good, missing],
            format: OutputFormat::Json,
            strict: false,
        };
        let err = run(&args).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::ExitCode::RECIPE_ERROR);
        assert!(err.to_string().contains("1 of 2"));
    }
}
