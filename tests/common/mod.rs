//! Shared integration-test helpers.

#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use std::sync::Arc;

use brewtimer::notify::{NotificationSink, RecordingSink, StepAlert};
use brewtimer::recipe::{Recipe, RecipeLoader};
use brewtimer::timer::TimerController;

/// Path to a file under `tests/fixtures`.
pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Path to the bundled `recipes/` library.
pub fn library() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("recipes")
}

/// Loads a fixture recipe through the real loader.
#[allow(clippy::missing_panics_doc)]
pub fn load_fixture(name: &str) -> Arc<Recipe> {
    RecipeLoader::with_defaults()
        .load(&fixture(name))
        .unwrap_or_else(|e| panic!("fixture {name} should load: {e}"))
        .recipe
}

/// Builds a controller whose events and alerts land in one recorder.
#[allow(clippy::missing_panics_doc)]
pub fn recorded_controller(recipe: Arc<Recipe>) -> (TimerController, Arc<RecordingSink>) {
    let recorder = Arc::new(RecordingSink::new());
    let controller = TimerController::new(
        recipe,
        Arc::clone(&recorder) as Arc<dyn NotificationSink>,
        Arc::clone(&recorder) as Arc<dyn StepAlert>,
    )
    .expect("recipe should be runnable");
    (controller, recorder)
}

/// Runs the `brewtimer` binary to completion with stdin closed.
///
/// `BREWTIMER_*` variables from the outer environment are removed so
/// results do not depend on the developer's shell.
#[allow(clippy::missing_panics_doc)]
pub fn brewtimer(args: &[&str]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_brewtimer"));
    for (key, _) in std::env::vars_os() {
        if key.to_string_lossy().starts_with("BREWTIMER_") {
            command.env_remove(key);
        }
    }
    command
        .args(args)
        .env("NO_COLOR", "1")
        .stdin(Stdio::null())
        .output()
        .expect("failed to spawn brewtimer")
}

/// Stdout of a finished process as a `String`.
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Stderr of a finished process as a `String`.
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
