//! `brewtimer run`
//!
//! Spawns the timer task, renders a status line on stderr and maps lines
//! typed on stdin to timer commands.

use std::io::Write as _;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cli::args::RunArgs;
use crate::cli::render;
use crate::error::{BrewError, TimerError};
use crate::notify::{FanOut, NoAlert, NotificationSink, StepAlert, TerminalBell, TracingSink};
use crate::observability::{EventEmitter, init_metrics};
use crate::timer::{self, TimerCommand, TimerConfig, TimerController, TimerHandle, TimerSnapshot};

const KEY_HELP: &str = "keys: <enter>/p pause-resume, n next, b back, r reset, q quit";

/// What a line of keyboard input asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    Command(TimerCommand),
    Quit,
    Unknown,
}

fn parse_key(line: &str) -> Key {
    match line.trim().to_ascii_lowercase().as_str() {
        "" | "p" | " " => Key::Command(TimerCommand::Toggle),
        "n" => Key::Command(TimerCommand::NextStep),
        "b" => Key::Command(TimerCommand::PreviousStep),
        "r" => Key::Command(TimerCommand::Reset),
        "q" => Key::Quit,
        _ => Key::Unknown,
    }
}

/// Runs a guided brew.
///
/// # Errors
///
/// Returns a usage error for a zero `--tick`, and an error if the recipe
/// cannot be loaded, the event log cannot be opened, metrics cannot be
/// installed, or the timer task dies.
pub async fn run(args: &RunArgs, quiet: bool) -> Result<(), BrewError> {
    let mut config = TimerConfig::default();
    if let Some(tick) = tick_override(args.tick)? {
        config.tick_interval = tick;
    }

    let recipe = super::resolve_recipe(&args.recipe, &args.library).await?;

    if let Some(port) = args.metrics_port {
        init_metrics(Some(port))?;
        tracing::info!(port, "metrics endpoint listening");
    }

    let sink = build_sink(args.events.as_deref())?;
    let alert: Arc<dyn StepAlert> = if quiet {
        Arc::new(NoAlert)
    } else {
        Arc::new(TerminalBell::stderr())
    };
    let step_count = recipe.steps.len();
    let controller = TimerController::new(recipe, sink, alert)?;

    tracing::info!(
        recipe_id = %controller.recipe().id,
        tick = ?config.tick_interval,
        "starting timer"
    );

    let (handle, task) = timer::spawn(controller, &config);
    if !quiet {
        eprintln!("{KEY_HELP}");
    }
    if !args.paused {
        handle.toggle().await?;
    }

    let outcome = interact(&handle, args.keep_running, quiet, step_count).await;
    handle.shutdown();
    let last = task.await.map_err(|_| TimerError::SessionClosed)?;
    outcome?;

    if !quiet {
        eprintln!();
        eprintln!(
            "{} at {} with {} of {} ml poured",
            if last.is_complete { "Brew complete" } else { "Stopped" },
            render::format_clock(last.elapsed_seconds),
            last.water.used_ml,
            last.water.total_ml
        );
    }
    Ok(())
}

/// Renders state changes and forwards keys until completion or quit.
async fn interact(
    handle: &TimerHandle,
    keep_running: bool,
    quiet: bool,
    step_count: usize,
) -> Result<(), BrewError> {
    let mut snapshots = handle.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    render_status(&handle.latest(), quiet, step_count);
    if finished(&handle.latest(), keep_running) {
        return Ok(());
    }

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    return Err(TimerError::SessionClosed.into());
                }
                let snapshot = snapshots.borrow_and_update().clone();
                render_status(&snapshot, quiet, step_count);
                if finished(&snapshot, keep_running) {
                    return Ok(());
                }
            }
            line = lines.next_line(), if stdin_open => {
                match line? {
                    None => {
                        tracing::debug!("stdin closed; keyboard control disabled");
                        stdin_open = false;
                    }
                    Some(line) => match parse_key(&line) {
                        Key::Quit => return Ok(()),
                        Key::Command(command) => {
                            handle.send(command).await?;
                        }
                        Key::Unknown => tracing::warn!(input = %line.trim(), "unknown key; {KEY_HELP}"),
                    },
                }
            }
        }
    }
}

const fn finished(snapshot: &TimerSnapshot, keep_running: bool) -> bool {
    snapshot.is_complete && !keep_running
}

fn render_status(snapshot: &TimerSnapshot, quiet: bool, step_count: usize) {
    if quiet {
        return;
    }
    let mut stderr = std::io::stderr().lock();
    let _ = write!(stderr, "\r{}", render::status_line(snapshot, step_count));
    let _ = stderr.flush();
}

fn tick_override(tick: Option<Duration>) -> Result<Option<Duration>, BrewError> {
    match tick {
        Some(t) if t.is_zero() => Err(BrewError::Usage(
            "--tick must be greater than zero".to_string(),
        )),
        other => Ok(other),
    }
}

fn build_sink(events: Option<&str>) -> Result<Arc<dyn NotificationSink>, BrewError> {
    let fan = FanOut::new().with(Arc::new(TracingSink));
    let fan = match events {
        None => fan,
        Some("-") => fan.with(Arc::new(EventEmitter::stdout())),
        Some(path) => fan.with(Arc::new(EventEmitter::from_file(std::path::Path::new(path))?)),
    };
    Ok(Arc::new(fan))
}
