//! Prometheus metrics.
//!
//! Recording helpers are plain functions over the `metrics` facade. Until
//! [`init_metrics`] installs a recorder they are no-ops, so library users
//! who never call it pay nothing.

use std::sync::atomic::{AtomicBool, Ordering};

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::BrewError;

/// Guard to prevent double-initialization of the metrics recorder.
static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Direction label for manual navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavDirection {
    /// `go_to_previous_step`
    Previous,
    /// `go_to_next_step`
    Next,
}

impl NavDirection {
    const fn label(self) -> &'static str {
        match self {
            Self::Previous => "previous",
            Self::Next => "next",
        }
    }
}

/// Installs the global recorder.
///
/// With `Some(port)` a Prometheus scrape endpoint listens on
/// `127.0.0.1:<port>`; with `None` metrics are recorded in-process only.
///
/// # Errors
///
/// Returns `BrewError::Io` if the recorder or listener cannot be installed.
pub fn init_metrics(port: Option<u16>) -> Result<(), BrewError> {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        tracing::debug!("metrics already initialized, skipping");
        return Ok(());
    }
    port.map_or_else(
        || PrometheusBuilder::new().install_recorder().map(|_| ()),
        |p| {
            PrometheusBuilder::new()
                .with_http_listener(([127, 0, 0, 1], p))
                .install()
        },
    )
    .map_err(|e| BrewError::Io(std::io::Error::other(e.to_string())))?;

    describe_metrics();
    Ok(())
}

fn describe_metrics() {
    describe_counter!("brewtimer_ticks_total", "Clock ticks processed while running");
    describe_counter!(
        "brewtimer_steps_completed_total",
        "Steps completed by the running clock"
    );
    describe_counter!(
        "brewtimer_sink_failures_total",
        "Notification or alert deliveries that failed"
    );
    describe_counter!(
        "brewtimer_navigations_total",
        "Manual step navigations by direction"
    );
    describe_gauge!("brewtimer_elapsed_seconds", "Elapsed brew time");
    describe_gauge!("brewtimer_active_step", "Index of the active step");
}

/// Records one processed tick.
pub fn record_tick() {
    counter!("brewtimer_ticks_total").increment(1);
}

/// Records one step completion.
pub fn record_step_completed() {
    counter!("brewtimer_steps_completed_total").increment(1);
}

/// Records a failed sink or alert delivery.
pub fn record_sink_failure(kind: &'static str) {
    counter!("brewtimer_sink_failures_total", "kind" => kind).increment(1);
}

/// Records a manual navigation that moved the session.
pub fn record_navigation(direction: NavDirection) {
    counter!("brewtimer_navigations_total", "direction" => direction.label()).increment(1);
}

/// Publishes the current clock position.
#[allow(clippy::cast_precision_loss)]
pub fn set_position(elapsed_seconds: u32, step_index: usize) {
    gauge!("brewtimer_elapsed_seconds").set(f64::from(elapsed_seconds));
    gauge!("brewtimer_active_step").set(step_index as f64);
}
