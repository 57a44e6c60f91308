//! Stock sinks and alerts.

use std::io::Write;
use std::sync::{Arc, Mutex};

use crate::error::SinkError;
use crate::recipe::RecipeStep;

use super::{NotificationSink, StepAlert, TimerEvent};

/// Bell character understood by most terminals.
const BELL: &str = "\u{7}";

// ============================================================================
// TracingSink
// ============================================================================

/// Logs every event at `info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, event: &TimerEvent) -> Result<(), SinkError> {
        match event {
            TimerEvent::RecipeStarted {
                recipe_id,
                recipe_name,
                total_time,
            } => tracing::info!(%recipe_id, %recipe_name, total_time, "recipe started"),
            TimerEvent::TimerPaused {
                recipe_id,
                elapsed_time,
                step_index,
            } => tracing::info!(%recipe_id, elapsed = elapsed_time, step_index, "timer paused"),
            TimerEvent::TimerResumed {
                recipe_id,
                elapsed_time,
                step_index,
            } => tracing::info!(%recipe_id, elapsed = elapsed_time, step_index, "timer resumed"),
            TimerEvent::StepCompleted {
                recipe_id,
                step_index,
                step_duration,
            } => tracing::info!(%recipe_id, step_index, step_duration, "step completed"),
        }
        Ok(())
    }
}

// ============================================================================
// FanOut
// ============================================================================

/// Forwards each event to several sinks.
///
/// Every sink sees every event even if an earlier one fails; the first
/// failure is returned.
#[derive(Clone, Default)]
pub struct FanOut {
    sinks: Vec<Arc<dyn NotificationSink>>,
}

impl std::fmt::Debug for FanOut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanOut")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl FanOut {
    /// Creates an empty fan-out.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sink.
    #[must_use]
    pub fn with(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Number of attached sinks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Returns `true` if no sinks are attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl NotificationSink for FanOut {
    fn notify(&self, event: &TimerEvent) -> Result<(), SinkError> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(e) = sink.notify(event) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

// ============================================================================
// Alerts
// ============================================================================

/// Rings the terminal bell and prints the completed step's title.
pub struct TerminalBell {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for TerminalBell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalBell").finish_non_exhaustive()
    }
}

impl TerminalBell {
    /// Creates a bell that writes to `writer`.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Creates a bell that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }
}

impl StepAlert for TerminalBell {
    fn step_completed(&self, step: &RecipeStep) -> Result<(), SinkError> {
        let mut w = self
            .writer
            .lock()
            .map_err(|_| SinkError::Rejected("bell writer poisoned".to_string()))?;
        writeln!(w, "{BELL}Step complete: {}", step.title)?;
        w.flush()?;
        Ok(())
    }
}

/// Alert that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAlert;

impl StepAlert for NoAlert {
    fn step_completed(&self, _step: &RecipeStep) -> Result<(), SinkError> {
        Ok(())
    }
}

// ============================================================================
// RecordingSink
// ============================================================================

/// Keeps every event and alerted step in memory.
///
/// Useful for embedding the timer where the host polls for events rather
/// than reacting to them, and for tests.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<TimerEvent>>,
    alerts: Mutex<Vec<usize>>,
}

impl RecordingSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received so far, in order.
    #[must_use]
    pub fn events(&self) -> Vec<TimerEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Kinds of the events received so far.
    #[must_use]
    pub fn kinds(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .map(|e| e.iter().map(TimerEvent::kind).collect())
            .unwrap_or_default()
    }

    /// Indices of the steps alerted so far, in order.
    #[must_use]
    pub fn alerts(&self) -> Vec<usize> {
        self.alerts.lock().map(|a| a.clone()).unwrap_or_default()
    }

    /// Forgets everything recorded.
    pub fn clear(&self) {
        if let Ok(mut e) = self.events.lock() {
            e.clear();
        }
        if let Ok(mut a) = self.alerts.lock() {
            a.clear();
        }
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, event: &TimerEvent) -> Result<(), SinkError> {
        self.events
            .lock()
            .map_err(|_| SinkError::Rejected("recorder poisoned".to_string()))?
            .push(event.clone());
        Ok(())
    }
}

impl StepAlert for RecordingSink {
    fn step_completed(&self, step: &RecipeStep) -> Result<(), SinkError> {
        self.alerts
            .lock()
            .map_err(|_| SinkError::Rejected("recorder poisoned".to_string()))?
            .push(step.step_index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    impl NotificationSink for Failing {
        fn notify(&self, _event: &TimerEvent) -> Result<(), SinkError> {
            Err(SinkError::Rejected("nope".to_string()))
        }
    }

    #[derive(Clone)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn paused() -> TimerEvent {
        TimerEvent::TimerPaused {
            recipe_id: "r".to_string(),
            elapsed_time: 3,
            step_index: 0,
        }
    }

    #[test]
    fn fan_out_reaches_every_sink_despite_failure() {
        let recorder = Arc::new(RecordingSink::new());
        let fan = FanOut::new()
            .with(Arc::new(Failing))
            .with(Arc::clone(&recorder) as Arc<dyn NotificationSink>);
        assert_eq!(fan.len(), 2);

        let result = fan.notify(&paused());
        assert!(matches!(result, Err(SinkError::Rejected(_))));
        assert_eq!(recorder.kinds(), vec!["timer_paused"]);
    }

    #[test]
    fn empty_fan_out_is_ok() {
        assert!(FanOut::new().notify(&paused()).is_ok());
    }

    #[test]
    fn bell_writes_title() {
        let buf = SharedBuf(Arc::new(Mutex::new(Vec::new())));
        let bell = TerminalBell::new(Box::new(buf.clone()));
        let step = crate::recipe::Recipe::from_steps("r", "R", &[("Bloom", 45, 70)]).steps[0].clone();
        bell.step_completed(&step).unwrap();
        let out = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert_eq!(out, "\u{7}Step complete: Bloom\n");
    }

    #[test]
    fn recorder_clear() {
        let recorder = RecordingSink::new();
        recorder.notify(&paused()).unwrap();
        assert_eq!(recorder.events().len(), 1);
        recorder.clear();
        assert!(recorder.events().is_empty());
    }

    #[test]
    fn tracing_sink_never_fails() {
        assert!(TracingSink.notify(&paused()).is_ok());
    }
}
