//! Brew timer engine
//!
//! Leaves first: [`schedule`] precomputes cumulative boundaries, [`resolver`]
//! maps elapsed time onto them, [`water`] does the dosage arithmetic,
//! [`controller`] owns the mutable [`session`] and emits events, and
//! [`driver`] runs a controller on a tokio task with a real clock.

pub mod controller;
pub mod driver;
pub mod resolver;
pub mod schedule;
pub mod session;
pub mod water;

pub use controller::{TickOutcome, TimerController, TimerSnapshot};
pub use driver::{TimerCommand, TimerConfig, TimerHandle, spawn};
pub use resolver::{StepPosition, entered_step_index, position_at, resolve};
pub use schedule::StepSchedule;
pub use session::{TimerSession, TimerStatus};
pub use water::WaterUsage;
