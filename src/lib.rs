//! `brewtimer` - guided pour-over brew timer
//!
//! Loads recipes made of timed, water-dosed steps and runs them through a
//! step-progression engine that tracks elapsed time, the active step,
//! progress and water, and reports step completions exactly once.

pub mod cli;
pub mod error;
pub mod notify;
pub mod observability;
pub mod recipe;
pub mod timer;
