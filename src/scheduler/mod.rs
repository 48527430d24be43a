//! Posting scheduler module.
//!
//! Generates and publishes one dish per configured period.

mod runner;
mod state;

pub use runner::{DishScheduler, SchedulerError, SchedulerMessage};
pub use state::SchedulerState;
