//! Background processing of submitted recipe URLs.

mod processor;
mod scheduler;

pub use processor::{link_recipe_if_exists, BatchReport, JobOutcome, QueueProcessor};
pub use scheduler::QueueScheduler;
