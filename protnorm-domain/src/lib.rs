//! Domain logic: turn plate readings into a deterministic volume plan.
//!
//! This crate owns *how much* stock and buffer each well receives. It does not
//! read tables or write instruction files; those live in `protnorm-readings`
//! and `protnorm-artifacts`.

mod config;
mod error;
mod planner;
mod split;

pub use config::PlannerConfig;
pub use error::PlanError;
pub use planner::Planner;
pub use split::{Split, split_dispense};
