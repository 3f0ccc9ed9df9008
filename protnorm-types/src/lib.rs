//! Shared DTOs for the protnorm workspace.
//!
//! # Design constraints
//! - Plans and rows are written to disk (CSV, JSON); field names on the wire are stable.
//! - Volumes are microlitres, concentrations micromolar. Field names carry the unit.

pub mod plan;
pub mod reading;

pub use plan::{
    Anomaly, DispenseRow, ExclusionReason, PlanParameters, PlanSummary, PlannedDispense,
    VolumePlan, WellRole,
};
pub use reading::{PlateReadings, WellReading};

/// Schema identifiers.
pub mod schema {
    pub const PROTNORM_PLAN_V1: &str = "protnorm.plan.v1";
}
