//! Error types for volume planning.
//!
//! Every variant is terminal for the run: no plan is produced and nothing is written.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    /// A planner setting is out of range (non-positive volume, zero split ceiling).
    #[error("invalid planner config: {message}")]
    InvalidConfig { message: String },

    /// A reading that the loader should have rejected reached the planner.
    #[error("invalid concentration {value} for well {well}")]
    InvalidConcentration { well: String, value: f64 },

    /// Blank wells are dosed from the plate mean; a zero mean has no dilution.
    #[error("cannot compute blank dilution: all reference concentrations are zero")]
    ZeroReferenceMean,

    /// The divisor search hit its ceiling, usually from a near-zero concentration.
    #[error(
        "well {well}: stock volume {raw_stock_ul} uL needs more than {max_splits} dispenses to stay under the tip limit"
    )]
    SplitLimitExceeded {
        well: String,
        raw_stock_ul: f64,
        max_splits: u32,
    },
}
