use crate::error::PlanError;
use protnorm_types::{ExclusionReason, PlanParameters, WellRole};
use std::collections::BTreeSet;

pub const DEFAULT_TARGET_CONCENTRATION_UM: f64 = 2.0;
pub const DEFAULT_TARGET_VOLUME_UL: f64 = 300.0;
pub const DEFAULT_MAX_TIP_VOLUME_UL: f64 = 50.0;
pub const DEFAULT_BLANK_WELLS: &[&str] = &["F5", "A12"];
pub const DEFAULT_EXCLUDED_WELLS: &[&str] = &["A1", "F9"];

/// Upper bound on the divisor search. Only near-zero concentrations get close.
pub const DEFAULT_MAX_SPLITS: u32 = 10_000;

/// Immutable settings for one planning run.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerConfig {
    pub target_concentration_um: f64,
    pub target_volume_ul: f64,
    pub max_tip_volume_ul: f64,
    pub blank_wells: BTreeSet<String>,
    pub excluded_wells: BTreeSet<String>,
    pub max_splits: u32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            target_concentration_um: DEFAULT_TARGET_CONCENTRATION_UM,
            target_volume_ul: DEFAULT_TARGET_VOLUME_UL,
            max_tip_volume_ul: DEFAULT_MAX_TIP_VOLUME_UL,
            blank_wells: DEFAULT_BLANK_WELLS.iter().map(|w| w.to_string()).collect(),
            excluded_wells: DEFAULT_EXCLUDED_WELLS
                .iter()
                .map(|w| w.to_string())
                .collect(),
            max_splits: DEFAULT_MAX_SPLITS,
        }
    }
}

impl PlannerConfig {
    /// Upper-case and trim well ids so they compare against normalized readings.
    pub fn normalized(mut self) -> Self {
        self.blank_wells = normalize_set(&self.blank_wells);
        self.excluded_wells = normalize_set(&self.excluded_wells);
        self
    }

    pub fn validate(&self) -> Result<(), PlanError> {
        for (name, value) in [
            ("target_concentration_um", self.target_concentration_um),
            ("target_volume_ul", self.target_volume_ul),
            ("max_tip_volume_ul", self.max_tip_volume_ul),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(PlanError::InvalidConfig {
                    message: format!("{name} must be a positive number, got {value}"),
                });
            }
        }
        if self.max_splits == 0 {
            return Err(PlanError::InvalidConfig {
                message: "max_splits must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Classify a well. `well_id` must already be upper-case.
    ///
    /// Blank membership wins over everything, then zero concentration or an
    /// excluded listing, then the general dilution rule.
    pub fn role_of(&self, well_id: &str, concentration_um: f64) -> WellRole {
        if self.blank_wells.contains(well_id) {
            WellRole::Blank
        } else if concentration_um == 0.0 {
            WellRole::Excluded {
                reason: ExclusionReason::ZeroConcentration,
            }
        } else if self.excluded_wells.contains(well_id) {
            WellRole::Excluded {
                reason: ExclusionReason::Listed,
            }
        } else {
            WellRole::General
        }
    }

    /// Stock volume that brings `concentration_um` down to the target (C1·V1 = C2·V2).
    pub fn stock_volume_for(&self, concentration_um: f64) -> f64 {
        (self.target_concentration_um * self.target_volume_ul) / concentration_um
    }

    pub fn parameters(&self) -> PlanParameters {
        PlanParameters {
            target_concentration_um: self.target_concentration_um,
            target_volume_ul: self.target_volume_ul,
            max_tip_volume_ul: self.max_tip_volume_ul,
            blank_wells: self.blank_wells.iter().cloned().collect(),
            excluded_wells: self.excluded_wells.iter().cloned().collect(),
        }
    }
}

fn normalize_set(wells: &BTreeSet<String>) -> BTreeSet<String> {
    wells
        .iter()
        .map(|w| w.trim().to_uppercase())
        .filter(|w| !w.is_empty())
        .collect()
}
