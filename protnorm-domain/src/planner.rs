use crate::config::PlannerConfig;
use crate::error::PlanError;
use crate::split::split_dispense;
use protnorm_types::{
    Anomaly, PlanSummary, PlannedDispense, PlateReadings, VolumePlan, WellRole,
};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct Planner {
    config: PlannerConfig,
}

impl Default for Planner {
    fn default() -> Self {
        Self {
            config: PlannerConfig::default(),
        }
    }
}

impl Planner {
    pub fn new(config: PlannerConfig) -> Result<Self, PlanError> {
        let config = config.normalized();
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Compute one dispense per reading, in reading order.
    pub fn plan(&self, readings: &PlateReadings) -> Result<VolumePlan, PlanError> {
        let cfg = &self.config;
        let mut plan = VolumePlan::new(cfg.parameters());

        for r in readings {
            if !r.concentration_um.is_finite() || r.concentration_um < 0.0 {
                return Err(PlanError::InvalidConcentration {
                    well: r.well_id.clone(),
                    value: r.concentration_um,
                });
            }
        }

        // Every reading counts toward the mean, blanks and excluded wells included.
        let blank_mean = if readings
            .iter()
            .any(|r| cfg.blank_wells.contains(&r.well_id.to_uppercase()))
        {
            let mean = readings.mean_concentration().unwrap_or(0.0);
            if mean <= 0.0 {
                return Err(PlanError::ZeroReferenceMean);
            }
            debug!(mean_um = mean, "blank reference mean");
            Some(mean)
        } else {
            None
        };
        plan.blank_reference_mean_um = blank_mean;

        let mut dispenses = Vec::with_capacity(readings.len());
        for r in readings {
            let well = r.well_id.to_uppercase();
            let role = cfg.role_of(&well, r.concentration_um);
            let dispense = match role {
                WellRole::Blank => {
                    let Some(mean) = blank_mean else {
                        return Err(PlanError::ZeroReferenceMean);
                    };
                    blank_dispense(cfg, well, r.concentration_um, mean)
                }
                WellRole::Excluded { .. } => PlannedDispense {
                    source_well: well.clone(),
                    dest_well: well,
                    role,
                    concentration_um: r.concentration_um,
                    raw_stock_volume_ul: 0.0,
                    stock_volume_ul: 0.0,
                    buffer_volume_ul: 0.0,
                    split_count: 1,
                },
                WellRole::General => general_dispense(cfg, well, r.concentration_um)?,
            };

            if dispense.split_count > 1 {
                debug!(
                    well = %dispense.dest_well,
                    splits = dispense.split_count,
                    raw_stock_ul = dispense.raw_stock_volume_ul,
                    "stock split across dispenses"
                );
            }
            if dispense.buffer_volume_ul < 0.0 {
                warn!(
                    well = %dispense.dest_well,
                    buffer_ul = dispense.buffer_volume_ul,
                    "stock alone exceeds the target volume; buffer volume is negative"
                );
                plan.anomalies.push(Anomaly::NegativeBuffer {
                    well: dispense.dest_well.clone(),
                    buffer_volume_ul: dispense.buffer_volume_ul,
                });
            }
            dispenses.push(dispense);
        }

        plan.summary = summarize(&dispenses);
        plan.dispenses = dispenses;
        Ok(plan)
    }
}

fn blank_dispense(
    cfg: &PlannerConfig,
    well: String,
    concentration_um: f64,
    mean_um: f64,
) -> PlannedDispense {
    let raw = cfg.stock_volume_for(mean_um);
    let stock = raw.min(cfg.max_tip_volume_ul);
    PlannedDispense {
        source_well: well.clone(),
        dest_well: well,
        role: WellRole::Blank,
        concentration_um,
        raw_stock_volume_ul: raw,
        stock_volume_ul: stock,
        buffer_volume_ul: cfg.target_volume_ul - stock,
        split_count: 1,
    }
}

fn general_dispense(
    cfg: &PlannerConfig,
    well: String,
    concentration_um: f64,
) -> Result<PlannedDispense, PlanError> {
    let raw = cfg.stock_volume_for(concentration_um);
    let split = split_dispense(
        raw,
        cfg.target_volume_ul,
        cfg.max_tip_volume_ul,
        cfg.max_splits,
    )
    .ok_or_else(|| PlanError::SplitLimitExceeded {
        well: well.clone(),
        raw_stock_ul: raw,
        max_splits: cfg.max_splits,
    })?;

    Ok(PlannedDispense {
        source_well: well.clone(),
        dest_well: well,
        role: WellRole::General,
        concentration_um,
        raw_stock_volume_ul: raw,
        stock_volume_ul: split.stock_volume_ul,
        buffer_volume_ul: split.buffer_volume_ul,
        split_count: split.count,
    })
}

fn summarize(dispenses: &[PlannedDispense]) -> PlanSummary {
    let mut summary = PlanSummary {
        wells_total: dispenses.len() as u64,
        ..Default::default()
    };
    for d in dispenses {
        summary.rows_total += u64::from(d.split_count);
        summary.stock_total_ul += d.total_stock_ul();
        summary.buffer_total_ul += d.total_buffer_ul();
        if d.split_count > 1 {
            summary.wells_split += 1;
        }
        match d.role {
            WellRole::Blank => summary.wells_blank += 1,
            WellRole::Excluded { .. } => summary.wells_excluded += 1,
            WellRole::General => {}
        }
    }
    summary
}
