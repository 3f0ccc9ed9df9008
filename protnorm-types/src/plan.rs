use serde::{Deserialize, Serialize};

/// How a well is dosed. Resolved once per well before any volume is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WellRole {
    /// Background control, dosed from the plate-wide mean concentration.
    Blank,
    /// Receives neither stock nor buffer.
    Excluded { reason: ExclusionReason },
    /// Dosed from its own reading, split across dispenses when over the tip limit.
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    /// Listed in the excluded wells (e.g. GFP controls).
    Listed,
    ZeroConcentration,
}

impl WellRole {
    pub fn label(&self) -> &'static str {
        match self {
            WellRole::Blank => "blank",
            WellRole::Excluded {
                reason: ExclusionReason::Listed,
            } => "excluded",
            WellRole::Excluded {
                reason: ExclusionReason::ZeroConcentration,
            } => "zero",
            WellRole::General => "general",
        }
    }
}

/// One well's dispense instruction, before expansion into physical rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedDispense {
    pub source_well: String,
    pub dest_well: String,
    pub role: WellRole,
    pub concentration_um: f64,

    /// Stock volume before capping or splitting.
    pub raw_stock_volume_ul: f64,

    /// Per-dispense stock volume.
    pub stock_volume_ul: f64,

    /// Per-dispense buffer volume. Negative when the raw stock exceeds the target volume.
    pub buffer_volume_ul: f64,

    pub split_count: u32,
}

impl PlannedDispense {
    pub fn to_row(&self) -> DispenseRow {
        DispenseRow {
            source_well: self.source_well.clone(),
            dest_well: self.dest_well.clone(),
            stock_volume_ul: self.stock_volume_ul,
            buffer_volume_ul: self.buffer_volume_ul,
            divide_counter: self.split_count,
        }
    }

    pub fn total_stock_ul(&self) -> f64 {
        self.stock_volume_ul * f64::from(self.split_count)
    }

    pub fn total_buffer_ul(&self) -> f64 {
        self.buffer_volume_ul * f64::from(self.split_count)
    }
}

/// A physical row of the liquid-handler instruction table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispenseRow {
    #[serde(rename = "SourceWell")]
    pub source_well: String,

    #[serde(rename = "DestWell")]
    pub dest_well: String,

    #[serde(rename = "PPVol")]
    pub stock_volume_ul: f64,

    #[serde(rename = "DilVol")]
    pub buffer_volume_ul: f64,

    #[serde(rename = "DivideCounter")]
    pub divide_counter: u32,
}

/// Something worth a human look that did not stop planning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Anomaly {
    /// The stock alone overfills the well; no physical buffer dispense exists.
    NegativeBuffer { well: String, buffer_volume_ul: f64 },
}

/// Echo of the settings a plan was computed with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanParameters {
    pub target_concentration_um: f64,
    pub target_volume_ul: f64,
    pub max_tip_volume_ul: f64,

    #[serde(default)]
    pub blank_wells: Vec<String>,

    #[serde(default)]
    pub excluded_wells: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub wells_total: u64,
    pub rows_total: u64,
    pub wells_split: u64,
    pub wells_blank: u64,
    pub wells_excluded: u64,
    pub stock_total_ul: f64,
    pub buffer_total_ul: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumePlan {
    pub schema: String,
    pub parameters: PlanParameters,

    /// Plate-wide mean used for blank wells, when any blank was present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blank_reference_mean_um: Option<f64>,

    #[serde(default)]
    pub dispenses: Vec<PlannedDispense>,

    #[serde(default)]
    pub anomalies: Vec<Anomaly>,

    pub summary: PlanSummary,
}

impl VolumePlan {
    pub fn new(parameters: PlanParameters) -> Self {
        Self {
            schema: crate::schema::PROTNORM_PLAN_V1.to_string(),
            parameters,
            blank_reference_mean_um: None,
            dispenses: vec![],
            anomalies: vec![],
            summary: PlanSummary::default(),
        }
    }

    /// Physical rows: each dispense repeated `split_count` times, in reading order.
    pub fn rows(&self) -> Vec<DispenseRow> {
        self.dispenses
            .iter()
            .flat_map(|d| std::iter::repeat_n(d.to_row(), d.split_count as usize))
            .collect()
    }

    /// One row per well; `DivideCounter` carries the repeat count.
    pub fn compact_rows(&self) -> Vec<DispenseRow> {
        self.dispenses.iter().map(PlannedDispense::to_row).collect()
    }
}
