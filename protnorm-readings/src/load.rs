use crate::well_id::normalize_well_id;
use camino::Utf8Path;
use fs_err as fs;
use protnorm_types::PlateReadings;
use std::io::Read;
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_WELL_COLUMN: &str = "Well_ID";
pub const DEFAULT_CONCENTRATION_COLUMN: &str = "Conc_uM_Final";

/// Which header names hold the well id and the final concentration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub well_column: String,
    pub concentration_column: String,
}

impl Default for ColumnSpec {
    fn default() -> Self {
        Self {
            well_column: DEFAULT_WELL_COLUMN.to_string(),
            concentration_column: DEFAULT_CONCENTRATION_COLUMN.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ReadingsLoadError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("table must contain '{column}' column (found: {found})")]
    MissingColumn { column: String, found: String },

    #[error("line {line}: empty well id")]
    EmptyWellId { line: u64 },

    #[error("line {line}: concentration '{value}' for well {well} is not a finite number")]
    InvalidConcentration {
        line: u64,
        well: String,
        value: String,
    },

    #[error("line {line}: concentration {value} for well {well} is negative")]
    NegativeConcentration { line: u64, well: String, value: f64 },

    #[error("table contains no readings")]
    NoReadings,
}

/// Load a concentration table from disk.
pub fn load_readings(
    path: &Utf8Path,
    columns: &ColumnSpec,
) -> Result<PlateReadings, ReadingsLoadError> {
    debug!(path = %path, "loading plate readings");
    let file = fs::File::open(path)?;
    parse_readings(file, columns)
}

/// Parse a concentration table from any reader.
///
/// Extra columns are ignored. Rows whose cells are all empty are skipped.
pub fn parse_readings<R: Read>(
    reader: R,
    columns: &ColumnSpec,
) -> Result<PlateReadings, ReadingsLoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let column_index = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| ReadingsLoadError::MissingColumn {
                column: name.to_string(),
                found: headers.iter().collect::<Vec<_>>().join(", "),
            })
    };
    let well_idx = column_index(&columns.well_column)?;
    let conc_idx = column_index(&columns.concentration_column)?;

    let mut readings = PlateReadings::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let line = record
            .position()
            .map(|p| p.line())
            .unwrap_or(i as u64 + 2);

        if record.iter().all(str::is_empty) {
            debug!(line, "skipping empty row");
            continue;
        }

        let raw_well = record.get(well_idx).unwrap_or_default();
        if raw_well.is_empty() {
            return Err(ReadingsLoadError::EmptyWellId { line });
        }
        let well = normalize_well_id(raw_well);

        let raw_conc = record.get(conc_idx).unwrap_or_default();
        let concentration = parse_concentration(raw_conc, line, &well)?;

        if let Some(previous) = readings.insert(well.clone(), concentration) {
            warn!(
                well = %well,
                line,
                previous,
                concentration,
                "duplicate well id; later reading replaces earlier one"
            );
        }
    }

    if readings.is_empty() {
        return Err(ReadingsLoadError::NoReadings);
    }

    debug!(wells = readings.len(), "loaded plate readings");
    Ok(readings)
}

fn parse_concentration(raw: &str, line: u64, well: &str) -> Result<f64, ReadingsLoadError> {
    let invalid = || ReadingsLoadError::InvalidConcentration {
        line,
        well: well.to_string(),
        value: raw.to_string(),
    };

    let value: f64 = raw.parse().map_err(|_| invalid())?;
    if !value.is_finite() {
        return Err(invalid());
    }
    if value < 0.0 {
        return Err(ReadingsLoadError::NegativeConcentration {
            line,
            well: well.to_string(),
            value,
        });
    }
    Ok(value)
}
