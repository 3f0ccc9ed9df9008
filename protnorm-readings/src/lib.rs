//! Plate reading ingestion.
//!
//! Turns a concentration table exported by the plate reader into ordered
//! [`PlateReadings`](protnorm_types::PlateReadings). Validation is strict: a
//! table that is missing a column or holds a non-numeric concentration is
//! rejected as a whole, never partially loaded.

mod load;
mod well_id;

pub use load::{ColumnSpec, ReadingsLoadError, load_readings, parse_readings};
pub use well_id::normalize_well_id;
