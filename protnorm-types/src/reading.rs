use serde::{Deserialize, Serialize};

/// One measured well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WellReading {
    pub well_id: String,
    pub concentration_um: f64,
}

/// Readings for one plate, in input order.
///
/// Well ids are unique. Inserting an id that is already present keeps the
/// original position and replaces the concentration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlateReadings {
    readings: Vec<WellReading>,
}

impl PlateReadings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a reading. Returns the replaced concentration when `well_id` was already present.
    pub fn insert(&mut self, well_id: impl Into<String>, concentration_um: f64) -> Option<f64> {
        let well_id = well_id.into();
        match self.readings.iter_mut().find(|r| r.well_id == well_id) {
            Some(existing) => Some(std::mem::replace(
                &mut existing.concentration_um,
                concentration_um,
            )),
            None => {
                self.readings.push(WellReading {
                    well_id,
                    concentration_um,
                });
                None
            }
        }
    }

    pub fn get(&self, well_id: &str) -> Option<f64> {
        self.readings
            .iter()
            .find(|r| r.well_id == well_id)
            .map(|r| r.concentration_um)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WellReading> {
        self.readings.iter()
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Arithmetic mean over every reading on the plate. `None` for an empty plate.
    pub fn mean_concentration(&self) -> Option<f64> {
        if self.readings.is_empty() {
            return None;
        }
        let sum: f64 = self.readings.iter().map(|r| r.concentration_um).sum();
        Some(sum / self.readings.len() as f64)
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for PlateReadings {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut out = PlateReadings::new();
        for (well, conc) in iter {
            out.insert(well, conc);
        }
        out
    }
}

impl<'a> IntoIterator for &'a PlateReadings {
    type Item = &'a WellReading;
    type IntoIter = std::slice::Iter<'a, WellReading>;

    fn into_iter(self) -> Self::IntoIter {
        self.readings.iter()
    }
}
