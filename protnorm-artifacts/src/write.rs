use crate::error::ArtifactError;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use protnorm_types::{DispenseRow, VolumePlan};
use serde::{Deserialize, Serialize};
use std::io::Write;
use tracing::{debug, info, warn};

const HEADER: [&str; 5] = ["SourceWell", "DestWell", "PPVol", "DilVol", "DivideCounter"];

/// What to do when the destination table already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverwritePolicy {
    /// Refuse when the table exists. The check runs before the rename, so a
    /// file created by another process in between is still replaced.
    #[default]
    Fail,
    Force,
}

/// How split dispenses appear in the table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowLayout {
    /// One physical row per dispense; a split well repeats its row.
    #[default]
    Expanded,
    /// One row per well; the robot reads the repeat count from `DivideCounter`.
    Compact,
}

impl OverwritePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverwritePolicy::Fail => "fail",
            OverwritePolicy::Force => "force",
        }
    }
}

impl RowLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            RowLayout::Expanded => "expanded",
            RowLayout::Compact => "compact",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    pub overwrite: OverwritePolicy,
    pub layout: RowLayout,
}

/// Check that a run id can be embedded in a file name. Returns it trimmed.
pub fn validate_run_id(run_id: &str) -> Result<&str, ArtifactError> {
    let trimmed = run_id.trim();
    let reason = if trimmed.is_empty() {
        Some("must not be empty")
    } else if trimmed.contains(['/', '\\']) {
        Some("must not contain path separators")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(ArtifactError::InvalidRunId {
            run_id: run_id.to_string(),
            reason,
        }),
        None => Ok(trimmed),
    }
}

/// `Protein_Norm_{run}_{conc}uM.csv`, e.g. `Protein_Norm_R1_1_2uM.csv`.
pub fn output_file_name(
    run_id: &str,
    target_concentration_um: f64,
) -> Result<String, ArtifactError> {
    let run_id = validate_run_id(run_id)?;
    Ok(format!(
        "Protein_Norm_{run_id}_{target_concentration_um}uM.csv"
    ))
}

/// Serialize rows with the instrument header. An empty slice still gets a header.
pub fn write_rows<W: Write>(writer: W, rows: &[DispenseRow]) -> Result<(), ArtifactError> {
    let mut wtr = csv::Writer::from_writer(writer);
    if rows.is_empty() {
        wtr.write_record(HEADER)?;
    }
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the plan's instruction table into `out_dir` and return its path.
///
/// The table is staged in a hidden sibling file and renamed into place, so a
/// failed write never leaves a truncated table behind.
pub fn write_plan_csv(
    out_dir: &Utf8Path,
    run_id: &str,
    plan: &VolumePlan,
    opts: &WriteOptions,
) -> Result<Utf8PathBuf, ArtifactError> {
    let name = output_file_name(run_id, plan.parameters.target_concentration_um)?;
    let path = out_dir.join(&name);

    if path.exists() {
        match opts.overwrite {
            OverwritePolicy::Fail => return Err(ArtifactError::OutputExists { path }),
            OverwritePolicy::Force => warn!(path = %path, "overwriting existing dispense table"),
        }
    }

    let rows = match opts.layout {
        RowLayout::Expanded => plan.rows(),
        RowLayout::Compact => plan.compact_rows(),
    };
    let mut buf = Vec::new();
    write_rows(&mut buf, &rows)?;

    let staging = out_dir.join(format!(".{name}.tmp"));
    debug!(path = %staging, bytes = buf.len(), "staging dispense table");
    write_staged(&staging, &path, |p| fs::write(p, &buf))?;

    info!(path = %path, rows = rows.len(), "wrote dispense table");
    Ok(path)
}

/// Fill `staging` and rename it onto `path`. The staging file is removed if either step fails.
fn write_staged(
    staging: &Utf8Path,
    path: &Utf8Path,
    fill: impl FnOnce(&Utf8Path) -> std::io::Result<()>,
) -> Result<(), ArtifactError> {
    if let Err(e) = fill(staging).and_then(|()| fs::rename(staging, path)) {
        let _ = fs::remove_file(staging);
        return Err(e.into());
    }
    Ok(())
}
