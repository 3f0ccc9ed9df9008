//! Error types for protnorm-artifacts.
//!
//! This module distinguishes between:
//! - Output collisions (exit code 2): the destination table already exists
//! - Runtime errors (exit code 1): bad run ids, I/O errors, serialization errors

use camino::Utf8PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArtifactError {
    /// The run id cannot be embedded in a file name.
    #[error("invalid run id '{run_id}': {reason}")]
    InvalidRunId { run_id: String, reason: &'static str },

    /// The destination exists and the overwrite policy is `fail`.
    #[error("{path} already exists; pass --force to overwrite")]
    OutputExists { path: Utf8PathBuf },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ArtifactError {
    /// Returns true if the error is an output collision (exit code 2).
    pub fn is_collision(&self) -> bool {
        matches!(self, ArtifactError::OutputExists { .. })
    }

    /// Returns the recommended exit code for this error.
    pub fn exit_code(&self) -> u8 {
        if self.is_collision() { 2 } else { 1 }
    }
}
