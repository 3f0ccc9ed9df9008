//! Output artifacts: the liquid-handler instruction table.
//!
//! Owns the file name convention, the overwrite policy and CSV serialization.
//! A table is either written completely or not at all.

mod error;
mod write;

pub use error::ArtifactError;
pub use write::{
    OverwritePolicy, RowLayout, WriteOptions, output_file_name, validate_run_id, write_plan_csv,
    write_rows,
};
