//! Configuration file loading for protnorm.
//!
//! Discovers and loads `protnorm.toml` from the working directory.
//! Merges config file settings with CLI arguments (CLI takes precedence).

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use protnorm_artifacts::{OverwritePolicy, RowLayout, WriteOptions};
use protnorm_domain::PlannerConfig;
use protnorm_readings::ColumnSpec;
use serde::Deserialize;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "protnorm.toml";

/// Top-level configuration from protnorm.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProtnormConfig {
    /// Dilution targets and tip limit.
    pub run: RunConfig,

    /// Special-cased wells.
    pub wells: WellsConfig,

    /// Input table column names.
    pub input: InputConfig,

    /// Output table settings.
    pub output: OutputConfig,
}

/// Run section of the config.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Desired final concentration in each well (uM).
    pub target_concentration_um: f64,

    /// Desired final volume in each well (uL).
    pub target_volume_ul: f64,

    /// Largest volume a single pipetting action may transfer (uL).
    pub max_tip_volume_ul: f64,

    /// Upper bound on repeated dispenses for one well.
    pub max_splits: u32,
}

impl Default for RunConfig {
    fn default() -> Self {
        let planner = PlannerConfig::default();
        Self {
            target_concentration_um: planner.target_concentration_um,
            target_volume_ul: planner.target_volume_ul,
            max_tip_volume_ul: planner.max_tip_volume_ul,
            max_splits: planner.max_splits,
        }
    }
}

/// Wells section of the config.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WellsConfig {
    /// Blank-control wells, dosed from the plate mean.
    pub blank: Vec<String>,

    /// Wells that receive neither stock nor buffer (e.g. GFP controls).
    pub excluded: Vec<String>,
}

impl Default for WellsConfig {
    fn default() -> Self {
        let planner = PlannerConfig::default();
        Self {
            blank: planner.blank_wells.into_iter().collect(),
            excluded: planner.excluded_wells.into_iter().collect(),
        }
    }
}

/// Input section of the config.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub well_column: String,
    pub concentration_column: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        let columns = ColumnSpec::default();
        Self {
            well_column: columns.well_column,
            concentration_column: columns.concentration_column,
        }
    }
}

/// Output section of the config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory the instruction table is written to (default: current directory).
    pub dir: Option<Utf8PathBuf>,

    /// `fail` (default) or `force` when the table already exists.
    pub overwrite: OverwritePolicy,

    /// `expanded` (default) or `compact`.
    pub layout: RowLayout,
}

/// Discover the protnorm.toml config file.
///
/// Searches for `protnorm.toml` in `dir`. Returns `None` if no config file is found.
pub fn discover_config(dir: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

/// Load and parse a protnorm.toml config file.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<ProtnormConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

/// Parse a config file from a string.
pub fn parse_config(contents: &str) -> anyhow::Result<ProtnormConfig> {
    let config: ProtnormConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load an explicit config path, or discover one in `dir`, or fall back to defaults.
///
/// An explicit path that does not exist is an error.
pub fn load_or_default(
    explicit: Option<&Utf8Path>,
    dir: &Utf8Path,
) -> anyhow::Result<ProtnormConfig> {
    if let Some(path) = explicit {
        return load_config(path);
    }
    match discover_config(dir) {
        Some(path) => load_config(&path),
        None => Ok(ProtnormConfig::default()),
    }
}

/// CLI values that override the config file. `None` and empty lists leave the file value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub target_concentration_um: Option<f64>,
    pub target_volume_ul: Option<f64>,
    pub max_tip_volume_ul: Option<f64>,
    pub blank: Vec<String>,
    pub exclude: Vec<String>,
    pub out_dir: Option<Utf8PathBuf>,
    pub force: bool,
    pub layout: Option<RowLayout>,
}

/// Merged configuration combining config file and CLI arguments.
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub planner: PlannerConfig,
    pub columns: ColumnSpec,
    pub out_dir: Utf8PathBuf,
    pub write: WriteOptions,
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: ProtnormConfig,
}

impl ConfigMerger {
    /// Create a new merger from a loaded config.
    pub fn new(config: ProtnormConfig) -> Self {
        Self { config }
    }

    /// Scalars given on the CLI replace the file value.
    /// CLI `blank` and `exclude` lists extend the file lists.
    /// CLI `force` wins over the file's overwrite policy.
    pub fn merge(self, cli: &Overrides) -> MergedConfig {
        let ProtnormConfig {
            run,
            wells,
            input,
            output,
        } = self.config;

        let planner = PlannerConfig {
            target_concentration_um: cli
                .target_concentration_um
                .unwrap_or(run.target_concentration_um),
            target_volume_ul: cli.target_volume_ul.unwrap_or(run.target_volume_ul),
            max_tip_volume_ul: cli.max_tip_volume_ul.unwrap_or(run.max_tip_volume_ul),
            blank_wells: wells.blank.into_iter().chain(cli.blank.clone()).collect(),
            excluded_wells: wells
                .excluded
                .into_iter()
                .chain(cli.exclude.clone())
                .collect(),
            max_splits: run.max_splits,
        }
        .normalized();

        let overwrite = if cli.force {
            OverwritePolicy::Force
        } else {
            output.overwrite
        };

        MergedConfig {
            planner,
            columns: ColumnSpec {
                well_column: input.well_column,
                concentration_column: input.concentration_column,
            },
            out_dir: cli
                .out_dir
                .clone()
                .or(output.dir)
                .unwrap_or_else(|| Utf8PathBuf::from(".")),
            write: WriteOptions {
                overwrite,
                layout: cli.layout.unwrap_or(output.layout),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_example_config() {
        let contents = r#"
[run]
target_concentration_um = 2.5
target_volume_ul = 200.0
max_tip_volume_ul = 20.0
max_splits = 64

[wells]
blank = ["H12"]
excluded = ["A1", "A2"]

[input]
well_column = "Well"
concentration_column = "Conc"

[output]
dir = "out"
overwrite = "force"
layout = "compact"
"#;

        let config = parse_config(contents).unwrap();
        assert_eq!(config.run.target_concentration_um, 2.5);
        assert_eq!(config.run.target_volume_ul, 200.0);
        assert_eq!(config.run.max_tip_volume_ul, 20.0);
        assert_eq!(config.run.max_splits, 64);
        assert_eq!(config.wells.blank, vec!["H12"]);
        assert_eq!(config.wells.excluded, vec!["A1", "A2"]);
        assert_eq!(config.input.well_column, "Well");
        assert_eq!(config.output.dir, Some(Utf8PathBuf::from("out")));
        assert_eq!(config.output.overwrite, OverwritePolicy::Force);
        assert_eq!(config.output.layout, RowLayout::Compact);
    }

    #[test]
    fn test_parse_minimal_config() {
        let contents = r#"
[run]
max_tip_volume_ul = 100.0
"#;

        let config = parse_config(contents).unwrap();
        assert_eq!(config.run.max_tip_volume_ul, 100.0);
        // Defaults
        assert_eq!(config.run.target_concentration_um, 2.0);
        assert_eq!(config.wells.blank, vec!["A12", "F5"]);
        assert_eq!(config.input.concentration_column, "Conc_uM_Final");
        assert_eq!(config.output.overwrite, OverwritePolicy::Fail);
    }

    #[test]
    fn test_parse_empty_config() {
        let config = parse_config("").unwrap();
        assert_eq!(config.run.target_volume_ul, 300.0);
        assert_eq!(config.wells.excluded, vec!["A1", "F9"]);
        assert!(config.output.dir.is_none());
    }

    #[test]
    fn test_parse_rejects_unknown_policy() {
        let err = parse_config("[output]\noverwrite = \"ask\"\n").unwrap_err();
        assert!(format!("{err:?}").contains("invalid TOML"));
    }

    #[test]
    fn test_empty_well_lists_disable_special_wells() {
        let config = parse_config("[wells]\nblank = []\nexcluded = []\n").unwrap();
        let merged = ConfigMerger::new(config).merge(&Overrides::default());
        assert!(merged.planner.blank_wells.is_empty());
        assert!(merged.planner.excluded_wells.is_empty());
    }

    #[test]
    fn test_merge_cli_scalars_override() {
        let config = parse_config("[run]\ntarget_volume_ul = 200.0\n").unwrap();
        let merged = ConfigMerger::new(config).merge(&Overrides {
            target_volume_ul: Some(150.0),
            max_tip_volume_ul: Some(25.0),
            ..Default::default()
        });

        assert_eq!(merged.planner.target_volume_ul, 150.0);
        assert_eq!(merged.planner.max_tip_volume_ul, 25.0);
        assert_eq!(merged.planner.target_concentration_um, 2.0);
    }

    #[test]
    fn test_merge_cli_wells_extend_and_normalize() {
        let config = parse_config("[wells]\nblank = [\"F5\"]\n").unwrap();
        let merged = ConfigMerger::new(config).merge(&Overrides {
            blank: vec!["h12".to_string(), "F5".to_string()],
            exclude: vec!["c3".to_string()],
            ..Default::default()
        });

        let blanks: Vec<&str> = merged.planner.blank_wells.iter().map(String::as_str).collect();
        assert_eq!(blanks, vec!["F5", "H12"]);
        assert!(merged.planner.excluded_wells.contains("C3"));
        assert!(merged.planner.excluded_wells.contains("A1"));
    }

    #[test]
    fn test_merge_force_overrides_config() {
        let merged = ConfigMerger::new(ProtnormConfig::default()).merge(&Overrides {
            force: true,
            ..Default::default()
        });
        assert_eq!(merged.write.overwrite, OverwritePolicy::Force);
    }

    #[test]
    fn test_merge_config_policy_used_when_cli_not_forced() {
        let config = parse_config("[output]\noverwrite = \"force\"\n").unwrap();
        let merged = ConfigMerger::new(config).merge(&Overrides::default());
        assert_eq!(merged.write.overwrite, OverwritePolicy::Force);
    }

    #[test]
    fn test_merge_out_dir_precedence() {
        let config = parse_config("[output]\ndir = \"from-file\"\n").unwrap();
        let merged = ConfigMerger::new(config.clone()).merge(&Overrides::default());
        assert_eq!(merged.out_dir, Utf8PathBuf::from("from-file"));

        let merged = ConfigMerger::new(config).merge(&Overrides {
            out_dir: Some(Utf8PathBuf::from("from-cli")),
            ..Default::default()
        });
        assert_eq!(merged.out_dir, Utf8PathBuf::from("from-cli"));

        let merged = ConfigMerger::new(ProtnormConfig::default()).merge(&Overrides::default());
        assert_eq!(merged.out_dir, Utf8PathBuf::from("."));
    }

    #[test]
    fn test_discover_config_some_and_none() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        assert!(discover_config(&root).is_none());

        std::fs::write(root.join(CONFIG_FILE_NAME), "").expect("write config");
        assert!(discover_config(&root).is_some());
    }

    #[test]
    fn test_load_or_default_returns_default_when_missing() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        let cfg = load_or_default(None, &root).expect("load default");
        assert_eq!(cfg.run.max_tip_volume_ul, 50.0);
    }

    #[test]
    fn test_load_or_default_explicit_missing_is_error() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        let missing = root.join("nope.toml");
        assert!(load_or_default(Some(&missing), &root).is_err());
    }
}
