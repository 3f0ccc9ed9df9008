mod config;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand};
use config::{ConfigMerger, MergedConfig, Overrides};
use fs_err as fs;
use protnorm_artifacts::{ArtifactError, RowLayout, validate_run_id, write_plan_csv};
use protnorm_domain::Planner;
use protnorm_readings::load_readings;
use protnorm_render::render_plan_md;
use protnorm_types::VolumePlan;
use std::io::IsTerminal;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "protnorm",
    version,
    about = "Turn a plate concentration table into a liquid-handler volume plan."
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Plan volumes and write the instruction table.
    Plan(PlanArgs),
    /// Plan volumes and print them without writing anything.
    Preview(PreviewArgs),
    /// Print the effective configuration.
    ShowConfig(ShowConfigArgs),
}

/// Settings shared by every command that plans volumes.
#[derive(Debug, Args)]
struct PlanningArgs {
    /// Config file (default: ./protnorm.toml when present).
    #[arg(long, env = "PROTNORM_CONFIG")]
    config: Option<Utf8PathBuf>,

    /// Target final concentration in uM.
    #[arg(long)]
    target_conc: Option<f64>,

    /// Target final volume in uL.
    #[arg(long)]
    target_volume: Option<f64>,

    /// Maximum volume per dispense in uL.
    #[arg(long)]
    tip_max: Option<f64>,

    /// Additional blank-control well (repeatable).
    #[arg(long = "blank", value_name = "WELL")]
    blank: Vec<String>,

    /// Additional excluded well (repeatable).
    #[arg(long = "exclude", value_name = "WELL")]
    exclude: Vec<String>,
}

#[derive(Debug, Parser)]
struct PlanArgs {
    /// Concentration table (CSV with Well_ID and Conc_uM_Final columns).
    #[arg(long, short)]
    input: Utf8PathBuf,

    /// Run id embedded in the output file name (e.g. R1_1).
    #[arg(long, short)]
    run: String,

    /// Output directory (default: current directory).
    #[arg(long)]
    out_dir: Option<Utf8PathBuf>,

    /// Overwrite an existing instruction table.
    #[arg(long, default_value_t = false)]
    force: bool,

    /// Row layout of the instruction table.
    #[arg(long, value_enum)]
    layout: Option<LayoutArg>,

    #[command(flatten)]
    planning: PlanningArgs,
}

#[derive(Debug, Parser)]
struct PreviewArgs {
    /// Concentration table (CSV with Well_ID and Conc_uM_Final columns).
    #[arg(long, short)]
    input: Utf8PathBuf,

    /// Output format (markdown, json).
    #[arg(long, value_enum, default_value = "markdown")]
    format: PreviewFormat,

    #[command(flatten)]
    planning: PlanningArgs,
}

#[derive(Debug, Parser)]
struct ShowConfigArgs {
    /// Output format (text, json).
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    #[command(flatten)]
    planning: PlanningArgs,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum LayoutArg {
    Expanded,
    Compact,
}

impl From<LayoutArg> for RowLayout {
    fn from(value: LayoutArg) -> Self {
        match value {
            LayoutArg::Expanded => RowLayout::Expanded,
            LayoutArg::Compact => RowLayout::Compact,
        }
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum PreviewFormat {
    Markdown,
    Json,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        error!("{:?}", e);
        return ExitCode::from(exit_code_for(&e));
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    // Warnings (e.g. negative buffer volumes) are shown unless RUST_LOG says otherwise.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Plan(args) => cmd_plan(args),
        Command::Preview(args) => cmd_preview(args),
        Command::ShowConfig(args) => cmd_show_config(args),
    }
}

/// Output collisions exit with 2; everything else with 1.
fn exit_code_for(e: &anyhow::Error) -> u8 {
    e.downcast_ref::<ArtifactError>()
        .map(ArtifactError::exit_code)
        .unwrap_or(1)
}

fn merged_config(
    planning: &PlanningArgs,
    mut overrides: Overrides,
) -> anyhow::Result<MergedConfig> {
    let file_config = config::load_or_default(planning.config.as_deref(), Utf8Path::new("."))
        .context("load protnorm.toml config")?;

    overrides.target_concentration_um = planning.target_conc;
    overrides.target_volume_ul = planning.target_volume;
    overrides.max_tip_volume_ul = planning.tip_max;
    overrides.blank = planning.blank.clone();
    overrides.exclude = planning.exclude.clone();

    let merged = ConfigMerger::new(file_config).merge(&overrides);
    debug!(
        "merged config: planner={:?}, columns={:?}, out_dir={}, write={:?}",
        merged.planner, merged.columns, merged.out_dir, merged.write
    );
    Ok(merged)
}

fn plan_from(input: &Utf8Path, merged: &MergedConfig) -> anyhow::Result<VolumePlan> {
    let readings = load_readings(input, &merged.columns)
        .with_context(|| format!("load readings from {}", input))?;
    let planner = Planner::new(merged.planner.clone()).context("configure planner")?;
    let plan = planner.plan(&readings).context("plan volumes")?;
    info!(
        wells = plan.summary.wells_total,
        rows = plan.summary.rows_total,
        anomalies = plan.anomalies.len(),
        "planned volumes"
    );
    Ok(plan)
}

fn cmd_plan(args: PlanArgs) -> anyhow::Result<()> {
    validate_run_id(&args.run)?;

    let merged = merged_config(
        &args.planning,
        Overrides {
            out_dir: args.out_dir.clone(),
            force: args.force,
            layout: args.layout.map(RowLayout::from),
            ..Default::default()
        },
    )?;

    let plan = plan_from(&args.input, &merged)?;

    fs::create_dir_all(&merged.out_dir).with_context(|| format!("create {}", merged.out_dir))?;
    let path = write_plan_csv(&merged.out_dir, &args.run, &plan, &merged.write)
        .context("write dispense table")?;

    println!("{}", path);
    Ok(())
}

fn cmd_preview(args: PreviewArgs) -> anyhow::Result<()> {
    let merged = merged_config(&args.planning, Overrides::default())?;
    let plan = plan_from(&args.input, &merged)?;

    match args.format {
        PreviewFormat::Markdown => print!("{}", render_plan_md(&plan)),
        PreviewFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
    }
    Ok(())
}

fn cmd_show_config(args: ShowConfigArgs) -> anyhow::Result<()> {
    let merged = merged_config(&args.planning, Overrides::default())?;
    let planner = &merged.planner;

    match args.format {
        OutputFormat::Text => {
            println!("target_concentration_um = {}", planner.target_concentration_um);
            println!("target_volume_ul        = {}", planner.target_volume_ul);
            println!("max_tip_volume_ul       = {}", planner.max_tip_volume_ul);
            println!("max_splits              = {}", planner.max_splits);
            println!("blank_wells             = {}", join(&planner.blank_wells));
            println!("excluded_wells          = {}", join(&planner.excluded_wells));
            println!("well_column             = {}", merged.columns.well_column);
            println!("concentration_column    = {}", merged.columns.concentration_column);
            println!("out_dir                 = {}", merged.out_dir);
            println!("overwrite               = {}", merged.write.overwrite.as_str());
            println!("layout                  = {}", merged.write.layout.as_str());
        }
        OutputFormat::Json => {
            let value = serde_json::json!({
                "planner": planner.parameters(),
                "max_splits": planner.max_splits,
                "input": {
                    "well_column": merged.columns.well_column,
                    "concentration_column": merged.columns.concentration_column,
                },
                "output": {
                    "dir": merged.out_dir,
                    "overwrite": merged.write.overwrite,
                    "layout": merged.write.layout,
                },
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }
    Ok(())
}

fn join<'a>(wells: impl IntoIterator<Item = &'a String>) -> String {
    wells
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
