//! ParamLens CLI — explore how strategy parameters correlate with a metric.
//!
//! Commands:
//! - `metrics` — list the selectable metric catalog
//! - `periods` — list the test periods in an upload, with record counts
//! - `analyze` — per-parameter statistics (and optionally series) for one period
//! - `explore` — interactive line session with background loading

mod explore;
mod render;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

use paramlens_core::{
    analyze, default_period, filter_by_period, load_file, period_summaries, save_analysis,
    AnalysisOptions, ExplorerConfig, Metric, MissingPolicy, OutputFormat, ParameterSchema,
    PeriodKey,
};

#[derive(Parser)]
#[command(
    name = "paramlens",
    about = "ParamLens — parameter vs. metric correlation for strategy backtest batches"
)]
struct Cli {
    /// Config file. Defaults to <config dir>/paramlens/config.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the selectable metrics.
    Metrics,
    /// List the test periods in a strategies file.
    Periods {
        /// JSON file of the form {"strategies": [...]}.
        file: PathBuf,
    },
    /// Compute per-parameter statistics for one test period.
    Analyze {
        /// JSON file of the form {"strategies": [...]}.
        file: PathBuf,

        /// Period key ("<start> to <end>") or 1-based index. Defaults to the first record's period.
        #[arg(long)]
        period: Option<String>,

        /// Metric identifier (see `paramlens metrics`).
        #[arg(long)]
        metric: Option<Metric>,

        /// Parameter schema: first-record or union.
        #[arg(long)]
        schema: Option<ParameterSchema>,

        /// Missing value policy: propagate or skip.
        #[arg(long)]
        missing: Option<MissingPolicy>,

        /// Output format: table, json or csv.
        #[arg(long)]
        format: Option<OutputFormat>,

        /// Also print the per-parameter correlation series.
        #[arg(long, default_value_t = false)]
        series: bool,

        /// Write analysis.json, statistics.csv and series.csv here.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Interactive session: load files, switch periods and metrics.
    Explore {
        /// File to load on startup.
        file: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Metrics => {
            print!("{}", render::metrics_table(config.analysis.metric));
            Ok(())
        }
        Commands::Periods { file } => run_periods(&file),
        Commands::Analyze {
            file,
            period,
            metric,
            schema,
            missing,
            format,
            series,
            output_dir,
        } => {
            let options = AnalysisOptions {
                schema: schema.unwrap_or(config.analysis.schema),
                missing: missing.unwrap_or(config.analysis.missing),
            };
            run_analyze(
                &file,
                period.as_deref(),
                metric.unwrap_or(config.analysis.metric),
                options,
                format.unwrap_or(config.output.format),
                config.output.precision,
                series,
                output_dir.as_deref(),
            )
        }
        Commands::Explore { file } => explore::run(&config, file),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .with_ansi(cfg!(debug_assertions))
        .compact()
        .init();
}

fn load_config(explicit: Option<&Path>) -> Result<ExplorerConfig> {
    if let Some(path) = explicit {
        return ExplorerConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()));
    }
    let Some(dir) = dirs::config_dir() else {
        return Ok(ExplorerConfig::default());
    };
    let path = dir.join("paramlens").join("config.toml");
    ExplorerConfig::from_file_or_default(&path)
        .with_context(|| format!("failed to load config {}", path.display()))
}

fn run_periods(file: &Path) -> Result<()> {
    let dataset = load_file(file)?;
    let summaries = period_summaries(&dataset.records);
    if summaries.is_empty() {
        println!("No strategies in {}", file.display());
        return Ok(());
    }
    let default = default_period(&dataset.records);
    print!("{}", render::periods_table(&summaries, default.as_ref()));
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_analyze(
    file: &Path,
    period: Option<&str>,
    metric: Metric,
    options: AnalysisOptions,
    format: OutputFormat,
    precision: usize,
    with_series: bool,
    output_dir: Option<&Path>,
) -> Result<()> {
    let dataset = load_file(file)?;
    let periods: Vec<PeriodKey> = period_summaries(&dataset.records)
        .into_iter()
        .map(|s| s.key)
        .collect();

    let key = match period {
        Some(p) => Some(resolve_period(&periods, p)?),
        None => default_period(&dataset.records),
    };

    let filtered = filter_by_period(&dataset.records, key.as_ref());
    let analysis = analyze(&filtered, key, metric, options);

    match format {
        OutputFormat::Table => {
            print!("{}", render::statistics_table(&analysis, precision));
            if with_series {
                print!("{}", render::series_table(&analysis, precision));
            }
        }
        OutputFormat::Json => println!("{}", paramlens_core::export_json(&analysis)?),
        OutputFormat::Csv => {
            print!("{}", paramlens_core::export_statistics_csv(&analysis)?);
            if with_series {
                println!();
                print!("{}", paramlens_core::export_series_csv(&analysis)?);
            }
        }
    }

    if let Some(dir) = output_dir {
        let written = save_analysis(&analysis, dir)?;
        eprintln!("Saved {} files to {}", written.len(), dir.display());
    }

    Ok(())
}

/// Accept either a 1-based index into `periods` or an exact key.
pub(crate) fn resolve_period(periods: &[PeriodKey], input: &str) -> Result<PeriodKey> {
    if let Ok(n) = input.trim().parse::<usize>() {
        return match n.checked_sub(1).and_then(|i| periods.get(i)) {
            Some(key) => Ok(key.clone()),
            None => bail!("period index {n} out of range (1..={})", periods.len()),
        };
    }
    match periods.iter().find(|k| *k == input) {
        Some(key) => Ok(key.clone()),
        None => bail!("no strategies for period '{input}'"),
    }
}
