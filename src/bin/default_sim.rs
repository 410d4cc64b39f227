//! Run default-rate scenarios from the command line
//!
//! Prints a per-segment summary and optionally writes the monthly scenario
//! and baseline paths to CSV.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use default_rate_sim::projection::ProjectionVariant;
use default_rate_sim::scenario::SweepRange;
use default_rate_sim::{Algorithm, ScenarioOutcome, ScenarioParams, ScenarioRunner, Segment};
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(author, version, about = "What-if projections of credit default rates")]
struct Cli {
    /// Directory holding model, scaler, column and last-value artifacts
    #[arg(long, global = true, default_value = "models")]
    models: PathBuf,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Project scenario and baseline for one or more segments
    Project {
        /// Segments to run (comma separated, default all)
        #[arg(long, value_delimiter = ',')]
        segment: Vec<Segment>,

        #[arg(long)]
        algorithm: Option<Algorithm>,

        #[command(flatten)]
        scenario: ScenarioArgs,

        /// Write monthly paths to this CSV file
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Compare every algorithm fitted for one segment
    Arena {
        #[arg(long)]
        segment: Segment,

        #[command(flatten)]
        scenario: ScenarioArgs,

        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Single-step default rate across a grid of interest rates
    Sensitivity {
        #[arg(long)]
        segment: Segment,

        #[arg(long)]
        algorithm: Option<Algorithm>,

        #[arg(long, default_value_t = 2.0)]
        from: f64,

        #[arg(long, default_value_t = 20.0)]
        to: f64,

        #[arg(long, default_value_t = 20)]
        points: usize,

        #[command(flatten)]
        scenario: ScenarioArgs,
    },
}

/// Scenario flags; each one overrides the value from `--config`
#[derive(Args)]
struct ScenarioArgs {
    /// JSON file with scenario parameters
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    months: Option<usize>,

    /// Interest rate slope, pp per month
    #[arg(long, allow_negative_numbers = true)]
    trend_interest: Option<f64>,

    /// Monthly inflation slope, pp per month
    #[arg(long, allow_negative_numbers = true)]
    trend_inflation: Option<f64>,

    /// Exchange rate slope per month
    #[arg(long, allow_negative_numbers = true)]
    trend_currency: Option<f64>,

    #[arg(long)]
    start_interest: Option<f64>,

    #[arg(long, allow_negative_numbers = true)]
    start_inflation: Option<f64>,

    #[arg(long)]
    start_currency: Option<f64>,

    #[arg(long)]
    start_target: Option<f64>,

    /// ceteris_paribus, dynamic or hardened
    #[arg(long)]
    variant: Option<ProjectionVariant>,

    #[arg(long)]
    upper_clamp: Option<f64>,
}

impl ScenarioArgs {
    fn params(&self) -> Result<ScenarioParams> {
        let mut params = match &self.config {
            Some(path) => load_params(path)?,
            None => ScenarioParams::default(),
        };

        if let Some(months) = self.months {
            params.months = months;
        }
        if let Some(trend) = self.trend_interest {
            params.trend_interest = trend;
        }
        if let Some(trend) = self.trend_inflation {
            params.trend_inflation = trend;
        }
        if let Some(trend) = self.trend_currency {
            params.trend_currency = trend;
        }
        params.start_interest = self.start_interest.or(params.start_interest);
        params.start_inflation = self.start_inflation.or(params.start_inflation);
        params.start_currency = self.start_currency.or(params.start_currency);
        params.start_target = self.start_target.or(params.start_target);
        if let Some(variant) = self.variant {
            params.variant = variant;
        }
        params.upper_clamp = self.upper_clamp.or(params.upper_clamp);

        Ok(params)
    }
}

fn load_params(path: &Path) -> Result<ScenarioParams> {
    let file = File::open(path).with_context(|| format!("opening config {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing config {}", path.display()))
}

/// One CSV line of monthly output
#[derive(Serialize)]
struct OutputRow {
    segment: Segment,
    algorithm: String,
    month: u32,
    scenario: f64,
    baseline: f64,
}

fn output_rows(outcome: &ScenarioOutcome) -> impl Iterator<Item = OutputRow> + '_ {
    let algorithm = outcome.algorithm.map(|alg| alg.to_string()).unwrap_or_default();
    outcome
        .scenario
        .rows
        .iter()
        .zip(&outcome.baseline.rows)
        .map(move |(scenario, baseline)| OutputRow {
            segment: outcome.segment,
            algorithm: algorithm.clone(),
            month: scenario.projection_month,
            scenario: scenario.prediction,
            baseline: baseline.prediction,
        })
}

fn write_csv<'a>(
    path: &Path,
    outcomes: impl IntoIterator<Item = &'a ScenarioOutcome>,
) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    for outcome in outcomes {
        for row in output_rows(outcome) {
            writer.serialize(row)?;
        }
    }
    writer.flush()?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn print_summary(label: &str, outcome: &ScenarioOutcome) {
    let first = outcome.scenario.rows.first().map_or(0.0, |row| row.prediction);
    let last = outcome.scenario.final_prediction().unwrap_or(0.0);
    println!(
        "{:<24} {:>8.2}% -> {:>6.2}%  change {:+6.2} pp  vs baseline {:+6.2} pp  ({:?}, {:?})",
        label,
        first,
        last,
        outcome.total_change,
        outcome.final_gap(),
        outcome.outlook,
        outcome.scale_mode
    );
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let runner = ScenarioRunner::with_models_dir(&cli.models);
    let start = Instant::now();

    match cli.cmd {
        Command::Project { segment, algorithm, scenario, output } => {
            let params = scenario.params()?;
            let segments = if segment.is_empty() { Segment::ALL.to_vec() } else { segment };

            let mut outcomes = Vec::new();
            let mut failures = 0;
            for (segment, result) in runner.run_segments(&segments, algorithm, &params) {
                match result {
                    Ok(outcome) => {
                        print_summary(segment.display_name(), &outcome);
                        outcomes.push(outcome);
                    }
                    Err(err) => {
                        failures += 1;
                        eprintln!("{:<24} failed [{}]: {err}", segment.display_name(), err.kind());
                    }
                }
            }

            if let Some(path) = output {
                write_csv(&path, &outcomes)?;
            }
            println!("Done in {:?}", start.elapsed());
            if outcomes.is_empty() && failures > 0 {
                anyhow::bail!("every segment failed");
            }
        }
        Command::Arena { segment, scenario, output } => {
            let params = scenario.params()?;
            println!("Arena: {}", segment.display_name());

            let mut outcomes = Vec::new();
            for (algorithm, result) in runner.run_arena(segment, &Algorithm::ALL, &params) {
                match result {
                    Ok(outcome) => {
                        print_summary(algorithm.description(), &outcome);
                        outcomes.push(outcome);
                    }
                    Err(err) => eprintln!("{:<24} unavailable: {err}", algorithm.description()),
                }
            }

            if let Some(path) = output {
                write_csv(&path, &outcomes)?;
            }
            println!("Done in {:?}", start.elapsed());
        }
        Command::Sensitivity { segment, algorithm, from, to, points, scenario } => {
            let params = scenario.params()?;
            let range = SweepRange::new(from, to, points);
            let sweep = runner
                .sensitivity(segment, algorithm, &params, &range)
                .with_context(|| format!("sensitivity sweep for {segment}"))?;

            println!("Interest (%) | Default rate (%)");
            for point in &sweep {
                println!("{:12.2} | {:16.4}", point.interest, point.prediction);
            }
        }
    }

    Ok(())
}
