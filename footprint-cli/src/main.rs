//! Flux footprint command line tool
//!
//! Reads a JSON array of observations and writes the footprint of one of them
//! or the climatology of all, optionally georeferenced through a station
//! configuration and weighted against a raster.

mod input;
mod time;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use ffp_core::{
    compute_footprint, compute_footprint_climatology, weight_raster_source, ClimatologyResult,
    CoordinateSystem, Domain, FieldPeak, FootprintConfig, FootprintField, FootprintOptions,
    GeoreferencedProcessor,
};
use input::{load_observations, JsonRasterSource, Observation};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "footprint")]
#[command(about = "Flux footprint prediction (Kljun et al. 2015)", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Footprint of a single observation
    Single {
        #[command(flatten)]
        common: CommonArgs,

        /// Position of the observation in the file
        #[arg(long, default_value_t = 0)]
        index: usize,
    },
    /// Footprint climatology over every observation in the file
    Climatology {
        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// JSON array of observation records
    observations: PathBuf,

    /// Domain relative to the sensor as xmin,xmax,ymin,ymax (m)
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    domain: Option<Vec<f64>>,

    /// Receptor points per grid side
    #[arg(long, default_value_t = 1000)]
    nx: usize,

    /// Skip kernel smoothing of the result
    #[arg(long)]
    no_smooth: bool,

    /// Station configuration (JSON); computes a georeferenced footprint
    #[arg(long)]
    config: Option<PathBuf>,

    /// Raster (JSON) to average under the footprint
    #[arg(long)]
    raster: Option<PathBuf>,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,

    /// Write the full field as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl CommonArgs {
    fn options(&self) -> Result<FootprintOptions> {
        let domain = match self.domain.as_deref() {
            None => Domain::default(),
            Some(&[xmin, xmax, ymin, ymax]) => Domain::new(xmin, xmax, ymin, ymax),
            Some(other) => bail!("--domain takes 4 values, got {}", other.len()),
        };
        Ok(FootprintOptions {
            domain,
            nx: self.nx,
            smooth: !self.no_smooth,
        })
    }
}

/// Everything printed after a run.
#[derive(Debug, Serialize)]
struct Summary {
    observations: usize,
    contributing: usize,
    skipped: Vec<SkippedSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    period: Option<(String, String)>,
    rows: usize,
    cols: usize,
    peak: Option<FieldPeak>,
    integral: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    raster_mean: Option<f64>,
}

#[derive(Debug, Serialize)]
struct SkippedSummary {
    index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
    reason: String,
}

impl Summary {
    fn new(observations: &[Observation], result: &ClimatologyResult) -> Self {
        let times: Vec<_> = observations.iter().filter_map(|o| o.time).collect();
        let period = times
            .iter()
            .min()
            .zip(times.iter().max())
            .map(|(start, end)| (start.to_string(), end.to_string()));
        let (rows, cols) = result.field.shape();
        Self {
            observations: observations.len(),
            contributing: result.n,
            skipped: result
                .skipped
                .iter()
                .map(|s| SkippedSummary {
                    index: s.index,
                    timestamp: observations
                        .get(s.index)
                        .and_then(|o| o.time)
                        .map(|t| t.to_string()),
                    reason: s.reason.to_string(),
                })
                .collect(),
            period,
            rows,
            cols,
            peak: result.field.peak(),
            integral: result.field.integral(),
            raster_mean: None,
        }
    }

    fn print(&self) {
        println!("Observations: {} ({} contributing)", self.observations, self.contributing);
        if let Some((start, end)) = &self.period {
            println!("Period: {start} .. {end}");
        }
        for skipped in &self.skipped {
            println!("  skipped #{}: {}", skipped.index, skipped.reason);
        }
        println!("Grid: {} x {}", self.rows, self.cols);
        match &self.peak {
            Some(peak) => println!(
                "Peak: {:.6e} at ({:.6}, {:.6})",
                peak.value, peak.x, peak.y
            ),
            None => println!("Peak: none (footprint vanishes on this grid)"),
        }
        println!("Integral: {:.4}", self.integral);
        if let Some(mean) = self.raster_mean {
            println!("Footprint-weighted raster mean: {mean:.6}");
        }
    }
}

/// A single observation wrapped as a one-member climatology so both commands
/// report the same way.
fn single(
    observations: &[Observation],
    index: usize,
    options: &FootprintOptions,
    processor: Option<&GeoreferencedProcessor>,
) -> Result<ClimatologyResult> {
    let Some(observation) = observations.get(index) else {
        bail!(
            "observation {index} requested, file holds {}",
            observations.len()
        );
    };
    let field = match processor {
        Some(processor) => {
            processor.compute_georeferenced_field_with(&observation.input, options.smooth)?
        }
        None => compute_footprint(&observation.input, options)?,
    };
    Ok(ClimatologyResult {
        field,
        n: 1,
        skipped: Vec::new(),
    })
}

fn climatology(
    observations: &[Observation],
    options: &FootprintOptions,
    processor: Option<&GeoreferencedProcessor>,
) -> Result<ClimatologyResult> {
    let inputs: Vec<_> = observations.iter().map(|o| o.input).collect();
    let result = match processor {
        Some(processor) => processor.compute_georeferenced_climatology(&inputs, options.smooth)?,
        None => compute_footprint_climatology(&inputs, options)?,
    };
    Ok(result)
}

fn load_processor(path: &Path) -> Result<GeoreferencedProcessor> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading station configuration {}", path.display()))?;
    let config: FootprintConfig = serde_json::from_str(&text)
        .with_context(|| format!("parsing station configuration {}", path.display()))?;
    let resolved = config.resolve()?;
    info!(
        input_crs = %resolved.coordinate_system(),
        working_crs = %resolved.working_crs(),
        "Resolved station configuration"
    );
    Ok(GeoreferencedProcessor::new(resolved)?)
}

fn write_field(path: &Path, field: &FootprintField) -> Result<()> {
    let json = serde_json::to_string(field)?;
    fs::write(path, json).with_context(|| format!("writing field to {}", path.display()))?;
    info!(path = %path.display(), "Wrote footprint field");
    Ok(())
}

fn run(command: &Command) -> Result<()> {
    let (common, index) = match command {
        Command::Single { common, index } => (common, Some(*index)),
        Command::Climatology { common } => (common, None),
    };
    let options = common.options()?;
    let observations = load_observations(&common.observations)?;
    info!(count = observations.len(), "Loaded observations");

    let processor = common.config.as_deref().map(load_processor).transpose()?;
    let result = match index {
        Some(index) => single(&observations, index, &options, processor.as_ref())?,
        None => climatology(&observations, &options, processor.as_ref())?,
    };
    for skipped in &result.skipped {
        warn!(index = skipped.index, reason = %skipped.reason, "Observation skipped");
    }

    let mut summary = Summary::new(&observations, &result);
    if let Some(raster) = &common.raster {
        let field_crs: Option<&CoordinateSystem> =
            processor.as_ref().map(|p| p.config().coordinate_system());
        summary.raster_mean = Some(weight_raster_source(
            &result.field,
            field_crs,
            &JsonRasterSource,
            raster,
        )?);
    }
    if let Some(path) = &common.output {
        write_field(path, &result.field)?;
    }

    if common.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        summary.print();
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    run(&Cli::parse().command)
}
