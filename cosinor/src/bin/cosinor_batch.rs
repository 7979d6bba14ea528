//! Batch cosinor fitting with naive vs two-argument phase recovery
//!
//! Reads a long-format observation CSV (`subject_id,time_value,item,value`), fits
//! every subject/item/start-offset combination and writes the estimate, omission
//! and summary tables as CSV files.
//!
//! Usage:
//! ```
//! cargo run --release --bin cosinor_batch -- --input observations.csv --output-dir results
//! ```

use std::path::PathBuf;

use clap::Parser;
use cosinor::io::{load_observations, save_records};
use cosinor::summary::{
    mislocation_summary, naive_disagreement_summary, segment_summary, subjects_per_item,
};
use cosinor::{run_batch, AnalysisConfig, PlausibleWindow};

/// Half-cycle matches closer than this (hours) count as naive misplacements
const DISAGREEMENT_TOLERANCE: f64 = 1e-6;

/// Parse a window string in format "lo,hi"
fn parse_window(s: &str) -> Result<PlausibleWindow, String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 2 {
        return Err("Window must be in format 'lo,hi'".to_string());
    }

    let lo = parts[0]
        .trim()
        .parse::<f64>()
        .map_err(|_| "Invalid window start".to_string())?;
    let hi = parts[1]
        .trim()
        .parse::<f64>()
        .map_err(|_| "Invalid window end".to_string())?;

    Ok(PlausibleWindow::new(lo, hi))
}

#[derive(Parser, Debug)]
#[command(
    name = "Cosinor Batch",
    about = "Fits cosinor models per subject/item/start offset and compares phase recovery methods",
    long_about = None
)]
struct Args {
    /// Observation CSV with columns subject_id,time_value,item,value
    #[arg(short, long)]
    input: PathBuf,

    /// JSON analysis configuration; command line options override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Cycle length in hours
    #[arg(long)]
    cycle_length: Option<f64>,

    /// Assumed cycle starts in hours (comma-separated)
    #[arg(long, value_delimiter = ',')]
    start_offsets: Option<Vec<f64>>,

    /// Items to analyse (comma-separated, default: all)
    #[arg(long, value_delimiter = ',')]
    items: Option<Vec<String>>,

    /// Plausible phase window "lo,hi" in hours, inclusive
    #[arg(long, value_parser = parse_window)]
    plausible_window: Option<PlausibleWindow>,

    /// Segment boundaries in hours (comma-separated, from 0 to the cycle length)
    #[arg(long, value_delimiter = ',')]
    segment_boundaries: Option<Vec<f64>>,

    /// Directory for the output CSV tables
    #[arg(short, long, default_value = "cosinor_output")]
    output_dir: PathBuf,

    /// Fit serially instead of on the thread pool
    #[arg(long)]
    serial: bool,

    /// Save the effective configuration next to the output tables
    #[arg(long)]
    save_config: bool,
}

impl Args {
    fn analysis_config(&self) -> Result<AnalysisConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::load_from_file(path)?,
            None => AnalysisConfig::default(),
        };

        if let Some(cycle_length) = self.cycle_length {
            config.cycle_length = cycle_length;
        }
        if let Some(offsets) = &self.start_offsets {
            config.start_offsets = offsets.clone();
        }
        if let Some(items) = &self.items {
            config.items = Some(items.clone());
        }
        if let Some(window) = self.plausible_window {
            config.plausible_window = window;
        }
        if let Some(bounds) = &self.segment_boundaries {
            config.segment_boundaries = bounds.clone();
        }
        if self.serial {
            config.parallel = false;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();
    let config = args.analysis_config()?;

    println!("Cosinor Batch");
    println!("=============");
    println!("Input: {}", args.input.display());
    println!("Cycle length: {} h", config.cycle_length);
    println!("Start offsets: {:?}", config.start_offsets);
    println!(
        "Plausible window: [{}, {}]",
        config.plausible_window.lo, config.plausible_window.hi
    );
    println!("Segment boundaries: {:?}", config.segment_boundaries);
    println!();

    let observations = load_observations(&args.input)?;
    let output = run_batch(&observations, &config)?;

    let subject_counts = subjects_per_item(&output.estimates);
    let mislocation =
        mislocation_summary(&output.estimates, config.plausible_window, &subject_counts);
    let segments = segment_summary(
        &output.estimates,
        &config.segment_boundaries,
        &subject_counts,
    );
    let disagreement = naive_disagreement_summary(
        &output.estimates,
        config.cycle_length,
        DISAGREEMENT_TOLERANCE,
    );

    let dir = &args.output_dir;
    save_records(&dir.join("estimates.csv"), &output.estimates)?;
    save_records(&dir.join("omissions.csv"), &output.omissions)?;
    save_records(&dir.join("mislocation.csv"), &mislocation)?;
    save_records(&dir.join("segments.csv"), &segments)?;
    save_records(&dir.join("disagreement.csv"), &disagreement)?;
    if args.save_config {
        config.save_to_file(&dir.join("analysis_config.json"))?;
    }

    println!(
        "Fitted {} triples, {} estimates, {} omitted",
        output.triples_attempted(),
        output.estimates.len(),
        output.omissions.len()
    );
    for omission in &output.omissions {
        println!(
            "  omitted {}/{} @ {:.2}: {}",
            omission.subject_id, omission.item, omission.start_offset, omission.detail
        );
    }
    println!();

    println!(
        "{:<20} {:>8} {:>10} {:>10} {:>14}",
        "Item", "Offset", "In window", "Subjects", "Mislocated %"
    );
    println!("{:-<66}", "");
    for row in &mislocation {
        println!(
            "{:<20} {:>8.2} {:>10} {:>10} {:>14.1}",
            row.item, row.start_offset, row.in_window, row.subjects, row.mislocation_percentage
        );
    }
    println!();

    println!(
        "{:<20} {:>8} {:>10} {:>10} {:>12}",
        "Item", "Offset", "Compared", "Misplaced", "Naive off %"
    );
    println!("{:-<64}", "");
    for row in &disagreement {
        println!(
            "{:<20} {:>8.2} {:>10} {:>10} {:>12.1}",
            row.item, row.start_offset, row.compared, row.misplaced, row.misplaced_percentage
        );
    }
    println!();
    println!("Tables written to {}", dir.display());

    Ok(())
}
