//! A command-line utility to parse an ACMI (TacView) flight recording and
//! print a one-line summary plus per-entity trajectory sample counts.
//!
//! # Examples
//!
//! ```bash
//! $ acmi-dump recording.acmi.zip --emulate-orientation
//! valid=true entities=3 frames=214 span=[Some(2024-06-01T10:00:00Z), Some(2024-06-01T10:03:34Z)]
//! entity a: 214 samples
//! entity b: 214 samples
//! entity c: 198 samples
//! ```

use std::fs;
use std::path::PathBuf;

use acmi_common::init_logging;
use acmi_formats::{parse, ParseOptions, TrajectoryOptions};
use clap::Parser;

/// Program name.
const NAME: &str = env!("CARGO_PKG_NAME");
/// Program version.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Command-line options for the ACMI summary dumper.
#[derive(Debug, Parser)]
#[clap(name = NAME, version = VERSION, about = "Parse an ACMI (TacView) recording and print a trajectory summary")]
pub struct Opts {
    /// ACMI file to parse (plain text or single-entry `.zip.acmi`).
    pub input: PathBuf,
    /// Entity type name to exclude; repeatable.
    #[clap(short = 'f', long = "filter")]
    pub filter: Vec<String>,
    /// Resampling interval in seconds for the derived trajectories.
    #[clap(long, default_value_t = 1.0)]
    pub sample_rate: f64,
    /// Synthesize heading/pitch/roll from position when the source lacks it.
    #[clap(long)]
    pub emulate_orientation: bool,
    /// Verbose (tree-structured) logging.
    #[clap(short = 'v', long)]
    pub verbose: bool,
}

fn banner() -> String {
    format!("{} v{} - {}\n{}\n", NAME, VERSION, env!("CARGO_PKG_AUTHORS"), env!("CARGO_PKG_DESCRIPTION"))
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let opts = Opts::parse();
    init_logging(opts.verbose);

    if opts.verbose {
        eprintln!("{}", banner());
    }

    let bytes = fs::read(&opts.input)?;

    let parse_options = ParseOptions { filter: opts.filter.clone(), ..Default::default() };
    let data = parse(&bytes, parse_options).await?;

    println!("{}", data.summary());

    let trajectory_options =
        TrajectoryOptions { sample_rate: opts.sample_rate, emulate_orientation: opts.emulate_orientation };
    let trajectories = data.create_sampled_trajectories(trajectory_options);

    let mut ids: Vec<_> = trajectories.keys().copied().collect();
    ids.sort_unstable();
    for id in ids {
        let count = trajectories[&id].len();
        println!("entity {id:x}: {count} samples");
    }

    Ok(())
}
