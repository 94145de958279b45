#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line entry point for ranking distressed San Francisco parcels.
//!
//! Without a subcommand an interactive menu is shown.
//!
//! Uses `indicatif-log-bridge` (via [`parcel_distress_cli_utils::init_logger`])
//! so log lines and the dataset progress bar never fight for the terminal.

mod interactive;
mod output;
mod pipeline;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use parcel_distress_rank::{DiversifyOptions, ScoreWeights};
use parcel_distress_source::FetchOptions;
use parcel_distress_source::registry::all_datasets;

use crate::output::OutputFormat;
use crate::pipeline::{EventsConfig, RankConfig};

#[derive(Parser)]
#[command(name = "parcel_distress", about = "Rank SF parcels by civic distress signals")]
struct Cli {
    /// Log debug output from the pipeline crates
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Dataset loading flags shared by subcommands.
#[derive(Args)]
struct LoadArgs {
    /// Directory for `<dataset>.json` caches; fetched data is written here
    #[arg(long)]
    cache_dir: Option<PathBuf>,
    /// Read every dataset from `--cache-dir` instead of the network
    #[arg(long, requires = "cache_dir")]
    offline: bool,
    /// Maximum number of records per dataset (for testing)
    #[arg(long)]
    limit: Option<u64>,
}

impl LoadArgs {
    fn into_fetch_options(self) -> FetchOptions {
        FetchOptions {
            limit: self.limit,
            cache_dir: self.cache_dir,
            offline: self.offline,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate, score, and print a neighborhood-diversified top list
    Rank {
        #[command(flatten)]
        load: LoadArgs,
        /// Number of parcels to return
        #[arg(long, default_value = "100")]
        top: usize,
        /// Requested parcels per neighborhood per pass (reported only)
        #[arg(long, default_value = "8")]
        per_round: usize,
        /// Keep non-residential parcels
        #[arg(long)]
        all_parcels: bool,
        /// TOML file overriding the score weights
        #[arg(long)]
        weights: Option<PathBuf>,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
        /// Write output to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Count event-dataset hits on known parcels
    Events {
        #[command(flatten)]
        load: LoadArgs,
        /// Number of parcels to list
        #[arg(long, default_value = "25")]
        top: usize,
        /// Comma-separated event dataset IDs (overrides `PARCEL_DISTRESS_EVENT_DATASETS`)
        #[arg(long)]
        datasets: Option<String>,
    },
    /// List all configured datasets
    Datasets,
}

/// Prints the dataset registry.
fn print_datasets() {
    println!("{:<16} {:<10} NAME", "ID", "KIND");
    println!("{}", "-".repeat(60));
    for dataset in all_datasets() {
        println!(
            "{:<16} {:<10} {}",
            dataset.id(),
            dataset.kind.to_string(),
            dataset.name()
        );
        if let Some(url) = dataset.portal_url() {
            println!("{:<27} {url}", "");
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let multi = parcel_distress_cli_utils::init_logger(cli.verbose);

    let Some(command) = cli.command else {
        return interactive::run(&multi).await;
    };

    match command {
        Commands::Rank {
            load,
            top,
            per_round,
            all_parcels,
            weights,
            format,
            output: output_path,
        } => {
            let weights = match weights {
                Some(path) => ScoreWeights::from_toml_file(&path)?,
                None => ScoreWeights::default(),
            };
            let config = RankConfig {
                fetch: load.into_fetch_options(),
                residential_only: !all_parcels,
                weights,
                diversify: DiversifyOptions {
                    total: top,
                    per_round,
                },
            };
            let ranked = pipeline::rank(&config, &multi).await?;
            output::emit(&ranked, format, output_path.as_deref())?;
        }
        Commands::Events {
            load,
            top,
            datasets,
        } => {
            let config = EventsConfig {
                fetch: load.into_fetch_options(),
                datasets,
            };
            let report = pipeline::events(&config, &multi).await?;
            print!("{}", output::render_events(&report, top));
        }
        Commands::Datasets => print_datasets(),
    }

    Ok(())
}
