#![allow(clippy::module_name_repetitions)]

//! Interactive menu for the parcel distress CLI.
//!
//! Provides a menu-driven interface using `dialoguer` for running the
//! pipeline without memorizing CLI flags.

use std::path::PathBuf;

use dialoguer::{Confirm, Input, Select};
use parcel_distress_cli_utils::MultiProgress;
use parcel_distress_rank::{DiversifyOptions, ScoreWeights};
use parcel_distress_source::FetchOptions;

use crate::output::{self, OutputFormat};
use crate::pipeline::{self, EventsConfig, RankConfig};

/// Top-level actions available in the interactive menu.
enum Action {
    Rank,
    Events,
    ListDatasets,
}

impl Action {
    const ALL: &[Self] = &[Self::Rank, Self::Events, Self::ListDatasets];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Rank => "Rank distressed parcels",
            Self::Events => "Count event hits per parcel",
            Self::ListDatasets => "List datasets",
        }
    }
}

/// Runs the interactive menu, prompting the user to select and configure
/// an operation.
///
/// # Errors
///
/// Returns an error if a prompt or the selected operation fails.
pub async fn run(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    println!("Parcel Distress");
    println!();

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Action::ALL[idx] {
        Action::Rank => rank(multi).await?,
        Action::Events => events(multi).await?,
        Action::ListDatasets => crate::print_datasets(),
    }

    Ok(())
}

/// Prompts for dataset loading options.
fn prompt_fetch_options() -> Result<FetchOptions, Box<dyn std::error::Error>> {
    let cache_dir: String = Input::new()
        .with_prompt("Cache directory (empty for none)")
        .allow_empty(true)
        .interact_text()?;
    let cache_dir = Some(cache_dir.trim())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from);

    let offline = if cache_dir.is_some() {
        Confirm::new()
            .with_prompt("Load from cache only (offline)?")
            .default(false)
            .interact()?
    } else {
        false
    };

    let limit = prompt_optional_u64("Record limit per dataset (empty for no limit)")?;

    Ok(FetchOptions {
        limit,
        cache_dir,
        offline,
    })
}

async fn rank(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    let fetch = prompt_fetch_options()?;

    let total: usize = Input::new()
        .with_prompt("Number of parcels")
        .default(100)
        .interact_text()?;

    let residential_only = Confirm::new()
        .with_prompt("Residential parcels only?")
        .default(true)
        .interact()?;

    let format_labels: Vec<String> = OutputFormat::ALL.iter().map(ToString::to_string).collect();
    let format_idx = Select::new()
        .with_prompt("Output format")
        .items(&format_labels)
        .default(0)
        .interact()?;

    let output_path: String = Input::new()
        .with_prompt("Output file (empty for stdout)")
        .allow_empty(true)
        .interact_text()?;
    let output_path = Some(output_path.trim())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from);

    let config = RankConfig {
        fetch,
        residential_only,
        weights: ScoreWeights::default(),
        diversify: DiversifyOptions {
            total,
            ..DiversifyOptions::default()
        },
    };

    let ranked = pipeline::rank(&config, multi).await?;
    output::emit(&ranked, OutputFormat::ALL[format_idx], output_path.as_deref())?;

    Ok(())
}

async fn events(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    let fetch = prompt_fetch_options()?;

    let datasets: String = Input::new()
        .with_prompt("Event dataset IDs, comma-separated (empty for all)")
        .allow_empty(true)
        .interact_text()?;
    let datasets = Some(datasets.trim().to_string()).filter(|s| !s.is_empty());

    let top: usize = Input::new()
        .with_prompt("Number of parcels to list")
        .default(25)
        .interact_text()?;

    let report = pipeline::events(&EventsConfig { fetch, datasets }, multi).await?;
    print!("{}", output::render_events(&report, top));

    Ok(())
}

/// Prompts for an optional `u64`. Empty input yields `None`.
fn prompt_optional_u64(prompt: &str) -> Result<Option<u64>, Box<dyn std::error::Error>> {
    let input: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;

    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    Ok(Some(trimmed.parse()?))
}
