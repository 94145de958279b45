//! Dataset registry: loads all dataset definitions from embedded TOML.
//!
//! Each `.toml` file in `packages/source/datasets/` is baked into the
//! binary at compile time via [`include_str!`].

use parcel_distress_source_models::{DatasetDefinition, DatasetKind};

/// Environment variable holding a comma-separated list of event dataset
/// IDs to use for hit counting.
pub const EVENT_DATASETS_ENV: &str = "PARCEL_DISTRESS_EVENT_DATASETS";

/// TOML configs embedded at compile time.
const DATASET_TOMLS: &[(&str, &str)] = &[
    // ── Pipeline datasets ────────────────────────────────────────────
    ("dbi_novs", include_str!("../datasets/dbi_novs.toml")),
    ("dbi_complaints", include_str!("../datasets/dbi_complaints.toml")),
    ("sf311_blight", include_str!("../datasets/sf311_blight.toml")),
    ("parcels", include_str!("../datasets/parcels.toml")),
    ("land_use", include_str!("../datasets/land_use.toml")),
    // ── Event datasets ───────────────────────────────────────────────
    ("event_permits", include_str!("../datasets/event_permits.toml")),
    ("event_code", include_str!("../datasets/event_code.toml")),
    (
        "event_blight311",
        include_str!("../datasets/event_blight311.toml"),
    ),
    ("event_business", include_str!("../datasets/event_business.toml")),
    ("event_fire", include_str!("../datasets/event_fire.toml")),
    ("event_env", include_str!("../datasets/event_env.toml")),
    ("event_nuisance", include_str!("../datasets/event_nuisance.toml")),
];

/// Parses a [`DatasetDefinition`] from a TOML string.
///
/// # Errors
///
/// Returns an error if the TOML is malformed or missing required fields.
pub fn parse_dataset_toml(toml_str: &str) -> Result<DatasetDefinition, String> {
    toml::de::from_str(toml_str).map_err(|e| e.to_string())
}

/// Returns all configured dataset definitions, parsed from embedded TOML.
///
/// # Panics
///
/// Panics if any TOML config is malformed (the configs are embedded, so
/// this is caught by the registry tests).
#[must_use]
pub fn all_datasets() -> Vec<DatasetDefinition> {
    DATASET_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_dataset_toml(toml).unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}"))
        })
        .collect()
}

/// Returns the datasets feeding the aggregation pass, ordered by
/// [`DatasetKind::PIPELINE`].
#[must_use]
pub fn pipeline_datasets() -> Vec<DatasetDefinition> {
    let all = all_datasets();
    DatasetKind::PIPELINE
        .iter()
        .flat_map(|kind| all.iter().filter(move |d| d.kind == *kind).cloned())
        .collect()
}

/// Returns the event datasets used for hit counting, optionally filtered
/// by a comma-separated ID list. `cli_filter` takes precedence over
/// [`EVENT_DATASETS_ENV`].
#[must_use]
pub fn event_datasets(cli_filter: Option<String>) -> Vec<DatasetDefinition> {
    let filter = cli_filter.or_else(|| std::env::var(EVENT_DATASETS_ENV).ok());

    let events: Vec<DatasetDefinition> = all_datasets()
        .into_iter()
        .filter(|d| d.kind == DatasetKind::Event)
        .collect();

    let Some(filter_str) = filter else {
        return events;
    };

    let ids: Vec<&str> = filter_str.split(',').map(str::trim).collect();
    let available = events
        .iter()
        .map(|d| d.id().to_string())
        .collect::<Vec<_>>()
        .join(", ");

    let filtered: Vec<DatasetDefinition> =
        events.into_iter().filter(|d| ids.contains(&d.id())).collect();

    if filtered.is_empty() {
        log::warn!("No matching event datasets found for filter {ids:?}. Available: {available}");
    }

    filtered
}
