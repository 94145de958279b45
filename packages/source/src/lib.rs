#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Open-data ingestion for the parcel distress pipeline.
//!
//! Fetches raw rows for each configured [`DatasetDefinition`] from the
//! Socrata SODA API (or a local cache directory) and assembles them into a
//! [`RawDatasets`] collection for the aggregation pass. A dataset that
//! cannot be loaded never aborts the run: it is logged and contributes
//! zero rows.

pub mod cache;
pub mod progress;
pub mod registry;
pub mod socrata;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use parcel_distress_source_models::{
    DatasetDefinition, DateWindow, FetcherConfig, RawDatasets, RawRecord,
};

use crate::progress::ProgressCallback;
use crate::socrata::{SocrataConfig, fetch_socrata};

/// Per-request timeout for open-data API calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Errors that can occur while loading a dataset.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error (cache read/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The response was well-formed JSON but not the expected shape.
    #[error("Unexpected response from {dataset}: {message}")]
    UnexpectedResponse {
        /// Dataset identifier.
        dataset: String,
        /// Description of what went wrong.
        message: String,
    },
}

/// Options shared by every dataset load in a run.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Caps the number of records fetched per dataset (for testing). The
    /// smaller of this and the dataset's configured limit wins.
    pub limit: Option<u64>,
    /// Directory holding `<dataset id>.json` caches. Fetched datasets are
    /// written here when set; a failed write is logged and the fetched
    /// rows are still returned.
    pub cache_dir: Option<PathBuf>,
    /// Read every dataset from `cache_dir` instead of the network.
    pub offline: bool,
}

/// Loads a single dataset, either from the cache (when `offline`) or from
/// its API, applying the dataset's record filter.
///
/// # Errors
///
/// Returns [`SourceError`] if the fetch or the offline cache read fails.
pub async fn fetch_dataset(
    client: &reqwest::Client,
    definition: &DatasetDefinition,
    options: &FetchOptions,
) -> Result<Vec<RawRecord>, SourceError> {
    if options.offline {
        let Some(dir) = &options.cache_dir else {
            return Err(SourceError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "offline mode requires a cache directory",
            )));
        };
        return cache::read_cache(dir, definition.id()).await;
    }

    let where_clause = definition
        .window
        .as_ref()
        .map(|window| window_clause(window, Utc::now()));

    let mut records = match &definition.fetcher {
        FetcherConfig::Socrata {
            api_url,
            page_size,
            limit,
            order,
        } => {
            let limit = match (*limit, options.limit) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            };
            fetch_socrata(
                client,
                &SocrataConfig {
                    api_url,
                    label: definition.name(),
                    page_size: *page_size,
                    limit,
                    order: order.as_deref(),
                    where_clause: where_clause.as_deref(),
                },
            )
            .await?
        }
    };

    if let Some(filter) = &definition.filter {
        let before = records.len();
        records.retain(|r| filter.matches(r));
        log::info!(
            "{}: kept {} of {before} records after filtering",
            definition.name(),
            records.len()
        );
    }

    if let Some(dir) = &options.cache_dir {
        if let Err(e) = cache::write_cache(dir, definition.id(), &records).await {
            log::warn!("{}: failed to write cache: {e}", definition.name());
        }
    }

    Ok(records)
}

/// Loads every dataset concurrently and collects them by kind.
///
/// Failed datasets are logged as warnings and contribute nothing; the
/// returned collection always contains whatever succeeded. Rows are
/// assembled in `definitions` order regardless of completion order.
///
/// # Errors
///
/// Returns [`SourceError`] only if the HTTP client cannot be built.
pub async fn collect_datasets(
    definitions: &[DatasetDefinition],
    options: &FetchOptions,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<RawDatasets, SourceError> {
    let client = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()?;

    progress.set_total(definitions.len() as u64);

    let results = futures::future::join_all(definitions.iter().map(|definition| {
        let client = &client;
        async move {
            let result = fetch_dataset(client, definition, options).await;
            progress.inc(1);
            result
        }
    }))
    .await;

    let mut raw = RawDatasets::new();
    for (definition, result) in definitions.iter().zip(results) {
        match result {
            Ok(records) => {
                log::info!("Got {} {} records", records.len(), definition.name());
                raw.extend(definition.kind, records);
            }
            Err(e) => {
                log::warn!("Skipping dataset {}: {e}", definition.id());
            }
        }
    }

    progress.finish(format!("Loaded {} records", raw.len()));

    Ok(raw)
}

/// Builds a SoQL `$where` clause restricting `window.date_column` to the
/// last `window.years_back` years (365-day years) relative to `now`.
#[must_use]
pub fn window_clause(window: &DateWindow, now: DateTime<Utc>) -> String {
    let since = now - TimeDelta::days(365 * i64::from(window.years_back));
    format!(
        "{} >= '{}'",
        window.date_column,
        since.format("%Y-%m-%dT00:00:00")
    )
}
