//! Runs the load -> aggregate -> score -> diversify pipeline.
//!
//! Dataset loading is async and goes through [`collect_datasets`]; the
//! rest is a synchronous pass over the collected rows so it can be tested
//! without a network.

use std::collections::BTreeSet;
use std::time::Instant;

use parcel_distress_cli_utils::{IndicatifProgress, MultiProgress};
use parcel_distress_parcel::{
    AggregateOptions, EventHits, ParcelKey, aggregate_with_stats, count_event_hits, parcel_keys,
};
use parcel_distress_parcel_models::ScoredParcel;
use parcel_distress_rank::{DiversifyOptions, ScoreWeights, diversify, score_parcels};
use parcel_distress_source::registry::{event_datasets, pipeline_datasets};
use parcel_distress_source::{FetchOptions, SourceError, collect_datasets};
use parcel_distress_source_models::{DatasetDefinition, DatasetKind, RawDatasets};

/// Settings for one `rank` run.
#[derive(Debug, Clone)]
pub struct RankConfig {
    /// How datasets are loaded.
    pub fetch: FetchOptions,
    /// Keep only residential parcels.
    pub residential_only: bool,
    /// Score weights.
    pub weights: ScoreWeights,
    /// Diversified selection size.
    pub diversify: DiversifyOptions,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            fetch: FetchOptions::default(),
            residential_only: true,
            weights: ScoreWeights::default(),
            diversify: DiversifyOptions::default(),
        }
    }
}

/// Settings for one `events` run.
#[derive(Debug, Clone, Default)]
pub struct EventsConfig {
    /// How datasets are loaded.
    pub fetch: FetchOptions,
    /// Comma-separated event dataset IDs; falls back to the environment.
    pub datasets: Option<String>,
}

/// The outcome of an `events` run.
#[derive(Debug, Clone)]
pub struct EventsReport {
    /// Parcels in the base dataset.
    pub known_parcels: BTreeSet<ParcelKey>,
    /// Hits per known parcel.
    pub hits: EventHits,
}

async fn load(
    definitions: &[DatasetDefinition],
    fetch: &FetchOptions,
    multi: &MultiProgress,
) -> Result<RawDatasets, SourceError> {
    let progress = IndicatifProgress::datasets_bar(multi, "Loading datasets");
    collect_datasets(definitions, fetch, &progress).await
}

/// Aggregates, scores, and diversifies already-loaded datasets.
#[must_use]
pub fn rank_raw(raw: &RawDatasets, config: &RankConfig) -> Vec<ScoredParcel> {
    let aggregation = aggregate_with_stats(
        raw,
        &AggregateOptions {
            residential_only: config.residential_only,
        },
    );
    log::info!(
        "Tract counters: {} neighborhoods, {} districts",
        aggregation.tracts.neighborhood_len(),
        aggregation.tracts.district_len()
    );

    let scored = score_parcels(aggregation.parcels.into_values(), &config.weights);
    let selected = diversify(scored, &config.diversify);

    log::info!("Selected {} parcels", selected.len());

    selected
}

/// Loads the pipeline datasets and ranks them.
///
/// # Errors
///
/// Returns [`SourceError`] if the HTTP client cannot be built. Individual
/// dataset failures are logged and skipped.
pub async fn rank(
    config: &RankConfig,
    multi: &MultiProgress,
) -> Result<Vec<ScoredParcel>, SourceError> {
    let start = Instant::now();

    let definitions: Vec<DatasetDefinition> = pipeline_datasets()
        .into_iter()
        .filter(|d| config.residential_only || d.kind != DatasetKind::LandUse)
        .collect();

    let raw = load(&definitions, &config.fetch, multi).await?;
    let selected = rank_raw(&raw, config);

    log::info!(
        "Ranking complete in {:.1}s",
        start.elapsed().as_secs_f64()
    );

    Ok(selected)
}

/// Counts event hits on already-loaded datasets.
#[must_use]
pub fn events_raw(raw: &RawDatasets) -> EventsReport {
    let known_parcels = parcel_keys(raw.records(DatasetKind::Parcel));
    let hits = count_event_hits(&known_parcels, [raw.records(DatasetKind::Event)]);
    EventsReport {
        known_parcels,
        hits,
    }
}

/// Loads the parcel base plus the selected event datasets and counts hits.
///
/// # Errors
///
/// Returns [`SourceError`] if the HTTP client cannot be built.
pub async fn events(
    config: &EventsConfig,
    multi: &MultiProgress,
) -> Result<EventsReport, SourceError> {
    let start = Instant::now();

    let mut definitions: Vec<DatasetDefinition> = pipeline_datasets()
        .into_iter()
        .filter(|d| d.kind == DatasetKind::Parcel)
        .collect();
    definitions.extend(event_datasets(config.datasets.clone()));

    let raw = load(&definitions, &config.fetch, multi).await?;
    let report = events_raw(&raw);

    log::info!(
        "Event counting complete in {:.1}s",
        start.elapsed().as_secs_f64()
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use parcel_distress_source_models::RawRecord;

    use super::*;

    fn rows(values: serde_json::Value) -> Vec<RawRecord> {
        values
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect()
    }

    #[test]
    fn ranks_nov_parcels_by_score() {
        let raw = RawDatasets::new().with(
            DatasetKind::Nov,
            rows(serde_json::json!([
                {"block": "1234", "lot": "56"},
                {"block": "1234", "lot": "56"},
                {"block": "0099", "lot": "A"},
            ])),
        );
        let ranked = rank_raw(
            &raw,
            &RankConfig {
                residential_only: false,
                ..RankConfig::default()
            },
        );
        let ids: Vec<(&str, f64)> = ranked
            .iter()
            .map(|s| (s.parcel.parcel_id.as_str(), s.distress_score))
            .collect();
        assert_eq!(ids, vec![("1234-56", 2.0), ("0099-A", 1.0)]);
    }

    #[test]
    fn residential_default_keeps_everything_without_land_use() {
        let raw = RawDatasets::new().with(
            DatasetKind::Nov,
            rows(serde_json::json!([{"block": "1234", "lot": "56"}])),
        );
        assert_eq!(rank_raw(&raw, &RankConfig::default()).len(), 1);
    }

    #[test]
    fn events_count_hits_on_base_parcels() {
        let raw = RawDatasets::new()
            .with(
                DatasetKind::Parcel,
                rows(serde_json::json!([
                    {"blklot": "3512008"},
                    {"block_num": "1186", "lot_num": "006"},
                ])),
            )
            .with(
                DatasetKind::Event,
                rows(serde_json::json!([
                    {"block": "3512", "lot": "008"},
                    {"block": "3512", "lot": "008"},
                    {"block": "7000", "lot": "001"},
                ])),
            );
        let report = events_raw(&raw);
        assert_eq!(report.known_parcels.len(), 2);
        assert_eq!(report.hits.total(), 2);
        let top = report.hits.most_common(1);
        assert_eq!(top[0].0.as_str(), "3512-008");
    }
}
