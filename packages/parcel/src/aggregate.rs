//! Reconciles raw dataset rows into one record per parcel.
//!
//! Datasets are folded in a fixed order. Counts always accumulate;
//! descriptive fields are first-write-wins, so a value set by an earlier
//! dataset (or an earlier row) is never overwritten.
//!
//! 1. Notices of violation: create or fetch, `nov_count += 1`.
//! 2. Abatement complaints: create or fetch, `complaint_count += 1`. A
//!    complaint on a parcel that already exists only backfills the address.
//! 3. 311 cases: build [`TractCounters`].
//! 4. Parcel base: create if missing, fill empty fields only.
//! 5. Optional residential filter from land-use records.
//! 6. Attribute 311 counts by neighborhood, else district.

use std::collections::{BTreeMap, BTreeSet};

use parcel_distress_parcel_models::{ParcelKey, ParcelRecord};
use parcel_distress_source_models::{DatasetKind, RawDatasets, RawRecord};

use crate::fields::{
    Attributes, CASE_311_SCHEMA, COMPLAINT_SCHEMA, NOV_SCHEMA, PARCEL_SCHEMA, SourceSchema,
};
use crate::land_use::residential_keys;
use crate::tract::TractCounters;

/// Options controlling aggregation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateOptions {
    /// Keep only parcels the land-use dataset marks as residential.
    pub residential_only: bool,
}

/// Record counts observed during one aggregation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateStats {
    /// NOV rows that produced a parcel key.
    pub nov_matched: usize,
    /// NOV rows skipped for lack of a key.
    pub nov_skipped: usize,
    /// Complaint rows that produced a parcel key.
    pub complaint_matched: usize,
    /// Complaint rows skipped for lack of a key.
    pub complaint_skipped: usize,
    /// 311 rows scanned for tract counters.
    pub case_311_rows: usize,
    /// Parcel base rows that produced a parcel key.
    pub parcel_matched: usize,
    /// Parcel base rows skipped for lack of a key.
    pub parcel_skipped: usize,
    /// Whether the residential filter was applied.
    pub residential_filter_applied: bool,
    /// Distinct parcels before the residential filter.
    pub parcels_before_filter: usize,
    /// Distinct parcels in the result.
    pub parcels_after_filter: usize,
}

/// The result of [`aggregate_with_stats`].
#[derive(Debug, Clone)]
pub struct Aggregation {
    /// One record per parcel, ordered by key.
    pub parcels: BTreeMap<ParcelKey, ParcelRecord>,
    /// Tract counters built from the 311 dataset.
    pub tracts: TractCounters,
    /// Counts observed along the way.
    pub stats: AggregateStats,
}

/// Which descriptive fields a row may fill on a parcel created earlier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backfill {
    /// Every still-empty field.
    All,
    /// Only a still-empty address.
    AddressOnly,
}

/// Mutable accumulator for one parcel, private to the aggregation pass.
struct ParcelBuilder {
    key: ParcelKey,
    address: String,
    neighborhood: String,
    zipcode: String,
    supervisor_district: String,
    nov_count: u64,
    complaint_count: u64,
}

impl ParcelBuilder {
    const fn new(key: ParcelKey) -> Self {
        Self {
            key,
            address: String::new(),
            neighborhood: String::new(),
            zipcode: String::new(),
            supervisor_district: String::new(),
            nov_count: 0,
            complaint_count: 0,
        }
    }

    /// Fills every still-empty descriptive field from `attributes`.
    fn fill(&mut self, attributes: Attributes) {
        fill_empty(&mut self.address, attributes.address);
        fill_empty(&mut self.neighborhood, attributes.neighborhood);
        fill_empty(&mut self.zipcode, attributes.zipcode);
        fill_empty(&mut self.supervisor_district, attributes.supervisor_district);
    }

    fn build(self, case_311_count: u64) -> ParcelRecord {
        ParcelRecord {
            block: self.key.block().to_string(),
            lot: self.key.lot().to_string(),
            parcel_id: self.key,
            address: self.address,
            neighborhood: self.neighborhood,
            zipcode: self.zipcode,
            supervisor_district: self.supervisor_district,
            nov_count: self.nov_count,
            complaint_count: self.complaint_count,
            case_311_count,
        }
    }
}

fn fill_empty(slot: &mut String, value: Option<String>) {
    if slot.is_empty() {
        if let Some(value) = value {
            *slot = value;
        }
    }
}

/// Folds one dataset into the builder map. Returns `(matched, skipped)`.
///
/// Parcels created by this dataset take every attribute the row carries;
/// parcels created earlier are filled according to `backfill`.
fn fold_keyed(
    builders: &mut BTreeMap<ParcelKey, ParcelBuilder>,
    records: &[RawRecord],
    schema: &SourceSchema,
    backfill: Backfill,
    mut on_match: impl FnMut(&mut ParcelBuilder),
) -> (usize, usize) {
    let existing: BTreeSet<ParcelKey> = match backfill {
        Backfill::All => BTreeSet::new(),
        Backfill::AddressOnly => builders.keys().cloned().collect(),
    };
    let mut matched = 0;
    let mut skipped = 0;
    for record in records {
        let Some(key) = schema.key(record) else {
            skipped += 1;
            continue;
        };
        let restricted = existing.contains(&key);
        let builder = builders
            .entry(key)
            .or_insert_with_key(|key| ParcelBuilder::new(key.clone()));
        on_match(builder);
        let attributes = schema.attributes(record);
        if restricted {
            fill_empty(&mut builder.address, attributes.address);
        } else {
            builder.fill(attributes);
        }
        matched += 1;
    }
    (matched, skipped)
}

/// Aggregates raw datasets into one [`ParcelRecord`] per parcel key.
///
/// Missing datasets are treated as empty.
#[must_use]
pub fn aggregate(raw: &RawDatasets, options: &AggregateOptions) -> BTreeMap<ParcelKey, ParcelRecord> {
    aggregate_with_stats(raw, options).parcels
}

/// Like [`aggregate`], also returning the tract counters and record
/// statistics.
#[must_use]
pub fn aggregate_with_stats(raw: &RawDatasets, options: &AggregateOptions) -> Aggregation {
    let mut stats = AggregateStats::default();
    let mut builders: BTreeMap<ParcelKey, ParcelBuilder> = BTreeMap::new();

    (stats.nov_matched, stats.nov_skipped) = fold_keyed(
        &mut builders,
        raw.records(DatasetKind::Nov),
        &NOV_SCHEMA,
        Backfill::All,
        |b| b.nov_count += 1,
    );

    (stats.complaint_matched, stats.complaint_skipped) = fold_keyed(
        &mut builders,
        raw.records(DatasetKind::Complaint),
        &COMPLAINT_SCHEMA,
        Backfill::AddressOnly,
        |b| b.complaint_count += 1,
    );

    let case_311 = raw.records(DatasetKind::Case311);
    stats.case_311_rows = case_311.len();
    let tracts = TractCounters::from_records(case_311, &CASE_311_SCHEMA);

    (stats.parcel_matched, stats.parcel_skipped) = fold_keyed(
        &mut builders,
        raw.records(DatasetKind::Parcel),
        &PARCEL_SCHEMA,
        Backfill::All,
        |_| {},
    );

    stats.parcels_before_filter = builders.len();

    if options.residential_only {
        let residential = residential_keys(raw.records(DatasetKind::LandUse));
        if residential.is_empty() {
            log::warn!("No residential parcels found in land-use data; skipping residential filter");
        } else {
            builders.retain(|key, _| residential.contains(key));
            stats.residential_filter_applied = true;
        }
    }

    let parcels: BTreeMap<ParcelKey, ParcelRecord> = builders
        .into_iter()
        .map(|(key, builder)| {
            let case_311_count =
                tracts.attribute(&builder.neighborhood, &builder.supervisor_district);
            (key, builder.build(case_311_count))
        })
        .collect();

    stats.parcels_after_filter = parcels.len();

    log::info!(
        "Aggregated {} parcels ({} NOVs, {} complaints, {} 311 cases, {} base parcels)",
        parcels.len(),
        stats.nov_matched,
        stats.complaint_matched,
        stats.case_311_rows,
        stats.parcel_matched,
    );
    log::debug!(
        "Skipped rows without a parcel key: {} NOVs, {} complaints, {} base parcels",
        stats.nov_skipped,
        stats.complaint_skipped,
        stats.parcel_skipped,
    );
    if stats.residential_filter_applied {
        log::info!(
            "Residential filter kept {} of {} parcels",
            stats.parcels_after_filter,
            stats.parcels_before_filter
        );
    }

    Aggregation {
        parcels,
        tracts,
        stats,
    }
}
