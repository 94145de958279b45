//! Per-parcel hit counts across generic event datasets.

use std::collections::{BTreeMap, BTreeSet};

use parcel_distress_parcel_models::ParcelKey;
use parcel_distress_source_models::RawRecord;

use crate::fields::{EVENT_SCHEMA, PARCEL_SCHEMA};

/// Event hits per known parcel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventHits {
    hits: BTreeMap<ParcelKey, u64>,
}

impl EventHits {
    /// Hits recorded for `key`.
    #[must_use]
    pub fn get(&self, key: &ParcelKey) -> u64 {
        self.hits.get(key).copied().unwrap_or(0)
    }

    /// The `n` most-hit parcels, by count descending then key ascending.
    #[must_use]
    pub fn most_common(&self, n: usize) -> Vec<(&ParcelKey, u64)> {
        let mut entries: Vec<(&ParcelKey, u64)> =
            self.hits.iter().map(|(k, v)| (k, *v)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries.truncate(n);
        entries
    }

    /// Total hits across all parcels.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.hits.values().sum()
    }

    /// Number of parcels with at least one hit.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Whether no parcel was hit.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Keys of every parcel in the base parcel dataset.
#[must_use]
pub fn parcel_keys(records: &[RawRecord]) -> BTreeSet<ParcelKey> {
    records.iter().filter_map(|r| PARCEL_SCHEMA.key(r)).collect()
}

/// Counts, for each parcel in `known`, how many event records reference it.
///
/// Records are matched on their `block`/`lot` fields. Records without a key
/// or naming a parcel outside `known` are ignored.
pub fn count_event_hits<'a>(
    known: &BTreeSet<ParcelKey>,
    datasets: impl IntoIterator<Item = &'a [RawRecord]>,
) -> EventHits {
    let mut hits = BTreeMap::new();
    let mut unmatched = 0_usize;

    for records in datasets {
        for record in records {
            match EVENT_SCHEMA.key(record) {
                Some(key) if known.contains(&key) => {
                    *hits.entry(key).or_insert(0) += 1;
                }
                _ => unmatched += 1,
            }
        }
    }

    log::debug!(
        "Counted event hits on {} parcels ({unmatched} records unmatched)",
        hits.len()
    );

    EventHits { hits }
}
