#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Dataset definition types and the raw record format.
//!
//! Every municipal dataset (violation notices, complaints, 311 cases, parcel
//! base, land use, generic event feeds) is described by a
//! [`DatasetDefinition`] and delivers its rows as untyped [`RawRecord`]s.
//! The aggregation crate consumes them through [`RawDatasets`] without
//! knowing how they were obtained.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A single row from an open-data API: field name to scalar JSON value.
///
/// Field names vary per dataset. Values are usually strings but some
/// portals return numbers (e.g. `supervisor_district`).
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// The role a dataset plays in the reconciliation pipeline.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DatasetKind {
    /// Notices of violation, keyed by block/lot.
    Nov,
    /// Abatement complaints, keyed by block/lot.
    Complaint,
    /// Citizen service requests, keyed by neighborhood/district only.
    #[serde(rename = "CASE_311")]
    #[strum(serialize = "CASE_311")]
    Case311,
    /// The base parcel dataset.
    Parcel,
    /// Land-use records keyed by a composite `mapblklot` identifier.
    LandUse,
    /// Generic event feed used for parcel hit counting.
    Event,
}

impl DatasetKind {
    /// The datasets consumed by the aggregation pass, in fetch order.
    pub const PIPELINE: &[Self] = &[
        Self::Nov,
        Self::Complaint,
        Self::Case311,
        Self::Parcel,
        Self::LandUse,
    ];
}

/// A config-driven dataset definition, loaded from embedded TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetDefinition {
    /// Unique identifier (e.g., `"dbi_novs"`). Also the cache filename stem.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// What the dataset is used for.
    pub kind: DatasetKind,
    /// How to fetch the raw rows.
    pub fetcher: FetcherConfig,
    /// Optional client-side row filter applied after fetching.
    #[serde(default)]
    pub filter: Option<RecordFilter>,
    /// Optional server-side date window (`$where <column> >= <date>`).
    #[serde(default)]
    pub window: Option<DateWindow>,
    /// Optional portal URL. Derived from the fetcher when absent.
    #[serde(default)]
    pub portal_url: Option<String>,
}

impl DatasetDefinition {
    /// Returns the dataset identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the human-readable dataset name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the portal URL, either configured or derived from a Socrata
    /// `/resource/{id}.json` endpoint as `/d/{id}`.
    #[must_use]
    pub fn portal_url(&self) -> Option<String> {
        if let Some(ref url) = self.portal_url {
            return Some(url.clone());
        }
        match &self.fetcher {
            FetcherConfig::Socrata { api_url, .. } => api_url.find("/resource/").map(|idx| {
                let base = &api_url[..idx];
                let rest = &api_url[idx + "/resource/".len()..];
                let dataset_id = rest.strip_suffix(".json").unwrap_or(rest);
                format!("{base}/d/{dataset_id}")
            }),
        }
    }
}

/// How to fetch raw rows from the source API.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FetcherConfig {
    /// Socrata SODA API (`$limit/$offset/$order/$where`).
    Socrata {
        /// Resource URL (e.g., `https://data.sfgov.org/resource/nbtm-fbw5.json`).
        api_url: String,
        /// Records per page. SODA caps a single request at 50,000.
        page_size: u64,
        /// Maximum total records to fetch. `None` paginates to the end.
        #[serde(default)]
        limit: Option<u64>,
        /// Optional `$order` clause for stable pagination.
        #[serde(default)]
        order: Option<String>,
    },
}

/// Client-side row filter.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecordFilter {
    /// Keep a row when the lowercase, space-joined text of `fields`
    /// contains any of `keywords`.
    Keywords {
        /// Fields whose text is searched.
        fields: Vec<String>,
        /// Lowercase keywords.
        keywords: Vec<String>,
    },
}

impl RecordFilter {
    /// Returns `true` if the record passes this filter.
    #[must_use]
    pub fn matches(&self, record: &RawRecord) -> bool {
        match self {
            Self::Keywords { fields, keywords } => {
                let text = fields
                    .iter()
                    .filter_map(|f| field_text(record, f))
                    .map(|s| s.to_lowercase())
                    .collect::<Vec<_>>()
                    .join(" ");
                keywords.iter().any(|kw| text.contains(kw.as_str()))
            }
        }
    }
}

/// Server-side date window for datasets that grow without bound.
#[derive(Debug, Clone, Deserialize)]
pub struct DateWindow {
    /// Floating-timestamp column to compare against.
    pub date_column: String,
    /// How many years back from today to include.
    pub years_back: u32,
}

/// Raw rows for every dataset that was obtained, keyed by role.
///
/// A dataset that failed to load is simply absent (or empty); readers
/// always get a slice back.
#[derive(Debug, Clone, Default)]
pub struct RawDatasets {
    records: BTreeMap<DatasetKind, Vec<RawRecord>>,
}

impl RawDatasets {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends rows for `kind`. Multiple datasets may share a kind.
    pub fn extend(&mut self, kind: DatasetKind, rows: impl IntoIterator<Item = RawRecord>) {
        self.records.entry(kind).or_default().extend(rows);
    }

    /// Builder-style variant of [`Self::extend`].
    #[must_use]
    pub fn with(mut self, kind: DatasetKind, rows: impl IntoIterator<Item = RawRecord>) -> Self {
        self.extend(kind, rows);
        self
    }

    /// Returns the rows for `kind`, or an empty slice if none were loaded.
    #[must_use]
    pub fn records(&self, kind: DatasetKind) -> &[RawRecord] {
        self.records.get(&kind).map_or(&[], Vec::as_slice)
    }

    /// Total rows across all kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }

    /// Returns `true` if no rows were loaded at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Reads a field as trimmed, non-empty text.
///
/// Strings are returned trimmed. Numbers are rendered without a trailing
/// `.0` when integral, so `9` and `9.0` both read as `"9"`. Everything
/// else (null, bool, nested values) reads as absent.
#[must_use]
pub fn field_text(record: &RawRecord, field: &str) -> Option<String> {
    match record.get(field)? {
        serde_json::Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                let f = n.as_f64()?;
                if f.is_finite() && f.fract() == 0.0 {
                    Some(format!("{f:.0}"))
                } else {
                    Some(f.to_string())
                }
            }
        }
        _ => None,
    }
}
