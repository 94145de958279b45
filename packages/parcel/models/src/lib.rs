#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Parcel identity and the records produced by the reconciliation pipeline.
//!
//! [`ParcelKey`] is the canonical block-lot identifier every dataset is
//! reconciled against. [`ParcelRecord`] is the per-parcel aggregate and
//! [`ScoredParcel`] adds the derived distress score. Field names serialize
//! verbatim (`parcel_id`, `nov_count`, ...) for downstream consumers.

mod key;

pub use key::ParcelKey;
use serde::Serialize;

/// Aggregated view of one parcel across every dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParcelRecord {
    /// Canonical block-lot key.
    pub parcel_id: ParcelKey,
    /// Zero-padded block number.
    pub block: String,
    /// Uppercased lot number.
    pub lot: String,
    /// First non-empty street address seen.
    pub address: String,
    /// Analysis neighborhood name, or empty if unknown.
    pub neighborhood: String,
    /// ZIP code, or empty if unknown.
    pub zipcode: String,
    /// Supervisor district, or empty if unknown.
    pub supervisor_district: String,
    /// Notices of violation recorded against the parcel.
    pub nov_count: u64,
    /// Abatement complaints recorded against the parcel.
    pub complaint_count: u64,
    /// 311 cases attributed through the parcel's neighborhood or district.
    pub case_311_count: u64,
}

impl ParcelRecord {
    /// The geographic bucket this parcel belongs to: its neighborhood,
    /// else its supervisor district, else `"Unknown"`.
    #[must_use]
    pub fn area(&self) -> &str {
        if !self.neighborhood.is_empty() {
            &self.neighborhood
        } else if !self.supervisor_district.is_empty() {
            &self.supervisor_district
        } else {
            "Unknown"
        }
    }
}

/// A parcel with its computed distress score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredParcel {
    /// The aggregated parcel.
    #[serde(flatten)]
    pub parcel: ParcelRecord,
    /// Weighted score, rounded to two decimals. Never negative.
    pub distress_score: f64,
}
