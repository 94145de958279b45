//! Tract-level counters for datasets without parcel identifiers.
//!
//! 311 cases carry a neighborhood and a supervisor district but no
//! block/lot, so they are counted per area and later attributed to every
//! parcel in that area.
//!
//! District labels arrive as `"9"`, `9`, `9.0`, or `"09"` depending on the
//! source, so they are compared by [`district_label`].

use std::collections::BTreeMap;

use parcel_distress_source_models::RawRecord;

use crate::fields::SourceSchema;

/// Event counts per neighborhood and per supervisor district.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TractCounters {
    neighborhoods: BTreeMap<String, u64>,
    districts: BTreeMap<String, u64>,
}

impl TractCounters {
    /// Counts `records` using `schema`'s neighborhood and district chains.
    ///
    /// A record increments its neighborhood counter and its district
    /// counter independently; either may be absent.
    #[must_use]
    pub fn from_records(records: &[RawRecord], schema: &SourceSchema) -> Self {
        let mut counters = Self::default();
        for record in records {
            let attributes = schema.attributes(record);
            counters.record(
                attributes.neighborhood.as_deref(),
                attributes.supervisor_district.as_deref(),
            );
        }
        counters
    }

    /// Counts one event.
    pub fn record(&mut self, neighborhood: Option<&str>, district: Option<&str>) {
        if let Some(hood) = neighborhood.filter(|s| !s.is_empty()) {
            *self.neighborhoods.entry(hood.to_string()).or_default() += 1;
        }
        if let Some(district) = district.and_then(district_label) {
            *self.districts.entry(district).or_default() += 1;
        }
    }

    /// Events counted for a neighborhood.
    #[must_use]
    pub fn neighborhood_count(&self, neighborhood: &str) -> u64 {
        self.neighborhoods.get(neighborhood).copied().unwrap_or(0)
    }

    /// Events counted for a supervisor district.
    #[must_use]
    pub fn district_count(&self, district: &str) -> u64 {
        district_label(district)
            .and_then(|label| self.districts.get(&label).copied())
            .unwrap_or(0)
    }

    /// The count attributed to a parcel: its neighborhood's count, or its
    /// district's count when the neighborhood lookup yields zero. The two
    /// are never summed.
    #[must_use]
    pub fn attribute(&self, neighborhood: &str, district: &str) -> u64 {
        match self.neighborhood_count(neighborhood) {
            0 => self.district_count(district),
            n => n,
        }
    }

    /// Number of distinct neighborhoods seen.
    #[must_use]
    pub fn neighborhood_len(&self) -> usize {
        self.neighborhoods.len()
    }

    /// Number of distinct districts seen.
    #[must_use]
    pub fn district_len(&self) -> usize {
        self.districts.len()
    }
}

/// Canonical form of a supervisor district label.
///
/// Integral numeric text collapses to its integer form (`"9.0"` and `"09"`
/// both become `"9"`); anything else is kept trimmed. Blank labels yield
/// `None`.
#[must_use]
pub fn district_label(district: &str) -> Option<String> {
    let trimmed = district.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() && n.fract() == 0.0 => Some(format!("{n:.0}")),
        _ => Some(trimmed.to_string()),
    }
}
