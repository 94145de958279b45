//! Per-source field alias tables.
//!
//! Every dataset names the same logical field differently (`block` vs
//! `block_id`, `zipcode` vs `zip_code`, ...). Each source's
//! [`SourceSchema`] lists, per logical field, an ordered [`FieldChain`] of
//! extractors. The first extractor yielding a non-empty value wins, so the
//! priority order is part of the schema rather than buried in expression
//! evaluation order.

use parcel_distress_parcel_models::ParcelKey;
use parcel_distress_source_models::{RawRecord, field_text};

/// One way of reading a logical field from a raw record.
#[derive(Debug, Clone, Copy)]
pub enum Extractor {
    /// Read a single field.
    Field(&'static str),
    /// Join the non-empty values of several fields with a space.
    Joined(&'static [&'static str]),
}

impl Extractor {
    /// Extracts a non-empty value, if present.
    #[must_use]
    pub fn extract(&self, record: &RawRecord) -> Option<String> {
        match self {
            Self::Field(field) => field_text(record, field),
            Self::Joined(fields) => {
                let parts: Vec<String> =
                    fields.iter().filter_map(|f| field_text(record, f)).collect();
                if parts.is_empty() {
                    None
                } else {
                    Some(parts.join(" "))
                }
            }
        }
    }
}

/// An ordered list of extractors; the first non-empty result wins.
#[derive(Debug, Clone, Copy)]
pub struct FieldChain(pub &'static [Extractor]);

impl FieldChain {
    /// A chain that never yields a value.
    pub const NONE: Self = Self(&[]);

    /// Resolves the field against a record.
    #[must_use]
    pub fn resolve(&self, record: &RawRecord) -> Option<String> {
        self.0.iter().find_map(|e| e.extract(record))
    }
}

/// Descriptive attributes a record can contribute to a parcel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    /// Street address.
    pub address: Option<String>,
    /// Neighborhood name.
    pub neighborhood: Option<String>,
    /// ZIP code.
    pub zipcode: Option<String>,
    /// Supervisor district.
    pub supervisor_district: Option<String>,
}

/// The declared field layout of one source dataset.
#[derive(Debug, Clone, Copy)]
pub struct SourceSchema {
    /// Block number.
    pub block: FieldChain,
    /// Lot number.
    pub lot: FieldChain,
    /// Composite block/lot identifier, used when block or lot is missing.
    pub composite: FieldChain,
    /// Street address.
    pub address: FieldChain,
    /// Neighborhood name.
    pub neighborhood: FieldChain,
    /// ZIP code.
    pub zipcode: FieldChain,
    /// Supervisor district.
    pub supervisor_district: FieldChain,
}

impl SourceSchema {
    /// Derives the parcel key from discrete block/lot fields, falling back
    /// to the composite identifier.
    #[must_use]
    pub fn key(&self, record: &RawRecord) -> Option<ParcelKey> {
        let block = self.block.resolve(record);
        let lot = self.lot.resolve(record);
        ParcelKey::normalize(block.as_deref(), lot.as_deref())
            .or_else(|| ParcelKey::from_composite(self.composite.resolve(record).as_deref()))
    }

    /// Extracts the descriptive attributes.
    #[must_use]
    pub fn attributes(&self, record: &RawRecord) -> Attributes {
        Attributes {
            address: self.address.resolve(record),
            neighborhood: self.neighborhood.resolve(record),
            zipcode: self.zipcode.resolve(record),
            supervisor_district: self.supervisor_district.resolve(record),
        }
    }
}

/// Street address assembled from its components.
const STREET_ADDRESS: Extractor =
    Extractor::Joined(&["street_number", "street_name", "street_suffix", "unit"]);

const DISTRICT: FieldChain = FieldChain(&[Extractor::Field("supervisor_district")]);

/// DBI notices of violation.
pub const NOV_SCHEMA: SourceSchema = SourceSchema {
    block: FieldChain(&[Extractor::Field("block"), Extractor::Field("block_id")]),
    lot: FieldChain(&[Extractor::Field("lot"), Extractor::Field("lot_id")]),
    composite: FieldChain::NONE,
    address: FieldChain(&[STREET_ADDRESS]),
    neighborhood: FieldChain(&[
        Extractor::Field("neighborhoods_analysis_boundaries"),
        Extractor::Field("neighborhood"),
    ]),
    zipcode: FieldChain(&[Extractor::Field("zipcode")]),
    supervisor_district: DISTRICT,
};

/// DBI abatement complaints.
pub const COMPLAINT_SCHEMA: SourceSchema = SourceSchema {
    block: FieldChain(&[Extractor::Field("block")]),
    lot: FieldChain(&[Extractor::Field("lot")]),
    composite: FieldChain::NONE,
    address: FieldChain(&[STREET_ADDRESS]),
    neighborhood: FieldChain(&[
        Extractor::Field("neighborhoods_analysis_boundaries"),
        Extractor::Field("neighborhood"),
    ]),
    zipcode: FieldChain(&[Extractor::Field("zip_code"), Extractor::Field("zipcode")]),
    supervisor_district: DISTRICT,
};

/// 311 cases. No parcel identifiers, only tract-level fields.
pub const CASE_311_SCHEMA: SourceSchema = SourceSchema {
    block: FieldChain::NONE,
    lot: FieldChain::NONE,
    composite: FieldChain::NONE,
    address: FieldChain::NONE,
    neighborhood: FieldChain(&[
        Extractor::Field("analysis_neighborhood"),
        Extractor::Field("neighborhoods_analysis_boundaries"),
        Extractor::Field("neighborhoods_sffind_boundaries"),
        Extractor::Field("neighborhood"),
    ]),
    zipcode: FieldChain::NONE,
    supervisor_district: DISTRICT,
};

/// The base parcel dataset.
pub const PARCEL_SCHEMA: SourceSchema = SourceSchema {
    block: FieldChain(&[Extractor::Field("block"), Extractor::Field("block_num")]),
    lot: FieldChain(&[Extractor::Field("lot"), Extractor::Field("lot_num")]),
    composite: FieldChain(&[Extractor::Field("blklot"), Extractor::Field("mapblklot")]),
    address: FieldChain(&[
        Extractor::Field("address"),
        Extractor::Field("addr"),
        STREET_ADDRESS,
    ]),
    neighborhood: FieldChain(&[
        Extractor::Field("neighborhoods_analysis_boundaries"),
        Extractor::Field("neighborhood"),
        Extractor::Field("analysis_neighborhood"),
    ]),
    zipcode: FieldChain(&[Extractor::Field("zipcode"), Extractor::Field("zip_code")]),
    supervisor_district: DISTRICT,
};

/// Land-use records, keyed only by a composite identifier.
pub const LAND_USE_SCHEMA: SourceSchema = SourceSchema {
    block: FieldChain::NONE,
    lot: FieldChain::NONE,
    composite: FieldChain(&[Extractor::Field("mapblklot")]),
    address: FieldChain::NONE,
    neighborhood: FieldChain::NONE,
    zipcode: FieldChain::NONE,
    supervisor_district: FieldChain::NONE,
};

/// Generic event feeds matched by plain `block`/`lot`.
pub const EVENT_SCHEMA: SourceSchema = SourceSchema {
    block: FieldChain(&[Extractor::Field("block")]),
    lot: FieldChain(&[Extractor::Field("lot")]),
    composite: FieldChain::NONE,
    address: FieldChain::NONE,
    neighborhood: FieldChain::NONE,
    zipcode: FieldChain::NONE,
    supervisor_district: FieldChain::NONE,
};

#[cfg(test)]
mod tests {
    use super::*;

    fn record(value: serde_json::Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn first_non_empty_alias_wins() {
        let r = record(serde_json::json!({
            "neighborhoods_analysis_boundaries": "",
            "neighborhood": "Mission",
        }));
        assert_eq!(
            NOV_SCHEMA.attributes(&r).neighborhood.as_deref(),
            Some("Mission")
        );

        let r = record(serde_json::json!({
            "neighborhoods_analysis_boundaries": "Bayview Hunters Point",
            "neighborhood": "Bayview",
        }));
        assert_eq!(
            NOV_SCHEMA.attributes(&r).neighborhood.as_deref(),
            Some("Bayview Hunters Point")
        );
    }

    #[test]
    fn nov_key_accepts_alternate_field_names() {
        let r = record(serde_json::json!({"block_id": "99", "lot_id": "a"}));
        assert_eq!(NOV_SCHEMA.key(&r).unwrap().as_str(), "0099-A");
    }

    #[test]
    fn joined_address_skips_missing_components() {
        let r = record(serde_json::json!({
            "street_number": "100",
            "street_name": "MAIN",
            "unit": "",
            "street_suffix": "ST",
        }));
        assert_eq!(
            NOV_SCHEMA.attributes(&r).address.as_deref(),
            Some("100 MAIN ST")
        );
        assert_eq!(NOV_SCHEMA.attributes(&record(serde_json::json!({}))).address, None);
    }

    #[test]
    fn parcel_key_falls_back_to_composite() {
        let r = record(serde_json::json!({"blklot": "3512008"}));
        assert_eq!(PARCEL_SCHEMA.key(&r).unwrap().as_str(), "3512-008");

        let r = record(serde_json::json!({"block_num": "3512", "blklot": "9999/001"}));
        assert_eq!(PARCEL_SCHEMA.key(&r).unwrap().as_str(), "9999-001");

        let r = record(serde_json::json!({"block_num": "3512", "lot_num": "008"}));
        assert_eq!(PARCEL_SCHEMA.key(&r).unwrap().as_str(), "3512-008");
    }

    #[test]
    fn numeric_district_reads_as_text() {
        let r = record(serde_json::json!({"supervisor_district": 9}));
        assert_eq!(
            CASE_311_SCHEMA.attributes(&r).supervisor_district.as_deref(),
            Some("9")
        );
    }

    #[test]
    fn schema_without_key_fields_yields_no_key() {
        let r = record(serde_json::json!({"block": "1234", "lot": "56"}));
        assert!(CASE_311_SCHEMA.key(&r).is_none());
    }
}
