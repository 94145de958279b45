//! Residential parcel detection from land-use records.

use std::collections::BTreeSet;

use parcel_distress_parcel_models::ParcelKey;
use parcel_distress_source_models::{RawRecord, field_text};

use crate::fields::LAND_USE_SCHEMA;

/// Land-use codes that mark a parcel as residential.
const RESIDENTIAL_LAND_USES: &[&str] = &["RESIDENT", "MIXRES"];

/// Residential subtype codes that mark a parcel as residential.
const RESIDENTIAL_TYPES: &[&str] = &["SINGLE", "FLATS", "APTS", "CONDO", "SRO"];

/// Returns `true` if any of these hold: residential units (`res`) > 0,
/// `landuse` is a residential code, or `restype` is a residential subtype.
#[must_use]
pub fn is_residential(record: &RawRecord) -> bool {
    let units = field_text(record, "res")
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0);
    if units > 0.0 {
        return true;
    }

    let land_use = field_text(record, "landuse")
        .unwrap_or_default()
        .to_uppercase();
    if RESIDENTIAL_LAND_USES.contains(&land_use.as_str()) {
        return true;
    }

    let res_type = field_text(record, "restype")
        .unwrap_or_default()
        .to_uppercase();
    RESIDENTIAL_TYPES.contains(&res_type.as_str())
}

/// Collects the keys of every residential parcel. Records whose
/// `mapblklot` cannot be parsed are ignored.
#[must_use]
pub fn residential_keys(records: &[RawRecord]) -> BTreeSet<ParcelKey> {
    records
        .iter()
        .filter(|r| is_residential(r))
        .filter_map(|r| LAND_USE_SCHEMA.key(r))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(value: serde_json::Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn any_single_condition_qualifies() {
        assert!(is_residential(&record(serde_json::json!({"res": "3"}))));
        assert!(is_residential(&record(serde_json::json!({"res": 1.5}))));
        assert!(is_residential(&record(serde_json::json!({"landuse": "mixres"}))));
        assert!(is_residential(&record(serde_json::json!({"restype": "Condo"}))));
        assert!(is_residential(&record(
            serde_json::json!({"res": "0", "landuse": "RETAIL/ENT", "restype": "SRO"})
        )));
    }

    #[test]
    fn non_residential_records_are_rejected() {
        assert!(!is_residential(&record(serde_json::json!({}))));
        assert!(!is_residential(&record(
            serde_json::json!({"res": "0", "landuse": "PDR", "restype": ""})
        )));
        assert!(!is_residential(&record(serde_json::json!({"res": "n/a"}))));
    }

    #[test]
    fn collects_parseable_residential_keys() {
        let records: Vec<RawRecord> = [
            serde_json::json!({"mapblklot": "1186006", "res": "2"}),
            serde_json::json!({"mapblklot": "0099/A", "landuse": "RESIDENT"}),
            serde_json::json!({"mapblklot": "3512008", "landuse": "PDR"}),
            serde_json::json!({"mapblklot": "12", "res": "4"}),
        ]
        .into_iter()
        .map(record)
        .collect();

        let keys: Vec<String> = residential_keys(&records)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(keys, vec!["0099-A", "1186-006"]);
    }
}
