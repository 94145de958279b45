//! Weighted distress scoring.

use std::cmp::Ordering;
use std::path::Path;

use parcel_distress_parcel_models::{ParcelRecord, ScoredParcel};
use serde::Deserialize;

use crate::ConfigError;

/// Per-count weights of the distress score.
///
/// Loadable from TOML; omitted fields keep their default:
///
/// ```toml
/// nov = 1.0
/// complaint = 0.5
/// case_311 = 0.3
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoreWeights {
    /// Weight per notice of violation.
    pub nov: f64,
    /// Weight per abatement complaint.
    pub complaint: f64,
    /// Weight per attributed 311 case.
    pub case_311: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            nov: 1.0,
            complaint: 0.5,
            case_311: 0.3,
        }
    }
}

impl ScoreWeights {
    /// Parses weights from a TOML document.
    ///
    /// # Errors
    ///
    /// * If the document is not valid TOML or has unknown keys
    /// * If any weight is negative or not finite
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let weights: Self = toml::from_str(content)?;
        weights.validate()?;
        Ok(weights)
    }

    /// Reads weights from a TOML file.
    ///
    /// # Errors
    ///
    /// * If the file cannot be read
    /// * If its contents are rejected by [`Self::from_toml_str`]
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("nov", self.nov),
            ("complaint", self.complaint),
            ("case_311", self.case_311),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight {
                    name: name.to_string(),
                    value,
                });
            }
        }
        Ok(())
    }

    /// The distress score for a set of counts, rounded to two decimals.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn score(&self, nov: u64, complaint: u64, case_311: u64) -> f64 {
        let raw = (nov as f64).mul_add(
            self.nov,
            (complaint as f64).mul_add(self.complaint, case_311 as f64 * self.case_311),
        );
        round2(raw)
    }
}

/// Rounds to two decimals, half away from zero.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Descending score, then ascending parcel id.
pub(crate) fn rank_order(a: &ScoredParcel, b: &ScoredParcel) -> Ordering {
    b.distress_score
        .total_cmp(&a.distress_score)
        .then_with(|| a.parcel.parcel_id.cmp(&b.parcel.parcel_id))
}

/// Scores every parcel and orders the result by descending score, ties
/// broken by ascending parcel id.
#[must_use]
pub fn score_parcels(
    records: impl IntoIterator<Item = ParcelRecord>,
    weights: &ScoreWeights,
) -> Vec<ScoredParcel> {
    let mut scored: Vec<ScoredParcel> = records
        .into_iter()
        .map(|parcel| {
            let distress_score =
                weights.score(parcel.nov_count, parcel.complaint_count, parcel.case_311_count);
            ScoredParcel {
                parcel,
                distress_score,
            }
        })
        .collect();
    scored.sort_by(rank_order);

    log::debug!("Scored {} parcels", scored.len());

    scored
}

#[cfg(test)]
mod tests {
    use parcel_distress_parcel_models::ParcelKey;
    use proptest::prelude::*;

    use super::*;

    fn parcel(block: &str, lot: &str, counts: (u64, u64, u64)) -> ParcelRecord {
        let key = ParcelKey::normalize(Some(block), Some(lot)).unwrap();
        ParcelRecord {
            block: key.block().to_string(),
            lot: key.lot().to_string(),
            parcel_id: key,
            address: String::new(),
            neighborhood: String::new(),
            zipcode: String::new(),
            supervisor_district: String::new(),
            nov_count: counts.0,
            complaint_count: counts.1,
            case_311_count: counts.2,
        }
    }

    #[test]
    fn default_weights_apply_to_each_count() {
        let w = ScoreWeights::default();
        assert!((w.score(1, 0, 0) - 1.0).abs() < f64::EPSILON);
        assert!((w.score(0, 1, 0) - 0.5).abs() < f64::EPSILON);
        assert!((w.score(0, 0, 1) - 0.3).abs() < f64::EPSILON);
        assert!((w.score(2, 3, 7) - 5.6).abs() < f64::EPSILON);
        assert!(w.score(0, 0, 0).abs() < f64::EPSILON);
    }

    #[test]
    fn rounds_to_two_decimals_half_away_from_zero() {
        assert!((round2(0.125) - 0.13).abs() < f64::EPSILON);
        assert!((round2(2.675_000_1) - 2.68).abs() < f64::EPSILON);
        assert!((round2(1.004) - 1.0).abs() < f64::EPSILON);
        assert!((round2(0.3 * 3.0) - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn orders_by_score_then_parcel_id() {
        let scored = score_parcels(
            vec![
                parcel("0099", "A", (1, 0, 0)),
                parcel("5000", "1", (0, 2, 0)),
                parcel("1234", "56", (2, 0, 0)),
                parcel("0001", "1", (1, 0, 0)),
            ],
            &ScoreWeights::default(),
        );
        let ids: Vec<&str> = scored.iter().map(|s| s.parcel.parcel_id.as_str()).collect();
        assert_eq!(ids, vec!["1234-56", "0001-1", "0099-A", "5000-1"]);
        assert!((scored[0].distress_score - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn weights_load_from_toml_with_defaults() {
        let w = ScoreWeights::from_toml_str("nov = 2.0\n").unwrap();
        assert!((w.nov - 2.0).abs() < f64::EPSILON);
        assert!((w.complaint - 0.5).abs() < f64::EPSILON);
        assert!((w.case_311 - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_weights_are_rejected() {
        assert!(matches!(
            ScoreWeights::from_toml_str("nov = -1.0"),
            Err(ConfigError::InvalidWeight { .. })
        ));
        assert!(matches!(
            ScoreWeights::from_toml_str("novs = 1.0"),
            Err(ConfigError::Toml(_))
        ));
        assert!(matches!(
            ScoreWeights::from_toml_file(Path::new("/nonexistent/weights.toml")),
            Err(ConfigError::Io(_))
        ));
    }

    proptest! {
        #[test]
        fn score_depends_only_on_counts(
            nov in 0_u64..1000,
            complaint in 0_u64..1000,
            case_311 in 0_u64..1000,
        ) {
            let scored = score_parcels(
                vec![
                    parcel("1", "A", (nov, complaint, case_311)),
                    parcel("2", "B", (nov, complaint, case_311)),
                ],
                &ScoreWeights::default(),
            );
            prop_assert_eq!(scored[0].distress_score, scored[1].distress_score);
            prop_assert!(scored[0].distress_score >= 0.0);
            prop_assert_eq!(scored[0].parcel.parcel_id.as_str(), "0001-A");
        }
    }
}
