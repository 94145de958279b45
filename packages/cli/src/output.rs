//! Rendering of ranked parcels and event hits.

use std::fmt::Write as _;
use std::path::Path;

use clap::ValueEnum;
use parcel_distress_parcel_models::ScoredParcel;
use strum_macros::{Display, EnumString};

use crate::pipeline::EventsReport;

/// How ranked parcels are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    /// Fixed-width text table.
    #[default]
    Table,
    /// Pretty-printed JSON array.
    Json,
}

impl OutputFormat {
    pub const ALL: &[Self] = &[Self::Table, Self::Json];
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('~');
        out
    }
}

/// Renders parcels as a text table, one row per parcel in rank order.
#[must_use]
pub fn render_table(parcels: &[ScoredParcel]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>4}  {:<12} {:>7} {:>5} {:>5} {:>5}  {:<24} ADDRESS",
        "#", "PARCEL", "SCORE", "NOV", "CMPL", "311", "AREA"
    );
    let _ = writeln!(out, "{}", "-".repeat(96));
    for (i, scored) in parcels.iter().enumerate() {
        let p = &scored.parcel;
        let _ = writeln!(
            out,
            "{:>4}  {:<12} {:>7.2} {:>5} {:>5} {:>5}  {:<24} {}",
            i + 1,
            p.parcel_id.as_str(),
            scored.distress_score,
            p.nov_count,
            p.complaint_count,
            p.case_311_count,
            truncate(p.area(), 24),
            p.address
        );
    }
    out
}

/// Renders parcels as a pretty-printed JSON array.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render_json(parcels: &[ScoredParcel]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(parcels)
}

/// Renders in `format`.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render(parcels: &[ScoredParcel], format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Table => Ok(render_table(parcels)),
        OutputFormat::Json => render_json(parcels),
    }
}

/// Prints the rendering, or writes it to `output` when given.
///
/// # Errors
///
/// Returns an error if rendering or writing the file fails.
pub fn emit(
    parcels: &[ScoredParcel],
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let rendered = render(parcels, format)?;
    match output {
        Some(path) => {
            std::fs::write(path, rendered)?;
            log::info!("Wrote {} parcels to {}", parcels.len(), path.display());
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

/// Renders the `top` most-hit parcels followed by a summary line.
#[must_use]
pub fn render_events(report: &EventsReport, top: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<12} {:>6}", "PARCEL", "HITS");
    let _ = writeln!(out, "{}", "-".repeat(19));
    for (key, hits) in report.hits.most_common(top) {
        let _ = writeln!(out, "{:<12} {hits:>6}", key.as_str());
    }
    let _ = writeln!(
        out,
        "\n{} hits on {} of {} known parcels",
        report.hits.total(),
        report.hits.len(),
        report.known_parcels.len()
    );
    out
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use parcel_distress_parcel::{ParcelKey, count_event_hits};
    use parcel_distress_parcel_models::ParcelRecord;
    use parcel_distress_source_models::RawRecord;

    use super::*;

    fn scored(block: &str, neighborhood: &str, score: f64) -> ScoredParcel {
        let key = ParcelKey::normalize(Some(block), Some("1")).unwrap();
        ScoredParcel {
            parcel: ParcelRecord {
                block: key.block().to_string(),
                lot: key.lot().to_string(),
                parcel_id: key,
                address: "100 MAIN ST".to_string(),
                neighborhood: neighborhood.to_string(),
                zipcode: String::new(),
                supervisor_district: String::new(),
                nov_count: 2,
                complaint_count: 0,
                case_311_count: 0,
            },
            distress_score: score,
        }
    }

    #[test]
    fn table_lists_parcels_in_order() {
        let table = render_table(&[scored("1234", "Mission", 2.0), scored("99", "", 1.0)]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[2].contains("1234-1"));
        assert!(lines[2].contains("2.00"));
        assert!(lines[2].contains("Mission"));
        assert!(lines[3].contains("0099-1"));
        assert!(lines[3].contains("Unknown"));
    }

    #[test]
    fn long_areas_are_truncated() {
        assert_eq!(truncate("Mission", 24), "Mission");
        assert_eq!(truncate("Bayview Hunters Point", 10), "Bayview H~");
    }

    #[test]
    fn json_preserves_field_names() {
        let json = render(&[scored("1234", "Mission", 2.0)], OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["parcel_id"], "1234-1");
        assert_eq!(value[0]["distress_score"], 2.0);
        assert_eq!(value[0]["nov_count"], 2);
    }

    #[test]
    fn format_names_parse() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::Table.to_string(), "table");
    }

    #[test]
    fn events_summary_counts_hits() {
        let known: BTreeSet<ParcelKey> = [ParcelKey::normalize(Some("1"), Some("A")).unwrap()]
            .into_iter()
            .collect();
        let events: Vec<RawRecord> = vec![
            serde_json::json!({"block": "1", "lot": "A"})
                .as_object()
                .cloned()
                .unwrap(),
        ];
        let report = EventsReport {
            hits: count_event_hits(&known, [events.as_slice()]),
            known_parcels: known,
        };
        let text = render_events(&report, 5);
        assert!(text.contains("0001-A"));
        assert!(text.contains("1 hits on 1 of 1 known parcels"));
    }
}
