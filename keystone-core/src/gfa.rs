//! Gross floor area input parsing.
//!
//! Accepts free text such as `"1,500 sq ft"` or `"140 sqm"` and normalizes it
//! to whole square feet.

use serde::{Deserialize, Serialize};

use crate::models::{CiteType, NewCitation};

pub const SQM_TO_SQFT: f64 = 10.7639;
pub const SQYD_TO_SQFT: f64 = 9.0;

const UNIT_TABLE: &[(&str, f64)] = &[
    ("sq ft", 1.0),
    ("sqft", 1.0),
    ("sq. ft.", 1.0),
    ("sq.ft.", 1.0),
    ("sq ft.", 1.0),
    ("sf", 1.0),
    ("ft2", 1.0),
    ("ft²", 1.0),
    ("square feet", 1.0),
    ("square foot", 1.0),
    ("sqm", SQM_TO_SQFT),
    ("sq m", SQM_TO_SQFT),
    ("sq. m.", SQM_TO_SQFT),
    ("m2", SQM_TO_SQFT),
    ("m²", SQM_TO_SQFT),
    ("square meters", SQM_TO_SQFT),
    ("square metres", SQM_TO_SQFT),
    ("sq yd", SQYD_TO_SQFT),
    ("sqyd", SQYD_TO_SQFT),
    ("yd2", SQYD_TO_SQFT),
    ("square yards", SQYD_TO_SQFT),
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GfaReading {
    /// Number as typed, commas removed.
    pub value: f64,
    /// Unit token as typed (trimmed, lowercased). Empty means square feet.
    pub unit: String,
    pub factor: f64,
    pub sqft_value: u64,
    /// False when the unit text was not in the conversion table and a 1:1
    /// conversion was assumed.
    pub unit_recognized: bool,
}

impl GfaReading {
    pub fn to_citation(&self, raw_input: &str) -> NewCitation {
        NewCitation::new(
            CiteType::GfaLock,
            format!("{} sq ft", self.sqft_value),
            self.sqft_value,
        )
        .question("gfa")
        .meta("input", raw_input.trim())
        .meta("original_value", self.value)
        .meta("original_unit", self.unit.as_str())
        .meta("conversion_factor", self.factor)
        .meta("sqft_value", self.sqft_value)
        .meta("unit_recognized", self.unit_recognized)
    }
}

fn lookup_unit(unit: &str) -> Option<f64> {
    if unit.is_empty() {
        return Some(1.0);
    }
    let collapsed = unit.split_whitespace().collect::<Vec<_>>().join(" ");
    UNIT_TABLE
        .iter()
        .find(|(key, _)| *key == collapsed)
        .map(|(_, factor)| *factor)
}

/// Parse a GFA answer. Returns `None` for non-numeric, non-finite or
/// non-positive input.
pub fn parse_gfa_input(input: &str) -> Option<GfaReading> {
    let cleaned = input.trim().replace(',', "");
    let split = cleaned
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+'))
        .unwrap_or(cleaned.len());
    let (number, rest) = cleaned.split_at(split);

    let value: f64 = number.parse().ok()?;
    if !value.is_finite() || value <= 0.0 {
        return None;
    }

    let unit = rest.trim().to_lowercase();
    let (factor, unit_recognized) = match lookup_unit(&unit) {
        Some(factor) => (factor, true),
        None => {
            tracing::warn!(unit = %unit, "unrecognized GFA unit, assuming square feet");
            (1.0, false)
        }
    };

    let sqft = (value * factor).round();
    if sqft < 1.0 {
        return None;
    }

    Some(GfaReading {
        value,
        unit,
        factor,
        sqft_value: sqft as u64,
        unit_recognized,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_feet_pass_through() {
        let r = parse_gfa_input("1500 sq ft").unwrap();
        assert_eq!(r.value, 1500.0);
        assert_eq!(r.sqft_value, 1500);
        assert!(r.unit_recognized);
    }

    #[test]
    fn square_metres_convert() {
        let r = parse_gfa_input("140 sqm").unwrap();
        assert_eq!(r.value, 140.0);
        assert_eq!(r.sqft_value, 1507);
        assert_eq!(r.factor, SQM_TO_SQFT);
    }

    #[test]
    fn commas_and_bare_numbers() {
        assert_eq!(parse_gfa_input("2,400").unwrap().sqft_value, 2400);
        assert_eq!(parse_gfa_input("  1,200.5 SQFT ").unwrap().sqft_value, 1201);
        assert_eq!(parse_gfa_input("100 square   yards").unwrap().sqft_value, 900);
    }

    #[test]
    fn rejects_non_positive_and_garbage() {
        assert!(parse_gfa_input("-5").is_none());
        assert!(parse_gfa_input("abc").is_none());
        assert!(parse_gfa_input("0 sq ft").is_none());
        assert!(parse_gfa_input("").is_none());
        assert!(parse_gfa_input("1.2.3 sqm").is_none());
    }

    #[test]
    fn unknown_unit_falls_back_to_square_feet() {
        let r = parse_gfa_input("800 acres").unwrap();
        assert_eq!(r.sqft_value, 800);
        assert!(!r.unit_recognized);
        assert_eq!(r.unit, "acres");
    }

    #[test]
    fn citation_carries_conversion_detail() {
        let r = parse_gfa_input("140 sqm").unwrap();
        let c = r.to_citation("140 sqm");
        assert_eq!(c.cite_type, CiteType::GfaLock);
        assert_eq!(c.value, serde_json::json!(1507));
        assert_eq!(c.metadata["original_unit"], "sqm");
        assert_eq!(c.answer, "1507 sq ft");
    }
}
