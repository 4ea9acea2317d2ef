// crates/geoloc-core/src/regions.rs

//! GeoNames admin1 codes for Brazil mapped to two-letter state codes.
//!
//! The table is built once on first use and never mutated afterwards.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// (admin1 code, state code) pairs as published in the GeoNames `BR` dump.
const ADMIN1_TO_STATE: &[(&str, &str)] = &[
    ("01", "DF"),
    ("02", "ES"),
    ("03", "BA"),
    ("04", "GO"),
    ("05", "MA"),
    ("06", "MT"),
    ("07", "MS"),
    ("08", "MG"),
    ("09", "PA"),
    ("10", "PB"),
    ("11", "PR"),
    ("12", "PE"),
    ("13", "PI"),
    ("14", "RJ"),
    ("15", "RN"),
    ("16", "RS"),
    ("17", "RO"),
    ("18", "RR"),
    ("19", "SC"),
    ("20", "SP"),
    ("21", "SE"),
    ("22", "TO"),
    ("23", "RS"),
    ("24", "RO"),
    ("25", "AC"),
    ("26", "SC"),
    ("27", "SP"),
    ("28", "AL"),
    ("29", "AP"),
    ("30", "AM"),
    ("31", "CE"),
];

static REGION_TABLE: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| ADMIN1_TO_STATE.iter().copied().collect());

/// Resolves a raw admin1 code (e.g. `"20"`) to its state code (`"SP"`).
///
/// Returns `None` for codes that are not in the table; the importer treats
/// those records as invalid.
pub fn resolve(admin1: &str) -> Option<&'static str> {
    REGION_TABLE.get(admin1).copied()
}

/// Returns `true` if `code` is one of the two-letter state codes the table
/// can produce.
pub fn is_known_region(code: &str) -> bool {
    ADMIN1_TO_STATE.iter().any(|(_, state)| *state == code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_codes() {
        assert_eq!(resolve("01"), Some("DF"));
        assert_eq!(resolve("20"), Some("SP"));
        assert_eq!(resolve("31"), Some("CE"));
    }

    #[test]
    fn rejects_unknown_codes() {
        assert_eq!(resolve("00"), None);
        assert_eq!(resolve("32"), None);
        assert_eq!(resolve("1"), None);
        assert_eq!(resolve(""), None);
    }

    #[test]
    fn codomain_is_two_letter_codes() {
        assert!(ADMIN1_TO_STATE.iter().all(|(_, r)| r.len() == 2 && is_known_region(r)));
        assert!(is_known_region("AM"));
        assert!(!is_known_region("20"));
    }
}
