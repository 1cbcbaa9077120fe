//! Field normalizers.
//!
//! Total functions from a raw scalar to its canonical form. None of them can
//! fail: every one defines what an absent, blank or unknown input becomes.

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Sentinel for a categorical value that is missing or unrecognized.
pub const NOT_AVAILABLE: &str = "n/a";

/// What [`normalize_code`] returns for a value the mapping does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// Always the [`NOT_AVAILABLE`] sentinel.
    Sentinel,
    /// The trimmed input itself (blank input still becomes the sentinel).
    PassThrough,
}

/// Lookup table from raw codes to human-readable labels.
///
/// Codes are matched after trimming and uppercasing. A mapping also accepts
/// its own labels, so normalizing an already normalized value is a no-op.
#[derive(Debug, Clone)]
pub struct CodeMapping {
    name: &'static str,
    lookup: HashMap<String, &'static str>,
    labels: Vec<&'static str>,
    fallback: Fallback,
}

impl CodeMapping {
    /// Build a mapping from `(code, label)` pairs.
    pub fn new(name: &'static str, pairs: &[(&str, &'static str)], fallback: Fallback) -> Self {
        let mut lookup = HashMap::new();
        let mut labels: Vec<&'static str> = Vec::new();

        for (code, label) in pairs {
            lookup.insert(code.trim().to_uppercase(), *label);
            if !labels.contains(label) {
                labels.push(*label);
            }
        }
        for label in &labels {
            lookup.entry(label.to_uppercase()).or_insert(*label);
        }

        Self {
            name,
            lookup,
            labels,
            fallback,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Distinct labels this mapping produces, in declaration order.
    pub fn labels(&self) -> &[&'static str] {
        &self.labels
    }

    pub fn fallback(&self) -> Fallback {
        self.fallback
    }

    /// Whether `value` is a label of this mapping or the sentinel.
    pub fn is_canonical(&self, value: &str) -> bool {
        value == NOT_AVAILABLE || self.labels.iter().any(|label| *label == value)
    }

    fn get(&self, code: &str) -> Option<&'static str> {
        self.lookup.get(code).copied()
    }
}

/// Marital status: `S`, `M`.
pub static MARITAL_STATUS: Lazy<CodeMapping> = Lazy::new(|| {
    CodeMapping::new(
        "marital_status",
        &[("S", "Single"), ("M", "Married")],
        Fallback::Sentinel,
    )
});

/// Gender: single letters or the full English words.
pub static GENDER: Lazy<CodeMapping> = Lazy::new(|| {
    CodeMapping::new(
        "gender",
        &[
            ("F", "Female"),
            ("FEMALE", "Female"),
            ("M", "Male"),
            ("MALE", "Male"),
        ],
        Fallback::Sentinel,
    )
});

/// Product line.
pub static PRODUCT_LINE: Lazy<CodeMapping> = Lazy::new(|| {
    CodeMapping::new(
        "product_line",
        &[
            ("M", "Mountain"),
            ("R", "Road"),
            ("S", "Sport"),
            ("T", "Touring"),
        ],
        Fallback::Sentinel,
    )
});

/// Country. Unknown countries are kept as written.
pub static COUNTRY: Lazy<CodeMapping> = Lazy::new(|| {
    CodeMapping::new(
        "country",
        &[
            ("DE", "Germany"),
            ("US", "United States"),
            ("USA", "United States"),
        ],
        Fallback::PassThrough,
    )
});

/// Expand a categorical code into its label.
///
/// Absent or blank values become `default`; unknown values follow the
/// mapping's [`Fallback`].
pub fn normalize_code(value: Option<&str>, mapping: &CodeMapping, default: &str) -> String {
    let trimmed = match value.map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => return default.to_string(),
    };

    if let Some(label) = mapping.get(&trimmed.to_uppercase()) {
        return label.to_string();
    }

    match mapping.fallback {
        Fallback::Sentinel => default.to_string(),
        Fallback::PassThrough => trimmed.to_string(),
    }
}

/// Trim free text. Text that is blank once trimmed becomes `None`.
pub fn clean_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Remove a literal prefix from an identifier when present.
pub fn strip_prefix<'a>(value: &'a str, prefix: &str) -> &'a str {
    value.strip_prefix(prefix).unwrap_or(value)
}

/// Remove every occurrence of any of `chars` from an identifier.
pub fn strip_chars(value: &str, chars: &[char]) -> String {
    value.chars().filter(|c| !chars.contains(c)).collect()
}

/// Null out a date that lies strictly after the processing time.
pub fn future_date_to_null(value: Option<NaiveDate>, now: NaiveDateTime) -> Option<NaiveDate> {
    value.filter(|date| *date <= now.date())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noon(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_marital_status() {
        assert_eq!(normalize_code(Some(" s "), &MARITAL_STATUS, NOT_AVAILABLE), "Single");
        assert_eq!(normalize_code(Some("M"), &MARITAL_STATUS, NOT_AVAILABLE), "Married");
        assert_eq!(normalize_code(Some("X"), &MARITAL_STATUS, NOT_AVAILABLE), "n/a");
        assert_eq!(normalize_code(Some("   "), &MARITAL_STATUS, NOT_AVAILABLE), "n/a");
        assert_eq!(normalize_code(None, &MARITAL_STATUS, NOT_AVAILABLE), "n/a");
    }

    #[test]
    fn test_gender_accepts_words() {
        assert_eq!(normalize_code(Some("female "), &GENDER, NOT_AVAILABLE), "Female");
        assert_eq!(normalize_code(Some("MALE"), &GENDER, NOT_AVAILABLE), "Male");
        assert_eq!(normalize_code(Some("f"), &GENDER, NOT_AVAILABLE), "Female");
        assert_eq!(normalize_code(Some("unknown"), &GENDER, NOT_AVAILABLE), "n/a");
    }

    #[test]
    fn test_product_line() {
        assert_eq!(normalize_code(Some("R "), &PRODUCT_LINE, NOT_AVAILABLE), "Road");
        assert_eq!(normalize_code(Some("s"), &PRODUCT_LINE, NOT_AVAILABLE), "Sport");
        assert_eq!(normalize_code(Some("T"), &PRODUCT_LINE, NOT_AVAILABLE), "Touring");
        assert_eq!(normalize_code(Some("Z"), &PRODUCT_LINE, NOT_AVAILABLE), "n/a");
    }

    #[test]
    fn test_country_passes_unknown_through() {
        assert_eq!(normalize_code(Some("DE"), &COUNTRY, NOT_AVAILABLE), "Germany");
        assert_eq!(normalize_code(Some(" usa"), &COUNTRY, NOT_AVAILABLE), "United States");
        assert_eq!(normalize_code(Some("US"), &COUNTRY, NOT_AVAILABLE), "United States");
        assert_eq!(normalize_code(Some("  France "), &COUNTRY, NOT_AVAILABLE), "France");
        assert_eq!(normalize_code(Some(""), &COUNTRY, NOT_AVAILABLE), "n/a");
        assert_eq!(normalize_code(None, &COUNTRY, NOT_AVAILABLE), "n/a");
    }

    #[test]
    fn test_normalize_code_is_idempotent() {
        for mapping in [&*MARITAL_STATUS, &*GENDER, &*PRODUCT_LINE, &*COUNTRY] {
            let codes: Vec<String> = mapping.lookup.keys().cloned().collect();
            for code in codes.iter().map(String::as_str).chain(["", "??"]) {
                let once = normalize_code(Some(code), mapping, NOT_AVAILABLE);
                let twice = normalize_code(Some(once.as_str()), mapping, NOT_AVAILABLE);
                assert_eq!(once, twice, "{} not idempotent for '{}'", mapping.name(), code);
            }
        }
    }

    #[test]
    fn test_is_canonical() {
        assert!(GENDER.is_canonical("Male"));
        assert!(GENDER.is_canonical("n/a"));
        assert!(!GENDER.is_canonical("M"));
        assert_eq!(GENDER.labels(), &["Female", "Male"]);
    }

    #[test]
    fn test_strip_prefix() {
        assert_eq!(strip_prefix("NASAW00011000", "NAS"), "AW00011000");
        assert_eq!(strip_prefix("AW00011000", "NAS"), "AW00011000");
        assert_eq!(strip_prefix("XNAS1", "NAS"), "XNAS1");
    }

    #[test]
    fn test_strip_chars_is_idempotent() {
        let once = strip_chars("AW-000-11000", &['-']);
        assert_eq!(once, "AW00011000");
        assert_eq!(strip_chars(&once, &['-']), once);
    }

    #[test]
    fn test_future_date_to_null() {
        let now = noon(2024, 5, 1);
        let past = NaiveDate::from_ymd_opt(1980, 2, 29);
        let today = NaiveDate::from_ymd_opt(2024, 5, 1);
        let tomorrow = NaiveDate::from_ymd_opt(2024, 5, 2);

        assert_eq!(future_date_to_null(past, now), past);
        assert_eq!(future_date_to_null(today, now), today);
        assert_eq!(future_date_to_null(tomorrow, now), None);
        assert_eq!(future_date_to_null(None, now), None);
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text(Some("  Jon ")), Some("Jon".to_string()));
        assert_eq!(clean_text(Some("   ")), None);
        assert_eq!(clean_text(None), None);
    }
}
