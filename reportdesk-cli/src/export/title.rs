//! Title cleanup and total-row detection for exported tables

use once_cell::sync::Lazy;
use regex::Regex;

use crate::report::CellValue;

static UNIT_ANNOTATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\((qty in mt|value in lakhs|value in l)\)").expect("valid regex")
});
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static TRAILING_DASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*-\s*$").expect("valid regex"));

/// First-cell markers of summary rows
const TOTAL_MARKERS: &[&str] = &[
    "TOTAL", "OVERALL", "SUMMARY", "GRAND", "AGGREGATE", "ACCLP", "ACCLLP",
];

/// Strip unit annotations, collapse whitespace, drop a trailing dash and
/// upper-case. Growth titles already carry their final form.
pub fn clean_title(title: &str) -> String {
    let lower = title.to_lowercase();
    if lower.contains("quantity growth") || lower.contains("value growth") {
        return title.trim().to_string();
    }

    let title = UNIT_ANNOTATION.replace_all(title, "");
    let title = WHITESPACE.replace_all(&title, " ");
    let title = TRAILING_DASH.replace(&title, "");
    title.trim().to_uppercase()
}

/// Whether a row's first cell marks it as a total/summary row
pub fn is_total_row(first_cell: &CellValue) -> bool {
    let Some(text) = first_cell.as_str() else {
        return false;
    };
    let text = text.trim().to_uppercase();
    !text.is_empty() && TOTAL_MARKERS.iter().any(|marker| text.contains(marker))
}

/// Excel sheet name: no `[]:*?/\`, not blank, at most 31 chars
pub fn sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim().trim_matches('\'');

    if cleaned.is_empty() {
        "Reports".to_string()
    } else {
        cleaned.chars().take(31).collect()
    }
}
