//! Cell rendering for report tables
//!
//! Backend data is frequently malformed (numbers as strings, stray units,
//! nulls), so everything here is total: every input renders to some string.

use super::types::CellValue;

/// Render a cell for display or text export
pub fn format_cell(value: &CellValue, is_percent: bool) -> String {
    if is_percent {
        return format_percent(value);
    }

    match value {
        CellValue::Empty => String::new(),
        CellValue::Number(n) => format_number(*n),
        CellValue::Text(s) => s.clone(),
    }
}

/// Percent rendering: two decimals and a `%` suffix, `0.00%` when unparsable
pub fn format_percent(value: &CellValue) -> String {
    match parse_float(value) {
        Some(n) => format!("{:.2}%", n),
        None => "0.00%".to_string(),
    }
}

/// Number rendering: grouped integers, two decimals for fractions
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    if n.fract() == 0.0 {
        let digits = format!("{:.0}", n.abs());
        let grouped = group_thousands(&digits);
        if n < 0.0 {
            format!("-{}", grouped)
        } else {
            grouped
        }
    } else {
        format!("{:.2}", n)
    }
}

/// Numeric reading of a cell; text uses `parseFloat` prefix rules
pub fn parse_float(value: &CellValue) -> Option<f64> {
    let n = match value {
        CellValue::Empty => None,
        CellValue::Number(n) => Some(*n),
        CellValue::Text(s) => parse_float_prefix(s),
    }?;

    n.is_finite().then_some(n)
}

/// Parse the longest numeric prefix of `input` after leading whitespace.
///
/// `"45.5%"` yields 45.5, `"12,345"` yields 12, `"abc"` yields None.
pub fn parse_float_prefix(input: &str) -> Option<f64> {
    let s = input.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }

    // Optional exponent, only consumed when complete
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok()
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_formatting() {
        assert_eq!(format_cell(&CellValue::from("abc"), true), "0.00%");
        assert_eq!(format_cell(&CellValue::Number(12.345), true), "12.35%");
        assert_eq!(format_cell(&CellValue::Number(100.0), true), "100.00%");
        assert_eq!(format_cell(&CellValue::from("45.5%"), true), "45.50%");
        assert_eq!(format_cell(&CellValue::from("  -3"), true), "-3.00%");
        assert_eq!(format_cell(&CellValue::Empty, true), "0.00%");
    }

    #[test]
    fn test_percent_is_total() {
        let inputs = [
            CellValue::Empty,
            CellValue::Number(f64::NAN),
            CellValue::Number(f64::INFINITY),
            CellValue::Number(-0.0),
            CellValue::Number(1e300),
            CellValue::from(""),
            CellValue::from("-"),
            CellValue::from("."),
            CellValue::from("1e"),
            CellValue::from("1e+"),
            CellValue::from("+.5"),
            CellValue::from("Infinity"),
            CellValue::from("١٢٣"),
            CellValue::from("%%%"),
        ];

        for input in &inputs {
            let rendered = format_cell(input, true);
            assert!(rendered.ends_with('%'), "{:?} -> {}", input, rendered);
        }
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(format_cell(&CellValue::Number(1234567.0), false), "1,234,567");
        assert_eq!(format_cell(&CellValue::Number(999.0), false), "999");
        assert_eq!(format_cell(&CellValue::Number(-1000.0), false), "-1,000");
        assert_eq!(format_cell(&CellValue::Number(0.0), false), "0");
        assert_eq!(format_cell(&CellValue::Number(1234.5), false), "1234.50");
        assert_eq!(format_cell(&CellValue::Number(f64::INFINITY), false), "Infinity");
    }

    #[test]
    fn test_text_and_empty() {
        assert_eq!(format_cell(&CellValue::from("CHENNAI"), false), "CHENNAI");
        assert_eq!(format_cell(&CellValue::Empty, false), "");
    }

    #[test]
    fn test_parse_float_prefix() {
        assert_eq!(parse_float_prefix("12,345"), Some(12.0));
        assert_eq!(parse_float_prefix("1.5e3x"), Some(1500.0));
        assert_eq!(parse_float_prefix("1e"), Some(1.0));
        assert_eq!(parse_float_prefix("-.25"), Some(-0.25));
        assert_eq!(parse_float_prefix("5."), Some(5.0));
        assert_eq!(parse_float_prefix("."), None);
        assert_eq!(parse_float_prefix("+"), None);
        assert_eq!(parse_float_prefix("n/a"), None);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn arb_cell() -> impl Strategy<Value = CellValue> {
            prop_oneof![
                Just(CellValue::Empty),
                any::<f64>().prop_map(CellValue::Number),
                "\\PC{0,16}".prop_map(CellValue::Text),
                "[ +-]?[0-9]{0,6}[.]?[0-9]{0,4}([eE][+-]?[0-9]{0,3})?[%a-z ]{0,3}"
                    .prop_map(CellValue::Text),
            ]
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(512))]

            #[test]
            fn prop_percent_is_total(cell in arb_cell()) {
                let rendered = format_cell(&cell, true);
                let number = rendered.strip_suffix('%');
                prop_assert!(number.is_some(), "{:?} -> {}", cell, rendered);
                let parsed = number.unwrap_or_default().parse::<f64>();
                let finite = parsed.map(f64::is_finite).unwrap_or(false);
                prop_assert!(finite, "{:?} -> {}", cell, rendered);
            }

            #[test]
            fn prop_plain_rendering_never_panics(cell in arb_cell()) {
                let rendered = format_cell(&cell, false);
                if let CellValue::Text(text) = &cell {
                    prop_assert_eq!(&rendered, text);
                }
            }

            #[test]
            fn prop_parse_prefix_of_arbitrary_text(text in "\\PC{0,24}") {
                if let Some(n) = parse_float_prefix(&text) {
                    prop_assert!(!n.is_nan());
                    let first = text.trim_start().chars().next();
                    prop_assert!(matches!(first, Some('0'..='9' | '+' | '-' | '.')));
                }
            }

            #[test]
            fn prop_number_then_suffix_parses_back(
                n in any::<f64>().prop_filter("finite", |n| n.is_finite()),
                suffix in "[%a-df-zA-DF-Z ,/]{0,6}",
            ) {
                let text = format!("{}{}", n, suffix);
                prop_assert_eq!(parse_float_prefix(&text), Some(n));
            }
        }
    }
}
