//! The number/date format engine.
//!
//! A pure evaluator for Excel-compatible format strings: section selection
//! (with bracket conditionals), date-serial rendering, and the full set of
//! number masks. Reentrant by construction -- the caller passes the
//! workbook's format table through [`Options`]; no global state exists.

pub mod date_fmt;
pub mod general;
pub mod num_fmt;
pub mod section;
pub mod table;

use std::collections::HashMap;

use crate::error::Result;

pub use general::format_general;
pub use table::{builtin_format_code, resolve_format};

/// The value being formatted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    Number(f64),
    Text(&'a str),
    Bool(bool),
    Empty,
}

/// Evaluation options.
#[derive(Debug, Clone, Copy, Default)]
pub struct Options<'a> {
    /// Interpret date serials under the 1904 calendar.
    pub date1904: bool,
    /// The workbook's number-format table (custom ids are 164+).
    pub table: Option<&'a HashMap<u32, String>>,
}

/// Format a value using a format code string.
pub fn format(code: &str, value: Value<'_>, opts: &Options<'_>) -> Result<String> {
    match value {
        Value::Empty => Ok(String::new()),
        Value::Bool(b) => format_text(code, if b { "TRUE" } else { "FALSE" }),
        Value::Text(s) => format_text(code, s),
        Value::Number(v) => format_numeric(code, v, opts),
    }
}

/// Format a value by format-table index.
pub fn format_index(id: u32, value: Value<'_>, opts: &Options<'_>) -> Result<String> {
    let code = table::resolve_format(id, opts.table);
    format(code, value, opts)
}

fn format_text(code: &str, text: &str) -> Result<String> {
    let sections = section::split_sections(code)?;
    match section::choose_text_section(&sections) {
        Some(sec) => Ok(num_fmt::format_text_section(sec, text)),
        None => Ok(text.to_string()),
    }
}

fn format_numeric(code: &str, v: f64, opts: &Options<'_>) -> Result<String> {
    let sections = section::split_sections(code)?;
    let (chosen, own_sign) = section::choose_section(&sections, v);

    // Non-finite values substitute the Excel error glyphs without
    // tokenising, but only when the chosen section would consume the
    // value (a digit placeholder or a date token). A literal-only
    // section still renders.
    if !v.is_finite()
        && (section::has_digit_placeholder(chosen) || section::is_date_section(chosen))
    {
        return Ok(if v.is_nan() { "#NUM!" } else { "#DIV/0!" }.to_string());
    }

    // Error glyphs never carry a sign of their own.
    let add_sign = v < 0.0 && v.is_finite() && !own_sign;
    let magnitude = v.abs();

    if section::is_date_section(chosen) {
        return Ok(date_fmt::format_date(magnitude, chosen, opts.date1904));
    }
    Ok(num_fmt::format_number(magnitude, chosen, add_sign))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datetime::date_to_serial;
    use chrono::NaiveDate;

    fn n(code: &str, v: f64) -> String {
        format(code, Value::Number(v), &Options::default()).unwrap()
    }

    // ----- dispatch across sections ---------------------------------------

    #[test]
    fn test_accounting_negative() {
        assert_eq!(n("#,##0.00;(#,##0.00)", -1234.5), "(1,234.50)");
        assert_eq!(n("#,##0.00;(#,##0.00)", 1234.5), "1,234.50");
    }

    #[test]
    fn test_conditional_sections() {
        let code = "[>=100]\"big\";[<0]\"neg\";\"small\"";
        assert_eq!(n(code, 150.0), "big");
        assert_eq!(n(code, -3.0), "neg");
        assert_eq!(n(code, 50.0), "small");
    }

    #[test]
    fn test_three_section_zero() {
        assert_eq!(n("0.00;(0.00);\"-\"", 0.0), "-");
    }

    #[test]
    fn test_date_dispatch() {
        let serial = date_to_serial(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(), false);
        assert_eq!(n("yyyy-mm-dd", serial), "2024-06-15");
    }

    #[test]
    fn test_elapsed_boundary_cases() {
        assert_eq!(n("[h]:mm", 1.5), "36:00");
        assert_eq!(n("[mm]:ss", 0.5), "720:00");
    }

    #[test]
    fn test_scientific_zero_boundary() {
        assert_eq!(n("0.00E+00", 0.0), "0.00E+00");
    }

    // ----- index lookup ---------------------------------------------------

    #[test]
    fn test_format_index_builtin_date() {
        let serial = date_to_serial(NaiveDate::from_ymd_opt(2024, 6, 5).unwrap(), false);
        let out = format_index(14, Value::Number(serial), &Options::default()).unwrap();
        assert_eq!(out, "6/5/24");
    }

    #[test]
    fn test_format_index_custom_table() {
        let mut table = HashMap::new();
        table.insert(164u32, "0.000".to_string());
        let opts = Options {
            date1904: false,
            table: Some(&table),
        };
        assert_eq!(
            format_index(164, Value::Number(1.5), &opts).unwrap(),
            "1.500"
        );
    }

    #[test]
    fn test_format_index_unknown_is_general() {
        assert_eq!(
            format_index(200, Value::Number(7.5), &Options::default()).unwrap(),
            "7.5"
        );
    }

    // ----- value kinds ----------------------------------------------------

    #[test]
    fn test_empty_value() {
        assert_eq!(
            format("0.00", Value::Empty, &Options::default()).unwrap(),
            ""
        );
    }

    #[test]
    fn test_text_value_through_at_section() {
        assert_eq!(
            format("0.00;@\" !\"", Value::Text("hi"), &Options::default()).unwrap(),
            "hi !"
        );
        assert_eq!(
            format("@", Value::Text("plain"), &Options::default()).unwrap(),
            "plain"
        );
    }

    #[test]
    fn test_text_value_without_at_prints_literally() {
        assert_eq!(
            format("0.00", Value::Text("words"), &Options::default()).unwrap(),
            "words"
        );
    }

    #[test]
    fn test_bool_value() {
        assert_eq!(
            format("General", Value::Bool(true), &Options::default()).unwrap(),
            "TRUE"
        );
        assert_eq!(
            format("General", Value::Bool(false), &Options::default()).unwrap(),
            "FALSE"
        );
    }

    #[test]
    fn test_four_section_text() {
        let code = "0;(0);\"-\";\"<\"@\">\"";
        assert_eq!(
            format(code, Value::Text("x"), &Options::default()).unwrap(),
            "<x>"
        );
    }

    // ----- non-finite -----------------------------------------------------

    #[test]
    fn test_non_finite_glyphs() {
        assert_eq!(n("0.00", f64::NAN), "#NUM!");
        assert_eq!(n("0.00", f64::INFINITY), "#DIV/0!");
        assert_eq!(n("General", f64::NEG_INFINITY), "#DIV/0!");
        assert_eq!(n("yyyy-mm-dd", f64::NAN), "#NUM!");
    }

    #[test]
    fn test_non_finite_literal_only_section_renders() {
        // The glyph substitution applies only when the chosen section has
        // a digit placeholder; a literal-only format never reads the value.
        assert_eq!(n("\"N/A\"", f64::NAN), "N/A");
        assert_eq!(n("\"N/A\"", f64::INFINITY), "N/A");
    }

    // ----- errors ---------------------------------------------------------

    #[test]
    fn test_unterminated_quote_is_fatal() {
        assert!(format("0\"oops", Value::Number(1.0), &Options::default()).is_err());
    }

    #[test]
    fn test_1904_option_shifts_dates() {
        let opts = Options {
            date1904: true,
            table: None,
        };
        assert_eq!(
            format("yyyy-mm-dd", Value::Number(0.0), &opts).unwrap(),
            "1904-01-01"
        );
    }

    #[test]
    fn test_default_date_format_roundtrip_property() {
        // formatNumber(14, toSerial(d)) yields the default date text.
        for (y, m, d, expect) in [
            (2024, 1, 5, "1/5/24"),
            (1999, 12, 31, "12/31/99"),
            (2030, 10, 1, "10/1/30"),
        ] {
            let serial = date_to_serial(NaiveDate::from_ymd_opt(y, m, d).unwrap(), false);
            assert_eq!(
                format_index(14, Value::Number(serial), &Options::default()).unwrap(),
                expect
            );
        }
    }
}
