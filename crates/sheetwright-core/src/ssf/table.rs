//! Built-in number format tables.
//!
//! Indices below 164 are the Excel built-in formats; custom formats start
//! at 164. Unknown built-in indices fall back through a remap table and a
//! static default-string table before finally resolving to `"General"`.

/// Map a built-in number format id to its format code string.
pub fn builtin_format_code(id: u32) -> Option<&'static str> {
    match id {
        0 => Some("General"),
        1 => Some("0"),
        2 => Some("0.00"),
        3 => Some("#,##0"),
        4 => Some("#,##0.00"),
        9 => Some("0%"),
        10 => Some("0.00%"),
        11 => Some("0.00E+00"),
        12 => Some("# ?/?"),
        13 => Some("# ??/??"),
        14 => Some("m/d/yy"),
        15 => Some("d-mmm-yy"),
        16 => Some("d-mmm"),
        17 => Some("mmm-yy"),
        18 => Some("h:mm AM/PM"),
        19 => Some("h:mm:ss AM/PM"),
        20 => Some("h:mm"),
        21 => Some("h:mm:ss"),
        22 => Some("m/d/yy h:mm"),
        37 => Some("#,##0 ;(#,##0)"),
        38 => Some("#,##0 ;[Red](#,##0)"),
        39 => Some("#,##0.00;(#,##0.00)"),
        40 => Some("#,##0.00;[Red](#,##0.00)"),
        45 => Some("mm:ss"),
        46 => Some("[h]:mm:ss"),
        47 => Some("mmss.0"),
        48 => Some("##0.0E+0"),
        49 => Some("@"),
        _ => None,
    }
}

/// Semantic fallback for built-in ids that have no prescribed contents:
/// maps an unknown id to the id whose behavior it shares.
pub fn builtin_remap(id: u32) -> Option<u32> {
    match id {
        5 | 6 | 7 | 8 => Some(id + 32), // currency acts like accounting 37-40
        23..=26 => Some(0),
        27..=31 => Some(14),
        36 => Some(14),
        50..=58 => Some(14),
        59 => Some(1),
        60 => Some(2),
        61 => Some(3),
        62 => Some(4),
        67 => Some(9),
        68 => Some(10),
        69 => Some(12),
        70 => Some(13),
        71 | 72 => Some(14),
        73 => Some(15),
        74 => Some(16),
        75 => Some(17),
        76 => Some(20),
        77 => Some(21),
        78 => Some(22),
        79 => Some(45),
        80 => Some(46),
        81 => Some(47),
        82 => Some(0),
        _ => None,
    }
}

/// Default format strings for ids whose canonical contents are currency
/// patterns not present in the built-in table.
pub fn default_format_string(id: u32) -> Option<&'static str> {
    match id {
        5 => Some(r##""$"#,##0_);\("$"#,##0\)"##),
        6 => Some(r##""$"#,##0_);[Red]\("$"#,##0\)"##),
        7 => Some(r##""$"#,##0.00_);\("$"#,##0.00\)"##),
        8 => Some(r##""$"#,##0.00_);[Red]\("$"#,##0.00\)"##),
        41 => Some(r##"_(* #,##0_);_(* \(#,##0\);_(* "-"_);_(@_)"##),
        42 => Some(r##"_("$"* #,##0_);_("$"* \(#,##0\);_("$"* "-"_);_(@_)"##),
        43 => Some(r##"_(* #,##0.00_);_(* \(#,##0.00\);_(* "-"??_);_(@_)"##),
        44 => Some(r##"_("$"* #,##0.00_);_("$"* \(#,##0.00\);_("$"* "-"??_);_(@_)"##),
        63 => Some(r##""$"#,##0_);\("$"#,##0\)"##),
        64 => Some(r##""$"#,##0_);[Red]\("$"#,##0\)"##),
        65 => Some(r##""$"#,##0.00_);\("$"#,##0.00\)"##),
        66 => Some(r##""$"#,##0.00_);[Red]\("$"#,##0.00\)"##),
        _ => None,
    }
}

/// Resolve a format id to a concrete format code. `custom` is the
/// workbook's format table (custom ids are 164 and above, but a workbook
/// may also override lower ids).
pub fn resolve_format<'a>(
    id: u32,
    custom: Option<&'a std::collections::HashMap<u32, String>>,
) -> &'a str {
    if let Some(table) = custom {
        if let Some(code) = table.get(&id) {
            return code;
        }
    }
    if let Some(code) = builtin_format_code(id) {
        return code;
    }
    if let Some(remapped) = builtin_remap(id) {
        if let Some(code) = builtin_format_code(remapped) {
            return code;
        }
    }
    if let Some(code) = default_format_string(id) {
        return code;
    }
    "General"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_builtin_core_entries() {
        assert_eq!(builtin_format_code(0), Some("General"));
        assert_eq!(builtin_format_code(2), Some("0.00"));
        assert_eq!(builtin_format_code(14), Some("m/d/yy"));
        assert_eq!(builtin_format_code(49), Some("@"));
        assert_eq!(builtin_format_code(163), None);
    }

    #[test]
    fn test_remap_currency_to_accounting() {
        assert_eq!(builtin_remap(5), Some(37));
        assert_eq!(builtin_remap(8), Some(40));
    }

    #[test]
    fn test_remap_locale_dates() {
        assert_eq!(builtin_remap(27), Some(14));
        assert_eq!(builtin_remap(58), Some(14));
        assert_eq!(builtin_remap(81), Some(47));
    }

    #[test]
    fn test_resolve_prefers_custom_table() {
        let mut table = HashMap::new();
        table.insert(164u32, "0.000".to_string());
        table.insert(14u32, "yyyy-mm-dd".to_string());
        assert_eq!(resolve_format(164, Some(&table)), "0.000");
        // Workbook override beats the built-in.
        assert_eq!(resolve_format(14, Some(&table)), "yyyy-mm-dd");
    }

    #[test]
    fn test_resolve_falls_back_through_remap() {
        assert_eq!(resolve_format(5, None), "#,##0 ;(#,##0)");
        assert_eq!(resolve_format(27, None), "m/d/yy");
    }

    #[test]
    fn test_resolve_default_string_table() {
        assert!(resolve_format(42, None).contains("$"));
        assert!(resolve_format(44, None).contains("#,##0.00"));
    }

    #[test]
    fn test_resolve_unknown_is_general() {
        assert_eq!(resolve_format(150, None), "General");
        assert_eq!(resolve_format(200, None), "General");
    }
}
