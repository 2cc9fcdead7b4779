//! CSV/TSV projection: worksheet -> delimited text, and the delimited
//! parser for the read side.

use crate::addr::CellRef;
use crate::cell::{Cell, CellValue};
use crate::sheet::Worksheet;
use crate::ssf;

/// Options for the CSV writer. TSV is CSV with a tab field separator and
/// LF record separator.
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Field separator.
    pub fs: char,
    /// Record separator.
    pub rs: String,
    /// Quote every field.
    pub force_quotes: bool,
    /// Emit rows with no populated cells.
    pub blankrows: bool,
    /// Skip hidden rows.
    pub skip_hidden: bool,
    /// Trim trailing empty fields from each record.
    pub strip: bool,
    /// Emit raw numbers instead of formatted text.
    pub raw_numbers: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            fs: ',',
            rs: "\n".to_string(),
            force_quotes: false,
            blankrows: true,
            skip_hidden: false,
            strip: false,
            raw_numbers: false,
        }
    }
}

/// Render a worksheet as CSV text.
pub fn sheet_to_csv(ws: &Worksheet, opts: &CsvOptions) -> String {
    let Some(dim) = ws.dimension else {
        return String::new();
    };

    let mut out = String::new();
    for r in dim.start.row..=dim.end.row {
        if opts.skip_hidden && ws.rows.get(&r).map(|p| p.hidden).unwrap_or(false) {
            continue;
        }
        let mut fields: Vec<String> = Vec::with_capacity(dim.width() as usize);
        let mut any = false;
        for c in dim.start.col..=dim.end.col {
            let cell = ws.cell(CellRef::new(r, c));
            let text = cell.map(|cell| field_text(cell, opts)).unwrap_or_default();
            if !text.is_empty() {
                any = true;
            }
            // The literal "ID" in the first field defeats Excel's SYLK
            // sniffing only when quoted.
            let force = opts.force_quotes
                || (r == dim.start.row && c == dim.start.col && text == "ID");
            fields.push(quote_field(&text, opts.fs, force));
        }
        if opts.strip {
            while fields.last().is_some_and(|f| f.is_empty()) {
                fields.pop();
            }
        }
        if !any && !opts.blankrows {
            continue;
        }
        out.push_str(&fields.join(&opts.fs.to_string()));
        out.push_str(&opts.rs);
    }
    out
}

/// Render a worksheet as TSV text.
pub fn sheet_to_tsv(ws: &Worksheet) -> String {
    sheet_to_csv(
        ws,
        &CsvOptions {
            fs: '\t',
            rs: "\n".to_string(),
            ..CsvOptions::default()
        },
    )
}

fn field_text(cell: &Cell, opts: &CsvOptions) -> String {
    // Formula-only cells emit the formula itself.
    if matches!(cell.value, CellValue::Empty) {
        if let Some(f) = &cell.formula {
            return format!("={f}");
        }
        return String::new();
    }
    if opts.raw_numbers {
        if let CellValue::Number(v) = cell.value {
            return format!("{v}");
        }
    }
    if let Some(w) = &cell.formatted {
        return w.clone();
    }
    match &cell.value {
        CellValue::Str(s) => s.clone(),
        CellValue::Number(v) => ssf::format_general(*v),
        CellValue::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        CellValue::Error(e) => e.glyph().to_string(),
        CellValue::Date(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        CellValue::Empty => String::new(),
    }
}

/// Quote a field when it contains the separator, CR, LF, a quote, or when
/// forced; embedded quotes are doubled.
fn quote_field(text: &str, fs: char, force: bool) -> String {
    let needs_quote =
        force || text.contains(fs) || text.contains('\r') || text.contains('\n') || text.contains('"');
    if !needs_quote {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        if c == '"' {
            out.push('"');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Parse delimited text into a worksheet. Accepts CRLF and LF endings,
/// quoted fields with embedded newlines, and doubled quotes.
pub fn csv_to_sheet(text: &str, fs: char, dense: bool) -> Worksheet {
    let mut ws = Worksheet::new(dense);
    let mut row: u32 = 0;
    let mut col: u32 = 0;
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();
    let mut row_started = false;

    let flush =
        |ws: &mut Worksheet, field: &mut String, row: u32, col: u32, row_started: bool| {
            if field.is_empty() && !row_started {
                return;
            }
            if !field.is_empty() {
                ws.set_cell(CellRef::new(row, col), infer_cell(field));
            }
            field.clear();
        };

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                c => field.push(c),
            }
            continue;
        }
        match c {
            '"' if field.is_empty() => {
                in_quotes = true;
                row_started = true;
            }
            c if c == fs => {
                flush(&mut ws, &mut field, row, col, true);
                col += 1;
                row_started = true;
            }
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                flush(&mut ws, &mut field, row, col, row_started);
                row += 1;
                col = 0;
                row_started = false;
            }
            '\n' => {
                flush(&mut ws, &mut field, row, col, row_started);
                row += 1;
                col = 0;
                row_started = false;
            }
            c => {
                field.push(c);
                row_started = true;
            }
        }
    }
    flush(&mut ws, &mut field, row, col, row_started);
    ws
}

/// Type inference for a parsed field: number, boolean, or string.
fn infer_cell(field: &str) -> Cell {
    let trimmed = field.trim();
    if trimmed == "TRUE" {
        return Cell::bool(true);
    }
    if trimmed == "FALSE" {
        return Cell::bool(false);
    }
    if let Ok(v) = trimmed.parse::<f64>() {
        if !trimmed.is_empty() {
            return Cell::number(v);
        }
    }
    Cell::text(field.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellError;

    fn grid(rows: &[&[&str]]) -> Worksheet {
        let mut ws = Worksheet::new(false);
        for (r, row) in rows.iter().enumerate() {
            for (c, text) in row.iter().enumerate() {
                ws.set_cell(CellRef::new(r as u32, c as u32), infer_cell(text));
            }
        }
        ws
    }

    // ----- writer -----------------------------------------------------------

    #[test]
    fn test_basic_csv() {
        let ws = grid(&[&["a", "b"], &["1", "2"]]);
        assert_eq!(sheet_to_csv(&ws, &CsvOptions::default()), "a,b\n1,2\n");
    }

    #[test]
    fn test_quoting_rules() {
        let mut ws = Worksheet::new(false);
        ws.set_cell(CellRef::new(0, 0), Cell::text("has,comma"));
        ws.set_cell(CellRef::new(0, 1), Cell::text("has\"quote"));
        ws.set_cell(CellRef::new(0, 2), Cell::text("has\nnewline"));
        let csv = sheet_to_csv(&ws, &CsvOptions::default());
        assert_eq!(csv, "\"has,comma\",\"has\"\"quote\",\"has\nnewline\"\n");
    }

    #[test]
    fn test_sylk_defense_quotes_leading_id() {
        let ws = grid(&[&["ID", "name"]]);
        let csv = sheet_to_csv(&ws, &CsvOptions::default());
        assert_eq!(csv, "\"ID\",name\n");
    }

    #[test]
    fn test_force_quotes() {
        let ws = grid(&[&["a", "b"]]);
        let csv = sheet_to_csv(
            &ws,
            &CsvOptions {
                force_quotes: true,
                ..CsvOptions::default()
            },
        );
        assert_eq!(csv, "\"a\",\"b\"\n");
    }

    #[test]
    fn test_formula_only_cells_emit_formula() {
        let mut ws = Worksheet::new(false);
        let mut cell = Cell::stub();
        cell.formula = Some("SUM(A1:A2)".to_string());
        ws.set_cell(CellRef::new(0, 0), cell);
        let csv = sheet_to_csv(&ws, &CsvOptions::default());
        assert_eq!(csv, "=SUM(A1:A2)\n");
    }

    #[test]
    fn test_formatted_text_wins_over_raw() {
        let mut ws = Worksheet::new(false);
        let mut cell = Cell::number(0.5);
        cell.formatted = Some("50%".to_string());
        ws.set_cell(CellRef::new(0, 0), cell);
        assert_eq!(sheet_to_csv(&ws, &CsvOptions::default()), "50%\n");
        let raw = sheet_to_csv(
            &ws,
            &CsvOptions {
                raw_numbers: true,
                ..CsvOptions::default()
            },
        );
        assert_eq!(raw, "0.5\n");
    }

    #[test]
    fn test_blankrows_suppression() {
        let mut ws = Worksheet::new(false);
        ws.set_cell(CellRef::new(0, 0), Cell::text("a"));
        ws.set_cell(CellRef::new(2, 0), Cell::text("b"));
        assert_eq!(sheet_to_csv(&ws, &CsvOptions::default()), "a\n\nb\n");
        let no_blank = sheet_to_csv(
            &ws,
            &CsvOptions {
                blankrows: false,
                ..CsvOptions::default()
            },
        );
        assert_eq!(no_blank, "a\nb\n");
    }

    #[test]
    fn test_strip_trailing_empty_fields() {
        let mut ws = Worksheet::new(false);
        ws.set_cell(CellRef::new(0, 0), Cell::text("a"));
        ws.set_cell(CellRef::new(0, 2), Cell::text("c"));
        ws.set_cell(CellRef::new(1, 0), Cell::text("b"));
        let stripped = sheet_to_csv(
            &ws,
            &CsvOptions {
                strip: true,
                ..CsvOptions::default()
            },
        );
        assert_eq!(stripped, "a,,c\nb\n");
    }

    #[test]
    fn test_error_cells_emit_glyphs() {
        let mut ws = Worksheet::new(false);
        ws.set_cell(CellRef::new(0, 0), Cell::error(CellError::Div0));
        assert_eq!(sheet_to_csv(&ws, &CsvOptions::default()), "#DIV/0!\n");
    }

    #[test]
    fn test_tsv_uses_tab() {
        let ws = grid(&[&["a", "b"]]);
        assert_eq!(sheet_to_tsv(&ws), "a\tb\n");
    }

    // ----- parser -----------------------------------------------------------

    #[test]
    fn test_parse_basic() {
        let ws = csv_to_sheet("a,b\n1,2\n", ',', false);
        assert_eq!(
            ws.cell(CellRef::new(0, 0)).unwrap().value,
            CellValue::Str("a".to_string())
        );
        assert_eq!(
            ws.cell(CellRef::new(1, 1)).unwrap().value,
            CellValue::Number(2.0)
        );
    }

    #[test]
    fn test_parse_crlf() {
        let ws = csv_to_sheet("a,b\r\n1,2\r\n", ',', false);
        assert_eq!(
            ws.cell(CellRef::new(1, 0)).unwrap().value,
            CellValue::Number(1.0)
        );
    }

    #[test]
    fn test_parse_quoted_fields() {
        let ws = csv_to_sheet("\"has,comma\",\"has\"\"quote\"\n", ',', false);
        assert_eq!(
            ws.cell(CellRef::new(0, 0)).unwrap().value,
            CellValue::Str("has,comma".to_string())
        );
        assert_eq!(
            ws.cell(CellRef::new(0, 1)).unwrap().value,
            CellValue::Str("has\"quote".to_string())
        );
    }

    #[test]
    fn test_parse_embedded_newline() {
        let ws = csv_to_sheet("\"line1\nline2\",x\n", ',', false);
        assert_eq!(
            ws.cell(CellRef::new(0, 0)).unwrap().value,
            CellValue::Str("line1\nline2".to_string())
        );
        assert_eq!(
            ws.cell(CellRef::new(0, 1)).unwrap().value,
            CellValue::Str("x".to_string())
        );
    }

    #[test]
    fn test_parse_type_inference() {
        let ws = csv_to_sheet("3.5,TRUE,FALSE,word\n", ',', false);
        assert_eq!(
            ws.cell(CellRef::new(0, 0)).unwrap().value,
            CellValue::Number(3.5)
        );
        assert_eq!(
            ws.cell(CellRef::new(0, 1)).unwrap().value,
            CellValue::Bool(true)
        );
        assert_eq!(
            ws.cell(CellRef::new(0, 2)).unwrap().value,
            CellValue::Bool(false)
        );
        assert_eq!(
            ws.cell(CellRef::new(0, 3)).unwrap().value,
            CellValue::Str("word".to_string())
        );
    }

    #[test]
    fn test_csv_roundtrip() {
        let ws = grid(&[&["Name", "Age"], &["Alice", "30"]]);
        let csv = sheet_to_csv(&ws, &CsvOptions::default());
        let back = csv_to_sheet(&csv, ',', false);
        assert_eq!(
            back.cell(CellRef::new(1, 0)).unwrap().value,
            CellValue::Str("Alice".to_string())
        );
        assert_eq!(
            back.cell(CellRef::new(1, 1)).unwrap().value,
            CellValue::Number(30.0)
        );
    }
}
