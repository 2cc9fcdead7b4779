//! HTML table projection: worksheet -> `<table>` markup honoring merges,
//! and a tolerant table parser for the read side.

use std::collections::HashSet;

use crate::addr::{CellRef, Range};
use crate::cell::{Cell, CellValue};
use crate::sheet::Worksheet;
use crate::ssf;
use crate::xmlutil::{escape_text, unescape_text};

/// Options for the HTML writer.
#[derive(Debug, Clone)]
pub struct HtmlOptions {
    /// Markup emitted before the table.
    pub header: String,
    /// Markup emitted after the table.
    pub footer: String,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        Self {
            header: "<html><head><meta charset=\"utf-8\"/></head><body>".to_string(),
            footer: "</body></html>".to_string(),
        }
    }
}

/// Render a worksheet as an HTML document with one `<table>`.
pub fn sheet_to_html(ws: &Worksheet, opts: &HtmlOptions) -> String {
    let mut out = String::new();
    out.push_str(&opts.header);
    out.push_str("<table>");

    if let Some(dim) = ws.dimension {
        // Interior cells of merge ranges are skipped; the anchor carries
        // rowspan/colspan.
        let mut covered: HashSet<CellRef> = HashSet::new();
        for merge in &ws.merges {
            for at in merge.cells() {
                if at != merge.start {
                    covered.insert(at);
                }
            }
        }

        for r in dim.start.row..=dim.end.row {
            out.push_str("<tr>");
            for c in dim.start.col..=dim.end.col {
                let at = CellRef::new(r, c);
                if covered.contains(&at) {
                    continue;
                }
                let merge = ws.merges.iter().find(|m| m.start == at);
                out.push_str(&render_td(ws.cell(at), merge));
            }
            out.push_str("</tr>");
        }
    }

    out.push_str("</table>");
    out.push_str(&opts.footer);
    out
}

fn render_td(cell: Option<&Cell>, merge: Option<&Range>) -> String {
    let mut attrs = String::new();
    if let Some(m) = merge {
        if m.height() > 1 {
            attrs.push_str(&format!(" rowspan=\"{}\"", m.height()));
        }
        if m.width() > 1 {
            attrs.push_str(&format!(" colspan=\"{}\"", m.width()));
        }
    }

    let Some(cell) = cell else {
        return format!("<td{attrs}></td>");
    };

    let (data_t, data_v, display) = match &cell.value {
        CellValue::Empty => ("z", None, String::new()),
        CellValue::Number(v) => {
            if v.is_nan() {
                ("e", Some("#NUM!".to_string()), "#NUM!".to_string())
            } else if v.is_infinite() {
                ("e", Some("#DIV/0!".to_string()), "#DIV/0!".to_string())
            } else {
                (
                    "n",
                    Some(format!("{v}")),
                    cell.formatted.clone().unwrap_or_else(|| ssf::format_general(*v)),
                )
            }
        }
        CellValue::Bool(b) => (
            "b",
            Some(if *b { "1" } else { "0" }.to_string()),
            if *b { "TRUE" } else { "FALSE" }.to_string(),
        ),
        CellValue::Str(s) => ("s", Some(s.clone()), s.clone()),
        CellValue::Error(e) => ("e", Some(e.glyph().to_string()), e.glyph().to_string()),
        CellValue::Date(dt) => (
            "d",
            Some(dt.format("%Y-%m-%dT%H:%M:%S").to_string()),
            cell.formatted
                .clone()
                .unwrap_or_else(|| dt.format("%Y-%m-%d").to_string()),
        ),
    };

    attrs.push_str(&format!(" data-t=\"{data_t}\""));
    if let Some(v) = &data_v {
        attrs.push_str(&format!(" data-v=\"{}\"", escape_text(v)));
    }
    if let Some(crate::cell::NumberFormat::Code(z)) = &cell.number_format {
        attrs.push_str(&format!(" data-z=\"{}\"", escape_text(z)));
    }
    if let Some(f) = &cell.formula {
        attrs.push_str(&format!(" data-f=\"{}\"", escape_text(f)));
    }

    let mut content = escape_text(&display);
    // Hyperlinks wrap the content unless the target is internal or a
    // script URL.
    if let Some(link) = &cell.hyperlink {
        let lowered = link.target.to_ascii_lowercase();
        if !link.is_internal() && !lowered.starts_with("javascript:") {
            content = format!(
                "<a href=\"{}\">{content}</a>",
                escape_text(&link.target)
            );
        }
    }

    format!("<td{attrs}>{content}</td>")
}

/// Parse the first `<table>` in an HTML document into a worksheet.
/// Honors `rowspan`/`colspan` and reads `data-t`/`data-v` overrides.
pub fn html_to_sheet(html: &str, dense: bool) -> Worksheet {
    let mut ws = Worksheet::new(dense);
    let mut row: i64 = -1;
    let mut col: u32 = 0;
    // Cells occupied by a span from an earlier row.
    let mut occupied: HashSet<(u32, u32)> = HashSet::new();

    let mut i = 0;
    let bytes = html.as_bytes();
    while i < bytes.len() {
        let Some(open) = html[i..].find('<') else { break };
        let start = i + open;
        let Some(close) = html[start..].find('>') else { break };
        let end = start + close;
        let tag_body = &html[start + 1..end];
        let is_closing = tag_body.starts_with('/');
        let tag_name = tag_body
            .trim_start_matches('/')
            .split(|c: char| c.is_whitespace() || c == '/')
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();

        if is_closing {
            if tag_name == "table" {
                break;
            }
            i = end + 1;
            continue;
        }

        match tag_name.as_str() {
            "tr" => {
                row += 1;
                col = 0;
                i = end + 1;
            }
            "td" | "th" => {
                if row < 0 {
                    row = 0;
                }
                let r = row as u32;
                while occupied.contains(&(r, col)) {
                    col += 1;
                }

                let rowspan: u32 = attr_value(tag_body, "rowspan")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(1);
                let colspan: u32 = attr_value(tag_body, "colspan")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(1);
                let data_t = attr_value(tag_body, "data-t");
                let data_v = attr_value(tag_body, "data-v");

                // Cell content runs to the closing tag; inner markup is
                // stripped, <br> becomes a newline.
                let content_start = end + 1;
                let td_close = html[content_start..].find("</td");
                let th_close = html[content_start..].find("</th");
                let content_end = match (td_close, th_close) {
                    (Some(a), Some(b)) => content_start + a.min(b),
                    (Some(a), None) => content_start + a,
                    (None, Some(b)) => content_start + b,
                    (None, None) => html.len(),
                };
                let raw = &html[content_start..content_end];
                let text = strip_tags(raw);

                if let Some(cell) = build_cell(&text, data_t.as_deref(), data_v.as_deref()) {
                    ws.set_cell(CellRef::new(r, col), cell);
                }

                if rowspan > 1 || colspan > 1 {
                    ws.merges.push(Range::new(
                        CellRef::new(r, col),
                        CellRef::new(r + rowspan - 1, col + colspan - 1),
                    ));
                    for rr in r..r + rowspan {
                        for cc in col..col + colspan {
                            if rr != r || cc != col {
                                occupied.insert((rr, cc));
                            }
                        }
                    }
                }

                col += colspan;
                i = content_end;
            }
            _ => {
                i = end + 1;
            }
        }
    }

    ws
}

fn attr_value(tag_body: &str, name: &str) -> Option<String> {
    let lower = tag_body.to_ascii_lowercase();
    let pos = lower.find(&format!("{name}=\""))?;
    let value_start = pos + name.len() + 2;
    let value_end = tag_body[value_start..].find('"')? + value_start;
    Some(unescape_text(&tag_body[value_start..value_end]))
}

fn strip_tags(raw: &str) -> String {
    let mut out = String::new();
    let mut in_tag = false;
    let mut i = 0;
    let chars: Vec<char> = raw.chars().collect();
    while i < chars.len() {
        let c = chars[i];
        if c == '<' {
            let rest: String = chars[i..chars.len().min(i + 4)].iter().collect();
            if rest.to_ascii_lowercase().starts_with("<br") {
                out.push('\n');
            }
            in_tag = true;
        } else if c == '>' {
            in_tag = false;
        } else if !in_tag {
            out.push(c);
        }
        i += 1;
    }
    unescape_text(out.trim())
}

fn build_cell(text: &str, data_t: Option<&str>, data_v: Option<&str>) -> Option<Cell> {
    let value_text = data_v.map(|v| v.to_string()).unwrap_or_else(|| text.to_string());
    match data_t {
        Some("n") => value_text.parse::<f64>().ok().map(Cell::number),
        Some("b") => Some(Cell::bool(value_text == "1" || value_text == "TRUE")),
        Some("s") => Some(Cell::text(value_text)),
        Some("d") => crate::datetime::parse_iso_datetime(&value_text).map(Cell::date),
        Some("e") => crate::cell::CellError::from_glyph(&value_text).map(Cell::error),
        Some("z") => None,
        _ => {
            if text.is_empty() {
                return None;
            }
            if let Ok(v) = text.parse::<f64>() {
                return Some(Cell::number(v));
            }
            Some(Cell::text(text.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addr::decode_range;
    use crate::cell::{CellError, Hyperlink};

    #[test]
    fn test_basic_table() {
        let mut ws = Worksheet::new(false);
        ws.set_cell(CellRef::new(0, 0), Cell::text("a"));
        ws.set_cell(CellRef::new(0, 1), Cell::number(1.5));
        let html = sheet_to_html(&ws, &HtmlOptions::default());
        assert!(html.starts_with("<html><head>"));
        assert!(html.contains("<table><tr>"));
        assert!(html.contains("<td data-t=\"s\" data-v=\"a\">a</td>"));
        assert!(html.contains("<td data-t=\"n\" data-v=\"1.5\">1.5</td>"));
        assert!(html.ends_with("</body></html>"));
    }

    #[test]
    fn test_custom_header_footer() {
        let mut ws = Worksheet::new(false);
        ws.set_cell(CellRef::new(0, 0), Cell::text("x"));
        let html = sheet_to_html(
            &ws,
            &HtmlOptions {
                header: "<div>".to_string(),
                footer: "</div>".to_string(),
            },
        );
        assert!(html.starts_with("<div><table>"));
        assert!(html.ends_with("</table></div>"));
    }

    #[test]
    fn test_merge_emits_spans_and_skips_interior() {
        let mut ws = Worksheet::new(false);
        ws.set_cell(CellRef::new(0, 0), Cell::text("merged"));
        ws.set_cell(CellRef::new(2, 0), Cell::text("below"));
        ws.merges.push(decode_range("A1:B2").unwrap());
        let html = sheet_to_html(&ws, &HtmlOptions::default());
        assert!(html.contains("rowspan=\"2\""));
        assert!(html.contains("colspan=\"2\""));
        // One td for the merge anchor in row 1, none for its interior.
        let row1 = html.split("<tr>").nth(1).unwrap();
        assert_eq!(row1.matches("<td").count(), 1);
    }

    #[test]
    fn test_non_finite_render_error_glyphs() {
        let mut ws = Worksheet::new(false);
        ws.set_cell(CellRef::new(0, 0), Cell::number(f64::NAN));
        ws.set_cell(CellRef::new(0, 1), Cell::number(f64::INFINITY));
        let html = sheet_to_html(&ws, &HtmlOptions::default());
        assert!(html.contains("#NUM!"));
        assert!(html.contains("#DIV/0!"));
    }

    #[test]
    fn test_hyperlink_wrapping() {
        let mut ws = Worksheet::new(false);
        let mut linked = Cell::text("site");
        linked.hyperlink = Some(Hyperlink {
            target: "https://example.com".to_string(),
            tooltip: None,
        });
        ws.set_cell(CellRef::new(0, 0), linked);
        let html = sheet_to_html(&ws, &HtmlOptions::default());
        assert!(html.contains("<a href=\"https://example.com\">site</a>"));
    }

    #[test]
    fn test_internal_and_script_links_not_wrapped() {
        let mut ws = Worksheet::new(false);
        let mut internal = Cell::text("in");
        internal.hyperlink = Some(Hyperlink {
            target: "#Sheet2!A1".to_string(),
            tooltip: None,
        });
        let mut script = Cell::text("bad");
        script.hyperlink = Some(Hyperlink {
            target: "javascript:alert(1)".to_string(),
            tooltip: None,
        });
        ws.set_cell(CellRef::new(0, 0), internal);
        ws.set_cell(CellRef::new(0, 1), script);
        let html = sheet_to_html(&ws, &HtmlOptions::default());
        assert!(!html.contains("<a href"));
    }

    #[test]
    fn test_data_f_attribute() {
        let mut ws = Worksheet::new(false);
        let mut cell = Cell::number(3.0);
        cell.formula = Some("A1+A2".to_string());
        ws.set_cell(CellRef::new(0, 0), cell);
        let html = sheet_to_html(&ws, &HtmlOptions::default());
        assert!(html.contains("data-f=\"A1+A2\""));
    }

    #[test]
    fn test_escaping_in_content() {
        let mut ws = Worksheet::new(false);
        ws.set_cell(CellRef::new(0, 0), Cell::text("a<b&c"));
        let html = sheet_to_html(&ws, &HtmlOptions::default());
        assert!(html.contains(">a&lt;b&amp;c</td>"));
    }

    // ----- parser -----------------------------------------------------------

    #[test]
    fn test_parse_basic_table() {
        let ws = html_to_sheet(
            "<table><tr><td>a</td><td>1.5</td></tr><tr><td>b</td><td>x</td></tr></table>",
            false,
        );
        assert_eq!(
            ws.cell(CellRef::new(0, 0)).unwrap().value,
            CellValue::Str("a".to_string())
        );
        assert_eq!(
            ws.cell(CellRef::new(0, 1)).unwrap().value,
            CellValue::Number(1.5)
        );
        assert_eq!(
            ws.cell(CellRef::new(1, 1)).unwrap().value,
            CellValue::Str("x".to_string())
        );
    }

    #[test]
    fn test_parse_th_cells() {
        let ws = html_to_sheet("<table><tr><th>H</th></tr><tr><td>1</td></tr></table>", false);
        assert_eq!(
            ws.cell(CellRef::new(0, 0)).unwrap().value,
            CellValue::Str("H".to_string())
        );
    }

    #[test]
    fn test_parse_spans_occupy_grid() {
        let html = "<table>\
            <tr><td rowspan=\"2\" colspan=\"2\">m</td><td>r1</td></tr>\
            <tr><td>r2</td></tr>\
            </table>";
        let ws = html_to_sheet(html, false);
        assert_eq!(
            ws.cell(CellRef::new(0, 0)).unwrap().value,
            CellValue::Str("m".to_string())
        );
        // The cell after the span in row 1 lands at C1.
        assert_eq!(
            ws.cell(CellRef::new(0, 2)).unwrap().value,
            CellValue::Str("r1".to_string())
        );
        // Row 2's first cell skips the span's shadow and lands at C2.
        assert_eq!(
            ws.cell(CellRef::new(1, 2)).unwrap().value,
            CellValue::Str("r2".to_string())
        );
        assert_eq!(ws.merges.len(), 1);
        assert_eq!(ws.merges[0], decode_range("A1:B2").unwrap());
    }

    #[test]
    fn test_parse_data_overrides() {
        let html = "<table><tr>\
            <td data-t=\"b\" data-v=\"1\">TRUE</td>\
            <td data-t=\"n\" data-v=\"42\">forty-two</td>\
            <td data-t=\"e\" data-v=\"#REF!\">#REF!</td>\
            </tr></table>";
        let ws = html_to_sheet(html, false);
        assert_eq!(
            ws.cell(CellRef::new(0, 0)).unwrap().value,
            CellValue::Bool(true)
        );
        assert_eq!(
            ws.cell(CellRef::new(0, 1)).unwrap().value,
            CellValue::Number(42.0)
        );
        assert_eq!(
            ws.cell(CellRef::new(0, 2)).unwrap().value,
            CellValue::Error(CellError::Ref)
        );
    }

    #[test]
    fn test_parse_strips_inner_markup() {
        let ws = html_to_sheet(
            "<table><tr><td><b>bold</b> text<br/>next</td></tr></table>",
            false,
        );
        assert_eq!(
            ws.cell(CellRef::new(0, 0)).unwrap().value,
            CellValue::Str("bold text\nnext".to_string())
        );
    }

    #[test]
    fn test_html_roundtrip_with_merges() {
        let mut ws = Worksheet::new(false);
        ws.set_cell(CellRef::new(0, 0), Cell::text("m"));
        ws.set_cell(CellRef::new(0, 2), Cell::number(5.0));
        ws.merges.push(decode_range("A1:B1").unwrap());
        let html = sheet_to_html(&ws, &HtmlOptions::default());
        let back = html_to_sheet(&html, false);
        assert_eq!(
            back.cell(CellRef::new(0, 0)).unwrap().value,
            CellValue::Str("m".to_string())
        );
        assert_eq!(
            back.cell(CellRef::new(0, 2)).unwrap().value,
            CellValue::Number(5.0)
        );
        assert_eq!(back.merges, ws.merges);
    }
}
