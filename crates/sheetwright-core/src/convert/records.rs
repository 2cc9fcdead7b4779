//! Records <-> worksheet projection.
//!
//! A record is an ordered list of `(key, value)` pairs. On build, keys
//! encountered across all records form the header row in insertion order;
//! on extraction, the header mode controls key derivation.

use crate::addr::{encode_col, CellRef};
use crate::cell::{Cell, CellError, CellValue};
use crate::sheet::Worksheet;

/// An ordered record; insertion order of keys is significant.
pub type Record = Vec<(String, CellValue)>;

/// Key derivation for [`sheet_to_records`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum HeaderMode {
    /// Keys come from the first row's display text; duplicates get `_1`,
    /// `_2`, ... suffixes. The first row is consumed.
    #[default]
    FirstRow,
    /// Keys are the column letters; every row is a record.
    Letters,
    /// Caller-supplied keys; every row is a record.
    Custom(Vec<String>),
}

/// Options for [`sheet_to_records`].
#[derive(Debug, Clone, Default)]
pub struct RecordOptions {
    pub header: HeaderMode,
    /// Substitute for missing values; when `None` the key is omitted.
    pub defval: Option<CellValue>,
    /// Keep rows with no populated cells.
    pub blankrows: bool,
    /// Skip hidden rows.
    pub skip_hidden: bool,
}

/// Build a worksheet from records: a header row of keys in first-seen
/// order, then one row per record.
pub fn records_to_sheet(records: &[Record], dense: bool) -> Worksheet {
    let mut ws = Worksheet::new(dense);
    sheet_add_records(&mut ws, records, &super::aoa::Origin::Start);
    ws
}

/// Add records to a worksheet at the given origin. The header row lives at
/// the origin row (for `Append`, the existing header row is adopted); keys
/// not yet in the header row are appended to it.
pub fn sheet_add_records(
    ws: &mut Worksheet,
    records: &[Record],
    origin: &super::aoa::Origin,
) {
    use super::aoa::Origin;

    let (header_row, start_row) = match origin {
        Origin::Start => (0, None),
        Origin::Cell(at) => (at.row, None),
        Origin::A1(text) => {
            let row = crate::addr::decode_cell(text).map(|a| a.row).unwrap_or(0);
            (row, None)
        }
        Origin::Append => {
            let header = ws.dimension.map(|d| d.start.row).unwrap_or(0);
            let next = ws.dimension.map(|d| d.end.row + 1);
            (header, next)
        }
    };

    let mut headers: Vec<String> = Vec::new();

    // Adopt any existing header cells so appends stay aligned.
    if let Some(dim) = ws.dimension {
        for c in dim.start.col..=dim.end.col {
            if let Some(cell) = ws.cell(CellRef::new(header_row, c)) {
                if let CellValue::Str(s) = &cell.value {
                    headers.push(s.clone());
                }
            }
        }
    }

    for key in records.iter().flat_map(|r| r.iter().map(|(k, _)| k)) {
        if !headers.iter().any(|h| h == key) {
            headers.push(key.clone());
        }
    }
    for (c, key) in headers.iter().enumerate() {
        ws.set_cell(CellRef::new(header_row, c as u32), Cell::text(key.clone()));
    }

    let start_row = start_row.unwrap_or(header_row + 1);
    for (r, record) in records.iter().enumerate() {
        for (key, value) in record {
            let Some(col) = headers.iter().position(|h| h == key) else {
                continue;
            };
            let cell = Cell {
                value: value.clone(),
                ..Cell::default()
            };
            ws.set_cell(CellRef::new(start_row + r as u32, col as u32), cell);
        }
    }
}

/// Project a worksheet to plain rows of values (the `header: 1` shape).
pub fn sheet_to_rows(ws: &Worksheet) -> Vec<Vec<CellValue>> {
    super::aoa::sheet_to_aoa(ws)
}

/// Project a worksheet to records per the header mode. Error cells map as:
/// `#NULL!` becomes an explicit empty value, any other error drops the
/// key (unless `defval` supplies a substitute).
pub fn sheet_to_records(ws: &Worksheet, opts: &RecordOptions) -> Vec<Record> {
    let Some(dim) = ws.dimension else {
        return Vec::new();
    };

    let (keys, first_data_row) = match &opts.header {
        HeaderMode::FirstRow => {
            let mut seen: Vec<String> = Vec::new();
            let mut keys = Vec::new();
            for c in dim.start.col..=dim.end.col {
                let raw = ws
                    .cell(CellRef::new(dim.start.row, c))
                    .map(display_text)
                    .unwrap_or_default();
                let base = if raw.is_empty() {
                    format!("__EMPTY_{}", c - dim.start.col)
                } else {
                    raw
                };
                // Disambiguate duplicates with _1, _2, ...
                let mut key = base.clone();
                let mut suffix = 0;
                while seen.contains(&key) {
                    suffix += 1;
                    key = format!("{base}_{suffix}");
                }
                seen.push(key.clone());
                keys.push(key);
            }
            (keys, dim.start.row + 1)
        }
        HeaderMode::Letters => {
            let keys = (dim.start.col..=dim.end.col).map(encode_col).collect();
            (keys, dim.start.row)
        }
        HeaderMode::Custom(names) => (names.clone(), dim.start.row),
    };

    let mut out = Vec::new();
    for r in first_data_row..=dim.end.row {
        if opts.skip_hidden && ws.rows.get(&r).map(|p| p.hidden).unwrap_or(false) {
            continue;
        }
        let mut record: Record = Vec::new();
        let mut any = false;
        for (i, key) in keys.iter().enumerate() {
            let c = dim.start.col + i as u32;
            let cell = ws.cell(CellRef::new(r, c));
            let value = match cell.map(|c| &c.value) {
                Some(CellValue::Empty) | None => match &opts.defval {
                    Some(v) => v.clone(),
                    None => continue,
                },
                Some(CellValue::Error(CellError::Null)) => {
                    any = true;
                    CellValue::Empty
                }
                Some(CellValue::Error(_)) => match &opts.defval {
                    Some(v) => v.clone(),
                    None => continue,
                },
                Some(v) => {
                    any = true;
                    v.clone()
                }
            };
            record.push((key.clone(), value));
        }
        if any || opts.blankrows {
            out.push(record);
        }
    }
    out
}

fn display_text(cell: &Cell) -> String {
    if let Some(w) = &cell.formatted {
        return w.clone();
    }
    match &cell.value {
        CellValue::Str(s) => s.clone(),
        CellValue::Number(v) => crate::ssf::format_general(*v),
        CellValue::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        CellValue::Error(e) => e.glyph().to_string(),
        CellValue::Date(dt) => dt.format("%Y-%m-%d").to_string(),
        CellValue::Empty => String::new(),
    }
}
