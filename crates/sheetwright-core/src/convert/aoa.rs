//! Array-of-arrays <-> worksheet projection.

use chrono::NaiveDateTime;

use crate::addr::{decode_cell, CellRef};
use crate::cell::{Cell, CellError, CellValue, NumberFormat};
use crate::error::Result;
use crate::sheet::Worksheet;

/// An input value for the array-of-arrays builder.
#[derive(Debug, Clone, PartialEq)]
pub enum AoaEntry {
    /// A missing value; handling is controlled by [`NullMode`].
    Null,
    Number(f64),
    Bool(bool),
    Text(String),
    Date(NaiveDateTime),
    /// A `[value, formula]` pair: a formula-bearing cell with its cached
    /// value.
    Formula { value: Box<AoaEntry>, expr: String },
}

impl From<f64> for AoaEntry {
    fn from(v: f64) -> Self {
        AoaEntry::Number(v)
    }
}

impl From<i32> for AoaEntry {
    fn from(v: i32) -> Self {
        AoaEntry::Number(f64::from(v))
    }
}

impl From<bool> for AoaEntry {
    fn from(v: bool) -> Self {
        AoaEntry::Bool(v)
    }
}

impl From<&str> for AoaEntry {
    fn from(v: &str) -> Self {
        AoaEntry::Text(v.to_string())
    }
}

/// Treatment of `Null` entries.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum NullMode {
    /// Skip the cell entirely.
    #[default]
    Skip,
    /// Keep an empty stub cell.
    Stub,
    /// Store a `#NULL!` error cell.
    Error,
}

/// Placement target for an add operation.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Origin {
    /// Top-left corner A1.
    #[default]
    Start,
    /// An explicit anchor cell.
    Cell(CellRef),
    /// An A1 reference string.
    A1(String),
    /// Append after the last populated row.
    Append,
}

/// Options for the array-of-arrays builder.
#[derive(Debug, Clone, Default)]
pub struct AoaOptions {
    pub null_mode: NullMode,
    /// Store dates as date cells rather than serials with format 14.
    pub cell_dates: bool,
    /// Build a dense worksheet.
    pub dense: bool,
    pub origin: Origin,
}

/// Build a worksheet from rows of values.
pub fn aoa_to_sheet(rows: &[Vec<AoaEntry>], opts: &AoaOptions) -> Result<Worksheet> {
    let mut ws = Worksheet::new(opts.dense);
    sheet_add_aoa(&mut ws, rows, opts)?;
    Ok(ws)
}

/// Add rows of values to an existing worksheet at the given origin.
pub fn sheet_add_aoa(ws: &mut Worksheet, rows: &[Vec<AoaEntry>], opts: &AoaOptions) -> Result<()> {
    let anchor = match &opts.origin {
        Origin::Start => CellRef::new(0, 0),
        Origin::Cell(at) => *at,
        Origin::A1(text) => decode_cell(text)?,
        Origin::Append => match ws.dimension {
            Some(dim) => CellRef::new(dim.end.row + 1, dim.start.col),
            None => CellRef::new(0, 0),
        },
    };

    for (r, row) in rows.iter().enumerate() {
        for (c, entry) in row.iter().enumerate() {
            let at = CellRef::new(anchor.row + r as u32, anchor.col + c as u32);
            let Some(cell) = entry_to_cell(entry, opts) else {
                continue;
            };
            ws.set_cell(at, cell);
        }
    }
    Ok(())
}

fn entry_to_cell(entry: &AoaEntry, opts: &AoaOptions) -> Option<Cell> {
    match entry {
        AoaEntry::Null => match opts.null_mode {
            NullMode::Skip => None,
            NullMode::Stub => Some(Cell::stub()),
            NullMode::Error => Some(Cell::error(CellError::Null)),
        },
        AoaEntry::Number(v) => {
            // Non-finite numbers are not representable; coerce to errors.
            if v.is_nan() {
                Some(Cell::error(CellError::Value))
            } else if v.is_infinite() {
                Some(Cell::error(CellError::Div0))
            } else {
                Some(Cell::number(*v))
            }
        }
        AoaEntry::Bool(b) => Some(Cell::bool(*b)),
        AoaEntry::Text(s) => Some(Cell::text(s.clone())),
        AoaEntry::Date(dt) => {
            let mut cell = Cell::date(*dt);
            if !opts.cell_dates {
                cell.number_format = Some(NumberFormat::Index(14));
            }
            Some(cell)
        }
        AoaEntry::Formula { value, expr } => {
            let mut cell = entry_to_cell(value, opts).unwrap_or_default();
            cell.formula = Some(expr.clone());
            Some(cell)
        }
    }
}

/// Project a worksheet to rows of values, bounded by the ref. Empty cells
/// become `CellValue::Empty`.
pub fn sheet_to_aoa(ws: &Worksheet) -> Vec<Vec<CellValue>> {
    let Some(dim) = ws.dimension else {
        return Vec::new();
    };
    let mut out = Vec::with_capacity(dim.height() as usize);
    for r in dim.start.row..=dim.end.row {
        let mut row = Vec::with_capacity(dim.width() as usize);
        for c in dim.start.col..=dim.end.col {
            row.push(
                ws.cell(CellRef::new(r, c))
                    .map(|cell| cell.value.clone())
                    .unwrap_or_default(),
            );
        }
        out.push(row);
    }
    out
}
