//! Cell representation.
//!
//! A [`Cell`] is a tagged value plus the optional attachments the codec
//! preserves: formula text, array-formula coverage, rich-text payload,
//! comments, number format, hyperlink, and an opaque style index.

use chrono::NaiveDateTime;
use sheetwright_xml::shared_strings::RichRunXml;

use crate::addr::Range;

/// The typed value of a cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// No value (empty cell or stub).
    #[default]
    Empty,
    /// Numeric value (integers are stored as f64 in Excel).
    Number(f64),
    /// Boolean value.
    Bool(bool),
    /// String value.
    Str(String),
    /// Error value.
    Error(CellError),
    /// Date value (used when dates are materialized instead of serials).
    Date(NaiveDateTime),
}

/// An Excel error value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellError {
    Null,
    Div0,
    Value,
    Ref,
    Name,
    Num,
    NA,
    GettingData,
}

impl CellError {
    /// The numeric error code stored in the file format.
    pub fn code(self) -> u8 {
        match self {
            CellError::Null => 0x00,
            CellError::Div0 => 0x07,
            CellError::Value => 0x0F,
            CellError::Ref => 0x17,
            CellError::Name => 0x1D,
            CellError::Num => 0x24,
            CellError::NA => 0x2A,
            CellError::GettingData => 0x2B,
        }
    }

    /// The display glyph, e.g. `#DIV/0!`.
    pub fn glyph(self) -> &'static str {
        match self {
            CellError::Null => "#NULL!",
            CellError::Div0 => "#DIV/0!",
            CellError::Value => "#VALUE!",
            CellError::Ref => "#REF!",
            CellError::Name => "#NAME?",
            CellError::Num => "#NUM!",
            CellError::NA => "#N/A",
            CellError::GettingData => "#GETTING_DATA",
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x00 => Some(CellError::Null),
            0x07 => Some(CellError::Div0),
            0x0F => Some(CellError::Value),
            0x17 => Some(CellError::Ref),
            0x1D => Some(CellError::Name),
            0x24 => Some(CellError::Num),
            0x2A => Some(CellError::NA),
            0x2B => Some(CellError::GettingData),
            _ => None,
        }
    }

    pub fn from_glyph(text: &str) -> Option<Self> {
        match text {
            "#NULL!" => Some(CellError::Null),
            "#DIV/0!" => Some(CellError::Div0),
            "#VALUE!" => Some(CellError::Value),
            "#REF!" => Some(CellError::Ref),
            "#NAME?" => Some(CellError::Name),
            "#NUM!" => Some(CellError::Num),
            "#N/A" => Some(CellError::NA),
            "#GETTING_DATA" => Some(CellError::GettingData),
            _ => None,
        }
    }
}

/// A number format: either an index into the workbook format table or a
/// literal format code.
#[derive(Debug, Clone, PartialEq)]
pub enum NumberFormat {
    Index(u32),
    Code(String),
}

/// A hyperlink attached to a cell. Targets starting with `#` are
/// intra-workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct Hyperlink {
    pub target: String,
    pub tooltip: Option<String>,
}

impl Hyperlink {
    pub fn is_internal(&self) -> bool {
        self.target.starts_with('#')
    }
}

/// A comment attached to a cell, in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct CellComment {
    pub author: String,
    pub text: String,
    pub threaded: bool,
}

/// A single worksheet cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cell {
    pub value: CellValue,
    /// Pre-formatted display text, when computed or preserved.
    pub formatted: Option<String>,
    /// A1-notation formula text, never with a leading `=`. Only the anchor
    /// of an array formula carries this.
    pub formula: Option<String>,
    /// Covering range when this cell belongs to an array formula.
    pub array_range: Option<Range>,
    /// Marks a modern dynamic-array formula.
    pub dynamic_array: bool,
    /// Raw rich-text payload, preserved but not interpreted.
    pub rich_runs: Option<Vec<RichRunXml>>,
    /// HTML projection of the rich-text payload, when requested.
    pub html: Option<String>,
    pub comments: Vec<CellComment>,
    pub number_format: Option<NumberFormat>,
    pub hyperlink: Option<Hyperlink>,
    /// Opaque style index, preserved on roundtrip.
    pub style_index: Option<u32>,
}

impl Cell {
    pub fn number(v: f64) -> Self {
        Self {
            value: CellValue::Number(v),
            ..Self::default()
        }
    }

    pub fn text<S: Into<String>>(s: S) -> Self {
        Self {
            value: CellValue::Str(s.into()),
            ..Self::default()
        }
    }

    pub fn bool(b: bool) -> Self {
        Self {
            value: CellValue::Bool(b),
            ..Self::default()
        }
    }

    pub fn error(e: CellError) -> Self {
        Self {
            value: CellValue::Error(e),
            ..Self::default()
        }
    }

    pub fn date(dt: NaiveDateTime) -> Self {
        Self {
            value: CellValue::Date(dt),
            ..Self::default()
        }
    }

    /// A stub: an empty cell kept in the store (e.g. to carry a hyperlink
    /// or when `sheet_stubs` is requested).
    pub fn stub() -> Self {
        Self::default()
    }

    /// Whether the cell carries no value. Stubs are empty; formula cells
    /// are not.
    pub fn is_empty(&self) -> bool {
        matches!(self.value, CellValue::Empty) && self.formula.is_none()
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Number(v)
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        CellValue::Number(v as f64)
    }
}

impl From<bool> for CellValue {
    fn from(v: bool) -> Self {
        CellValue::Bool(v)
    }
}

impl From<&str> for CellValue {
    fn from(v: &str) -> Self {
        CellValue::Str(v.to_string())
    }
}

impl From<String> for CellValue {
    fn from(v: String) -> Self {
        CellValue::Str(v)
    }
}
