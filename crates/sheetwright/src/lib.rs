//! sheetwright: read and write spreadsheet workbooks.
//!
//! The byte-level entry points detect the container format from leading
//! bytes: `PK` means XLSX; PDF and PNG magic are rejected; anything else
//! is sniffed as an HTML table or delimited text.
//!
//! # Quick Start
//!
//! ```
//! use sheetwright::{read, write, ReadOptions, WriteOptions};
//! use sheetwright::convert::aoa::{aoa_to_sheet, AoaOptions};
//! use sheetwright::{Sheet, Visibility, Workbook};
//!
//! let mut wb = Workbook::new();
//! let ws = aoa_to_sheet(&[vec!["hello".into(), 42.into()]], &AoaOptions::default()).unwrap();
//! wb.sheets.push(Sheet {
//!     name: "Sheet1".to_string(),
//!     visibility: Visibility::Visible,
//!     code_name: None,
//!     data: ws,
//! });
//! let bytes = write(&wb, &WriteOptions::default()).unwrap();
//! let back = read(&bytes, &ReadOptions::default()).unwrap();
//! assert_eq!(back.sheet_names(), vec!["Sheet1"]);
//! ```

use std::path::Path;

/// The raw OOXML schema types, for callers that work below the model
/// layer (rich-run payloads, document properties, style records).
pub use sheetwright_xml as xml;

// Re-export the core model and options.
pub use sheetwright_core::addr::{
    decode_cell, decode_col, decode_range, decode_row, encode_cell, encode_col, encode_range,
    encode_row, CellRef, Range,
};
pub use sheetwright_core::book::{DefinedName, Sheet, Visibility, Workbook};
pub use sheetwright_core::cell::{
    Cell, CellComment, CellError, CellValue, Hyperlink, NumberFormat,
};
pub use sheetwright_core::convert;
pub use sheetwright_core::error::{Error, Result};
pub use sheetwright_core::options::{BookType, ReadOptions, SheetSelection, WriteOptions};
pub use sheetwright_core::sheet::{CellStore, ColProps, PageMargins, RowProps, Worksheet};
pub use sheetwright_core::ssf;
pub use sheetwright_core::{comment, datetime};

use sheetwright_core::convert::csv::{csv_to_sheet, sheet_to_csv, sheet_to_tsv, CsvOptions};
use sheetwright_core::convert::html::{html_to_sheet, sheet_to_html, HtmlOptions};

/// Read a workbook from bytes, detecting the format from the content.
pub fn read(data: &[u8], opts: &ReadOptions) -> Result<Workbook> {
    if data.starts_with(b"PK") {
        return sheetwright_core::read::read_workbook(data, opts);
    }
    if data.starts_with(b"%PDF") {
        return Err(Error::NotASpreadsheet { kind: "PDF" });
    }
    if data.starts_with(&[0x89, b'P', b'N', b'G']) {
        return Err(Error::NotASpreadsheet { kind: "PNG Image" });
    }
    let text = String::from_utf8_lossy(data);
    read_str(&text, opts)
}

/// Read a workbook from text (CSV, TSV, or an HTML table).
pub fn read_str(text: &str, opts: &ReadOptions) -> Result<Workbook> {
    let trimmed = text.trim_start();
    let ws = if trimmed.to_ascii_lowercase().contains("<table")
        || trimmed.starts_with("<html")
        || trimmed.starts_with("<!DOCTYPE")
    {
        html_to_sheet(text, opts.dense)
    } else {
        // Sniff the separator from the first record.
        let first_line = text.lines().next().unwrap_or("");
        let fs = if first_line.contains('\t') { '\t' } else { ',' };
        csv_to_sheet(text, fs, opts.dense)
    };

    let mut wb = Workbook::new();
    wb.sheets.push(Sheet {
        name: "Sheet1".to_string(),
        visibility: Visibility::Visible,
        code_name: None,
        data: ws,
    });
    Ok(wb)
}

/// Write a workbook to bytes. The book type selects the output format;
/// text formats project the first sheet.
pub fn write(wb: &Workbook, opts: &WriteOptions) -> Result<Vec<u8>> {
    match opts.book_type {
        BookType::Xlsx => sheetwright_core::write::write_workbook(wb, opts),
        _ => write_string(wb, opts).map(String::into_bytes),
    }
}

/// Write a workbook as text (CSV, TSV, or HTML). The first sheet is
/// projected; XLSX has no text form.
pub fn write_string(wb: &Workbook, opts: &WriteOptions) -> Result<String> {
    let sheet = wb
        .sheets
        .first()
        .ok_or(Error::EmptyWorkbook)?;
    match opts.book_type {
        BookType::Csv => Ok(sheet_to_csv(&sheet.data, &CsvOptions::default())),
        BookType::Tsv => Ok(sheet_to_tsv(&sheet.data)),
        BookType::Html => Ok(sheet_to_html(&sheet.data, &HtmlOptions::default())),
        BookType::Xlsx => Err(Error::Internal(
            "xlsx output is binary; use write".to_string(),
        )),
    }
}

/// Read a workbook from a file.
pub fn open<P: AsRef<Path>>(path: P, opts: &ReadOptions) -> Result<Workbook> {
    let data = std::fs::read(path)?;
    read(&data, opts)
}

/// Write a workbook to a file.
pub fn save<P: AsRef<Path>>(path: P, wb: &Workbook, opts: &WriteOptions) -> Result<()> {
    let bytes = write(wb, opts)?;
    std::fs::write(path, bytes)?;
    Ok(())
}
