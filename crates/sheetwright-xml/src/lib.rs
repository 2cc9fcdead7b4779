//! sheetwright-xml: serde schema types for the XML parts of an OOXML
//! SpreadsheetML package.
//!
//! Each module mirrors one package part. The types here are a faithful
//! structural mapping of the on-disk XML; all interpretation (shared-string
//! resolution, formula semantics, number formatting) lives in
//! `sheetwright-core`.

pub mod comments;
pub mod content_types;
pub mod doc_props;
pub mod namespaces;
pub mod relationships;
pub mod shared_strings;
pub mod styles;
pub mod threaded_comment;
pub mod workbook;
pub mod worksheet;
