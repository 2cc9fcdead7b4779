//! OOXML namespace definitions.
//! Standard namespaces used across all XML documents.

// Core spreadsheet namespace
pub const SPREADSHEET_ML: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

/// Alternate main namespaces accepted on read. Older producers (and the
/// transitional/strict ECMA variants) stamp workbooks with one of these.
pub const SPREADSHEET_ML_ALTERNATES: [&str; 3] = [
    "http://schemas.microsoft.com/office/excel/2006/2",
    "http://purl.oclc.org/ooxml/spreadsheetml/main",
    "http://schemas.microsoft.com/office/excel/2006/1",
];

// Relationship namespaces
pub const RELATIONSHIPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub const PACKAGE_RELATIONSHIPS: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships";

// Content Types
pub const CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

// Dublin Core (document properties)
pub const DC: &str = "http://purl.org/dc/elements/1.1/";
pub const DC_TERMS: &str = "http://purl.org/dc/terms/";
pub const DC_MITYPE: &str = "http://purl.org/dc/dcmitype/";

// Document properties
pub const CORE_PROPERTIES: &str =
    "http://schemas.openxmlformats.org/package/2006/metadata/core-properties";
pub const EXTENDED_PROPERTIES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/extended-properties";
pub const CUSTOM_PROPERTIES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/custom-properties";

// VT Types (docProps)
pub const VT: &str = "http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes";

// Threaded comments (Excel 2019+)
pub const THREADED_COMMENTS: &str =
    "http://schemas.microsoft.com/office/spreadsheetml/2018/threadedcomments";

// XML standard
pub const XML: &str = "http://www.w3.org/XML/1998/namespace";
pub const XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Check whether a root namespace is an accepted SpreadsheetML main
/// namespace (the canonical URI or one of the read-accepted alternates).
pub fn is_spreadsheet_ml(ns: &str) -> bool {
    ns == SPREADSHEET_ML || SPREADSHEET_ML_ALTERNATES.contains(&ns)
}
