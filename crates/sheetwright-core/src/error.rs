//! Error types for the sheetwright core library.
//!
//! Provides a single [`Error`] enum covering every failure mode encountered
//! when reading, writing, and converting workbooks.

use thiserror::Error;

/// The top-level error type for sheetwright.
#[derive(Error, Debug)]
pub enum Error {
    // ===== Container errors =====
    /// The archive has no `[Content_Types].xml` part.
    #[error("Unsupported ZIP file")]
    UnsupportedZip,

    /// No workbook part is discoverable in the package.
    #[error("Could not find workbook")]
    WorkbookNotFound,

    /// A root element carries a namespace the codec does not accept.
    #[error("Unknown Namespace: {0}")]
    UnknownNamespace(String),

    // ===== Format-recognition errors =====
    /// The input is a recognized non-spreadsheet format.
    #[error("{kind} File is not a spreadsheet")]
    NotASpreadsheet { kind: &'static str },

    // ===== Cell reference errors =====
    /// The given string is not a valid A1-style cell or range reference.
    #[error("invalid cell reference: {0}")]
    InvalidCellReference(String),

    // ===== Invariant errors =====
    /// The sheet name violates Excel naming rules.
    #[error("Sheet name cannot {0}")]
    InvalidSheetName(String),

    /// A sheet with the given name already exists.
    #[error("Duplicate Sheet Name: {0}")]
    DuplicateSheetName(String),

    /// Writing a workbook with no sheets.
    #[error("Workbook is empty")]
    EmptyWorkbook,

    /// Attempting to assign an already-used relationship id.
    #[error("Cannot rewrite rId {0}")]
    RelationshipIdCollision(u32),

    // ===== Format engine errors =====
    /// A number format string the engine cannot evaluate.
    #[error("unsupported format |{0}|")]
    UnsupportedNumberFormat(String),

    // ===== I/O and parse errors =====
    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error originating from the ZIP layer.
    #[error("ZIP error: {0}")]
    Zip(String),

    /// An error encountered while parsing XML.
    #[error("XML parse error: {0}")]
    XmlParse(String),

    /// An error encountered while deserializing XML into typed structures.
    #[error("XML deserialization error: {0}")]
    XmlDeserialize(String),

    /// An internal or otherwise unclassified error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// A convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
