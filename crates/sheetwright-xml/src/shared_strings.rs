//! Shared Strings XML schema structures.
//!
//! Represents `xl/sharedStrings.xml` in the OOXML package. Each `<si>` item
//! is either a plain `<t>` or a sequence of `<r>` rich runs; phonetic
//! `<rPh>` subtrees are parsed but excluded from the plain-text projection.

use serde::{Deserialize, Serialize};

use crate::namespaces;

/// Shared String Table root element (`xl/sharedStrings.xml`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "sst")]
pub struct Sst {
    #[serde(rename = "@xmlns")]
    pub xmlns: String,

    /// Total reference count of shared strings in the workbook.
    #[serde(rename = "@count", skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,

    /// Number of unique string entries.
    #[serde(rename = "@uniqueCount", skip_serializing_if = "Option::is_none")]
    pub unique_count: Option<u32>,

    /// Shared string items.
    #[serde(rename = "si", default)]
    pub items: Vec<Si>,
}

/// Shared String Item.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Si {
    /// Plain text content.
    #[serde(rename = "t", skip_serializing_if = "Option::is_none")]
    pub t: Option<Text>,

    /// Rich text runs (formatted text).
    #[serde(rename = "r", default)]
    pub r: Vec<RichRunXml>,

    /// Phonetic runs; preserved structurally, dropped from the plain-text
    /// projection.
    #[serde(rename = "rPh", default)]
    pub r_ph: Vec<PhoneticRun>,
}

/// Text element with optional space preservation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Text {
    #[serde(
        rename = "@xml:space",
        alias = "@space",
        skip_serializing_if = "Option::is_none"
    )]
    pub xml_space: Option<String>,

    #[serde(rename = "$value", default)]
    pub value: String,
}

impl Text {
    /// Wrap a string, adding `xml:space="preserve"` when whitespace is
    /// semantically significant.
    pub fn preserving(value: &str) -> Self {
        let needs_preserve = value.starts_with(' ')
            || value.ends_with(' ')
            || value.contains('\n')
            || value.contains('\t');
        Self {
            xml_space: needs_preserve.then(|| "preserve".to_string()),
            value: value.to_string(),
        }
    }
}

/// Rich text run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RichRunXml {
    /// Run properties (formatting).
    #[serde(rename = "rPr", skip_serializing_if = "Option::is_none")]
    pub r_pr: Option<RunProperties>,

    /// Text content.
    #[serde(rename = "t")]
    pub t: Text,
}

/// Phonetic run (furigana); content is not interpreted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PhoneticRun {
    #[serde(rename = "@sb", skip_serializing_if = "Option::is_none")]
    pub sb: Option<u32>,

    #[serde(rename = "@eb", skip_serializing_if = "Option::is_none")]
    pub eb: Option<u32>,

    #[serde(rename = "t", default)]
    pub t: Text,
}

/// Run properties: the formatting bag on a rich text run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RunProperties {
    #[serde(rename = "b", skip_serializing_if = "Option::is_none")]
    pub b: Option<BoolVal>,

    #[serde(rename = "i", skip_serializing_if = "Option::is_none")]
    pub i: Option<BoolVal>,

    #[serde(rename = "strike", skip_serializing_if = "Option::is_none")]
    pub strike: Option<BoolVal>,

    #[serde(rename = "u", skip_serializing_if = "Option::is_none")]
    pub u: Option<Underline>,

    #[serde(rename = "shadow", skip_serializing_if = "Option::is_none")]
    pub shadow: Option<BoolVal>,

    #[serde(rename = "vertAlign", skip_serializing_if = "Option::is_none")]
    pub vert_align: Option<VertAlign>,

    #[serde(rename = "sz", skip_serializing_if = "Option::is_none")]
    pub sz: Option<FontSize>,

    #[serde(rename = "color", skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,

    #[serde(rename = "rFont", skip_serializing_if = "Option::is_none")]
    pub r_font: Option<FontName>,

    #[serde(rename = "family", skip_serializing_if = "Option::is_none")]
    pub family: Option<FontFamily>,
}

/// Boolean value wrapper: `<b/>` means true, `<b val="0"/>` false.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BoolVal {
    #[serde(rename = "@val", skip_serializing_if = "Option::is_none")]
    pub val: Option<bool>,
}

impl BoolVal {
    /// Effective truth: an empty element counts as true.
    pub fn is_set(&self) -> bool {
        self.val.unwrap_or(true)
    }
}

/// Underline style: absent val means single.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Underline {
    #[serde(rename = "@val", skip_serializing_if = "Option::is_none")]
    pub val: Option<String>,
}

/// Vertical alignment: superscript / subscript / baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertAlign {
    #[serde(rename = "@val")]
    pub val: String,
}

/// Font size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSize {
    #[serde(rename = "@val")]
    pub val: f64,
}

/// Color.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Color {
    #[serde(rename = "@rgb", skip_serializing_if = "Option::is_none")]
    pub rgb: Option<String>,

    #[serde(rename = "@theme", skip_serializing_if = "Option::is_none")]
    pub theme: Option<u32>,

    #[serde(rename = "@tint", skip_serializing_if = "Option::is_none")]
    pub tint: Option<f64>,
}

/// Font name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontName {
    #[serde(rename = "@val")]
    pub val: String,
}

/// Font family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontFamily {
    #[serde(rename = "@val")]
    pub val: u32,
}

impl Si {
    /// Plain-text projection: direct `<t>` for plain items, run texts
    /// concatenated for rich items. Phonetic runs are excluded.
    pub fn plain_text(&self) -> String {
        if let Some(ref t) = self.t {
            t.value.clone()
        } else {
            self.r.iter().map(|r| r.t.value.as_str()).collect()
        }
    }
}

impl Default for Sst {
    fn default() -> Self {
        Self {
            xmlns: namespaces::SPREADSHEET_ML.to_string(),
            count: Some(0),
            unique_count: Some(0),
            items: vec![],
        }
    }
}
