//! Styles XML schema structures (`xl/styles.xml`).
//!
//! Styles are preserved structurally, not interpreted: the reader cares
//! about the number-format table (`numFmts`) and the `numFmtId` binding in
//! `cellXfs`; the writer emits a minimal but complete stylesheet skeleton.

use serde::{Deserialize, Serialize};

use crate::namespaces;

/// First number-format id available for custom formats. Indices below this
/// are the Excel built-in formats.
pub const FIRST_CUSTOM_NUMFMT_ID: u32 = 164;

/// StyleSheet root element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "styleSheet")]
pub struct StyleSheet {
    #[serde(rename = "@xmlns")]
    pub xmlns: String,

    #[serde(rename = "numFmts", skip_serializing_if = "Option::is_none")]
    pub num_fmts: Option<NumFmts>,

    #[serde(rename = "fonts", skip_serializing_if = "Option::is_none")]
    pub fonts: Option<Fonts>,

    #[serde(rename = "fills", skip_serializing_if = "Option::is_none")]
    pub fills: Option<Fills>,

    #[serde(rename = "borders", skip_serializing_if = "Option::is_none")]
    pub borders: Option<Borders>,

    #[serde(rename = "cellStyleXfs", skip_serializing_if = "Option::is_none")]
    pub cell_style_xfs: Option<CellXfs>,

    #[serde(rename = "cellXfs", skip_serializing_if = "Option::is_none")]
    pub cell_xfs: Option<CellXfs>,
}

/// Number formats container.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NumFmts {
    #[serde(rename = "@count", skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,

    #[serde(rename = "numFmt", default)]
    pub num_fmts: Vec<NumFmt>,
}

/// A single number format definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumFmt {
    #[serde(rename = "@numFmtId")]
    pub num_fmt_id: u32,

    #[serde(rename = "@formatCode")]
    pub format_code: String,
}

/// Fonts container. Contents are an uninterpreted skeleton.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Fonts {
    #[serde(rename = "@count", skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,

    #[serde(rename = "font", default)]
    pub fonts: Vec<Font>,
}

/// A single font definition.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Font {
    #[serde(rename = "sz", skip_serializing_if = "Option::is_none")]
    pub sz: Option<super::shared_strings::FontSize>,

    #[serde(rename = "name", skip_serializing_if = "Option::is_none")]
    pub name: Option<super::shared_strings::FontName>,

    #[serde(rename = "family", skip_serializing_if = "Option::is_none")]
    pub family: Option<super::shared_strings::FontFamily>,
}

/// Fills container.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Fills {
    #[serde(rename = "@count", skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,

    #[serde(rename = "fill", default)]
    pub fills: Vec<Fill>,
}

/// A single fill definition.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Fill {
    #[serde(rename = "patternFill", skip_serializing_if = "Option::is_none")]
    pub pattern_fill: Option<PatternFill>,
}

/// Pattern fill.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PatternFill {
    #[serde(rename = "@patternType", skip_serializing_if = "Option::is_none")]
    pub pattern_type: Option<String>,
}

/// Borders container.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Borders {
    #[serde(rename = "@count", skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,

    #[serde(rename = "border", default)]
    pub borders: Vec<Border>,
}

/// A single border definition (empty skeleton).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Border {}

/// Cell format records container (used for both cellStyleXfs and cellXfs).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CellXfs {
    #[serde(rename = "@count", skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,

    #[serde(rename = "xf", default)]
    pub xfs: Vec<Xf>,
}

/// A single cell format record. `num_fmt_id` is the binding the reader
/// resolves to a format code.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Xf {
    #[serde(rename = "@numFmtId", skip_serializing_if = "Option::is_none")]
    pub num_fmt_id: Option<u32>,

    #[serde(rename = "@fontId", skip_serializing_if = "Option::is_none")]
    pub font_id: Option<u32>,

    #[serde(rename = "@fillId", skip_serializing_if = "Option::is_none")]
    pub fill_id: Option<u32>,

    #[serde(rename = "@borderId", skip_serializing_if = "Option::is_none")]
    pub border_id: Option<u32>,

    #[serde(rename = "@xfId", skip_serializing_if = "Option::is_none")]
    pub xf_id: Option<u32>,

    #[serde(rename = "@applyNumberFormat", skip_serializing_if = "Option::is_none")]
    pub apply_number_format: Option<bool>,
}

impl StyleSheet {
    /// A complete minimal stylesheet: one font, the two mandatory fills,
    /// one border, one style xf, and a single default cell xf.
    pub fn minimal() -> Self {
        Self {
            xmlns: namespaces::SPREADSHEET_ML.to_string(),
            num_fmts: None,
            fonts: Some(Fonts {
                count: Some(1),
                fonts: vec![Font {
                    sz: Some(super::shared_strings::FontSize { val: 11.0 }),
                    name: Some(super::shared_strings::FontName {
                        val: "Calibri".to_string(),
                    }),
                    family: Some(super::shared_strings::FontFamily { val: 2 }),
                }],
            }),
            fills: Some(Fills {
                count: Some(2),
                fills: vec![
                    Fill {
                        pattern_fill: Some(PatternFill {
                            pattern_type: Some("none".to_string()),
                        }),
                    },
                    Fill {
                        pattern_fill: Some(PatternFill {
                            pattern_type: Some("gray125".to_string()),
                        }),
                    },
                ],
            }),
            borders: Some(Borders {
                count: Some(1),
                borders: vec![Border {}],
            }),
            cell_style_xfs: Some(CellXfs {
                count: Some(1),
                xfs: vec![Xf {
                    num_fmt_id: Some(0),
                    font_id: Some(0),
                    fill_id: Some(0),
                    border_id: Some(0),
                    ..Xf::default()
                }],
            }),
            cell_xfs: Some(CellXfs {
                count: Some(1),
                xfs: vec![Xf {
                    num_fmt_id: Some(0),
                    font_id: Some(0),
                    fill_id: Some(0),
                    border_id: Some(0),
                    xf_id: Some(0),
                    ..Xf::default()
                }],
            }),
        }
    }

    /// Resolve a cell's style index (`s` attribute) to its numFmtId.
    pub fn num_fmt_id_of(&self, style_index: u32) -> Option<u32> {
        self.cell_xfs
            .as_ref()?
            .xfs
            .get(style_index as usize)?
            .num_fmt_id
    }

    /// Resolve a custom numFmtId to its format code from the numFmts table.
    pub fn format_code_of(&self, num_fmt_id: u32) -> Option<&str> {
        self.num_fmts
            .as_ref()?
            .num_fmts
            .iter()
            .find(|f| f.num_fmt_id == num_fmt_id)
            .map(|f| f.format_code.as_str())
    }
}

impl Default for StyleSheet {
    fn default() -> Self {
        Self::minimal()
    }
}
