//! [Content_Types].xml schema structures.
//!
//! Defines the content types for all parts in the OOXML package: per-extension
//! defaults plus per-part overrides. On write, overrides are grouped by
//! category in a fixed order so output is deterministic.

use serde::{Deserialize, Serialize};

use crate::namespaces;

/// `[Content_Types].xml` root element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "Types")]
pub struct ContentTypes {
    #[serde(rename = "@xmlns")]
    pub xmlns: String,

    #[serde(rename = "Default", default)]
    pub defaults: Vec<ContentTypeDefault>,

    #[serde(rename = "Override", default)]
    pub overrides: Vec<ContentTypeOverride>,
}

/// Extension-based default content type mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentTypeDefault {
    #[serde(rename = "@Extension")]
    pub extension: String,

    #[serde(rename = "@ContentType")]
    pub content_type: String,
}

/// Path-specific content type override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentTypeOverride {
    #[serde(rename = "@PartName")]
    pub part_name: String,

    #[serde(rename = "@ContentType")]
    pub content_type: String,
}

impl ContentTypes {
    /// Create a registry pre-loaded with the standard extension defaults.
    pub fn with_standard_defaults() -> Self {
        Self {
            xmlns: namespaces::CONTENT_TYPES.to_string(),
            defaults: vec![
                ContentTypeDefault {
                    extension: "xml".to_string(),
                    content_type: mime_types::XML.to_string(),
                },
                ContentTypeDefault {
                    extension: "rels".to_string(),
                    content_type: mime_types::RELS.to_string(),
                },
                ContentTypeDefault {
                    extension: "vml".to_string(),
                    content_type: mime_types::VML.to_string(),
                },
                ContentTypeDefault {
                    extension: "png".to_string(),
                    content_type: mime_types::PNG.to_string(),
                },
                ContentTypeDefault {
                    extension: "jpeg".to_string(),
                    content_type: mime_types::JPEG.to_string(),
                },
                ContentTypeDefault {
                    extension: "gif".to_string(),
                    content_type: mime_types::GIF.to_string(),
                },
                ContentTypeDefault {
                    extension: "pdf".to_string(),
                    content_type: mime_types::PDF.to_string(),
                },
            ],
            overrides: vec![],
        }
    }

    /// Look up the content type for a part path, consulting overrides first
    /// and falling back to the extension defaults. The part path may be given
    /// with or without a leading slash.
    pub fn type_of(&self, part: &str) -> Option<&str> {
        let canonical = if part.starts_with('/') {
            part.to_string()
        } else {
            format!("/{part}")
        };
        if let Some(ovr) = self.overrides.iter().find(|o| o.part_name == canonical) {
            return Some(&ovr.content_type);
        }
        let ext = part.rsplit('.').next()?;
        self.defaults
            .iter()
            .find(|d| d.extension.eq_ignore_ascii_case(ext))
            .map(|d| d.content_type.as_str())
    }

    /// Register a per-part override. The part path is canonicalised to start
    /// with a slash. Re-registering a part replaces its previous entry.
    pub fn register(&mut self, part: &str, content_type: &str) {
        let part_name = if part.starts_with('/') {
            part.to_string()
        } else {
            format!("/{part}")
        };
        self.overrides.retain(|o| o.part_name != part_name);
        self.overrides.push(ContentTypeOverride {
            part_name,
            content_type: content_type.to_string(),
        });
    }

    /// All part paths registered with the given content type.
    pub fn parts_of_type<'a>(&'a self, content_type: &'a str) -> impl Iterator<Item = &'a str> {
        self.overrides
            .iter()
            .filter(move |o| o.content_type == content_type)
            .map(|o| o.part_name.as_str())
    }

    /// Sort overrides into the fixed category order used on write: workbook,
    /// sheets, themes, strings, styles, then document properties, with
    /// anything unrecognized trailing in original order.
    pub fn sort_for_write(&mut self) {
        fn rank(ct: &str) -> usize {
            match ct {
                mime_types::WORKBOOK | mime_types::WORKBOOK_MACRO => 0,
                mime_types::WORKSHEET => 1,
                mime_types::THEME => 2,
                mime_types::SHARED_STRINGS => 3,
                mime_types::STYLES => 4,
                mime_types::COMMENTS => 5,
                mime_types::THREADED_COMMENTS => 6,
                mime_types::PERSONS => 7,
                mime_types::CORE_PROPERTIES => 8,
                mime_types::EXTENDED_PROPERTIES => 9,
                mime_types::CUSTOM_PROPERTIES => 10,
                _ => 11,
            }
        }
        self.overrides
            .sort_by(|a, b| rank(&a.content_type).cmp(&rank(&b.content_type)));
    }
}

impl Default for ContentTypes {
    fn default() -> Self {
        Self::with_standard_defaults()
    }
}

/// Standard content type MIME string constants.
pub mod mime_types {
    // Default extensions
    pub const RELS: &str = "application/vnd.openxmlformats-package.relationships+xml";
    pub const XML: &str = "application/xml";
    pub const VML: &str = "application/vnd.openxmlformats-officedocument.vmlDrawing";
    pub const PNG: &str = "image/png";
    pub const JPEG: &str = "image/jpeg";
    pub const GIF: &str = "image/gif";
    pub const PDF: &str = "application/pdf";

    // Workbook
    pub const WORKBOOK: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
    pub const WORKBOOK_MACRO: &str = "application/vnd.ms-excel.sheet.macroEnabled.main+xml";

    // Worksheet
    pub const WORKSHEET: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";
    pub const CHARTSHEET: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.chartsheet+xml";

    // Shared elements
    pub const SHARED_STRINGS: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml";
    pub const STYLES: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml";
    pub const THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";

    // Comments
    pub const COMMENTS: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.comments+xml";
    pub const THREADED_COMMENTS: &str =
        "application/vnd.ms-excel.threadedcomments+xml";
    pub const PERSONS: &str = "application/vnd.ms-excel.person+xml";

    // Document properties
    pub const CORE_PROPERTIES: &str = "application/vnd.openxmlformats-package.core-properties+xml";
    pub const EXTENDED_PROPERTIES: &str =
        "application/vnd.openxmlformats-officedocument.extended-properties+xml";
    pub const CUSTOM_PROPERTIES: &str =
        "application/vnd.openxmlformats-officedocument.custom-properties+xml";

    // Recognized but never interpreted
    pub const VBA_PROJECT: &str = "application/vnd.ms-office.vbaProject";
    pub const CHART: &str = "application/vnd.openxmlformats-officedocument.drawingml.chart+xml";
    pub const DRAWING: &str = "application/vnd.openxmlformats-officedocument.drawing+xml";
    pub const PIVOT_TABLE: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.pivotTable+xml";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_defaults_cover_core_extensions() {
        let ct = ContentTypes::with_standard_defaults();
        let exts: Vec<&str> = ct.defaults.iter().map(|d| d.extension.as_str()).collect();
        assert!(exts.contains(&"xml"));
        assert!(exts.contains(&"rels"));
        assert!(exts.contains(&"vml"));
        assert!(exts.contains(&"png"));
        assert!(exts.contains(&"pdf"));
    }

    #[test]
    fn test_register_and_lookup() {
        let mut ct = ContentTypes::with_standard_defaults();
        ct.register("xl/workbook.xml", mime_types::WORKBOOK);
        assert_eq!(ct.type_of("xl/workbook.xml"), Some(mime_types::WORKBOOK));
        assert_eq!(ct.type_of("/xl/workbook.xml"), Some(mime_types::WORKBOOK));
    }

    #[test]
    fn test_lookup_falls_back_to_extension_default() {
        let ct = ContentTypes::with_standard_defaults();
        assert_eq!(ct.type_of("xl/theme/theme1.xml"), Some(mime_types::XML));
        assert_eq!(ct.type_of("_rels/.rels"), Some(mime_types::RELS));
    }

    #[test]
    fn test_register_replaces_previous_entry() {
        let mut ct = ContentTypes::with_standard_defaults();
        ct.register("xl/workbook.xml", mime_types::WORKBOOK);
        ct.register("xl/workbook.xml", mime_types::WORKBOOK_MACRO);
        assert_eq!(
            ct.overrides
                .iter()
                .filter(|o| o.part_name == "/xl/workbook.xml")
                .count(),
            1
        );
        assert_eq!(
            ct.type_of("xl/workbook.xml"),
            Some(mime_types::WORKBOOK_MACRO)
        );
    }

    #[test]
    fn test_sort_for_write_orders_categories() {
        let mut ct = ContentTypes::with_standard_defaults();
        ct.register("docProps/core.xml", mime_types::CORE_PROPERTIES);
        ct.register("xl/styles.xml", mime_types::STYLES);
        ct.register("xl/worksheets/sheet1.xml", mime_types::WORKSHEET);
        ct.register("xl/workbook.xml", mime_types::WORKBOOK);
        ct.sort_for_write();
        let order: Vec<&str> = ct.overrides.iter().map(|o| o.part_name.as_str()).collect();
        assert_eq!(
            order,
            vec![
                "/xl/workbook.xml",
                "/xl/worksheets/sheet1.xml",
                "/xl/styles.xml",
                "/docProps/core.xml",
            ]
        );
    }

    #[test]
    fn test_content_types_roundtrip() {
        let mut ct = ContentTypes::with_standard_defaults();
        ct.register("xl/workbook.xml", mime_types::WORKBOOK);
        let xml = quick_xml::se::to_string(&ct).unwrap();
        let parsed: ContentTypes = quick_xml::de::from_str(&xml).unwrap();
        assert_eq!(ct.defaults.len(), parsed.defaults.len());
        assert_eq!(ct.overrides.len(), parsed.overrides.len());
        assert_eq!(ct.xmlns, parsed.xmlns);
    }

    #[test]
    fn test_parse_real_content_types() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
  <Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
</Types>"#;

        let parsed: ContentTypes = quick_xml::de::from_str(xml).unwrap();
        assert_eq!(parsed.defaults.len(), 2);
        assert_eq!(parsed.overrides.len(), 2);
        assert_eq!(parsed.type_of("xl/workbook.xml"), Some(mime_types::WORKBOOK));
    }

    #[test]
    fn test_parts_of_type() {
        let mut ct = ContentTypes::with_standard_defaults();
        ct.register("xl/worksheets/sheet1.xml", mime_types::WORKSHEET);
        ct.register("xl/worksheets/sheet2.xml", mime_types::WORKSHEET);
        ct.register("xl/workbook.xml", mime_types::WORKBOOK);
        let sheets: Vec<&str> = ct.parts_of_type(mime_types::WORKSHEET).collect();
        assert_eq!(
            sheets,
            vec!["/xl/worksheets/sheet1.xml", "/xl/worksheets/sheet2.xml"]
        );
    }
}
