//! Document properties XML schema structures.
//!
//! Covers:
//! - Core properties (`docProps/core.xml`) - Dublin Core metadata
//! - Extended properties (`docProps/app.xml`) - application metadata
//! - Custom properties (`docProps/custom.xml`) - user-defined key/value pairs
//!
//! Because these parts rely on namespace prefixes (`dc:`, `dcterms:`, `cp:`,
//! `vt:`) that quick-xml's serde layer does not handle, serialization and
//! deserialization are done manually with the event API.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Reader;
use quick_xml::Writer;

use crate::namespaces;

// ---------------------------------------------------------------------------
// Core Properties (docProps/core.xml)
// ---------------------------------------------------------------------------

/// Core document properties, mapping the Dublin-Core-style element set to a
/// flat struct. Date fields hold W3C-DTF strings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoreProperties {
    pub title: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub keywords: Option<String>,
    pub description: Option<String>,
    pub last_modified_by: Option<String>,
    pub revision: Option<String>,
    pub created: Option<String>,
    pub modified: Option<String>,
    pub category: Option<String>,
    pub content_status: Option<String>,
}

/// Drop sub-second precision from a W3C-DTF timestamp: `2024-01-01T10:30:00.123Z`
/// becomes `2024-01-01T10:30:00Z`.
fn truncate_subseconds(value: &str) -> String {
    match (value.find('.'), value.rfind(|c| c == 'Z' || c == '+')) {
        (Some(dot), Some(tz)) if tz > dot => format!("{}{}", &value[..dot], &value[tz..]),
        (Some(dot), None) => value[..dot].to_string(),
        _ => value.to_string(),
    }
}

/// Serialize `CoreProperties` to its XML string representation.
pub fn serialize_core_properties(props: &CoreProperties) -> String {
    let mut writer = Writer::new(Vec::new());

    writer
        .write_event(Event::Decl(BytesDecl::new(
            "1.0",
            Some("UTF-8"),
            Some("yes"),
        )))
        .unwrap();

    let mut root = BytesStart::new("cp:coreProperties");
    root.push_attribute(("xmlns:cp", namespaces::CORE_PROPERTIES));
    root.push_attribute(("xmlns:dc", namespaces::DC));
    root.push_attribute(("xmlns:dcterms", namespaces::DC_TERMS));
    root.push_attribute(("xmlns:dcmitype", namespaces::DC_MITYPE));
    root.push_attribute(("xmlns:xsi", namespaces::XSI));
    writer.write_event(Event::Start(root)).unwrap();

    fn write_element(writer: &mut Writer<Vec<u8>>, tag: &str, value: &str) {
        writer
            .write_event(Event::Start(BytesStart::new(tag)))
            .unwrap();
        writer
            .write_event(Event::Text(BytesText::new(value)))
            .unwrap();
        writer.write_event(Event::End(BytesEnd::new(tag))).unwrap();
    }

    fn write_dcterms_element(writer: &mut Writer<Vec<u8>>, tag: &str, value: &str) {
        let mut start = BytesStart::new(tag);
        start.push_attribute(("xsi:type", "dcterms:W3CDTF"));
        writer.write_event(Event::Start(start)).unwrap();
        writer
            .write_event(Event::Text(BytesText::new(value)))
            .unwrap();
        writer.write_event(Event::End(BytesEnd::new(tag))).unwrap();
    }

    if let Some(ref v) = props.title {
        write_element(&mut writer, "dc:title", v);
    }
    if let Some(ref v) = props.subject {
        write_element(&mut writer, "dc:subject", v);
    }
    if let Some(ref v) = props.creator {
        write_element(&mut writer, "dc:creator", v);
    }
    if let Some(ref v) = props.keywords {
        write_element(&mut writer, "cp:keywords", v);
    }
    if let Some(ref v) = props.description {
        write_element(&mut writer, "dc:description", v);
    }
    if let Some(ref v) = props.last_modified_by {
        write_element(&mut writer, "cp:lastModifiedBy", v);
    }
    if let Some(ref v) = props.revision {
        write_element(&mut writer, "cp:revision", v);
    }
    if let Some(ref v) = props.created {
        write_dcterms_element(&mut writer, "dcterms:created", &truncate_subseconds(v));
    }
    if let Some(ref v) = props.modified {
        write_dcterms_element(&mut writer, "dcterms:modified", &truncate_subseconds(v));
    }
    if let Some(ref v) = props.category {
        write_element(&mut writer, "cp:category", v);
    }
    if let Some(ref v) = props.content_status {
        write_element(&mut writer, "cp:contentStatus", v);
    }

    writer
        .write_event(Event::End(BytesEnd::new("cp:coreProperties")))
        .unwrap();

    String::from_utf8(writer.into_inner()).unwrap()
}

/// Deserialize `CoreProperties` from an XML string. Element names are
/// matched both with and without their namespace prefix.
pub fn deserialize_core_properties(xml: &str) -> Result<CoreProperties, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut props = CoreProperties::default();
    let mut current_tag: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                current_tag = Some(name);
            }
            Ok(Event::Text(ref e)) => {
                if let Some(ref tag) = current_tag {
                    let text = e.unescape().unwrap_or_default().to_string();
                    match tag.as_str() {
                        "dc:title" | "title" => props.title = Some(text),
                        "dc:subject" | "subject" => props.subject = Some(text),
                        "dc:creator" | "creator" => props.creator = Some(text),
                        "cp:keywords" | "keywords" => props.keywords = Some(text),
                        "dc:description" | "description" => props.description = Some(text),
                        "cp:lastModifiedBy" | "lastModifiedBy" => {
                            props.last_modified_by = Some(text);
                        }
                        "cp:revision" | "revision" => props.revision = Some(text),
                        "dcterms:created" | "created" => props.created = Some(text),
                        "dcterms:modified" | "modified" => props.modified = Some(text),
                        "cp:category" | "category" => props.category = Some(text),
                        "cp:contentStatus" | "contentStatus" => {
                            props.content_status = Some(text);
                        }
                        _ => {}
                    }
                }
            }
            Ok(Event::End(_)) => {
                current_tag = None;
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("XML parse error: {e}")),
            _ => {}
        }
    }

    Ok(props)
}

// ---------------------------------------------------------------------------
// Extended Properties (docProps/app.xml)
// ---------------------------------------------------------------------------

/// Extended (application) properties. On write, the engine always declares
/// itself as the application and computes `HeadingPairs` / `TitlesOfParts`
/// from the sheet list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtendedProperties {
    pub application: Option<String>,
    pub doc_security: Option<u32>,
    pub company: Option<String>,
    pub app_version: Option<String>,
    /// The sheet names, emitted as `TitlesOfParts`.
    pub sheet_names: Vec<String>,
}

/// Serialize `ExtendedProperties` to its XML string representation,
/// including the `HeadingPairs` ("Worksheets", n) / `TitlesOfParts` triple.
pub fn serialize_extended_properties(props: &ExtendedProperties) -> String {
    let mut writer = Writer::new(Vec::new());

    writer
        .write_event(Event::Decl(BytesDecl::new(
            "1.0",
            Some("UTF-8"),
            Some("yes"),
        )))
        .unwrap();

    let mut root = BytesStart::new("Properties");
    root.push_attribute(("xmlns", namespaces::EXTENDED_PROPERTIES));
    root.push_attribute(("xmlns:vt", namespaces::VT));
    writer.write_event(Event::Start(root)).unwrap();

    fn write_element(writer: &mut Writer<Vec<u8>>, tag: &str, value: &str) {
        writer
            .write_event(Event::Start(BytesStart::new(tag)))
            .unwrap();
        writer
            .write_event(Event::Text(BytesText::new(value)))
            .unwrap();
        writer.write_event(Event::End(BytesEnd::new(tag))).unwrap();
    }

    if let Some(ref v) = props.application {
        write_element(&mut writer, "Application", v);
    }
    if let Some(v) = props.doc_security {
        write_element(&mut writer, "DocSecurity", &v.to_string());
    }

    let n = props.sheet_names.len();

    // HeadingPairs: a 2-element vt:variant vector ("Worksheets", count).
    writer
        .write_event(Event::Start(BytesStart::new("HeadingPairs")))
        .unwrap();
    let mut vector = BytesStart::new("vt:vector");
    vector.push_attribute(("size", "2"));
    vector.push_attribute(("baseType", "variant"));
    writer.write_event(Event::Start(vector)).unwrap();
    writer
        .write_event(Event::Start(BytesStart::new("vt:variant")))
        .unwrap();
    write_element(&mut writer, "vt:lpstr", "Worksheets");
    writer
        .write_event(Event::End(BytesEnd::new("vt:variant")))
        .unwrap();
    writer
        .write_event(Event::Start(BytesStart::new("vt:variant")))
        .unwrap();
    write_element(&mut writer, "vt:i4", &n.to_string());
    writer
        .write_event(Event::End(BytesEnd::new("vt:variant")))
        .unwrap();
    writer
        .write_event(Event::End(BytesEnd::new("vt:vector")))
        .unwrap();
    writer
        .write_event(Event::End(BytesEnd::new("HeadingPairs")))
        .unwrap();

    // TitlesOfParts: one vt:lpstr per sheet name.
    writer
        .write_event(Event::Start(BytesStart::new("TitlesOfParts")))
        .unwrap();
    let mut vector = BytesStart::new("vt:vector");
    let size = n.to_string();
    vector.push_attribute(("size", size.as_str()));
    vector.push_attribute(("baseType", "lpstr"));
    writer.write_event(Event::Start(vector)).unwrap();
    for name in &props.sheet_names {
        write_element(&mut writer, "vt:lpstr", name);
    }
    writer
        .write_event(Event::End(BytesEnd::new("vt:vector")))
        .unwrap();
    writer
        .write_event(Event::End(BytesEnd::new("TitlesOfParts")))
        .unwrap();

    if let Some(ref v) = props.company {
        write_element(&mut writer, "Company", v);
    }
    if let Some(ref v) = props.app_version {
        write_element(&mut writer, "AppVersion", v);
    }

    writer
        .write_event(Event::End(BytesEnd::new("Properties")))
        .unwrap();

    String::from_utf8(writer.into_inner()).unwrap()
}

/// Deserialize `ExtendedProperties` from an XML string. `TitlesOfParts`
/// entries are collected as sheet names; `HeadingPairs` is recomputed on
/// write and therefore not retained.
pub fn deserialize_extended_properties(xml: &str) -> Result<ExtendedProperties, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut props = ExtendedProperties::default();
    let mut current_tag: Option<String> = None;
    let mut in_titles = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if name == "TitlesOfParts" {
                    in_titles = true;
                }
                current_tag = Some(name);
            }
            Ok(Event::Text(ref e)) => {
                if let Some(ref tag) = current_tag {
                    let text = e.unescape().unwrap_or_default().to_string();
                    match tag.as_str() {
                        "Application" => props.application = Some(text),
                        "DocSecurity" => props.doc_security = text.parse().ok(),
                        "Company" => props.company = Some(text),
                        "AppVersion" => props.app_version = Some(text),
                        "vt:lpstr" | "lpstr" if in_titles => props.sheet_names.push(text),
                        _ => {}
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if name == "TitlesOfParts" {
                    in_titles = false;
                }
                current_tag = None;
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("XML parse error: {e}")),
            _ => {}
        }
    }

    Ok(props)
}

// ---------------------------------------------------------------------------
// Custom Properties (docProps/custom.xml)
// ---------------------------------------------------------------------------

/// Custom properties collection (`docProps/custom.xml`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomProperties {
    pub properties: Vec<CustomProperty>,
}

/// A single custom property entry.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomProperty {
    pub fmtid: String,
    pub pid: u32,
    pub name: String,
    pub value: CustomPropertyValue,
}

/// The typed value of a custom property.
#[derive(Debug, Clone, PartialEq)]
pub enum CustomPropertyValue {
    String(String),
    Int(i32),
    Float(f64),
    Bool(bool),
    DateTime(String),
}

/// Standard fmtid used for custom properties.
pub const CUSTOM_PROPERTY_FMTID: &str = "{D5CDD505-2E9C-101B-9397-08002B2CF9AE}";

/// Serialize `CustomProperties` to its XML string representation.
pub fn serialize_custom_properties(props: &CustomProperties) -> String {
    let mut writer = Writer::new(Vec::new());

    writer
        .write_event(Event::Decl(BytesDecl::new(
            "1.0",
            Some("UTF-8"),
            Some("yes"),
        )))
        .unwrap();

    let mut root = BytesStart::new("Properties");
    root.push_attribute(("xmlns", namespaces::CUSTOM_PROPERTIES));
    root.push_attribute(("xmlns:vt", namespaces::VT));
    writer.write_event(Event::Start(root)).unwrap();

    fn write_value(writer: &mut Writer<Vec<u8>>, tag: &str, value: &str) {
        writer
            .write_event(Event::Start(BytesStart::new(tag)))
            .unwrap();
        writer
            .write_event(Event::Text(BytesText::new(value)))
            .unwrap();
        writer.write_event(Event::End(BytesEnd::new(tag))).unwrap();
    }

    for prop in &props.properties {
        let mut elem = BytesStart::new("property");
        elem.push_attribute(("fmtid", prop.fmtid.as_str()));
        elem.push_attribute(("pid", prop.pid.to_string().as_str()));
        elem.push_attribute(("name", prop.name.as_str()));
        writer.write_event(Event::Start(elem)).unwrap();

        match &prop.value {
            CustomPropertyValue::String(s) => write_value(&mut writer, "vt:lpwstr", s),
            CustomPropertyValue::Int(n) => write_value(&mut writer, "vt:i4", &n.to_string()),
            CustomPropertyValue::Float(f) => write_value(&mut writer, "vt:r8", &f.to_string()),
            CustomPropertyValue::Bool(b) => {
                write_value(&mut writer, "vt:bool", if *b { "true" } else { "false" })
            }
            CustomPropertyValue::DateTime(dt) => write_value(&mut writer, "vt:filetime", dt),
        }

        writer
            .write_event(Event::End(BytesEnd::new("property")))
            .unwrap();
    }

    writer
        .write_event(Event::End(BytesEnd::new("Properties")))
        .unwrap();

    String::from_utf8(writer.into_inner()).unwrap()
}

/// Deserialize `CustomProperties` from an XML string.
pub fn deserialize_custom_properties(xml: &str) -> Result<CustomProperties, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut props = CustomProperties::default();

    let mut current_fmtid: Option<String> = None;
    let mut current_pid: Option<u32> = None;
    let mut current_name: Option<String> = None;
    let mut current_value_tag: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if tag == "property" {
                    for attr in e.attributes().flatten() {
                        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
                        let val = String::from_utf8_lossy(&attr.value).to_string();
                        match key.as_str() {
                            "fmtid" => current_fmtid = Some(val),
                            "pid" => current_pid = val.parse().ok(),
                            "name" => current_name = Some(val),
                            _ => {}
                        }
                    }
                } else if tag.starts_with("vt:")
                    || matches!(tag.as_str(), "lpwstr" | "i4" | "r8" | "bool" | "filetime")
                {
                    current_value_tag = Some(tag);
                }
            }
            Ok(Event::Text(ref e)) => {
                if let Some(ref vtag) = current_value_tag {
                    let text = e.unescape().unwrap_or_default().to_string();
                    let value = match vtag.as_str() {
                        "vt:lpwstr" | "lpwstr" => Some(CustomPropertyValue::String(text)),
                        "vt:i4" | "i4" => text.parse::<i32>().ok().map(CustomPropertyValue::Int),
                        "vt:r8" | "r8" => text.parse::<f64>().ok().map(CustomPropertyValue::Float),
                        "vt:bool" | "bool" => {
                            Some(CustomPropertyValue::Bool(text == "true" || text == "1"))
                        }
                        "vt:filetime" | "filetime" => Some(CustomPropertyValue::DateTime(text)),
                        _ => None,
                    };
                    if let (Some(fmtid), Some(pid), Some(name), Some(val)) = (
                        current_fmtid.take(),
                        current_pid.take(),
                        current_name.take(),
                        value,
                    ) {
                        props.properties.push(CustomProperty {
                            fmtid,
                            pid,
                            name,
                            value: val,
                        });
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if tag.starts_with("vt:")
                    || matches!(tag.as_str(), "lpwstr" | "i4" | "r8" | "bool" | "filetime")
                {
                    current_value_tag = None;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("XML parse error: {e}")),
            _ => {}
        }
    }

    Ok(props)
}
