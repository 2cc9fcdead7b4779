//! Write orchestration: model -> per-part XML in dependency order ->
//! relationship graph + Content-Types registration -> ZIP bag -> bytes.

use std::collections::HashMap;

use serde::Serialize;
use sheetwright_xml::comments::{Authors, CommentList, CommentText, CommentsXml, CommentXml};
use sheetwright_xml::content_types::{mime_types, ContentTypes};
use sheetwright_xml::doc_props::{
    serialize_core_properties, serialize_custom_properties, serialize_extended_properties,
    CoreProperties,
};
use sheetwright_xml::relationships::{package_rels, rel_types, Relationships};
use sheetwright_xml::shared_strings::Text;
use sheetwright_xml::styles::{
    CellXfs, NumFmt, NumFmts, StyleSheet, Xf, FIRST_CUSTOM_NUMFMT_ID,
};
use sheetwright_xml::threaded_comment::{Person, PersonList, ThreadedCommentsXml, ThreadedCommentXml};
use sheetwright_xml::workbook::{
    BookViews, DefinedNames, DefinedNameXml, SheetEntry, Sheets, WorkbookPr, WorkbookView,
    WorkbookXml,
};
use sheetwright_xml::worksheet as wsx;
use sheetwright_xml::worksheet::{cell_types, CellXml};

use crate::addr::{encode_cell, encode_range, CellRef};
use crate::book::{validate_sheet_name, Workbook};
use crate::cell::{Cell, CellError, CellValue, NumberFormat};
use crate::comment::{
    build_vml, has_threaded, legacy_comment_cells, person_guid, thread_guid,
    DEFAULT_THREAD_AUTHOR, THREAD_EPOCH,
};
use crate::datetime::to_serial;
use crate::error::{Error, Result};
use crate::options::WriteOptions;
use crate::package::{add_relationship, ArchiveWriter};
use crate::sheet::Worksheet;
use crate::sst::SharedStringTable;

/// XML declaration prepended to every XML part in the package.
const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Static default theme part.
const THEME_XML: &str = concat!(
    r#"<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Office Theme">"#,
    r#"<a:themeElements><a:clrScheme name="Office">"#,
    r#"<a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1>"#,
    r#"<a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1>"#,
    r#"<a:dk2><a:srgbClr val="44546A"/></a:dk2><a:lt2><a:srgbClr val="E7E6E6"/></a:lt2>"#,
    r#"<a:accent1><a:srgbClr val="4472C4"/></a:accent1><a:accent2><a:srgbClr val="ED7D31"/></a:accent2>"#,
    r#"<a:accent3><a:srgbClr val="A5A5A5"/></a:accent3><a:accent4><a:srgbClr val="FFC000"/></a:accent4>"#,
    r#"<a:accent5><a:srgbClr val="5B9BD5"/></a:accent5><a:accent6><a:srgbClr val="70AD47"/></a:accent6>"#,
    r#"<a:hlink><a:srgbClr val="0563C1"/></a:hlink><a:folHlink><a:srgbClr val="954F72"/></a:folHlink>"#,
    r#"</a:clrScheme><a:fontScheme name="Office">"#,
    r#"<a:majorFont><a:latin typeface="Calibri Light"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont>"#,
    r#"<a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont>"#,
    r#"</a:fontScheme><a:fmtScheme name="Office">"#,
    r#"<a:fillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
    r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:fillStyleLst>"#,
    r#"<a:lnStyleLst><a:ln w="6350"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#,
    r#"<a:ln w="12700"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#,
    r#"<a:ln w="19050"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln></a:lnStyleLst>"#,
    r#"<a:effectStyleLst><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle>"#,
    r#"<a:effectStyle><a:effectLst/></a:effectStyle></a:effectStyleLst>"#,
    r#"<a:bgFillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
    r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:bgFillStyleLst>"#,
    r#"</a:fmtScheme></a:themeElements></a:theme>"#
);

/// Serialize a schema value with the standard declaration.
fn xml_part<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let body =
        quick_xml::se::to_string(value).map_err(|e| Error::XmlDeserialize(e.to_string()))?;
    Ok(format!("{XML_DECLARATION}\r\n{body}").into_bytes())
}

/// Accumulates the number formats observed during sheet emission and maps
/// them to cellXfs entries; xf 0 is the default format.
#[derive(Debug, Default)]
struct StyleRegistry {
    /// numFmtId per xf index; index 0 is the default.
    xfs: Vec<u32>,
    xf_of_numfmt: HashMap<u32, u32>,
    /// Custom format codes in registration order (ids from 164).
    custom_codes: Vec<String>,
}

impl StyleRegistry {
    fn new() -> Self {
        let mut reg = Self::default();
        reg.xfs.push(0);
        reg.xf_of_numfmt.insert(0, 0);
        reg
    }

    fn numfmt_id_for_code(&mut self, code: &str) -> u32 {
        if let Some(pos) = self.custom_codes.iter().position(|c| c == code) {
            return FIRST_CUSTOM_NUMFMT_ID + pos as u32;
        }
        self.custom_codes.push(code.to_string());
        FIRST_CUSTOM_NUMFMT_ID + (self.custom_codes.len() - 1) as u32
    }

    fn xf_for_numfmt(&mut self, num_fmt_id: u32) -> u32 {
        if let Some(&xf) = self.xf_of_numfmt.get(&num_fmt_id) {
            return xf;
        }
        let xf = self.xfs.len() as u32;
        self.xfs.push(num_fmt_id);
        self.xf_of_numfmt.insert(num_fmt_id, xf);
        xf
    }

    fn xf_for(&mut self, format: &NumberFormat) -> u32 {
        let id = match format {
            NumberFormat::Index(i) => *i,
            NumberFormat::Code(code) => self.numfmt_id_for_code(&code.clone()),
        };
        self.xf_for_numfmt(id)
    }

    fn to_stylesheet(&self) -> StyleSheet {
        let mut ss = StyleSheet::minimal();
        if !self.custom_codes.is_empty() {
            ss.num_fmts = Some(NumFmts {
                count: Some(self.custom_codes.len() as u32),
                num_fmts: self
                    .custom_codes
                    .iter()
                    .enumerate()
                    .map(|(i, code)| NumFmt {
                        num_fmt_id: FIRST_CUSTOM_NUMFMT_ID + i as u32,
                        format_code: code.clone(),
                    })
                    .collect(),
            });
        }
        ss.cell_xfs = Some(CellXfs {
            count: Some(self.xfs.len() as u32),
            xfs: self
                .xfs
                .iter()
                .map(|&num_fmt_id| Xf {
                    num_fmt_id: Some(num_fmt_id),
                    font_id: Some(0),
                    fill_id: Some(0),
                    border_id: Some(0),
                    xf_id: Some(0),
                    apply_number_format: (num_fmt_id != 0).then_some(true),
                })
                .collect(),
        });
        ss
    }
}

/// Write a workbook to XLSX container bytes.
pub fn write_workbook(wb: &Workbook, opts: &WriteOptions) -> Result<Vec<u8>> {
    if wb.sheets.is_empty() {
        return Err(Error::EmptyWorkbook);
    }
    for (i, sheet) in wb.sheets.iter().enumerate() {
        validate_sheet_name(&sheet.name)?;
        if wb.sheets[..i].iter().any(|s| s.name == sheet.name) {
            return Err(Error::DuplicateSheetName(sheet.name.clone()));
        }
    }

    let mut registry = StyleRegistry::new();
    let mut sst = SharedStringTable::new();
    let mut content_types = ContentTypes::with_standard_defaults();
    let mut workbook_rels = Relationships::new();
    let mut persons: Vec<Person> = Vec::new();
    let mut thread_counter: u32 = 0;

    // Per-sheet parts emitted in sheet order; the workbook-level parts
    // follow once every sheet has registered its needs.
    let mut sheet_parts: Vec<(String, Vec<u8>)> = Vec::new();

    for (i, sheet) in wb.sheets.iter().enumerate() {
        let n = i + 1;
        let sheet_path = format!("xl/worksheets/sheet{n}.xml");
        let mut sheet_rels = Relationships::new();

        let ws_xml = build_sheet_xml(
            &sheet.data,
            i == 0,
            wb,
            opts,
            &mut registry,
            &mut sst,
            &mut sheet_rels,
        )?;

        // Comment parts: the legacy part (plus its VML anchor) is written
        // whenever any comment exists; the threaded part joins it when a
        // thread is present.
        let mut ws_xml = ws_xml;
        let commented: Vec<CellRef> = sheet
            .data
            .iter_cells()
            .filter(|(_, c)| !c.comments.is_empty())
            .map(|(at, _)| at)
            .collect();
        if !commented.is_empty() {
            let comments_path = format!("xl/comments{n}.xml");
            let vml_path = format!("xl/drawings/vmlDrawing{n}.vml");

            sheet_parts.push((
                comments_path.clone(),
                xml_part(&build_comments_xml(&sheet.data, &commented))?,
            ));
            let anchors = if legacy_comment_cells(&sheet.data).is_empty() {
                commented.clone()
            } else {
                legacy_comment_cells(&sheet.data)
            };
            sheet_parts.push((vml_path.clone(), build_vml(&anchors).into_bytes()));

            add_relationship(
                &mut sheet_rels,
                None,
                rel_types::COMMENTS,
                &format!("../comments{n}.xml"),
                false,
            )?;
            let vml_rid = add_relationship(
                &mut sheet_rels,
                None,
                rel_types::VML_DRAWING,
                &format!("../drawings/vmlDrawing{n}.vml"),
                false,
            )?;
            ws_xml.legacy_drawing = Some(wsx::LegacyDrawing { r_id: vml_rid });
            content_types.register(&comments_path, mime_types::COMMENTS);

            if has_threaded(&sheet.data) {
                let tc_path = format!("xl/threadedComments/threadedComment{n}.xml");
                let tc = build_threaded_xml(
                    &sheet.data,
                    &mut persons,
                    &mut thread_counter,
                );
                sheet_parts.push((tc_path.clone(), xml_part(&tc)?));
                add_relationship(
                    &mut sheet_rels,
                    None,
                    rel_types::THREADED_COMMENTS,
                    &format!("../threadedComments/threadedComment{n}.xml"),
                    false,
                )?;
                content_types.register(&tc_path, mime_types::THREADED_COMMENTS);
            }
        }

        sheet_parts.push((sheet_path.clone(), xml_part(&ws_xml)?));
        if !sheet_rels.relationships.is_empty() {
            sheet_parts.push((
                format!("xl/worksheets/_rels/sheet{n}.xml.rels"),
                xml_part(&sheet_rels)?,
            ));
        }
        content_types.register(&sheet_path, mime_types::WORKSHEET);

        add_relationship(
            &mut workbook_rels,
            Some(n as u32),
            rel_types::WORKSHEET,
            &format!("worksheets/sheet{n}.xml"),
            false,
        )?;
    }

    // Workbook-level parts, in dependency order.
    add_relationship(&mut workbook_rels, None, rel_types::STYLES, "styles.xml", false)?;
    add_relationship(&mut workbook_rels, None, rel_types::THEME, "theme/theme1.xml", false)?;
    let write_sst = opts.book_sst && !sst.is_empty();
    if write_sst {
        add_relationship(
            &mut workbook_rels,
            None,
            rel_types::SHARED_STRINGS,
            "sharedStrings.xml",
            false,
        )?;
    }
    if !persons.is_empty() {
        add_relationship(
            &mut workbook_rels,
            None,
            rel_types::PERSONS,
            "persons/person.xml",
            false,
        )?;
    }

    content_types.register("xl/workbook.xml", mime_types::WORKBOOK);
    content_types.register("xl/styles.xml", mime_types::STYLES);
    content_types.register("xl/theme/theme1.xml", mime_types::THEME);
    if write_sst {
        content_types.register("xl/sharedStrings.xml", mime_types::SHARED_STRINGS);
    }
    if !persons.is_empty() {
        content_types.register("xl/persons/person.xml", mime_types::PERSONS);
    }
    content_types.register("docProps/core.xml", mime_types::CORE_PROPERTIES);
    content_types.register("docProps/app.xml", mime_types::EXTENDED_PROPERTIES);
    if wb.custom_props.is_some() {
        content_types.register("docProps/custom.xml", mime_types::CUSTOM_PROPERTIES);
    }
    content_types.sort_for_write();

    let mut package_relationships = package_rels();
    if wb.custom_props.is_some() {
        add_relationship(
            &mut package_relationships,
            None,
            rel_types::CUSTOM_PROPERTIES,
            "docProps/custom.xml",
            false,
        )?;
    }

    // Assemble the archive in the canonical member order.
    let mut archive = ArchiveWriter::new();
    archive.add("[Content_Types].xml", xml_part(&content_types)?);
    archive.add("_rels/.rels", xml_part(&package_relationships)?);

    let core = wb.core_props.clone().unwrap_or_else(CoreProperties::default);
    archive.add(
        "docProps/core.xml",
        serialize_core_properties(&core).into_bytes(),
    );
    let mut app = wb.app_props.clone().unwrap_or_default();
    app.application = Some("sheetwright".to_string());
    app.sheet_names = wb.sheets.iter().map(|s| s.name.clone()).collect();
    archive.add(
        "docProps/app.xml",
        serialize_extended_properties(&app).into_bytes(),
    );
    if let Some(custom) = &wb.custom_props {
        archive.add(
            "docProps/custom.xml",
            serialize_custom_properties(custom).into_bytes(),
        );
    }

    archive.add("xl/workbook.xml", xml_part(&build_workbook_xml(wb))?);
    archive.add("xl/_rels/workbook.xml.rels", xml_part(&workbook_rels)?);
    for (path, bytes) in sheet_parts {
        archive.add(&path, bytes);
    }
    archive.add(
        "xl/theme/theme1.xml",
        format!("{XML_DECLARATION}\r\n{THEME_XML}").into_bytes(),
    );
    archive.add("xl/styles.xml", xml_part(&registry.to_stylesheet())?);
    if write_sst {
        archive.add("xl/sharedStrings.xml", xml_part(&sst.to_sst())?);
    }
    if !persons.is_empty() {
        let list = PersonList {
            persons: persons.clone(),
            ..PersonList::default()
        };
        archive.add("xl/persons/person.xml", xml_part(&list)?);
    }

    archive.finish(opts.compression)
}

fn build_workbook_xml(wb: &Workbook) -> WorkbookXml {
    let first_visible = wb.first_visible_index().unwrap_or(0);
    let first_is_hidden = wb
        .sheets
        .first()
        .is_some_and(|s| s.visibility != crate::book::Visibility::Visible);

    let defined: Vec<DefinedNameXml> = wb
        .defined_names
        .iter()
        .filter(|dn| !dn.reference.is_empty())
        .map(|dn| DefinedNameXml {
            name: dn.name.clone(),
            local_sheet_id: dn.sheet_scope,
            hidden: dn.hidden.then_some(true),
            comment: dn.comment.clone(),
            value: dn.reference.clone(),
        })
        .collect();

    WorkbookXml {
        workbook_pr: Some(WorkbookPr {
            date1904: wb.date1904.then_some(true),
            code_name: wb.code_name.clone(),
            filter_privacy: None,
        }),
        book_views: first_is_hidden.then(|| BookViews {
            workbook_views: vec![WorkbookView {
                first_sheet: Some(first_visible as u32),
                active_tab: Some(first_visible as u32),
                ..WorkbookView::default()
            }],
        }),
        sheets: Sheets {
            sheets: wb
                .sheets
                .iter()
                .enumerate()
                .map(|(i, s)| SheetEntry {
                    name: s.name.clone(),
                    sheet_id: (i + 1) as u32,
                    state: s.visibility.state_attr().map(|s| s.to_string()),
                    r_id: format!("rId{}", i + 1),
                })
                .collect(),
        },
        defined_names: (!defined.is_empty()).then_some(DefinedNames {
            defined_names: defined,
        }),
        ..WorkbookXml::default()
    }
}

fn build_sheet_xml(
    ws: &Worksheet,
    first_sheet: bool,
    wb: &Workbook,
    opts: &WriteOptions,
    registry: &mut StyleRegistry,
    sst: &mut SharedStringTable,
    sheet_rels: &mut Relationships,
) -> Result<wsx::WorksheetXml> {
    let mut out = wsx::WorksheetXml {
        dimension: ws.dimension.map(|d| wsx::Dimension {
            reference: encode_range(d),
        }),
        sheet_views: Some(wsx::SheetViews {
            sheet_views: vec![wsx::SheetView {
                tab_selected: first_sheet.then_some(true),
                workbook_view_id: 0,
            }],
        }),
        sheet_format_pr: Some(wsx::SheetFormatPr {
            default_row_height: 15.0,
            default_col_width: None,
        }),
        ..wsx::WorksheetXml::default()
    };

    // Columns.
    if !ws.cols.is_empty() {
        out.cols = Some(wsx::Cols {
            cols: ws
                .cols
                .iter()
                .map(|(&idx, props)| wsx::Col {
                    min: idx + 1,
                    max: idx + 1,
                    width: props.width,
                    hidden: props.hidden.then_some(true),
                    custom_width: props.width.map(|_| true),
                    outline_level: props.outline_level,
                })
                .collect(),
        });
    }

    // Rows: cells grouped by row index, with row properties merged in.
    let mut rows: std::collections::BTreeMap<u32, wsx::Row> = std::collections::BTreeMap::new();
    for (&idx, props) in &ws.rows {
        rows.insert(
            idx,
            wsx::Row {
                r: idx + 1,
                ht: props.height_pt,
                hidden: props.hidden.then_some(true),
                custom_height: props.height_pt.map(|_| true),
                outline_level: props.outline_level,
                cells: vec![],
            },
        );
    }
    for (at, cell) in ws.iter_cells() {
        let Some(cell_xml) = cell_to_xml(at, cell, wb, opts, registry, sst) else {
            continue;
        };
        rows.entry(at.row)
            .or_insert_with(|| wsx::Row {
                r: at.row + 1,
                ht: None,
                hidden: None,
                custom_height: None,
                outline_level: None,
                cells: vec![],
            })
            .cells
            .push(cell_xml);
    }
    out.sheet_data = wsx::SheetData {
        rows: rows.into_values().filter(|r| !r.cells.is_empty() || r.ht.is_some() || r.hidden.is_some() || r.outline_level.is_some()).collect(),
    };

    // Merges.
    if !ws.merges.is_empty() {
        out.merge_cells = Some(wsx::MergeCells {
            count: Some(ws.merges.len() as u32),
            merge_cells: ws
                .merges
                .iter()
                .map(|m| wsx::MergeCell {
                    reference: encode_range(*m),
                })
                .collect(),
        });
    }

    if let Some(af) = ws.auto_filter {
        out.auto_filter = Some(wsx::AutoFilter {
            reference: encode_range(af),
        });
    }

    // Hyperlinks, with per-link relationships for external targets.
    let mut links: Vec<wsx::HyperlinkXml> = Vec::new();
    for (at, cell) in ws.iter_cells() {
        let Some(link) = &cell.hyperlink else {
            continue;
        };
        let mut xml = wsx::HyperlinkXml {
            reference: encode_cell(at),
            tooltip: link.tooltip.clone(),
            ..wsx::HyperlinkXml::default()
        };
        if let Some(location) = link.target.strip_prefix('#') {
            xml.location = Some(location.to_string());
        } else {
            let (target, location) = match link.target.split_once('#') {
                Some((t, l)) => (t.to_string(), Some(l.to_string())),
                None => (link.target.clone(), None),
            };
            let rid = add_relationship(sheet_rels, None, rel_types::HYPERLINK, &target, true)?;
            xml.r_id = Some(rid);
            xml.location = location;
        }
        links.push(xml);
    }
    if !links.is_empty() {
        out.hyperlinks = Some(wsx::Hyperlinks { hyperlinks: links });
    }

    if let Some(m) = ws.page_margins {
        out.page_margins = Some(wsx::PageMargins {
            left: m.left,
            right: m.right,
            top: m.top,
            bottom: m.bottom,
            header: m.header,
            footer: m.footer,
        });
    }
    out.sheet_protection = ws.protection.clone();

    Ok(out)
}

fn cell_to_xml(
    at: CellRef,
    cell: &Cell,
    wb: &Workbook,
    opts: &WriteOptions,
    registry: &mut StyleRegistry,
    sst: &mut SharedStringTable,
) -> Option<CellXml> {
    let mut out = CellXml {
        r: encode_cell(at),
        ..CellXml::default()
    };

    match &cell.value {
        CellValue::Number(v) => {
            // Non-finite values are not representable as numbers; they
            // coerce to error cells.
            if v.is_nan() {
                out.t = Some(cell_types::ERROR.to_string());
                out.v = Some(CellError::Value.glyph().to_string());
            } else if v.is_infinite() {
                out.t = Some(cell_types::ERROR.to_string());
                out.v = Some(CellError::Div0.glyph().to_string());
            } else {
                out.v = Some(format!("{v}"));
            }
        }
        CellValue::Bool(b) => {
            out.t = Some(cell_types::BOOLEAN.to_string());
            out.v = Some(if *b { "1" } else { "0" }.to_string());
        }
        CellValue::Str(s) => {
            if opts.book_sst && cell.rich_runs.is_none() {
                out.t = Some(cell_types::SHARED_STRING.to_string());
                out.v = Some(sst.add(s).to_string());
            } else {
                out.t = Some(cell_types::INLINE_STRING.to_string());
                out.is = Some(match &cell.rich_runs {
                    Some(runs) => wsx::InlineString {
                        t: None,
                        r: runs.clone(),
                    },
                    None => wsx::InlineString {
                        t: Some({
                            let t = Text::preserving(s);
                            wsx::InlineText {
                                xml_space: t.xml_space,
                                value: t.value,
                            }
                        }),
                        r: vec![],
                    },
                });
            }
        }
        CellValue::Error(e) => {
            out.t = Some(cell_types::ERROR.to_string());
            out.v = Some(e.glyph().to_string());
        }
        CellValue::Date(dt) => {
            if opts.cell_dates {
                out.t = Some(cell_types::DATE.to_string());
                out.v = Some(dt.format("%Y-%m-%dT%H:%M:%S").to_string());
            } else {
                let serial = to_serial(*dt, wb.date1904);
                out.v = Some(format!("{serial}"));
                if cell.number_format.is_none() {
                    out.s = Some(registry.xf_for_numfmt(14));
                }
            }
        }
        CellValue::Empty => {
            // Array-formula members without a cached value still need a
            // bare `<c>` element so their coverage survives a roundtrip.
            if cell.formula.is_none() && cell.array_range.is_none() {
                return None;
            }
        }
    }

    if let Some(formula) = &cell.formula {
        let mut f = wsx::CellFormulaXml {
            value: formula.clone(),
            ..wsx::CellFormulaXml::default()
        };
        if let Some(range) = cell.array_range {
            f.t = Some("array".to_string());
            f.reference = Some(encode_range(range));
            if cell.dynamic_array {
                f.dt = Some(1);
            }
        }
        out.f = Some(f);
    }

    if let Some(format) = &cell.number_format {
        out.s = Some(registry.xf_for(format));
    }

    Some(out)
}

fn build_comments_xml(ws: &Worksheet, commented: &[CellRef]) -> CommentsXml {
    let mut authors: Vec<String> = Vec::new();
    let mut comments: Vec<CommentXml> = Vec::new();

    for &at in commented {
        let Some(cell) = ws.cell(at) else { continue };
        for comment in &cell.comments {
            let author_id = match authors.iter().position(|a| a == &comment.author) {
                Some(idx) => idx as u32,
                None => {
                    authors.push(comment.author.clone());
                    (authors.len() - 1) as u32
                }
            };
            comments.push(CommentXml {
                reference: encode_cell(at),
                author_id,
                text: CommentText {
                    t: Some(Text::preserving(&comment.text)),
                    runs: vec![],
                },
            });
        }
    }

    CommentsXml {
        authors: Authors { authors },
        comment_list: CommentList { comments },
        ..CommentsXml::default()
    }
}

fn build_threaded_xml(
    ws: &Worksheet,
    persons: &mut Vec<Person>,
    counter: &mut u32,
) -> ThreadedCommentsXml {
    fn ensure_person(name: &str, persons: &mut Vec<Person>) -> String {
        if let Some(p) = persons.iter().find(|p| p.display_name == name) {
            return p.id.clone();
        }
        let id = person_guid(persons.len() as u32 + 1);
        persons.push(Person {
            display_name: name.to_string(),
            id: id.clone(),
            user_id: None,
            provider_id: None,
        });
        id
    }

    let mut out = ThreadedCommentsXml::default();
    for (at, cell) in ws.iter_cells() {
        let mut root_id: Option<String> = None;
        for comment in cell.comments.iter().filter(|c| c.threaded) {
            let author = if comment.author.is_empty() {
                DEFAULT_THREAD_AUTHOR
            } else {
                comment.author.as_str()
            };
            let person_id = ensure_person(author, persons);
            *counter += 1;
            let id = thread_guid(*counter);
            out.comments.push(ThreadedCommentXml {
                cell_ref: encode_cell(at),
                date_time: THREAD_EPOCH.to_string(),
                person_id,
                id: id.clone(),
                parent_id: root_id.clone(),
                done: None,
                text: comment.text.clone(),
            });
            if root_id.is_none() {
                root_id = Some(id);
            }
        }
    }

    // The people list always carries a default author.
    if persons.is_empty() {
        let id = person_guid(1);
        persons.push(Person {
            display_name: DEFAULT_THREAD_AUTHOR.to_string(),
            id,
            user_id: None,
            provider_id: None,
        });
    }

    out
}
