//! Read orchestration: bytes -> ZIP bag -> Content-Types -> relationship
//! graph -> shared strings + styles + workbook manifest -> per-sheet parse
//! -> comment enrichment -> assembled [`Workbook`].

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use sheetwright_xml::comments::CommentsXml;
use sheetwright_xml::content_types::{mime_types, ContentTypes};
use sheetwright_xml::namespaces;
use sheetwright_xml::relationships::{rel_types, Relationships};
use sheetwright_xml::shared_strings::Sst;
use sheetwright_xml::styles::StyleSheet;
use sheetwright_xml::threaded_comment::{PersonList, ThreadedCommentsXml};
use sheetwright_xml::workbook::WorkbookXml;
use sheetwright_xml::worksheet::{cell_types, WorksheetXml};

use crate::addr::{decode_cell, decode_range, CellRef, Range};
use crate::book::{DefinedName, Sheet, Visibility, Workbook};
use crate::cell::{Cell, CellComment, CellError, CellValue, Hyperlink, NumberFormat};
use crate::comment::insert_comments;
use crate::datetime::parse_iso_datetime;
use crate::error::{Error, Result};
use crate::options::ReadOptions;
use crate::package::{rels_path_for, resolve_target, ArchiveReader};
use crate::sheet::{ColProps, PageMargins, RowProps, Worksheet};
use crate::ssf;
use crate::sst::{rich_runs_to_html, SharedStringTable};

/// Read a workbook from XLSX container bytes.
pub fn read_workbook(data: &[u8], opts: &ReadOptions) -> Result<Workbook> {
    let mut archive = ArchiveReader::open(data)?;

    if !archive.has("[Content_Types].xml") {
        return Err(Error::UnsupportedZip);
    }
    let content_types: ContentTypes = read_xml_part(&mut archive, "[Content_Types].xml")?;
    if content_types.xmlns != namespaces::CONTENT_TYPES {
        return Err(Error::UnknownNamespace(content_types.xmlns));
    }

    let workbook_path = locate_workbook(&mut archive, &content_types)?;
    let workbook_xml: WorkbookXml = read_xml_part(&mut archive, &workbook_path)?;
    if !namespaces::is_spreadsheet_ml(&workbook_xml.xmlns) {
        return Err(Error::UnknownNamespace(workbook_xml.xmlns));
    }

    let workbook_rels: Relationships = archive
        .read_utf8(&rels_path_for(&workbook_path))
        .and_then(|xml| quick_xml::de::from_str(&xml).ok())
        .unwrap_or_default();

    let mut wb = Workbook::new();
    if let Some(pr) = &workbook_xml.workbook_pr {
        wb.date1904 = pr.date1904.unwrap_or(false);
        wb.code_name = pr.code_name.clone();
    }
    for dn in workbook_xml
        .defined_names
        .iter()
        .flat_map(|d| d.defined_names.iter())
    {
        wb.defined_names.push(DefinedName {
            name: dn.name.clone(),
            reference: dn.value.clone(),
            sheet_scope: dn.local_sheet_id,
            comment: dn.comment.clone(),
            hidden: dn.hidden.unwrap_or(false),
        });
    }

    // Document properties.
    if let Some(xml) = archive.read_utf8("docProps/core.xml") {
        wb.core_props = sheetwright_xml::doc_props::deserialize_core_properties(&xml).ok();
    }
    if let Some(xml) = archive.read_utf8("docProps/app.xml") {
        wb.app_props = sheetwright_xml::doc_props::deserialize_extended_properties(&xml).ok();
    }
    if let Some(xml) = archive.read_utf8("docProps/custom.xml") {
        wb.custom_props = sheetwright_xml::doc_props::deserialize_custom_properties(&xml).ok();
    }

    // `book_sheets` returns names only and wins over the sheet filter.
    if opts.book_sheets {
        for entry in &workbook_xml.sheets.sheets {
            wb.sheets.push(Sheet {
                name: entry.name.clone(),
                visibility: Visibility::from_state_attr(entry.state.as_deref()),
                code_name: None,
                data: Worksheet::new(opts.dense),
            });
        }
        return Ok(wb);
    }
    if opts.book_props {
        return Ok(wb);
    }

    // Styles: the number-format table plus the cellXfs -> numFmtId binding.
    let stylesheet: Option<StyleSheet> = locate_by_rel(
        &workbook_rels,
        &workbook_path,
        rel_types::STYLES,
        "xl/styles.xml",
    )
    .and_then(|path| read_xml_part(&mut archive, &path).ok());
    let mut xf_to_numfmt: Vec<u32> = Vec::new();
    if let Some(ss) = &stylesheet {
        if let Some(fmts) = &ss.num_fmts {
            for f in &fmts.num_fmts {
                wb.format_table.insert(f.num_fmt_id, f.format_code.clone());
            }
        }
        if let Some(xfs) = &ss.cell_xfs {
            xf_to_numfmt = xfs
                .xfs
                .iter()
                .map(|xf| xf.num_fmt_id.unwrap_or(0))
                .collect();
        }
    }

    // Shared strings.
    let sst = locate_by_rel(
        &workbook_rels,
        &workbook_path,
        rel_types::SHARED_STRINGS,
        "xl/sharedStrings.xml",
    )
    .and_then(|path| read_xml_part::<Sst>(&mut archive, &path).ok())
    .map(|s| SharedStringTable::from_sst(&s))
    .unwrap_or_default();

    // The persons part is workbook-scoped; map person GUID -> display name.
    let persons: HashMap<String, String> = archive
        .read_utf8("xl/persons/person.xml")
        .and_then(|xml| quick_xml::de::from_str::<PersonList>(&xml).ok())
        .map(|pl| {
            pl.persons
                .into_iter()
                .map(|p| (p.id, p.display_name))
                .collect()
        })
        .unwrap_or_default();

    for (index, entry) in workbook_xml.sheets.sheets.iter().enumerate() {
        if let Some(selection) = &opts.sheets {
            if !selection.matches(index, &entry.name) {
                continue;
            }
        }

        let sheet_path = workbook_rels
            .by_id(&entry.r_id)
            .map(|rel| resolve_target(&workbook_path, &rel.target))
            .unwrap_or_else(|| format!("xl/worksheets/sheet{}.xml", index + 1));

        let sheet_rels: Relationships = archive
            .read_utf8(&rels_path_for(&sheet_path))
            .and_then(|xml| quick_xml::de::from_str(&xml).ok())
            .unwrap_or_default();

        let data = match parse_sheet(
            &mut archive,
            &sheet_path,
            &sheet_rels,
            &sst,
            &xf_to_numfmt,
            &wb.format_table,
            wb.date1904,
            &persons,
            opts,
        ) {
            Ok(ws) => ws,
            Err(e) if opts.strict => return Err(e),
            Err(_) => Worksheet::new(opts.dense),
        };

        wb.sheets.push(Sheet {
            name: entry.name.clone(),
            visibility: Visibility::from_state_attr(entry.state.as_deref()),
            code_name: None,
            data,
        });
    }

    Ok(wb)
}

fn read_xml_part<T: DeserializeOwned>(archive: &mut ArchiveReader, path: &str) -> Result<T> {
    let xml = archive
        .read_utf8(path)
        .ok_or_else(|| Error::XmlParse(format!("missing part {path}")))?;
    quick_xml::de::from_str(&xml).map_err(|e| Error::XmlDeserialize(format!("{path}: {e}")))
}

/// Locate the workbook part: package rels first, then the content-type
/// registry, then the conventional path.
fn locate_workbook(archive: &mut ArchiveReader, content_types: &ContentTypes) -> Result<String> {
    if let Some(xml) = archive.read_utf8("_rels/.rels") {
        if let Ok(rels) = quick_xml::de::from_str::<Relationships>(&xml) {
            if let Some(rel) = rels.first_of_type(rel_types::OFFICE_DOCUMENT) {
                return Ok(resolve_target("", &rel.target));
            }
        }
    }
    for mime in [mime_types::WORKBOOK, mime_types::WORKBOOK_MACRO] {
        if let Some(part) = content_types.parts_of_type(mime).next() {
            return Ok(part.trim_start_matches('/').to_string());
        }
    }
    if archive.has("xl/workbook.xml") {
        return Ok("xl/workbook.xml".to_string());
    }
    Err(Error::WorkbookNotFound)
}

fn locate_by_rel(
    rels: &Relationships,
    base: &str,
    rel_type: &str,
    fallback: &str,
) -> Option<String> {
    match rels.first_of_type(rel_type) {
        Some(rel) => Some(resolve_target(base, &rel.target)),
        None => Some(fallback.to_string()),
    }
}

#[allow(clippy::too_many_arguments)]
fn parse_sheet(
    archive: &mut ArchiveReader,
    sheet_path: &str,
    sheet_rels: &Relationships,
    sst: &SharedStringTable,
    xf_to_numfmt: &[u32],
    format_table: &HashMap<u32, String>,
    date1904: bool,
    persons: &HashMap<String, String>,
    opts: &ReadOptions,
) -> Result<Worksheet> {
    let ws_xml: WorksheetXml = read_xml_part(archive, sheet_path)?;
    let mut ws = Worksheet::new(opts.dense);

    // The declared dimension seeds the ref when present and non-degenerate
    // (a bare single-cell ref is recomputed from observed cells instead).
    if let Some(dim) = &ws_xml.dimension {
        if dim.reference.contains(':') {
            if let Ok(range) = decode_range(&dim.reference) {
                ws.dimension = Some(range);
            }
        }
    }

    if opts.cell_styles {
        if let Some(cols) = &ws_xml.cols {
            for col in &cols.cols {
                for c in col.min..=col.max {
                    ws.cols.insert(
                        c - 1,
                        ColProps {
                            width: col.width,
                            hidden: col.hidden.unwrap_or(false),
                            outline_level: col.outline_level,
                        },
                    );
                }
            }
        }
    }

    let ssf_opts = ssf::Options {
        date1904,
        table: Some(format_table),
    };

    // Array-formula coverage collected during the cell pass and stamped
    // onto member cells afterwards.
    let mut array_ranges: Vec<Range> = Vec::new();

    for row in &ws_xml.sheet_data.rows {
        if row.r == 0 {
            continue;
        }
        let row_idx = row.r - 1;
        if row.ht.is_some() || row.hidden.is_some() || row.outline_level.is_some() {
            ws.rows.insert(
                row_idx,
                RowProps {
                    height_pt: row.ht,
                    hidden: row.hidden.unwrap_or(false),
                    outline_level: row.outline_level,
                },
            );
        }

        for c in &row.cells {
            let Ok(at) = decode_cell(&c.r) else {
                continue;
            };
            let mut cell = Cell::default();
            let t = c.t.as_deref().unwrap_or(cell_types::NUMBER);

            match t {
                cell_types::SHARED_STRING => {
                    // The pending SST index resolves against the
                    // already-loaded table.
                    let idx: usize = c.v.as_deref().and_then(|v| v.parse().ok()).unwrap_or(0);
                    if let Some(entry) = sst.get(idx) {
                        cell.value = CellValue::Str(entry.text.clone());
                        if let Some(runs) = &entry.rich {
                            cell.rich_runs = Some(runs.clone());
                            if opts.cell_html {
                                cell.html = Some(rich_runs_to_html(runs));
                            }
                        }
                    }
                }
                cell_types::FORMULA_STRING => {
                    cell.value = CellValue::Str(c.v.clone().unwrap_or_default());
                }
                cell_types::INLINE_STRING => {
                    if let Some(is) = &c.is {
                        if let Some(t) = &is.t {
                            cell.value = CellValue::Str(t.value.clone());
                        } else if !is.r.is_empty() {
                            let text: String =
                                is.r.iter().map(|r| r.t.value.as_str()).collect();
                            cell.value = CellValue::Str(text);
                            cell.rich_runs = Some(is.r.clone());
                            if opts.cell_html {
                                cell.html = Some(rich_runs_to_html(&is.r));
                            }
                        }
                    }
                }
                cell_types::BOOLEAN => {
                    cell.value = CellValue::Bool(c.v.as_deref() == Some("1"));
                }
                cell_types::ERROR => {
                    let text = c.v.as_deref().unwrap_or("");
                    let err = CellError::from_glyph(text)
                        .or_else(|| {
                            text.parse::<u8>().ok().and_then(CellError::from_code)
                        })
                        .unwrap_or(CellError::NA);
                    cell.value = CellValue::Error(err);
                    cell.formatted = Some(err.glyph().to_string());
                }
                cell_types::DATE => {
                    if let Some(dt) = c.v.as_deref().and_then(parse_iso_datetime) {
                        cell.value = CellValue::Date(dt);
                    }
                }
                _ => {
                    if let Some(v) = c.v.as_deref().and_then(|v| v.parse::<f64>().ok()) {
                        cell.value = CellValue::Number(v);
                    }
                }
            }

            if opts.cell_formula {
                if let Some(f) = &c.f {
                    if !f.value.is_empty() {
                        cell.formula = Some(f.value.clone());
                    }
                    if f.t.as_deref() == Some("array") {
                        if let Some(range) =
                            f.reference.as_deref().and_then(|r| decode_range(r).ok())
                        {
                            cell.array_range = Some(range);
                            array_ranges.push(range);
                        }
                        cell.dynamic_array = f.dt == Some(1);
                    }
                }
            }

            if let Some(s) = c.s {
                cell.style_index = Some(s);
                let num_fmt_id = xf_to_numfmt.get(s as usize).copied().unwrap_or(0);
                if num_fmt_id != 0 {
                    cell.number_format = Some(NumberFormat::Index(num_fmt_id));
                }

                if let CellValue::Number(v) = cell.value {
                    let code = ssf::resolve_format(num_fmt_id, Some(format_table));
                    let is_date = crate::ssf::section::split_sections(code)
                        .ok()
                        .map(|sections| {
                            sections
                                .first()
                                .is_some_and(|s| crate::ssf::section::is_date_section(s))
                        })
                        .unwrap_or(false);
                    if is_date && opts.cell_dates {
                        if let Some(dt) = crate::datetime::serial_to_datetime(v, date1904) {
                            cell.value = CellValue::Date(dt);
                        }
                    }
                    if opts.cell_text {
                        cell.formatted =
                            ssf::format_index(num_fmt_id, ssf::Value::Number(v), &ssf_opts).ok();
                    }
                }
            } else if opts.cell_text {
                if let CellValue::Number(v) = cell.value {
                    cell.formatted = Some(ssf::format_general(v));
                }
            }

            if cell.is_empty() && !opts.sheet_stubs && cell.style_index.is_none() {
                continue;
            }
            ws.set_cell(at, cell);
        }
    }

    // Stamp array-formula coverage onto member cells. Members the
    // producer wrote as bare `<c>` elements were dropped by the stub
    // filter above, so they are (re)created here.
    for range in array_ranges {
        for at in range.cells().collect::<Vec<_>>() {
            ws.cell_entry(at).array_range = Some(range);
        }
    }

    // Merges.
    if let Some(merges) = &ws_xml.merge_cells {
        for m in &merges.merge_cells {
            if let Ok(range) = decode_range(&m.reference) {
                ws.merges.push(range);
            }
        }
    }

    // Hyperlinks: resolve rel targets and attach to every cell in the ref,
    // creating stubs as needed.
    if let Some(links) = &ws_xml.hyperlinks {
        for link in &links.hyperlinks {
            let base = link
                .r_id
                .as_deref()
                .and_then(|id| sheet_rels.by_id(id))
                .map(|rel| rel.target.clone())
                .unwrap_or_default();
            let target = match &link.location {
                Some(loc) => format!("{base}#{loc}"),
                None => base,
            };
            if target.is_empty() {
                continue;
            }
            if let Ok(range) = decode_range(&link.reference) {
                for at in range.cells().collect::<Vec<_>>() {
                    ws.cell_entry(at).hyperlink = Some(Hyperlink {
                        target: target.clone(),
                        tooltip: link.tooltip.clone(),
                    });
                }
            }
        }
    }

    if let Some(m) = &ws_xml.page_margins {
        ws.page_margins = Some(PageMargins {
            left: m.left,
            right: m.right,
            top: m.top,
            bottom: m.bottom,
            header: m.header,
            footer: m.footer,
        });
    }
    if let Some(af) = &ws_xml.auto_filter {
        ws.auto_filter = decode_range(&af.reference).ok();
    }
    ws.protection = ws_xml.sheet_protection.clone();

    // Comment enrichment: legacy first, then threaded (which supersedes).
    if let Some(rel) = sheet_rels.first_of_type(rel_types::COMMENTS) {
        let path = resolve_target(sheet_path, &rel.target);
        if let Ok(comments) = read_xml_part::<CommentsXml>(archive, &path) {
            for c in &comments.comment_list.comments {
                if let Ok(at) = decode_cell(&c.reference) {
                    let author = comments
                        .authors
                        .authors
                        .get(c.author_id as usize)
                        .cloned()
                        .unwrap_or_default();
                    insert_comments(
                        &mut ws,
                        at,
                        vec![CellComment {
                            author,
                            text: c.text.plain_text(),
                            threaded: false,
                        }],
                        false,
                    );
                }
            }
        }
    }
    if let Some(rel) = sheet_rels.first_of_type(rel_types::THREADED_COMMENTS) {
        let path = resolve_target(sheet_path, &rel.target);
        if let Ok(threaded) = read_xml_part::<ThreadedCommentsXml>(archive, &path) {
            for c in &threaded.comments {
                if let Ok(at) = decode_cell(&c.cell_ref) {
                    let author = persons.get(&c.person_id).cloned().unwrap_or_default();
                    insert_comments(
                        &mut ws,
                        at,
                        vec![CellComment {
                            author,
                            text: c.text.clone(),
                            threaded: true,
                        }],
                        true,
                    );
                }
            }
        }
    }

    // Row truncation: the full ref survives under `full_dimension`.
    if let Some(limit) = opts.sheet_rows {
        if limit > 0 {
            if let Some(dim) = ws.dimension {
                if dim.end.row >= limit {
                    ws.full_dimension = Some(dim);
                    let mut truncated = dim;
                    truncated.end.row = limit - 1;
                    ws.dimension = Some(truncated);
                    let beyond: Vec<CellRef> = ws
                        .iter_cells()
                        .map(|(at, _)| at)
                        .filter(|at| at.row >= limit)
                        .collect();
                    for at in beyond {
                        ws.remove_cell(at);
                    }
                }
            }
        }
    }

    Ok(ws)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_rejects_non_zip() {
        assert!(read_workbook(b"plainly not a zip", &ReadOptions::default()).is_err());
    }

    #[test]
    fn test_read_zip_without_content_types() {
        let mut w = crate::package::ArchiveWriter::new();
        w.add("random.txt", b"data".to_vec());
        let bytes = w.finish(true).unwrap();
        let err = read_workbook(&bytes, &ReadOptions::default()).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported ZIP file");
    }

    #[test]
    fn test_read_zip_without_workbook() {
        let mut w = crate::package::ArchiveWriter::new();
        w.add(
            "[Content_Types].xml",
            br#"<?xml version="1.0"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/></Types>"#
                .to_vec(),
        );
        let bytes = w.finish(true).unwrap();
        let err = read_workbook(&bytes, &ReadOptions::default()).unwrap_err();
        assert_eq!(err.to_string(), "Could not find workbook");
    }

    #[test]
    fn test_read_rejects_unknown_content_types_namespace() {
        let mut w = crate::package::ArchiveWriter::new();
        w.add(
            "[Content_Types].xml",
            br#"<?xml version="1.0"?><Types xmlns="http://bogus/namespace"/>"#.to_vec(),
        );
        let bytes = w.finish(true).unwrap();
        let err = read_workbook(&bytes, &ReadOptions::default()).unwrap_err();
        assert!(err.to_string().starts_with("Unknown Namespace:"));
    }
}
