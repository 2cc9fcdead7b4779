//! Runtime shared string table.
//!
//! Bridges the XML-level [`Sst`] and the cell model: positional lookup
//! during read, dedup insertion during write, and the rich-run HTML
//! projection.

use std::collections::HashMap;

use sheetwright_xml::shared_strings::{RichRunXml, Si, Sst, Text};

/// One interned string: the plain-text projection plus the preserved
/// rich-run payload when the source item was rich.
#[derive(Debug, Clone, PartialEq)]
pub struct SharedStringEntry {
    pub text: String,
    pub rich: Option<Vec<RichRunXml>>,
}

/// Runtime shared string table.
///
/// Maintains an ordered entry list (the SST index is positional) and a
/// reverse map for deduplication when inserting.
#[derive(Debug, Default)]
pub struct SharedStringTable {
    entries: Vec<SharedStringEntry>,
    index_map: HashMap<String, usize>,
}

impl SharedStringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the parsed XML part. Entries are positional; duplicates
    /// in the source keep their original indices.
    pub fn from_sst(sst: &Sst) -> Self {
        let mut table = Self::new();
        for si in &sst.items {
            let text = si.plain_text();
            let rich = if si.r.is_empty() {
                None
            } else {
                Some(si.r.clone())
            };
            let idx = table.entries.len();
            table.index_map.entry(text.clone()).or_insert(idx);
            table.entries.push(SharedStringEntry { text, rich });
        }
        table
    }

    /// Convert back to the XML part. Rich payloads are emitted verbatim;
    /// plain strings get `xml:space="preserve"` when whitespace matters.
    pub fn to_sst(&self) -> Sst {
        let items: Vec<Si> = self
            .entries
            .iter()
            .map(|e| match &e.rich {
                Some(runs) => Si {
                    t: None,
                    r: runs.clone(),
                    r_ph: vec![],
                },
                None => Si {
                    t: Some(Text::preserving(&e.text)),
                    r: vec![],
                    r_ph: vec![],
                },
            })
            .collect();

        let len = items.len() as u32;
        Sst {
            xmlns: sheetwright_xml::namespaces::SPREADSHEET_ML.to_string(),
            count: Some(len),
            unique_count: Some(len),
            items,
        }
    }

    pub fn get(&self, index: usize) -> Option<&SharedStringEntry> {
        self.entries.get(index)
    }

    /// Add a plain string, returning its index. Duplicate strings return
    /// the existing index.
    pub fn add(&mut self, s: &str) -> usize {
        if let Some(&idx) = self.index_map.get(s) {
            return idx;
        }
        let idx = self.entries.len();
        self.entries.push(SharedStringEntry {
            text: s.to_string(),
            rich: None,
        });
        self.index_map.insert(s.to_string(), idx);
        idx
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Translate a rich-run sequence to inline HTML: `<b>`, `<i>`, `<s>`,
/// `<sup>`, `<sub>`, and a `<span style="...">` for size/color, with
/// embedded newlines becoming `<br/>`.
pub fn rich_runs_to_html(runs: &[RichRunXml]) -> String {
    let mut out = String::new();
    for run in runs {
        let mut open: Vec<&str> = Vec::new();
        let mut close: Vec<&str> = Vec::new();
        let mut style = String::new();

        if let Some(props) = &run.r_pr {
            if props.b.as_ref().is_some_and(|b| b.is_set()) {
                open.push("<b>");
                close.push("</b>");
            }
            if props.i.as_ref().is_some_and(|b| b.is_set()) {
                open.push("<i>");
                close.push("</i>");
            }
            if props.strike.as_ref().is_some_and(|b| b.is_set()) {
                open.push("<s>");
                close.push("</s>");
            }
            if let Some(va) = &props.vert_align {
                match va.val.as_str() {
                    "superscript" => {
                        open.push("<sup>");
                        close.push("</sup>");
                    }
                    "subscript" => {
                        open.push("<sub>");
                        close.push("</sub>");
                    }
                    _ => {}
                }
            }
            if let Some(sz) = &props.sz {
                style.push_str(&format!("font-size:{}pt;", sz.val));
            }
            if let Some(color) = &props.color {
                if let Some(rgb) = &color.rgb {
                    let hex = if rgb.len() == 8 { &rgb[2..] } else { rgb.as_str() };
                    style.push_str(&format!("color:#{hex};"));
                }
            }
        }

        let span = !style.is_empty();
        if span {
            out.push_str(&format!("<span style=\"{style}\">"));
        }
        for tag in &open {
            out.push_str(tag);
        }

        let escaped = crate::xmlutil::escape_text(&run.t.value).replace('\n', "<br/>");
        out.push_str(&escaped);

        for tag in close.iter().rev() {
            out.push_str(tag);
        }
        if span {
            out.push_str("</span>");
        }
    }
    out
}
