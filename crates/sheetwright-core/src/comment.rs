//! Cell comments: legacy and threaded representations, the precedence
//! rules that reconcile them, VML anchor generation, and deterministic
//! thread GUIDs.
//!
//! Precedence: threaded comments supersede legacy ones. Inserting threaded
//! comments onto a cell discards its legacy comments; inserting legacy
//! comments onto a cell that already has threaded ones is a no-op.

use crate::addr::CellRef;
use crate::cell::CellComment;
use crate::sheet::Worksheet;

/// Default author appended to the people list when threaded comments are
/// written and no author exists.
pub const DEFAULT_THREAD_AUTHOR: &str = "sheetwright";

/// Insert comments onto a cell, applying the threaded-vs-legacy
/// precedence rules. Legacy comments on the same cell coalesce in
/// document order.
pub fn insert_comments(
    ws: &mut Worksheet,
    at: CellRef,
    comments: Vec<CellComment>,
    threaded: bool,
) {
    let cell = ws.cell_entry(at);
    if threaded {
        // Threaded supersedes: discard any legacy comments already there.
        cell.comments.retain(|c| c.threaded);
        cell.comments
            .extend(comments.into_iter().map(|mut c| {
                c.threaded = true;
                c
            }));
    } else {
        // Legacy never displaces threaded.
        if cell.comments.iter().any(|c| c.threaded) {
            return;
        }
        cell.comments.extend(comments.into_iter().map(|mut c| {
            c.threaded = false;
            c
        }));
    }
}

/// Deterministic GUID for a threaded comment, seeded by a per-write
/// counter.
pub fn thread_guid(counter: u32) -> String {
    format!("{{54EE7950-7262-4200-B975-{counter:012X}}}")
}

/// Deterministic GUID for a person entry.
pub fn person_guid(counter: u32) -> String {
    format!("{{6E56D3F0-2C41-4F90-A1B6-{counter:012X}}}")
}

/// Timestamp written on generated threaded comments.
pub const THREAD_EPOCH: &str = "2020-01-01T00:00:00.00";

/// Build the VML drawing part anchoring legacy comment boxes. One shape
/// per commented cell, hidden by default.
pub fn build_vml(comment_cells: &[CellRef]) -> String {
    let mut out = String::from(
        "<xml xmlns:v=\"urn:schemas-microsoft-com:vml\" \
         xmlns:o=\"urn:schemas-microsoft-com:office:office\" \
         xmlns:x=\"urn:schemas-microsoft-com:office:excel\">\
         <o:shapelayout v:ext=\"edit\"><o:idmap v:ext=\"edit\" data=\"1\"/></o:shapelayout>\
         <v:shapetype id=\"_x0000_t202\" coordsize=\"21600,21600\" o:spt=\"202\" \
         path=\"m,l,21600r21600,l21600,xe\"><v:stroke joinstyle=\"miter\"/>\
         <v:path gradientshapeok=\"t\" o:connecttype=\"rect\"/></v:shapetype>",
    );
    for (i, at) in comment_cells.iter().enumerate() {
        out.push_str(&format!(
            "<v:shape id=\"_x0000_s{id}\" type=\"#_x0000_t202\" \
             style=\"position:absolute;margin-left:80pt;margin-top:2pt;width:104pt;height:64pt;z-index:{z};visibility:hidden\" \
             fillcolor=\"#ffffe1\" o:insetmode=\"auto\">\
             <v:fill color2=\"#ffffe1\"/>\
             <v:shadow on=\"t\" color=\"black\" obscured=\"t\"/>\
             <x:ClientData ObjectType=\"Note\">\
             <x:MoveWithCells/><x:SizeWithCells/>\
             <x:AutoFill>False</x:AutoFill>\
             <x:Row>{row}</x:Row><x:Column>{col}</x:Column>\
             </x:ClientData></v:shape>",
            id = 1025 + i,
            z = i + 1,
            row = at.row,
            col = at.col,
        ));
    }
    out.push_str("</xml>");
    out
}

/// Collect the cells of a worksheet carrying legacy comments, in
/// row-major order.
pub fn legacy_comment_cells(ws: &Worksheet) -> Vec<CellRef> {
    ws.iter_cells()
        .filter(|(_, cell)| cell.comments.iter().any(|c| !c.threaded))
        .map(|(at, _)| at)
        .collect()
}

/// Collect the cells of a worksheet carrying threaded comments, in
/// row-major order.
pub fn threaded_comment_cells(ws: &Worksheet) -> Vec<CellRef> {
    ws.iter_cells()
        .filter(|(_, cell)| cell.comments.iter().any(|c| c.threaded))
        .map(|(at, _)| at)
        .collect()
}

/// Whether any cell in the worksheet has a threaded comment.
pub fn has_threaded(ws: &Worksheet) -> bool {
    !threaded_comment_cells(ws).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy(author: &str, text: &str) -> CellComment {
        CellComment {
            author: author.to_string(),
            text: text.to_string(),
            threaded: false,
        }
    }

    fn threaded(author: &str, text: &str) -> CellComment {
        CellComment {
            author: author.to_string(),
            text: text.to_string(),
            threaded: true,
        }
    }

    fn a1() -> CellRef {
        CellRef::new(0, 0)
    }

    // ----- precedence rules -------------------------------------------------

    #[test]
    fn test_legacy_comments_coalesce_in_order() {
        let mut ws = Worksheet::new(false);
        insert_comments(&mut ws, a1(), vec![legacy("A", "first")], false);
        insert_comments(&mut ws, a1(), vec![legacy("B", "second")], false);
        let comments = &ws.cell(a1()).unwrap().comments;
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].text, "first");
        assert_eq!(comments[1].text, "second");
        assert!(comments.iter().all(|c| !c.threaded));
    }

    #[test]
    fn test_threaded_discards_legacy() {
        let mut ws = Worksheet::new(false);
        insert_comments(&mut ws, a1(), vec![legacy("A", "old note")], false);
        insert_comments(&mut ws, a1(), vec![threaded("B", "thread root")], true);
        let comments = &ws.cell(a1()).unwrap().comments;
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].text, "thread root");
        assert!(comments[0].threaded);
    }

    #[test]
    fn test_legacy_ignored_when_threaded_present() {
        let mut ws = Worksheet::new(false);
        insert_comments(&mut ws, a1(), vec![threaded("B", "thread root")], true);
        insert_comments(&mut ws, a1(), vec![legacy("A", "late note")], false);
        let comments = &ws.cell(a1()).unwrap().comments;
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].text, "thread root");
    }

    #[test]
    fn test_threaded_flag_is_forced() {
        let mut ws = Worksheet::new(false);
        // A mismatched flag on the input is corrected by the insert mode.
        insert_comments(&mut ws, a1(), vec![legacy("A", "x")], true);
        assert!(ws.cell(a1()).unwrap().comments[0].threaded);
    }

    #[test]
    fn test_insert_creates_stub_cell() {
        let mut ws = Worksheet::new(false);
        insert_comments(&mut ws, CellRef::new(4, 4), vec![legacy("A", "x")], false);
        assert!(ws.cell(CellRef::new(4, 4)).is_some());
    }

    // ----- collection helpers -----------------------------------------------

    #[test]
    fn test_comment_cell_collection() {
        let mut ws = Worksheet::new(false);
        insert_comments(&mut ws, CellRef::new(0, 0), vec![legacy("A", "x")], false);
        insert_comments(&mut ws, CellRef::new(1, 0), vec![threaded("B", "y")], true);
        assert_eq!(legacy_comment_cells(&ws), vec![CellRef::new(0, 0)]);
        assert_eq!(threaded_comment_cells(&ws), vec![CellRef::new(1, 0)]);
        assert!(has_threaded(&ws));
    }

    // ----- GUIDs and VML ----------------------------------------------------

    #[test]
    fn test_thread_guid_is_deterministic() {
        assert_eq!(thread_guid(1), thread_guid(1));
        assert_ne!(thread_guid(1), thread_guid(2));
        let g = thread_guid(255);
        assert!(g.starts_with("{54EE7950-7262-4200-B975-"));
        assert!(g.ends_with("0000000000FF}"));
    }

    #[test]
    fn test_person_guid_differs_from_thread_guid() {
        assert_ne!(person_guid(1), thread_guid(1));
    }

    #[test]
    fn test_vml_contains_anchor_rows() {
        let vml = build_vml(&[CellRef::new(0, 0), CellRef::new(3, 2)]);
        assert!(vml.contains("<x:Row>0</x:Row><x:Column>0</x:Column>"));
        assert!(vml.contains("<x:Row>3</x:Row><x:Column>2</x:Column>"));
        assert!(vml.contains("ObjectType=\"Note\""));
        assert!(vml.starts_with("<xml "));
        assert!(vml.ends_with("</xml>"));
    }

    #[test]
    fn test_vml_shape_ids_increment() {
        let vml = build_vml(&[CellRef::new(0, 0), CellRef::new(1, 1)]);
        assert!(vml.contains("_x0000_s1025"));
        assert!(vml.contains("_x0000_s1026"));
    }
}
