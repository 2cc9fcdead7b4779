//! Worksheet model: cell storage (sparse or dense behind one interface),
//! dimension upkeep, merges, column/row properties, and the array-formula
//! helper.

use std::collections::BTreeMap;

use crate::addr::{CellRef, Range};
use crate::cell::Cell;
use crate::error::{Error, Result};

/// Page margins in inches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageMargins {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
    pub header: f64,
    pub footer: f64,
}

impl Default for PageMargins {
    fn default() -> Self {
        Self {
            left: 0.7,
            right: 0.7,
            top: 0.75,
            bottom: 0.75,
            header: 0.3,
            footer: 0.3,
        }
    }
}

/// Sparse column properties, keyed by zero-based column index.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColProps {
    pub width: Option<f64>,
    pub hidden: bool,
    pub outline_level: Option<u8>,
}

/// Sparse row properties, keyed by zero-based row index.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowProps {
    pub height_pt: Option<f64>,
    pub hidden: bool,
    pub outline_level: Option<u8>,
}

/// The two interchangeable cell storage layouts. `CellRef` orders by
/// `(row, col)`, so sparse iteration is naturally row-major.
#[derive(Debug, Clone)]
pub enum CellStore {
    Sparse(BTreeMap<CellRef, Cell>),
    Dense(Vec<Vec<Option<Cell>>>),
}

impl CellStore {
    pub fn sparse() -> Self {
        CellStore::Sparse(BTreeMap::new())
    }

    pub fn dense() -> Self {
        CellStore::Dense(Vec::new())
    }

    pub fn is_dense(&self) -> bool {
        matches!(self, CellStore::Dense(_))
    }

    pub fn get(&self, at: CellRef) -> Option<&Cell> {
        match self {
            CellStore::Sparse(map) => map.get(&at),
            CellStore::Dense(rows) => rows
                .get(at.row as usize)
                .and_then(|r| r.get(at.col as usize))
                .and_then(|c| c.as_ref()),
        }
    }

    pub fn get_mut(&mut self, at: CellRef) -> Option<&mut Cell> {
        match self {
            CellStore::Sparse(map) => map.get_mut(&at),
            CellStore::Dense(rows) => rows
                .get_mut(at.row as usize)
                .and_then(|r| r.get_mut(at.col as usize))
                .and_then(|c| c.as_mut()),
        }
    }

    pub fn insert(&mut self, at: CellRef, cell: Cell) {
        match self {
            CellStore::Sparse(map) => {
                map.insert(at, cell);
            }
            CellStore::Dense(rows) => {
                let row = at.row as usize;
                let col = at.col as usize;
                if rows.len() <= row {
                    rows.resize_with(row + 1, Vec::new);
                }
                if rows[row].len() <= col {
                    rows[row].resize_with(col + 1, || None);
                }
                rows[row][col] = Some(cell);
            }
        }
    }

    pub fn remove(&mut self, at: CellRef) -> Option<Cell> {
        match self {
            CellStore::Sparse(map) => map.remove(&at),
            CellStore::Dense(rows) => rows
                .get_mut(at.row as usize)
                .and_then(|r| r.get_mut(at.col as usize))
                .and_then(|c| c.take()),
        }
    }

    /// Row-major iteration over populated cells.
    pub fn iter(&self) -> Box<dyn Iterator<Item = (CellRef, &Cell)> + '_> {
        match self {
            CellStore::Sparse(map) => Box::new(map.iter().map(|(k, v)| (*k, v))),
            CellStore::Dense(rows) => Box::new(rows.iter().enumerate().flat_map(|(r, row)| {
                row.iter().enumerate().filter_map(move |(c, cell)| {
                    cell.as_ref()
                        .map(|cell| (CellRef::new(r as u32, c as u32), cell))
                })
            })),
        }
    }

    pub fn cell_count(&self) -> usize {
        self.iter().count()
    }
}

/// A logical worksheet.
#[derive(Debug, Clone)]
pub struct Worksheet {
    store: CellStore,
    /// Inclusive bounding range of populated cells; kept covering on every
    /// insert.
    pub dimension: Option<Range>,
    /// The pre-truncation ref when `sheet_rows` limited the parse.
    pub full_dimension: Option<Range>,
    /// Merged ranges. Overlap is not checked on write.
    pub merges: Vec<Range>,
    pub cols: BTreeMap<u32, ColProps>,
    pub rows: BTreeMap<u32, RowProps>,
    pub auto_filter: Option<Range>,
    pub page_margins: Option<PageMargins>,
    /// Sheet protection passthrough.
    pub protection: Option<sheetwright_xml::worksheet::SheetProtection>,
}

impl Worksheet {
    /// New empty worksheet with the requested storage layout.
    pub fn new(dense: bool) -> Self {
        Self {
            store: if dense {
                CellStore::dense()
            } else {
                CellStore::sparse()
            },
            dimension: None,
            full_dimension: None,
            merges: Vec::new(),
            cols: BTreeMap::new(),
            rows: BTreeMap::new(),
            auto_filter: None,
            page_margins: None,
            protection: None,
        }
    }

    pub fn is_dense(&self) -> bool {
        self.store.is_dense()
    }

    pub fn cell(&self, at: CellRef) -> Option<&Cell> {
        self.store.get(at)
    }

    pub fn cell_mut(&mut self, at: CellRef) -> Option<&mut Cell> {
        self.store.get_mut(at)
    }

    /// Insert a cell and grow the dimension to cover it.
    pub fn set_cell(&mut self, at: CellRef, cell: Cell) {
        self.store.insert(at, cell);
        match &mut self.dimension {
            Some(dim) => dim.extend_to(at),
            None => self.dimension = Some(Range::single(at)),
        }
    }

    /// Insert a cell, creating an empty stub if needed, and return a
    /// mutable reference to it.
    pub fn cell_entry(&mut self, at: CellRef) -> &mut Cell {
        if self.store.get(at).is_none() {
            self.set_cell(at, Cell::stub());
        }
        self.store
            .get_mut(at)
            .expect("cell was just inserted")
    }

    pub fn remove_cell(&mut self, at: CellRef) -> Option<Cell> {
        self.store.remove(at)
    }

    /// Row-major iteration over populated cells.
    pub fn iter_cells(&self) -> impl Iterator<Item = (CellRef, &Cell)> + '_ {
        self.store.iter()
    }

    pub fn cell_count(&self) -> usize {
        self.store.cell_count()
    }

    /// Attach an array formula covering `range`: the top-left anchor gets
    /// the formula text, every covered cell gets the range.
    pub fn set_array_formula(&mut self, range: Range, formula: &str, dynamic: bool) -> Result<()> {
        if formula.starts_with('=') {
            return Err(Error::Internal(
                "array formula must not carry a leading '='".to_string(),
            ));
        }
        for at in range.cells().collect::<Vec<_>>() {
            let cell = self.cell_entry(at);
            cell.array_range = Some(range);
            if at == range.start {
                cell.formula = Some(formula.to_string());
                cell.dynamic_array = dynamic;
            } else {
                cell.formula = None;
            }
        }
        Ok(())
    }

    /// Recompute the dimension from stored cells. Used after bulk edits.
    pub fn recompute_dimension(&mut self) {
        let mut dim: Option<Range> = None;
        for (at, _) in self.store.iter() {
            match &mut dim {
                Some(d) => d.extend_to(at),
                None => dim = Some(Range::single(at)),
            }
        }
        self.dimension = dim;
    }
}

impl Default for Worksheet {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addr::{decode_range, encode_range};
    use crate::cell::CellValue;

    fn at(row: u32, col: u32) -> CellRef {
        CellRef::new(row, col)
    }

    // ----- storage duality -------------------------------------------------

    #[test]
    fn test_sparse_and_dense_agree() {
        for dense in [false, true] {
            let mut ws = Worksheet::new(dense);
            ws.set_cell(at(0, 0), Cell::text("a"));
            ws.set_cell(at(2, 3), Cell::number(7.0));

            assert_eq!(ws.is_dense(), dense);
            assert_eq!(
                ws.cell(at(0, 0)).unwrap().value,
                CellValue::Str("a".to_string())
            );
            assert_eq!(ws.cell(at(2, 3)).unwrap().value, CellValue::Number(7.0));
            assert!(ws.cell(at(1, 1)).is_none());
            assert_eq!(ws.cell_count(), 2);
        }
    }

    #[test]
    fn test_iteration_is_row_major_in_both_layouts() {
        for dense in [false, true] {
            let mut ws = Worksheet::new(dense);
            ws.set_cell(at(1, 0), Cell::number(3.0));
            ws.set_cell(at(0, 1), Cell::number(2.0));
            ws.set_cell(at(0, 0), Cell::number(1.0));

            let order: Vec<CellRef> = ws.iter_cells().map(|(r, _)| r).collect();
            assert_eq!(order, vec![at(0, 0), at(0, 1), at(1, 0)]);
        }
    }

    #[test]
    fn test_dimension_tracks_inserts() {
        let mut ws = Worksheet::new(false);
        assert!(ws.dimension.is_none());
        ws.set_cell(at(1, 1), Cell::number(1.0));
        assert_eq!(encode_range(ws.dimension.unwrap()), "B2");
        ws.set_cell(at(4, 0), Cell::number(2.0));
        assert_eq!(encode_range(ws.dimension.unwrap()), "A2:B5");
    }

    #[test]
    fn test_dimension_covers_every_nonempty_cell() {
        let mut ws = Worksheet::new(true);
        ws.set_cell(at(3, 2), Cell::number(1.0));
        ws.set_cell(at(0, 5), Cell::number(2.0));
        let dim = ws.dimension.unwrap();
        for (cell_ref, _) in ws.iter_cells() {
            assert!(dim.contains(cell_ref));
        }
    }

    #[test]
    fn test_remove_cell() {
        for dense in [false, true] {
            let mut ws = Worksheet::new(dense);
            ws.set_cell(at(0, 0), Cell::number(1.0));
            assert!(ws.remove_cell(at(0, 0)).is_some());
            assert!(ws.cell(at(0, 0)).is_none());
            assert!(ws.remove_cell(at(0, 0)).is_none());
        }
    }

    #[test]
    fn test_cell_entry_creates_stub() {
        let mut ws = Worksheet::new(false);
        ws.cell_entry(at(2, 2)).formula = Some("A1".to_string());
        assert_eq!(ws.cell(at(2, 2)).unwrap().formula.as_deref(), Some("A1"));
        assert_eq!(encode_range(ws.dimension.unwrap()), "C3");
    }

    #[test]
    fn test_recompute_dimension() {
        let mut ws = Worksheet::new(false);
        ws.set_cell(at(5, 5), Cell::number(1.0));
        ws.remove_cell(at(5, 5));
        ws.set_cell(at(1, 1), Cell::number(1.0));
        ws.recompute_dimension();
        assert_eq!(encode_range(ws.dimension.unwrap()), "B2");
    }

    // ----- array formulas --------------------------------------------------

    #[test]
    fn test_set_array_formula() {
        let mut ws = Worksheet::new(false);
        let range = decode_range("B1:B3").unwrap();
        ws.set_array_formula(range, "A1:A3*2", false).unwrap();

        let anchor = ws.cell(at(0, 1)).unwrap();
        assert_eq!(anchor.formula.as_deref(), Some("A1:A3*2"));
        assert_eq!(anchor.array_range, Some(range));

        let member = ws.cell(at(1, 1)).unwrap();
        assert!(member.formula.is_none());
        assert_eq!(member.array_range, Some(range));
    }

    #[test]
    fn test_set_array_formula_rejects_leading_equals() {
        let mut ws = Worksheet::new(false);
        let range = decode_range("A1:A2").unwrap();
        assert!(ws.set_array_formula(range, "=A1", false).is_err());
    }

    #[test]
    fn test_dynamic_array_flag_on_anchor_only() {
        let mut ws = Worksheet::new(false);
        let range = decode_range("A1:A2").unwrap();
        ws.set_array_formula(range, "SEQUENCE(2)", true).unwrap();
        assert!(ws.cell(at(0, 0)).unwrap().dynamic_array);
        assert!(!ws.cell(at(1, 0)).unwrap().dynamic_array);
    }

    // ----- metadata --------------------------------------------------------

    #[test]
    fn test_col_and_row_props() {
        let mut ws = Worksheet::new(false);
        ws.cols.insert(
            1,
            ColProps {
                width: Some(15.0),
                hidden: true,
                outline_level: None,
            },
        );
        ws.rows.insert(
            0,
            RowProps {
                height_pt: Some(30.0),
                hidden: true,
                outline_level: None,
            },
        );
        assert!(ws.cols.get(&1).unwrap().hidden);
        assert_eq!(ws.rows.get(&0).unwrap().height_pt, Some(30.0));
    }

    #[test]
    fn test_page_margins_default() {
        let m = PageMargins::default();
        assert_eq!(
            (m.left, m.right, m.top, m.bottom, m.header, m.footer),
            (0.7, 0.7, 0.75, 0.75, 0.3, 0.3)
        );
    }
}
