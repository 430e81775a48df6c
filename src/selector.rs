//! Choosing the parts table among all tables detected in a document
//!
//! Parts lists sit in the bottom-right corner of a drawing sheet and, on
//! multi-sheet drawings, usually on the last sheet. Candidates are ranked by
//! their bottom edge (weighted by page) and then their right edge, and tried
//! in that order until one yields part rows.

use crate::header::Grid;
use crate::rows::{extract_part_rows_from_table, PartRow};
use crate::BomError;
use serde::Serialize;

/// Added to a table's bottom edge per page index so that any table on a
/// later page outranks every table on an earlier one. Heuristic: it assumes
/// page heights stay well below this value.
pub const PAGE_WEIGHT: f64 = 10_000.0;

/// Table bounds in page space, origin at the top-left corner
/// (`y1` is the bottom edge, growing downwards)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct BBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BBox {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }
}

/// A table found by a detector: its bounds and, on demand, its cells
pub trait CandidateTable {
    fn bbox(&self) -> BBox;

    /// The cell grid, rows top to bottom; empty cells are `None`
    fn extract(&self) -> Grid;
}

/// Per-page table detection over one document
pub trait TableSource {
    type Table: CandidateTable;

    fn page_count(&self) -> usize;

    /// Tables detected on `page_index` (0-based)
    fn find_tables(&self, page_index: usize) -> Result<Vec<Self::Table>, BomError>;
}

/// A table already held in memory
#[derive(Debug, Clone, Default)]
pub struct GridTable {
    pub bbox: BBox,
    pub cells: Grid,
}

impl GridTable {
    pub fn new(bbox: BBox, cells: Grid) -> Self {
        Self { bbox, cells }
    }
}

impl CandidateTable for GridTable {
    fn bbox(&self) -> BBox {
        self.bbox
    }

    fn extract(&self) -> Grid {
        self.cells.clone()
    }
}

/// Pages of in-memory tables, in document order
impl TableSource for Vec<Vec<GridTable>> {
    type Table = GridTable;

    fn page_count(&self) -> usize {
        self.len()
    }

    fn find_tables(&self, page_index: usize) -> Result<Vec<GridTable>, BomError> {
        Ok(self.get(page_index).cloned().unwrap_or_default())
    }
}

/// A detected table with its page
#[derive(Debug, Clone)]
pub struct Candidate<T> {
    pub page_index: usize,
    pub table: T,
}

impl<T: CandidateTable> Candidate<T> {
    /// `(bottom + page × PAGE_WEIGHT, right)`, larger ranks first
    pub fn sort_key(&self) -> (f64, f64) {
        let bbox = self.table.bbox();
        (
            bbox.y1 as f64 + self.page_index as f64 * PAGE_WEIGHT,
            bbox.x1 as f64,
        )
    }
}

/// The table that produced rows
#[derive(Debug, Clone, Serialize)]
pub struct Selection {
    pub page_index: usize,
    pub bbox: BBox,
    pub rows: Vec<PartRow>,
}

/// Collect every table of the document, best-ranked first
pub fn rank_candidates<S: TableSource + ?Sized>(
    source: &S,
) -> Result<Vec<Candidate<S::Table>>, BomError> {
    let mut candidates = Vec::new();
    for page_index in 0..source.page_count() {
        for table in source.find_tables(page_index)? {
            candidates.push(Candidate { page_index, table });
        }
    }

    // Stable sort: equal keys keep document order
    candidates.sort_by(|a, b| {
        let (ay, ax) = a.sort_key();
        let (by, bx) = b.sort_key();
        by.total_cmp(&ay).then_with(|| bx.total_cmp(&ax))
    });

    Ok(candidates)
}

/// Try candidates in rank order; the first one yielding rows wins
pub fn select_table<S: TableSource + ?Sized>(source: &S) -> Result<Option<Selection>, BomError> {
    let candidates = rank_candidates(source)?;
    log::debug!("{} table candidates", candidates.len());

    for (rank, candidate) in candidates.iter().enumerate() {
        let grid = candidate.table.extract();
        if grid.is_empty() {
            continue;
        }

        let rows = extract_part_rows_from_table(&grid);
        if rows.is_empty() {
            log::debug!(
                "candidate #{} on page {} has no parts header",
                rank,
                candidate.page_index
            );
            continue;
        }

        log::debug!(
            "selected candidate #{} on page {} with {} rows",
            rank,
            candidate.page_index,
            rows.len()
        );
        return Ok(Some(Selection {
            page_index: candidate.page_index,
            bbox: candidate.table.bbox(),
            rows,
        }));
    }

    Ok(None)
}

/// Part rows of the document's parts table; empty when no table qualifies
pub fn select_part_rows<S: TableSource + ?Sized>(source: &S) -> Result<Vec<PartRow>, BomError> {
    Ok(select_table(source)?
        .map(|selection| selection.rows)
        .unwrap_or_default())
}
