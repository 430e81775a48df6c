//! Table detection over positioned text
//!
//! Drawing sheets carry their parts list, title block and revision table as
//! grids of short text items. Items are split into vertical regions at large
//! gaps, then each region is clustered into columns (by X) and rows (by Y).
//! Grids with enough structure become [`Table`]s.

use crate::extractor::{extract_pages, extract_pages_mem, PageText, TextItem};
use crate::header::Grid;
use crate::selector::{BBox, CandidateTable, TableSource};
use crate::BomError;
use std::path::Path;

/// Thresholds for grid detection (all distances in PDF points)
#[derive(Debug, Clone)]
pub struct GridConfig {
    /// Vertical gap that separates two table regions
    pub region_gap: f32,
    /// Items whose baselines differ by less than this share a row
    pub row_tolerance: f32,
    /// Lower bound of the adaptive column clustering distance
    pub min_column_gap: f32,
    /// Upper bound of the adaptive column clustering distance
    pub max_column_gap: f32,
    pub min_columns: usize,
    pub max_columns: usize,
    pub min_rows: usize,
    /// Regions with fewer items are ignored
    pub min_region_items: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            region_gap: 30.0,
            row_tolerance: 10.0,
            min_column_gap: 25.0,
            max_column_gap: 50.0,
            min_columns: 2,
            max_columns: 15,
            min_rows: 2,
            min_region_items: 4,
        }
    }
}

/// A detected table
#[derive(Debug, Clone)]
pub struct Table {
    /// Page the table was found on (0-based)
    pub page_index: usize,
    /// Bounds in top-left-origin page space
    pub bbox: BBox,
    /// Column centers (x positions, ascending)
    pub columns: Vec<f32>,
    /// Row centers (y positions, descending, i.e. top row first)
    pub rows: Vec<f32>,
    /// Cell contents indexed by (row, col)
    pub cells: Vec<Vec<String>>,
}

impl CandidateTable for Table {
    fn bbox(&self) -> BBox {
        self.bbox
    }

    fn extract(&self) -> Grid {
        self.cells
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| (!cell.is_empty()).then(|| cell.clone()))
                    .collect()
            })
            .collect()
    }
}

/// Detect tables on one page
pub fn detect_tables(page: &PageText, config: &GridConfig) -> Vec<Table> {
    let items = &page.items;
    if items.len() < config.min_region_items {
        return vec![];
    }

    let mut tables = Vec::new();
    for (y_min, y_max) in find_table_regions(items, config) {
        let region: Vec<&TextItem> = items
            .iter()
            .filter(|item| item.y >= y_min && item.y <= y_max)
            .collect();

        if let Some(table) = detect_table_in_region(&region, page, config) {
            tables.push(table);
        }
    }

    log::trace!("page {}: {} tables", page.index, tables.len());
    tables
}

/// Find Y-regions that likely contain tables
fn find_table_regions(items: &[TextItem], config: &GridConfig) -> Vec<(f32, f32)> {
    let mut y_positions: Vec<f32> = items.iter().map(|i| i.y).collect();
    y_positions.sort_by(|a, b| a.total_cmp(b));

    let Some(&first) = y_positions.first() else {
        return vec![];
    };

    let mut regions = Vec::new();
    let mut region_start = first;
    let mut region_end = first;
    let mut region_count = 1;

    for &y in &y_positions[1..] {
        if y - region_end > config.region_gap {
            if region_count >= config.min_region_items {
                regions.push((region_start - 5.0, region_end + 5.0));
            }
            region_start = y;
            region_count = 0;
        }
        region_end = y;
        region_count += 1;
    }

    if region_count >= config.min_region_items {
        regions.push((region_start - 5.0, region_end + 5.0));
    }

    regions
}

fn detect_table_in_region(
    items: &[&TextItem],
    page: &PageText,
    config: &GridConfig,
) -> Option<Table> {
    let (columns, col_threshold) = find_column_boundaries(items, config);
    if columns.len() < config.min_columns || columns.len() > config.max_columns {
        return None;
    }

    let rows = find_row_boundaries(items, config.row_tolerance);
    if rows.len() < config.min_rows {
        return None;
    }

    let mut cell_items: Vec<Vec<Vec<&TextItem>>> =
        vec![vec![Vec::new(); columns.len()]; rows.len()];
    let mut placed: Vec<&TextItem> = Vec::new();

    for &item in items {
        let col = find_column_index(&columns, item.x, col_threshold);
        let row = find_row_index(&rows, item.y, config.row_tolerance * 1.5);
        if let (Some(col), Some(row)) = (col, row) {
            cell_items[row][col].push(item);
            placed.push(item);
        }
    }

    let cells: Vec<Vec<String>> = cell_items
        .iter_mut()
        .map(|row| row.iter_mut().map(|cell| join_cell_items(cell)).collect())
        .collect();

    // Real grids fill several columns on a fair share of their rows
    let multi_cell_rows = cells
        .iter()
        .filter(|row| row.iter().filter(|c| !c.is_empty()).count() >= 2)
        .count();
    if multi_cell_rows < (rows.len() / 3).max(1) {
        return None;
    }

    Some(Table {
        page_index: page.index,
        bbox: bounding_box(&placed, page.height)?,
        columns,
        rows,
        cells,
    })
}

/// Find column centers by clustering X positions.
///
/// Returns the centers and the clustering distance used.
fn find_column_boundaries(items: &[&TextItem], config: &GridConfig) -> (Vec<f32>, f32) {
    let mut x_positions: Vec<f32> = items.iter().map(|i| i.x).collect();
    x_positions.sort_by(|a, b| a.total_cmp(b));

    let (Some(&first), Some(&last)) = (x_positions.first(), x_positions.last()) else {
        return (vec![], config.max_column_gap);
    };

    // Dense grids cluster tighter than sparse ones
    let avg_gap = if x_positions.len() > 1 {
        (last - first) / (x_positions.len() - 1) as f32
    } else {
        config.max_column_gap
    };
    let threshold = avg_gap.clamp(config.min_column_gap, config.max_column_gap);

    let mut columns = Vec::new();
    let mut cluster: Vec<f32> = vec![first];
    for &x in &x_positions[1..] {
        let center = cluster.iter().sum::<f32>() / cluster.len() as f32;
        if x - center > threshold {
            columns.push(center);
            cluster = vec![x];
        } else {
            cluster.push(x);
        }
    }
    columns.push(cluster.iter().sum::<f32>() / cluster.len() as f32);

    // Each column needs several items; lone stragglers are labels or notes
    let min_items_per_col = (items.len() / columns.len().max(1) / 4).max(2);
    let columns = columns
        .into_iter()
        .filter(|&col_x| {
            items
                .iter()
                .filter(|i| (i.x - col_x).abs() < threshold)
                .count()
                >= min_items_per_col
        })
        .collect();

    (columns, threshold)
}

/// Find row centers by clustering Y positions (descending: top row first)
fn find_row_boundaries(items: &[&TextItem], tolerance: f32) -> Vec<f32> {
    let mut y_positions: Vec<f32> = items.iter().map(|i| i.y).collect();
    y_positions.sort_by(|a, b| b.total_cmp(a));

    let Some(&first) = y_positions.first() else {
        return vec![];
    };

    let mut rows = Vec::new();
    let mut cluster: Vec<f32> = vec![first];
    for &y in &y_positions[1..] {
        let center = cluster.iter().sum::<f32>() / cluster.len() as f32;
        if center - y > tolerance {
            rows.push(center);
            cluster = vec![y];
        } else {
            cluster.push(y);
        }
    }
    rows.push(cluster.iter().sum::<f32>() / cluster.len() as f32);

    rows
}

/// Nearest column to `x`, if within `threshold`
fn find_column_index(columns: &[f32], x: f32, threshold: f32) -> Option<usize> {
    nearest(columns, x).filter(|&idx| (x - columns[idx]).abs() < threshold)
}

/// Nearest row to `y`, if within `threshold`
fn find_row_index(rows: &[f32], y: f32, threshold: f32) -> Option<usize> {
    nearest(rows, y).filter(|&idx| (y - rows[idx]).abs() < threshold)
}

fn nearest(centers: &[f32], value: f32) -> Option<usize> {
    centers
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (value - **a).abs().total_cmp(&(value - **b).abs()))
        .map(|(idx, _)| idx)
}

/// Join the items of one cell left to right
fn join_cell_items(items: &mut [&TextItem]) -> String {
    items.sort_by(|a, b| a.x.total_cmp(&b.x));

    let mut result = String::new();
    for item in items.iter() {
        let text = item.text.trim();
        if text.is_empty() {
            continue;
        }
        // Hyphenated fragments join without a space
        if !result.is_empty() && !result.ends_with('-') && !text.starts_with('-') {
            result.push(' ');
        }
        result.push_str(text);
    }
    result
}

/// Bounds of the placed items, flipped to top-left origin
fn bounding_box(items: &[&TextItem], page_height: f32) -> Option<BBox> {
    if items.is_empty() {
        return None;
    }

    let x0 = items.iter().map(|i| i.x).fold(f32::INFINITY, f32::min);
    let x1 = items
        .iter()
        .map(|i| i.x + i.width)
        .fold(f32::NEG_INFINITY, f32::max);
    let top = items
        .iter()
        .map(|i| i.y + i.height)
        .fold(f32::NEG_INFINITY, f32::max);
    let bottom = items.iter().map(|i| i.y).fold(f32::INFINITY, f32::min);

    Some(BBox::new(x0, page_height - top, x1, page_height - bottom))
}

/// Table detection over a whole PDF document
#[derive(Debug, Clone, Default)]
pub struct PdfTables {
    pages: Vec<PageText>,
    config: GridConfig,
}

impl PdfTables {
    /// Load and extract a PDF file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, BomError> {
        Ok(Self::from_pages(extract_pages(path)?))
    }

    /// Load and extract a PDF held in memory
    pub fn load_mem(buffer: &[u8]) -> Result<Self, BomError> {
        Ok(Self::from_pages(extract_pages_mem(buffer)?))
    }

    pub fn from_pages(pages: Vec<PageText>) -> Self {
        Self {
            pages,
            config: GridConfig::default(),
        }
    }

    pub fn with_config(mut self, config: GridConfig) -> Self {
        self.config = config;
        self
    }

    pub fn pages(&self) -> &[PageText] {
        &self.pages
    }
}

impl TableSource for PdfTables {
    type Table = Table;

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn find_tables(&self, page_index: usize) -> Result<Vec<Table>, BomError> {
        Ok(self
            .pages
            .get(page_index)
            .map(|page| detect_tables(page, &self.config))
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::select_part_rows;

    fn make_item(text: &str, x: f32, y: f32, font_size: f32) -> TextItem {
        TextItem {
            text: text.into(),
            x,
            y,
            width: text.len() as f32 * font_size * 0.5,
            height: font_size,
            font: "F1".into(),
            font_size,
            page: 1,
        }
    }

    fn page(index: usize, items: Vec<TextItem>) -> PageText {
        PageText {
            index,
            width: 612.0,
            height: 792.0,
            items,
        }
    }

    /// Rows of cells laid out at fixed column positions, top row first
    fn grid_items(rows: &[&[&str]], x0: f32, y_top: f32) -> Vec<TextItem> {
        let mut items = Vec::new();
        for (r, row) in rows.iter().enumerate() {
            for (c, text) in row.iter().enumerate() {
                if !text.is_empty() {
                    items.push(make_item(text, x0 + c as f32 * 90.0, y_top - r as f32 * 20.0, 8.0));
                }
            }
        }
        items
    }

    #[test]
    fn test_table_detection() {
        let items = vec![
            make_item("Subject", 100.0, 500.0, 8.0),
            make_item("Q1", 200.0, 500.0, 8.0),
            make_item("Q2", 280.0, 500.0, 8.0),
            make_item("Q3", 360.0, 500.0, 8.0),
            make_item("Math", 100.0, 480.0, 8.0),
            make_item("9.0", 200.0, 480.0, 8.0),
            make_item("8.5", 280.0, 480.0, 8.0),
            make_item("9.5", 360.0, 480.0, 8.0),
            make_item("Science", 100.0, 460.0, 8.0),
            make_item("8.0", 200.0, 460.0, 8.0),
            make_item("9.0", 280.0, 460.0, 8.0),
            make_item("8.5", 360.0, 460.0, 8.0),
            make_item("English", 100.0, 440.0, 8.0),
            make_item("9.5", 200.0, 440.0, 8.0),
            make_item("9.0", 280.0, 440.0, 8.0),
            make_item("9.5", 360.0, 440.0, 8.0),
        ];

        let tables = detect_tables(&page(0, items), &GridConfig::default());
        assert_eq!(tables.len(), 1);
        let table = &tables[0];
        assert_eq!(table.columns.len(), 4);
        assert_eq!(table.rows.len(), 4);
        assert_eq!(table.cells[0][0], "Subject");
        assert_eq!(table.cells[3][3], "9.5");

        // 792 - (500 + 8) and 792 - 440
        assert_eq!(table.bbox.x0, 100.0);
        assert_eq!(table.bbox.y0, 284.0);
        assert_eq!(table.bbox.y1, 352.0);
        assert!(table.bbox.x1 > 360.0);
    }

    #[test]
    fn test_separate_regions() {
        let mut items = grid_items(&[&["Rev", "Date"], &["A", "2024"], &["B", "2025"]], 50.0, 700.0);
        items.extend(grid_items(
            &[&["1", "AX-1", "Plate"], &["POS", "PART NUMBER", "TITLE"]],
            300.0,
            120.0,
        ));

        let tables = detect_tables(&page(0, items), &GridConfig::default());
        assert_eq!(tables.len(), 2);
        assert!(tables.iter().any(|t| t.columns.len() == 3));
    }

    #[test]
    fn test_single_line_not_a_table() {
        let items = vec![
            make_item("GENERAL", 100.0, 700.0, 10.0),
            make_item("TOLERANCES", 160.0, 700.0, 10.0),
            make_item("ISO", 240.0, 700.0, 10.0),
            make_item("2768-m", 280.0, 700.0, 10.0),
        ];
        assert!(detect_tables(&page(0, items), &GridConfig::default()).is_empty());
    }

    #[test]
    fn test_extract_marks_empty_cells_absent() {
        let table = Table {
            page_index: 0,
            bbox: BBox::default(),
            columns: vec![100.0, 200.0],
            rows: vec![500.0, 480.0],
            cells: vec![
                vec!["Name".into(), "PART NUMBER".into()],
                vec!["".into(), "ABC123".into()],
            ],
        };
        let grid = table.extract();
        assert_eq!(grid[1][0], None);
        assert_eq!(grid[1][1].as_deref(), Some("ABC123"));
    }

    #[test]
    fn test_join_cell_items() {
        let a = make_item("ABC-", 100.0, 500.0, 8.0);
        let b = make_item("123", 118.0, 500.0, 8.0);
        let c = make_item("Bracket", 60.0, 500.0, 8.0);
        let mut cell = vec![&a, &b];
        assert_eq!(join_cell_items(&mut cell), "ABC-123");
        let mut cell = vec![&a, &c];
        assert_eq!(join_cell_items(&mut cell), "Bracket ABC-");
    }

    #[test]
    fn test_pdf_tables_select_bottom_right_bom() {
        // Revision table top-left, parts list bottom-right with header at the bottom
        let mut items = grid_items(&[&["REV", "DATE"], &["A", "2024"], &["B", "2025"]], 40.0, 760.0);
        items.extend(grid_items(
            &[
                &["2", "BR-200", "Bracket", "2"],
                &["1", "PL-100", "Plate", "1"],
                &["POS", "PART NUMBER", "TITLE", "QTY"],
            ],
            250.0,
            140.0,
        ));

        let source = PdfTables::from_pages(vec![page(0, items)]);
        assert_eq!(source.page_count(), 1);

        let rows = select_part_rows(&source).unwrap();
        let pns: Vec<&str> = rows.iter().map(|r| r.part_number.as_str()).collect();
        assert_eq!(pns, vec!["BR-200", "PL-100"]);
        assert_eq!(rows[0].title, "Bracket");
        assert_eq!(rows[1].qty, "1");
    }

    #[test]
    fn test_find_tables_out_of_range_page() {
        let source = PdfTables::default();
        assert!(source.find_tables(3).unwrap().is_empty());
    }
}
