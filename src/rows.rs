//! Structured rows from a located parts table
//!
//! Engineering drawings usually print the parts list with its header at the
//! bottom and the data stacked above it, but tables with a conventional top
//! header show up as well. Rows above the header are tried first; when none of
//! them carries a usable part number the rows below are used instead.

use crate::header::{cell_value, find_header_row, is_header_like, ColumnMap, Field};
use serde::Serialize;

/// One parts-table entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartRow {
    pub part_number: String,
    pub title: String,
    pub description: String,
    pub material: String,
    pub mass: String,
    pub qty: String,
}

impl PartRow {
    fn from_row(row: &[Option<String>], part_number: String, columns: &ColumnMap) -> Self {
        Self {
            part_number,
            title: cell_value(row, columns.get(Field::Title)),
            description: cell_value(row, columns.get(Field::Description)),
            material: cell_value(row, columns.get(Field::Material)),
            mass: cell_value(row, columns.get(Field::Mass)),
            qty: cell_value(row, columns.get(Field::Qty)),
        }
    }
}

/// Usable part number of a row, if it has one
fn part_number_of(row: &[Option<String>], columns: &ColumnMap) -> Option<String> {
    let value = cell_value(row, Some(columns.part_number()));
    if value.is_empty() || is_header_like(&value) {
        None
    } else {
        Some(value)
    }
}

/// Build rows once the header position is known
pub fn extract_rows_with_header(
    table: &[Vec<Option<String>>],
    header_row: usize,
    columns: &ColumnMap,
) -> Vec<PartRow> {
    let above = &table[..header_row.min(table.len())];
    let data_rows = if above.iter().any(|row| part_number_of(row, columns).is_some()) {
        above
    } else {
        table.get(header_row + 1..).unwrap_or(&[])
    };

    data_rows
        .iter()
        .filter_map(|row| match part_number_of(row, columns) {
            Some(pn) => Some(PartRow::from_row(row, pn, columns)),
            None => {
                log::trace!("skipping row without part number: {:?}", row);
                None
            }
        })
        .collect()
}

/// Extract part rows from a raw table grid.
///
/// Returns an empty list when no header row names a part-number column.
pub fn extract_part_rows_from_table(table: &[Vec<Option<String>>]) -> Vec<PartRow> {
    if table.len() < 2 {
        return Vec::new();
    }

    let Some((header_row, pn_column)) = find_header_row(table) else {
        return Vec::new();
    };

    let columns = ColumnMap::resolve(&table[header_row], pn_column);
    extract_rows_with_header(table, header_row, &columns)
}

/// Part numbers only, in table order
pub fn extract_part_numbers_from_table(table: &[Vec<Option<String>>]) -> Vec<String> {
    extract_part_rows_from_table(table)
        .into_iter()
        .map(|row| row.part_number)
        .collect()
}
