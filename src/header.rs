//! Header row location and column aliasing
//!
//! Parts tables label their columns inconsistently (`PART NO`, `P/N`,
//! `Part-Number`, ...). Each semantic [`Field`] carries a fixed set of
//! accepted spellings, compared after [`normalize`].

use crate::normalize::normalize;

/// A raw table: rows of optional text cells, rows may differ in length
pub type Grid = Vec<Vec<Option<String>>>;

/// Values that are column titles rather than data
const HEADER_KEYWORDS: &[&str] = &[
    "part",
    "number",
    "pos",
    "title",
    "description",
    "material",
    "mass",
    "qty",
    "quantity",
    "item",
];

/// Longer values are treated as notes or titles, never as part numbers
const MAX_DATA_LEN: usize = 50;

/// Semantic column of a parts table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    PartNumber,
    Title,
    Description,
    Material,
    Mass,
    Qty,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::PartNumber,
        Field::Title,
        Field::Description,
        Field::Material,
        Field::Mass,
        Field::Qty,
    ];

    /// Accepted normalized header spellings
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Field::PartNumber => &["partnumber", "partno", "pn", "part"],
            Field::Title => &["title", "name"],
            Field::Description => &["description", "desc"],
            Field::Material => &["material", "mat"],
            Field::Mass => &["mass", "weight", "wt"],
            Field::Qty => &["qty", "quantity", "count"],
        }
    }

    /// Canonical field name
    pub fn name(self) -> &'static str {
        match self {
            Field::PartNumber => "part_number",
            Field::Title => "title",
            Field::Description => "description",
            Field::Material => "material",
            Field::Mass => "mass",
            Field::Qty => "qty",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }

    fn matches(self, cell: Option<&str>) -> bool {
        let key = normalize(cell.unwrap_or(""));
        self.aliases().contains(&key.as_str())
    }
}

/// Column index per field within one header row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    columns: [Option<usize>; 6],
}

impl ColumnMap {
    /// Resolve every field against a single header row.
    ///
    /// `part_number_column` is the index already found by [`find_header_row`].
    pub fn resolve(header_row: &[Option<String>], part_number_column: usize) -> Self {
        let mut columns = [None; 6];
        for field in Field::ALL {
            columns[field.slot()] = match field {
                Field::PartNumber => Some(part_number_column),
                _ => find_column_index(header_row, field),
            };
        }
        Self { columns }
    }

    pub fn get(&self, field: Field) -> Option<usize> {
        self.columns[field.slot()]
    }

    pub fn part_number(&self) -> usize {
        self.columns[Field::PartNumber.slot()].unwrap_or_default()
    }
}

/// Index of the first cell in `row` that spells `field`
pub fn find_column_index(row: &[Option<String>], field: Field) -> Option<usize> {
    row.iter().position(|cell| field.matches(cell.as_deref()))
}

/// Locate the header row: the first row, top to bottom, with a cell naming
/// the part-number column.
///
/// Returns `(row_index, part_number_column)`.
pub fn find_header_row(table: &[Vec<Option<String>>]) -> Option<(usize, usize)> {
    table.iter().enumerate().find_map(|(row_idx, row)| {
        find_column_index(row, Field::PartNumber).map(|col_idx| (row_idx, col_idx))
    })
}

/// Whether a value is a column title or implausibly long for data
pub fn is_header_like(value: &str) -> bool {
    let value = value.trim().to_lowercase();
    HEADER_KEYWORDS.contains(&value.as_str()) || value.chars().count() > MAX_DATA_LEN
}

/// Trimmed text of a cell; empty when the column or cell is absent
pub fn cell_value(row: &[Option<String>], column: Option<usize>) -> String {
    column
        .and_then(|idx| row.get(idx))
        .and_then(|cell| cell.as_deref())
        .map(|text| text.trim().to_string())
        .unwrap_or_default()
}
