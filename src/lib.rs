//! Parts-list extraction from engineering drawings and part-number lookup
//!
//! This crate provides:
//! - Parts table (BOM) extraction from drawing PDFs, choosing the right
//!   table among everything detected on the sheets
//! - Header aliasing and row extraction for header-at-top and
//!   header-at-bottom tables
//! - Resolution of part numbers to drawing PDFs and 3D models in a reference
//!   folder, collapsing drawing revisions to the latest one

pub mod extractor;
pub mod files;
pub mod header;
pub mod lookup;
pub mod matcher;
pub mod normalize;
pub mod revision;
pub mod rows;
pub mod selector;
pub mod tables;

pub use files::{FileIndex, FileRecord};
pub use header::{find_header_row, is_header_like, ColumnMap, Field, Grid};
pub use lookup::{
    lookup_in_index, lookup_part_number, lookup_part_numbers, LookupOptions, MatchResult,
    MatchStatus,
};
pub use matcher::{find_matching_files, MatchMode};
pub use normalize::normalize;
pub use revision::{base_key, collapse_to_latest_revision, extract_revision};
pub use rows::{extract_part_rows_from_table, PartRow};
pub use selector::{select_part_rows, BBox, CandidateTable, GridTable, TableSource, PAGE_WEIGHT};
pub use tables::{GridConfig, PdfTables};

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Extract the parts list of a drawing PDF.
///
/// An empty result means no detected table carried a part-number header.
pub fn extract_part_rows<P: AsRef<Path>>(path: P) -> Result<Vec<PartRow>, BomError> {
    let source = PdfTables::load(path)?;
    select_part_rows(&source)
}

/// Extract the parts list of a drawing PDF held in memory
pub fn extract_part_rows_mem(buffer: &[u8]) -> Result<Vec<PartRow>, BomError> {
    let source = PdfTables::load_mem(buffer)?;
    select_part_rows(&source)
}

/// Part numbers of a drawing PDF, in table order
pub fn extract_part_numbers<P: AsRef<Path>>(path: P) -> Result<Vec<String>, BomError> {
    Ok(extract_part_rows(path)?
        .into_iter()
        .map(|row| row.part_number)
        .collect())
}

/// Extraction outcome for one document of a batch
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DocumentOutcome {
    /// Rows of the selected table (empty: no tables found)
    Rows { rows: Vec<PartRow> },
    /// The document could not be read
    Failed { error: String },
}

impl DocumentOutcome {
    pub fn rows(&self) -> &[PartRow] {
        match self {
            DocumentOutcome::Rows { rows } => rows,
            DocumentOutcome::Failed { .. } => &[],
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            DocumentOutcome::Rows { .. } => None,
            DocumentOutcome::Failed { error } => Some(error),
        }
    }
}

fn extract_outcome(path: &Path) -> DocumentOutcome {
    match extract_part_rows(path) {
        Ok(rows) => DocumentOutcome::Rows { rows },
        Err(e) => {
            log::warn!("extraction failed for {}: {}", path.display(), e);
            DocumentOutcome::Failed {
                error: e.to_string(),
            }
        }
    }
}

/// Extract several documents independently.
///
/// Documents are processed in parallel; a failure is recorded against its
/// own key and never affects the others. Keys are the paths as given, in
/// input order.
pub fn extract_batch<P: AsRef<Path> + Sync>(paths: &[P]) -> IndexMap<String, DocumentOutcome> {
    let outcomes: Vec<DocumentOutcome> = paths
        .par_iter()
        .map(|path| extract_outcome(path.as_ref()))
        .collect();

    paths
        .iter()
        .map(|path| path.as_ref().display().to_string())
        .zip(outcomes)
        .collect()
}

/// Extraction and lookup result for one document
#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub document: PathBuf,
    #[serde(flatten)]
    pub outcome: DocumentOutcome,
    /// Lookup per part number; empty when no reference folder was given
    pub matches: IndexMap<String, MatchResult>,
}

/// Full extract-and-match pass over a set of drawings.
///
/// The reference folder is scanned once up front and its errors are
/// returned immediately. Each document is then extracted independently and
/// its part numbers are resolved against the shared snapshot.
pub fn process_documents<P: AsRef<Path> + Sync>(
    paths: &[P],
    folder: Option<&Path>,
    options: &LookupOptions,
) -> Result<Vec<DocumentReport>, BomError> {
    let index = folder
        .map(|dir| FileIndex::scan(dir, options.recursive))
        .transpose()?;

    let reports = paths
        .par_iter()
        .map(|path| {
            let path = path.as_ref();
            let outcome = extract_outcome(path);
            let matches = match &index {
                Some(index) => {
                    let part_numbers: Vec<&str> = outcome
                        .rows()
                        .iter()
                        .map(|row| row.part_number.as_str())
                        .collect();
                    lookup_in_index(&part_numbers, index, options)
                }
                None => IndexMap::new(),
            };
            DocumentReport {
                document: path.to_path_buf(),
                outcome,
                matches,
            }
        })
        .collect();

    Ok(reports)
}

#[derive(Debug, thiserror::Error)]
pub enum BomError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("PDF is encrypted")]
    Encrypted,
}

impl From<lopdf::Error> for BomError {
    fn from(e: lopdf::Error) -> Self {
        BomError::Parse(e.to_string())
    }
}
