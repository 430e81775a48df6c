//! Resolving part numbers to drawing and model files

use crate::files::{FileIndex, FileRecord};
use crate::matcher::{find_matching_files, MatchMode};
use crate::revision::collapse_to_latest_revision;
use crate::BomError;
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::Path;

/// Marker suffix for parts that need no drawing, only a model
pub const NO_PDF_MARKER: char = '*';

/// Lookup settings
#[derive(Debug, Clone)]
pub struct LookupOptions {
    /// Filename comparison (default: contains)
    pub match_mode: MatchMode,
    /// Walk subdirectories of the reference folder (default: true)
    pub recursive: bool,
    /// Drawing file extensions (default: pdf)
    pub pdf_extensions: Vec<String>,
    /// 3D model extensions (default: Inventor part and assembly); an empty
    /// list matches files of any type
    pub model_extensions: Vec<String>,
}

impl Default for LookupOptions {
    fn default() -> Self {
        Self {
            match_mode: MatchMode::Contains,
            recursive: true,
            pdf_extensions: vec!["pdf".into()],
            model_extensions: vec!["ipt".into(), "iam".into()],
        }
    }
}

/// Summary of a lookup, derived from the matched files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStatus {
    NoPdfRequired,
    Pdfs(usize),
    NoPdfMatch,
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStatus::NoPdfRequired => write!(f, "No PDF required"),
            MatchStatus::Pdfs(n) => write!(f, "{} PDF(s)", n),
            MatchStatus::NoPdfMatch => write!(f, "No PDF match"),
        }
    }
}

impl Serialize for MatchStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Files found for one part number
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub pdf_files: Vec<FileRecord>,
    pub model_files: Vec<FileRecord>,
    pub no_pdf_required: bool,
    pub status: MatchStatus,
}

impl MatchResult {
    fn new(pdf_files: Vec<FileRecord>, model_files: Vec<FileRecord>, no_pdf_required: bool) -> Self {
        let status = if no_pdf_required {
            MatchStatus::NoPdfRequired
        } else if pdf_files.is_empty() {
            MatchStatus::NoPdfMatch
        } else {
            MatchStatus::Pdfs(pdf_files.len())
        };
        Self {
            pdf_files,
            model_files,
            no_pdf_required,
            status,
        }
    }
}

fn owned(files: Vec<&FileRecord>) -> Vec<FileRecord> {
    files.into_iter().cloned().collect()
}

/// Resolve a single part number against a file listing.
///
/// A trailing `*` means no drawing is expected: the drawing search is
/// skipped and only models are looked up. Otherwise drawings are collapsed
/// to their latest revision; models are never collapsed.
pub fn lookup_part_number(
    part_number: &str,
    files: &[FileRecord],
    options: &LookupOptions,
) -> MatchResult {
    let mode = options.match_mode;
    let model_files = owned(find_matching_files(
        part_number,
        files,
        mode,
        Some(options.model_extensions.as_slice()),
    ));

    if part_number.trim_end().ends_with(NO_PDF_MARKER) {
        return MatchResult::new(Vec::new(), model_files, true);
    }

    let pdf_matches = find_matching_files(
        part_number,
        files,
        mode,
        Some(options.pdf_extensions.as_slice()),
    );
    let pdf_files = owned(collapse_to_latest_revision(&pdf_matches));

    MatchResult::new(pdf_files, model_files, false)
}

/// Resolve many part numbers against one snapshot, keeping their order
pub fn lookup_in_index<S: AsRef<str>>(
    part_numbers: &[S],
    index: &FileIndex,
    options: &LookupOptions,
) -> IndexMap<String, MatchResult> {
    part_numbers
        .iter()
        .map(|pn| {
            let pn = pn.as_ref();
            (pn.to_string(), lookup_part_number(pn, index.files(), options))
        })
        .collect()
}

/// Scan `folder` once and resolve every part number against it
pub fn lookup_part_numbers<S: AsRef<str>, P: AsRef<Path>>(
    part_numbers: &[S],
    folder: P,
    options: &LookupOptions,
) -> Result<IndexMap<String, MatchResult>, BomError> {
    let index = FileIndex::scan(folder, options.recursive)?;
    Ok(lookup_in_index(part_numbers, &index, options))
}
