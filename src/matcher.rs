//! Part-number to filename matching

use crate::files::FileRecord;
use crate::normalize::normalize;
use std::fmt;
use std::str::FromStr;

/// How a normalized part number is compared with a normalized file stem.
///
/// For a fixed query and file set the result sets nest:
/// `Exact ⊆ StartsWith ⊆ Contains`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Stem equals the part number
    Exact,
    /// Stem starts with the part number
    StartsWith,
    /// Stem contains the part number anywhere
    #[default]
    Contains,
}

impl MatchMode {
    fn accepts(self, file_key: &str, query_key: &str) -> bool {
        match self {
            MatchMode::Exact => file_key == query_key,
            MatchMode::StartsWith => file_key.starts_with(query_key),
            MatchMode::Contains => file_key.contains(query_key),
        }
    }
}

impl FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exact" => Ok(MatchMode::Exact),
            "startswith" | "starts-with" | "prefix" => Ok(MatchMode::StartsWith),
            "contains" => Ok(MatchMode::Contains),
            _ => Err(format!(
                "Unknown match mode: {}. Use exact, startswith, or contains",
                s
            )),
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchMode::Exact => write!(f, "exact"),
            MatchMode::StartsWith => write!(f, "startswith"),
            MatchMode::Contains => write!(f, "contains"),
        }
    }
}

/// Strip the no-drawing marker and surrounding whitespace from a part number
pub fn clean_part_number(part_number: &str) -> &str {
    part_number.trim().trim_end_matches('*').trim()
}

/// Find the files whose stem relates to `part_number` under `mode`.
///
/// When `extensions` is given and non-empty, only files with one of those
/// extensions (case-insensitive) are considered. The output keeps the input
/// order.
pub fn find_matching_files<'a>(
    part_number: &str,
    files: &'a [FileRecord],
    mode: MatchMode,
    extensions: Option<&[String]>,
) -> Vec<&'a FileRecord> {
    let query_key = normalize(clean_part_number(part_number));

    files
        .iter()
        .filter(|file| match extensions {
            Some(exts) if !exts.is_empty() => exts.iter().any(|ext| file.has_extension(ext)),
            _ => true,
        })
        .filter(|file| mode.accepts(&normalize(&file.stem), &query_key))
        .collect()
}
