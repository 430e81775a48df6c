//! Revision handling for drawing files
//!
//! Drawings are often kept as `PART_rev1.pdf`, `PART_rev2.pdf`, ... and only
//! the latest one is of interest. Files are grouped by their stem with the
//! revision token removed; a group that carries any revision number collapses
//! to its single highest revision.

use crate::files::FileRecord;
use crate::normalize::normalize;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;

static REVISION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)_r(?:ev)?(\d+)").unwrap());

/// Revision number carried by a `_rev<N>` or `_r<N>` token, if any
pub fn extract_revision(stem: &str) -> Option<u64> {
    let digits = revision_digits(stem)?;
    if digits.is_empty() {
        return Some(0);
    }
    match digits.parse() {
        Ok(rev) => Some(rev),
        Err(e) => {
            log::debug!("revision in {:?} not representable: {}", stem, e);
            None
        }
    }
}

/// Digits of the revision token without leading zeros
fn revision_digits(stem: &str) -> Option<&str> {
    REVISION_RE
        .captures(stem)
        .and_then(|caps| caps.get(1))
        .map(|digits| digits.as_str().trim_start_matches('0'))
}

/// Numeric order of two zero-stripped digit strings, at any length
fn compare_digits(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Grouping key: the stem without revision tokens, normalized
pub fn base_key(stem: &str) -> String {
    normalize(&REVISION_RE.replace_all(stem, ""))
}

/// Reduce each revision group to its latest member.
///
/// Groups without any parsable revision are kept whole. On equal maximum
/// revisions the lexicographically greatest path wins. Groups appear in the
/// order of their first member.
pub fn collapse_to_latest_revision<'a>(files: &[&'a FileRecord]) -> Vec<&'a FileRecord> {
    let mut groups: IndexMap<String, Vec<(Option<&'a str>, &'a FileRecord)>> = IndexMap::new();
    for &file in files {
        groups
            .entry(base_key(&file.stem))
            .or_default()
            .push((revision_digits(&file.stem), file));
    }

    let mut result = Vec::with_capacity(groups.len());
    for (key, members) in groups {
        let latest = members
            .iter()
            .filter_map(|(rev, file)| rev.map(|r| (r, *file)))
            .max_by(|(ra, fa), (rb, fb)| {
                compare_digits(ra, rb).then_with(|| fa.path.cmp(&fb.path))
            });

        match latest {
            Some((rev, file)) => {
                if members.len() > 1 {
                    log::trace!(
                        "group {}: keeping rev {:?} ({}) of {} files",
                        key,
                        rev,
                        file.path.display(),
                        members.len()
                    );
                }
                result.push(file);
            }
            None => result.extend(members.into_iter().map(|(_, file)| file)),
        }
    }

    result
}
