//! Reference-folder snapshots
//!
//! A [`FileIndex`] is a point-in-time listing of the regular files under a
//! directory. It is never refreshed in place; scan again to observe changes.

use crate::BomError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A file found during a scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    /// Full path as discovered
    pub path: PathBuf,
    /// File name without extension, case preserved
    pub stem: String,
    /// Extension without the leading dot, case preserved (empty if none)
    pub extension: String,
}

impl FileRecord {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_default();
        Self {
            path,
            stem,
            extension,
        }
    }

    /// Case-insensitive extension check. Accepts `"pdf"` or `".pdf"`.
    pub fn has_extension(&self, ext: &str) -> bool {
        let ext = ext.trim_start_matches('.');
        !ext.is_empty() && self.extension.eq_ignore_ascii_case(ext)
    }

    /// File name including extension
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// Immutable listing of the files under one directory
#[derive(Debug, Clone)]
pub struct FileIndex {
    root: PathBuf,
    recursive: bool,
    files: Vec<FileRecord>,
}

impl FileIndex {
    /// Scan `directory` for regular files.
    ///
    /// With `recursive` every subdirectory is walked, otherwise only the
    /// immediate children are listed. Entries are ordered by file name within
    /// each directory so repeated scans of an unchanged tree are identical.
    pub fn scan<P: AsRef<Path>>(directory: P, recursive: bool) -> Result<Self, BomError> {
        let root = directory.as_ref();
        if !root.exists() {
            return Err(BomError::NotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(BomError::NotADirectory(root.to_path_buf()));
        }

        let mut walker = WalkDir::new(root).sort_by_file_name();
        if !recursive {
            walker = walker.max_depth(1);
        }

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("skipping unreadable entry under {}: {}", root.display(), e);
                    continue;
                }
            };
            // Links are not followed for recursion, but a link to a file counts
            if entry.path().is_file() {
                files.push(FileRecord::new(entry.into_path()));
            }
        }

        log::debug!(
            "scanned {} ({}): {} files",
            root.display(),
            if recursive { "recursive" } else { "flat" },
            files.len()
        );

        Ok(Self {
            root: root.to_path_buf(),
            recursive,
            files,
        })
    }

    /// Build a snapshot from an existing listing (no filesystem access)
    pub fn from_records(root: impl Into<PathBuf>, files: Vec<FileRecord>) -> Self {
        Self {
            root: root.into(),
            recursive: false,
            files,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_recursive(&self) -> bool {
        self.recursive
    }

    pub fn files(&self) -> &[FileRecord] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Scan a directory and return its file records
pub fn scan<P: AsRef<Path>>(directory: P, recursive: bool) -> Result<Vec<FileRecord>, BomError> {
    FileIndex::scan(directory, recursive).map(|index| index.files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_file_record_parts() {
        let record = FileRecord::new("/drawings/ABC-123_rev2.PDF");
        assert_eq!(record.stem, "ABC-123_rev2");
        assert_eq!(record.extension, "PDF");
        assert_eq!(record.file_name(), "ABC-123_rev2.PDF");
    }

    #[test]
    fn test_has_extension() {
        let record = FileRecord::new("part.IPT");
        assert!(record.has_extension("ipt"));
        assert!(record.has_extension(".ipt"));
        assert!(!record.has_extension("iam"));

        let bare = FileRecord::new("Makefile");
        assert_eq!(bare.extension, "");
        assert!(!bare.has_extension(""));
    }

    #[test]
    fn test_scan_empty_folder() {
        let dir = tempdir().unwrap();
        let index = FileIndex::scan(dir.path(), true).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn test_scan_recursive_and_flat() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("subdir");
        fs::create_dir(&sub).unwrap();
        fs::write(dir.path().join("file1.txt"), "").unwrap();
        fs::write(sub.join("file2.txt"), "").unwrap();

        let recursive = FileIndex::scan(dir.path(), true).unwrap();
        assert_eq!(recursive.len(), 2);
        assert!(recursive.is_recursive());

        let flat = FileIndex::scan(dir.path(), false).unwrap();
        assert_eq!(flat.len(), 1);
        assert_eq!(flat.files()[0].stem, "file1");
    }

    #[test]
    fn test_scan_lists_files_only() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("only_a_dir")).unwrap();
        let index = FileIndex::scan(dir.path(), false).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn test_scan_is_sorted() {
        let dir = tempdir().unwrap();
        for name in ["c.pdf", "a.pdf", "b.pdf"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        let stems: Vec<String> = scan(dir.path(), false)
            .unwrap()
            .into_iter()
            .map(|f| f.stem)
            .collect();
        assert_eq!(stems, vec!["a", "b", "c"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_lists_symlinked_files() {
        use std::os::unix::fs::symlink;

        let store = tempdir().unwrap();
        let target = store.path().join("drawing.pdf");
        fs::write(&target, "x").unwrap();

        let dir = tempdir().unwrap();
        symlink(&target, dir.path().join("ABC123.pdf")).unwrap();
        symlink(store.path().join("missing.pdf"), dir.path().join("dangling.pdf")).unwrap();

        let index = FileIndex::scan(dir.path(), true).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.files()[0].stem, "ABC123");
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_does_not_descend_linked_dirs() {
        use std::os::unix::fs::symlink;

        let store = tempdir().unwrap();
        fs::write(store.path().join("inner.pdf"), "x").unwrap();

        let dir = tempdir().unwrap();
        symlink(store.path(), dir.path().join("linked")).unwrap();

        let index = FileIndex::scan(dir.path(), true).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn test_scan_errors() {
        let missing = FileIndex::scan("/nonexistent/path/12345", true);
        assert!(matches!(missing, Err(BomError::NotFound(_))));

        let dir = tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        fs::write(&file, "x").unwrap();
        let not_dir = FileIndex::scan(&file, true);
        assert!(matches!(not_dir, Err(BomError::NotADirectory(_))));
    }
}
