//! Text canonicalization shared by header matching and filename matching

/// Canonicalize text for comparison: lowercase, then drop every space,
/// hyphen and underscore.
///
/// Header aliases compare the result for equality, the matcher compares it
/// with prefix/substring semantics.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase() {
        assert_eq!(normalize("ABC123"), "abc123");
    }

    #[test]
    fn test_removes_separators() {
        assert_eq!(normalize("ABC 123"), "abc123");
        assert_eq!(normalize("ABC-123"), "abc123");
        assert_eq!(normalize("ABC_123"), "abc123");
        assert_eq!(normalize("ABC - 123_XYZ"), "abc123xyz");
    }

    #[test]
    fn test_header_spellings_converge() {
        assert_eq!(normalize("PART-NUMBER"), "partnumber");
        assert_eq!(normalize("Part Number"), "partnumber");
        assert_eq!(normalize("PART  NUMBER"), "partnumber");
        assert_eq!(normalize("part_number"), "partnumber");
    }

    #[test]
    fn test_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" -_ "), "");
    }
}
