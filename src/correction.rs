/// A single source-level edit: replace byte range [start..end) with replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correction {
    /// Byte offset, inclusive.
    pub start: usize,
    /// Byte offset, exclusive.
    pub end: usize,
    /// Replacement text (empty string = deletion).
    pub replacement: String,
    /// Cop that produced this correction.
    pub cop_name: &'static str,
    /// Registry index for deterministic conflict resolution (lower wins).
    pub cop_index: usize,
}

impl Correction {
    /// A pure deletion of `[start..end)`.
    pub fn delete(start: usize, end: usize, cop_name: &'static str) -> Self {
        Self {
            start,
            end,
            replacement: String::new(),
            cop_name,
            cop_index: 0,
        }
    }
}

/// A set of non-overlapping corrections, sorted by start offset.
///
/// Overlapping corrections are resolved by dropping the later one. When two
/// corrections start at the same offset, the one from the earlier cop in
/// registry order wins.
pub struct CorrectionSet {
    corrections: Vec<Correction>,
}

impl CorrectionSet {
    pub fn from_vec(mut raw: Vec<Correction>) -> Self {
        raw.sort_by(|a, b| a.start.cmp(&b.start).then(a.cop_index.cmp(&b.cop_index)));

        let mut accepted: Vec<Correction> = Vec::with_capacity(raw.len());
        for c in raw {
            if let Some(last) = accepted.last() {
                if c.start < last.end {
                    continue;
                }
            }
            accepted.push(c);
        }

        Self {
            corrections: accepted,
        }
    }

    /// Apply corrections to source bytes in a single linear pass.
    pub fn apply(&self, source: &[u8]) -> Vec<u8> {
        let mut result = Vec::with_capacity(source.len());
        let mut cursor = 0;

        for c in &self.corrections {
            if c.start > cursor {
                result.extend_from_slice(&source[cursor..c.start]);
            }
            result.extend_from_slice(c.replacement.as_bytes());
            cursor = c.end;
        }

        if cursor < source.len() {
            result.extend_from_slice(&source[cursor..]);
        }

        result
    }

    pub fn is_empty(&self) -> bool {
        self.corrections.is_empty()
    }

    pub fn len(&self) -> usize {
        self.corrections.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn correction(start: usize, end: usize, replacement: &str, cop_index: usize) -> Correction {
        Correction {
            start,
            end,
            replacement: replacement.to_string(),
            cop_name: "Test/Cop",
            cop_index,
        }
    }

    #[test]
    fn empty_corrections_returns_source_unchanged() {
        let source = b"x = 1\n\ny = 2\n";
        let cs = CorrectionSet::from_vec(vec![]);
        assert_eq!(cs.apply(source), source.to_vec());
        assert!(cs.is_empty());
    }

    #[test]
    fn deleting_an_excess_blank_line() {
        // "test = 5\n\n\ntop\n": the second blank line starts at byte 10
        let source = b"test = 5\n\n\ntop\n";
        let cs = CorrectionSet::from_vec(vec![Correction::delete(10, 11, "Layout/EmptyLines")]);
        assert_eq!(cs.apply(source), b"test = 5\n\ntop\n");
        assert_eq!(cs.len(), 1);
    }

    #[test]
    fn deleting_two_separate_runs() {
        let source = b"a\n\n\nb\n\n\n\nc\n";
        let cs = CorrectionSet::from_vec(vec![
            Correction::delete(7, 9, "Layout/EmptyLines"),
            Correction::delete(3, 4, "Layout/EmptyLines"),
        ]);
        assert_eq!(cs.apply(source), b"a\n\nb\n\nc\n");
        assert_eq!(cs.len(), 2);
    }

    #[test]
    fn removing_a_duplicate_set_element() {
        // /[aba]/ -> /[ab]/
        let source = b"/[aba]/";
        let cs = CorrectionSet::from_vec(vec![correction(4, 5, "", 0)]);
        assert_eq!(cs.apply(source), b"/[ab]/");
    }

    #[test]
    fn overlapping_drops_second() {
        let source = b"abcdefgh";
        let cs = CorrectionSet::from_vec(vec![
            correction(2, 6, "XX", 0),
            correction(4, 8, "YY", 1),
        ]);
        assert_eq!(cs.apply(source), b"abXXgh");
        assert_eq!(cs.len(), 1);
    }

    #[test]
    fn same_start_cop_index_wins() {
        let source = b"abc";
        let cs = CorrectionSet::from_vec(vec![
            correction(0, 3, "LOSE", 5),
            correction(0, 3, "WIN", 1),
        ]);
        assert_eq!(cs.apply(source), b"WIN");
        assert_eq!(cs.len(), 1);
    }

    #[test]
    fn adjacent_non_overlapping() {
        let source = b"abcdef";
        let cs = CorrectionSet::from_vec(vec![correction(0, 3, "X", 0), correction(3, 6, "Y", 0)]);
        assert_eq!(cs.apply(source), b"XY");
        assert_eq!(cs.len(), 2);
    }

    #[test]
    fn insertion_at_end() {
        let source = b"abc";
        let cs = CorrectionSet::from_vec(vec![correction(3, 3, "\n", 0)]);
        assert_eq!(cs.apply(source), b"abc\n");
    }
}
