use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// A Ruby source file held in memory together with its line index.
#[derive(Debug)]
pub struct SourceFile {
    pub path: PathBuf,
    pub content: Vec<u8>,
    /// Byte offsets where each line starts (0-indexed into content)
    line_starts: Vec<usize>,
}

impl SourceFile {
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        Ok(Self::from_vec(path.to_path_buf(), content))
    }

    /// Create a SourceFile from a string, using the given path for display purposes.
    pub fn from_string(path: PathBuf, content: String) -> Self {
        Self::from_vec(path, content.into_bytes())
    }

    pub fn from_vec(path: PathBuf, content: Vec<u8>) -> Self {
        let line_starts = compute_line_starts(&content);
        Self {
            path,
            content,
            line_starts,
        }
    }

    /// Create a SourceFile from raw bytes (for testing).
    #[cfg(test)]
    pub fn from_bytes(path: &str, content: Vec<u8>) -> Self {
        Self::from_vec(PathBuf::from(path), content)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.content
    }

    pub fn path_str(&self) -> &str {
        self.path.to_str().unwrap_or("<non-utf8 path>")
    }

    /// Returns an iterator over lines as byte slices (without newline terminators).
    pub fn lines(&self) -> impl Iterator<Item = &[u8]> {
        self.content.split(|&b| b == b'\n')
    }

    /// Number of lines that hold content. A trailing newline does not open a
    /// new line.
    pub fn line_count(&self) -> usize {
        if self.content.is_empty() {
            0
        } else {
            self.line_starts.len()
        }
    }

    /// The bytes of a 1-indexed line, without its newline terminator.
    pub fn line(&self, line: usize) -> Option<&[u8]> {
        if line == 0 || line > self.line_count() {
            return None;
        }
        let start = self.line_starts[line - 1];
        let end = self.content[start..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(self.content.len(), |p| start + p);
        Some(&self.content[start..end])
    }

    /// Whether a 1-indexed line contains only spaces, tabs or a carriage
    /// return. Lines past the end of the file count as blank.
    pub fn is_blank_line(&self, line: usize) -> bool {
        self.line(line)
            .is_none_or(|bytes| bytes.iter().all(|&b| b == b' ' || b == b'\t' || b == b'\r'))
    }

    /// Byte offset where a 1-indexed line starts. One past the last line
    /// resolves to the end of the content.
    pub fn line_start(&self, line: usize) -> Option<usize> {
        if line == 0 {
            return None;
        }
        match self.line_starts.get(line - 1) {
            Some(&start) => Some(start),
            None if line == self.line_starts.len() + 1 => Some(self.content.len()),
            None => None,
        }
    }

    /// 1-indexed line containing the given byte offset.
    pub fn line_of(&self, byte_offset: usize) -> usize {
        self.offset_to_line_col(byte_offset).0
    }

    /// Convert a byte offset into a (1-indexed line, 0-indexed column) pair.
    /// Column is a character offset (UTF-8 codepoint count) within the line.
    pub fn offset_to_line_col(&self, byte_offset: usize) -> (usize, usize) {
        let byte_offset = byte_offset.min(self.content.len());
        let line_idx = match self.line_starts.binary_search(&byte_offset) {
            Ok(idx) => idx,
            Err(idx) => idx.saturating_sub(1),
        };
        let line_bytes = &self.content[self.line_starts[line_idx]..byte_offset];
        // Count bytes that are not UTF-8 continuation bytes (0x80..0xBF).
        let col = line_bytes.iter().filter(|&&b| (b & 0xC0) != 0x80).count();
        (line_idx + 1, col)
    }
}

fn compute_line_starts(content: &[u8]) -> Vec<usize> {
    let mut starts = vec![0];
    for (i, &byte) in content.iter().enumerate() {
        if byte == b'\n' && i + 1 < content.len() {
            starts.push(i + 1);
        }
    }
    starts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(s: &str) -> SourceFile {
        SourceFile::from_bytes("test.rb", s.as_bytes().to_vec())
    }

    #[test]
    fn line_starts_multiple_lines() {
        let sf = source("abc\ndef\nghi");
        assert_eq!(sf.line_starts, vec![0, 4, 8]);
    }

    #[test]
    fn line_starts_trailing_newline() {
        let sf = source("abc\n");
        assert_eq!(sf.line_starts, vec![0]);
        assert_eq!(sf.line_count(), 1);
    }

    #[test]
    fn empty_file_has_no_lines() {
        let sf = source("");
        assert_eq!(sf.line_count(), 0);
        assert_eq!(sf.line(1), None);
    }

    #[test]
    fn line_returns_bytes_without_newline() {
        let sf = source("test = 5\n\n\ntop\n");
        assert_eq!(sf.line(1), Some(b"test = 5".as_slice()));
        assert_eq!(sf.line(2), Some(b"".as_slice()));
        assert_eq!(sf.line(4), Some(b"top".as_slice()));
        assert_eq!(sf.line(5), None);
    }

    #[test]
    fn blank_lines_allow_whitespace() {
        let sf = source("x\n  \t\n\r\ny\n");
        assert!(!sf.is_blank_line(1));
        assert!(sf.is_blank_line(2));
        assert!(sf.is_blank_line(3));
        assert!(!sf.is_blank_line(4));
    }

    #[test]
    fn line_start_past_last_line_is_content_end() {
        let sf = source("a\n\nb\n");
        assert_eq!(sf.line_start(1), Some(0));
        assert_eq!(sf.line_start(3), Some(3));
        assert_eq!(sf.line_start(4), Some(5));
        assert_eq!(sf.line_start(5), None);
        assert_eq!(sf.line_start(0), None);
    }

    #[test]
    fn offset_to_line_col_multibyte() {
        let sf = source("é = 1\nx");
        // 'é' is two bytes; '=' sits at byte 3 but column 2
        assert_eq!(sf.offset_to_line_col(3), (1, 2));
        assert_eq!(sf.offset_to_line_col(sf.as_bytes().len() - 1), (2, 0));
    }

    #[test]
    fn from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("test.rb");
        std::fs::write(&file, b"x = 1\n").unwrap();
        let sf = SourceFile::from_path(&file).unwrap();
        assert_eq!(sf.as_bytes(), b"x = 1\n");
        assert_eq!(sf.path, file);
    }

    #[test]
    fn from_path_nonexistent() {
        assert!(SourceFile::from_path(Path::new("/nonexistent/file.rb")).is_err());
    }

    mod prop_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn line_starts_follow_newlines(content in prop::collection::vec(any::<u8>(), 0..500)) {
                let starts = compute_line_starts(&content);
                prop_assert_eq!(starts[0], 0);
                for &start in &starts[1..] {
                    prop_assert!(start > 0 && content[start - 1] == b'\n');
                }
            }

            #[test]
            fn offset_to_line_col_roundtrip(content in "[\\x00-\\x7f\\u{80}-\\u{10FFFF}]{1,200}") {
                let sf = SourceFile::from_bytes("test.rb", content.as_bytes().to_vec());
                for offset in 0..content.len() {
                    if !content.is_char_boundary(offset) {
                        continue;
                    }
                    let (line, col) = sf.offset_to_line_col(offset);
                    prop_assert_eq!(sf.line_col_to_offset(line, col), Some(offset));
                }
            }

            #[test]
            fn blank_line_agrees_with_lines_iterator(content in "[ a\\n]{0,80}") {
                let sf = SourceFile::from_bytes("test.rb", content.as_bytes().to_vec());
                for (idx, line) in sf.lines().enumerate().take(sf.line_count()) {
                    let expected = line.iter().all(|&b| b == b' ');
                    prop_assert_eq!(sf.is_blank_line(idx + 1), expected);
                }
            }
        }
    }
}
