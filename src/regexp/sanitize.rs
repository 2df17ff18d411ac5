use std::fmt;

use super::location::PositionMap;
use super::{ParseError, PatternSource};

/// Pattern text with every interpolation blanked out.
///
/// Byte length and newline positions match the raw text exactly, so byte
/// offsets of verbatim characters are the same in both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedPattern {
    text: String,
}

impl SanitizedPattern {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn line_count(&self) -> usize {
        1 + self.text.bytes().filter(|&b| b == b'\n').count()
    }
}

impl fmt::Display for SanitizedPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Blank every interpolation and record the translation table.
///
/// Each byte of an interpolation becomes a space, except newlines, which are
/// kept. A space is a plain literal outside free-spacing mode and ignorable
/// whitespace inside it, so it never changes grouping.
pub fn sanitize(source: &PatternSource) -> Result<(SanitizedPattern, PositionMap), ParseError> {
    let raw = source.text.as_str();
    let mut map = PositionMap::new(raw, source.origin);
    let mut text = String::with_capacity(raw.len());
    let mut cursor = 0;

    for segment in &source.interpolations {
        let range = segment.range.clone();
        if range.start > range.end || range.end > raw.len() {
            return Err(ParseError::new(
                "interpolation range out of bounds",
                range.start.min(raw.len()),
            ));
        }
        if range.start < cursor {
            return Err(ParseError::new("interpolation ranges overlap", range.start));
        }
        if !raw.is_char_boundary(range.start) || !raw.is_char_boundary(range.end) {
            return Err(ParseError::new(
                "interpolation range splits a character",
                range.start,
            ));
        }

        text.push_str(&raw[cursor..range.start]);
        map.push_verbatim(cursor..range.start);

        for ch in raw[range.clone()].chars() {
            if ch == '\n' {
                text.push('\n');
            } else {
                text.extend(std::iter::repeat_n(' ', ch.len_utf8()));
            }
        }
        map.push_interpolated(range.clone(), segment.span);
        cursor = range.end;
    }

    text.push_str(&raw[cursor..]);
    map.push_verbatim(cursor..raw.len());

    Ok((SanitizedPattern { text }, map))
}
