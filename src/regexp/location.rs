use std::ops::Range;

use super::tree::{ExpressionTree, NodeId};

/// A position in the original file. `line` is 1-indexed, `column` is a
/// 0-indexed character count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct SourcePos {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl SourcePos {
    pub fn new(offset: usize, line: usize, column: usize) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }
}

/// A resolved start/end pair in the original file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSpan {
    pub start: SourcePos,
    pub end: SourcePos,
}

impl SourceSpan {
    pub fn new(start: SourcePos, end: SourcePos) -> Self {
        Self { start, end }
    }

    pub fn byte_range(&self) -> Range<usize> {
        self.start.offset..self.end.offset
    }

    /// Slice the span out of the original file's bytes.
    pub fn source<'a>(&self, file: &'a [u8]) -> &'a [u8] {
        file.get(self.byte_range()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.end.offset.saturating_sub(self.start.offset)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Which end of a range an offset denotes. An offset on the boundary of an
/// interpolation belongs to it only from the inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Start,
    End,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Region {
    Verbatim(Range<usize>),
    Interpolated { range: Range<usize>, span: SourceSpan },
}

impl Region {
    fn range(&self) -> &Range<usize> {
        match self {
            Region::Verbatim(range) | Region::Interpolated { range, .. } => range,
        }
    }
}

/// Translation table from sanitized-pattern offsets to original positions.
///
/// Regions are appended in order while sanitizing and never change after.
/// Verbatim offsets translate by shifting from the pattern origin; offsets
/// inside an interpolation collapse to that interpolation's own span.
#[derive(Debug, Clone)]
pub struct PositionMap {
    origin: SourcePos,
    raw: String,
    raw_line_starts: Vec<usize>,
    regions: Vec<Region>,
}

impl PositionMap {
    pub(crate) fn new(raw: &str, origin: SourcePos) -> Self {
        Self {
            origin,
            raw: raw.to_string(),
            raw_line_starts: line_starts(raw),
            regions: Vec::new(),
        }
    }

    pub(crate) fn push_verbatim(&mut self, range: Range<usize>) {
        if !range.is_empty() {
            self.regions.push(Region::Verbatim(range));
        }
    }

    pub(crate) fn push_interpolated(&mut self, range: Range<usize>, span: SourceSpan) {
        self.regions.push(Region::Interpolated { range, span });
    }

    pub fn origin(&self) -> SourcePos {
        self.origin
    }

    /// Translate a sanitized offset into the original file.
    pub fn position(&self, offset: usize, edge: Edge) -> SourcePos {
        let idx = self
            .regions
            .partition_point(|region| region.range().start <= offset);
        // The region starting at or before `offset`, and for end edges the
        // one before it, since an end offset may close the previous region.
        let candidates = idx.saturating_sub(2)..idx;
        for region in &self.regions[candidates] {
            if let Region::Interpolated { range, span } = region {
                match edge {
                    Edge::Start if range.start <= offset && offset < range.end => {
                        return span.start;
                    }
                    Edge::End if range.start < offset && offset <= range.end => {
                        return span.end;
                    }
                    _ => {}
                }
            }
        }
        self.verbatim(offset)
    }

    pub fn span(&self, range: Range<usize>) -> SourceSpan {
        SourceSpan::new(
            self.position(range.start, Edge::Start),
            self.position(range.end, Edge::End),
        )
    }

    fn verbatim(&self, offset: usize) -> SourcePos {
        let offset = floor_char_boundary(&self.raw, offset);
        let line_idx = self
            .raw_line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let line_start = self.raw_line_starts[line_idx];
        let chars = self.raw[line_start..offset].chars().count();
        let column = if line_idx == 0 {
            self.origin.column + chars
        } else {
            chars
        };
        SourcePos::new(self.origin.offset + offset, self.origin.line + line_idx, column)
    }
}

/// Position of `offset` within `raw`, which starts at `origin`.
pub(crate) fn locate(raw: &str, origin: SourcePos, offset: usize) -> SourcePos {
    PositionMap::new(raw, origin).verbatim(offset)
}

/// Resolve a tree node to its span in the original file.
pub fn resolve(tree: &ExpressionTree, id: NodeId) -> SourceSpan {
    tree.position_map().span(tree.node(id).range.clone())
}

fn line_starts(text: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(
            text.bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| i + 1),
        )
        .collect()
}

fn floor_char_boundary(text: &str, offset: usize) -> usize {
    let mut offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}
