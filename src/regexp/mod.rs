//! Structural analysis of regexp literals.
//!
//! A regexp literal's pattern text is sanitized (interpolations blanked),
//! parsed into an [`ExpressionTree`], and every node of that tree can be
//! resolved back to a [`SourceSpan`] in the file the literal came from.

pub mod builder;
pub mod captures;
pub mod literal;
pub mod location;
pub mod parser;
pub mod sanitize;
pub mod tree;

use std::fmt;
use std::ops::Range;

pub use builder::{PatternTreeBuilder, build};
pub use captures::Captures;
pub use literal::{RegexpLiteral, pattern_source, regexp_literals};
pub use location::{Edge, PositionMap, SourcePos, SourceSpan, resolve};
pub use sanitize::{SanitizedPattern, sanitize};
pub use tree::{
    ExpressionNode, ExpressionTree, GroupKind, NodeId, NodeKind, Quantifier, QuantifierKind,
    QuantifierMode,
};

/// Mode flags that change how a pattern is tokenized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegexpOptions {
    /// `x`: whitespace and `#` comments are free-spacing nodes.
    pub extended: bool,
    pub ignore_case: bool,
    pub multi_line: bool,
}

/// An interpolated sub-expression inside the raw pattern text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpolationSegment {
    /// Byte range within the raw pattern text.
    pub range: Range<usize>,
    /// Where the embedded expression sits in the original file.
    pub span: SourceSpan,
    /// Number of lines the segment touches.
    pub lines: usize,
}

/// Raw text of a regexp literal and the interpolations it contains.
///
/// `text` is a verbatim slice of the original file starting at `origin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternSource {
    pub text: String,
    pub origin: SourcePos,
    pub options: RegexpOptions,
    pub interpolations: Vec<InterpolationSegment>,
}

impl PatternSource {
    /// Pattern text that starts at line 1, column 0 of its own file.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            origin: SourcePos::new(0, 1, 0),
            options: RegexpOptions::default(),
            interpolations: Vec::new(),
        }
    }

    pub fn at(mut self, origin: SourcePos) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_options(mut self, options: RegexpOptions) -> Self {
        self.options = options;
        self
    }

    pub fn extended(mut self) -> Self {
        self.options.extended = true;
        self
    }

    /// Mark `range` of the raw text as an interpolated expression. Ranges are
    /// validated when the pattern is sanitized.
    pub fn with_interpolation(mut self, range: Range<usize>) -> Self {
        let start = location::locate(&self.text, self.origin, range.start);
        let end = location::locate(&self.text, self.origin, range.end);
        let lines = self
            .text
            .as_bytes()
            .get(range.clone())
            .map_or(1, |bytes| 1 + bytes.iter().filter(|&&b| b == b'\n').count());
        self.interpolations.push(InterpolationSegment {
            range,
            span: SourceSpan::new(start, end),
            lines,
        });
        self
    }

    pub fn line_count(&self) -> usize {
        1 + self.text.bytes().filter(|&b| b == b'\n').count()
    }
}

/// A pattern that could not be turned into an expression tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    /// Byte offset within the sanitized pattern.
    pub offset: usize,
    /// The offset translated into the original file, once known.
    pub position: Option<SourcePos>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
            position: None,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(pos) => write!(
                f,
                "{} at line {}, column {}",
                self.message, pos.line, pos.column
            ),
            None => write!(f, "{} at offset {}", self.message, self.offset),
        }
    }
}

impl std::error::Error for ParseError {}
