//! Bridge from Prism regexp nodes to `PatternSource`.

use std::ops::Range;

use ruby_prism::Visit;

use super::location::SourcePos;
use super::{PatternSource, RegexpOptions};
use crate::parse::source::SourceFile;

/// A regexp literal found in a file.
#[derive(Debug, Clone)]
pub struct RegexpLiteral {
    /// The whole literal, delimiters and flags included.
    pub range: Range<usize>,
    pub source: PatternSource,
}

impl RegexpLiteral {
    pub fn is_interpolated(&self) -> bool {
        !self.source.interpolations.is_empty()
    }
}

/// Every regexp literal in the file, in source order. Literals whose text
/// is not valid UTF-8 are skipped.
pub fn regexp_literals(
    source: &SourceFile,
    parse_result: &ruby_prism::ParseResult<'_>,
) -> Vec<RegexpLiteral> {
    let mut collector = RegexpCollector {
        source,
        literals: Vec::new(),
    };
    collector.visit(&parse_result.node());
    collector.literals
}

/// Pattern text of a regexp node, or `None` for other nodes. A regexp used
/// bare as a condition (`if /re/`) counts as a regexp node.
pub fn pattern_source(source: &SourceFile, node: &ruby_prism::Node<'_>) -> Option<PatternSource> {
    if let Some(regexp) = node.as_regular_expression_node() {
        let options = RegexpOptions {
            extended: regexp.is_extended(),
            ignore_case: regexp.is_ignore_case(),
            multi_line: regexp.is_multi_line(),
        };
        return plain_source(source, &regexp.content_loc(), options);
    }
    if let Some(regexp) = node.as_match_last_line_node() {
        let options = RegexpOptions {
            extended: regexp.is_extended(),
            ignore_case: regexp.is_ignore_case(),
            multi_line: regexp.is_multi_line(),
        };
        return plain_source(source, &regexp.content_loc(), options);
    }
    if let Some(regexp) = node.as_interpolated_regular_expression_node() {
        let options = RegexpOptions {
            extended: regexp.is_extended(),
            ignore_case: regexp.is_ignore_case(),
            multi_line: regexp.is_multi_line(),
        };
        return interpolated_source(
            source,
            regexp.opening_loc().end_offset(),
            regexp.closing_loc().start_offset(),
            &regexp.parts(),
            options,
        );
    }
    if let Some(regexp) = node.as_interpolated_match_last_line_node() {
        let options = RegexpOptions {
            extended: regexp.is_extended(),
            ignore_case: regexp.is_ignore_case(),
            multi_line: regexp.is_multi_line(),
        };
        return interpolated_source(
            source,
            regexp.opening_loc().end_offset(),
            regexp.closing_loc().start_offset(),
            &regexp.parts(),
            options,
        );
    }
    None
}

fn origin(source: &SourceFile, offset: usize) -> SourcePos {
    let (line, column) = source.offset_to_line_col(offset);
    SourcePos::new(offset, line, column)
}

fn plain_source(
    source: &SourceFile,
    content: &ruby_prism::Location<'_>,
    options: RegexpOptions,
) -> Option<PatternSource> {
    let text = std::str::from_utf8(content.as_slice()).ok()?;
    Some(
        PatternSource::new(text)
            .at(origin(source, content.start_offset()))
            .with_options(options),
    )
}

/// `start..end` is the text between the delimiters.
fn interpolated_source(
    source: &SourceFile,
    start: usize,
    end: usize,
    parts: &ruby_prism::NodeList<'_>,
    options: RegexpOptions,
) -> Option<PatternSource> {
    let text = std::str::from_utf8(source.as_bytes().get(start..end)?).ok()?;
    let mut pattern = PatternSource::new(text)
        .at(origin(source, start))
        .with_options(options);

    for part in parts.iter() {
        if part.as_string_node().is_some() {
            continue;
        }
        let loc = part.location();
        pattern = pattern.with_interpolation(loc.start_offset() - start..loc.end_offset() - start);
    }
    Some(pattern)
}

struct RegexpCollector<'a> {
    source: &'a SourceFile,
    literals: Vec<RegexpLiteral>,
}

impl RegexpCollector<'_> {
    fn push(&mut self, node: &ruby_prism::Node<'_>) {
        if let Some(pattern) = pattern_source(self.source, node) {
            let loc = node.location();
            self.literals.push(RegexpLiteral {
                range: loc.start_offset()..loc.end_offset(),
                source: pattern,
            });
        }
    }
}

impl<'pr> Visit<'pr> for RegexpCollector<'_> {
    fn visit_regular_expression_node(&mut self, node: &ruby_prism::RegularExpressionNode<'pr>) {
        self.push(&node.as_node());
    }

    fn visit_match_last_line_node(&mut self, node: &ruby_prism::MatchLastLineNode<'pr>) {
        self.push(&node.as_node());
    }

    fn visit_interpolated_regular_expression_node(
        &mut self,
        node: &ruby_prism::InterpolatedRegularExpressionNode<'pr>,
    ) {
        self.push(&node.as_node());
        ruby_prism::visit_interpolated_regular_expression_node(self, node);
    }

    fn visit_interpolated_match_last_line_node(
        &mut self,
        node: &ruby_prism::InterpolatedMatchLastLineNode<'pr>,
    ) {
        self.push(&node.as_node());
        ruby_prism::visit_interpolated_match_last_line_node(self, node);
    }
}
