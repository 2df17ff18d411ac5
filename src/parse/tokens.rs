//! Line-granular token stream derived from a Prism parse.
//!
//! Prism exposes an AST rather than a lexer stream, so tokens are rebuilt
//! per line: every multi-line literal becomes one `Literal` token, comments
//! that open their line become `Comment` tokens, and every other non-blank
//! line becomes a `Code` token. Heredocs are special: the token sits on the
//! terminator line and the body lines are carried as its literal span, since
//! the opener shares a line with ordinary code.

use ruby_prism::Visit;

use crate::blank_lines::{LineSpan, Token};
use crate::parse::source::SourceFile;

pub fn tokenize(source: &SourceFile, parse_result: &ruby_prism::ParseResult<'_>) -> Vec<Token> {
    let mut collector = LiteralCollector {
        source,
        tokens: Vec::new(),
    };
    collector.visit(&parse_result.node());
    let mut tokens = collector.tokens;

    // Everything after __END__ is data, not code.
    if let Some(data_loc) = parse_result.data_loc() {
        let (first, last) = line_range(source, data_loc.start_offset(), data_loc.end_offset());
        tokens.push(Token::literal(first, last, Some(LineSpan::new(first, last))));
    }

    let line_count = source.line_count();
    let mut covered = vec![false; line_count + 2];
    for token in &tokens {
        mark(&mut covered, token.start_line, token.end_line);
        if let Some(body) = token.body {
            mark(&mut covered, body.first, body.last);
        }
    }

    for comment in parse_result.comments() {
        let loc = comment.location();
        let (first, last) = line_range(source, loc.start_offset(), loc.end_offset());
        // Trailing comments share their line with code.
        if covered[first] || !opens_line(source, loc.start_offset()) {
            continue;
        }
        tokens.push(Token::comment(first, last));
        mark(&mut covered, first, last);
    }

    for line in 1..=line_count {
        if !covered[line] && !source.is_blank_line(line) {
            tokens.push(Token::code(line, line));
        }
    }

    tokens.sort_by_key(|t| (t.start_line, t.end_line));
    tokens
}

fn mark(covered: &mut [bool], first: usize, last: usize) {
    let last = last.min(covered.len() - 1);
    for slot in covered.iter_mut().take(last + 1).skip(first) {
        *slot = true;
    }
}

/// First and last line touched by the byte range `[start, end)`.
fn line_range(source: &SourceFile, start: usize, end: usize) -> (usize, usize) {
    let first = source.line_of(start);
    let last = source.line_of(end.saturating_sub(1).max(start));
    (first, last)
}

/// True when only whitespace precedes `offset` on its line.
fn opens_line(source: &SourceFile, offset: usize) -> bool {
    let line = source.line_of(offset);
    let start = source.line_start(line).unwrap_or(0);
    source.as_bytes()[start..offset]
        .iter()
        .all(|&b| b == b' ' || b == b'\t')
}

struct LiteralCollector<'a> {
    source: &'a SourceFile,
    tokens: Vec<Token>,
}

impl LiteralCollector<'_> {
    /// Record a literal spanning `[start, end)` if it covers more than one
    /// line. Returns whether a token was recorded.
    fn multi_line(&mut self, start: usize, end: usize) -> bool {
        let (first, last) = line_range(self.source, start, end);
        if last <= first {
            return false;
        }
        self.tokens.push(Token::literal(
            first,
            last,
            Some(LineSpan::new(first + 1, last)),
        ));
        true
    }

    /// Record a heredoc whose body starts at `content_start` and whose
    /// terminator begins at `terminator_start`.
    fn heredoc(&mut self, content_start: usize, terminator_start: usize) {
        let terminator_line = self.source.line_of(terminator_start);
        let body_first = self.source.line_of(content_start);
        let body = (terminator_line > body_first)
            .then(|| LineSpan::new(body_first, terminator_line - 1));
        self.tokens
            .push(Token::literal(terminator_line, terminator_line, body));
    }
}

fn is_heredoc_opening(loc: &ruby_prism::Location<'_>) -> bool {
    loc.as_slice().starts_with(b"<<")
}

impl<'pr> Visit<'pr> for LiteralCollector<'_> {
    fn visit_string_node(&mut self, node: &ruby_prism::StringNode<'pr>) {
        if node.opening_loc().is_some_and(|o| is_heredoc_opening(&o)) {
            let content = node.content_loc();
            let terminator = node
                .closing_loc()
                .map_or(content.end_offset(), |c| c.start_offset());
            self.heredoc(content.start_offset(), terminator);
            return;
        }
        let loc = node.location();
        self.multi_line(loc.start_offset(), loc.end_offset());
    }

    fn visit_interpolated_string_node(&mut self, node: &ruby_prism::InterpolatedStringNode<'pr>) {
        if node.opening_loc().is_some_and(|o| is_heredoc_opening(&o)) {
            let terminator = node.closing_loc().map(|c| c.start_offset());
            let content_start = node
                .parts()
                .iter()
                .next()
                .map(|part| part.location().start_offset());
            match (content_start, terminator) {
                (Some(start), Some(end)) => self.heredoc(start, end),
                (None, Some(end)) => self.heredoc(end, end),
                (Some(start), None) => self.heredoc(start, start),
                (None, None) => {}
            }
            return;
        }
        let loc = node.location();
        if !self.multi_line(loc.start_offset(), loc.end_offset()) {
            ruby_prism::visit_interpolated_string_node(self, node);
        }
    }

    fn visit_x_string_node(&mut self, node: &ruby_prism::XStringNode<'pr>) {
        if is_heredoc_opening(&node.opening_loc()) {
            self.heredoc(node.content_loc().start_offset(), node.closing_loc().start_offset());
            return;
        }
        let loc = node.location();
        self.multi_line(loc.start_offset(), loc.end_offset());
    }

    fn visit_interpolated_x_string_node(
        &mut self,
        node: &ruby_prism::InterpolatedXStringNode<'pr>,
    ) {
        let opening = node.opening_loc();
        if is_heredoc_opening(&opening) {
            let content_start = node
                .parts()
                .iter()
                .next()
                .map_or(node.closing_loc().start_offset(), |part| {
                    part.location().start_offset()
                });
            self.heredoc(content_start, node.closing_loc().start_offset());
            return;
        }
        let loc = node.location();
        if !self.multi_line(loc.start_offset(), loc.end_offset()) {
            ruby_prism::visit_interpolated_x_string_node(self, node);
        }
    }

    fn visit_regular_expression_node(&mut self, node: &ruby_prism::RegularExpressionNode<'pr>) {
        let loc = node.location();
        self.multi_line(loc.start_offset(), loc.end_offset());
    }

    fn visit_interpolated_regular_expression_node(
        &mut self,
        node: &ruby_prism::InterpolatedRegularExpressionNode<'pr>,
    ) {
        let loc = node.location();
        if !self.multi_line(loc.start_offset(), loc.end_offset()) {
            ruby_prism::visit_interpolated_regular_expression_node(self, node);
        }
    }

    fn visit_match_last_line_node(&mut self, node: &ruby_prism::MatchLastLineNode<'pr>) {
        let loc = node.location();
        self.multi_line(loc.start_offset(), loc.end_offset());
    }

    fn visit_interpolated_match_last_line_node(
        &mut self,
        node: &ruby_prism::InterpolatedMatchLastLineNode<'pr>,
    ) {
        let loc = node.location();
        if !self.multi_line(loc.start_offset(), loc.end_offset()) {
            ruby_prism::visit_interpolated_match_last_line_node(self, node);
        }
    }

    fn visit_symbol_node(&mut self, node: &ruby_prism::SymbolNode<'pr>) {
        let loc = node.location();
        self.multi_line(loc.start_offset(), loc.end_offset());
    }

    fn visit_interpolated_symbol_node(&mut self, node: &ruby_prism::InterpolatedSymbolNode<'pr>) {
        let loc = node.location();
        if !self.multi_line(loc.start_offset(), loc.end_offset()) {
            ruby_prism::visit_interpolated_symbol_node(self, node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_source;

    fn tokens_of(src: &str) -> Vec<Token> {
        let source = SourceFile::from_bytes("test.rb", src.as_bytes().to_vec());
        let parse_result = parse_source(source.as_bytes());
        tokenize(&source, &parse_result)
    }

    #[test]
    fn empty_source_has_no_tokens() {
        assert!(tokens_of("").is_empty());
    }

    #[test]
    fn code_lines_become_code_tokens() {
        assert_eq!(
            tokens_of("test = 5\n\n\ntop\n"),
            vec![Token::code(1, 1), Token::code(4, 4)]
        );
    }

    #[test]
    fn comment_only_file() {
        assert_eq!(tokens_of("#comment"), vec![Token::comment(1, 1)]);
    }

    #[test]
    fn trailing_comment_does_not_split_line() {
        assert_eq!(tokens_of("x = 1 # one\n"), vec![Token::code(1, 1)]);
    }

    #[test]
    fn embedded_document_is_one_comment() {
        assert_eq!(
            tokens_of("=begin\n\n\n=end\nx = 1\n"),
            vec![Token::comment(1, 4), Token::code(5, 5)]
        );
    }

    #[test]
    fn multi_line_string_is_one_literal() {
        let src = "result = \"test\n\n\n\n   string\"\n";
        assert_eq!(
            tokens_of(src),
            vec![Token::literal(1, 5, Some(LineSpan::new(2, 5)))]
        );
    }

    #[test]
    fn heredoc_token_sits_on_terminator() {
        let src = "str = <<-TEXT\nline 1\n\n\nline 2\nTEXT\nputs str\n";
        assert_eq!(
            tokens_of(src),
            vec![
                Token::code(1, 1),
                Token::literal(6, 6, Some(LineSpan::new(2, 5))),
                Token::code(7, 7),
            ]
        );
    }

    #[test]
    fn interpolated_heredoc() {
        let src = "x = <<~RUBY\n  #{foo}\n\n\n  bar\nRUBY\n";
        assert_eq!(
            tokens_of(src),
            vec![
                Token::code(1, 1),
                Token::literal(6, 6, Some(LineSpan::new(2, 5))),
            ]
        );
    }

    #[test]
    fn two_heredocs_on_one_line() {
        let src = "foo(<<~A, <<~B)\n  a\nA\n  b\nB\n";
        assert_eq!(
            tokens_of(src),
            vec![
                Token::code(1, 1),
                Token::literal(3, 3, Some(LineSpan::new(2, 2))),
                Token::literal(5, 5, Some(LineSpan::new(4, 4))),
            ]
        );
    }

    #[test]
    fn data_section_is_a_literal() {
        let src = "x = 1\n__END__\n\n\n\ndata\n";
        let tokens = tokens_of(src);
        assert_eq!(tokens[0], Token::code(1, 1));
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].start_line, 2);
        assert_eq!(tokens[1].end_line, 6);
    }

    #[test]
    fn multi_line_regexp_is_one_literal() {
        let src = "re = /\n  a\n\n\n  b\n/x\n";
        assert_eq!(
            tokens_of(src),
            vec![Token::literal(1, 6, Some(LineSpan::new(2, 6)))]
        );
    }

    #[test]
    fn multi_line_symbols_are_literals() {
        assert_eq!(
            tokens_of("x = :\"a\n\n\nb\"\n"),
            vec![Token::literal(1, 4, Some(LineSpan::new(2, 4)))]
        );
        assert_eq!(
            tokens_of("y = %s(a\n\n\nb)\nz = :\"#{y}\n\n\n\"\n"),
            vec![
                Token::literal(1, 4, Some(LineSpan::new(2, 4))),
                Token::literal(5, 8, Some(LineSpan::new(6, 8))),
            ]
        );
    }

    #[test]
    fn bare_regexp_condition_is_a_literal() {
        let src = "if /a\n\n\nb/x\n  1\nend\nif /#{c}\n\n\n/\nend\n";
        assert_eq!(
            tokens_of(src),
            vec![
                Token::literal(1, 4, Some(LineSpan::new(2, 4))),
                Token::code(5, 5),
                Token::code(6, 6),
                Token::literal(7, 10, Some(LineSpan::new(8, 10))),
                Token::code(11, 11),
            ]
        );
    }
}
