//! Blank-line run detection over a token stream.
//!
//! The scanner only looks at line numbers: a line is blank when no token
//! touches it, and it is excluded from counting when it falls inside the body
//! of a multi-line string or heredoc. Producing the token stream is the job of
//! [`crate::parse::tokens`].

use std::fmt;

/// Inclusive range of 1-indexed lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LineSpan {
    pub first: usize,
    pub last: usize,
}

impl LineSpan {
    pub fn new(first: usize, last: usize) -> Self {
        Self { first, last }
    }

    pub fn contains(&self, line: usize) -> bool {
        self.first <= line && line <= self.last
    }

    pub fn len(&self) -> usize {
        self.last + 1 - self.first
    }

    pub fn is_empty(&self) -> bool {
        self.last < self.first
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Code,
    Comment,
    /// A string, heredoc or similar literal that may own body lines.
    Literal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start_line: usize,
    pub end_line: usize,
    /// Lines owned by the literal's body. Only meaningful for
    /// [`TokenKind::Literal`]; the body may lie outside the token's own line
    /// range, as it does for a heredoc whose token sits on its terminator.
    pub body: Option<LineSpan>,
}

impl Token {
    pub fn code(start_line: usize, end_line: usize) -> Self {
        Self {
            kind: TokenKind::Code,
            start_line,
            end_line,
            body: None,
        }
    }

    pub fn comment(start_line: usize, end_line: usize) -> Self {
        Self {
            kind: TokenKind::Comment,
            start_line,
            end_line,
            body: None,
        }
    }

    pub fn literal(start_line: usize, end_line: usize, body: Option<LineSpan>) -> Self {
        Self {
            kind: TokenKind::Literal,
            start_line,
            end_line,
            body,
        }
    }
}

/// A maximal run of blank lines between two tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlankRun {
    pub start_line: usize,
    pub length: usize,
}

impl BlankRun {
    pub fn end_line(&self) -> usize {
        self.start_line + self.length - 1
    }

    pub fn is_reportable(&self, max: usize) -> bool {
        self.length > max
    }

    /// The lines beyond the first `max`, or `None` when the run is within the
    /// limit.
    pub fn excess(&self, max: usize) -> Option<LineSpan> {
        self.is_reportable(max)
            .then(|| LineSpan::new(self.start_line + max, self.end_line()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    MalformedTokenStream {
        index: usize,
        line: usize,
        reason: &'static str,
    },
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::MalformedTokenStream {
                index,
                line,
                reason,
            } => write!(f, "malformed token stream at token {index} (line {line}): {reason}"),
        }
    }
}

impl std::error::Error for ScanError {}

#[derive(Debug, Clone, Copy)]
pub struct BlankLineScanner {
    max: usize,
}

impl Default for BlankLineScanner {
    fn default() -> Self {
        Self { max: 1 }
    }
}

impl BlankLineScanner {
    /// `max` is the number of consecutive blank lines tolerated.
    pub fn new(max: usize) -> Self {
        Self { max }
    }

    pub fn max(&self) -> usize {
        self.max
    }

    /// Every blank run in source order, reportable or not.
    ///
    /// A stream without code or literal tokens (an empty or comment-only
    /// file) yields no runs. The start of the file counts as a token ending on
    /// line 0, so leading blank lines form a run too; lines after the last
    /// token are never scanned.
    pub fn scan(&self, tokens: &[Token]) -> Result<Vec<BlankRun>, ScanError> {
        validate(tokens)?;

        if tokens.iter().all(|t| t.kind == TokenKind::Comment) {
            return Ok(Vec::new());
        }

        let bodies = literal_bodies(tokens);
        let mut runs = Vec::new();
        let mut prev_end = 0;
        for token in tokens {
            collect_gap(prev_end + 1, token.start_line, &bodies, &mut runs);
            prev_end = prev_end.max(token.end_line);
        }
        Ok(runs)
    }

    /// The excess lines of every reportable run: one span per run.
    pub fn offenses(&self, tokens: &[Token]) -> Result<Vec<LineSpan>, ScanError> {
        Ok(self
            .scan(tokens)?
            .iter()
            .filter_map(|run| run.excess(self.max))
            .collect())
    }
}

fn validate(tokens: &[Token]) -> Result<(), ScanError> {
    for (index, token) in tokens.iter().enumerate() {
        let malformed = |reason| ScanError::MalformedTokenStream {
            index,
            line: token.start_line,
            reason,
        };
        if token.start_line == 0 {
            return Err(malformed("line numbers are 1-indexed"));
        }
        if token.start_line > token.end_line {
            return Err(malformed("token ends before it starts"));
        }
        if token.body.is_some_and(|body| body.first == 0 || body.is_empty()) {
            return Err(malformed("literal body is an empty line range"));
        }
        if index > 0 && token.start_line < tokens[index - 1].end_line {
            return Err(malformed("tokens overlap or are out of order"));
        }
    }
    Ok(())
}

/// Sorted, merged body spans of all literal tokens.
fn literal_bodies(tokens: &[Token]) -> Vec<LineSpan> {
    let mut bodies: Vec<LineSpan> = tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Literal)
        .filter_map(|t| t.body)
        .collect();
    bodies.sort_unstable();

    let mut merged: Vec<LineSpan> = Vec::with_capacity(bodies.len());
    for span in bodies {
        if let Some(last) = merged.last_mut() {
            if span.first <= last.last + 1 {
                last.last = last.last.max(span.last);
                continue;
            }
        }
        merged.push(span);
    }
    merged
}

fn in_literal_body(bodies: &[LineSpan], line: usize) -> bool {
    let idx = bodies.partition_point(|b| b.last < line);
    bodies.get(idx).is_some_and(|b| b.contains(line))
}

/// Split the lines in `[from, to)` into blank runs, cutting at literal bodies.
fn collect_gap(from: usize, to: usize, bodies: &[LineSpan], runs: &mut Vec<BlankRun>) {
    let mut run_start: Option<usize> = None;
    for line in from..to {
        if in_literal_body(bodies, line) {
            if let Some(start) = run_start.take() {
                runs.push(BlankRun {
                    start_line: start,
                    length: line - start,
                });
            }
        } else if run_start.is_none() {
            run_start = Some(line);
        }
    }
    if let Some(start) = run_start {
        runs.push(BlankRun {
            start_line: start,
            length: to - start,
        });
    }
}
