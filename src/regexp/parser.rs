//! Recursive-descent parser for Onigmo (Ruby) regexp syntax.
//!
//! Produces the node arena of an `ExpressionTree`. Nodes keep byte ranges
//! into the pattern; escapes are only scanned far enough to find where they
//! end, never decoded.

use std::ops::Range;

use super::ParseError;
use super::tree::{
    ExpressionNode, GroupKind, NodeId, NodeKind, Quantifier, QuantifierKind, QuantifierMode,
};

/// Nesting of groups and sets beyond which a pattern is rejected.
pub const DEFAULT_DEPTH_LIMIT: usize = 256;

const POSIX_CLASSES: &[&str] = &[
    "alnum", "alpha", "ascii", "blank", "cntrl", "digit", "graph", "lower", "print", "punct",
    "space", "upper", "word", "xdigit",
];

type Result<T> = std::result::Result<T, ParseError>;

fn is_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

pub struct Parser<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    /// Free-spacing mode currently in effect.
    extended: bool,
    nodes: Vec<ExpressionNode>,
    captures: usize,
    depth: usize,
    depth_limit: usize,
}

impl<'a> Parser<'a> {
    pub fn new(text: &'a str, extended: bool) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
            pos: 0,
            extended,
            nodes: Vec::new(),
            captures: 0,
            depth: 0,
            depth_limit: DEFAULT_DEPTH_LIMIT,
        }
    }

    pub fn with_depth_limit(mut self, depth_limit: usize) -> Self {
        self.depth_limit = depth_limit;
        self
    }

    /// Parse the whole pattern. The root node is always at index 0.
    pub fn parse(mut self) -> Result<Vec<ExpressionNode>> {
        let root = self.push(NodeKind::Root, 0..self.bytes.len());
        self.parse_branches(root)?;
        if self.pos < self.bytes.len() {
            // Only a stray `)` ends the top level early.
            return Err(ParseError::new("unmatched close parenthesis", self.pos));
        }
        Ok(self.nodes)
    }

    // ── Cursor helpers ──────────────────────────────────────────────────

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Step over one character, however many bytes it takes.
    fn bump_char(&mut self) {
        self.pos += self.text[self.pos..]
            .chars()
            .next()
            .map_or(1, char::len_utf8);
    }

    /// Advance over ASCII bytes matching `pred`; returns how many.
    fn skip_while(&mut self, pred: impl Fn(u8) -> bool) -> usize {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
        self.pos - start
    }

    fn push(&mut self, kind: NodeKind, range: Range<usize>) -> NodeId {
        self.nodes.push(ExpressionNode::new(kind, range));
        NodeId(self.nodes.len() - 1)
    }

    fn attach(&mut self, parent: NodeId, children: impl IntoIterator<Item = NodeId>) {
        for child in children {
            self.nodes[child.0].parent = Some(parent);
            self.nodes[parent.0].children.push(child);
        }
    }

    fn enter(&mut self, at: usize) -> Result<()> {
        self.depth += 1;
        if self.depth > self.depth_limit {
            return Err(ParseError::new("parse depth limit over", at));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    // ── Sequences and alternation ───────────────────────────────────────

    fn parse_branches(&mut self, parent: NodeId) -> Result<()> {
        let start = self.pos;
        let first = self.parse_sequence()?;
        if self.peek() != Some(b'|') {
            self.attach(parent, first);
            return Ok(());
        }

        let mut branches = vec![(start..self.pos, first)];
        while self.eat(b'|') {
            let branch_start = self.pos;
            let items = self.parse_sequence()?;
            branches.push((branch_start..self.pos, items));
        }

        let alternation = self.push(NodeKind::Alternation, start..self.pos);
        for (range, items) in branches {
            let alternative = self.push(NodeKind::Alternative, range);
            self.attach(alternative, items);
            self.attach(alternation, [alternative]);
        }
        self.attach(parent, [alternation]);
        Ok(())
    }

    fn parse_sequence(&mut self) -> Result<Vec<NodeId>> {
        let mut items = Vec::new();
        while let Some(byte) = self.peek() {
            match byte {
                b'|' | b')' => break,
                _ if self.extended && is_space(byte) => {
                    let start = self.pos;
                    self.skip_while(is_space);
                    items.push(self.push(NodeKind::Whitespace, start..self.pos));
                }
                b'#' if self.extended => {
                    let start = self.pos;
                    self.skip_while(|b| b != b'\n');
                    items.push(self.push(NodeKind::Comment, start..self.pos));
                }
                b'*' | b'+' | b'?' => self.parse_quantifier(&mut items)?,
                b'{' if self.scan_interval().is_some() => self.parse_quantifier(&mut items)?,
                _ => {
                    let atom = self.parse_atom()?;
                    self.push_item(&mut items, atom);
                }
            }
        }
        Ok(items)
    }

    /// Append an atom, folding adjacent plain characters into one literal.
    fn push_item(&mut self, items: &mut Vec<NodeId>, id: NodeId) {
        let is_newest = id.0 + 1 == self.nodes.len();
        if is_newest && self.nodes[id.0].kind == NodeKind::Literal {
            if let Some(&last) = items.last() {
                let Range { start, end } = self.nodes[id.0].range.clone();
                let prev = &self.nodes[last.0];
                if prev.kind == NodeKind::Literal
                    && prev.quantifier.is_none()
                    && prev.range.end == start
                {
                    self.nodes.pop();
                    self.nodes[last.0].range.end = end;
                    return;
                }
            }
        }
        items.push(id);
    }

    // ── Quantifiers ─────────────────────────────────────────────────────

    /// `{n}`, `{n,}`, `{,m}` or `{n,m}` at the cursor: (min, max, length).
    fn scan_interval(&self) -> Option<(usize, Option<usize>, usize)> {
        let rest = self.bytes.get(self.pos..)?;
        if rest.first() != Some(&b'{') {
            return None;
        }
        let digits = |from: usize| {
            rest[from..]
                .iter()
                .take_while(|b| b.is_ascii_digit())
                .count()
        };
        let number = |range: Range<usize>| -> Option<usize> {
            std::str::from_utf8(&rest[range]).ok()?.parse().ok()
        };

        let lo = 1..1 + digits(1);
        let mut i = lo.end;
        let hi = if rest.get(i) == Some(&b',') {
            let hi = i + 1..i + 1 + digits(i + 1);
            i = hi.end;
            Some(hi)
        } else {
            None
        };
        if rest.get(i) != Some(&b'}') {
            return None;
        }
        if lo.is_empty() && hi.as_ref().is_none_or(|hi| hi.is_empty()) {
            return None;
        }

        let min = if lo.is_empty() { 0 } else { number(lo)? };
        let max = match hi {
            None => Some(min),
            Some(hi) if hi.is_empty() => None,
            Some(hi) => Some(number(hi)?),
        };
        Some((min, max, i + 1))
    }

    fn parse_quantifier(&mut self, items: &mut Vec<NodeId>) -> Result<()> {
        let start = self.pos;
        let (kind, min, max) = match self.peek() {
            Some(b'*') => {
                self.pos += 1;
                (QuantifierKind::ZeroOrMore, 0, None)
            }
            Some(b'+') => {
                self.pos += 1;
                (QuantifierKind::OneOrMore, 1, None)
            }
            Some(b'?') => {
                self.pos += 1;
                (QuantifierKind::ZeroOrOne, 0, Some(1))
            }
            _ => {
                let Some((min, max, len)) = self.scan_interval() else {
                    return Err(ParseError::new("invalid repeat range", start));
                };
                if max.is_some_and(|max| max < min) {
                    return Err(ParseError::new(
                        "upper is smaller than lower in repeat range",
                        start,
                    ));
                }
                self.pos += len;
                (QuantifierKind::Interval, min, max)
            }
        };

        // A `+` after an interval is a nested repeat, not a possessive mark.
        let mode = if self.eat(b'?') {
            QuantifierMode::Reluctant
        } else if kind != QuantifierKind::Interval && self.eat(b'+') {
            QuantifierMode::Possessive
        } else {
            QuantifierMode::Greedy
        };

        let quantifier = Quantifier {
            kind,
            min,
            max,
            mode,
            range: start..self.pos,
        };
        self.quantify(items, quantifier)
    }

    /// Attach `quantifier` to the last non-free-space item. The target's
    /// range only grows over an adjacent quantifier so that it never
    /// overlaps the free-space siblings in between.
    fn quantify(&mut self, items: &mut Vec<NodeId>, quantifier: Quantifier) -> Result<()> {
        let Some(mut idx) = items
            .iter()
            .rposition(|id| !self.nodes[id.0].kind.is_free_space())
        else {
            return Err(ParseError::new(
                "target of repeat operator is not specified",
                quantifier.range.start,
            ));
        };
        let mut target = items[idx];

        match self.nodes[target.0].kind {
            NodeKind::Anchor | NodeKind::OptionSwitch => {
                return Err(ParseError::new(
                    "target of repeat operator is invalid",
                    quantifier.range.start,
                ));
            }
            NodeKind::Literal if self.nodes[target.0].quantifier.is_none() => {
                // Only the last character of a literal run is repeated.
                let range = self.nodes[target.0].range.clone();
                let last_len = self.text[range.clone()]
                    .chars()
                    .next_back()
                    .map_or(0, char::len_utf8);
                if range.len() > last_len {
                    let split = range.end - last_len;
                    self.nodes[target.0].range.end = split;
                    target = self.push(NodeKind::Literal, split..range.end);
                    idx += 1;
                    items.insert(idx, target);
                }
            }
            _ => {}
        }

        if self.nodes[target.0].quantifier.is_some() {
            let range = self.nodes[target.0].range.clone();
            let group = self.push(NodeKind::Group(GroupKind::Passive { implicit: true }), range);
            self.attach(group, [target]);
            items[idx] = group;
            target = group;
        }

        let node = &mut self.nodes[target.0];
        if node.range.end == quantifier.range.start {
            node.range.end = quantifier.range.end;
        }
        node.quantifier = Some(quantifier);
        Ok(())
    }

    // ── Atoms ───────────────────────────────────────────────────────────

    fn parse_atom(&mut self) -> Result<NodeId> {
        let start = self.pos;
        let Some(byte) = self.peek() else {
            return Err(ParseError::new("premature end of regular expression", start));
        };
        match byte {
            b'(' => self.parse_group(),
            b'[' => self.parse_set(),
            b'\\' => self.parse_escape(),
            b'.' => {
                self.pos += 1;
                Ok(self.push(NodeKind::Dot, start..self.pos))
            }
            b'^' | b'$' => {
                self.pos += 1;
                Ok(self.push(NodeKind::Anchor, start..self.pos))
            }
            _ => {
                self.bump_char();
                Ok(self.push(NodeKind::Literal, start..self.pos))
            }
        }
    }

    fn parse_escape(&mut self) -> Result<NodeId> {
        let start = self.pos;
        self.pos += 1;
        let Some(byte) = self.peek() else {
            return Err(ParseError::new("too short escape sequence", start));
        };
        let kind = match byte {
            b'A' | b'z' | b'Z' | b'b' | b'B' | b'G' | b'K' => {
                self.pos += 1;
                NodeKind::Anchor
            }
            b'd' | b'D' | b'w' | b'W' | b's' | b'S' | b'h' | b'H' | b'R' | b'X' => {
                self.pos += 1;
                NodeKind::CharacterType
            }
            b'p' | b'P' => self.scan_property(start)?,
            b'1'..=b'9' => {
                self.skip_while(|b| b.is_ascii_digit());
                NodeKind::Backreference
            }
            b'k' => {
                self.pos += 1;
                self.scan_reference(start, "invalid backref")?;
                NodeKind::Backreference
            }
            b'g' => {
                self.pos += 1;
                self.scan_reference(start, "invalid group name")?;
                NodeKind::Backreference
            }
            _ => {
                self.scan_escape_body(start)?;
                NodeKind::Escape
            }
        };
        Ok(self.push(kind, start..self.pos))
    }

    /// Scan the part of an escape after the backslash; the cursor is on the
    /// escaped character.
    fn scan_escape_body(&mut self, start: usize) -> Result<()> {
        let Some(byte) = self.peek() else {
            return Err(ParseError::new("too short escape sequence", start));
        };
        match byte {
            b'x' => {
                self.pos += 1;
                let found = if self.eat(b'{') {
                    let n = self.skip_while(|b| b.is_ascii_hexdigit());
                    n > 0 && self.eat(b'}')
                } else {
                    self.scan_hex_digits(2) > 0
                };
                if !found {
                    return Err(ParseError::new("invalid hex escape", start));
                }
            }
            b'u' => {
                self.pos += 1;
                let found = if self.eat(b'{') {
                    let mut points = 0;
                    loop {
                        self.skip_while(|b| b == b' ' || b == b'\t');
                        if self.skip_while(|b| b.is_ascii_hexdigit()) == 0 {
                            break;
                        }
                        points += 1;
                    }
                    points > 0 && self.eat(b'}')
                } else {
                    self.scan_hex_digits(4) == 4
                };
                if !found {
                    return Err(ParseError::new("invalid Unicode escape", start));
                }
            }
            b'0'..=b'7' => {
                let digits = self.bytes[self.pos..]
                    .iter()
                    .take(3)
                    .take_while(|b| (b'0'..=b'7').contains(b))
                    .count();
                self.pos += digits;
            }
            b'c' => {
                self.pos += 1;
                self.scan_control_target(start)?;
            }
            b'C' | b'M' => {
                self.pos += 1;
                if !self.eat(b'-') {
                    return Err(ParseError::new("invalid control-code syntax", start));
                }
                self.scan_control_target(start)?;
            }
            _ => self.bump_char(),
        }
        Ok(())
    }

    fn scan_hex_digits(&mut self, max: usize) -> usize {
        let n = self.bytes[self.pos..]
            .iter()
            .take(max)
            .take_while(|b| b.is_ascii_hexdigit())
            .count();
        self.pos += n;
        n
    }

    /// The character a `\c`, `\C-` or `\M-` escape applies to, which may
    /// itself be an escape (`\M-\C-x`).
    fn scan_control_target(&mut self, start: usize) -> Result<()> {
        match self.peek() {
            None => Err(ParseError::new("too short escape sequence", start)),
            Some(b'\\') => {
                self.pos += 1;
                self.scan_escape_body(start)
            }
            Some(_) => {
                self.bump_char();
                Ok(())
            }
        }
    }

    /// `\p{Name}`, `\p{^Name}`, `\P{Name}` with the cursor on `p`/`P`.
    fn scan_property(&mut self, start: usize) -> Result<NodeKind> {
        let upper = self.peek() == Some(b'P');
        self.pos += 1;
        if !self.eat(b'{') {
            return Err(ParseError::new("invalid character property name", start));
        }
        let caret = self.eat(b'^');
        let name = self.skip_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b' ' | b'-'));
        if name == 0 || !self.eat(b'}') {
            return Err(ParseError::new("invalid character property name", start));
        }
        Ok(NodeKind::Property {
            negated: upper != caret,
        })
    }

    /// `<ref>` or `'ref'` after `\k` or `\g`.
    fn scan_reference(&mut self, start: usize, message: &str) -> Result<()> {
        let terminator = match self.peek() {
            Some(b'<') => b'>',
            Some(b'\'') => b'\'',
            _ => return Err(ParseError::new(message, start)),
        };
        self.pos += 1;
        let name_start = self.pos;
        while let Some(byte) = self.peek() {
            if byte == terminator || byte == b'\n' || byte == b')' {
                break;
            }
            self.bump_char();
        }
        if self.pos == name_start || !self.eat(terminator) {
            return Err(ParseError::new(message, start));
        }
        Ok(())
    }

    // ── Groups ──────────────────────────────────────────────────────────

    fn parse_group(&mut self) -> Result<NodeId> {
        let start = self.pos;
        self.pos += 1;
        if !self.eat(b'?') {
            self.captures += 1;
            let number = self.captures;
            return self.parse_group_body(start, GroupKind::Capture { number }, None);
        }

        let Some(byte) = self.peek() else {
            return Err(ParseError::new("end pattern in group", start));
        };
        let kind = match (byte, self.peek_at(1)) {
            (b':', _) => GroupKind::Passive { implicit: false },
            (b'>', _) => GroupKind::Atomic,
            (b'=', _) => GroupKind::Lookahead,
            (b'!', _) => GroupKind::NegativeLookahead,
            (b'~', _) => GroupKind::Absence,
            (b'<', Some(b'=')) => {
                self.pos += 1;
                GroupKind::Lookbehind
            }
            (b'<', Some(b'!')) => {
                self.pos += 1;
                GroupKind::NegativeLookbehind
            }
            (b'<', _) | (b'\'', _) => {
                let terminator = if byte == b'<' { b'>' } else { b'\'' };
                self.pos += 1;
                let name = self.scan_group_name(terminator, start)?;
                self.captures += 1;
                let number = self.captures;
                return self.parse_group_body(start, GroupKind::Named { name, number }, None);
            }
            (b'#', _) => return self.parse_comment_group(start),
            (b'(', _) => return self.parse_conditional(start),
            _ => return self.parse_options(start),
        };
        self.pos += 1;
        self.parse_group_body(start, kind, None)
    }

    /// Parse up to and including the closing parenthesis. `extended` sets
    /// free-spacing mode for the group's contents only.
    fn parse_group_body(
        &mut self,
        start: usize,
        kind: GroupKind,
        extended: Option<bool>,
    ) -> Result<NodeId> {
        self.enter(start)?;
        let saved = self.extended;
        if let Some(extended) = extended {
            self.extended = extended;
        }

        let group = self.push(NodeKind::Group(kind), start..start);
        self.parse_branches(group)?;
        self.close_group(group, start)?;

        self.extended = saved;
        self.leave();
        Ok(group)
    }

    fn close_group(&mut self, group: NodeId, start: usize) -> Result<()> {
        if !self.eat(b')') {
            return Err(ParseError::new(
                "end pattern with unmatched parenthesis",
                start,
            ));
        }
        self.nodes[group.0].range.end = self.pos;
        Ok(())
    }

    fn scan_group_name(&mut self, terminator: u8, start: usize) -> Result<String> {
        let name_start = self.pos;
        while let Some(byte) = self.peek() {
            if byte == terminator {
                break;
            }
            if byte.is_ascii() && !(byte.is_ascii_alphanumeric() || byte == b'_') {
                return Err(ParseError::new("invalid group name", start));
            }
            self.bump_char();
        }
        let name = &self.text[name_start..self.pos];
        if !self.eat(terminator) || name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit())
        {
            return Err(ParseError::new("invalid group name", start));
        }
        Ok(name.to_string())
    }

    /// `(?# ... )` with the cursor on `#`.
    fn parse_comment_group(&mut self, start: usize) -> Result<NodeId> {
        self.pos += 1;
        loop {
            match self.peek() {
                None => return Err(ParseError::new("end pattern in group", start)),
                Some(b')') => {
                    self.pos += 1;
                    break;
                }
                Some(b'\\') => {
                    self.pos += 1;
                    if self.peek().is_some() {
                        self.bump_char();
                    }
                }
                Some(_) => self.bump_char(),
            }
        }
        Ok(self.push(NodeKind::Comment, start..self.pos))
    }

    /// `(?(cond)yes|no)` with the cursor on the condition's `(`.
    fn parse_conditional(&mut self, start: usize) -> Result<NodeId> {
        self.enter(start)?;
        let condition_start = self.pos;
        self.pos += 1;
        let valid = match self.peek() {
            Some(b'<') => {
                self.pos += 1;
                self.scan_group_name(b'>', start).is_ok()
            }
            Some(b'\'') => {
                self.pos += 1;
                self.scan_group_name(b'\'', start).is_ok()
            }
            _ => self.skip_while(|b| b.is_ascii_digit()) > 0,
        };
        if !valid || !self.eat(b')') {
            return Err(ParseError::new("invalid conditional pattern", condition_start));
        }

        let group = self.push(NodeKind::Group(GroupKind::Conditional), start..start);
        let condition = self.push(NodeKind::Condition, condition_start..self.pos);
        self.attach(group, [condition]);

        let saved = self.extended;
        self.parse_branches(group)?;
        let branches = self.nodes[group.0]
            .children
            .last()
            .filter(|&&last| self.nodes[last.0].kind == NodeKind::Alternation)
            .map_or(1, |&last| self.nodes[last.0].children.len());
        if branches > 2 {
            return Err(ParseError::new("invalid conditional pattern", start));
        }
        self.close_group(group, start)?;

        self.extended = saved;
        self.leave();
        Ok(group)
    }

    /// `(?imx-imx)` or `(?imx-imx:...)` with the cursor after `?`.
    fn parse_options(&mut self, start: usize) -> Result<NodeId> {
        let mut on = true;
        let mut extended = None;
        loop {
            match self.peek() {
                Some(b'i' | b'm') => self.pos += 1,
                Some(b'x') => {
                    extended = Some(on);
                    self.pos += 1;
                }
                Some(b'a' | b'd' | b'u') if on => self.pos += 1,
                Some(b'-') if on => {
                    on = false;
                    self.pos += 1;
                }
                Some(b':') => {
                    self.pos += 1;
                    return self.parse_group_body(start, GroupKind::Options, extended);
                }
                Some(b')') => {
                    self.pos += 1;
                    // Lasts until the enclosing group closes.
                    if let Some(extended) = extended {
                        self.extended = extended;
                    }
                    return Ok(self.push(NodeKind::OptionSwitch, start..self.pos));
                }
                None => return Err(ParseError::new("end pattern in group", start)),
                Some(_) => return Err(ParseError::new("undefined group option", self.pos)),
            }
        }
    }

    // ── Character sets ──────────────────────────────────────────────────

    fn parse_set(&mut self) -> Result<NodeId> {
        let start = self.pos;
        self.enter(start)?;
        self.pos += 1;
        let negated = self.eat(b'^');
        let set = self.push(NodeKind::CharacterSet { negated }, start..start);

        let mut sequences: Vec<(Range<usize>, Vec<NodeId>)> = Vec::new();
        let mut sequence_start = self.pos;
        let mut members = Vec::new();
        let mut first = true;
        loop {
            match (self.peek(), self.peek_at(1)) {
                (None, _) => return Err(ParseError::new("premature end of char-class", start)),
                // A leading `]` is a literal.
                (Some(b']'), _) if !first => break,
                (Some(b'&'), Some(b'&')) => {
                    sequences.push((sequence_start..self.pos, std::mem::take(&mut members)));
                    self.pos += 2;
                    sequence_start = self.pos;
                }
                _ => {
                    let member = self.parse_set_member(start)?;
                    members.push(member);
                }
            }
            first = false;
        }
        let close = self.pos;
        self.pos += 1;

        if sequences.is_empty() {
            self.attach(set, members);
        } else {
            sequences.push((sequence_start..close, members));
            let intersection = self.push(NodeKind::Intersection, sequences[0].0.start..close);
            for (range, members) in sequences {
                let sequence = self.push(NodeKind::IntersectedSequence, range);
                self.attach(sequence, members);
                self.attach(intersection, [sequence]);
            }
            self.attach(set, [intersection]);
        }

        self.nodes[set.0].range.end = self.pos;
        self.leave();
        Ok(set)
    }

    /// One set member, folding `a-z` into a range node.
    fn parse_set_member(&mut self, set_start: usize) -> Result<NodeId> {
        let start = self.pos;
        let from = self.parse_set_atom(set_start)?;
        if self.peek() != Some(b'-')
            || matches!(self.peek_at(1), None | Some(b']'))
            || !self.is_range_endpoint(from)
        {
            return Ok(from);
        }

        let dash = self.pos;
        self.pos += 1;
        let to = self.parse_set_atom(set_start)?;
        if !self.is_range_endpoint(to) {
            return Err(ParseError::new("char-class value at end of range", dash));
        }
        if self.nodes[from.0].kind == NodeKind::Literal
            && self.nodes[to.0].kind == NodeKind::Literal
        {
            let lo = self.text[self.nodes[from.0].range.clone()].chars().next();
            let hi = self.text[self.nodes[to.0].range.clone()].chars().next();
            if lo > hi {
                return Err(ParseError::new("empty range in char class", start));
            }
        }

        let range = self.push(NodeKind::CharacterRange, start..self.pos);
        self.attach(range, [from, to]);
        Ok(range)
    }

    fn is_range_endpoint(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].kind, NodeKind::Literal | NodeKind::Escape)
    }

    fn parse_set_atom(&mut self, set_start: usize) -> Result<NodeId> {
        let start = self.pos;
        match (self.peek(), self.peek_at(1)) {
            (None, _) => Err(ParseError::new("premature end of char-class", set_start)),
            (Some(b'['), Some(b':')) => match self.scan_posix_class()? {
                Some(kind) => Ok(self.push(kind, start..self.pos)),
                None => self.parse_set(),
            },
            (Some(b'['), _) => self.parse_set(),
            (Some(b'\\'), _) => self.parse_set_escape(),
            _ => {
                self.bump_char();
                Ok(self.push(NodeKind::Literal, start..self.pos))
            }
        }
    }

    /// `[:name:]` or `[:^name:]`. Leaves the cursor untouched and returns
    /// `None` when the text is not shaped like a POSIX class.
    fn scan_posix_class(&mut self) -> Result<Option<NodeKind>> {
        let start = self.pos;
        self.pos += 2;
        let negated = self.eat(b'^');
        let name_start = self.pos;
        self.skip_while(|b| b.is_ascii_alphabetic());
        let name = &self.text[name_start..self.pos];
        if name.is_empty() || !self.eat(b':') || !self.eat(b']') {
            self.pos = start;
            return Ok(None);
        }
        if !POSIX_CLASSES.contains(&name) {
            return Err(ParseError::new("invalid POSIX bracket type", start));
        }
        Ok(Some(NodeKind::PosixClass { negated }))
    }

    fn parse_set_escape(&mut self) -> Result<NodeId> {
        let start = self.pos;
        self.pos += 1;
        let kind = match self.peek() {
            None => return Err(ParseError::new("too short escape sequence", start)),
            Some(b'd' | b'D' | b'w' | b'W' | b's' | b'S' | b'h' | b'H') => {
                self.pos += 1;
                NodeKind::CharacterType
            }
            Some(b'p' | b'P') => self.scan_property(start)?,
            Some(b'1'..=b'9') => {
                self.skip_while(|b| b.is_ascii_digit());
                NodeKind::Escape
            }
            Some(_) => {
                self.scan_escape_body(start)?;
                NodeKind::Escape
            }
        };
        Ok(self.push(kind, start..self.pos))
    }
}
