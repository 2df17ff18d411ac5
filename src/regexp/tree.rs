use std::fmt;
use std::ops::Range;

use super::captures::Captures;
use super::location::{PositionMap, SourceSpan};
use super::sanitize::SanitizedPattern;
use super::RegexpOptions;

/// Index of a node in its tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Alternation,
    /// One branch of an alternation.
    Alternative,
    /// A run of plain characters.
    Literal,
    /// Free-spacing whitespace.
    Whitespace,
    /// Free-spacing `# ...` comment or a `(?# ...)` group.
    Comment,
    Dot,
    /// `^`, `$`, `\A`, `\z`, `\Z`, `\b`, `\B`, `\G`, `\K`
    Anchor,
    /// `\d`, `\w`, `\s`, `\h`, `\R`, `\X` and their negations.
    CharacterType,
    Escape,
    /// `\p{...}`, `\P{...}`, `\p{^...}`
    Property { negated: bool },
    /// `\1`, `\k<name>`, `\g<name>`
    Backreference,
    Group(GroupKind),
    /// The `(1)` or `(<name>)` test of a conditional group.
    Condition,
    /// `(?imx-imx)` applying to the rest of the enclosing group.
    OptionSwitch,
    CharacterSet { negated: bool },
    /// `a-z` inside a set; children are both endpoints.
    CharacterRange,
    /// `[:alpha:]`, `[:^alpha:]`
    PosixClass { negated: bool },
    /// `&&` inside a set; children are intersected sequences.
    Intersection,
    IntersectedSequence,
}

impl NodeKind {
    pub fn token(&self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Alternation => "alternation",
            NodeKind::Alternative => "alternative",
            NodeKind::Literal => "literal",
            NodeKind::Whitespace => "whitespace",
            NodeKind::Comment => "comment",
            NodeKind::Dot => "dot",
            NodeKind::Anchor => "anchor",
            NodeKind::CharacterType => "type",
            NodeKind::Escape => "escape",
            NodeKind::Property { .. } => "property",
            NodeKind::Backreference => "backref",
            NodeKind::Group(kind) => kind.token(),
            NodeKind::Condition => "condition",
            NodeKind::OptionSwitch => "option_switch",
            NodeKind::CharacterSet { .. } => "character_set",
            NodeKind::CharacterRange => "range",
            NodeKind::PosixClass { .. } => "posixclass",
            NodeKind::Intersection => "intersection",
            NodeKind::IntersectedSequence => "intersected_sequence",
        }
    }

    /// Whitespace and comments that only exist in free-spacing mode.
    pub fn is_free_space(&self) -> bool {
        matches!(self, NodeKind::Whitespace | NodeKind::Comment)
    }

    pub fn group(&self) -> Option<&GroupKind> {
        match self {
            NodeKind::Group(kind) => Some(kind),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupKind {
    Capture { number: usize },
    Named { name: String, number: usize },
    /// `(?:...)`, or a group inserted to carry a stacked quantifier.
    Passive { implicit: bool },
    Atomic,
    Lookahead,
    NegativeLookahead,
    Lookbehind,
    NegativeLookbehind,
    /// `(?~...)`
    Absence,
    /// `(?imx-imx:...)`
    Options,
    /// `(?(cond)yes|no)`
    Conditional,
}

impl GroupKind {
    pub fn token(&self) -> &'static str {
        match self {
            GroupKind::Capture { .. } => "capture",
            GroupKind::Named { .. } => "named",
            GroupKind::Passive { .. } => "passive",
            GroupKind::Atomic => "atomic",
            GroupKind::Lookahead => "lookahead",
            GroupKind::NegativeLookahead => "nlookahead",
            GroupKind::Lookbehind => "lookbehind",
            GroupKind::NegativeLookbehind => "nlookbehind",
            GroupKind::Absence => "absence",
            GroupKind::Options => "options",
            GroupKind::Conditional => "conditional",
        }
    }

    pub fn is_capture(&self) -> bool {
        matches!(self, GroupKind::Capture { .. } | GroupKind::Named { .. })
    }

    /// Capture number, counted by opening parenthesis.
    pub fn number(&self) -> Option<usize> {
        match self {
            GroupKind::Capture { number } | GroupKind::Named { number, .. } => Some(*number),
            _ => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            GroupKind::Named { name, .. } => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantifierKind {
    ZeroOrOne,
    ZeroOrMore,
    OneOrMore,
    Interval,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantifierMode {
    Greedy,
    Reluctant,
    Possessive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quantifier {
    pub kind: QuantifierKind,
    pub min: usize,
    /// `None` for unbounded.
    pub max: Option<usize>,
    pub mode: QuantifierMode,
    /// Byte range of the quantifier text itself.
    pub range: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressionNode {
    pub kind: NodeKind,
    /// Byte range within the sanitized pattern. Covers the quantifier only
    /// when it directly follows the node; in free-spacing mode (`a +`) the
    /// whitespace stays a sibling and the quantifier is only on `quantifier`.
    pub range: Range<usize>,
    pub quantifier: Option<Quantifier>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl ExpressionNode {
    pub(crate) fn new(kind: NodeKind, range: Range<usize>) -> Self {
        Self {
            kind,
            range,
            quantifier: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn is_capture(&self) -> bool {
        self.kind.group().is_some_and(GroupKind::is_capture)
    }
}

/// A parsed pattern together with the table that maps it back to the file.
#[derive(Debug, Clone)]
pub struct ExpressionTree {
    pattern: SanitizedPattern,
    options: RegexpOptions,
    nodes: Vec<ExpressionNode>,
    map: PositionMap,
    interpolations: Vec<Range<usize>>,
}

impl ExpressionTree {
    pub(crate) fn new(
        pattern: SanitizedPattern,
        options: RegexpOptions,
        nodes: Vec<ExpressionNode>,
        map: PositionMap,
        interpolations: Vec<Range<usize>>,
    ) -> Self {
        Self {
            pattern,
            options,
            nodes,
            map,
            interpolations,
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &ExpressionNode {
        &self.nodes[id.0]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// The node's text in the sanitized pattern.
    pub fn text(&self, id: NodeId) -> &str {
        &self.pattern.as_str()[self.node(id).range.clone()]
    }

    pub fn pattern(&self) -> &SanitizedPattern {
        &self.pattern
    }

    pub fn options(&self) -> RegexpOptions {
        self.options
    }

    pub fn position_map(&self) -> &PositionMap {
        &self.map
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Every node below the root, depth-first pre-order.
    pub fn each_expression(&self) -> impl Iterator<Item = NodeId> + '_ {
        let mut stack: Vec<NodeId> = self.children(self.root()).iter().rev().copied().collect();
        std::iter::from_fn(move || {
            let id = stack.pop()?;
            stack.extend(self.children(id).iter().rev());
            Some(id)
        })
    }

    /// Capture groups in pre-order. `Some(true)` keeps only named groups,
    /// `Some(false)` only numbered ones.
    pub fn each_capture(&self, named: Option<bool>) -> Captures<'_> {
        Captures::new(self, named)
    }

    pub fn resolve(&self, id: NodeId) -> SourceSpan {
        super::location::resolve(self, id)
    }

    /// Whether any part of the node's range came from an interpolation.
    pub fn is_interpolated(&self, id: NodeId) -> bool {
        let range = &self.node(id).range;
        self.interpolations
            .iter()
            .any(|interp| interp.start < range.end && range.start < interp.end)
    }
}

impl fmt::Display for ExpressionTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.pattern, f)
    }
}
