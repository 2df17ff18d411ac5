use super::location::Edge;
use super::parser::{DEFAULT_DEPTH_LIMIT, Parser};
use super::sanitize::sanitize;
use super::tree::ExpressionTree;
use super::{ParseError, PatternSource};

/// Turns a `PatternSource` into an `ExpressionTree`.
#[derive(Debug, Clone, Copy)]
pub struct PatternTreeBuilder {
    depth_limit: usize,
}

impl Default for PatternTreeBuilder {
    fn default() -> Self {
        Self {
            depth_limit: DEFAULT_DEPTH_LIMIT,
        }
    }
}

impl PatternTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth_limit(mut self, depth_limit: usize) -> Self {
        self.depth_limit = depth_limit;
        self
    }

    pub fn build(&self, source: &PatternSource) -> Result<ExpressionTree, ParseError> {
        let (pattern, map) = sanitize(source)?;
        let nodes = Parser::new(pattern.as_str(), source.options.extended)
            .with_depth_limit(self.depth_limit)
            .parse()
            .map_err(|mut err| {
                err.position = Some(map.position(err.offset, Edge::Start));
                err
            })?;
        let interpolations = source
            .interpolations
            .iter()
            .map(|segment| segment.range.clone())
            .collect();
        Ok(ExpressionTree::new(
            pattern,
            source.options,
            nodes,
            map,
            interpolations,
        ))
    }
}

/// Build with default settings.
pub fn build(source: &PatternSource) -> Result<ExpressionTree, ParseError> {
    PatternTreeBuilder::default().build(source)
}
