use super::tree::{ExpressionTree, GroupKind, NodeId, NodeKind};

/// Depth-first pre-order walk over the capture groups of a tree.
///
/// Every call to `ExpressionTree::each_capture` starts a fresh walk.
pub struct Captures<'t> {
    tree: &'t ExpressionTree,
    stack: Vec<NodeId>,
    named: Option<bool>,
}

impl<'t> Captures<'t> {
    pub(crate) fn new(tree: &'t ExpressionTree, named: Option<bool>) -> Self {
        Self {
            tree,
            stack: vec![tree.root()],
            named,
        }
    }

    fn wanted(&self, kind: &NodeKind) -> bool {
        match (kind, self.named) {
            (NodeKind::Group(GroupKind::Named { .. }), None | Some(true)) => true,
            (NodeKind::Group(GroupKind::Capture { .. }), None | Some(false)) => true,
            _ => false,
        }
    }
}

impl Iterator for Captures<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while let Some(id) = self.stack.pop() {
            self.stack.extend(self.tree.children(id).iter().rev());
            if self.wanted(self.tree.kind(id)) {
                return Some(id);
            }
        }
        None
    }
}
