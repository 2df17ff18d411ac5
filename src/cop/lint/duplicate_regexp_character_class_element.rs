use std::collections::HashSet;

use crate::cop::{Cop, CopConfig};
use crate::correction::Correction;
use crate::diagnostic::{Diagnostic, Severity};
use crate::parse::source::SourceFile;
use crate::regexp::{ExpressionTree, NodeId, NodeKind, build, regexp_literals};

const MSG: &str = "Duplicate element inside regexp character class";

/// Checks for duplicate elements in Regexp character classes.
/// For example, `/[xyx]/` has a duplicate `x`.
pub struct DuplicateRegexpCharacterClassElement;

impl Cop for DuplicateRegexpCharacterClassElement {
    fn name(&self) -> &'static str {
        "Lint/DuplicateRegexpCharacterClassElement"
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn supports_autocorrect(&self) -> bool {
        true
    }

    fn check_source(
        &self,
        source: &SourceFile,
        parse_result: &ruby_prism::ParseResult<'_>,
        _config: &CopConfig,
        diagnostics: &mut Vec<Diagnostic>,
        mut corrections: Option<&mut Vec<Correction>>,
    ) {
        for literal in regexp_literals(source, parse_result) {
            let tree = match build(&literal.source) {
                Ok(tree) => tree,
                Err(err) => {
                    tracing::warn!(
                        path = %source.path_str(),
                        line = literal.source.origin.line,
                        "{}: skipping regexp: {err}",
                        self.name()
                    );
                    continue;
                }
            };

            for id in repeated_elements(&tree) {
                let span = tree.resolve(id);
                let mut diagnostic = self.diagnostic(
                    source,
                    span.start.line,
                    span.start.column,
                    MSG.to_string(),
                );
                if let Some(ref mut corr) = corrections {
                    let range = span.byte_range();
                    corr.push(Correction::delete(range.start, range.end, self.name()));
                    diagnostic.corrected = true;
                }
                diagnostics.push(diagnostic);
            }
        }
    }
}

/// Set members whose text already appeared earlier in the same set.
///
/// Sets holding an intersection are skipped, as are members that overlap an
/// interpolation since their runtime text is unknown.
fn repeated_elements(tree: &ExpressionTree) -> Vec<NodeId> {
    let mut repeated = Vec::new();
    for set in tree.each_expression() {
        if !matches!(tree.kind(set), NodeKind::CharacterSet { .. }) {
            continue;
        }
        let members = tree.children(set);
        if members
            .iter()
            .any(|&m| matches!(tree.kind(m), NodeKind::Intersection))
        {
            continue;
        }

        let mut seen = HashSet::new();
        for &member in members {
            if tree.is_interpolated(member) {
                continue;
            }
            if !seen.insert(tree.text(member)) {
                repeated.push(member);
            }
        }
    }
    repeated
}
