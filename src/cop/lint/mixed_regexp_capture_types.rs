use crate::cop::{Cop, CopConfig};
use crate::correction::Correction;
use crate::diagnostic::{Diagnostic, Severity};
use crate::parse::source::SourceFile;
use crate::regexp::{build, regexp_literals};

/// Named and numbered groups in one regexp: numbered groups stop capturing
/// once a named one is present, which is rarely intended.
pub struct MixedRegexpCaptureTypes;

impl Cop for MixedRegexpCaptureTypes {
    fn name(&self) -> &'static str {
        "Lint/MixedRegexpCaptureTypes"
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn check_source(
        &self,
        source: &SourceFile,
        parse_result: &ruby_prism::ParseResult<'_>,
        _config: &CopConfig,
        diagnostics: &mut Vec<Diagnostic>,
        _corrections: Option<&mut Vec<Correction>>,
    ) {
        for literal in regexp_literals(source, parse_result) {
            // The interpolated parts may add groups of either kind.
            if literal.is_interpolated() {
                continue;
            }

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

            let has_named = tree.each_capture(Some(true)).next().is_some();
            let has_numbered = tree.each_capture(Some(false)).next().is_some();
            if has_named && has_numbered {
                let (line, column) = source.offset_to_line_col(literal.range.start);
                diagnostics.push(self.diagnostic(
                    source,
                    line,
                    column,
                    "Do not mix named captures and numbered captures in a Regexp literal."
                        .to_string(),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{assert_cop_no_offenses, assert_cop_offenses, run_cop_full};

    crate::cop_fixture_tests!(MixedRegexpCaptureTypes, "cops/lint/mixed_regexp_capture_types");

    #[test]
    fn reports_at_literal_start() {
        assert_cop_offenses(
            &MixedRegexpCaptureTypes,
            b"if line =~ %r{(\\d+)-(?'word'\\w+)}x\n           ^ Lint/MixedRegexpCaptureTypes: Do not mix named captures and numbered captures in a Regexp literal.\n  1\nend\n",
        );
    }

    #[test]
    fn passive_and_lookaround_groups_do_not_count() {
        assert_cop_no_offenses(
            &MixedRegexpCaptureTypes,
            b"/(?<foo>bar)(?:baz)(?=q)(?<=r)(?!s)(?<!t)(?>u)/\n",
        );
    }

    #[test]
    fn parentheses_in_sets_and_escapes() {
        assert_cop_no_offenses(&MixedRegexpCaptureTypes, b"/(?<foo>bar)[(]\\(x\\)/\n");
    }

    #[test]
    fn free_spacing_comments_are_ignored() {
        assert_cop_no_offenses(
            &MixedRegexpCaptureTypes,
            b"/(?<year>\\d{4}) # (numbered)\n /x\n",
        );
    }

    #[test]
    fn interpolated_regexp_is_skipped() {
        assert_cop_no_offenses(&MixedRegexpCaptureTypes, b"/(?<foo>#{bar})(baz)/\n");
    }

    #[test]
    fn invalid_regexp_is_skipped() {
        assert!(run_cop_full(&MixedRegexpCaptureTypes, b"x = /(?<a>b)(c/\n").is_empty());
    }

    #[test]
    fn invalid_regexp_does_not_hide_later_literals() {
        assert_cop_offenses(
            &MixedRegexpCaptureTypes,
            b"x = /(?<a>b)(c/\ny = /(?<d>e)(f)/\n    ^ Lint/MixedRegexpCaptureTypes: Do not mix named captures and numbered captures in a Regexp literal.\n",
        );
    }
}
