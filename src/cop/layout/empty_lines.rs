use crate::blank_lines::BlankLineScanner;
use crate::cop::{Cop, CopConfig};
use crate::correction::Correction;
use crate::diagnostic::Diagnostic;
use crate::parse::source::SourceFile;
use crate::parse::tokens::tokenize;

const MSG: &str = "Extra blank line detected.";

/// Flags runs of more than `Max` consecutive blank lines. Blank lines inside
/// string, regexp and heredoc bodies are part of the literal and never count.
pub struct EmptyLines;

impl Cop for EmptyLines {
    fn name(&self) -> &'static str {
        "Layout/EmptyLines"
    }

    fn supports_autocorrect(&self) -> bool {
        true
    }

    fn check_source(
        &self,
        source: &SourceFile,
        parse_result: &ruby_prism::ParseResult<'_>,
        config: &CopConfig,
        diagnostics: &mut Vec<Diagnostic>,
        mut corrections: Option<&mut Vec<Correction>>,
    ) {
        let scanner = BlankLineScanner::new(config.get_usize("Max", 1));
        let tokens = tokenize(source, parse_result);

        let excess_spans = match scanner.offenses(&tokens) {
            Ok(spans) => spans,
            Err(err) => {
                tracing::warn!(path = %source.path_str(), "{}: {err}", self.name());
                return;
            }
        };

        for excess in excess_spans {
            diagnostics.push(self.diagnostic(source, excess.first, 0, MSG.to_string()));

            if let Some(ref mut corr) = corrections {
                let Some(start) = source.line_start(excess.first) else {
                    continue;
                };
                let end = source
                    .line_start(excess.last + 1)
                    .unwrap_or(source.as_bytes().len());
                corr.push(Correction::delete(start, end, self.name()));
                if let Some(last) = diagnostics.last_mut() {
                    last.corrected = true;
                }
            }
        }
    }
}
