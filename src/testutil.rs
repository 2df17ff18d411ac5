use crate::cop::{Cop, CopConfig};
use crate::correction::{Correction, CorrectionSet};
use crate::diagnostic::Diagnostic;
use crate::parse::parse_source;
use crate::parse::source::SourceFile;

/// An offense declared by a caret line in a fixture.
#[derive(Debug, Clone)]
pub struct ExpectedOffense {
    pub line: usize,
    pub column: usize,
    pub cop_name: String,
    pub message: String,
}

struct RawAnnotation {
    column: usize,
    cop_name: String,
    message: String,
}

/// Parse `   ^^^ Department/Name: message`.
///
/// The carets must be the first non-whitespace text on the line and be
/// followed by a space and a `Department/Name: ` prefix, so Ruby code such as
/// `a ^ b` or `/^foo/` is never mistaken for an annotation. The offense column
/// is the byte position of the first caret.
fn try_parse_annotation(line: &str) -> Option<RawAnnotation> {
    let trimmed = line.trim_start();
    if !trimmed.starts_with('^') {
        return None;
    }

    let caret_count = trimmed.bytes().take_while(|&b| b == b'^').count();
    let after_carets = trimmed[caret_count..].strip_prefix(' ')?;

    let rest = after_carets.trim_end();
    let (cop_name, message) = rest.split_once(": ")?;
    if !cop_name.contains('/') {
        return None;
    }

    Some(RawAnnotation {
        column: line.len() - trimmed.len(),
        cop_name: cop_name.to_string(),
        message: message.to_string(),
    })
}

/// Split a fixture into the Ruby source and the offenses it declares.
///
/// Each annotation refers to the closest source line above it. Line numbers
/// are 1-based and count source lines only.
///
/// # Panics
///
/// If an annotation comes before any source line.
pub fn parse_fixture(raw: &[u8]) -> (Vec<u8>, Vec<ExpectedOffense>) {
    let text = std::str::from_utf8(raw).expect("fixture must be valid UTF-8");

    let mut source_lines: Vec<&str> = Vec::new();
    let mut expected: Vec<ExpectedOffense> = Vec::new();

    for (raw_idx, element) in text.split('\n').enumerate() {
        match try_parse_annotation(element) {
            Some(annotation) => {
                assert!(
                    !source_lines.is_empty(),
                    "Annotation on raw line {} appears before any source line: {:?}",
                    raw_idx + 1,
                    element,
                );
                expected.push(ExpectedOffense {
                    line: source_lines.len(),
                    column: annotation.column,
                    cop_name: annotation.cop_name,
                    message: annotation.message,
                });
            }
            None => source_lines.push(element),
        }
    }

    (source_lines.join("\n").into_bytes(), expected)
}

/// Parse `source_bytes` and run one cop over it, collecting corrections too.
pub fn run_cop_with_corrections(
    cop: &dyn Cop,
    source_bytes: &[u8],
    config: CopConfig,
) -> (Vec<Diagnostic>, Vec<Correction>) {
    let source = SourceFile::from_bytes("test.rb", source_bytes.to_vec());
    let parse_result = parse_source(source.as_bytes());
    let mut diagnostics = Vec::new();
    let mut corrections = Vec::new();
    cop.check_source(
        &source,
        &parse_result,
        &config,
        &mut diagnostics,
        Some(&mut corrections),
    );
    (diagnostics, corrections)
}

pub fn run_cop_full(cop: &dyn Cop, source_bytes: &[u8]) -> Vec<Diagnostic> {
    run_cop_full_with_config(cop, source_bytes, CopConfig::default())
}

pub fn run_cop_full_with_config(
    cop: &dyn Cop,
    source_bytes: &[u8],
    config: CopConfig,
) -> Vec<Diagnostic> {
    run_cop_with_corrections(cop, source_bytes, config).0
}

/// Source after one round of the cop's corrections.
pub fn autocorrect_once(cop: &dyn Cop, source_bytes: &[u8]) -> Vec<u8> {
    let (_, corrections) = run_cop_with_corrections(cop, source_bytes, CopConfig::default());
    CorrectionSet::from_vec(corrections).apply(source_bytes)
}

pub fn assert_cop_offenses(cop: &dyn Cop, fixture_bytes: &[u8]) {
    assert_cop_offenses_with_config(cop, fixture_bytes, CopConfig::default());
}

/// Run the cop over a caret fixture and compare against its annotations,
/// ignoring emission order.
pub fn assert_cop_offenses_with_config(cop: &dyn Cop, fixture_bytes: &[u8], config: CopConfig) {
    let (clean_source, mut expected) = parse_fixture(fixture_bytes);
    let mut diagnostics = run_cop_full_with_config(cop, &clean_source, config);

    expected.sort_by_key(|e| (e.line, e.column));
    diagnostics.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

    assert_eq!(
        diagnostics.len(),
        expected.len(),
        "Expected {} offense(s) but got {}.\nExpected:\n{}\nActual:\n{}",
        expected.len(),
        diagnostics.len(),
        format_expected(&expected),
        format_diagnostics(&diagnostics),
    );

    for (i, (diag, exp)) in diagnostics.iter().zip(expected.iter()).enumerate() {
        assert_eq!(
            (diag.location.line, diag.location.column),
            (exp.line, exp.column),
            "Offense #{}: position mismatch\n  expected: {}:{} {}: {}\n  actual:   {diag}",
            i + 1,
            exp.line,
            exp.column,
            exp.cop_name,
            exp.message,
        );
        assert_eq!(diag.cop_name, exp.cop_name, "Offense #{}: cop name mismatch", i + 1);
        assert_eq!(diag.message, exp.message, "Offense #{}: message mismatch", i + 1);
    }
}

pub fn assert_cop_no_offenses(cop: &dyn Cop, source_bytes: &[u8]) {
    assert_cop_no_offenses_with_config(cop, source_bytes, CopConfig::default());
}

pub fn assert_cop_no_offenses_with_config(cop: &dyn Cop, source_bytes: &[u8], config: CopConfig) {
    let diagnostics = run_cop_full_with_config(cop, source_bytes, config);
    assert!(
        diagnostics.is_empty(),
        "Expected no offenses but got {}:\n{}",
        diagnostics.len(),
        format_diagnostics(&diagnostics),
    );
}

/// Correct the source of a caret fixture once and compare with `expected`.
pub fn assert_cop_autocorrect(cop: &dyn Cop, fixture_bytes: &[u8], expected: &[u8]) {
    let (clean_source, _) = parse_fixture(fixture_bytes);
    let corrected = autocorrect_once(cop, &clean_source);
    assert_eq!(
        String::from_utf8_lossy(&corrected),
        String::from_utf8_lossy(expected),
        "{} autocorrect output mismatch",
        cop.name(),
    );
}

/// `offense.rb` and `no_offense.rb` tests for a cop, read from
/// `testdata/<path>/`.
#[macro_export]
macro_rules! cop_fixture_tests {
    ($cop:expr, $path:literal) => {
        #[test]
        fn offense_fixture() {
            $crate::testutil::assert_cop_offenses(
                &$cop,
                include_bytes!(concat!(
                    env!("CARGO_MANIFEST_DIR"),
                    "/testdata/",
                    $path,
                    "/offense.rb"
                )),
            );
        }

        #[test]
        fn no_offense_fixture() {
            $crate::testutil::assert_cop_no_offenses(
                &$cop,
                include_bytes!(concat!(
                    env!("CARGO_MANIFEST_DIR"),
                    "/testdata/",
                    $path,
                    "/no_offense.rb"
                )),
            );
        }
    };
}

/// Like `cop_fixture_tests!`, plus a check that correcting `offense.rb`
/// yields `corrected.rb`.
#[macro_export]
macro_rules! cop_autocorrect_fixture_tests {
    ($cop:expr, $path:literal) => {
        $crate::cop_fixture_tests!($cop, $path);

        #[test]
        fn autocorrect_fixture() {
            $crate::testutil::assert_cop_autocorrect(
                &$cop,
                include_bytes!(concat!(
                    env!("CARGO_MANIFEST_DIR"),
                    "/testdata/",
                    $path,
                    "/offense.rb"
                )),
                include_bytes!(concat!(
                    env!("CARGO_MANIFEST_DIR"),
                    "/testdata/",
                    $path,
                    "/corrected.rb"
                )),
            );
        }
    };
}

fn format_expected(expected: &[ExpectedOffense]) -> String {
    expected
        .iter()
        .map(|e| format!("  {}:{} {}: {}", e.line, e.column, e.cop_name, e.message))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| format!("  {d}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cop::layout::empty_lines::EmptyLines;

    #[test]
    fn annotation_with_indent() {
        let ann = try_parse_annotation("     ^^^ Layout/Foo: some message").unwrap();
        assert_eq!(ann.column, 5);
        assert_eq!(ann.cop_name, "Layout/Foo");
        assert_eq!(ann.message, "some message");
    }

    #[test]
    fn annotation_at_column_zero() {
        let ann = try_parse_annotation("^ Lint/Bar: Use `x` instead of 'y'.").unwrap();
        assert_eq!(ann.column, 0);
        assert_eq!(ann.message, "Use `x` instead of 'y'.");
    }

    #[test]
    fn rejects_ruby_code() {
        assert!(try_parse_annotation("x = 1").is_none());
        assert!(try_parse_annotation("result = a ^ b").is_none());
        assert!(try_parse_annotation("/^foo/").is_none());
        assert!(try_parse_annotation("  puts \"^hello\"").is_none());
        assert!(try_parse_annotation("").is_none());
    }

    #[test]
    fn rejects_malformed_annotations() {
        assert!(try_parse_annotation("^^^ no slash here").is_none());
        assert!(try_parse_annotation("^^^Layout/Foo: msg").is_none());
        assert!(try_parse_annotation("^^^ Layout/Foo msg").is_none());
        assert!(try_parse_annotation("^^^ Layout/Foo:msg").is_none());
    }

    #[test]
    fn fixture_strips_annotations() {
        let raw = b"x = 1\n     ^^^ Layout/Foo: msg\ny = 2\n";
        let (clean, expected) = parse_fixture(raw);
        assert_eq!(clean, b"x = 1\ny = 2\n");
        assert_eq!(expected.len(), 1);
        assert_eq!((expected[0].line, expected[0].column), (1, 5));
    }

    #[test]
    fn fixture_annotation_on_blank_line() {
        let raw = b"x = 1\n\n^ Layout/EmptyLines: m\ny = 2\n";
        let (clean, expected) = parse_fixture(raw);
        assert_eq!(clean, b"x = 1\n\ny = 2\n");
        assert_eq!(expected[0].line, 2);
    }

    #[test]
    #[should_panic(expected = "appears before any source line")]
    fn fixture_annotation_first_panics() {
        parse_fixture(b"^^^ A/B: should panic\nx = 1\n");
    }

    #[test]
    fn run_cop_full_reports_offenses() {
        let diags = run_cop_full(&EmptyLines, b"x = 1\n\n\ny = 2\n");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].path, "test.rb");
    }

    #[test]
    fn autocorrect_once_applies_edits() {
        assert_eq!(
            autocorrect_once(&EmptyLines, b"x = 1\n\n\ny = 2\n"),
            b"x = 1\n\ny = 2\n"
        );
    }
}
