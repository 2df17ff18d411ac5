use std::io::Write;
use std::path::PathBuf;

use serde::Serialize;

use crate::diagnostic::Diagnostic;
use crate::formatter::Formatter;

pub struct JsonFormatter;

#[derive(Serialize)]
struct JsonOutput<'a> {
    metadata: Metadata,
    offenses: Vec<Offense<'a>>,
}

#[derive(Serialize)]
struct Metadata {
    files_inspected: usize,
    offense_count: usize,
    corrected_count: usize,
}

#[derive(Serialize)]
struct Offense<'a> {
    path: &'a str,
    line: usize,
    column: usize,
    severity: String,
    cop_name: &'a str,
    message: &'a str,
    corrected: bool,
}

impl Formatter for JsonFormatter {
    fn format_to(&self, diagnostics: &[Diagnostic], files: &[PathBuf], out: &mut dyn Write) {
        let output = JsonOutput {
            metadata: Metadata {
                files_inspected: files.len(),
                offense_count: diagnostics.len(),
                corrected_count: diagnostics.iter().filter(|d| d.corrected).count(),
            },
            offenses: diagnostics
                .iter()
                .map(|d| Offense {
                    path: &d.path,
                    line: d.location.line,
                    column: d.location.column,
                    severity: d.severity.letter().to_string(),
                    cop_name: &d.cop_name,
                    message: &d.message,
                    corrected: d.corrected,
                })
                .collect(),
        };
        match serde_json::to_string_pretty(&output) {
            Ok(json) => {
                let _ = writeln!(out, "{json}");
            }
            Err(e) => tracing::error!("failed to serialize offenses: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::{Location, Severity};

    fn render(diagnostics: &[Diagnostic], files: &[PathBuf]) -> serde_json::Value {
        let mut buf = Vec::new();
        JsonFormatter.format_to(diagnostics, files, &mut buf);
        serde_json::from_slice(&buf).unwrap()
    }

    #[test]
    fn empty_produces_valid_json() {
        let parsed = render(&[], &[]);
        assert_eq!(parsed["metadata"]["files_inspected"], 0);
        assert_eq!(parsed["metadata"]["offense_count"], 0);
        assert!(parsed["offenses"].as_array().unwrap().is_empty());
    }

    #[test]
    fn offense_fields() {
        let d = Diagnostic {
            path: "a.rb".to_string(),
            location: Location { line: 2, column: 7 },
            severity: Severity::Warning,
            cop_name: "Lint/DuplicateRegexpCharacterClassElement".to_string(),
            message: "Duplicate element inside regexp character class".to_string(),
            corrected: true,
        };
        let parsed = render(&[d], &[PathBuf::from("a.rb")]);
        assert_eq!(parsed["metadata"]["corrected_count"], 1);
        let offense = &parsed["offenses"][0];
        assert_eq!(offense["path"], "a.rb");
        assert_eq!(offense["line"], 2);
        assert_eq!(offense["column"], 7);
        assert_eq!(offense["severity"], "W");
        assert_eq!(offense["cop_name"], "Lint/DuplicateRegexpCharacterClassElement");
        assert_eq!(offense["corrected"], true);
    }

    mod prop_tests {
        use super::*;
        use proptest::prelude::*;

        fn diagnostic_strategy() -> impl Strategy<Value = Diagnostic> {
            (
                "[a-z]{1,10}\\.rb",
                1usize..500,
                0usize..200,
                prop::sample::select(vec![
                    Severity::Convention,
                    Severity::Warning,
                    Severity::Error,
                    Severity::Fatal,
                ]),
                "[a-z \"\\\\]{1,30}",
            )
                .prop_map(|(path, line, column, severity, message)| Diagnostic {
                    path,
                    location: Location { line, column },
                    severity,
                    cop_name: "Layout/EmptyLines".to_string(),
                    message,
                    corrected: false,
                })
        }

        proptest! {
            #[test]
            fn output_round_trips_messages(
                diagnostics in prop::collection::vec(diagnostic_strategy(), 0..10),
            ) {
                let parsed = render(&diagnostics, &[]);
                prop_assert_eq!(
                    parsed["metadata"]["offense_count"].as_u64().unwrap() as usize,
                    diagnostics.len()
                );
                for (d, o) in diagnostics.iter().zip(parsed["offenses"].as_array().unwrap()) {
                    prop_assert_eq!(o["message"].as_str().unwrap(), d.message.as_str());
                }
            }
        }
    }
}
