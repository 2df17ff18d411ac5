use std::io::Write;
use std::path::PathBuf;

use crate::diagnostic::Diagnostic;
use crate::formatter::Formatter;

/// `path:line:col: S: Cop/Name: message` per offense, then a summary line.
pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_to(&self, diagnostics: &[Diagnostic], files: &[PathBuf], out: &mut dyn Write) {
        for d in diagnostics {
            let _ = writeln!(out, "{d}");
        }
        let file_count = files.len();
        let file_word = if file_count == 1 { "file" } else { "files" };
        let offense_word = if diagnostics.len() == 1 {
            "offense"
        } else {
            "offenses"
        };
        let corrected = diagnostics.iter().filter(|d| d.corrected).count();
        let corrected_part = if corrected > 0 {
            format!(", {corrected} corrected")
        } else {
            String::new()
        };
        let _ = writeln!(
            out,
            "\n{file_count} {file_word} inspected, {} {offense_word} detected{corrected_part}",
            diagnostics.len(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::{Location, Severity};

    fn diag(line: usize, corrected: bool) -> Diagnostic {
        Diagnostic {
            path: "lib/a.rb".to_string(),
            location: Location { line, column: 4 },
            severity: Severity::Warning,
            cop_name: "Lint/MixedRegexpCaptureTypes".to_string(),
            message: "msg".to_string(),
            corrected,
        }
    }

    fn render(diagnostics: &[Diagnostic], files: usize) -> String {
        let files: Vec<PathBuf> = (0..files).map(|i| PathBuf::from(format!("{i}.rb"))).collect();
        let mut buf = Vec::new();
        TextFormatter.format_to(diagnostics, &files, &mut buf);
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn no_offenses() {
        assert_eq!(render(&[], 1), "\n1 file inspected, 0 offenses detected\n");
    }

    #[test]
    fn offense_lines_and_summary() {
        assert_eq!(
            render(&[diag(2, false)], 3),
            "lib/a.rb:2:4: W: Lint/MixedRegexpCaptureTypes: msg\n\
             \n3 files inspected, 1 offense detected\n"
        );
    }

    #[test]
    fn corrected_offenses() {
        let out = render(&[diag(1, true), diag(5, false)], 1);
        assert!(out.contains("lib/a.rb:1:4: W: [Corrected] Lint/MixedRegexpCaptureTypes: msg\n"));
        assert!(out.ends_with("1 file inspected, 2 offenses detected, 1 corrected\n"));
    }
}
