use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;

use crate::cli::Args;
use crate::config::ResolvedConfig;
use crate::cop::registry::CopRegistry;
use crate::correction::{Correction, CorrectionSet};
use crate::diagnostic::Diagnostic;
use crate::parse::source::SourceFile;

const MAX_ITERATIONS: usize = 200;

pub struct LintResult {
    pub diagnostics: Vec<Diagnostic>,
    pub file_count: usize,
    pub corrected_count: usize,
}

/// Lint a single SourceFile (already loaded into memory). Used for --stdin mode.
pub fn lint_source(
    source: &SourceFile,
    config: &ResolvedConfig,
    registry: &CopRegistry,
    args: &Args,
) -> LintResult {
    let (mut diagnostics, _corrected_bytes, corrected_count) =
        lint_source_inner(source, config, registry, args);
    diagnostics.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    LintResult {
        diagnostics,
        file_count: 1,
        corrected_count,
    }
}

pub fn run_linter(
    files: &[std::path::PathBuf],
    config: &ResolvedConfig,
    registry: &CopRegistry,
    args: &Args,
) -> LintResult {
    let total_corrected = AtomicUsize::new(0);

    let mut diagnostics: Vec<Diagnostic> = files
        .par_iter()
        .flat_map(|path| lint_file(path, config, registry, args, &total_corrected))
        .collect();
    diagnostics.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

    LintResult {
        diagnostics,
        file_count: files.len(),
        corrected_count: total_corrected.load(Ordering::Relaxed),
    }
}

fn lint_file(
    path: &Path,
    config: &ResolvedConfig,
    registry: &CopRegistry,
    args: &Args,
    total_corrected: &AtomicUsize,
) -> Vec<Diagnostic> {
    let source = match SourceFile::from_path(path) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("{e:#}");
            return Vec::new();
        }
    };

    let (result, corrected_bytes, corrected_count) =
        lint_source_inner(&source, config, registry, args);
    if corrected_count > 0 {
        total_corrected.fetch_add(corrected_count, Ordering::Relaxed);
    }

    if let Some(bytes) = corrected_bytes {
        match std::fs::write(path, &bytes) {
            Ok(()) => tracing::debug!(path = %path.display(), "wrote corrected file"),
            Err(e) => tracing::error!(
                "failed to write corrected file {}: {e}",
                path.display()
            ),
        }
    }

    result
}

/// Validate that corrected bytes are still valid Ruby by re-parsing with Prism.
/// Returns `None` (discarding corrections) if nothing changed or parse errors
/// are found.
fn validate_corrected_bytes(
    original_bytes: &[u8],
    current_bytes: Vec<u8>,
    path: &Path,
) -> Option<Vec<u8>> {
    if current_bytes == original_bytes {
        return None;
    }
    // Scope the parse so its borrow of current_bytes ends before we move it.
    let has_errors = {
        let parse_result = crate::parse::parse_source(&current_bytes);
        parse_result.errors().count() > 0
    };
    if has_errors {
        tracing::warn!(
            path = %path.display(),
            "autocorrect produced invalid syntax, skipping corrections"
        );
        return None;
    }
    Some(current_bytes)
}

/// Returns (diagnostics, corrected_bytes, corrected_count).
fn lint_source_inner(
    source: &SourceFile,
    config: &ResolvedConfig,
    registry: &CopRegistry,
    args: &Args,
) -> (Vec<Diagnostic>, Option<Vec<u8>>, usize) {
    if !args.autocorrect {
        let (diags, _) = lint_source_once(source, config, registry, args, false);
        return (diags, None, 0);
    }

    let original_bytes = source.as_bytes();
    let mut current_bytes = original_bytes.to_vec();
    let path = source.path.clone();
    let mut corrected_diags: Vec<Diagnostic> = Vec::new();

    for iteration in 0..MAX_ITERATIONS {
        let iter_source = SourceFile::from_vec(path.clone(), current_bytes.clone());
        let (diags, corrections) = lint_source_once(&iter_source, config, registry, args, true);

        if corrections.is_empty() {
            let mut all_diags = corrected_diags;
            all_diags.extend(diags);
            let total_corrected = all_diags.iter().filter(|d| d.corrected).count();
            let corrected_bytes = validate_corrected_bytes(original_bytes, current_bytes, &path);
            return (all_diags, corrected_bytes, total_corrected);
        }

        corrected_diags.extend(diags.into_iter().filter(|d| d.corrected));

        let correction_set = CorrectionSet::from_vec(corrections);
        let new_bytes = correction_set.apply(&current_bytes);
        tracing::debug!(
            path = %path.display(),
            iteration,
            corrections = correction_set.len(),
            "applied corrections"
        );

        if new_bytes == current_bytes {
            // Corrections that change nothing would loop forever.
            let total_corrected = corrected_diags.len();
            return (corrected_diags, None, total_corrected);
        }

        current_bytes = new_bytes;
    }

    tracing::warn!(
        path = %path.display(),
        "autocorrect did not converge after {MAX_ITERATIONS} iterations"
    );
    let final_source = SourceFile::from_vec(path.clone(), current_bytes.clone());
    let (diags, _) = lint_source_once(&final_source, config, registry, args, false);
    let mut all_diags = corrected_diags;
    all_diags.extend(diags);
    let total_corrected = all_diags.iter().filter(|d| d.corrected).count();
    let corrected_bytes = validate_corrected_bytes(original_bytes, current_bytes, &path);
    (all_diags, corrected_bytes, total_corrected)
}

/// Run all enabled cops once on a source file. Returns (diagnostics, corrections).
fn lint_source_once(
    source: &SourceFile,
    config: &ResolvedConfig,
    registry: &CopRegistry,
    args: &Args,
    autocorrect: bool,
) -> (Vec<Diagnostic>, Vec<Correction>) {
    // Parse on this thread (ParseResult is !Send)
    let parse_result = crate::parse::parse_source(source.as_bytes());

    // Error recovery produces an unreliable tree; report nothing for the file.
    if parse_result.errors().count() > 0 {
        tracing::debug!(path = %source.path.display(), "parse errors, skipping file");
        return (Vec::new(), Vec::new());
    }

    let mut diagnostics = Vec::new();
    let mut corrections: Vec<Correction> = Vec::new();

    for (i, cop) in registry.cops().iter().enumerate() {
        let name = cop.name();
        if !args.selects(name) || !config.is_cop_enabled(name, &source.path) {
            continue;
        }
        let cop_config = config.cop_config(name);

        let start = diagnostics.len();
        if autocorrect && cop.supports_autocorrect() {
            let first_correction = corrections.len();
            cop.check_source(
                source,
                &parse_result,
                &cop_config,
                &mut diagnostics,
                Some(&mut corrections),
            );
            for correction in &mut corrections[first_correction..] {
                correction.cop_index = i;
            }
        } else {
            cop.check_source(source, &parse_result, &cop_config, &mut diagnostics, None);
        }

        if let Some(severity) = cop_config.severity {
            for diagnostic in &mut diagnostics[start..] {
                diagnostic.severity = severity;
            }
        }
    }

    (diagnostics, corrections)
}
