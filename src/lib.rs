pub mod blank_lines;
pub mod cli;
pub mod config;
pub mod cop;
pub mod correction;
pub mod diagnostic;
pub mod formatter;
pub mod fs;
pub mod linter;
pub mod parse;
pub mod regexp;

#[cfg(test)]
pub mod testutil;

use std::io::Read;

use anyhow::{Context, Result};

use cli::Args;
use config::load_config;
use cop::registry::CopRegistry;
use diagnostic::{Diagnostic, Severity};
use formatter::create_formatter;
use fs::discover_files;
use linter::{lint_source, run_linter};
use parse::source::SourceFile;

/// Run the linter. Returns the exit code: 0 = clean, 1 = offenses at or
/// above `--fail-level`.
pub fn run(args: Args) -> Result<i32> {
    let fail_level = Severity::parse(&args.fail_level)
        .with_context(|| format!("invalid --fail-level {:?}", args.fail_level))?;

    let registry = CopRegistry::default_registry();

    // --list-cops: print all registered cop names and exit
    if args.list_cops {
        let mut names = registry.names();
        names.sort();
        for name in names {
            println!("{name}");
        }
        return Ok(0);
    }

    let config = load_config(args.config.as_deref())?;
    tracing::debug!(global_excludes = ?config.global_excludes(), "config loaded");

    let formatter = create_formatter(&args.format);

    // --stdin: read from stdin and lint a single file
    if let Some(ref display_path) = args.stdin {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .context("failed to read stdin")?;
        let source = SourceFile::from_string(display_path.clone(), input);
        let result = lint_source(&source, &config, &registry, &args);
        formatter.print(&result.diagnostics, std::slice::from_ref(display_path));
        return Ok(exit_code(&result.diagnostics, fail_level));
    }

    let files = discover_files(&args.paths, &config)?;
    tracing::debug!(
        files = files.len(),
        cops = registry.len(),
        "starting lint"
    );

    let result = run_linter(&files, &config, &registry, &args);
    if result.corrected_count > 0 {
        tracing::debug!(corrected = result.corrected_count, "autocorrect finished");
    }
    formatter.print(&result.diagnostics, &files);

    Ok(exit_code(&result.diagnostics, fail_level))
}

/// Corrected offenses never fail the run.
fn exit_code(diagnostics: &[Diagnostic], fail_level: Severity) -> i32 {
    let failing = diagnostics
        .iter()
        .any(|d| !d.corrected && d.severity >= fail_level);
    i32::from(failing)
}
