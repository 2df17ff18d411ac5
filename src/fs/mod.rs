use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ignore::WalkBuilder;

use crate::config::ResolvedConfig;

/// Discover Ruby files from the given paths, respecting .gitignore
/// and AllCops.Exclude patterns.
pub fn discover_files(paths: &[PathBuf], config: &ResolvedConfig) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            // Direct file paths bypass extension filtering and excludes
            files.push(path.clone());
        } else if path.is_dir() {
            files.extend(walk_directory(path, config)?);
        } else {
            anyhow::bail!("path does not exist: {}", path.display());
        }
    }

    files.sort();
    files.dedup();
    tracing::debug!(count = files.len(), "discovered files");
    Ok(files)
}

fn walk_directory(dir: &Path, config: &ResolvedConfig) -> Result<Vec<PathBuf>> {
    let mut builder = WalkBuilder::new(dir);
    builder
        .hidden(true)
        .git_ignore(true)
        .git_global(true)
        .require_git(false);

    let mut files = Vec::new();
    for entry in builder.build() {
        let entry = entry.with_context(|| format!("error walking {}", dir.display()))?;
        let path = entry.path();
        if !entry.file_type().is_some_and(|t| t.is_file())
            || path.extension().is_none_or(|ext| ext != "rb")
        {
            continue;
        }
        if config.is_globally_excluded(path) {
            tracing::debug!(path = %path.display(), "excluded by AllCops.Exclude");
            continue;
        }
        files.push(path.to_path_buf());
    }

    Ok(files)
}
