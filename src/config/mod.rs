use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde_yml::Value;

use crate::cop::CopConfig;
use crate::diagnostic::Severity;

/// Resolved configuration from .rubocop.yml.
///
/// Reads a single YAML file and extracts per-cop Enabled/Severity/Exclude/
/// Include plus free-form options, and AllCops.Exclude. Glob patterns are
/// compiled once here and matched relative to the config file's directory.
#[derive(Debug)]
pub struct ResolvedConfig {
    /// Per-cop configs keyed by cop name (e.g. "Layout/EmptyLines").
    cop_configs: HashMap<String, CopConfig>,
    cop_filters: HashMap<String, PathFilter>,
    global_excludes: Vec<String>,
    global_filter: PathFilter,
    base_dir: PathBuf,
}

impl ResolvedConfig {
    pub fn empty() -> Self {
        Self {
            cop_configs: HashMap::new(),
            cop_filters: HashMap::new(),
            global_excludes: Vec::new(),
            global_filter: PathFilter::default(),
            base_dir: PathBuf::from("."),
        }
    }
}

/// Load config from the given path, or look for `.rubocop.yml` in the
/// current directory. Returns an empty config if the file doesn't exist.
pub fn load_config(path: Option<&Path>) -> Result<ResolvedConfig> {
    let config_path = match path {
        Some(p) => p.to_path_buf(),
        None => PathBuf::from(".rubocop.yml"),
    };

    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "no config file, using defaults");
        return Ok(ResolvedConfig::empty());
    }

    let contents = std::fs::read_to_string(&config_path)
        .with_context(|| format!("failed to read config {}", config_path.display()))?;
    let base_dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    parse_config(&contents, base_dir)
        .with_context(|| format!("failed to parse {}", config_path.display()))
}

/// Build a config from YAML text. Globs are relative to `base_dir`.
pub fn parse_config(contents: &str, base_dir: PathBuf) -> Result<ResolvedConfig> {
    let raw: Value = serde_yml::from_str(contents)?;

    let mut cop_configs = HashMap::new();
    let mut global_excludes = Vec::new();

    if let Value::Mapping(map) = &raw {
        for (key, value) in map {
            let Some(key_str) = key.as_str() else {
                continue;
            };

            if key_str == "AllCops" {
                if let Some(excludes) = extract_string_list(value, "Exclude") {
                    global_excludes = excludes;
                }
                continue;
            }

            // Cop names contain "/" (e.g. "Layout/EmptyLines")
            if key_str.contains('/') {
                cop_configs.insert(key_str.to_string(), parse_cop_config(value));
            }
        }
    }

    let global_filter = PathFilter::new(&[], &global_excludes).context("AllCops.Exclude")?;
    let mut cop_filters = HashMap::new();
    for (name, config) in &cop_configs {
        let filter =
            PathFilter::new(&config.include, &config.exclude).with_context(|| name.clone())?;
        cop_filters.insert(name.clone(), filter);
    }

    Ok(ResolvedConfig {
        cop_configs,
        cop_filters,
        global_excludes,
        global_filter,
        base_dir,
    })
}

impl ResolvedConfig {
    /// Check if a cop is enabled for the given file path.
    pub fn is_cop_enabled(&self, name: &str, path: &Path) -> bool {
        if self.cop_configs.get(name).is_some_and(|c| !c.enabled) {
            return false;
        }
        let relative = self.relative(path);
        self.cop_filters
            .get(name)
            .is_none_or(|filter| filter.allows(&relative))
    }

    /// Get the resolved config for a specific cop.
    pub fn cop_config(&self, name: &str) -> CopConfig {
        self.cop_configs.get(name).cloned().unwrap_or_default()
    }

    /// Global exclude patterns from AllCops.Exclude.
    pub fn global_excludes(&self) -> &[String] {
        &self.global_excludes
    }

    /// Whether AllCops.Exclude matches the path.
    pub fn is_globally_excluded(&self, path: &Path) -> bool {
        !self.global_filter.allows(&self.relative(path))
    }

    fn relative(&self, path: &Path) -> PathBuf {
        let path = path.strip_prefix("./").unwrap_or(path);
        path.strip_prefix(&self.base_dir)
            .unwrap_or(path)
            .to_path_buf()
    }
}

/// Compiled Include/Exclude globs. An empty include list admits every path.
#[derive(Debug, Default)]
pub struct PathFilter {
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
}

impl PathFilter {
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self> {
        Ok(Self {
            include: compile(include)?,
            exclude: compile(exclude)?,
        })
    }

    pub fn allows(&self, path: &Path) -> bool {
        if self.exclude.as_ref().is_some_and(|set| set.is_match(path)) {
            return false;
        }
        self.include.as_ref().is_none_or(|set| set.is_match(path))
    }
}

fn compile(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let pattern = pattern.strip_prefix("./").unwrap_or(pattern);
        builder.add(Glob::new(pattern).with_context(|| format!("invalid glob {pattern:?}"))?);
    }
    Ok(Some(builder.build()?))
}

fn parse_cop_config(value: &Value) -> CopConfig {
    let mut config = CopConfig::default();

    if let Value::Mapping(map) = value {
        for (k, v) in map {
            let Some(key) = k.as_str() else {
                continue;
            };
            match key {
                "Enabled" => {
                    if let Some(b) = v.as_bool() {
                        config.enabled = b;
                    }
                }
                "Severity" => {
                    config.severity = v.as_str().and_then(Severity::parse);
                }
                "Exclude" => {
                    if let Some(list) = value_to_string_list(v) {
                        config.exclude = list;
                    }
                }
                "Include" => {
                    if let Some(list) = value_to_string_list(v) {
                        config.include = list;
                    }
                }
                _ => {
                    config.options.insert(key.to_string(), v.clone());
                }
            }
        }
    }

    config
}

fn extract_string_list(value: &Value, key: &str) -> Option<Vec<String>> {
    value_to_string_list(value.as_mapping()?.get(&Value::String(key.to_string()))?)
}

fn value_to_string_list(value: &Value) -> Option<Vec<String>> {
    value.as_sequence().map(|seq| {
        seq.iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect()
    })
}
