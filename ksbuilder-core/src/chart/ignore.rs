//! `.helmignore` rules
//!
//! One pattern per line, `#` starts a comment, a leading `!` negates and a
//! trailing `/` restricts the pattern to directories. Patterns without a
//! slash match the file name at any depth, others match the path relative
//! to the chart root. The last matching rule wins.

use anyhow::{Context, Result};
use glob::{MatchOptions, Pattern};
use std::path::Path;

/// Ignore file name at the chart root
pub const HELMIGNORE_FILENAME: &str = ".helmignore";

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone)]
struct Rule {
    pattern: Pattern,
    negate: bool,
    dir_only: bool,
    base_name: bool,
}

/// Parsed ignore rules
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    rules: Vec<Rule>,
}

impl IgnoreRules {
    /// Load `.helmignore` from a chart directory, empty when absent
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(HELMIGNORE_FILENAME);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {path:?}"))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut rules = Vec::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (negate, line) = match line.strip_prefix('!') {
                Some(rest) => (true, rest),
                None => (false, line),
            };
            let (dir_only, line) = match line.strip_suffix('/') {
                Some(rest) => (true, rest),
                None => (false, line),
            };
            let line = line.trim_start_matches("./").trim_start_matches('/');
            if line.is_empty() {
                continue;
            }

            let pattern = Pattern::new(line)
                .with_context(|| format!("Invalid {HELMIGNORE_FILENAME} pattern: {line}"))?;
            rules.push(Rule {
                pattern,
                negate,
                dir_only,
                base_name: !line.contains('/'),
            });
        }
        Ok(Self { rules })
    }

    /// Whether a path relative to the chart root is excluded
    pub fn is_ignored(&self, relative: &Path, is_dir: bool) -> bool {
        if relative
            .components()
            .next()
            .is_some_and(|c| c.as_os_str() == ".git")
        {
            return true;
        }

        let full = relative.to_string_lossy().replace('\\', "/");
        let base = relative
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut ignored = false;
        for rule in &self.rules {
            if rule.dir_only && !is_dir {
                continue;
            }
            let candidate = if rule.base_name { &base } else { &full };
            if rule.pattern.matches_with(candidate, MATCH_OPTIONS) {
                ignored = !rule.negate;
            }
        }
        ignored
    }
}
