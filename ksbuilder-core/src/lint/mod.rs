//! Built-in extension checks
//!
//! Loading the extension must succeed; everything else is reported as
//! warnings or informational messages.

use anyhow::Result;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::chart::IgnoreRules;
use crate::extension::Extension;

/// Global values every extension chart is expected to honour
pub const GLOBAL_VALUES: &[&str] = &["global.imageRegistry", "global.nodeSelector"];

const TEMPLATE_EXTENSIONS: &[&str] = &["yaml", "yml", "tpl", "txt", "json"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => f.write_str("INFO"),
            Severity::Warning => f.write_str("WARNING"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintMessage {
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for LintMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LintReport {
    pub messages: Vec<LintMessage>,

    /// Template files referencing each of [`GLOBAL_VALUES`]
    pub global_value_usages: BTreeMap<&'static str, Vec<PathBuf>>,
}

impl LintReport {
    fn info(&mut self, message: impl Into<String>) {
        self.messages.push(LintMessage {
            severity: Severity::Info,
            message: message.into(),
        });
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.messages.push(LintMessage {
            severity: Severity::Warning,
            message: message.into(),
        });
    }

    pub fn warnings(&self) -> impl Iterator<Item = &LintMessage> {
        self.messages
            .iter()
            .filter(|m| m.severity == Severity::Warning)
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings().next().is_some()
    }
}

/// Run the built-in checks on an extension directory
pub fn lint(dir: &Path) -> Result<LintReport> {
    let extension = Extension::load(dir)?;
    let metadata = &extension.metadata;
    let mut report = LintReport::default();

    if metadata.images.is_empty() {
        report.warn(format!("extension {} has no images", metadata.name));
    }
    if !dir.join("values.yaml").is_file() {
        report.warn("values.yaml is missing");
    }
    if !dir.join("templates").is_dir() && !dir.join("charts").is_dir() {
        report.warn("chart has neither templates/ nor charts/");
    }

    let templates = template_files(dir)?;
    for key in GLOBAL_VALUES {
        let needle = format!(".Values.{key}");
        let mut users = Vec::new();
        for (relative, content) in &templates {
            if content.contains(&needle) {
                users.push(relative.clone());
            }
        }

        if users.is_empty() {
            report.warn(format!("\"{key}\" is not used by any template"));
        } else {
            let files: Vec<String> = users.iter().map(|p| p.display().to_string()).collect();
            report.info(format!("\"{key}\" is used in: {}", files.join(", ")));
        }
        report.global_value_usages.insert(*key, users);
    }

    tracing::debug!(
        "Linted {} with {} template files",
        metadata.name,
        templates.len()
    );
    Ok(report)
}

/// Text files below any `templates/` directory, relative to `dir`
fn template_files(dir: &Path) -> Result<Vec<(PathBuf, String)>> {
    let rules = IgnoreRules::load(dir)?;
    let mut files = Vec::new();

    let walker = WalkDir::new(dir)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| match entry.path().strip_prefix(dir) {
            Ok(relative) => !rules.is_ignored(relative, entry.file_type().is_dir()),
            Err(_) => false,
        });

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(dir)?.to_path_buf();
        let in_templates = relative
            .parent()
            .is_some_and(|parent| parent.components().any(|c| c.as_os_str() == "templates"));
        let is_text = relative
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| TEMPLATE_EXTENSIONS.contains(&ext));
        if !in_templates || !is_text {
            continue;
        }

        let content = std::fs::read_to_string(entry.path())?;
        files.push((relative, content));
    }
    Ok(files)
}
