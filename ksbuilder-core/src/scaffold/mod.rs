//! New extension scaffolding
//!
//! The template tree is compiled into the binary. Placeholders use
//! `[[ Key ]]` so they do not clash with Helm's `{{ }}` syntax.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::extension::find_category;

/// Values substituted into the templates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScaffoldConfig {
    pub name: String,
    pub category: String,
    pub author: String,
    pub email: String,
    pub url: String,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RenderError {
    #[error("{template}: unknown placeholder [[ {key} ]]")]
    UnknownPlaceholder { template: String, key: String },

    #[error("{template}: unterminated placeholder")]
    Unterminated { template: String },
}

/// A file of the template tree
#[derive(Debug, Clone, Copy)]
pub struct Template {
    pub path: &'static str,
    pub content: &'static str,
}

macro_rules! template {
    ($path:literal) => {
        Template {
            path: $path,
            content: include_str!(concat!("../../templates/", $path)),
        }
    };
}

/// Files written by [`create`]
pub const TEMPLATES: &[Template] = &[
    template!(".helmignore"),
    template!("CHANGELOG.md"),
    template!("README.md"),
    template!("README_zh.md"),
    template!("extension.yaml"),
    template!("values.yaml"),
    template!("static/icon.svg"),
    template!("charts/backend/Chart.yaml"),
    template!("charts/backend/values.yaml"),
    template!("charts/backend/templates/deployment.yaml"),
    template!("charts/backend/templates/extensions.yaml"),
    template!("charts/backend/templates/service.yaml"),
    template!("charts/frontend/Chart.yaml"),
    template!("charts/frontend/values.yaml"),
    template!("charts/frontend/templates/deployment.yaml"),
    template!("charts/frontend/templates/extensions.yaml"),
    template!("charts/frontend/templates/service.yaml"),
];

impl ScaffoldConfig {
    fn lookup(&self, key: &str) -> Option<&str> {
        match key {
            "Name" => Some(&self.name),
            "Category" => Some(&self.category),
            "Author" => Some(&self.author),
            "Email" => Some(&self.email),
            "Url" => Some(&self.url),
            _ => None,
        }
    }

    /// Check the name is a DNS label and the category is known
    pub fn validate(&self) -> Result<()> {
        let name = &self.name;
        let valid_name = !name.is_empty()
            && name.len() <= 63
            && name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
            && !name.starts_with('-')
            && !name.ends_with('-');
        if !valid_name {
            anyhow::bail!(
                "Invalid extension name '{name}': use lowercase letters, digits and '-', at most 63 characters"
            );
        }

        if find_category(&self.category).is_none() {
            anyhow::bail!(
                "Unknown category '{}', run 'ksbuilder category' to list the supported ones",
                self.category
            );
        }
        Ok(())
    }
}

/// Substitute every `[[ Key ]]` in `content`
pub fn render(template: &str, content: &str, config: &ScaffoldConfig) -> Result<String, RenderError> {
    let mut output = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(start) = rest.find("[[") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find("]]").ok_or_else(|| RenderError::Unterminated {
            template: template.to_string(),
        })?;

        let key = after[..end].trim();
        let value = config
            .lookup(key)
            .ok_or_else(|| RenderError::UnknownPlaceholder {
                template: template.to_string(),
                key: key.to_string(),
            })?;
        output.push_str(value);
        rest = &after[end + 2..];
    }
    output.push_str(rest);
    Ok(output)
}

/// Generate a new extension in `dir`
///
/// `dir` must not exist or be empty. Returns the written files.
pub fn create(dir: &Path, config: &ScaffoldConfig) -> Result<Vec<PathBuf>> {
    config.validate()?;

    if dir.exists() {
        let mut entries =
            std::fs::read_dir(dir).with_context(|| format!("Failed to read {dir:?}"))?;
        if entries.next().is_some() {
            anyhow::bail!("Directory {dir:?} already exists and is not empty");
        }
    }

    let mut written = Vec::with_capacity(TEMPLATES.len());
    for template in TEMPLATES {
        let content = render(template.path, template.content, config)?;
        let path = dir.join(template.path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {parent:?}"))?;
        }
        std::fs::write(&path, content).with_context(|| format!("Failed to write {path:?}"))?;
        written.push(path);
    }

    tracing::info!("Created extension {} in {:?}", config.name, dir);
    Ok(written)
}

#[cfg(test)]
mod scaffold_tests {
    use super::*;
    use crate::extension::Metadata;
    use tempfile::TempDir;

    fn config() -> ScaffoldConfig {
        ScaffoldConfig {
            name: "sample".to_string(),
            category: "security".to_string(),
            author: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            url: "https://example.com".to_string(),
        }
    }

    #[test]
    fn test_render() {
        let out = render("t", "name: [[ Name ]]\nby: [[Author]] <[[ Email ]]>", &config()).unwrap();
        assert_eq!(out, "name: sample\nby: Jane Doe <jane@example.com>");

        let helm = "{{ .Values.global.imageRegistry }}";
        assert_eq!(render("t", helm, &config()).unwrap(), helm);
    }

    #[test]
    fn test_render_errors() {
        assert_eq!(
            render("t", "[[ Version ]]", &config()).unwrap_err(),
            RenderError::UnknownPlaceholder {
                template: "t".to_string(),
                key: "Version".to_string(),
            }
        );
        assert!(matches!(
            render("t", "[[ Name", &config()),
            Err(RenderError::Unterminated { .. })
        ));
    }

    #[test]
    fn test_templates_only_use_known_placeholders() {
        for template in TEMPLATES {
            render(template.path, template.content, &config()).unwrap();
        }
    }

    #[test]
    fn test_create_generates_loadable_extension() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("sample");

        let written = create(&dir, &config()).unwrap();
        assert_eq!(written.len(), TEMPLATES.len());
        assert!(dir.join("charts/backend/templates/deployment.yaml").is_file());

        let metadata = Metadata::load(&dir).unwrap();
        assert_eq!(metadata.name, "sample");
        assert_eq!(metadata.category, "security");
        assert_eq!(metadata.home, "https://example.com");
        assert!(metadata.icon.starts_with("data:image/svg+xml;base64,"));
        assert_eq!(metadata.provider["en"].name, "Jane Doe");
    }

    #[test]
    fn test_create_with_empty_url() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("sample");
        let config = ScaffoldConfig {
            url: String::new(),
            ..config()
        };

        create(&dir, &config).unwrap();
        let metadata = Metadata::load(&dir).unwrap();
        assert!(metadata.home.is_empty());
    }

    #[test]
    fn test_create_refuses_non_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("keep.txt"), "x").unwrap();

        let err = create(temp_dir.path(), &config()).unwrap_err();
        assert!(err.to_string().contains("not empty"));
    }

    #[test]
    fn test_config_validation() {
        for name in ["", "Sample", "-sample", "sample-", "sam_ple"] {
            let config = ScaffoldConfig {
                name: name.to_string(),
                ..config()
            };
            assert!(config.validate().is_err(), "{name} should be rejected");
        }

        let config = ScaffoldConfig {
            category: "games".to_string(),
            ..config()
        };
        assert!(config.validate().unwrap_err().to_string().contains("games"));
    }
}
