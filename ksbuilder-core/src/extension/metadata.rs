//! Extension descriptor parsing (extension.yaml)
//!
//! The descriptor carries the identity, localized display strings and
//! marketplace information of an extension. It is the source for both the
//! generated Chart.yaml and the Kubernetes resources that publish the
//! extension.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::error::MetadataError;
use super::icon::{encode_icon, is_local_file};
use super::locale::{LanguageCode, Locales};
use crate::chart::{ChartMetadata, Dependency, Maintainer, CHART_API_VERSION};

/// Descriptor file name at the extension root
pub const METADATA_FILENAME: &str = "extension.yaml";

/// How the extension workload is placed at install time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstallationMode {
    /// Installed on the host cluster only
    #[default]
    HostOnly,

    /// Installed on the host and on member clusters
    Multicluster,
}

/// Dependency on something outside the chart (another extension, a platform version)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalDependency {
    pub name: String,

    #[serde(default, rename = "type", skip_serializing_if = "String::is_empty")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,

    #[serde(default)]
    pub required: bool,
}

/// Extension metadata (extension.yaml)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default)]
    pub api_version: String,

    /// Unique extension name
    #[serde(default)]
    pub name: String,

    /// Chart version (SemVer)
    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub display_name: Locales,

    #[serde(default)]
    pub description: Locales,

    /// Marketplace category, see [`super::CATEGORIES`]
    #[serde(default)]
    pub category: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub home: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub docs: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,

    /// Kubernetes version constraint
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kube_version: String,

    /// KubeSphere version constraint
    #[serde(default, rename = "ksVersion", skip_serializing_if = "String::is_empty")]
    pub ks_version: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub maintainers: Vec<Maintainer>,

    #[serde(default)]
    pub provider: BTreeMap<LanguageCode, Maintainer>,

    /// Directory holding icons and screenshots, dropped from pushed packages
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub static_file_directory: String,

    /// URL, data URI, or path relative to the extension directory
    #[serde(default)]
    pub icon: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub screenshots: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Dependency>,

    #[serde(default)]
    pub installation_mode: InstallationMode,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub external_dependencies: Vec<ExternalDependency>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// Options for [`Metadata::load`]
#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    /// Inline local icon files as data URIs (default: true)
    pub encode_icon: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self { encode_icon: true }
    }
}

impl Metadata {
    /// Load, resolve and validate the descriptor of an extension directory
    pub fn load(dir: &Path) -> Result<Self, MetadataError> {
        Self::load_with(dir, LoadOptions::default())
    }

    /// Load the descriptor with explicit options
    pub fn load_with(dir: &Path, options: LoadOptions) -> Result<Self, MetadataError> {
        let path = dir.join(METADATA_FILENAME);
        let content = std::fs::read(&path).map_err(|e| MetadataError::io(&path, e))?;
        let mut metadata = Self::from_slice(&content)?;
        metadata.validate()?;

        if options.encode_icon && is_local_file(&metadata.icon) {
            metadata.icon = encode_icon(&dir.join(&metadata.icon))?;
        }

        tracing::debug!("Loaded extension metadata {} v{}", metadata.name, metadata.version);
        Ok(metadata)
    }

    /// Parse descriptor bytes and apply defaults, without validating
    pub fn from_slice(content: &[u8]) -> Result<Self, MetadataError> {
        serde_yaml_ng::from_slice(content).map_err(|source| MetadataError::Parse { source })
    }

    /// Parse a descriptor string and apply defaults, without validating
    pub fn from_yaml(content: &str) -> Result<Self, MetadataError> {
        Self::from_slice(content.as_bytes())
    }

    pub fn to_yaml(&self) -> anyhow::Result<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Validate required fields and locale keys
    pub fn validate(&self) -> Result<(), MetadataError> {
        let mut missing = Vec::new();
        let required = [
            ("apiVersion", self.api_version.trim().is_empty()),
            ("name", self.name.trim().is_empty()),
            ("version", self.version.trim().is_empty()),
            ("displayName", self.display_name.is_empty()),
            ("description", self.description.is_empty()),
            ("category", self.category.trim().is_empty()),
            ("provider", self.provider.is_empty()),
            ("icon", self.icon.trim().is_empty()),
        ];
        for (field, is_missing) in required {
            if is_missing {
                missing.push(field);
            }
        }
        if !missing.is_empty() {
            return Err(MetadataError::MissingFields { fields: missing });
        }

        self.validate_language_codes()
    }

    /// Every locale key must individually be an ISO 639-1 code
    fn validate_language_codes(&self) -> Result<(), MetadataError> {
        let codes = self
            .display_name
            .codes()
            .chain(self.description.codes())
            .chain(self.provider.keys());

        for code in codes {
            if !code.is_valid() {
                return Err(MetadataError::InvalidLanguageCode {
                    code: code.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Project the descriptor onto a Chart.yaml
    pub fn to_chart_metadata(&self) -> ChartMetadata {
        ChartMetadata {
            api_version: CHART_API_VERSION.to_string(),
            name: self.name.clone(),
            version: self.version.clone(),
            keywords: self.keywords.clone(),
            sources: self.sources.clone(),
            kube_version: self.kube_version.clone(),
            home: self.home.clone(),
            dependencies: self.dependencies.clone(),
            description: self.description.default_value().to_string(),
            icon: self.icon.clone(),
            maintainers: self.maintainers.clone(),
            annotations: self.annotations.clone(),
        }
    }

    /// Languages with both a display name and a description
    pub fn supported_languages(&self) -> Vec<LanguageCode> {
        self.display_name
            .codes()
            .filter(|code| self.description.contains(code.as_str()))
            .cloned()
            .collect()
    }
}
