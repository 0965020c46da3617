//! Helm chart manifest (Chart.yaml)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Chart API version written by the packager
pub const CHART_API_VERSION: &str = "v2";

/// Manifest file name at the chart root
pub const CHART_FILENAME: &str = "Chart.yaml";

/// Chart.yaml contents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMetadata {
    pub api_version: String,

    pub name: String,

    pub version: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kube_version: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub home: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Dependency>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub icon: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub maintainers: Vec<Maintainer>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// Maintainer or provider contact
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Maintainer {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Sub-chart dependency
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub repository: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub condition: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(
        default,
        rename = "import-values",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub import_values: Vec<serde_yaml_ng::Value>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub alias: String,
}

impl ChartMetadata {
    /// Parse Chart.yaml content
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml_ng::from_str(content).context("Invalid Chart.yaml")
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml_ng::to_string(self).context("Failed to serialize Chart.yaml")
    }

    /// Archive file name produced for this chart
    pub fn archive_name(&self) -> String {
        format!("{}-{}.tgz", self.name, self.version)
    }
}

#[cfg(test)]
mod chart_metadata_tests {
    use super::*;

    #[test]
    fn test_empty_fields_are_omitted() {
        let chart = ChartMetadata {
            api_version: CHART_API_VERSION.to_string(),
            name: "sample".to_string(),
            version: "1.0.0".to_string(),
            ..Default::default()
        };

        let yaml = chart.to_yaml().unwrap();
        assert_eq!(yaml, "apiVersion: v2\nname: sample\nversion: 1.0.0\n");
        assert_eq!(chart.archive_name(), "sample-1.0.0.tgz");
    }

    #[test]
    fn test_dependency_keys() {
        let yaml = r#"
apiVersion: v2
name: sample
version: 0.1.0
dependencies:
  - name: frontend
    condition: frontend.enabled
    tags: [ui]
    import-values:
      - child: exports
        parent: imported
"#;
        let chart = ChartMetadata::from_yaml(yaml).unwrap();
        assert_eq!(chart.dependencies.len(), 1);
        assert_eq!(chart.dependencies[0].condition, "frontend.enabled");
        assert_eq!(chart.dependencies[0].import_values.len(), 1);
        assert!(chart.dependencies[0].version.is_empty());

        let out = chart.to_yaml().unwrap();
        assert!(out.contains("import-values:"));
        assert!(!out.contains("repository"));
    }
}
