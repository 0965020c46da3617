//! Kubernetes objects produced for an extension

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

use crate::chart::Maintainer;
use crate::extension::{ExternalDependency, InstallationMode, LanguageCode, Locales};

/// Group version of the KubeSphere extension kinds
pub const KUBESPHERE_API_VERSION: &str = "kubesphere.io/v1alpha1";

/// Namespace holding embedded chart ConfigMaps
pub const KUBESPHERE_SYSTEM: &str = "kubesphere-system";

/// ConfigMap key of the embedded chart
pub const CONFIGMAP_DATA_KEY: &str = "chart.tgz";

pub const CATEGORY_LABEL: &str = "kubesphere.io/category";
pub const EXTENSION_REFERENCE_LABEL: &str = "kubesphere.io/extension-ref";
pub const MANAGED_LABEL: &str = "kubesphere.io/managed";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// Presentation fields shared by Extension and ExtensionVersion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionInfo {
    pub display_name: Locales,
    pub description: Locales,
    pub icon: String,
    pub provider: BTreeMap<LanguageCode, Maintainer>,
    #[serde(with = "rfc3339_seconds")]
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionObject {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: ExtensionSpec,
    pub status: ExtensionStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionSpec {
    #[serde(flatten)]
    pub info: ExtensionInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionStatus {
    pub recommended_version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionVersionObject {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: ExtensionVersionSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionVersionSpec {
    #[serde(flatten)]
    pub info: ExtensionInfo,

    pub installation_mode: InstallationMode,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub docs: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub home: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    #[serde(default, rename = "ksVersion", skip_serializing_if = "String::is_empty")]
    pub ks_version: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kube_version: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,

    pub version: String,

    pub category: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub screenshots: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub external_dependencies: Vec<ExternalDependency>,

    #[serde(default, rename = "chartURL", skip_serializing_if = "Option::is_none")]
    pub chart_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_data_ref: Option<ConfigMapKeyRef>,
}

/// Pointer to a key of a namespaced ConfigMap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigMapKeyRef {
    pub namespace: String,
    pub name: String,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMap {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub binary_data: BTreeMap<String, BinaryData>,
}

/// Bytes serialized as a standard base64 string
#[derive(Clone, PartialEq, Eq)]
pub struct BinaryData(pub Vec<u8>);

impl std::fmt::Debug for BinaryData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BinaryData({} bytes)", self.0.len())
    }
}

impl Serialize for BinaryData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for BinaryData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map(BinaryData)
            .map_err(serde::de::Error::custom)
    }
}

mod rfc3339_seconds {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|time| time.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// One of the derived objects, serialized without a wrapper
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Resource {
    Extension(ExtensionObject),
    ExtensionVersion(ExtensionVersionObject),
    ConfigMap(ConfigMap),
}

impl Resource {
    pub fn api_version(&self) -> &str {
        match self {
            Resource::Extension(obj) => &obj.api_version,
            Resource::ExtensionVersion(obj) => &obj.api_version,
            Resource::ConfigMap(obj) => &obj.api_version,
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            Resource::Extension(obj) => &obj.kind,
            Resource::ExtensionVersion(obj) => &obj.kind,
            Resource::ConfigMap(obj) => &obj.kind,
        }
    }

    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            Resource::Extension(obj) => &obj.metadata,
            Resource::ExtensionVersion(obj) => &obj.metadata,
            Resource::ConfigMap(obj) => &obj.metadata,
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata().name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.metadata().namespace.as_deref()
    }

    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef {
            api_version: self.api_version().to_string(),
            kind: self.kind().to_string(),
            name: self.name().to_string(),
            namespace: self.namespace().map(str::to_string),
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml_ng::to_string(self)
            .with_context(|| format!("Failed to serialize {} {}", self.kind(), self.name()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .with_context(|| format!("Failed to serialize {} {}", self.kind(), self.name()))
    }
}

/// Identity of a cluster object, enough to delete it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    pub namespace: Option<String>,
}

impl ObjectRef {
    pub fn new(api_version: &str, kind: &str, name: impl Into<String>) -> Self {
        Self {
            api_version: api_version.to_string(),
            kind: kind.to_string(),
            name: name.into(),
            namespace: None,
        }
    }

    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// `<plural>.<group>` as understood by kubectl, e.g. `extensions.kubesphere.io`
    pub fn resource_type(&self) -> String {
        let plural = format!("{}s", self.kind.to_lowercase());
        match self.api_version.split_once('/') {
            Some((group, _)) => format!("{plural}.{group}"),
            None => plural,
        }
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind, self.name)
    }
}

#[cfg(test)]
mod types_tests {
    use super::*;

    #[test]
    fn test_resource_type() {
        let cm = ObjectRef::new("v1", "ConfigMap", "extension-a-1.0.0-chart")
            .in_namespace(KUBESPHERE_SYSTEM);
        assert_eq!(cm.resource_type(), "configmaps");
        assert_eq!(cm.namespace.as_deref(), Some("kubesphere-system"));

        let plan = ObjectRef::new(KUBESPHERE_API_VERSION, "InstallPlan", "a");
        assert_eq!(plan.resource_type(), "installplans.kubesphere.io");
        assert_eq!(plan.to_string(), "InstallPlan a");

        let version = ObjectRef::new(KUBESPHERE_API_VERSION, "ExtensionVersion", "a-1.0.0");
        assert_eq!(version.resource_type(), "extensionversions.kubesphere.io");
    }

    #[test]
    fn test_binary_data_is_base64() {
        let data = BinaryData(vec![0x1f, 0x8b, 0x08]);
        let yaml = serde_yaml_ng::to_string(&data).unwrap();
        assert_eq!(yaml.trim(), "H4sI");

        let decoded: BinaryData = serde_yaml_ng::from_str("H4sI").unwrap();
        assert_eq!(decoded, data);
        assert!(serde_yaml_ng::from_str::<BinaryData>("not base64!").is_err());
    }

    #[test]
    fn test_timestamp_format() {
        #[derive(Serialize, Deserialize)]
        struct Stamp {
            #[serde(with = "rfc3339_seconds")]
            at: DateTime<Utc>,
        }

        let at = DateTime::parse_from_rfc3339("2024-05-06T07:08:09.123+02:00")
            .unwrap()
            .with_timezone(&Utc);
        let json = serde_json::to_string(&Stamp { at }).unwrap();
        assert_eq!(json, r#"{"at":"2024-05-06T05:08:09Z"}"#);
    }
}
