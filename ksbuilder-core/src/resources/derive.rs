//! Derivation of the cluster objects that publish an extension

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use super::types::*;
use crate::extension::Extension;

impl Extension {
    /// Objects that install this extension, stamped with the current time
    pub fn to_kubernetes_resources(&self) -> Vec<Resource> {
        self.to_kubernetes_resources_at(Utc::now())
    }

    /// Objects that install this extension
    ///
    /// Order: Extension, ExtensionVersion, then the chart ConfigMap unless
    /// the chart is referenced by URL.
    pub fn to_kubernetes_resources_at(&self, created: DateTime<Utc>) -> Vec<Resource> {
        let md = &self.metadata;
        let info = ExtensionInfo {
            display_name: md.display_name.clone(),
            description: md.description.clone(),
            icon: md.icon.clone(),
            provider: md.provider.clone(),
            created,
        };

        let extension = ExtensionObject {
            api_version: KUBESPHERE_API_VERSION.to_string(),
            kind: "Extension".to_string(),
            metadata: ObjectMeta {
                name: md.name.clone(),
                labels: BTreeMap::from([
                    (CATEGORY_LABEL.to_string(), md.category.clone()),
                    (MANAGED_LABEL.to_string(), "true".to_string()),
                ]),
                ..Default::default()
            },
            spec: ExtensionSpec { info: info.clone() },
            status: ExtensionStatus {
                recommended_version: md.version.clone(),
            },
        };

        let mut version = ExtensionVersionObject {
            api_version: KUBESPHERE_API_VERSION.to_string(),
            kind: "ExtensionVersion".to_string(),
            metadata: ObjectMeta {
                name: self.version_name(),
                labels: BTreeMap::from([
                    (EXTENSION_REFERENCE_LABEL.to_string(), md.name.clone()),
                    (CATEGORY_LABEL.to_string(), md.category.clone()),
                ]),
                annotations: md.annotations.clone(),
                ..Default::default()
            },
            spec: ExtensionVersionSpec {
                info,
                installation_mode: md.installation_mode,
                docs: md.docs.clone(),
                namespace: md.namespace.clone(),
                home: md.home.clone(),
                keywords: md.keywords.clone(),
                ks_version: md.ks_version.clone(),
                kube_version: md.kube_version.clone(),
                sources: md.sources.clone(),
                version: md.version.clone(),
                category: md.category.clone(),
                screenshots: md.screenshots.clone(),
                external_dependencies: md.external_dependencies.clone(),
                chart_url: None,
                chart_data_ref: None,
            },
        };

        match self.chart_url.as_deref().filter(|url| !url.is_empty()) {
            Some(url) => {
                version.spec.chart_url = Some(url.to_string());
                vec![
                    Resource::Extension(extension),
                    Resource::ExtensionVersion(version),
                ]
            }
            None => {
                let config_map = ConfigMap {
                    api_version: "v1".to_string(),
                    kind: "ConfigMap".to_string(),
                    metadata: ObjectMeta {
                        name: chart_config_map_name(&self.version_name()),
                        namespace: Some(KUBESPHERE_SYSTEM.to_string()),
                        ..Default::default()
                    },
                    binary_data: BTreeMap::from([(
                        CONFIGMAP_DATA_KEY.to_string(),
                        BinaryData(self.chart_data.clone()),
                    )]),
                };
                version.spec.chart_data_ref = Some(ConfigMapKeyRef {
                    namespace: KUBESPHERE_SYSTEM.to_string(),
                    name: config_map.metadata.name.clone(),
                    key: CONFIGMAP_DATA_KEY.to_string(),
                });
                vec![
                    Resource::Extension(extension),
                    Resource::ExtensionVersion(version),
                    Resource::ConfigMap(config_map),
                ]
            }
        }
    }
}

/// `extension-<name>-<version>-chart`
pub fn chart_config_map_name(version_name: &str) -> String {
    format!("extension-{version_name}-chart")
}

/// Serialize resources as a single multi-document YAML stream
pub fn render_yaml_stream(resources: &[Resource]) -> Result<String> {
    let documents = resources
        .iter()
        .map(Resource::to_yaml)
        .collect::<Result<Vec<_>>>()?;
    Ok(documents.join("---\n"))
}

/// Objects to delete when unpublishing extension `name`
///
/// Each known version contributes its chart ConfigMap followed by the
/// ExtensionVersion itself; the InstallPlan and the Extension come last.
pub fn unpublish_targets(name: &str, version_names: &[String]) -> Vec<ObjectRef> {
    let mut targets = Vec::with_capacity(version_names.len() * 2 + 2);
    for version in version_names {
        targets.push(
            ObjectRef::new("v1", "ConfigMap", chart_config_map_name(version))
                .in_namespace(KUBESPHERE_SYSTEM),
        );
        targets.push(ObjectRef::new(
            KUBESPHERE_API_VERSION,
            "ExtensionVersion",
            version.clone(),
        ));
    }
    targets.push(ObjectRef::new(KUBESPHERE_API_VERSION, "InstallPlan", name));
    targets.push(ObjectRef::new(KUBESPHERE_API_VERSION, "Extension", name));
    targets
}
