//! Cluster resources
//!
//! Publishing an extension means creating three objects: the `Extension`,
//! one `ExtensionVersion`, and a `ConfigMap` carrying the chart archive
//! (omitted when the chart is referenced by URL).

mod derive;
mod types;

pub use derive::{chart_config_map_name, render_yaml_stream, unpublish_targets};
pub use types::{
    BinaryData, ConfigMap, ConfigMapKeyRef, ExtensionInfo, ExtensionObject,
    ExtensionSpec, ExtensionStatus, ExtensionVersionObject, ExtensionVersionSpec, ObjectMeta,
    ObjectRef, Resource, CATEGORY_LABEL, CONFIGMAP_DATA_KEY, EXTENSION_REFERENCE_LABEL,
    KUBESPHERE_API_VERSION, KUBESPHERE_SYSTEM, MANAGED_LABEL,
};
