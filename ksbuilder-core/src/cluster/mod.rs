//! Publishing extensions to a cluster
//!
//! The flows here only talk to the cluster through [`ClusterClient`], so
//! they can run against `kubectl` or against an in-memory recorder.

mod kubectl;

pub use kubectl::{KubectlClient, FIELD_MANAGER};

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::extension::Extension;
use crate::resources::{unpublish_targets, ObjectRef, Resource};

/// Minimal cluster access needed to publish and unpublish extensions
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Create or update an object
    async fn apply(&self, resource: &Resource) -> Result<()>;

    /// Names of the ExtensionVersions that belong to extension `name`
    async fn list_extension_versions(&self, name: &str) -> Result<Vec<String>>;

    /// Delete an object; a missing object is not an error
    async fn delete(&self, target: &ObjectRef) -> Result<()>;
}

/// Apply every derived object in order, stopping at the first failure
pub async fn publish_to_cluster(
    extension: &Extension,
    client: &dyn ClusterClient,
) -> Result<Vec<ObjectRef>> {
    let mut applied = Vec::new();
    for resource in extension.to_kubernetes_resources() {
        let object = resource.object_ref();
        tracing::info!("Applying {}", object);
        client
            .apply(&resource)
            .await
            .with_context(|| format!("Failed to apply {object}"))?;
        applied.push(object);
    }
    Ok(applied)
}

/// Write one `<Kind>.yaml` per derived object into `output`
pub fn publish_to_directory(extension: &Extension, output: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory {output:?}"))?;

    let mut written = Vec::new();
    for resource in extension.to_kubernetes_resources() {
        let path = output.join(format!("{}.yaml", resource.kind()));
        std::fs::write(&path, resource.to_yaml()?)
            .with_context(|| format!("Failed to write {path:?}"))?;
        tracing::info!("Wrote {} {} to {:?}", resource.kind(), resource.name(), path);
        written.push(path);
    }
    Ok(written)
}

/// Delete extension `name` with all of its versions
pub async fn unpublish(name: &str, client: &dyn ClusterClient) -> Result<Vec<ObjectRef>> {
    let versions = client
        .list_extension_versions(name)
        .await
        .with_context(|| format!("Failed to list versions of extension {name}"))?;
    tracing::debug!("Extension {} has versions {:?}", name, versions);

    let targets = unpublish_targets(name, &versions);
    for target in &targets {
        tracing::info!("Deleting {}", target);
        client
            .delete(target)
            .await
            .with_context(|| format!("Failed to delete {target}"))?;
    }
    Ok(targets)
}
