//! Push and unpush flows

use anyhow::{Context, Result};
use std::path::Path;
use tempfile::TempDir;
use tracing::{debug, info};

use super::CloudClient;
use crate::chart::{package, stage};
use crate::extension::{is_local_file, LoadOptions, Metadata, METADATA_FILENAME};

/// Result of [`push_extension`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushOutcome {
    pub name: String,
    pub version: String,
    pub snapshot_id: String,

    /// Size of the uploaded chart archive in bytes
    pub archive_size: u64,
}

/// Upload an extension directory and submit it for review
///
/// Works on a copy of `dir`. Local icon and screenshots are uploaded as
/// static files and replaced by their URLs, and the static file directory
/// is left out of the uploaded chart.
pub async fn push_extension(client: &CloudClient, dir: &Path) -> Result<PushOutcome> {
    let work = TempDir::new().context("Failed to create temporary directory")?;
    stage(dir, work.path())?;

    let mut metadata = Metadata::load_with(work.path(), LoadOptions { encode_icon: false })
        .with_context(|| format!("Failed to load extension at {dir:?}"))?;
    let (name, version) = (metadata.name.clone(), metadata.version.clone());

    if is_local_file(&metadata.icon) {
        let response = client
            .upload_files(&name, &version, work.path(), &[metadata.icon.clone()])
            .await
            .context("Failed to upload icon")?;
        let uploaded = response
            .files
            .into_iter()
            .next()
            .context("Icon upload returned no file URL")?;
        debug!("Icon {} uploaded to {}", metadata.icon, uploaded.url);
        metadata.icon = uploaded.url;
    }

    let (local, mut screenshots): (Vec<String>, Vec<String>) = metadata
        .screenshots
        .iter()
        .cloned()
        .partition(|s| is_local_file(s));
    if !local.is_empty() {
        let response = client
            .upload_files(&name, &version, work.path(), &local)
            .await
            .context("Failed to upload screenshots")?;
        screenshots.extend(response.files.into_iter().map(|f| f.url));
        metadata.screenshots = screenshots;
    }

    if !metadata.static_file_directory.is_empty() {
        let static_dir = work.path().join(&metadata.static_file_directory);
        match std::fs::remove_dir_all(&static_dir) {
            Ok(()) => debug!("Removed {:?} from the uploaded chart", static_dir),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to remove {static_dir:?}"));
            }
        }
    }

    std::fs::write(work.path().join(METADATA_FILENAME), metadata.to_yaml()?)
        .context("Failed to rewrite extension.yaml")?;

    let output = TempDir::new().context("Failed to create temporary directory")?;
    let archive = package(work.path(), &metadata.to_chart_metadata(), output.path())?;
    let archive_size = std::fs::metadata(&archive)
        .with_context(|| format!("Failed to stat {archive:?}"))?
        .len();

    let uploaded = client
        .upload_extension(&name, &archive)
        .await
        .context("Failed to upload extension package")?;
    let snapshot_id = uploaded.snapshot.snapshot_id;
    client
        .submit_snapshot(&snapshot_id)
        .await
        .with_context(|| format!("Failed to submit snapshot {snapshot_id}"))?;

    info!("Pushed {} v{} as snapshot {}", name, version, snapshot_id);
    Ok(PushOutcome {
        name,
        version,
        snapshot_id,
        archive_size,
    })
}

/// Resolve an `unpush` argument to a snapshot id
///
/// An all-digit argument is a snapshot id. Anything else is an extension
/// directory whose name and version locate the snapshot.
pub async fn resolve_snapshot_id(client: &CloudClient, target: &str) -> Result<String> {
    if is_snapshot_id(target) {
        return Ok(target.to_string());
    }

    let metadata = Metadata::load_with(Path::new(target), LoadOptions { encode_icon: false })
        .with_context(|| format!("Failed to load extension at {target}"))?;
    let snapshot = client
        .locate_snapshot(&metadata.name, &metadata.version)
        .await
        .context("Failed to locate snapshot on KubeSphere Cloud")?;
    Ok(snapshot.snapshot_id)
}

fn is_snapshot_id(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}
