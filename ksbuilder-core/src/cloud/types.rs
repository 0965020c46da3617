//! Request and response bodies of the KubeSphere Cloud API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(crate) struct UserInfo {
    pub user_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorResponse {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FileUsage {
    #[serde(default)]
    pub dir: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmitRequest {
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UploadedFile {
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UploadFilesResponse {
    #[serde(default)]
    pub files: Vec<UploadedFile>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SnapshotRef {
    pub snapshot_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UploadExtensionResponse {
    pub snapshot: SnapshotRef,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SnapshotMetadata {
    #[serde(default)]
    pub version: String,
}

/// One uploaded package of an extension and its review state
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Snapshot {
    pub snapshot_id: String,

    #[serde(default)]
    pub metadata: SnapshotMetadata,

    #[serde(default)]
    pub status: String,

    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LatestVersion {
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CloudExtension {
    pub extension_id: String,
    pub name: String,

    #[serde(default)]
    pub status: String,

    #[serde(default)]
    pub latest_version: LatestVersion,
}

impl CloudExtension {
    /// The extension has a released version
    pub fn is_ready(&self) -> bool {
        self.status == "ready"
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ListExtensionsResponse {
    #[serde(default)]
    pub extensions: Vec<CloudExtension>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ListSnapshotsResponse {
    #[serde(default)]
    pub snapshots: Vec<Snapshot>,
}
