//! KubeSphere Cloud marketplace
//!
//! Extensions are pushed as snapshots: every upload of a chart creates a
//! snapshot which is then submitted for review. Static files (icon and
//! screenshots) are uploaded separately and referenced by URL.

mod client;
mod push;
mod types;

pub use client::CloudClient;
pub use push::{push_extension, resolve_snapshot_id, PushOutcome};
pub use types::{
    CloudExtension, LatestVersion, Snapshot, SnapshotMetadata, SnapshotRef, UploadExtensionResponse,
    UploadFilesResponse, UploadedFile,
};

use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::CloudConfig;

pub const DEFAULT_SERVER: &str = "https://apis.kubesphere.cloud";

#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Any response other than 200, with the server's message
    #[error("{status}, {message}")]
    Api { status: StatusCode, message: String },

    #[error("Failed to decode response: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No snapshot of {name} with version {version}")]
    SnapshotNotFound { name: String, version: String },
}

/// Server and token for [`CloudClient::connect`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientOptions {
    /// Empty means [`DEFAULT_SERVER`]
    pub server: String,
    pub token: String,
}

impl ClientOptions {
    pub fn new(server: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            token: token.into(),
        }
    }

    /// Start from the credentials saved by `ksbuilder login`
    pub fn from_config(config: &CloudConfig) -> Self {
        Self::new(config.server.clone(), config.token.clone())
    }
}
