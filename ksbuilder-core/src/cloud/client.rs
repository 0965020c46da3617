//! HTTP client for the KubeSphere Cloud extension API

use chrono::{SecondsFormat, Utc};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use super::types::*;
use super::{ClientOptions, CloudError, DEFAULT_SERVER};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// An authenticated session with KubeSphere Cloud
#[derive(Debug, Clone)]
pub struct CloudClient {
    http: reqwest::Client,
    server: String,
    token: String,
    user_id: String,
}

impl CloudClient {
    /// Verify the token and resolve the user it belongs to
    pub async fn connect(options: ClientOptions) -> Result<Self, CloudError> {
        let server = if options.server.trim().is_empty() {
            DEFAULT_SERVER.to_string()
        } else {
            options.server.trim_end_matches('/').to_string()
        };

        let http = reqwest::Client::builder()
            .user_agent(concat!("ksbuilder/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| CloudError::Http {
                url: server.clone(),
                source,
            })?;

        let mut client = Self {
            http,
            server,
            token: options.token,
            user_id: String::new(),
        };

        let user: UserInfo = client
            .send_json(client.request(Method::GET, "/apis/user/v1/user"))
            .await?;
        debug!("Authenticated to {} as user {}", client.server, user.user_id);
        client.user_id = user.user_id;
        Ok(client)
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Upload static files of an extension, in order
    ///
    /// `paths` are relative to `source_dir`. Each file is stored under
    /// `<usage dir>/<name>/<version>/<file name>`.
    pub async fn upload_files(
        &self,
        name: &str,
        version: &str,
        source_dir: &Path,
        paths: &[String],
    ) -> Result<UploadFilesResponse, CloudError> {
        if paths.is_empty() {
            return Ok(UploadFilesResponse::default());
        }

        let usage: FileUsage = self
            .send_json(self.request(Method::GET, &self.user_path("/files/usage")))
            .await?;

        let mut form = Form::new();
        for (i, path) in paths.iter().enumerate() {
            let full_path = source_dir.join(path);
            let content = tokio::fs::read(&full_path)
                .await
                .map_err(|source| CloudError::Io {
                    path: full_path.clone(),
                    source,
                })?;
            let file_name = full_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.clone());

            let remote = remote_path(&[&usage.dir, name, version, &file_name]);
            form = form
                .part(
                    format!("file{}", i + 1),
                    Part::bytes(content).file_name(file_name),
                )
                .text(format!("file{}_path", i + 1), remote);
        }

        self.send_json(
            self.request(Method::POST, &self.user_path("/files"))
                .multipart(form),
        )
        .await
    }

    /// Upload a chart archive, creating the extension on first upload
    pub async fn upload_extension(
        &self,
        name: &str,
        archive: &Path,
    ) -> Result<UploadExtensionResponse, CloudError> {
        let content = tokio::fs::read(archive)
            .await
            .map_err(|source| CloudError::Io {
                path: archive.to_path_buf(),
                source,
            })?;
        let file_name = archive
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{name}.tgz"));

        let form = Form::new().part("extension_package", Part::bytes(content).file_name(file_name));
        let path = self.user_path(&format!(
            "/extensions/{name}/package?force=true&create_extension=true"
        ));
        self.send_json(self.request(Method::POST, &path).multipart(form))
            .await
    }

    /// Submit a snapshot for review
    pub async fn submit_snapshot(&self, snapshot_id: &str) -> Result<(), CloudError> {
        let body = SubmitRequest {
            message: format!(
                "{} submit for review",
                Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
            ),
        };
        let path = self.user_path(&format!("/snapshots/{snapshot_id}/action:submit"));
        self.send(self.request(Method::POST, &path).json(&body))
            .await?;
        Ok(())
    }

    /// Withdraw a submitted snapshot back to draft
    pub async fn cancel_snapshot(&self, snapshot_id: &str) -> Result<(), CloudError> {
        let path = self.user_path(&format!("/snapshots/{snapshot_id}/action:cancel"));
        self.send(self.request(Method::POST, &path)).await?;
        Ok(())
    }

    pub async fn list_extensions(&self) -> Result<Vec<CloudExtension>, CloudError> {
        let response: ListExtensionsResponse = self
            .send_json(self.request(Method::GET, &self.user_path("/extensions")))
            .await?;
        Ok(response.extensions)
    }

    pub async fn get_extension(&self, name: &str) -> Result<CloudExtension, CloudError> {
        let path = self.user_path(&format!("/extensions/{name}"));
        self.send_json(self.request(Method::GET, &path)).await
    }

    pub async fn list_snapshots(&self, name: &str) -> Result<Vec<Snapshot>, CloudError> {
        let path = self.user_path(&format!("/extensions/{name}/snapshots"));
        let response: ListSnapshotsResponse =
            self.send_json(self.request(Method::GET, &path)).await?;
        Ok(response.snapshots)
    }

    /// First snapshot of extension `name` carrying `version`
    pub async fn locate_snapshot(&self, name: &str, version: &str) -> Result<Snapshot, CloudError> {
        self.list_snapshots(name)
            .await?
            .into_iter()
            .find(|snapshot| snapshot.metadata.version == version)
            .ok_or_else(|| CloudError::SnapshotNotFound {
                name: name.to_string(),
                version: version.to_string(),
            })
    }

    fn user_path(&self, suffix: &str) -> String {
        format!("/apis/extension/v1/users/{}{}", self.user_id, suffix)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.server, path))
            .bearer_auth(&self.token)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Vec<u8>, CloudError> {
        let (client, request) = request.build_split();
        let request = request.map_err(|source| CloudError::Http {
            url: self.server.clone(),
            source,
        })?;
        let url = request.url().to_string();
        debug!("{} {}", request.method(), url);

        let http_error = |source| CloudError::Http {
            url: url.clone(),
            source,
        };
        let response = client.execute(request).await.map_err(http_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(http_error)?;

        if status != StatusCode::OK {
            return Err(api_error(status, &body));
        }
        Ok(body.to_vec())
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, CloudError> {
        let body = self.send(request).await?;
        serde_json::from_slice(&body).map_err(|source| CloudError::Decode { source })
    }
}

fn api_error(status: StatusCode, body: &[u8]) -> CloudError {
    let message = match serde_json::from_slice::<ErrorResponse>(body) {
        Ok(error) => error.message,
        Err(_) => String::from_utf8_lossy(body).trim().to_string(),
    };
    CloudError::Api { status, message }
}

/// Join path segments with `/`, skipping empty ones
fn remote_path(segments: &[&str]) -> String {
    let absolute = segments
        .iter()
        .find(|s| !s.is_empty())
        .is_some_and(|s| s.starts_with('/'));
    let joined = segments
        .iter()
        .map(|s| s.trim_matches('/'))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    if absolute {
        format!("/{joined}")
    } else {
        joined
    }
}
