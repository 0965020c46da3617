//! `kubectl`-backed cluster client

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use super::ClusterClient;
use crate::resources::{ObjectRef, Resource, EXTENSION_REFERENCE_LABEL};

/// Field manager recorded on applied objects
pub const FIELD_MANAGER: &str = "ksbuilder";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Runs `kubectl` against the cluster of a kubeconfig file
#[derive(Debug, Clone)]
pub struct KubectlClient {
    program: PathBuf,
    leading_args: Vec<String>,
    kubeconfig: Option<PathBuf>,
    timeout: Duration,
}

#[derive(Deserialize)]
struct ObjectList {
    #[serde(default)]
    items: Vec<ListedObject>,
}

#[derive(Deserialize)]
struct ListedObject {
    metadata: ListedMeta,
}

#[derive(Deserialize)]
struct ListedMeta {
    name: String,
}

impl KubectlClient {
    /// Use `kubeconfig`, or `~/.kube/config` when none is given
    pub fn new(kubeconfig: Option<PathBuf>) -> Self {
        let kubeconfig = kubeconfig.or_else(default_kubeconfig);
        Self {
            program: PathBuf::from("kubectl"),
            leading_args: Vec::new(),
            kubeconfig,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Run kubectl through another launcher, e.g. `minikube kubectl --`
    pub fn with_program(mut self, program: impl Into<PathBuf>, leading_args: &[&str]) -> Self {
        self.program = program.into();
        self.leading_args = leading_args.iter().map(|arg| arg.to_string()).collect();
        self
    }

    async fn run(&self, args: &[String], input: Option<Vec<u8>>) -> Result<Vec<u8>> {
        let mut command = Command::new(&self.program);
        command.args(&self.leading_args);
        if let Some(kubeconfig) = &self.kubeconfig {
            command.arg("--kubeconfig").arg(kubeconfig);
        }
        command
            .args(args)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!("Running {:?} {}", self.program, args.join(" "));
        let mut child = command
            .spawn()
            .with_context(|| format!("Failed to run {:?}", self.program))?;

        if let (Some(mut stdin), Some(input)) = (child.stdin.take(), input) {
            stdin
                .write_all(&input)
                .await
                .context("Failed to write to kubectl stdin")?;
            // closing stdin lets kubectl start processing
            drop(stdin);
        }

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .context("kubectl timed out")?
            .context("Failed to wait for kubectl")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "kubectl {} failed ({}): {}",
                args.first().map(String::as_str).unwrap_or_default(),
                output.status,
                stderr.trim()
            );
        }
        Ok(output.stdout)
    }
}

#[async_trait]
impl ClusterClient for KubectlClient {
    async fn apply(&self, resource: &Resource) -> Result<()> {
        let args = vec![
            "apply".to_string(),
            "--server-side".to_string(),
            "--force-conflicts".to_string(),
            format!("--field-manager={FIELD_MANAGER}"),
            "-f".to_string(),
            "-".to_string(),
        ];
        let manifest = resource.to_json()?;
        self.run(&args, Some(manifest.into_bytes())).await?;
        Ok(())
    }

    async fn list_extension_versions(&self, name: &str) -> Result<Vec<String>> {
        let args = vec![
            "get".to_string(),
            "extensionversions.kubesphere.io".to_string(),
            "-l".to_string(),
            format!("{EXTENSION_REFERENCE_LABEL}={name}"),
            "-o".to_string(),
            "json".to_string(),
        ];
        let stdout = self.run(&args, None).await?;
        let list: ObjectList =
            serde_json::from_slice(&stdout).context("Failed to parse kubectl output")?;
        Ok(list.items.into_iter().map(|item| item.metadata.name).collect())
    }

    async fn delete(&self, target: &ObjectRef) -> Result<()> {
        let mut args = vec![
            "delete".to_string(),
            target.resource_type(),
            target.name.clone(),
        ];
        if let Some(namespace) = &target.namespace {
            args.push("-n".to_string());
            args.push(namespace.clone());
        }
        args.push("--ignore-not-found".to_string());
        self.run(&args, None).await?;
        Ok(())
    }
}

fn default_kubeconfig() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".kube").join("config"))
}
