//! KubeSphere Cloud commands

use anyhow::{anyhow, Context, Result};
use inquire::validator::Validation;
use inquire::{CustomUserError, Password, PasswordDisplayMode};
use std::path::Path;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

use ksbuilder_core::cloud::{
    push_extension, resolve_snapshot_id, ClientOptions, CloudClient, CloudExtension, Snapshot,
};
use ksbuilder_core::config::CloudConfig;

#[derive(Tabled)]
struct ExtensionRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Latest version")]
    latest_version: String,
}

impl From<CloudExtension> for ExtensionRow {
    fn from(extension: CloudExtension) -> Self {
        Self {
            id: extension.extension_id,
            name: extension.name,
            status: extension.status,
            latest_version: extension.latest_version.version,
        }
    }
}

#[derive(Tabled)]
struct SnapshotRow {
    #[tabled(rename = "Snapshot ID")]
    id: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Update time")]
    updated_at: String,
}

impl From<Snapshot> for SnapshotRow {
    fn from(snapshot: Snapshot) -> Self {
        Self {
            id: snapshot.snapshot_id,
            version: snapshot.metadata.version,
            status: snapshot.status,
            updated_at: snapshot.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

fn render_table<T: Tabled>(rows: &[T]) -> String {
    Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .to_string()
}

/// Client for the credentials saved by `login`
async fn saved_client() -> Result<CloudClient> {
    let config = CloudConfig::read()?;
    CloudClient::connect(ClientOptions::from_config(&config))
        .await
        .map_err(|e| anyhow!("login failed: {e}"))
}

pub async fn login(token: Option<String>, server: String) -> Result<()> {
    let token = match token.filter(|t| !t.trim().is_empty()) {
        Some(token) => token,
        None => Password::new("Enter API token")
            .without_confirmation()
            .with_display_mode(PasswordDisplayMode::Masked)
            .with_validator(|input: &str| -> Result<Validation, CustomUserError> {
                if input.trim().is_empty() {
                    Ok(Validation::Invalid("token can't be empty".into()))
                } else {
                    Ok(Validation::Valid)
                }
            })
            .prompt()
            .context("Token prompt cancelled")?,
    };

    let client = CloudClient::connect(ClientOptions::new(server.clone(), token.clone()))
        .await
        .map_err(|e| anyhow!("login failed: {e}"))?;
    tracing::debug!("Logged in as user {}", client.user_id());

    CloudConfig { token, server }.write()?;
    println!("Login Succeeded");
    Ok(())
}

pub fn logout() -> Result<()> {
    CloudConfig::remove()?;
    println!("Logout Succeeded");
    Ok(())
}

pub async fn push(dir: &Path) -> Result<()> {
    println!("push extension {}", dir.display());
    let client = saved_client().await?;

    let outcome = push_extension(&client, dir).await?;
    println!(
        "Snapshot {} created for {} v{} ({} bytes)",
        outcome.snapshot_id, outcome.name, outcome.version, outcome.archive_size
    );
    println!("Extension pushed and submitted to KubeSphere Cloud, waiting for review");
    Ok(())
}

pub async fn unpush(target: &str) -> Result<()> {
    let client = saved_client().await?;

    let snapshot_id = resolve_snapshot_id(&client, target).await?;
    println!("unpush snapshot {snapshot_id}");
    client.cancel_snapshot(&snapshot_id).await?;
    println!("Snapshot {snapshot_id} has been unsubmitted and reverted to draft state");
    Ok(())
}

pub async fn list() -> Result<()> {
    let client = saved_client().await?;
    let rows: Vec<ExtensionRow> = client
        .list_extensions()
        .await?
        .into_iter()
        .map(ExtensionRow::from)
        .collect();

    println!("{}", render_table(&rows));
    Ok(())
}

pub async fn get(name: &str) -> Result<()> {
    let client = saved_client().await?;
    let extension = client.get_extension(name).await?;
    let snapshots = client.list_snapshots(name).await?;

    println!("{:<16}{}", "Name:", name);
    println!("{:<16}{}", "ID:", extension.extension_id);
    println!("{:<16}{}", "Status:", extension.status);
    if extension.is_ready() {
        println!("{:<16}{}", "Latest version:", extension.latest_version.version);
    }
    println!();

    let rows: Vec<SnapshotRow> = snapshots.into_iter().map(SnapshotRow::from).collect();
    println!("{}", render_table(&rows));
    Ok(())
}
