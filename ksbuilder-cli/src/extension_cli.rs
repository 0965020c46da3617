//! Local extension commands

use anyhow::{Context, Result};
use inquire::validator::Validation;
use inquire::{CustomUserError, Select, Text};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use ksbuilder_core::chart::{package as package_chart, parse_archive, validate_archive};
use ksbuilder_core::cluster::{publish_to_cluster, publish_to_directory, unpublish as unpublish_extension, KubectlClient};
use ksbuilder_core::extension::{Extension, Metadata, CATEGORIES};
use ksbuilder_core::lint::lint as lint_extension;
use ksbuilder_core::resources::render_yaml_stream;
use ksbuilder_core::scaffold::{self, ScaffoldConfig};

/// Where `publish` sends the resources
pub enum PublishTarget {
    Cluster(Option<PathBuf>),
    Directory(PathBuf),
}

pub fn category() {
    for category in CATEGORIES {
        println!(
            "{:<30} (Normalized name: {})",
            category.display_name_en, category.normalized_name
        );
    }
}

pub fn create(
    name: String,
    category: Option<String>,
    author: Option<String>,
    email: Option<String>,
    url: String,
) -> Result<()> {
    let category = match category {
        Some(category) => category,
        None => prompt_category(&name)?,
    };
    let author = match author {
        Some(author) => author,
        None => prompt_required("Please input extension author:", "author can't be empty")?,
    };
    let email = match email {
        Some(email) => email,
        None => prompt_required("Please input Email:", "Email can't be empty")?,
    };

    let config = ScaffoldConfig {
        name,
        category,
        author,
        email,
        url,
    };
    let dir = std::env::current_dir()
        .context("Failed to resolve current directory")?
        .join(&config.name);
    scaffold::create(&dir, &config)?;

    println!("Directory: {}\n", dir.display());
    println!("The extension has been created.");
    Ok(())
}

fn prompt_category(name: &str) -> Result<String> {
    let items: Vec<&str> = CATEGORIES.iter().map(|c| c.normalized_name).collect();
    let selection = Select::new(&format!("What category does {name} belong to?"), items)
        .with_page_size(10)
        .prompt()
        .context("Category selection cancelled")?;
    Ok(selection.to_string())
}

fn prompt_required(label: &str, empty_message: &'static str) -> Result<String> {
    let answer = Text::new(label)
        .with_validator(move |input: &str| -> Result<Validation, CustomUserError> {
            if input.trim().is_empty() {
                Ok(Validation::Invalid(empty_message.into()))
            } else {
                Ok(Validation::Valid)
            }
        })
        .prompt()
        .context("Prompt cancelled")?;
    Ok(answer.trim().to_string())
}

pub fn package(dir: &Path, output: &Path) -> Result<()> {
    println!("package extension {}", dir.display());

    let metadata = Metadata::load(dir)
        .with_context(|| format!("Failed to load extension at {dir:?}"))?;
    let archive = package_chart(dir, &metadata.to_chart_metadata(), output)?;

    let bytes = std::fs::read(&archive).with_context(|| format!("Failed to read {archive:?}"))?;
    let parsed = parse_archive(&metadata.name, &bytes)?;
    let digest = format!("sha256:{:x}", Sha256::digest(&bytes));
    let languages: Vec<&str> = parsed
        .supported_languages
        .iter()
        .map(|code| code.as_str())
        .collect();

    println!("Created: {}", archive.display());
    println!("Size:    {} bytes", bytes.len());
    println!("Digest:  {digest}");
    println!();
    println!("Extension: {} v{}", parsed.chart.name, parsed.chart.version);
    println!("Languages: {}", languages.join(", "));
    Ok(())
}

pub fn validate(dir: &Path) -> Result<()> {
    println!("validating extension {}", dir.display());

    let extension = Extension::load(dir)?;
    validate_archive(&extension.metadata.name, &extension.chart_data)?;

    println!("\nno issues found");
    Ok(())
}

pub fn lint(dir: &Path, strict: bool) -> Result<()> {
    let report = lint_extension(dir)?;
    for message in &report.messages {
        println!("{message}");
    }

    let warnings = report.warnings().count();
    if warnings == 0 {
        println!("\nno issues found");
    } else if strict {
        anyhow::bail!("{warnings} warning(s) found");
    }
    Ok(())
}

fn load_extension(dir: &Path, chart_url: Option<String>) -> Result<Extension> {
    let extension = Extension::load(dir)?;
    Ok(match chart_url {
        Some(url) => extension.with_chart_url(url),
        None => extension,
    })
}

pub fn template(dir: &Path, chart_url: Option<String>) -> Result<()> {
    let extension = load_extension(dir, chart_url)?;
    print!("{}", render_yaml_stream(&extension.to_kubernetes_resources())?);
    Ok(())
}

pub async fn publish(dir: &Path, target: PublishTarget, chart_url: Option<String>) -> Result<()> {
    println!("publish extension {}", dir.display());
    let extension = load_extension(dir, chart_url)?;

    match target {
        PublishTarget::Directory(output) => {
            println!("generate resources to {}", output.display());
            for path in publish_to_directory(&extension, &output)? {
                println!("created {}", path.display());
            }
        }
        PublishTarget::Cluster(kubeconfig) => {
            println!("apply resources to k8s cluster");
            let client = KubectlClient::new(kubeconfig);
            for object in publish_to_cluster(&extension, &client).await? {
                println!("applied {object}");
            }
        }
    }
    Ok(())
}

pub async fn unpublish(name: &str, kubeconfig: Option<PathBuf>) -> Result<()> {
    println!("unpublish extension {name}");
    let client = KubectlClient::new(kubeconfig);
    for object in unpublish_extension(name, &client).await? {
        println!("deleted {object}");
    }
    Ok(())
}
