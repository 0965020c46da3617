//! KubeSphere extensions
//!
//! An extension is a Helm chart described by an `extension.yaml` descriptor.
//! This module loads and validates the descriptor and turns an extension
//! directory into an [`Extension`] carrying its packaged chart.
//!
//! ```text
//! my-extension/
//!     extension.yaml   ← descriptor (name, locales, category, icon, ...)
//!     values.yaml
//!     charts/          ← frontend / backend sub-charts
//!     static/          ← icon and screenshots
//! ```

mod category;
mod error;
mod icon;
mod locale;
mod metadata;

pub use category::{find_category, Category, CATEGORIES};
pub use error::MetadataError;
pub use icon::{encode_data_uri, encode_icon, is_local_file, mime_from_extension, sniff_content_type};
pub use locale::{LanguageCode, Locales, LANGUAGE_CODE_REFERENCE};
pub use metadata::{
    ExternalDependency, InstallationMode, LoadOptions, Metadata, METADATA_FILENAME,
};

use anyhow::{Context, Result};
use std::path::Path;
use tempfile::TempDir;

/// A validated extension and the chart it publishes
#[derive(Debug, Clone, PartialEq)]
pub struct Extension {
    pub metadata: Metadata,

    /// Remote chart location, used instead of the embedded archive when set
    pub chart_url: Option<String>,

    /// Packaged chart (`.tgz` bytes)
    pub chart_data: Vec<u8>,
}

impl Extension {
    /// Load an extension directory and package its chart
    pub fn load(dir: &Path) -> Result<Self> {
        let metadata = Metadata::load(dir)
            .with_context(|| format!("Failed to load extension at {dir:?}"))?;

        let scratch = TempDir::new().context("Failed to create temporary directory")?;
        let archive = crate::chart::package(dir, &metadata.to_chart_metadata(), scratch.path())?;
        let chart_data =
            std::fs::read(&archive).with_context(|| format!("Failed to read {archive:?}"))?;

        Ok(Self {
            metadata,
            chart_url: None,
            chart_data,
        })
    }

    /// Reference the chart by URL instead of embedding it
    pub fn with_chart_url(mut self, url: impl Into<String>) -> Self {
        self.chart_url = Some(url.into());
        self.chart_data.clear();
        self
    }

    /// `<name>-<version>`, the name of the ExtensionVersion object
    pub fn version_name(&self) -> String {
        format!("{}-{}", self.metadata.name, self.metadata.version)
    }
}
