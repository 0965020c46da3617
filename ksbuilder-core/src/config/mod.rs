//! Stored KubeSphere Cloud credentials
//!
//! `ksbuilder login` writes `~/.ksbuilder/config.json`:
//!
//! ```json
//! {
//!   "token": "<base64 of the API token>",
//!   "server": "https://apis.kubesphere.cloud"
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_DIR: &str = ".ksbuilder";
pub const CONFIG_FILENAME: &str = "config.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudConfig {
    #[serde(default, with = "base64_token")]
    pub token: String,

    #[serde(default)]
    pub server: String,
}

/// `~/.ksbuilder/config.json`
pub fn default_config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(CONFIG_DIR).join(CONFIG_FILENAME))
}

impl CloudConfig {
    /// Read the default config file; a missing file is an empty config
    pub fn read() -> Result<Self> {
        Self::read_at(&default_config_path()?)
    }

    pub fn read_at(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    pub fn write(&self) -> Result<PathBuf> {
        let path = default_config_path()?;
        self.write_at(&path)?;
        Ok(path)
    }

    pub fn write_at(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        tracing::debug!("Wrote config to {}", path.display());
        Ok(())
    }

    /// Delete the default config file
    pub fn remove() -> Result<()> {
        Self::remove_at(&default_config_path()?)
    }

    /// Removing a missing file succeeds
    pub fn remove_at(path: &Path) -> Result<()> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                Err(e).with_context(|| format!("Failed to remove config: {}", path.display()))
            }
        }
    }
}

mod base64_token {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(token: &str, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(token.as_bytes()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        let encoded = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        let bytes = STANDARD.decode(encoded.as_bytes()).map_err(D::Error::custom)?;
        String::from_utf8(bytes).map_err(D::Error::custom)
    }
}
