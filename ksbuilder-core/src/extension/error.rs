//! Errors raised while loading and validating extension metadata

use std::path::PathBuf;
use thiserror::Error;

use super::locale::LANGUAGE_CODE_REFERENCE;

/// Extension metadata errors
#[derive(Error, Debug)]
pub enum MetadataError {
    /// A file could not be read
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The descriptor is not valid YAML for the metadata schema
    #[error("failed to parse extension metadata: {source}")]
    Parse {
        #[source]
        source: serde_yaml_ng::Error,
    },

    /// One or more required fields are empty or absent
    #[error("extension metadata is missing required fields: {}", .fields.join(", "))]
    MissingFields { fields: Vec<&'static str> },

    /// A locale key is not a recognized language code
    #[error("invalid language code {code}, see {} for more details", LANGUAGE_CODE_REFERENCE)]
    InvalidLanguageCode { code: String },
}

impl MetadataError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
