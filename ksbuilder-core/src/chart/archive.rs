//! Inspection of packaged extensions
//!
//! Archives are read entirely in memory. Entry paths are kept as written,
//! i.e. prefixed with the chart name.

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Component, Path};

use super::metadata::{ChartMetadata, Maintainer};
use crate::extension::{
    encode_data_uri, is_local_file, LanguageCode, Locales, Metadata, METADATA_FILENAME,
};

/// Summary of a packaged extension
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedExtension {
    pub chart: ChartMetadata,
    pub display_name: Locales,
    pub description: Locales,
    pub readme: Locales,
    pub changelog: Locales,
    pub category: String,
    pub ks_version: String,
    pub static_file_directory: String,
    pub screenshots: Vec<String>,
    pub provider: BTreeMap<LanguageCode, Maintainer>,
    /// Languages that have both a display name and a description
    pub supported_languages: Vec<LanguageCode>,
}

/// Read every regular file of a gzipped tarball
pub fn read_archive(bytes: &[u8]) -> Result<BTreeMap<String, Vec<u8>>> {
    let mut archive = tar::Archive::new(GzDecoder::new(bytes));
    let mut files = BTreeMap::new();

    for entry in archive.entries().context("Failed to read archive")? {
        let mut entry = entry.context("Failed to read archive entry")?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let path = entry.path()?.to_string_lossy().replace('\\', "/");
        let mut data = Vec::new();
        entry
            .read_to_end(&mut data)
            .with_context(|| format!("Failed to read {path} from archive"))?;
        files.insert(path, data);
    }
    Ok(files)
}

/// Check that the archive carries a valid `<name>/extension.yaml`
pub fn validate_archive(name: &str, bytes: &[u8]) -> Result<()> {
    let files = read_archive(bytes)?;
    let metadata = descriptor(name, &files)?;
    metadata
        .validate()
        .context("Extension metadata in archive is invalid")?;
    Ok(())
}

/// Extract the marketplace summary of a packaged extension
pub fn parse_archive(name: &str, bytes: &[u8]) -> Result<ParsedExtension> {
    let files = read_archive(bytes)?;
    let mut metadata = descriptor(name, &files)?;

    if !metadata.icon.is_empty() && is_local_file(&metadata.icon) {
        let icon_path = entry_path(name, &metadata.icon);
        let content: &[u8] = match files.get(&icon_path) {
            Some(content) => content.as_slice(),
            None => {
                tracing::warn!("Icon {icon_path} not found in archive");
                &[]
            }
        };
        metadata.icon = encode_data_uri(&metadata.icon, content);
    }

    let supported_languages = metadata.supported_languages();
    let readme = localized_documents(name, &files, "README", &supported_languages);
    let changelog = localized_documents(name, &files, "CHANGELOG", &supported_languages);

    Ok(ParsedExtension {
        chart: metadata.to_chart_metadata(),
        display_name: metadata.display_name,
        description: metadata.description,
        readme,
        changelog,
        category: metadata.category,
        ks_version: metadata.ks_version,
        static_file_directory: metadata.static_file_directory,
        screenshots: metadata.screenshots,
        provider: metadata.provider,
        supported_languages,
    })
}

fn descriptor(name: &str, files: &BTreeMap<String, Vec<u8>>) -> Result<Metadata> {
    let path = entry_path(name, METADATA_FILENAME);
    let content = files
        .get(&path)
        .with_context(|| format!("Unable to find the extension metadata file {path}"))?;
    Metadata::from_slice(content).context("Failed to parse the extension metadata")
}

/// `README.md` for English, `README_<lang>.md` otherwise
fn localized_documents(
    name: &str,
    files: &BTreeMap<String, Vec<u8>>,
    stem: &str,
    languages: &[LanguageCode],
) -> Locales {
    languages
        .iter()
        .map(|lang| {
            let file_name = if lang.as_str() == LanguageCode::EN {
                format!("{stem}.md")
            } else {
                format!("{stem}_{lang}.md")
            };
            let content = files
                .get(&entry_path(name, &file_name))
                .map(|data| String::from_utf8_lossy(data).into_owned())
                .unwrap_or_default();
            (lang.clone(), content)
        })
        .collect()
}

/// Archive entry name of a path relative to the chart root
fn entry_path(name: &str, relative: &str) -> String {
    let mut parts = vec![name.to_string()];
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::ParentDir => {
                if parts.len() > 1 {
                    parts.pop();
                }
            }
            _ => {}
        }
    }
    parts.join("/")
}

#[cfg(test)]
mod archive_tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use pretty_assertions::assert_eq;

    const DESCRIPTOR: &str = r#"
apiVersion: v1
name: sample
version: 1.0.0
displayName:
  en: Sample
  zh: 示例
  fr: Exemple
description:
  en: A sample extension
  zh: 示例扩展
category: security
provider:
  en:
    name: Example Inc.
icon: ./static/icon.svg
staticFileDirectory: static
"#;

    fn tarball(files: &[(&str, &str)]) -> Vec<u8> {
        let mut bytes = Vec::new();
        {
            let encoder = GzEncoder::new(&mut bytes, Compression::default());
            let mut builder = tar::Builder::new(encoder);
            for (path, data) in files {
                let mut header = tar::Header::new_gnu();
                header.set_size(data.len() as u64);
                header.set_mode(0o644);
                builder.append_data(&mut header, path, data.as_bytes()).unwrap();
            }
            builder.into_inner().unwrap().finish().unwrap();
        }
        bytes
    }

    #[test]
    fn test_entry_path_normalization() {
        assert_eq!(entry_path("sample", "./static/icon.svg"), "sample/static/icon.svg");
        assert_eq!(entry_path("sample", "README.md"), "sample/README.md");
        assert_eq!(entry_path("sample", "a/../b.png"), "sample/b.png");
        assert_eq!(entry_path("sample", "../../escape.png"), "sample/escape.png");
    }

    #[test]
    fn test_validate_archive() {
        let good = tarball(&[
            ("sample/extension.yaml", DESCRIPTOR),
            ("sample/static/icon.svg", "<svg/>"),
        ]);
        assert!(validate_archive("sample", &good).is_ok());

        let missing = tarball(&[("sample/values.yaml", "a: 1\n")]);
        let err = validate_archive("sample", &missing).unwrap_err();
        assert!(err.to_string().contains("Unable to find the extension metadata"));

        let wrong_root = tarball(&[("other/extension.yaml", DESCRIPTOR)]);
        assert!(validate_archive("sample", &wrong_root).is_err());

        let invalid = tarball(&[("sample/extension.yaml", "apiVersion: v1\nname: sample\n")]);
        let err = validate_archive("sample", &invalid).unwrap_err();
        assert!(format!("{err:#}").contains("missing required fields"));
    }

    #[test]
    fn test_parse_archive() {
        let bytes = tarball(&[
            ("sample/extension.yaml", DESCRIPTOR),
            ("sample/static/icon.svg", "<svg/>"),
            ("sample/README.md", "# Sample"),
            ("sample/README_zh.md", "# 示例"),
            ("sample/CHANGELOG.md", "## 1.0.0"),
        ]);

        let parsed = parse_archive("sample", &bytes).unwrap();
        assert_eq!(
            parsed.supported_languages,
            vec![LanguageCode::from("en"), LanguageCode::from("zh")]
        );
        assert_eq!(parsed.readme.get("en"), Some("# Sample"));
        assert_eq!(parsed.readme.get("zh"), Some("# 示例"));
        assert_eq!(parsed.changelog.get("en"), Some("## 1.0.0"));
        assert_eq!(parsed.changelog.get("zh"), Some(""));
        assert!(!parsed.readme.contains("fr"));
        assert_eq!(parsed.category, "security");
        assert_eq!(parsed.static_file_directory, "static");
        assert_eq!(parsed.chart.name, "sample");
        assert!(parsed.chart.icon.starts_with("data:image/svg+xml;base64,"));
    }

    #[test]
    fn test_parse_archive_missing_icon() {
        let bytes = tarball(&[("sample/extension.yaml", DESCRIPTOR)]);
        let parsed = parse_archive("sample", &bytes).unwrap();
        assert_eq!(parsed.chart.icon, "data:image/svg+xml;base64,");
        assert_eq!(parsed.chart.name, "sample");
    }

    #[test]
    fn test_read_archive_ignores_declared_size() {
        let mut bytes = Vec::new();
        {
            let encoder = GzEncoder::new(&mut bytes, Compression::default());
            let mut builder = tar::Builder::new(encoder);
            let mut header = tar::Header::new_gnu();
            header.set_path("sample/values.yaml").unwrap();
            header.set_size(u64::MAX / 2);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append(&header, &b"a: 1\n"[..]).unwrap();
            builder.into_inner().unwrap().finish().unwrap();
        }
        // truncated entry, only the outcome not crashing matters
        let _ = read_archive(&bytes);
    }

    #[test]
    fn test_not_a_gzip_stream() {
        assert!(read_archive(b"plain text").is_err());
    }
}
