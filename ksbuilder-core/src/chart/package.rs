//! Chart packaging
//!
//! The source directory is copied into a scratch directory, `Chart.yaml` is
//! replaced with the generated manifest, and the result is written as a
//! gzipped tarball whose entries live under `<name>/`.

use anyhow::{Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::path::{Path, PathBuf};
use tar::{Builder, Header};
use tempfile::TempDir;
use walkdir::WalkDir;

use super::ignore::IgnoreRules;
use super::metadata::{ChartMetadata, CHART_FILENAME};

/// Package `source` as a chart archive inside `output`
///
/// Returns the path of the written `<name>-<version>.tgz`.
pub fn package(source: &Path, chart: &ChartMetadata, output: &Path) -> Result<PathBuf> {
    check_chart(chart)?;

    let staging = TempDir::new().context("Failed to create staging directory")?;
    stage(source, staging.path())?;

    let manifest = chart.to_yaml()?;
    std::fs::write(staging.path().join(CHART_FILENAME), manifest)
        .context("Failed to write Chart.yaml")?;

    std::fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory {output:?}"))?;
    let archive_path = output.join(chart.archive_name());
    write_archive(staging.path(), &chart.name, &archive_path)?;

    tracing::info!("Packaged {} v{} to {:?}", chart.name, chart.version, archive_path);
    Ok(archive_path)
}

fn check_chart(chart: &ChartMetadata) -> Result<()> {
    if chart.name.trim().is_empty() {
        anyhow::bail!("Chart name must not be empty");
    }
    semver::Version::parse(&chart.version).with_context(|| {
        format!(
            "Chart version '{}' is not a valid SemVer 2 version",
            chart.version
        )
    })?;
    Ok(())
}

/// Copy `source` into `dest`, honouring `.helmignore`
pub fn stage(source: &Path, dest: &Path) -> Result<()> {
    let rules = IgnoreRules::load(source)?;

    let walker = WalkDir::new(source).min_depth(1).into_iter();
    let entries = walker.filter_entry(|entry| match entry.path().strip_prefix(source) {
        Ok(relative) => !rules.is_ignored(relative, entry.file_type().is_dir()),
        Err(_) => false,
    });

    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to walk {source:?}"))?;
        let relative = entry.path().strip_prefix(source)?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create {target:?}"))?;
        } else if entry.path().is_file() {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(entry.path(), &target)
                .with_context(|| format!("Failed to copy {:?}", entry.path()))?;
        }
    }
    Ok(())
}

/// Write every file under `dir` into a gzipped tarball rooted at `name/`
///
/// Entries are sorted and carry fixed ownership, mode and mtime so the same
/// input always produces the same bytes.
pub fn write_archive(dir: &Path, name: &str, archive_path: &Path) -> Result<()> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {dir:?}"))?;
        if entry.path().is_file() {
            files.push(entry.into_path());
        }
    }

    let archive = File::create(archive_path)
        .with_context(|| format!("Failed to create {archive_path:?}"))?;
    let encoder = GzEncoder::new(archive, Compression::default());
    let mut builder = Builder::new(encoder);

    for file in files {
        let relative = file.strip_prefix(dir)?;
        let entry_name = format!("{name}/{}", relative.to_string_lossy().replace('\\', "/"));
        let data = std::fs::read(&file).with_context(|| format!("Failed to read {file:?}"))?;

        let mut header = Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(0);
        header.set_uid(0);
        header.set_gid(0);
        header.set_entry_type(tar::EntryType::Regular);
        builder
            .append_data(&mut header, &entry_name, data.as_slice())
            .with_context(|| format!("Failed to add {entry_name} to archive"))?;
    }

    let encoder = builder.into_inner().context("Failed to finalize archive")?;
    encoder.finish().context("Failed to compress archive")?;
    Ok(())
}

#[cfg(test)]
mod package_tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;

    fn chart(version: &str) -> ChartMetadata {
        ChartMetadata {
            api_version: "v2".to_string(),
            name: "sample".to_string(),
            version: version.to_string(),
            description: "A sample".to_string(),
            ..Default::default()
        }
    }

    fn source_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        std::fs::write(root.join("Chart.yaml"), "name: stale\nversion: 0.0.1\n").unwrap();
        std::fs::write(root.join("values.yaml"), "replicas: 1\n").unwrap();
        std::fs::create_dir_all(root.join("templates")).unwrap();
        std::fs::write(root.join("templates/deployment.yaml"), "kind: Deployment\n").unwrap();
        std::fs::write(root.join("templates/deployment.yaml.bak"), "old\n").unwrap();
        std::fs::create_dir_all(root.join(".git")).unwrap();
        std::fs::write(root.join(".git/HEAD"), "ref: refs/heads/main\n").unwrap();
        std::fs::write(root.join(".helmignore"), "*.bak\n").unwrap();
        dir
    }

    fn entries(archive: &Path) -> Vec<(String, Vec<u8>)> {
        let file = File::open(archive).unwrap();
        let mut tar = tar::Archive::new(GzDecoder::new(file));
        tar.entries()
            .unwrap()
            .map(|entry| {
                let mut entry = entry.unwrap();
                let path = entry.path().unwrap().to_string_lossy().into_owned();
                let mut data = Vec::new();
                entry.read_to_end(&mut data).unwrap();
                (path, data)
            })
            .collect()
    }

    #[test]
    fn test_package_layout() {
        let source = source_dir();
        let output = TempDir::new().unwrap();

        let path = package(source.path(), &chart("1.0.0"), output.path()).unwrap();
        assert_eq!(path, output.path().join("sample-1.0.0.tgz"));

        let entries = entries(&path);
        let names: Vec<&str> = entries.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "sample/.helmignore",
                "sample/Chart.yaml",
                "sample/templates/deployment.yaml",
                "sample/values.yaml",
            ]
        );

        let manifest = &entries[1].1;
        let parsed = ChartMetadata::from_yaml(std::str::from_utf8(manifest).unwrap()).unwrap();
        assert_eq!(parsed, chart("1.0.0"));
    }

    #[test]
    fn test_package_is_reproducible() {
        let source = source_dir();
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();

        let a = package(source.path(), &chart("1.0.0"), first.path()).unwrap();
        let b = package(source.path(), &chart("1.0.0"), second.path()).unwrap();
        assert_eq!(std::fs::read(a).unwrap(), std::fs::read(b).unwrap());
    }

    #[test]
    fn test_package_rejects_invalid_version() {
        let source = source_dir();
        let output = TempDir::new().unwrap();

        let err = package(source.path(), &chart("latest"), output.path()).unwrap_err();
        assert!(err.to_string().contains("SemVer"));
        assert!(!output.path().join("sample-latest.tgz").exists());
    }

    #[test]
    fn test_source_is_left_untouched() {
        let source = source_dir();
        let output = TempDir::new().unwrap();

        package(source.path(), &chart("2.1.0-rc.1"), output.path()).unwrap();
        let stale = std::fs::read_to_string(source.path().join("Chart.yaml")).unwrap();
        assert_eq!(stale, "name: stale\nversion: 0.0.1\n");
    }
}
