//! A scaffolded extension goes through load, package, lint and publish

mod common;

use ksbuilder_core::chart::{package, parse_archive, read_archive, validate_archive, ChartMetadata};
use ksbuilder_core::cluster::publish_to_directory;
use ksbuilder_core::extension::{Extension, Metadata};
use ksbuilder_core::lint::lint;
use ksbuilder_core::resources::{render_yaml_stream, Resource};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

#[test]
fn test_scaffolded_extension_loads_and_packages() {
    common::init_test_logging();
    let temp_dir = TempDir::new().unwrap();
    let dir = common::create_extension(temp_dir.path(), "observer");

    let extension = Extension::load(&dir).unwrap();
    assert_eq!(extension.version_name(), "observer-0.1.0");
    assert!(extension
        .metadata
        .icon
        .starts_with("data:image/svg+xml;base64,"));

    let files = read_archive(&extension.chart_data).unwrap();
    assert!(files.contains_key("observer/extension.yaml"));
    assert!(files.contains_key("observer/charts/backend/templates/deployment.yaml"));

    let chart = ChartMetadata::from_yaml(
        std::str::from_utf8(&files["observer/Chart.yaml"]).unwrap(),
    )
    .unwrap();
    assert_eq!(chart.name, "observer");
    assert_eq!(chart.version, "0.1.0");
    assert_eq!(chart.dependencies.len(), 2);

    validate_archive("observer", &extension.chart_data).unwrap();
}

#[test]
fn test_archive_summary() {
    let temp_dir = TempDir::new().unwrap();
    let dir = common::create_extension(temp_dir.path(), "observer");
    let extension = Extension::load(&dir).unwrap();

    let parsed = parse_archive("observer", &extension.chart_data).unwrap();
    let languages: Vec<&str> = parsed
        .supported_languages
        .iter()
        .map(|code| code.as_str())
        .collect();
    assert_eq!(languages, vec!["en", "zh"]);
    assert!(parsed.readme.get("en").unwrap().starts_with("# observer"));
    assert!(parsed.readme.get("zh").unwrap().starts_with("# observer"));
    assert_eq!(parsed.category, "monitoring-logging");
    assert_eq!(parsed.static_file_directory, "static");
}

#[test]
fn test_package_with_static_directory_ignored() {
    let temp_dir = TempDir::new().unwrap();
    let dir = common::create_extension(temp_dir.path(), "observer");
    let ignore = std::fs::read_to_string(dir.join(".helmignore")).unwrap();
    std::fs::write(dir.join(".helmignore"), format!("{ignore}\nstatic/\n")).unwrap();

    let metadata = Metadata::load(&dir).unwrap();
    let output = temp_dir.path().join("dist");
    let archive = package(&dir, &metadata.to_chart_metadata(), &output).unwrap();
    let bytes = std::fs::read(&archive).unwrap();

    let files = read_archive(&bytes).unwrap();
    assert!(!files.contains_key("observer/static/icon.svg"));

    let parsed = parse_archive("observer", &bytes).unwrap();
    assert_eq!(parsed.chart.icon, "data:image/svg+xml;base64,");
    assert_eq!(parsed.chart.version, "0.1.0");
}

#[test]
fn test_packaging_is_reproducible() {
    let temp_dir = TempDir::new().unwrap();
    let dir = common::create_extension(temp_dir.path(), "observer");

    let first = Extension::load(&dir).unwrap();
    let second = Extension::load(&dir).unwrap();
    assert_eq!(first.chart_data, second.chart_data);
}

#[test]
fn test_scaffolded_extension_lints_clean_except_images() {
    let temp_dir = TempDir::new().unwrap();
    let dir = common::create_extension(temp_dir.path(), "observer");

    let report = lint(&dir).unwrap();
    let warnings: Vec<String> = report.warnings().map(|m| m.message.clone()).collect();
    assert_eq!(warnings, vec!["extension observer has no images"]);
    assert_eq!(report.global_value_usages["global.imageRegistry"].len(), 2);
}

#[test]
fn test_publish_to_directory_and_template_stream() {
    let temp_dir = TempDir::new().unwrap();
    let dir = common::create_extension(temp_dir.path(), "observer");
    let extension = Extension::load(&dir).unwrap();

    let output = temp_dir.path().join("manifests");
    let written = publish_to_directory(&extension, &output).unwrap();
    assert_eq!(written.len(), 3);
    let config_map = std::fs::read_to_string(output.join("ConfigMap.yaml")).unwrap();
    assert!(config_map.contains("name: extension-observer-0.1.0-chart"));

    let resources = extension
        .clone()
        .with_chart_url("https://charts.example.com/observer-0.1.0.tgz")
        .to_kubernetes_resources();
    assert!(matches!(resources.last(), Some(Resource::ExtensionVersion(_))));
    let stream = render_yaml_stream(&resources).unwrap();
    assert!(stream.contains("chartURL: https://charts.example.com/observer-0.1.0.tgz"));
    assert!(!stream.contains("kind: ConfigMap"));
}
