//! End-to-end tests of the `ksbuilder` binary

use anyhow::Result;
use httpmock::prelude::*;
use serde_json::json;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Run ksbuilder in `cwd` with `HOME` pointed at `home`
fn ksbuilder(cwd: &Path, home: &Path, args: &[&str]) -> Result<Output> {
    Ok(Command::new(env!("CARGO_BIN_EXE_ksbuilder"))
        .args(args)
        .current_dir(cwd)
        .env("HOME", home)
        .env_remove("KSBUILDER_LOG")
        .output()?)
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn create_sample(workspace: &TempDir) -> Result<()> {
    let output = ksbuilder(
        workspace.path(),
        workspace.path(),
        &[
            "create",
            "sample",
            "--category",
            "security",
            "--author",
            "Jane Doe",
            "--email",
            "jane@example.com",
        ],
    )?;
    assert!(output.status.success(), "create failed: {}", stderr(&output));
    Ok(())
}

#[test]
fn test_version_and_category() -> Result<()> {
    let temp_dir = TempDir::new()?;

    let output = ksbuilder(temp_dir.path(), temp_dir.path(), &["version"])?;
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), env!("CARGO_PKG_VERSION"));

    let output = ksbuilder(temp_dir.path(), temp_dir.path(), &["category"])?;
    assert!(output.status.success());
    assert!(stdout(&output).contains("(Normalized name: security)"));
    Ok(())
}

#[test]
fn test_create_validate_package() -> Result<()> {
    let workspace = TempDir::new()?;
    create_sample(&workspace)?;
    assert!(workspace.path().join("sample/extension.yaml").is_file());

    let output = ksbuilder(workspace.path(), workspace.path(), &["validate", "sample"])?;
    assert!(output.status.success(), "validate failed: {}", stderr(&output));
    assert!(stdout(&output).contains("no issues found"));

    let output = ksbuilder(
        workspace.path(),
        workspace.path(),
        &["package", "sample", "--output", "dist"],
    )?;
    assert!(output.status.success(), "package failed: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("Digest:  sha256:"));
    assert!(text.contains("Languages: en, zh"));
    assert!(workspace.path().join("dist/sample-0.1.0.tgz").is_file());
    Ok(())
}

#[test]
fn test_package_without_static_directory() -> Result<()> {
    let workspace = TempDir::new()?;
    create_sample(&workspace)?;
    let ignore_path = workspace.path().join("sample/.helmignore");
    let ignore = std::fs::read_to_string(&ignore_path)?;
    std::fs::write(&ignore_path, format!("{ignore}\nstatic/\n"))?;

    let output = ksbuilder(
        workspace.path(),
        workspace.path(),
        &["package", "sample", "--output", "dist"],
    )?;
    assert!(output.status.success(), "package failed: {}", stderr(&output));
    assert!(stdout(&output).contains("Extension: sample v0.1.0"));
    Ok(())
}

#[test]
fn test_create_refuses_existing_directory() -> Result<()> {
    let workspace = TempDir::new()?;
    create_sample(&workspace)?;

    let output = ksbuilder(
        workspace.path(),
        workspace.path(),
        &[
            "create",
            "sample",
            "--category",
            "security",
            "--author",
            "a",
            "--email",
            "b",
        ],
    )?;
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("not empty"));
    Ok(())
}

#[test]
fn test_template_and_local_publish() -> Result<()> {
    let workspace = TempDir::new()?;
    create_sample(&workspace)?;

    let output = ksbuilder(workspace.path(), workspace.path(), &["template", "sample"])?;
    assert!(output.status.success(), "template failed: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("kind: Extension\n"));
    assert!(text.contains("kind: ExtensionVersion\n"));
    assert!(text.contains("kind: ConfigMap\n"));

    let output = ksbuilder(
        workspace.path(),
        workspace.path(),
        &["publish", "sample", "--to-local-template", "--output", "manifests"],
    )?;
    assert!(output.status.success(), "publish failed: {}", stderr(&output));
    for kind in ["Extension", "ExtensionVersion", "ConfigMap"] {
        assert!(workspace
            .path()
            .join(format!("manifests/{kind}.yaml"))
            .is_file());
    }
    Ok(())
}

#[test]
fn test_lint_strict_fails_on_warnings() -> Result<()> {
    let workspace = TempDir::new()?;
    create_sample(&workspace)?;

    let output = ksbuilder(workspace.path(), workspace.path(), &["lint", "sample"])?;
    assert!(output.status.success());
    assert!(stdout(&output).contains("[WARNING] extension sample has no images"));

    let output = ksbuilder(
        workspace.path(),
        workspace.path(),
        &["lint", "sample", "--strict"],
    )?;
    assert_eq!(output.status.code(), Some(1));
    Ok(())
}

#[test]
fn test_invalid_extension_exits_with_error() -> Result<()> {
    let workspace = TempDir::new()?;
    std::fs::create_dir_all(workspace.path().join("broken"))?;
    std::fs::write(workspace.path().join("broken/extension.yaml"), "apiVersion: v1\n")?;

    let output = ksbuilder(workspace.path(), workspace.path(), &["validate", "broken"])?;
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("name"));
    Ok(())
}

#[test]
fn test_login_list_logout() -> Result<()> {
    let home = TempDir::new()?;
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET)
            .path("/apis/user/v1/user")
            .header("authorization", "Bearer secret");
        then.status(200).json_body(json!({"user_id": "u-1"}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/apis/extension/v1/users/u-1/extensions");
        then.status(200).json_body(json!({
            "extensions": [{
                "extension_id": "7",
                "name": "sample",
                "status": "ready",
                "latest_version": {"version": "1.0.0"}
            }]
        }));
    });

    let base_url = server.base_url();
    let output = ksbuilder(
        home.path(),
        home.path(),
        &["login", "-t", "secret", "--server", &base_url],
    )?;
    assert!(output.status.success(), "login failed: {}", stderr(&output));
    assert!(stdout(&output).contains("Login Succeeded"));
    let config_path = home.path().join(".ksbuilder/config.json");
    assert!(config_path.is_file());

    let output = ksbuilder(home.path(), home.path(), &["list"])?;
    assert!(output.status.success(), "list failed: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("Latest version"));
    assert!(text.contains("sample"));

    let output = ksbuilder(home.path(), home.path(), &["logout"])?;
    assert!(output.status.success());
    assert!(stdout(&output).contains("Logout Succeeded"));
    assert!(!config_path.exists());
    Ok(())
}

#[test]
fn test_login_rejected_token() -> Result<()> {
    let home = TempDir::new()?;
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/apis/user/v1/user");
        then.status(401).json_body(json!({"message": "invalid token"}));
    });

    let base_url = server.base_url();
    let output = ksbuilder(
        home.path(),
        home.path(),
        &["login", "-t", "bad", "--server", &base_url],
    )?;
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("login failed: 401 Unauthorized, invalid token"));
    assert!(!home.path().join(".ksbuilder/config.json").exists());
    Ok(())
}
