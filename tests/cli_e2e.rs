//! End-to-end CLI tests for the repo-cloner binary.

#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Command isolated from the user's config file and credential variables.
fn cloner(config_home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("repo-cloner").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home.path())
        .env_remove("REPO_CLONER_SOURCE_USER")
        .env_remove("REPO_CLONER_SOURCE_PASSWORD")
        .env_remove("REPO_CLONER_TARGET_USER")
        .env_remove("REPO_CLONER_TARGET_PASSWORD")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_binary_help_displays_usage() {
    let home = TempDir::new().unwrap();
    cloner(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--source-root-url"))
        .stdout(predicate::str::contains("--skip-existing"));
}

#[test]
fn test_binary_version_displays_version() {
    let home = TempDir::new().unwrap();
    cloner(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("repo-cloner"));
}

#[test]
fn test_binary_without_urls_is_config_error() {
    let home = TempDir::new().unwrap();
    cloner(&home)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("requires a source root URL"));
}

#[test]
fn test_binary_half_credentials_rejected() {
    let home = TempDir::new().unwrap();
    cloner(&home)
        .args([
            "--actions",
            "publish",
            "--target-root-url",
            "https://t.example/",
            "--target-user",
            "deploy",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("credentials need both"));
}

#[test]
fn test_binary_invalid_config_file_rejected() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("custom.toml");
    std::fs::write(&config, "rate_limit = lots\n").unwrap();

    cloner(&home)
        .arg("--config")
        .arg(&config)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("rate_limit"));
}

#[tokio::test]
async fn test_binary_mirror_prints_summary() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repo/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"<a href="x.jar">x.jar</a>"#))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repo/x.jar"))
        .respond_with(ResponseTemplate::new(200).set_body_string("X"))
        .mount(&server)
        .await;
    let home = TempDir::new().unwrap();
    let mirror = home.path().join("mirror");

    let mut cmd = cloner(&home);
    cmd.args(["--actions", "mirror", "--rate-limit", "0", "-q"])
        .arg("--source-root-url")
        .arg(format!("{}/repo/", server.uri()))
        .arg("--mirror-path")
        .arg(&mirror);

    let assert = tokio::task::spawn_blocking(move || cmd.assert())
        .await
        .unwrap();
    assert
        .success()
        .stdout(predicate::str::contains("mirror: downloaded=1"));
    assert!(mirror.join("x.jar").exists());
}

#[tokio::test]
async fn test_binary_partial_failure_exit_code_two() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let home = TempDir::new().unwrap();
    let mirror = home.path().join("mirror");
    std::fs::create_dir_all(&mirror).unwrap();
    std::fs::write(mirror.join("x.jar"), "X").unwrap();

    let mut cmd = cloner(&home);
    cmd.args(["--actions", "publish", "--rate-limit", "0", "-q", "--json"])
        .arg("--target-root-url")
        .arg(format!("{}/releases", server.uri()))
        .arg("--mirror-path")
        .arg(&mirror);

    let assert = tokio::task::spawn_blocking(move || cmd.assert())
        .await
        .unwrap();
    assert
        .code(2)
        .stdout(predicate::str::contains("\"pipeline\": \"publish\""))
        .stdout(predicate::str::contains("\"failed\": 1"));
}
