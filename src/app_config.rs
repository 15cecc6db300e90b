//! Configuration file loading for CLI defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

/// File configuration for repo-cloner defaults.
///
/// Every field mirrors a CLI flag; flags given on the command line win.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// Comma separated action list.
    pub actions: Option<String>,
    /// Source repository root URL.
    pub source_root_url: Option<String>,
    /// Source repository username.
    pub source_user: Option<String>,
    /// Source repository password.
    pub source_password: Option<String>,
    /// Target repository root URL.
    pub target_root_url: Option<String>,
    /// Target repository username.
    pub target_user: Option<String>,
    /// Target repository password.
    pub target_password: Option<String>,
    /// Local mirror directory.
    pub mirror_path: Option<PathBuf>,
    /// Parallel downloads per index page.
    pub crawl_concurrency: Option<u8>,
    /// Parallel uploads per directory.
    pub publish_concurrency: Option<u8>,
    /// Per-worker request delay in milliseconds.
    pub rate_limit: Option<u64>,
    /// Probe the target before uploading.
    pub skip_existing: Option<bool>,
    /// Stop after the first failed transfer.
    pub abort_on_error: Option<bool>,
    /// Index page depth cap.
    pub max_depth: Option<u16>,
    /// Run preflight checks.
    pub check: Option<bool>,
    /// Explicit proxy URL.
    pub proxy: Option<String>,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// Download request timeout in seconds.
    pub download_timeout_secs: Option<u64>,
    /// Upload request timeout in seconds.
    pub upload_timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Validates config values against the same constraints as the CLI.
    pub fn validate(&self) -> Result<()> {
        validate_concurrency("crawl_concurrency", self.crawl_concurrency)?;
        validate_concurrency("publish_concurrency", self.publish_concurrency)?;

        if let Some(rate_limit) = self.rate_limit
            && rate_limit > 60_000
        {
            bail!("Invalid config value for `rate_limit`: {rate_limit}. Expected range: 0..=60000");
        }
        if self.max_depth == Some(0) {
            bail!("Invalid config value for `max_depth`: 0. Expected at least 1");
        }

        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs, 3600)?;
        validate_timeout_secs("download_timeout_secs", self.download_timeout_secs, 3600)?;
        validate_timeout_secs("upload_timeout_secs", self.upload_timeout_secs, 7200)?;
        Ok(())
    }
}

fn validate_concurrency(field: &str, value: Option<u8>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=100).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=100");
    }
    Ok(())
}

fn validate_timeout_secs(field: &str, value: Option<u64>, max: u64) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=max).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..={max}");
    }
    Ok(())
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/repo-cloner/config.toml`
/// 2. `$HOME/.config/repo-cloner/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("repo-cloner")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("repo-cloner")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the file configuration.
///
/// An explicit path must exist. The default path is optional: a missing file
/// means no file configuration.
pub fn load_file_config(explicit: Option<&Path>) -> Result<Option<FileConfig>> {
    if let Some(path) = explicit {
        return read_file_config(path).map(Some);
    }

    match resolve_default_config_path() {
        Some(path) if path.exists() => read_file_config(&path).map(Some),
        _ => Ok(None),
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }
        let line_no = line_index + 1;

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_no}: expected key = value");
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let context = || format!("Invalid `{key}` value on line {line_no}");

        match key {
            "actions" => cfg.actions = Some(parse_string_literal(value).with_context(context)?),
            "source_root_url" => {
                cfg.source_root_url = Some(parse_string_literal(value).with_context(context)?);
            }
            "source_user" => {
                cfg.source_user = Some(parse_string_literal(value).with_context(context)?);
            }
            "source_password" => {
                cfg.source_password = Some(parse_string_literal(value).with_context(context)?);
            }
            "target_root_url" => {
                cfg.target_root_url = Some(parse_string_literal(value).with_context(context)?);
            }
            "target_user" => {
                cfg.target_user = Some(parse_string_literal(value).with_context(context)?);
            }
            "target_password" => {
                cfg.target_password = Some(parse_string_literal(value).with_context(context)?);
            }
            "mirror_path" => {
                cfg.mirror_path = Some(PathBuf::from(
                    parse_string_literal(value).with_context(context)?,
                ));
            }
            "crawl_concurrency" => {
                cfg.crawl_concurrency = Some(parse_integer_u8(value).with_context(context)?);
            }
            "publish_concurrency" => {
                cfg.publish_concurrency = Some(parse_integer_u8(value).with_context(context)?);
            }
            "rate_limit" => cfg.rate_limit = Some(parse_integer_u64(value).with_context(context)?),
            "skip_existing" => {
                cfg.skip_existing = Some(parse_boolean(value).with_context(context)?);
            }
            "abort_on_error" => {
                cfg.abort_on_error = Some(parse_boolean(value).with_context(context)?);
            }
            "max_depth" => {
                let parsed = parse_integer_u64(value).with_context(context)?;
                let depth = u16::try_from(parsed)
                    .map_err(|_| anyhow::anyhow!("max_depth out of range for u16"))
                    .with_context(context)?;
                cfg.max_depth = Some(depth);
            }
            "check" => cfg.check = Some(parse_boolean(value).with_context(context)?),
            "proxy" => cfg.proxy = Some(parse_string_literal(value).with_context(context)?),
            "connect_timeout_secs" => {
                cfg.connect_timeout_secs = Some(parse_integer_u64(value).with_context(context)?);
            }
            "download_timeout_secs" => {
                cfg.download_timeout_secs = Some(parse_integer_u64(value).with_context(context)?);
            }
            "upload_timeout_secs" => {
                cfg.upload_timeout_secs = Some(parse_integer_u64(value).with_context(context)?);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_no}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u8(raw_value: &str) -> Result<u8> {
    let value = parse_integer_u64(raw_value)?;
    u8::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u8"))
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

fn parse_boolean(raw_value: &str) -> Result<bool> {
    match raw_value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => bail!("Expected 'true' or 'false'"),
    }
}
