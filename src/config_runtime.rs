//! Merging CLI flags over file configuration into a validated `RunConfig`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use repo_cloner::mirror::DEFAULT_MAX_DEPTH;
use repo_cloner::transport::constants::{
    CONNECT_TIMEOUT_SECS, DOWNLOAD_TIMEOUT_SECS, UPLOAD_TIMEOUT_SECS,
};
use repo_cloner::{
    Actions, DEFAULT_ACTIONS, DEFAULT_CONCURRENCY, DEFAULT_MIRROR_PATH, Endpoint, RunConfig,
    Timeouts,
};

use crate::app_config::FileConfig;
use crate::cli::Args;

/// Default per-worker request delay in milliseconds.
pub(crate) const DEFAULT_RATE_LIMIT_MS: u64 = 1000;

/// Resolves the effective run configuration.
///
/// Precedence per setting: command line (or its environment variable), then
/// the config file, then the built-in default.
pub(crate) fn resolve_run_config(args: &Args, file: Option<&FileConfig>) -> Result<RunConfig> {
    let empty = FileConfig::default();
    let file = file.unwrap_or(&empty);

    let actions_raw = pick(args.actions.clone(), file.actions.clone())
        .unwrap_or_else(|| DEFAULT_ACTIONS.to_string());
    let actions = Actions::parse(&actions_raw).context("Invalid `actions` setting")?;

    let source = pick(args.source_root_url.clone(), file.source_root_url.clone())
        .map(|url| {
            Endpoint::from_parts(
                "source",
                &url,
                pick(args.source_user.clone(), file.source_user.clone()),
                pick(args.source_password.clone(), file.source_password.clone()),
            )
        })
        .transpose()?;
    let target = pick(args.target_root_url.clone(), file.target_root_url.clone())
        .map(|url| {
            Endpoint::from_parts(
                "target",
                &url,
                pick(args.target_user.clone(), file.target_user.clone()),
                pick(args.target_password.clone(), file.target_password.clone()),
            )
        })
        .transpose()?;

    let rate_limit = Duration::from_millis(
        pick(args.rate_limit, file.rate_limit).unwrap_or(DEFAULT_RATE_LIMIT_MS),
    );
    let abort_on_error = args.abort_on_error || file.abort_on_error.unwrap_or(false);

    let mut config = RunConfig::new(actions, source, target);
    config.mirror_path = pick(args.mirror_path.clone(), file.mirror_path.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_MIRROR_PATH));
    config.crawl.concurrency = concurrency(args.crawl_concurrency, file.crawl_concurrency);
    config.crawl.min_interval = rate_limit;
    config.crawl.abort_on_error = abort_on_error;
    config.crawl.max_depth = pick(args.max_depth, file.max_depth)
        .map_or(DEFAULT_MAX_DEPTH, usize::from);
    config.publish.concurrency = concurrency(args.publish_concurrency, file.publish_concurrency);
    config.publish.min_interval = rate_limit;
    config.publish.abort_on_error = abort_on_error;
    config.publish.skip_existing = args.skip_existing || file.skip_existing.unwrap_or(false);
    config.proxy = pick(args.proxy.clone(), file.proxy.clone());
    config.timeouts = Timeouts {
        connect: secs(args.connect_timeout, file.connect_timeout_secs, CONNECT_TIMEOUT_SECS),
        download: secs(args.download_timeout, file.download_timeout_secs, DOWNLOAD_TIMEOUT_SECS),
        upload: secs(args.upload_timeout, file.upload_timeout_secs, UPLOAD_TIMEOUT_SECS),
    };
    config.check = args.check || file.check.unwrap_or(false);

    config.validate()?;
    Ok(config)
}

fn pick<T>(cli: Option<T>, file: Option<T>) -> Option<T> {
    cli.or(file)
}

fn concurrency(cli: Option<u8>, file: Option<u8>) -> usize {
    pick(cli, file).map_or(DEFAULT_CONCURRENCY, usize::from)
}

fn secs(cli: Option<u64>, file: Option<u64>, default: u64) -> Duration {
    Duration::from_secs(pick(cli, file).unwrap_or(default))
}

/// Returns the log level used when `RUST_LOG` is not set.
pub(crate) fn resolve_default_log_level(args: &Args) -> &'static str {
    if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
