//! CLI argument definitions using clap derive macros.
//!
//! Settings that may also come from the config file are `Option`s without a
//! clap default, so an absent flag can be told apart from an explicit value.

use std::path::PathBuf;

use clap::Parser;

/// Mirror an HTML-indexed artifact repository and republish it.
///
/// The mirror action walks the source repository's index pages and copies
/// every artifact into a local directory. The publish action uploads that
/// directory to the target repository with HTTP PUT.
#[derive(Parser, Debug)]
#[command(name = "repo-cloner")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Read settings from this file instead of the default config location
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Comma separated actions to run: mirror, publish [default: mirror,publish]
    #[arg(short = 'a', long)]
    pub actions: Option<String>,

    /// Root URL of the repository to mirror
    #[arg(long, value_name = "URL")]
    pub source_root_url: Option<String>,

    /// Username for the source repository
    #[arg(long, env = "REPO_CLONER_SOURCE_USER")]
    pub source_user: Option<String>,

    /// Password for the source repository
    #[arg(long, env = "REPO_CLONER_SOURCE_PASSWORD", hide_env_values = true)]
    pub source_password: Option<String>,

    /// Root URL of the repository to publish to
    #[arg(long, value_name = "URL")]
    pub target_root_url: Option<String>,

    /// Username for the target repository
    #[arg(long, env = "REPO_CLONER_TARGET_USER")]
    pub target_user: Option<String>,

    /// Password for the target repository
    #[arg(long, env = "REPO_CLONER_TARGET_PASSWORD", hide_env_values = true)]
    pub target_password: Option<String>,

    /// Local mirror directory [default: ./mirror/]
    #[arg(short = 'm', long, value_name = "DIR")]
    pub mirror_path: Option<PathBuf>,

    /// Maximum concurrent downloads per index page (1-100) [default: 4]
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub crawl_concurrency: Option<u8>,

    /// Maximum concurrent uploads per directory (1-100) [default: 4]
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub publish_concurrency: Option<u8>,

    /// Delay before each request of a worker in milliseconds (0 to disable, max 60000)
    /// [default: 1000]
    #[arg(short = 'l', long, value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub rate_limit: Option<u64>,

    /// Probe the target and skip files that are already present
    #[arg(long)]
    pub skip_existing: bool,

    /// Stop the run after the first failed transfer
    #[arg(long)]
    pub abort_on_error: bool,

    /// Deepest index page level to visit below the source root [default: 64]
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    pub max_depth: Option<u16>,

    /// Check source and target connectivity before transferring anything
    #[arg(long)]
    pub check: bool,

    /// Proxy URL for all requests (defaults to the system proxy settings)
    #[arg(long, value_name = "URL")]
    pub proxy: Option<String>,

    /// Connect timeout in seconds (1-3600) [default: 30]
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub connect_timeout: Option<u64>,

    /// Idle timeout for index pages and downloads in seconds (1-3600) [default: 300]
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub download_timeout: Option<u64>,

    /// Timeout for probes and uploads in seconds (1-7200) [default: 900]
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=7200))]
    pub upload_timeout: Option<u64>,

    /// Print the final summary as JSON
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_args_parses_successfully() {
        let args = Args::try_parse_from(["repo-cloner"]).unwrap();
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert!(args.actions.is_none());
        assert!(args.crawl_concurrency.is_none());
        assert!(!args.skip_existing);
        assert!(!args.abort_on_error);
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["repo-cloner", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["repo-cloner", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_full_invocation() {
        let args = Args::try_parse_from([
            "repo-cloner",
            "--source-root-url",
            "https://s.example/maven2/",
            "--target-root-url",
            "https://t.example/releases/",
            "--target-user",
            "deploy",
            "--target-password",
            "secret",
            "--actions",
            "publish",
            "--publish-concurrency",
            "8",
            "--rate-limit",
            "0",
            "--skip-existing",
            "--abort-on-error",
            "-m",
            "/tmp/mirror",
        ])
        .unwrap();
        assert_eq!(args.actions.as_deref(), Some("publish"));
        assert_eq!(args.target_user.as_deref(), Some("deploy"));
        assert_eq!(args.publish_concurrency, Some(8));
        assert_eq!(args.rate_limit, Some(0));
        assert!(args.skip_existing);
        assert!(args.abort_on_error);
        assert_eq!(args.mirror_path, Some(PathBuf::from("/tmp/mirror")));
    }

    #[test]
    fn test_cli_concurrency_zero_rejected() {
        let err = Args::try_parse_from(["repo-cloner", "--crawl-concurrency", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_concurrency_over_max_rejected() {
        let err =
            Args::try_parse_from(["repo-cloner", "--publish-concurrency", "101"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_rate_limit_over_max_rejected() {
        let err = Args::try_parse_from(["repo-cloner", "--rate-limit", "60001"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let err = Args::try_parse_from(["repo-cloner", "--invalid-flag"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }
}
