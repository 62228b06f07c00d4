// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API: the CLI is a struct, every field is an argument,
// and the #[arg(...)] attributes say how each one is spelled.
//
// `Cli::lint_options` turns the parsed flags into the library's LintOptions,
// so the rest of the program never looks at raw flags.
// =============================================================================

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use no_dead_urls::engine::{SkipPattern, DEFAULT_CONCURRENCY};
use no_dead_urls::{CheckerOptions, LintOptions};

#[derive(Parser, Debug)]
#[command(
    name = "no-dead-urls",
    version,
    about = "Report dead and redirecting URLs in Markdown files",
    long_about = "no-dead-urls finds every link, image and definition in the given Markdown \
                  files and checks each distinct URL once. Dead URLs fail the run, \
                  redirects and missing anchors are reported as warnings."
)]
pub struct Cli {
    /// Markdown files to check
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Resolve relative URLs against this base URL
    ///
    /// Example: --from https://example.com/docs/
    #[arg(long, value_name = "URL")]
    pub from: Option<String>,

    /// Site origin; each file's path is appended to form its base URL
    ///
    /// Ignored when --from is given.
    #[arg(long, value_name = "URL")]
    pub origin: Option<String>,

    /// Do not check http(s)://localhost and http(s)://127.0.0.1 URLs
    #[arg(long)]
    pub skip_localhost: bool,

    /// Pass quietly when the network is unreachable
    #[arg(long)]
    pub skip_offline: bool,

    /// Skip URLs matching this regex (repeatable)
    ///
    /// Replaces the default of only checking http and https URLs.
    #[arg(long = "skip-url-pattern", value_name = "REGEX")]
    pub skip_url_patterns: Vec<String>,

    /// Extra attempts for URLs that fail with a server error or timeout
    #[arg(long, default_value_t = 1)]
    pub max_retries: u32,

    /// Wait between attempts, in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub retry_wait_ms: u64,

    /// Per-request timeout, in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,

    /// Redirects to follow before a URL counts as dead
    #[arg(long, default_value_t = 5)]
    pub max_redirects: usize,

    /// Do not warn about #fragments missing from the target page
    #[arg(long)]
    pub no_check_anchor: bool,

    /// Do not follow <meta http-equiv="refresh"> redirects
    #[arg(long)]
    pub no_follow_meta_refresh: bool,

    /// Maximum number of URLs checked at the same time
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Remember outcomes in this JSON file between runs
    #[arg(long, value_name = "PATH")]
    pub cache_file: Option<PathBuf>,

    /// Output results in JSON format instead of a table
    #[arg(long)]
    pub json: bool,

    /// Log filter, e.g. "debug" or "no_dead_urls=trace"
    #[arg(long, env = "NO_DEAD_URLS_LOG", default_value = "warn")]
    pub log_level: String,
}

impl Cli {
    pub fn lint_options(&self) -> LintOptions {
        let skip_url_patterns = if self.skip_url_patterns.is_empty() {
            None
        } else {
            Some(
                self.skip_url_patterns
                    .iter()
                    .map(|pattern| SkipPattern::from(pattern.as_str()))
                    .collect(),
            )
        };

        LintOptions {
            from: self.from.clone(),
            skip_localhost: self.skip_localhost,
            skip_offline: self.skip_offline,
            skip_url_patterns,
            checker: CheckerOptions {
                max_retries: self.max_retries,
                retry_wait: Duration::from_millis(self.retry_wait_ms),
                timeout: Duration::from_secs(self.timeout_secs),
                max_redirects: self.max_redirects,
                check_anchor: !self.no_check_anchor,
                follow_meta_http_equiv: !self.no_follow_meta_refresh,
                ..CheckerOptions::default()
            },
            concurrency: self.concurrency,
        }
    }
}
