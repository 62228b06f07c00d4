// src/engine/mod.rs
// =============================================================================
// The link liveness engine.
//
// Submodules, in the order a lint run uses them:
// - resolve: raw URL + base -> canonical URL (or skip)
// - filter:  canonical URL -> skip or check
// - index:   group references by canonical URL
// - cache:   check each URL once, sharing in-flight checks
// - store:   where settled outcomes are kept
// - report:  outcomes -> findings at reference positions
//
// `Linter::lint` ties them together for one document.
// =============================================================================

mod cache;
mod filter;
mod index;
mod report;
mod resolve;
mod store;

pub use cache::{CheckResults, LinkCache};
pub use filter::{SkipPattern, SkipPolicy};
pub use index::{DedupIndex, IndexEntry};
pub use report::{report, Finding, Severity};
pub use resolve::{is_relative, resolve, Resolution, ResolutionContext};
pub use store::{JsonFileStore, MemoryStore, OutcomeStore};

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::checker::{CheckerOptions, ConnectivityProbe, UrlChecker};
use crate::document::Document;
use crate::error::{CheckError, LintError};

/// How many checks run at once, unless configured otherwise.
pub const DEFAULT_CONCURRENCY: usize = 50;

/// Everything a lint run can be configured with.
#[derive(Debug, Clone)]
pub struct LintOptions {
    /// Base URL for relative references. Wins over document metadata.
    pub from: Option<String>,
    pub skip_localhost: bool,
    /// Stay silent instead of reporting when the network is unreachable.
    pub skip_offline: bool,
    /// Replaces the default "only http(s)" rule when set.
    pub skip_url_patterns: Option<Vec<SkipPattern>>,
    /// Handed to the checker untouched.
    pub checker: CheckerOptions,
    pub concurrency: usize,
}

impl Default for LintOptions {
    fn default() -> Self {
        LintOptions {
            from: None,
            skip_localhost: false,
            skip_offline: false,
            skip_url_patterns: None,
            checker: CheckerOptions::default(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl LintOptions {
    pub fn skip_policy(&self) -> Result<SkipPolicy, LintError> {
        Ok(SkipPolicy::new(
            self.skip_url_patterns.as_deref(),
            self.skip_localhost,
        )?)
    }

    /// The explicit `from`, else one derived from the document's metadata.
    pub fn resolution_context(
        &self,
        document: &Document,
    ) -> Result<Option<ResolutionContext>, LintError> {
        if let Some(from) = &self.from {
            let context =
                ResolutionContext::parse(from).map_err(|source| LintError::InvalidBase {
                    from: from.clone(),
                    source,
                })?;
            return Ok(Some(context));
        }

        Ok(document.meta.as_ref().and_then(ResolutionContext::from_meta))
    }
}

/// What one lint run produced.
#[derive(Debug, Clone, Default)]
pub struct LintReport {
    /// Sorted by position; a document-level finding (offline) comes first.
    pub findings: Vec<Finding>,
    /// URLs whose check broke, with the error. Their references have no finding.
    pub failures: Vec<(String, CheckError)>,
    /// Distinct URLs that were sent to the cache.
    pub checked: usize,
}

impl LintReport {
    pub fn has_fatal(&self) -> bool {
        self.findings.iter().any(Finding::is_fatal)
    }
}

/// Lints documents for dead URLs against a (possibly shared) cache.
///
/// The connectivity probe runs at most once per linter (and its clones), no
/// matter how many documents are linted.
#[derive(Clone)]
pub struct Linter {
    checker: Arc<dyn UrlChecker>,
    probe: Arc<dyn ConnectivityProbe>,
    online: Arc<OnceCell<bool>>,
    cache: Arc<LinkCache>,
}

impl Linter {
    /// A linter backed by the process-wide cache.
    pub fn new(checker: Arc<dyn UrlChecker>, probe: Arc<dyn ConnectivityProbe>) -> Self {
        Linter {
            checker,
            probe,
            online: Arc::new(OnceCell::new()),
            cache: LinkCache::global(),
        }
    }

    pub fn with_cache(mut self, cache: Arc<LinkCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &Arc<LinkCache> {
        &self.cache
    }

    /// Whether the network was reachable when first asked.
    pub async fn is_online(&self) -> bool {
        *self
            .online
            .get_or_init(|| async {
                let online = self.probe.is_online().await;
                debug!(online, "connectivity probed");
                online
            })
            .await
    }

    pub async fn lint(
        &self,
        document: &Document,
        options: &LintOptions,
    ) -> Result<LintReport, LintError> {
        let policy = options.skip_policy()?;
        let base = options.resolution_context(document)?;

        if !self.is_online().await {
            warn!(document = %document.name, "network unreachable, no URLs checked");
            let findings = if options.skip_offline {
                Vec::new()
            } else {
                vec![Finding::offline()]
            };
            return Ok(LintReport {
                findings,
                ..LintReport::default()
            });
        }

        let index = DedupIndex::build(&document.references, base.as_ref(), &policy);
        debug!(
            document = %document.name,
            references = document.references.len(),
            urls = index.len(),
            "indexed references"
        );

        let urls = index.urls().map(str::to_string).collect::<Vec<_>>();
        let results = self
            .cache
            .check_all(urls, &self.checker, &options.checker, options.concurrency)
            .await;

        let findings = report(&index, &results);
        let mut failures: Vec<(String, CheckError)> = results
            .into_iter()
            .filter_map(|(url, result)| result.err().map(|error| (url, error)))
            .collect();
        failures.sort_by(|a, b| a.0.cmp(&b.0));

        info!(
            document = %document.name,
            urls = index.len(),
            findings = findings.len(),
            failures = failures.len(),
            "lint finished"
        );

        Ok(LintReport {
            findings,
            failures,
            checked: index.len(),
        })
    }
}

impl std::fmt::Debug for Linter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Linter").field("cache", &self.cache).finish_non_exhaustive()
    }
}
