// src/engine/cache.rs
// =============================================================================
// Makes sure each canonical URL is checked at most once.
//
// Two tables live side by side:
// - the outcome store: URL -> settled Outcome (see store.rs)
// - the in-flight table: URL -> the check that is running right now
//
// For every requested URL:
// 1. settled outcome in the store?  -> use it, no network
// 2. check already in flight?       -> wait on that same check
// 3. otherwise                      -> start one, publish it as in flight
//
// When a check settles it writes its outcome to the store (only if it did not
// fail) and THEN removes itself from the in-flight table. Anyone who misses the
// in-flight entry therefore finds the stored outcome instead.
//
// A failed check is never stored, so the next request tries again.
// =============================================================================

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::checker::{CheckerOptions, Outcome, UrlChecker};
use crate::error::CheckError;

use super::store::{MemoryStore, OutcomeStore};

type PendingCheck = Shared<BoxFuture<'static, Result<Outcome, CheckError>>>;

/// Outcomes per canonical URL for a whole run, keyed by URL.
pub type CheckResults = HashMap<String, Result<Outcome, CheckError>>;

static GLOBAL: LazyLock<Arc<LinkCache>> = LazyLock::new(|| Arc::new(LinkCache::new()));

/// An outcome store paired with its in-flight table.
///
/// Safe to share between any number of concurrent lint runs.
pub struct LinkCache {
    store: Arc<dyn OutcomeStore>,
    in_flight: Arc<DashMap<String, PendingCheck>>,
}

impl LinkCache {
    pub fn new() -> Self {
        LinkCache::with_store(Arc::new(MemoryStore::new()))
    }

    pub fn with_store(store: Arc<dyn OutcomeStore>) -> Self {
        LinkCache {
            store,
            in_flight: Arc::new(DashMap::new()),
        }
    }

    /// The process-wide cache, created on first use and never torn down.
    pub fn global() -> Arc<LinkCache> {
        Arc::clone(&GLOBAL)
    }

    pub fn cached(&self, url: &str) -> Option<Outcome> {
        self.store.get(url)
    }

    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    /// Forgets every settled outcome. Checks in flight are left alone.
    pub fn clear(&self) {
        self.store.clear();
    }

    /// Checks one canonical URL, reusing a stored or in-flight result.
    pub async fn check(
        &self,
        url: &str,
        checker: &Arc<dyn UrlChecker>,
        options: &CheckerOptions,
    ) -> Result<Outcome, CheckError> {
        if let Some(outcome) = self.store.get(url) {
            debug!(url, "cache hit");
            return Ok(outcome);
        }

        let pending = match self.in_flight.entry(url.to_string()) {
            Entry::Occupied(entry) => {
                debug!(url, "joining in-flight check");
                entry.get().clone()
            }
            Entry::Vacant(slot) => {
                // The previous check may have settled since the lookup above
                if let Some(outcome) = self.store.get(url) {
                    debug!(url, "cache hit");
                    return Ok(outcome);
                }

                let pending = self.start(url.to_string(), Arc::clone(checker), options.clone());
                slot.insert(pending.clone());
                pending
            }
        };

        pending.await
    }

    fn start(
        &self,
        url: String,
        checker: Arc<dyn UrlChecker>,
        options: CheckerOptions,
    ) -> PendingCheck {
        let store = Arc::clone(&self.store);
        let in_flight = Arc::clone(&self.in_flight);

        async move {
            debug!(url = %url, "checking");
            let result = checker.check(&url, &options).await;

            match &result {
                Ok(outcome) => store.insert(url.clone(), outcome.clone()),
                Err(error) => warn!(url = %url, %error, "check failed"),
            }
            in_flight.remove(&url);

            result
        }
        .boxed()
        .shared()
    }

    /// Checks every URL concurrently, at most `concurrency` at a time, and
    /// returns once all of them have settled.
    pub async fn check_all<I>(
        &self,
        urls: I,
        checker: &Arc<dyn UrlChecker>,
        options: &CheckerOptions,
        concurrency: usize,
    ) -> CheckResults
    where
        I: IntoIterator<Item = String>,
    {
        stream::iter(urls)
            .map(|url| async move {
                let result = self.check(&url, checker, options).await;
                (url, result)
            })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await
    }
}

impl Default for LinkCache {
    fn default() -> Self {
        LinkCache::new()
    }
}

impl std::fmt::Debug for LinkCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkCache")
            .field("stored", &self.store.len())
            .field("in_flight", &self.in_flight.len())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. What is a Shared future?
//    - futures::FutureExt::shared() turns a future into one that can be cloned
//    - Every clone resolves to the same output; the work runs only once
//    - The output has to be Clone, which is why CheckError derives Clone
//
// 2. Who drives the check?
//    - Whoever awaits a clone. If the first requester goes away, the next one
//      to await picks the work up where it stopped.
//
// 3. Why DashMap?
//    - It locks per shard, not per map, so unrelated URLs do not wait on
//      each other. The entry() call holds the shard lock only while deciding
//      who starts the check, never across an await.
// -----------------------------------------------------------------------------
