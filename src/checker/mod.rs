// src/checker/mod.rs
// =============================================================================
// The boundary between the engine and whatever actually checks one URL.
//
// Submodules:
// - http: the default checker, makes HTTP requests with reqwest
// - anchor: looks inside HTML pages for anchors and meta refresh tags
// - online: the "is the network reachable at all" probe
//
// The engine only talks to the `UrlChecker` and `ConnectivityProbe` traits.
// It never retries, follows redirects or parses HTML itself, it just reads
// the `Outcome` a checker hands back.
// =============================================================================

mod anchor;
mod http;
mod online;

#[cfg(test)]
pub(crate) mod fake;

pub use http::HttpChecker;
pub use online::HttpProbe;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CheckError;

/// Whether a URL answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    Alive,
    Dead,
}

/// A diagnostic attached to an outcome, e.g. "anchor not found".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub reason: String,
    /// Fatal messages make the URL dead; the rest are warnings.
    pub fatal: bool,
}

/// What a checker found for one URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub status: LinkStatus,
    /// The URL the check ended up at after redirects.
    pub url: String,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Outcome {
    pub fn alive(url: impl Into<String>) -> Self {
        Outcome {
            status: LinkStatus::Alive,
            url: url.into(),
            messages: Vec::new(),
        }
    }

    /// A dead outcome carrying one fatal message.
    pub fn dead(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Outcome {
            status: LinkStatus::Dead,
            url: url.into(),
            messages: vec![Message {
                reason: reason.into(),
                fatal: true,
            }],
        }
    }

    pub fn with_warning(mut self, reason: impl Into<String>) -> Self {
        self.messages.push(Message {
            reason: reason.into(),
            fatal: false,
        });
        self
    }

    pub fn is_dead(&self) -> bool {
        self.status == LinkStatus::Dead || self.messages.iter().any(|message| message.fatal)
    }

    /// How the engine reads this outcome for the URL that was `requested`.
    pub fn verdict(&self, requested: &str) -> Verdict {
        if self.is_dead() {
            Verdict::Dead
        } else if self.url != requested {
            Verdict::Redirected(self.url.clone())
        } else {
            Verdict::Alive
        }
    }
}

/// The engine's reading of an `Outcome`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Alive,
    Dead,
    Redirected(String),
}

/// Options forwarded untouched to the checker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckerOptions {
    /// Extra attempts after a retryable failure (5xx, 429, timeouts).
    pub max_retries: u32,
    pub retry_wait: Duration,
    pub timeout: Duration,
    pub max_redirects: usize,
    /// Warn when a `#fragment` has no matching element on the page.
    pub check_anchor: bool,
    /// Treat `<meta http-equiv="refresh">` as a redirect.
    pub follow_meta_http_equiv: bool,
    pub user_agent: String,
}

impl Default for CheckerOptions {
    fn default() -> Self {
        CheckerOptions {
            max_retries: 1,
            retry_wait: Duration::from_secs(1),
            timeout: Duration::from_secs(10),
            max_redirects: 5,
            check_anchor: true,
            follow_meta_http_equiv: true,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Checks a single URL.
///
/// `Ok` covers both alive and dead. `Err` means the check itself broke and
/// nothing is known about the URL.
#[async_trait]
pub trait UrlChecker: Send + Sync {
    async fn check(&self, url: &str, options: &CheckerOptions) -> Result<Outcome, CheckError>;
}

/// Tells whether the network is reachable at all.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn is_online(&self) -> bool;
}
