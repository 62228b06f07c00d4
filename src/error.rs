// src/error.rs
// =============================================================================
// Typed errors for the parts of the linter that can fail.
//
// - CheckError: the single-URL checker could not produce a verdict at all
//   (this is NOT a dead link, a dead link is a normal Outcome)
// - LintError: a lint run could not start (bad skip pattern, bad base URL)
// - StoreError: the on-disk outcome cache could not be read or written
//
// The binary (main.rs) wraps all of these in anyhow::Error.
// =============================================================================

use std::path::PathBuf;
use thiserror::Error;

/// A check that raised instead of settling on alive/dead.
///
/// `Clone` because one failure is handed to every requester that was
/// waiting on the same in-flight check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckError {
    /// The request for `url` could not even be built or sent.
    #[error("could not send a request to `{url}`: {reason}")]
    Request { url: String, reason: String },

    /// The HTTP client itself could not be constructed.
    #[error("could not build the HTTP client: {0}")]
    Client(String),
}

#[derive(Debug, Error)]
pub enum LintError {
    #[error("invalid skip pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("invalid base URL `{from}`: {source}")]
    InvalidBase {
        from: String,
        #[source]
        source: url::ParseError,
    },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not access cache file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cache file {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
