// src/lib.rs
// =============================================================================
// Library side of no-dead-urls: everything except the command line.
//
// Modules:
// - document: references to URLs found in a document, and a Markdown reader
// - engine:   resolves, filters, deduplicates, checks once, reports findings
// - checker:  the single-URL checker and the connectivity probe
// - error:    typed errors
// =============================================================================

pub mod checker;
pub mod document;
pub mod engine;
pub mod error;

pub use checker::{CheckerOptions, ConnectivityProbe, HttpChecker, HttpProbe, Outcome, UrlChecker};
pub use document::{Document, DocumentMeta, Reference, ReferenceKind};
pub use engine::{Finding, LinkCache, LintOptions, LintReport, Linter, Severity};
pub use error::{CheckError, LintError, StoreError};
