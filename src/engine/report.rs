// src/engine/report.rs
// =============================================================================
// Turns per-URL outcomes back into per-reference findings.
//
// For every reference attached to a canonical URL:
// - one finding per diagnostic message (fatal ones for dead links, advisory
//   ones for e.g. a missing anchor)
// - one fatal finding for a dead outcome that came without any fatal message
// - one advisory finding when an alive URL ended up somewhere else
//
// Findings come back sorted by source position.
// =============================================================================

use serde::Serialize;

use crate::checker::{Outcome, Verdict};
use crate::document::Position;

use super::cache::CheckResults;
use super::index::DedupIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Fails the run.
    Fatal,
    /// Reported, but does not fail the run.
    Advisory,
}

/// A message tied to a place in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub message: String,
    pub severity: Severity,
    /// `None` for document-level findings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// The checker's own explanation, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    /// For redirects: the final URL the reference should use.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    /// For redirects: the URL as requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
}

impl Finding {
    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }

    /// The document-level, advisory finding for a run that found no network.
    pub fn offline() -> Self {
        Finding {
            message: "Unexpected offline connection, expected either an online connection \
                      or `skip_offline` to be set"
                .to_string(),
            severity: Severity::Advisory,
            position: None,
            url: None,
            cause: None,
            expected: None,
            actual: None,
        }
    }

    fn dead(url: &str, position: Position, cause: Option<String>, severity: Severity) -> Self {
        Finding {
            message: format!("Unexpected dead URL `{}`, expected live URL", url),
            severity,
            position: Some(position),
            url: Some(url.to_string()),
            cause,
            expected: None,
            actual: None,
        }
    }

    fn redirect(url: &str, to: &str, position: Position) -> Self {
        Finding {
            message: format!(
                "Unexpected redirecting URL `{}`, expected final URL `{}`",
                url, to
            ),
            severity: Severity::Advisory,
            position: Some(position),
            url: Some(url.to_string()),
            cause: None,
            expected: Some(to.to_string()),
            actual: Some(url.to_string()),
        }
    }
}

/// Builds the findings for every indexed reference.
///
/// URLs whose check failed (or that have no result) produce nothing here; the
/// caller reports those failures separately.
pub fn report(index: &DedupIndex<'_>, results: &CheckResults) -> Vec<Finding> {
    let mut findings = Vec::new();

    for entry in index.entries() {
        let Some(Ok(outcome)) = results.get(&entry.url) else {
            continue;
        };

        for reference in &entry.references {
            findings.extend(findings_for(&entry.url, outcome, reference.position));
        }
    }

    // Stable, so findings at one position keep their order
    findings.sort_by_key(|finding| finding.position);
    findings
}

fn findings_for(url: &str, outcome: &Outcome, position: Position) -> Vec<Finding> {
    let mut findings: Vec<Finding> = outcome
        .messages
        .iter()
        .map(|message| {
            let severity = if message.fatal {
                Severity::Fatal
            } else {
                Severity::Advisory
            };
            Finding::dead(url, position, Some(message.reason.clone()), severity)
        })
        .collect();

    let has_fatal = outcome.messages.iter().any(|message| message.fatal);
    match outcome.verdict(url) {
        // Dead by status alone, nothing above says so yet
        Verdict::Dead if !has_fatal => {
            findings.push(Finding::dead(url, position, None, Severity::Fatal));
        }
        Verdict::Redirected(to) => findings.push(Finding::redirect(url, &to, position)),
        _ => {}
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::{LinkStatus, Message};
    use crate::document::parse_markdown;
    use crate::engine::filter::SkipPolicy;
    use crate::error::CheckError;

    fn results(pairs: Vec<(&str, Result<Outcome, CheckError>)>) -> CheckResults {
        pairs.into_iter().map(|(url, result)| (url.to_string(), result)).collect()
    }

    #[test]
    fn test_one_fatal_finding_per_dead_reference() {
        let references = parse_markdown(concat!(
            "[a](https://exists.com)\n",
            "[b](https://exists.com/does/not/)\n",
            "[c](https://does-not-exists.com)\n",
        ));
        let index = DedupIndex::build(&references, None, &SkipPolicy::default());
        let results = results(vec![
            ("https://exists.com/", Ok(Outcome::alive("https://exists.com/"))),
            (
                "https://exists.com/does/not/",
                Ok(Outcome::dead("https://exists.com/does/not/", "404")),
            ),
            (
                "https://does-not-exists.com/",
                Ok(Outcome::dead("https://does-not-exists.com/", "dns")),
            ),
        ]);

        let findings = report(&index, &results);
        assert_eq!(findings.len(), 2);
        assert!(findings.iter().all(Finding::is_fatal));
        assert_eq!(findings[0].url.as_deref(), Some("https://exists.com/does/not/"));
        assert_eq!(findings[0].position.unwrap().line, 2);
        assert_eq!(findings[1].position.unwrap().line, 3);
        assert_eq!(findings[1].cause.as_deref(), Some("dns"));
    }

    #[test]
    fn test_every_reference_gets_the_finding() {
        let references = parse_markdown("[a](https://gone.com) and [b](https://gone.com/)");
        let index = DedupIndex::build(&references, None, &SkipPolicy::default());
        let outcome = Outcome::dead("https://gone.com/", "404");
        let results = results(vec![("https://gone.com/", Ok(outcome))]);

        let findings = report(&index, &results);
        let columns: Vec<_> = findings.iter().map(|f| f.position.unwrap().column).collect();
        assert_eq!(columns, vec![1, 27]);
    }

    #[test]
    fn test_redirect_finding_shape() {
        let references = parse_markdown("[a](https://old.com)");
        let index = DedupIndex::build(&references, None, &SkipPolicy::default());
        let results = results(vec![("https://old.com/", Ok(Outcome::alive("https://new.com/")))]);

        let findings = report(&index, &results);
        assert_eq!(findings.len(), 1);
        let finding = &findings[0];
        assert_eq!(finding.severity, Severity::Advisory);
        assert_eq!(finding.expected.as_deref(), Some("https://new.com/"));
        assert_eq!(finding.actual.as_deref(), Some("https://old.com/"));
    }

    #[test]
    fn test_warnings_are_advisory() {
        let references = parse_markdown("[a](https://a.com/#nope)");
        let index = DedupIndex::build(&references, None, &SkipPolicy::default());
        let outcome = Outcome::alive("https://a.com/#nope").with_warning("missing anchor");
        let results = results(vec![("https://a.com/#nope", Ok(outcome))]);

        let findings = report(&index, &results);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Advisory);
        assert_eq!(findings[0].cause.as_deref(), Some("missing anchor"));
    }

    #[test]
    fn test_dead_without_messages_still_reports() {
        let references = parse_markdown("[a](https://a.com)");
        let index = DedupIndex::build(&references, None, &SkipPolicy::default());
        let outcome = Outcome {
            status: LinkStatus::Dead,
            url: "https://a.com/".to_string(),
            messages: vec![Message {
                reason: "slow".to_string(),
                fatal: false,
            }],
        };
        let results = results(vec![("https://a.com/", Ok(outcome))]);

        let findings = report(&index, &results);
        assert_eq!(findings.len(), 2);
        assert_eq!(findings.iter().filter(|f| f.is_fatal()).count(), 1);
    }

    #[test]
    fn test_failed_checks_produce_no_findings() {
        let references = parse_markdown("[a](https://a.com)");
        let index = DedupIndex::build(&references, None, &SkipPolicy::default());
        let error = CheckError::Request {
            url: "https://a.com/".to_string(),
            reason: "reset".to_string(),
        };
        let results = results(vec![("https://a.com/", Err(error))]);

        assert!(report(&index, &results).is_empty());
    }

    #[test]
    fn test_offline_finding_is_document_level_advisory() {
        let finding = Finding::offline();
        assert!(!finding.is_fatal());
        assert!(finding.position.is_none());
        assert!(finding.url.is_none());
        assert!(finding.message.contains("`skip_offline`"));
        assert!(!finding.message.contains("--"));
    }
}
