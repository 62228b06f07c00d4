// src/engine/filter.rs
// =============================================================================
// Decides which canonical URLs are never sent to the checker.
//
// Rules are OR-ed: a URL is skipped when any rule matches it.
//
// - With no user patterns, the only rule skips every non-web scheme, so
//   mailto:, ftp:, tel: and custom schemes pass through unchecked.
// - User patterns replace that default rule.
// - skip_localhost adds a localhost/loopback rule on top of whichever set is
//   in use. A fresh rule list is built per policy; nothing shared is mutated.
// =============================================================================

use regex::Regex;

/// Matches `http(s)://localhost` and `http(s)://127.0.0.1`, with an optional
/// port, only as the authority of the URL.
pub const LOCALHOST_PATTERN: &str = r"(?i)^https?://(localhost|127\.0\.0\.1)(:\d+)?(?:[/?#]|$)";

/// A user-supplied skip pattern, either still a string or already compiled.
#[derive(Debug, Clone)]
pub enum SkipPattern {
    Source(String),
    Compiled(Regex),
}

impl SkipPattern {
    fn compile(&self) -> Result<Regex, regex::Error> {
        match self {
            SkipPattern::Source(source) => Regex::new(source),
            SkipPattern::Compiled(regex) => Ok(regex.clone()),
        }
    }
}

impl From<&str> for SkipPattern {
    fn from(source: &str) -> Self {
        SkipPattern::Source(source.to_string())
    }
}

impl From<String> for SkipPattern {
    fn from(source: String) -> Self {
        SkipPattern::Source(source)
    }
}

impl From<Regex> for SkipPattern {
    fn from(regex: Regex) -> Self {
        SkipPattern::Compiled(regex)
    }
}

#[derive(Debug, Clone)]
enum SkipRule {
    // Anything that is not http: or https:
    NonWebScheme,
    Pattern(Regex),
}

impl SkipRule {
    fn matches(&self, url: &str) -> bool {
        match self {
            SkipRule::NonWebScheme => !is_web_url(url),
            SkipRule::Pattern(regex) => regex.is_match(url),
        }
    }
}

fn is_web_url(url: &str) -> bool {
    let scheme = url.split(':').next().unwrap_or_default();
    scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https")
}

/// The ordered set of rules a canonical URL is tested against.
#[derive(Debug, Clone)]
pub struct SkipPolicy {
    rules: Vec<SkipRule>,
}

impl SkipPolicy {
    /// Builds a policy from optional user patterns and the localhost flag.
    ///
    /// Fails on the first user pattern that is not a valid regex.
    pub fn new(
        patterns: Option<&[SkipPattern]>,
        skip_localhost: bool,
    ) -> Result<Self, regex::Error> {
        let mut rules = match patterns {
            Some(patterns) => patterns
                .iter()
                .map(|pattern| pattern.compile().map(SkipRule::Pattern))
                .collect::<Result<Vec<_>, _>>()?,
            None => vec![SkipRule::NonWebScheme],
        };

        if skip_localhost {
            rules.push(SkipRule::Pattern(Regex::new(LOCALHOST_PATTERN)?));
        }

        Ok(SkipPolicy { rules })
    }

    pub fn should_skip(&self, url: &str) -> bool {
        self.rules.iter().any(|rule| rule.matches(url))
    }
}

impl Default for SkipPolicy {
    fn default() -> Self {
        SkipPolicy {
            rules: vec![SkipRule::NonWebScheme],
        }
    }
}
