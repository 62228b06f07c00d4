// src/engine/resolve.rs
// =============================================================================
// Turns a raw URL as written in a document into the canonical absolute form
// used as the dedup and cache key.
//
// - Absolute URLs are parsed and re-serialized, so `https://a.com` and
//   `https://a.com/` collapse to the same key.
// - Relative URLs are resolved against the base (the "from" location) with
//   normal browser rules: `a.md`, `/b.md`, `../c.md`, `#frag`, `?q`.
// - Relative URLs with no base are skipped. We never guess a base.
// =============================================================================

use url::Url;

use crate::document::DocumentMeta;

/// The base location relative URLs are resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionContext {
    base: Url,
}

impl ResolutionContext {
    pub fn parse(href: &str) -> Result<Self, url::ParseError> {
        Ok(ResolutionContext {
            base: Url::parse(href)?,
        })
    }

    /// Combines `origin` and `pathname` into one base, or `None` when they do
    /// not form a valid URL.
    pub fn from_meta(meta: &DocumentMeta) -> Option<Self> {
        let origin = Url::parse(&meta.origin).ok()?;
        let base = origin.join(&meta.pathname).ok()?;
        Some(ResolutionContext { base })
    }

    pub fn href(&self) -> &str {
        self.base.as_str()
    }
}

/// What the resolver decided for one raw URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Canonical(String),
    Skip,
}

/// Whether `raw` lacks a protocol.
///
/// A protocol is a `:` that comes before any `/`, `?` or `#`. This is why
/// `C:\docs\file.md` counts as absolute while `./a:b` and `#x:y` do not.
pub fn is_relative(raw: &str) -> bool {
    let Some(colon) = raw.find(':') else {
        return true;
    };

    ['/', '?', '#']
        .iter()
        .filter_map(|separator| raw.find(*separator))
        .any(|index| index < colon)
}

/// Resolves `raw` against `base`.
///
/// Pure: the same (raw, base) pair always gives the same answer.
pub fn resolve(raw: &str, base: Option<&ResolutionContext>) -> Resolution {
    let parsed = if is_relative(raw) {
        match base {
            Some(context) => context.base.join(raw),
            None => return Resolution::Skip,
        }
    } else {
        Url::parse(raw)
    };

    match parsed {
        Ok(url) => Resolution::Canonical(url.into()),
        Err(_) => Resolution::Skip,
    }
}
