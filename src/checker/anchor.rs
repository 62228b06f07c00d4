// src/checker/anchor.rs
// =============================================================================
// This module inspects HTML pages returned by the HTTP checker.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Is built on html5ever (Mozilla's HTML parser)
//
// Two things are pulled out of a page:
// - every anchor a `#fragment` could point at (`id="..."`, `<a name="...">`)
// - the target of a `<meta http-equiv="refresh" content="0; url=...">`
//
// The parsed DOM is not Send, so everything is copied into `PageFacts` before
// the checker awaits anything else.
// =============================================================================

use std::collections::HashSet;

use scraper::{ElementRef, Html};

/// What the checker needs to know about an HTML page.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PageFacts {
    pub anchors: HashSet<String>,
    /// Raw target of the first meta refresh, not yet resolved against the page.
    pub refresh: Option<String>,
}

impl PageFacts {
    /// Whether `fragment` names an element on the page.
    ///
    /// GitHub renders heading ids with a `user-content-` prefix and rewrites
    /// links on the fly, so that form matches too.
    pub fn has_anchor(&self, fragment: &str) -> bool {
        self.anchors.contains(fragment)
            || self.anchors.contains(&format!("user-content-{}", fragment))
    }
}

pub fn inspect_html(html: &str) -> PageFacts {
    let document = Html::parse_document(html);
    let mut facts = PageFacts::default();

    for node in document.root_element().descendants() {
        let Some(element) = ElementRef::wrap(node) else {
            continue;
        };
        let element = element.value();

        if let Some(id) = element.attr("id") {
            facts.anchors.insert(id.to_string());
        }

        if element.name() == "a" {
            if let Some(name) = element.attr("name") {
                facts.anchors.insert(name.to_string());
            }
        }

        if element.name() == "meta" && facts.refresh.is_none() {
            let is_refresh = element
                .attr("http-equiv")
                .is_some_and(|value| value.eq_ignore_ascii_case("refresh"));
            if is_refresh {
                facts.refresh = element.attr("content").and_then(parse_refresh);
            }
        }
    }

    facts
}

// Pulls the URL out of a refresh value such as `5; URL='/next'`.
fn parse_refresh(content: &str) -> Option<String> {
    let (_delay, rest) = content.split_once(|c: char| c == ';' || c == ',')?;
    let rest = rest.trim_start();

    let target = match rest.get(..3) {
        Some(prefix) if prefix.eq_ignore_ascii_case("url") => {
            rest[3..].trim_start().strip_prefix('=')?
        }
        _ => rest,
    };

    let target = target.trim().trim_matches(|c: char| c == '\'' || c == '"').trim();
    if target.is_empty() {
        None
    } else {
        Some(target.to_string())
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why walk every element instead of using CSS selectors?
//    - One pass collects ids, named anchors and the refresh tag together
//    - There is no selector string to parse, so nothing can fail here
//
// 2. What is ElementRef::wrap?
//    - The DOM tree also holds text and comment nodes
//    - wrap() returns Some only for element nodes
// -----------------------------------------------------------------------------
