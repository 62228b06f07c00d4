// src/document/markdown.rs
// =============================================================================
// This module extracts URL references from Markdown text.
//
// We use the `pulldown-cmark` crate which:
// - Parses Markdown into events (heading, paragraph, link, etc.)
// - Follows the CommonMark specification
// - Can report the byte range of every event (into_offset_iter)
//
// Three kinds of node carry a URL:
// - inline links and autolinks:   [text](url), <url>
// - images:                       ![alt](url)
// - reference definitions:        [id]: url
//
// A reference-style usage like [text][id] does not own its URL, the
// definition does, so only the definition is reported.
//
// Unlike a plain "find http links" pass, NOTHING is filtered here: relative
// links, mailto: links and custom schemes are all returned. Deciding what to
// check is the engine's job.
// =============================================================================

use pulldown_cmark::{Event, LinkType, Options, Parser, Tag};

use super::{Position, Reference, ReferenceKind};

/// Extracts every URL-bearing node from Markdown text, in document order.
///
/// Example input:
///   "Check out [Rust](https://www.rust-lang.org)!"
///
/// Example output:
///   one Link reference to "https://www.rust-lang.org" at line 1, column 11
pub fn parse_markdown(markdown: &str) -> Vec<Reference> {
    let lines = LineIndex::new(markdown);
    let mut references = Vec::new();

    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS;
    let parser = Parser::new_ext(markdown, options);

    // Definitions are collected up front by the parser, they never show up as
    // events.
    for (_label, definition) in parser.reference_definitions().iter() {
        references.push(Reference::new(
            ReferenceKind::Definition,
            definition.dest.to_string(),
            lines.position(definition.span.start),
        ));
    }

    for (event, range) in parser.into_offset_iter() {
        let (kind, link_type, dest) = match event {
            Event::Start(Tag::Link(link_type, dest, _title)) => {
                (ReferenceKind::Link, link_type, dest)
            }
            Event::Start(Tag::Image(link_type, dest, _title)) => {
                (ReferenceKind::Image, link_type, dest)
            }
            _ => continue,
        };

        let url = match link_type {
            LinkType::Inline | LinkType::Autolink => dest.to_string(),
            // <someone@example.com> comes through without its scheme
            LinkType::Email => format!("mailto:{}", dest),
            // [text][id], [id][], [id]: the URL belongs to the definition
            _ => continue,
        };

        references.push(Reference::new(kind, url, lines.position(range.start)));
    }

    references.sort_by_key(|reference| reference.position.offset);
    references
}

// Maps byte offsets to 1-based line/column pairs.
struct LineIndex<'a> {
    text: &'a str,
    // Byte offset where each line starts
    starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    fn new(text: &'a str) -> Self {
        let starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(index, _)| index + 1))
            .collect();
        LineIndex { text, starts }
    }

    fn position(&self, offset: usize) -> Position {
        let line = match self.starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let start = self.starts[line];
        // Columns count characters, not bytes
        let column = self
            .text
            .get(start..offset)
            .map_or(offset - start, |prefix| prefix.chars().count());

        Position {
            line: line + 1,
            column: column + 1,
            offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(references: &[Reference]) -> Vec<&str> {
        references.iter().filter_map(|r| r.url.as_deref()).collect()
    }

    #[test]
    fn test_extract_simple_link() {
        let markdown = "Check out [Rust](https://www.rust-lang.org)!";
        let references = parse_markdown(markdown);
        assert_eq!(urls(&references), vec!["https://www.rust-lang.org"]);
        assert_eq!(references[0].kind, ReferenceKind::Link);
        assert_eq!(
            references[0].position,
            Position { line: 1, column: 11, offset: 10 }
        );
    }

    #[test]
    fn test_extract_multiple_links() {
        let markdown = r#"
# Resources

- [Rust](https://www.rust-lang.org)
- [Cargo](https://doc.rust-lang.org/cargo/)
- [Docs](https://doc.rust-lang.org/)
        "#;
        let references = parse_markdown(markdown);
        assert_eq!(references.len(), 3);
        assert_eq!(references[1].position.line, 5);
        assert_eq!(references[1].position.column, 3);
    }

    #[test]
    fn test_keeps_mailto_and_relative_links() {
        let markdown = "Email [me](mailto:test@example.com) or see [docs](./docs/README.md)";
        let references = parse_markdown(markdown);
        assert_eq!(
            urls(&references),
            vec!["mailto:test@example.com", "./docs/README.md"]
        );
    }

    #[test]
    fn test_images_and_autolinks() {
        let markdown = "![logo](logo.png) and <https://example.com> and <a@b.com>";
        let references = parse_markdown(markdown);
        assert_eq!(references[0].kind, ReferenceKind::Image);
        assert_eq!(
            urls(&references),
            vec!["logo.png", "https://example.com", "mailto:a@b.com"]
        );
    }

    #[test]
    fn test_definitions_own_reference_style_urls() {
        let markdown = "See [the site][site] and [site].\n\n[site]: https://example.com/site\n";
        let references = parse_markdown(markdown);
        assert_eq!(references.len(), 1);
        assert_eq!(references[0].kind, ReferenceKind::Definition);
        assert_eq!(references[0].url.as_deref(), Some("https://example.com/site"));
        assert_eq!(references[0].position.line, 3);
    }

    #[test]
    fn test_columns_count_characters() {
        let markdown = "héllo [x](https://example.com)";
        let references = parse_markdown(markdown);
        assert_eq!(references[0].position.column, 7);
        assert_eq!(references[0].position.offset, 7);
    }
}
