// src/document/mod.rs
// =============================================================================
// The document side of the linter: what a "reference" to a URL looks like and
// where in the source file it came from.
//
// Submodules:
// - markdown: turns Markdown text into a list of references
//
// The engine only ever reads these types. It never parses documents itself.
// =============================================================================

mod markdown;

pub use markdown::parse_markdown;

use serde::{Deserialize, Serialize};

/// The kind of node a URL was found on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    /// `[text](url)` or `<url>`
    Link,
    /// `![alt](url)`
    Image,
    /// `[id]: url`
    Definition,
}

/// A location in the source document.
///
/// `line` and `column` are 1-based, `offset` is the byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

/// One occurrence of a URL in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub kind: ReferenceKind,
    /// Nodes without a usable URL carry `None` and are never indexed.
    pub url: Option<String>,
    pub position: Position,
}

impl Reference {
    pub fn new(kind: ReferenceKind, url: impl Into<String>, position: Position) -> Self {
        let url = url.into();
        Reference {
            kind,
            url: if url.is_empty() { None } else { Some(url) },
            position,
        }
    }
}

/// Where the document is published, used to resolve relative URLs when no
/// explicit base is configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMeta {
    /// e.g. `https://example.com`
    pub origin: String,
    /// e.g. `/docs/guide.md`
    pub pathname: String,
}

/// A parsed document ready to be linted.
#[derive(Debug, Clone)]
pub struct Document {
    /// Display name, usually the file path.
    pub name: String,
    pub references: Vec<Reference>,
    pub meta: Option<DocumentMeta>,
}

impl Document {
    pub fn new(name: impl Into<String>, references: Vec<Reference>) -> Self {
        Document {
            name: name.into(),
            references,
            meta: None,
        }
    }

    pub fn from_markdown(name: impl Into<String>, markdown: &str) -> Self {
        Document::new(name, parse_markdown(markdown))
    }

    pub fn with_meta(mut self, meta: DocumentMeta) -> Self {
        self.meta = Some(meta);
        self
    }
}
