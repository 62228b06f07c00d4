// src/engine/index.rs
// =============================================================================
// Groups every reference in a document by its canonical URL.
//
// The index, not the raw reference list, drives checking: each distinct,
// non-skipped canonical URL is checked exactly once, and the outcome is then
// fanned back out to every reference that produced it.
//
// Both the URL order and the reference order inside each group follow the
// order references were fed in, which keeps the output deterministic.
// =============================================================================

use std::collections::HashMap;

use crate::document::Reference;

use super::filter::SkipPolicy;
use super::resolve::{resolve, Resolution, ResolutionContext};

/// All references that resolved to one canonical URL.
#[derive(Debug, Clone)]
pub struct IndexEntry<'a> {
    pub url: String,
    pub references: Vec<&'a Reference>,
}

#[derive(Debug, Clone, Default)]
pub struct DedupIndex<'a> {
    entries: Vec<IndexEntry<'a>>,
    // canonical URL -> position in `entries`
    slots: HashMap<String, usize>,
}

impl<'a> DedupIndex<'a> {
    /// Resolves, filters and groups `references`.
    ///
    /// References without a URL, relative references without a base, and
    /// URLs matched by `policy` are dropped entirely.
    pub fn build<I>(references: I, base: Option<&ResolutionContext>, policy: &SkipPolicy) -> Self
    where
        I: IntoIterator<Item = &'a Reference>,
    {
        let mut index = DedupIndex::default();

        for reference in references {
            let Some(raw) = reference.url.as_deref() else {
                continue;
            };

            let url = match resolve(raw, base) {
                Resolution::Canonical(url) => url,
                Resolution::Skip => continue,
            };

            if policy.should_skip(&url) {
                continue;
            }

            index.insert(url, reference);
        }

        index
    }

    fn insert(&mut self, url: String, reference: &'a Reference) {
        match self.slots.get(&url) {
            Some(&slot) => self.entries[slot].references.push(reference),
            None => {
                self.slots.insert(url.clone(), self.entries.len());
                self.entries.push(IndexEntry {
                    url,
                    references: vec![reference],
                });
            }
        }
    }

    pub fn entries(&self) -> &[IndexEntry<'a>] {
        &self.entries
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|entry| entry.url.as_str())
    }

    pub fn get(&self, url: &str) -> Option<&IndexEntry<'a>> {
        self.slots.get(url).map(|&slot| &self.entries[slot])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
