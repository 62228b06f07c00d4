// src/engine/store.rs
// =============================================================================
// Where settled outcomes are remembered.
//
// - MemoryStore: the default, lives as long as the process
// - JsonFileStore: loaded from and saved to a JSON file, for callers that want
//   results to survive between runs
//
// Anything implementing `OutcomeStore` can be plugged into a LinkCache.
// =============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use dashmap::DashMap;
use tracing::debug;

use crate::checker::Outcome;
use crate::error::StoreError;

/// Completed outcomes, keyed by canonical URL.
pub trait OutcomeStore: Send + Sync {
    fn get(&self, url: &str) -> Option<Outcome>;
    fn insert(&self, url: String, outcome: Outcome);
    fn clear(&self);
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Concurrent in-memory store. Different URLs never contend on one lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, Outcome>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    fn snapshot(&self) -> BTreeMap<String, Outcome> {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }
}

impl OutcomeStore for MemoryStore {
    fn get(&self, url: &str) -> Option<Outcome> {
        self.entries.get(url).map(|entry| entry.value().clone())
    }

    fn insert(&self, url: String, outcome: Outcome) {
        self.entries.insert(url, outcome);
    }

    fn clear(&self) {
        self.entries.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// A store backed by a JSON object of `{ "url": outcome }`.
///
/// Reads happen once in `open`, writes only in `save`.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    memory: MemoryStore,
}

impl JsonFileStore {
    /// Loads `path`, or starts empty when the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let memory = MemoryStore::new();

        match fs::read_to_string(&path) {
            Ok(text) => {
                let entries: BTreeMap<String, Outcome> =
                    serde_json::from_str(&text).map_err(|source| StoreError::Json {
                        path: path.clone(),
                        source,
                    })?;
                debug!(path = %path.display(), entries = entries.len(), "loaded outcome cache");
                for (url, outcome) in entries {
                    memory.insert(url, outcome);
                }
            }
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => return Err(StoreError::Io { path, source }),
        }

        Ok(JsonFileStore { path, memory })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes every entry back to disk, sorted by URL.
    pub fn save(&self) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&self.memory.snapshot()).map_err(|source| {
            StoreError::Json {
                path: self.path.clone(),
                source,
            }
        })?;

        fs::write(&self.path, json).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), entries = self.memory.len(), "saved outcome cache");
        Ok(())
    }
}

impl OutcomeStore for JsonFileStore {
    fn get(&self, url: &str) -> Option<Outcome> {
        self.memory.get(url)
    }

    fn insert(&self, url: String, outcome: Outcome) {
        self.memory.insert(url, outcome);
    }

    fn clear(&self) {
        self.memory.clear();
    }

    fn len(&self) -> usize {
        self.memory.len()
    }
}
