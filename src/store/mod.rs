//! Record store: immutable [`Corpus`] snapshots behind a swappable handle.
//!
//! Queries take a [`Snapshot`] and hold it for their whole run, so a
//! concurrent [`RecordStore::replace`] never changes what an in-flight query
//! sees.

pub mod corpus;

pub use corpus::{Corpus, IndexedRecord};

use crate::error::{GranaryError, Result};
use std::path::Path;
use std::sync::{Arc, RwLock};

/// A corpus pinned for the duration of one query.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub corpus: Arc<Corpus>,
    /// Incremented on every swap, starting at 1 for the first corpus.
    pub generation: u64,
}

#[derive(Debug)]
pub struct RecordStore {
    current: RwLock<Option<Snapshot>>,
}

impl RecordStore {
    pub fn new(corpus: Corpus) -> Self {
        RecordStore {
            current: RwLock::new(Some(Snapshot {
                corpus: Arc::new(corpus),
                generation: 1,
            })),
        }
    }

    /// A store with no corpus yet. Every query fails with
    /// [`GranaryError::Unavailable`] until [`RecordStore::replace`] is called.
    pub fn unavailable() -> Self {
        RecordStore {
            current: RwLock::new(None),
        }
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(Corpus::load(path)?))
    }

    pub fn snapshot(&self) -> Result<Snapshot> {
        // Only pointer swaps happen under the lock; a poisoned guard still
        // holds a consistent value.
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        guard
            .clone()
            .ok_or_else(|| GranaryError::Unavailable("no corpus loaded".to_string()))
    }

    /// Swap in a new corpus and return its generation.
    pub fn replace(&self, corpus: Corpus) -> u64 {
        let corpus = Arc::new(corpus);
        let records = corpus.len();
        let generation = {
            let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
            let generation = guard.as_ref().map_or(1, |s| s.generation + 1);
            *guard = Some(Snapshot { corpus, generation });
            generation
        };
        tracing::info!(generation, records, "swapped corpus snapshot");
        generation
    }

    /// Load `path` and swap it in. On failure the current snapshot stays.
    pub fn reload<P: AsRef<Path>>(&self, path: P) -> Result<u64> {
        let corpus = Corpus::load(path)?;
        Ok(self.replace(corpus))
    }

    pub fn is_available(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }
}
