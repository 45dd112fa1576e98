//! In-memory query result cache.
//!
//! # Design
//! Entries are keyed by `OperationDescriptor::cache_key` and hold the whole
//! envelope. Invalidation clears every entry and bumps a generation counter
//! published on a `tokio::sync::watch` channel; live query watches wait on
//! that channel and refetch when it moves.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::operation::ResultEnvelope;

/// How queries use the cache. Mutations always go to the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CachePolicy {
    /// Answer from the cache when an entry exists.
    #[default]
    CacheFirst,
    /// Always fetch, then store the result.
    NetworkOnly,
    /// Neither read nor write the cache.
    NoCache,
}

impl CachePolicy {
    pub fn reads(self) -> bool {
        self == CachePolicy::CacheFirst
    }

    pub fn writes(self) -> bool {
        self != CachePolicy::NoCache
    }
}

#[derive(Debug)]
pub struct QueryCache {
    entries: Mutex<HashMap<String, ResultEnvelope>>,
    generation: watch::Sender<u64>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            entries: Mutex::new(HashMap::new()),
            generation,
        }
    }

    pub fn get(&self, key: &str) -> Option<ResultEnvelope> {
        self.lock().get(key).cloned()
    }

    pub fn put(&self, key: String, envelope: ResultEnvelope) {
        self.lock().insert(key, envelope);
    }

    /// Store `envelope` only if no invalidation happened since `generation`
    /// was read. Returns whether the entry was stored.
    pub fn put_if_generation(&self, key: String, envelope: ResultEnvelope, generation: u64) -> bool {
        let mut entries = self.lock();
        if *self.generation.borrow() != generation {
            return false;
        }
        entries.insert(key, envelope);
        true
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop every entry and wake all watchers.
    pub fn invalidate(&self) {
        // Bump under the entries lock so `put_if_generation` sees either
        // both the clear and the bump or neither.
        let mut entries = self.lock();
        entries.clear();
        self.generation.send_modify(|g| *g += 1);
    }

    pub fn generation(&self) -> u64 {
        *self.generation.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.generation.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, ResultEnvelope>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
