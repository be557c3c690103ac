//! Bounded snapshot cache.
//!
//! Entries are evicted in insertion order once the cache is over capacity.
//! Reads never reorder entries, and overwriting a key keeps its original slot.
//! Freshness is checked per read; a stale entry counts as a miss but stays in
//! place until it is evicted or overwritten.

use indexmap::IndexMap;
use std::fmt;
use std::time::{Duration, Instant};

pub const DEFAULT_MAX_ENTRIES: usize = 100;
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(5 * 60);

/// Key namespace of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    Project,
    File,
}

impl CacheKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheKind::Project => "project",
            CacheKind::File => "file",
        }
    }
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<T> {
    data: T,
    stored_at: Instant,
}

#[derive(Debug)]
pub struct ContextCache<T> {
    entries: IndexMap<String, CacheEntry<T>>,
    max_entries: usize,
    max_age: Duration,
}

impl<T: Clone> Default for ContextCache<T> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES, DEFAULT_MAX_AGE)
    }
}

impl<T: Clone> ContextCache<T> {
    pub fn new(max_entries: usize, max_age: Duration) -> Self {
        Self {
            entries: IndexMap::new(),
            max_entries: max_entries.max(1),
            max_age,
        }
    }

    pub fn cache_key(kind: CacheKind, key: &str) -> String {
        format!("{}:{}", kind, key)
    }

    /// Store `data`, evicting the earliest inserted entry if over capacity.
    pub fn set(&mut self, kind: CacheKind, key: &str, data: T) {
        let entry = CacheEntry {
            data,
            stored_at: Instant::now(),
        };
        self.entries.insert(Self::cache_key(kind, key), entry);

        if self.entries.len() > self.max_entries {
            if let Some((evicted, _)) = self.entries.shift_remove_index(0) {
                tracing::debug!("Evicted cache entry {}", evicted);
            }
        }
    }

    /// Fresh entry under the default max age.
    pub fn get(&self, kind: CacheKind, key: &str) -> Option<T> {
        self.get_with_max_age(kind, key, self.max_age)
    }

    pub fn get_with_max_age(&self, kind: CacheKind, key: &str, max_age: Duration) -> Option<T> {
        let entry = self.entries.get(&Self::cache_key(kind, key))?;
        if entry.stored_at.elapsed() < max_age {
            Some(entry.data.clone())
        } else {
            None
        }
    }

    /// Presence check that ignores freshness.
    pub fn contains(&self, kind: CacheKind, key: &str) -> bool {
        self.entries.contains_key(&Self::cache_key(kind, key))
    }

    pub fn remove(&mut self, kind: CacheKind, key: &str) -> Option<T> {
        self.entries
            .shift_remove(&Self::cache_key(kind, key))
            .map(|entry| entry.data)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }
}
