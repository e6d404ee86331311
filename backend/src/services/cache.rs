//! Memoization of parsed uploads keyed by content hash.
//!
//! Parsing is pure, so a table parsed from identical bytes can be shared
//! between requests. Entries are evicted first-in first-out once the cache
//! holds `capacity` tables; a capacity of zero disables caching.

use parking_lot::RwLock;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::models::Table;
use crate::parsing::parse_csv;

/// Default number of cached tables.
pub const DEFAULT_CACHE_CAPACITY: usize = 16;

/// Hex SHA-256 digest of an upload.
pub fn content_key(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// Hit/miss counters and current size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

#[derive(Default)]
struct CacheInner {
    tables: HashMap<String, Arc<Table>>,
    /// Insertion order, oldest first.
    order: VecDeque<String>,
    hits: u64,
    misses: u64,
}

/// Shared parse cache.
#[derive(Clone)]
pub struct TableCache {
    inner: Arc<RwLock<CacheInner>>,
    capacity: usize,
}

impl TableCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(CacheInner::default())),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.inner.read().tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.read();
        CacheStats {
            entries: inner.tables.len(),
            hits: inner.hits,
            misses: inner.misses,
        }
    }

    /// Look up a table by its content key.
    pub fn get(&self, key: &str) -> Option<Arc<Table>> {
        self.inner.read().tables.get(key).cloned()
    }

    /// Return the cached table for `content`, parsing and storing it on a miss.
    ///
    /// Parse failures are not cached.
    pub fn get_or_parse(&self, content: &[u8]) -> Result<(String, Arc<Table>)> {
        let key = content_key(content);

        {
            let mut inner = self.inner.write();
            if let Some(table) = inner.tables.get(&key).cloned() {
                inner.hits += 1;
                debug!(key = %key, "Table cache hit");
                return Ok((key, table));
            }
            inner.misses += 1;
        }

        // Parse without holding the lock; concurrent misses on the same
        // content parse twice and the second insert is dropped.
        let table = Arc::new(parse_csv(content)?);
        if self.capacity == 0 {
            return Ok((key, table));
        }

        let mut inner = self.inner.write();
        if let Some(existing) = inner.tables.get(&key).cloned() {
            return Ok((key, existing));
        }
        while inner.order.len() >= self.capacity {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.tables.remove(&oldest);
                    debug!(key = %oldest, "Evicted cached table");
                }
                None => break,
            }
        }
        inner.tables.insert(key.clone(), Arc::clone(&table));
        inner.order.push_back(key.clone());

        Ok((key, table))
    }
}

impl Default for TableCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV_A: &[u8] = b"a,b\n1,2\n3,4\n";
    const CSV_B: &[u8] = b"a,b\n5,6\n";
    const CSV_C: &[u8] = b"x\n1\n";

    #[test]
    fn test_content_key_is_stable_hex() {
        let key = content_key(CSV_A);
        assert_eq!(key, content_key(CSV_A));
        assert_ne!(key, content_key(CSV_B));
        assert_eq!(key.len(), 64);
    }

    #[test]
    fn test_second_lookup_hits() {
        let cache = TableCache::new(4);
        let (key1, first) = cache.get_or_parse(CSV_A).unwrap();
        let (key2, second) = cache.get_or_parse(CSV_A).unwrap();

        assert_eq!(key1, key2);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(
            cache.stats(),
            CacheStats {
                entries: 1,
                hits: 1,
                misses: 1
            }
        );
    }

    #[test]
    fn test_oldest_entry_is_evicted() {
        let cache = TableCache::new(2);
        let (key_a, _) = cache.get_or_parse(CSV_A).unwrap();
        let (key_b, _) = cache.get_or_parse(CSV_B).unwrap();
        let (key_c, _) = cache.get_or_parse(CSV_C).unwrap();

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&key_a).is_none());
        assert!(cache.get(&key_b).is_some());
        assert!(cache.get(&key_c).is_some());
    }

    #[test]
    fn test_zero_capacity_disables_caching() {
        let cache = TableCache::new(0);
        let (_, table) = cache.get_or_parse(CSV_A).unwrap();
        assert_eq!(table.height(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_parse_errors_are_not_cached() {
        let cache = TableCache::new(2);
        assert!(cache.get_or_parse(b"").is_err());
        assert!(cache.is_empty());
    }
}
