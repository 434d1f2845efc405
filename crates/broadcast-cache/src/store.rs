use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

impl<V> Entry<V> {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.inserted_at.elapsed() > ttl
    }
}

/// A bounded, LRU-evicting, TTL-expiring store keyed by partner id.
pub(crate) struct CacheStore<V> {
    store: LruCache<String, Entry<V>>,
    ttl: Duration,
}

impl<V: Clone> CacheStore<V> {
    pub(crate) fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(1).unwrap());
        Self {
            store: LruCache::new(capacity),
            ttl,
        }
    }

    pub(crate) fn get(&mut self, key: &str) -> Option<V> {
        let expired = self.store.get(key).map(|e| e.is_expired(self.ttl));
        match expired {
            Some(true) => {
                self.store.pop(key);
                None
            }
            Some(false) => self.store.get(key).map(|e| e.value.clone()),
            None => None,
        }
    }

    pub(crate) fn insert(&mut self, key: String, value: V) {
        self.store.put(
            key,
            Entry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    pub(crate) fn remove(&mut self, key: &str) {
        self.store.pop(key);
    }

    pub(crate) fn clear(&mut self) {
        self.store.clear();
    }

    pub(crate) fn values(&self) -> Vec<V> {
        self.store
            .iter()
            .filter(|(_, entry)| !entry.is_expired(self.ttl))
            .map(|(_, entry)| entry.value.clone())
            .collect()
    }
}
