//! Two-tier time-expiring cache for autocomplete suggestions.
//!
//! A fast-typing visitor fires many autocomplete requests for the same
//! prefixes; this cache keeps `(keyword, locale) -> suggestions` around for a
//! fixed TTL so repeat lookups skip the network. Lookup order is the
//! in-process map first (no deserialization), then the persisted store; a
//! persisted hit refreshes the in-process tier. A miss does not fetch - the
//! caller fetches and then calls [`SuggestionCache::set`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::debug;

use foodbook_core::SuggestionResult;

use crate::persist::KeyValueStore;

/// Entries older than this are treated as absent. Expiry is lazy: expired
/// entries are swept opportunistically on writes, never on a timer.
const SUGGESTION_TTL_MS: i64 = 10 * 60 * 1000;

/// After the TTL sweep on a write, only this many most-recently-written
/// entries survive. Recency by write timestamp, not LRU-by-access.
const SUGGESTION_CAP: usize = 100;

/// Fixed key for the persisted tier: one JSON map for the whole cache.
const STORE_KEY: &str = "foodbook.suggestions";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CachedSuggestions {
    data: SuggestionResult,
    timestamp: i64,
}

impl CachedSuggestions {
    const fn is_fresh(&self, now: i64) -> bool {
        now - self.timestamp < SUGGESTION_TTL_MS
    }
}

/// Cache in front of the autocomplete endpoint, keyed by `{locale}_{keyword}`.
pub struct SuggestionCache {
    memory: Mutex<HashMap<String, CachedSuggestions>>,
    store: Arc<dyn KeyValueStore>,
}

impl SuggestionCache {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            memory: Mutex::new(HashMap::new()),
            store,
        }
    }

    fn cache_key(keyword: &str, locale: &str) -> String {
        format!("{locale}_{}", keyword.trim().to_lowercase())
    }

    fn lock_memory(&self) -> MutexGuard<'_, HashMap<String, CachedSuggestions>> {
        self.memory.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up cached suggestions; `None` for both misses and expired
    /// entries.
    #[must_use]
    pub fn get(&self, keyword: &str, locale: &str) -> Option<SuggestionResult> {
        self.get_at(keyword, locale, now_millis())
    }

    /// Store suggestions for a keyword, sweeping expired entries and
    /// enforcing the recency cap on both tiers.
    pub fn set(&self, keyword: &str, locale: &str, result: SuggestionResult) {
        self.set_at(keyword, locale, result, now_millis());
    }

    /// Drop both tiers.
    pub fn clear(&self) {
        self.lock_memory().clear();
        self.store.remove(STORE_KEY);
    }

    fn get_at(&self, keyword: &str, locale: &str, now: i64) -> Option<SuggestionResult> {
        let key = Self::cache_key(keyword, locale);
        let mut memory = self.lock_memory();

        if let Some(entry) = memory.get(&key)
            && entry.is_fresh(now)
        {
            return Some(entry.data.clone());
        }

        // Fall through to the persisted tier; a hit there is written back to
        // the in-process map so the next lookup stays on the fast path.
        let persisted = self.read_persisted();
        let entry = persisted.get(&key).filter(|e| e.is_fresh(now))?.clone();
        memory.insert(key, entry.clone());
        Some(entry.data)
    }

    fn set_at(&self, keyword: &str, locale: &str, result: SuggestionResult, now: i64) {
        let key = Self::cache_key(keyword, locale);
        let entry = CachedSuggestions {
            data: result,
            timestamp: now,
        };

        // The lock spans the whole read-modify-write so concurrent writes for
        // different keys cannot clobber each other's entries.
        let mut memory = self.lock_memory();
        memory.insert(key.clone(), entry.clone());
        memory.retain(|_, e| e.is_fresh(now));
        enforce_cap(&mut memory);

        let mut persisted = self.read_persisted();
        persisted.insert(key, entry);
        persisted.retain(|_, e| e.is_fresh(now));
        enforce_cap(&mut persisted);

        match serde_json::to_string(&persisted) {
            Ok(json) => {
                if let Err(err) = self.store.write(STORE_KEY, &json) {
                    // Quota exceeded or similar: drop the persisted tier and
                    // carry on with the in-process map only.
                    debug!(error = %err, "suggestion cache write failed; clearing persisted tier");
                    self.store.remove(STORE_KEY);
                }
            }
            Err(err) => debug!(error = %err, "failed to encode suggestion cache"),
        }
    }

    fn read_persisted(&self) -> HashMap<String, CachedSuggestions> {
        self.store
            .read(STORE_KEY)
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or_default()
    }
}

/// Keep only the most recently written entries, up to the cap.
fn enforce_cap(entries: &mut HashMap<String, CachedSuggestions>) {
    if entries.len() <= SUGGESTION_CAP {
        return;
    }
    let mut by_recency: Vec<(String, CachedSuggestions)> = entries.drain().collect();
    by_recency.sort_by_key(|(_, e)| std::cmp::Reverse(e.timestamp));
    by_recency.truncate(SUGGESTION_CAP);
    entries.extend(by_recency);
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::persist::{MemoryStore, StoreError};
    use foodbook_core::Suggestion;

    fn suggestions(name: &str) -> SuggestionResult {
        SuggestionResult {
            products: vec![Suggestion {
                name: name.to_owned(),
                slug: name.to_owned(),
            }],
            brands: Vec::new(),
        }
    }

    fn cache_with_memory_store() -> (SuggestionCache, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::default());
        (SuggestionCache::new(store.clone()), store)
    }

    #[test]
    fn test_hit_within_ttl() {
        let (cache, _) = cache_with_memory_store();
        cache.set_at("milk", "nl", suggestions("melk"), 1_000);
        assert_eq!(cache.get_at("milk", "nl", 1_001), Some(suggestions("melk")));
    }

    #[test]
    fn test_expired_entry_is_absent() {
        let (cache, _) = cache_with_memory_store();
        cache.set_at("milk", "nl", suggestions("melk"), 1_000);
        assert_eq!(
            cache.get_at("milk", "nl", 1_000 + SUGGESTION_TTL_MS),
            None
        );
    }

    #[test]
    fn test_locales_do_not_collide() {
        let (cache, _) = cache_with_memory_store();
        cache.set_at("milk", "nl", suggestions("melk"), 1_000);
        assert_eq!(cache.get_at("milk", "en", 1_001), None);
    }

    #[test]
    fn test_persisted_hit_refreshes_memory_tier() {
        let store = Arc::new(MemoryStore::default());
        {
            // A previous process wrote the persisted tier.
            let earlier = SuggestionCache::new(store.clone());
            earlier.set_at("milk", "nl", suggestions("melk"), 1_000);
        }

        let cache = SuggestionCache::new(store);
        assert!(cache.lock_memory().is_empty());
        assert_eq!(cache.get_at("milk", "nl", 2_000), Some(suggestions("melk")));
        // Write-through on read: now on the fast path.
        assert_eq!(cache.lock_memory().len(), 1);
    }

    #[test]
    fn test_cap_evicts_oldest_by_timestamp() {
        let (cache, store) = cache_with_memory_store();
        for i in 0..150i64 {
            cache.set_at(&format!("kw{i}"), "nl", suggestions("x"), 1_000 + i);
        }

        let persisted: HashMap<String, CachedSuggestions> =
            serde_json::from_str(&store.read(STORE_KEY).unwrap()).unwrap();
        assert_eq!(persisted.len(), SUGGESTION_CAP);
        // The 50 oldest writes are gone; the 100 newest survive.
        for i in 0..50 {
            assert!(!persisted.contains_key(&format!("nl_kw{i}")));
        }
        for i in 50..150 {
            assert!(persisted.contains_key(&format!("nl_kw{i}")));
        }
    }

    #[test]
    fn test_write_failure_clears_persisted_tier_and_keeps_memory() {
        struct FailingStore {
            inner: MemoryStore,
        }

        impl KeyValueStore for FailingStore {
            fn read(&self, key: &str) -> Option<String> {
                self.inner.read(key)
            }
            fn write(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
                Err(StoreError::Io(std::io::Error::other("quota exceeded")))
            }
            fn remove(&self, key: &str) {
                self.inner.remove(key);
            }
        }

        let store = Arc::new(FailingStore {
            inner: MemoryStore::default(),
        });
        let cache = SuggestionCache::new(store.clone());

        cache.set_at("milk", "nl", suggestions("melk"), 1_000);

        // Persisted tier was cleared, in-process tier still serves.
        assert!(store.read(STORE_KEY).is_none());
        assert_eq!(cache.get_at("milk", "nl", 1_001), Some(suggestions("melk")));
    }

    #[test]
    fn test_clear_drops_both_tiers() {
        let (cache, store) = cache_with_memory_store();
        cache.set_at("milk", "nl", suggestions("melk"), 1_000);
        cache.clear();
        assert_eq!(cache.get_at("milk", "nl", 1_001), None);
        assert!(store.read(STORE_KEY).is_none());
    }
}
