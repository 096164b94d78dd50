//! In-memory TTL cache of extracted trees, keyed by source URL.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use topictree_shared::TopicNode;

/// Default entry lifetime (5 minutes).
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Cache key for a source URL.
pub fn cache_key(url: &str) -> String {
    format!("url:{url}")
}

struct CacheEntry {
    value: TopicNode,
    expires_at: Instant,
}

/// Thread-safe map whose entries expire a fixed time after insertion.
///
/// Expired entries are evicted lazily on lookup, or in bulk by
/// [`ResultCache::purge_expired`].
pub struct ResultCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResultCache {
    /// Create an empty cache with the given entry lifetime.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Entry lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a live entry. An expired entry is removed and reported as a miss.
    pub fn get(&self, key: &str) -> Option<TopicNode> {
        let now = Instant::now();
        let mut entries = self.lock();
        if let Some(entry) = entries.get(key) {
            if now < entry.expires_at {
                return Some(entry.value.clone());
            }
            entries.remove(key);
        }
        None
    }

    /// Store `value` under `key`, replacing any previous entry.
    pub fn set(&self, key: impl Into<String>, value: TopicNode) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + self.ttl,
        };
        self.lock().insert(key.into(), entry);
    }

    /// Whether a live entry exists for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of stored entries, live or not yet evicted.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| now < entry.expires_at);
        before - entries.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry>> {
        // Entries are replaced whole, so a poisoned map is still consistent.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_format() {
        assert_eq!(cache_key("https://example.com/map"), "url:https://example.com/map");
    }

    #[test]
    fn hit_within_ttl() {
        let cache = ResultCache::default();
        let key = cache_key("https://example.com/map");
        cache.set(key.clone(), TopicNode::new("https://example.com/map", "Root"));

        assert!(cache.contains(&key));
        assert_eq!(cache.get(&key).map(|t| t.title), Some("Root".to_string()));
        assert!(cache.get("url:other").is_none());
    }

    #[test]
    fn expired_entry_is_evicted_on_get() {
        let cache = ResultCache::new(Duration::ZERO);
        cache.set("url:a", TopicNode::new("a", "Root"));
        assert_eq!(cache.len(), 1);

        assert!(cache.get("url:a").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn purge_removes_only_expired() {
        let cache = ResultCache::new(Duration::ZERO);
        cache.set("url:a", TopicNode::new("a", "Root"));
        cache.set("url:b", TopicNode::new("b", "Root"));
        assert_eq!(cache.purge_expired(), 2);

        let cache = ResultCache::default();
        cache.set("url:c", TopicNode::new("c", "Root"));
        assert_eq!(cache.purge_expired(), 0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn set_replaces_existing_entry() {
        let cache = ResultCache::default();
        cache.set("url:a", TopicNode::new("a", "Old"));
        cache.set("url:a", TopicNode::new("a", "New"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("url:a").map(|t| t.title), Some("New".to_string()));
    }
}
