//! In-memory storage implementation

use siphasher::sip::SipHasher13;
use std::collections::HashMap;
use std::hash::BuildHasherDefault;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Type alias for our hash map with SipHasher
type StoreMap = HashMap<String, String, BuildHasherDefault<SipHasher13>>;

/// Maximum rendered snapshot length, in characters, before trimming
pub const SNAPSHOT_LIMIT: usize = 65_000;

/// Number of synthetic entries inserted by the test fixture
const FIXTURE_ENTRIES: usize = 700;

/// Filler characters appended to every fixture value
const FIXTURE_PADDING: usize = 80;

/// Shared in-memory key-value store
///
/// One instance is created at process start and handed by `Arc` to every
/// transport listener. Mutations serialize behind the write lock, so two
/// concurrent `put`s to the same key resolve in arrival order with no lost
/// updates; reads take the read lock and run concurrently.
pub struct KvStore {
    entries: RwLock<StoreMap>,
}

impl KvStore {
    /// Create a new store with default capacity
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    /// Create a new store with specified initial capacity
    pub fn with_capacity(capacity: usize) -> Self {
        KvStore {
            entries: RwLock::new(HashMap::with_capacity_and_hasher(
                capacity,
                BuildHasherDefault::<SipHasher13>::default(),
            )),
        }
    }

    /// Insert or overwrite a key-value pair
    ///
    /// The write is immediately visible to any subsequent `get` on the same
    /// key, from any transport.
    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) {
        self.write().insert(key.into(), value.into());
    }

    /// Get a value by key; a miss is a valid outcome, not an error
    pub fn get(&self, key: &str) -> Option<String> {
        self.read().get(key).cloned()
    }

    /// Delete a key, returns true if the key existed
    pub fn delete(&self, key: &str) -> bool {
        self.write().remove(key).is_some()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Render the whole store as `key=value; ` concatenations
    ///
    /// Iteration order is unspecified. A rendering longer than
    /// [`SNAPSHOT_LIMIT`] characters is cut down to the limit and wrapped in
    /// a `TRIMMED:` prefix and `.....trimmed` suffix.
    pub fn render_snapshot(&self) -> String {
        let mut rendered = String::new();
        {
            let entries = self.read();
            for (key, value) in entries.iter() {
                rendered.push_str(key);
                rendered.push('=');
                rendered.push_str(value);
                rendered.push_str("; ");
            }
        }

        if rendered.chars().count() > SNAPSHOT_LIMIT {
            let head: String = rendered.chars().take(SNAPSHOT_LIMIT).collect();
            format!("TRIMMED:{}.....trimmed", head)
        } else {
            rendered
        }
    }

    /// Up to `limit` keys in iteration order, for diagnostics
    pub fn first_keys(&self, limit: usize) -> Vec<String> {
        self.read().keys().take(limit).cloned().collect()
    }

    /// Fill the store with the deterministic test data set
    ///
    /// Inserts `key<i>` -> `value<i>` plus 80 filler characters, for 700
    /// entries, overwriting any colliding keys.
    pub fn populate_fixture(&self) {
        let padding = "x".repeat(FIXTURE_PADDING);
        let mut entries = self.write();
        for i in 0..FIXTURE_ENTRIES {
            entries.insert(format!("key{}", i), format!("value{}{}", i, padding));
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreMap> {
        // A panicked writer must not take the store down with it
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreMap> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for KvStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_put_get() {
        let store = KvStore::new();
        store.put("key1", "value1");

        assert_eq!(store.get("key1"), Some("value1".to_string()));
        assert_eq!(store.get("missing"), None);
    }

    #[test]
    fn test_put_overwrites() {
        let store = KvStore::new();
        store.put("key1", "old");
        store.put("key1", "new");

        assert_eq!(store.get("key1"), Some("new".to_string()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_delete() {
        let store = KvStore::new();
        store.put("key1", "value1");

        assert!(store.delete("key1"));
        assert_eq!(store.get("key1"), None);
        assert!(!store.delete("key1"));
    }

    #[test]
    fn test_snapshot_rendering() {
        let store = KvStore::new();
        store.put("b", "2");

        assert_eq!(store.render_snapshot(), "b=2; ");
    }

    #[test]
    fn test_snapshot_below_limit_is_verbatim() {
        let store = KvStore::new();
        store.put("a", "1");
        store.put("b", "2");

        let rendered = store.render_snapshot();
        assert!(!rendered.starts_with("TRIMMED:"));
        assert_eq!(rendered.len(), "a=1; ".len() + "b=2; ".len());
    }

    #[test]
    fn test_snapshot_trimming() {
        let store = KvStore::new();
        store.populate_fixture();

        let rendered = store.render_snapshot();
        assert!(rendered.starts_with("TRIMMED:"));
        assert!(rendered.ends_with(".....trimmed"));
        // prefix + exactly SNAPSHOT_LIMIT characters + suffix
        assert_eq!(
            rendered.chars().count(),
            "TRIMMED:".len() + SNAPSHOT_LIMIT + ".....trimmed".len()
        );
    }

    #[test]
    fn test_fixture_shape() {
        let store = KvStore::new();
        store.populate_fixture();

        assert_eq!(store.len(), 700);
        let value = store.get("key42").unwrap();
        assert!(value.starts_with("value42"));
        assert_eq!(value.len(), "value42".len() + 80);
    }

    #[test]
    fn test_first_keys_bounded() {
        let store = KvStore::new();
        store.populate_fixture();

        assert_eq!(store.first_keys(10).len(), 10);
        assert_eq!(KvStore::new().first_keys(10).len(), 0);
    }

    #[test]
    fn test_concurrent_puts_distinct_keys() {
        let store = Arc::new(KvStore::new());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || store.put(format!("k{}", i), format!("v{}", i)))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        for i in 0..16 {
            assert_eq!(store.get(&format!("k{}", i)), Some(format!("v{}", i)));
        }
    }

    #[test]
    fn test_concurrent_puts_same_key_last_wins() {
        let store = Arc::new(KvStore::new());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || store.put("shared", format!("v{}", i)))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // Exactly one of the submitted values survives, never a torn one
        let value = store.get("shared").unwrap();
        assert!((0..16).any(|i| value == format!("v{}", i)));
        assert_eq!(store.len(), 1);
    }
}
