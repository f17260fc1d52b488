//! Bounded, TTL-expiring cache shared by the competitor and trends services.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug)]
struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

/// In-process cache holding at most `max_entries` values, each for at most `ttl`.
///
/// When full, expired entries are purged first; if the cache is still full the
/// oldest entry is evicted.
#[derive(Debug)]
pub struct BoundedCache<K, V> {
    entries: Mutex<HashMap<K, Entry<V>>>,
    max_entries: usize,
    ttl: Duration,
}

impl<K, V> BoundedCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    #[must_use]
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_entries: max_entries.max(1),
            ttl,
        }
    }

    /// Return a clone of the live value for `key`, dropping it if expired.
    pub async fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub async fn insert(&self, key: K, value: V) {
        let mut entries = self.entries.lock().await;

        if !entries.contains_key(&key) && entries.len() >= self.max_entries {
            let ttl = self.ttl;
            entries.retain(|_, entry| entry.inserted_at.elapsed() < ttl);

            if entries.len() >= self.max_entries {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.inserted_at)
                    .map(|(k, _)| k.clone());
                if let Some(oldest) = oldest {
                    entries.remove(&oldest);
                }
            }
        }

        entries.insert(
            key,
            Entry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Number of stored entries, including any not yet purged after expiry.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
