use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Slot<T> {
    value: T,
    expires_at: Instant,
}

/// Bounded in-memory memoization of finished responses, keyed by
/// `(normalized identifier, style)`.
///
/// Entries expire after a TTL; when the size cap is reached the entry
/// closest to expiry is evicted. Reads and writes are atomic per key —
/// a concurrent duplicate request may do duplicate work, which is fine,
/// but never observes a torn entry. The aggregation core never touches
/// this; caching is a service-layer concern.
pub struct ResponseCache<T> {
    inner: Mutex<HashMap<(String, String), Slot<T>>>,
    ttl: Duration,
    max_entries: usize,
    enabled: bool,
}

impl<T: Clone> ResponseCache<T> {
    pub fn new(enabled: bool, max_entries: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            ttl,
            max_entries,
            enabled,
        }
    }

    /// A cached value for this identifier+style, unless it has expired.
    pub fn get(&self, identifier: &str, style: &str) -> Option<T> {
        if !self.enabled {
            return None;
        }
        let key = (identifier.to_string(), style.to_string());
        let mut map = self.inner.lock().expect("cache mutex poisoned");

        match map.get(&key) {
            Some(slot) if slot.expires_at > Instant::now() => Some(slot.value.clone()),
            Some(_) => {
                map.remove(&key);
                None
            }
            None => None,
        }
    }

    pub fn set(&self, identifier: &str, style: &str, value: T) {
        if !self.enabled || self.max_entries == 0 {
            return;
        }
        let key = (identifier.to_string(), style.to_string());
        let mut map = self.inner.lock().expect("cache mutex poisoned");

        if !map.contains_key(&key) && map.len() >= self.max_entries {
            // Evict the entry closest to expiry.
            if let Some(oldest) = map
                .iter()
                .min_by_key(|(_, slot)| slot.expires_at)
                .map(|(k, _)| k.clone())
            {
                map.remove(&oldest);
            }
        }

        map.insert(
            key,
            Slot {
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.lock().expect("cache mutex poisoned").len()
    }
}
