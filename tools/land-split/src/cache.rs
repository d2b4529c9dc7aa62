use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Storage for read-only response bodies, keyed by request.
///
/// Handed to the HTTP client instead of living in module state, so every
/// client owns its cache and tests can observe or replace it.
pub trait ResponseCache: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn put(&self, key: &str, body: String);
    fn invalidate(&self, key: &str);
}

/// In-memory cache whose entries expire after a fixed time to live.
pub struct TtlCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, String)>>,
}

impl TtlCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResponseCache for TtlCache {
    fn get(&self, key: &str) -> Option<String> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let expired = entries.get(key)?.0.elapsed() >= self.ttl;
        if expired {
            entries.remove(key);
            return None;
        }
        entries.get(key).map(|(_, body)| body.clone())
    }

    fn put(&self, key: &str, body: String) {
        if self.ttl.is_zero() {
            return;
        }
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_string(), (Instant::now(), body));
    }

    fn invalidate(&self, key: &str) {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(key);
    }
}
