// src/common/locks.rs

use std::{
    collections::HashMap,
    hash::Hash,
    sync::{Arc, Mutex},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

// Entries beyond this count trigger a sweep of unused keys.
const SWEEP_THRESHOLD: usize = 1024;

/// One async mutex per key. Holders of the same key run one at a time,
/// different keys never wait on each other.
#[derive(Clone)]
pub struct KeyedLocks<K> {
    inner: Arc<Mutex<HashMap<K, Arc<AsyncMutex<()>>>>>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<K> KeyedLocks<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, key: K) -> OwnedMutexGuard<()> {
        let slot = {
            // A poisoned map only means another holder panicked mid-insert.
            let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            if map.len() > SWEEP_THRESHOLD {
                map.retain(|_, m| Arc::strong_count(m) > 1);
            }
            map.entry(key).or_default().clone()
        };
        slot.lock_owned().await
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
