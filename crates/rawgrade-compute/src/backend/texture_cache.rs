//! Keyed cache for GPU resources.
//!
//! Creation runs outside the lock. If two threads race on the same key, both
//! create, the first insert wins and the loser's resource is dropped.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

/// Thread-safe map from a string key to a shared resource.
pub struct TextureCache<T> {
    entries: Mutex<HashMap<String, Arc<T>>>,
}

impl<T> TextureCache<T> {
    pub fn new() -> Self {
        Self { entries: Mutex::new(HashMap::new()) }
    }

    /// Cached entry for `key`, if any.
    pub fn get(&self, key: &str) -> Option<Arc<T>> {
        self.entries.lock().get(key).cloned()
    }

    /// Returns the cached entry or creates one with `create`.
    pub fn get_or_try_insert_with<E>(
        &self,
        key: &str,
        create: impl FnOnce() -> Result<T, E>,
    ) -> Result<Arc<T>, E> {
        if let Some(hit) = self.get(key) {
            return Ok(hit);
        }
        let created = Arc::new(create()?);
        let mut entries = self.entries.lock();
        Ok(Arc::clone(entries.entry(key.to_string()).or_insert(created)))
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for TextureCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
