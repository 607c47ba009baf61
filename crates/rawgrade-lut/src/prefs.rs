//! Key/value preference stores holding JSON values.
//!
//! The registry keeps its import index under a single versioned key. Stores are
//! injected so tests can run without touching the user's data directory.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde_json::{Map, Value};
use tracing::warn;

/// Preference storage.
pub trait PreferenceStore: Send + Sync {
    /// Value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<Value>;

    /// Replaces the value stored under `key`.
    fn set(&self, key: &str, value: Value) -> io::Result<()>;
}

/// In-memory store, lost on drop.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: Mutex<HashMap<String, Value>>,
}

impl MemoryPreferences {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> io::Result<()> {
        self.values.lock().insert(key.to_string(), value);
        Ok(())
    }
}

/// A single JSON object on disk, rewritten on every `set`.
#[derive(Debug)]
pub struct JsonFilePreferences {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFilePreferences {
    /// Store backed by `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Map<String, Value> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(_) => return Map::new(),
        };
        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                warn!(path = %self.path.display(), "ignoring unreadable preferences file");
                Map::new()
            }
        }
    }
}

impl PreferenceStore for JsonFilePreferences {
    fn get(&self, key: &str) -> Option<Value> {
        let _guard = self.lock.lock();
        self.load().remove(key)
    }

    fn set(&self, key: &str, value: Value) -> io::Result<()> {
        let _guard = self.lock.lock();
        let mut map = self.load();
        map.insert(key.to_string(), value);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(&Value::Object(map)).map_err(io::Error::other)?;

        // Write-then-rename so a crash never leaves a truncated file.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_roundtrip() {
        let prefs = MemoryPreferences::new();
        assert!(prefs.get("k").is_none());
        prefs.set("k", json!([1, 2])).unwrap();
        assert_eq!(prefs.get("k"), Some(json!([1, 2])));
    }

    #[test]
    fn test_file_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("preferences.json");

        JsonFilePreferences::new(&path).set("a", json!("x")).unwrap();
        JsonFilePreferences::new(&path).set("b", json!(2)).unwrap();

        let prefs = JsonFilePreferences::new(&path);
        assert_eq!(prefs.get("a"), Some(json!("x")));
        assert_eq!(prefs.get("b"), Some(json!(2)));
    }

    #[test]
    fn test_corrupt_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(&path, "{not json").unwrap();

        let prefs = JsonFilePreferences::new(&path);
        assert!(prefs.get("a").is_none());
        prefs.set("a", json!(true)).unwrap();
        assert_eq!(prefs.get("a"), Some(json!(true)));
    }
}
