//! LUT registry: identifier resolution, caching and user imports.
//!
//! One lock guards both the parsed-LUT cache and the import index. File I/O and
//! parsing always happen outside the lock; results are inserted under a fresh
//! acquisition, so a slow disk never blocks a render that only needs a cache hit.
//! Index writes take a snapshot under the state lock and are persisted after it
//! is released, ordered by a revision number.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};

use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{BundleSource, ImportError, Lut3D, LutId, PreferenceStore, cube};

/// Preferences key holding the import index.
pub const INDEX_KEY: &str = "rawgrade.imported_luts.v1";

/// Persisted description of one imported LUT.
///
/// Stored as `{"id", "displayName", "storedFileName"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    /// Import uuid (without the `import:` prefix).
    pub id: String,
    /// Name shown to the user, taken from the source file stem.
    pub display_name: String,
    /// File name inside the storage directory.
    pub stored_file_name: String,
}

/// One selectable entry of [`LutRegistry::list_options`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LutOption {
    /// Full identifier (`none`, `bundle:...`, `import:...`).
    pub id: String,
    /// Name shown to the user.
    pub display_name: String,
    /// False for user imports.
    pub is_built_in: bool,
}

/// Change notifications sent to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryEvent {
    /// The set of available LUTs changed.
    Changed,
}

#[derive(Default)]
struct State {
    cache: HashMap<String, Arc<Lut3D>>,
    imported: HashMap<String, IndexEntry>,
    /// Bumped on every index change.
    revision: u64,
}

/// Resolves LUT identifiers to shared lattice data.
pub struct LutRegistry {
    storage_dir: PathBuf,
    bundles: Vec<Box<dyn BundleSource>>,
    prefs: Box<dyn PreferenceStore>,
    state: Mutex<State>,
    /// Revision of the index last written to `prefs`.
    persisted: Mutex<u64>,
    observers: Mutex<Vec<Sender<RegistryEvent>>>,
}

fn caseless(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

impl LutRegistry {
    /// Opens a registry that stores imports in `storage_dir` and restores its
    /// index from `prefs`.
    pub fn new(storage_dir: impl Into<PathBuf>, prefs: Box<dyn PreferenceStore>) -> Self {
        let registry = Self {
            storage_dir: storage_dir.into(),
            bundles: Vec::new(),
            prefs,
            state: Mutex::new(State::default()),
            persisted: Mutex::new(0),
            observers: Mutex::new(Vec::new()),
        };
        registry.restore_index();
        registry
    }

    /// Adds a preset source. Names from earlier sources win on collision.
    pub fn with_bundle(mut self, source: impl BundleSource + 'static) -> Self {
        self.bundles.push(Box::new(source));
        self
    }

    /// Managed directory holding imported copies.
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock()
    }

    fn bundle_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for source in &self.bundles {
            for name in source.names() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names.sort_by(|a, b| caseless(a, b));
        names
    }

    /// Every selectable LUT: `none`, then presets, then imports, each group
    /// sorted case-insensitively by name.
    pub fn list_options(&self) -> Vec<LutOption> {
        let mut imported: Vec<IndexEntry> = self.state().imported.values().cloned().collect();
        imported.sort_by(|a, b| caseless(&a.display_name, &b.display_name));

        let mut options = vec![LutOption {
            id: LutId::None.to_string(),
            display_name: "None".to_string(),
            is_built_in: true,
        }];
        options.extend(self.bundle_names().into_iter().map(|name| LutOption {
            id: LutId::Bundle(name.clone()).to_string(),
            display_name: name,
            is_built_in: true,
        }));
        options.extend(imported.into_iter().map(|entry| LutOption {
            id: LutId::Import(entry.id).to_string(),
            display_name: entry.display_name,
            is_built_in: false,
        }));
        options
    }

    /// Resolves an identifier. `"none"`, unknown ids and any load failure
    /// resolve to `None`.
    pub fn resolve(&self, id: &str) -> Option<Arc<Lut3D>> {
        let parsed = LutId::parse(id)?;
        if parsed.is_none() {
            return None;
        }

        if let Some(hit) = self.state().cache.get(id) {
            return Some(Arc::clone(hit));
        }

        let loaded = match &parsed {
            LutId::None => return None,
            LutId::Bundle(name) => self.load_bundle(name),
            LutId::Import(uuid) => self.load_import(uuid),
        };

        match loaded {
            Ok(lut) => {
                let lut = Arc::new(lut.with_name(id, self.display_name_for(&parsed)));
                let mut state = self.state();
                let entry = state.cache.entry(id.to_string()).or_insert(lut);
                Some(Arc::clone(entry))
            }
            Err(e) => {
                debug!(id, error = %e, "LUT did not resolve");
                None
            }
        }
    }

    fn display_name_for(&self, id: &LutId) -> String {
        match id {
            LutId::None => "None".to_string(),
            LutId::Bundle(name) => name.clone(),
            LutId::Import(uuid) => self
                .state()
                .imported
                .get(uuid)
                .map(|e| e.display_name.clone())
                .unwrap_or_else(|| uuid.clone()),
        }
    }

    fn load_bundle(&self, name: &str) -> Result<Lut3D, crate::ParseError> {
        let mut last_err = crate::ParseError::ReadFailed;
        for source in &self.bundles {
            if !source.names().iter().any(|n| n == name) {
                continue;
            }
            match source.load(name) {
                Ok(lut) => return Ok(lut),
                Err(e) => last_err = e,
            }
        }
        Err(last_err)
    }

    fn load_import(&self, uuid: &str) -> Result<Lut3D, crate::ParseError> {
        let file_name = self
            .state()
            .imported
            .get(uuid)
            .map(|e| e.stored_file_name.clone())
            .ok_or(crate::ParseError::ReadFailed)?;
        cube::read(self.storage_dir.join(file_name))
    }

    /// Copies `source` into the storage directory, validates it and registers
    /// it. Returns the new `import:<uuid>` identifier.
    ///
    /// A file that fails to parse is removed again and leaves the index untouched.
    pub fn import(&self, source: &Path) -> Result<String, ImportError> {
        let display_name = source
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                ImportError::io(source, std::io::Error::new(std::io::ErrorKind::InvalidInput, "no file name"))
            })?
            .to_string();

        let uuid = Uuid::new_v4().to_string();
        let file_name = format!("{uuid}-{display_name}.cube");
        let destination = self.storage_dir.join(&file_name);

        fs::create_dir_all(&self.storage_dir).map_err(|e| ImportError::io(&self.storage_dir, e))?;
        if destination.exists() {
            fs::remove_file(&destination).map_err(|e| ImportError::io(&destination, e))?;
        }
        fs::copy(source, &destination).map_err(|e| ImportError::io(source, e))?;

        let id = LutId::Import(uuid.clone()).to_string();
        let lut = match cube::read(&destination) {
            Ok(lut) => lut.with_name(&id, &display_name),
            Err(e) => {
                if let Err(rm) = fs::remove_file(&destination) {
                    warn!(path = %destination.display(), error = %rm, "failed to remove rejected import");
                }
                return Err(e.into());
            }
        };

        let (revision, snapshot) = {
            let mut state = self.state();
            state.cache.insert(id.clone(), Arc::new(lut));
            state.imported.insert(
                uuid.clone(),
                IndexEntry { id: uuid, display_name: display_name.clone(), stored_file_name: file_name },
            );
            state.revision += 1;
            (state.revision, sorted_index(&state))
        };
        self.persist_index(revision, &snapshot);

        info!(id, name = %display_name, "imported LUT");
        self.notify(RegistryEvent::Changed);
        Ok(id)
    }

    /// Imported entries, sorted by display name.
    pub fn imported(&self) -> Vec<IndexEntry> {
        let mut entries: Vec<IndexEntry> = self.state().imported.values().cloned().collect();
        entries.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        entries
    }

    /// Receives a [`RegistryEvent`] after every successful import.
    pub fn subscribe(&self) -> Receiver<RegistryEvent> {
        let (tx, rx) = channel();
        self.observers.lock().push(tx);
        rx
    }

    fn notify(&self, event: RegistryEvent) {
        self.observers.lock().retain(|tx| tx.send(event).is_ok());
    }

    fn restore_index(&self) {
        let Some(value) = self.prefs.get(INDEX_KEY) else {
            return;
        };
        match serde_json::from_value::<Vec<IndexEntry>>(value) {
            Ok(entries) => {
                debug!(count = entries.len(), "restored LUT index");
                self.state().imported = entries.into_iter().map(|e| (e.id.clone(), e)).collect();
            }
            Err(e) => warn!(error = %e, "ignoring corrupted LUT index"),
        }
    }

    /// Writes `snapshot` unless a newer revision is already on disk.
    fn persist_index(&self, revision: u64, snapshot: &[IndexEntry]) {
        let mut persisted = self.persisted.lock();
        if *persisted >= revision {
            debug!(revision, persisted = *persisted, "skipping superseded LUT index write");
            return;
        }

        let result = serde_json::to_value(snapshot)
            .map_err(std::io::Error::other)
            .and_then(|value| self.prefs.set(INDEX_KEY, value));
        match result {
            Ok(()) => *persisted = revision,
            Err(e) => warn!(error = %e, "failed to persist LUT index"),
        }
    }
}

fn sorted_index(state: &State) -> Vec<IndexEntry> {
    let mut list: Vec<IndexEntry> = state.imported.values().cloned().collect();
    list.sort_by(|a, b| a.display_name.cmp(&b.display_name));
    list
}

impl std::fmt::Debug for LutRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("LutRegistry")
            .field("storage_dir", &self.storage_dir)
            .field("bundles", &self.bundles.len())
            .field("cached", &state.cache.len())
            .field("imported", &state.imported.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GeneratedPresets, MemoryPreferences};

    #[test]
    fn test_none_and_unknown_resolve_to_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let registry = LutRegistry::new(dir.path(), Box::new(MemoryPreferences::new()));
        assert!(registry.resolve("none").is_none());
        assert!(registry.resolve("bundle:Missing").is_none());
        assert!(registry.resolve("import:nope").is_none());
        assert!(registry.resolve("garbage").is_none());
    }

    #[test]
    fn test_bundle_resolve_is_cached() {
        let dir = tempfile::tempdir().unwrap();
        let registry = LutRegistry::new(dir.path(), Box::new(MemoryPreferences::new()))
            .with_bundle(GeneratedPresets::builtin());

        let a = registry.resolve("bundle:Warm").unwrap();
        let b = registry.resolve("bundle:Warm").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.id(), "bundle:Warm");
        assert_eq!(a.display_name(), "Warm");
    }

    #[test]
    fn test_corrupted_index_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = MemoryPreferences::new();
        prefs.set(INDEX_KEY, serde_json::json!({"not": "a list"})).unwrap();
        let registry = LutRegistry::new(dir.path(), Box::new(prefs));
        assert!(registry.imported().is_empty());
        assert_eq!(registry.list_options().len(), 1);
    }

    #[test]
    fn test_caseless_ordering() {
        let mut names = vec!["beta", "Alpha", "alpha", "Gamma"];
        names.sort_by(|a, b| caseless(a, b));
        assert_eq!(names, vec!["Alpha", "alpha", "beta", "Gamma"]);
    }
}
