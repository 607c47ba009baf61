//! Runtime configuration.
//!
//! Layering, lowest to highest: built-in defaults (`<data dir>/rawgrade`),
//! `RAWGRADE_*` environment variables, then whatever the caller sets on the
//! struct (the CLI applies its flags last).

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use rawgrade_compute::{Backend, RenderContext};
use rawgrade_lut::{DirectoryBundle, GeneratedPresets, JsonFilePreferences, LutRegistry};

use crate::ColorPipeline;

/// Selects the compute backend.
pub const ENV_BACKEND: &str = "RAWGRADE_BACKEND";
/// Overrides the data directory.
pub const ENV_DATA_DIR: &str = "RAWGRADE_DATA_DIR";
/// Directory of read-only `.cube` presets.
pub const ENV_BUNDLE_DIR: &str = "RAWGRADE_BUNDLE_DIR";

const APP_DIR: &str = "rawgrade";
const PREFERENCES_FILE: &str = "preferences.json";
const LUT_DIR: &str = "luts";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub backend: Backend,
    /// Holds `preferences.json` and the managed `luts/` directory.
    pub data_dir: PathBuf,
    /// Served as `bundle:<name>` alongside the generated presets.
    pub bundle_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);
        Self { backend: Backend::Auto, data_dir, bundle_dir: None }
    }
}

impl Config {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by `lookup`. Empty values are ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(value) = get(ENV_BACKEND) {
            match value.parse::<Backend>() {
                Ok(backend) => config.backend = backend,
                Err(e) => warn!(var = ENV_BACKEND, value = %value, error = %e, "ignoring invalid backend"),
            }
        }
        if let Some(dir) = get(ENV_DATA_DIR) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = get(ENV_BUNDLE_DIR) {
            config.bundle_dir = Some(PathBuf::from(dir));
        }
        debug!(?config, "configuration resolved");
        config
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.data_dir.join(PREFERENCES_FILE)
    }

    /// Where imported LUTs are copied.
    pub fn lut_dir(&self) -> PathBuf {
        self.data_dir.join(LUT_DIR)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Registry over the data directory with the built-in presets and the
    /// bundle directory, if any.
    pub fn open_registry(&self) -> LutRegistry {
        let prefs = JsonFilePreferences::new(self.preferences_path());
        let mut registry = LutRegistry::new(self.lut_dir(), Box::new(prefs))
            .with_bundle(GeneratedPresets::builtin());
        if let Some(dir) = &self.bundle_dir {
            registry = registry.with_bundle(DirectoryBundle::new(dir));
        }
        registry
    }

    pub fn render_context(&self) -> RenderContext {
        RenderContext::new(self.backend)
    }

    /// Context plus registry, wired into a pipeline.
    pub fn build_pipeline(&self) -> ColorPipeline {
        ColorPipeline::new(self.render_context(), std::sync::Arc::new(self.open_registry()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config.backend, Backend::Auto);
        assert!(config.data_dir.ends_with("rawgrade"));
        assert!(config.bundle_dir.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::from_lookup(lookup(&[
            (ENV_BACKEND, "cpu"),
            (ENV_DATA_DIR, "/tmp/rg"),
            (ENV_BUNDLE_DIR, "/opt/looks"),
        ]));
        assert_eq!(config.backend, Backend::Cpu);
        assert_eq!(config.preferences_path(), PathBuf::from("/tmp/rg/preferences.json"));
        assert_eq!(config.lut_dir(), PathBuf::from("/tmp/rg/luts"));
        assert_eq!(config.bundle_dir, Some(PathBuf::from("/opt/looks")));
    }

    #[test]
    fn test_invalid_backend_ignored() {
        let config = Config::from_lookup(lookup(&[(ENV_BACKEND, "cuda"), (ENV_DATA_DIR, "  ")]));
        assert_eq!(config.backend, Backend::Auto);
        assert!(config.data_dir.ends_with("rawgrade"));
    }
}
