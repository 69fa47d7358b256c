use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::ConfigError;
use crate::hierarchy::Hierarchy;
use crate::types::Config;

/// Shared engine state: loaded config plus the current hierarchy, if one has
/// been provisioned.
pub struct EngineState {
    pub config: Config,
    pub hierarchy: Option<HierarchyHandle>,
}

impl EngineState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            hierarchy: None,
        }
    }

    pub fn with_hierarchy(mut self, hierarchy: Hierarchy) -> Self {
        self.hierarchy = Some(HierarchyHandle::new(hierarchy));
        self
    }
}

impl Default for EngineState {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

/// Holder for the live hierarchy.
///
/// Readers take a cheap `Arc` snapshot and never see a half-applied change;
/// provisioning builds a fresh tree and swaps it in whole.
pub struct HierarchyHandle {
    inner: RwLock<Arc<Hierarchy>>,
}

impl HierarchyHandle {
    pub fn new(hierarchy: Hierarchy) -> Self {
        Self {
            inner: RwLock::new(Arc::new(hierarchy)),
        }
    }

    pub fn current(&self) -> Arc<Hierarchy> {
        Arc::clone(&self.inner.read())
    }

    /// Swap in a new tree, returning the one it replaced.
    pub fn replace(&self, hierarchy: Hierarchy) -> Arc<Hierarchy> {
        let next_len = hierarchy.len();
        let previous = std::mem::replace(&mut *self.inner.write(), Arc::new(hierarchy));
        log::info!(
            "hierarchy: replaced tree ({} -> {} nodes)",
            previous.len(),
            next_len
        );
        previous
    }
}

/// Get the canonical config file path (~/.opsboard/config.json)
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::HomeDirNotFound)?;
    Ok(home.join(".opsboard").join("config.json"))
}

/// Load configuration from ~/.opsboard/config.json
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path()?)
}

/// Load and validate configuration from an explicit path.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Like `load_config`, but a missing file yields defaults. Unreadable or
/// invalid files are logged and also fall back to defaults.
pub fn load_config_or_default() -> Config {
    let path = match config_path() {
        Ok(path) => path,
        Err(e) => {
            log::warn!("config: {e}; using defaults");
            return Config::default();
        }
    };
    if !path.exists() {
        log::debug!("config: {} not found; using defaults", path.display());
        return Config::default();
    }
    match load_config_from(&path) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("config: {} ({e}); using defaults", path.display());
            Config::default()
        }
    }
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.analytics.performer_limit == 0 {
        return Err(ConfigError::Invalid(
            "analytics.performerLimit must be at least 1".to_string(),
        ));
    }
    if config.analytics.week_window == 0 {
        return Err(ConfigError::Invalid(
            "analytics.weekWindow must be at least 1".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::fixtures::{sample, spec};
    use crate::types::Tier;

    #[test]
    fn test_load_config_from_applies_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "analytics": { "performerLimit": 5 } }"#).unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.analytics.performer_limit, 5);
        assert_eq!(config.analytics.week_window, 10);
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_load_config_rejects_zero_limits() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "analytics": { "weekWindow": 0 } }"#).unwrap();
        assert!(matches!(
            load_config_from(&path),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_load_config_errors_on_missing_and_malformed() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(matches!(
            load_config_from(&dir.path().join("missing.json")),
            Err(ConfigError::Read(_))
        ));
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_config_from(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_handle_replace_keeps_old_snapshot_intact() {
        let handle = HierarchyHandle::new(sample());
        let before = handle.current();

        let smaller = Hierarchy::from_nodes(vec![
            spec("solo", Tier::Client, None),
            spec("x", Tier::Worker, Some("solo")),
        ])
        .unwrap();
        let previous = handle.replace(smaller);

        assert_eq!(before.len(), 6);
        assert_eq!(previous.len(), 6);
        assert_eq!(handle.current().len(), 2);
        assert_eq!(handle.current().root().id, "solo");
    }

    #[test]
    fn test_engine_state_defaults() {
        let state = EngineState::default();
        assert!(state.hierarchy.is_none());
        let state = state.with_hierarchy(sample());
        let tree = state.hierarchy.as_ref().unwrap().current();
        assert_eq!(tree.root().id, "alpha");
    }
}
