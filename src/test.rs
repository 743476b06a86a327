//! Shared test utilities for creating test environments.
//!
//! This module is only compiled when running tests (`#[cfg(test)]`).

use crate::store::{BackendPreference, Storage};
use crate::Config;
use tempfile::TempDir;

/// Test environment that sets up a budget home directory with its Config.
/// Holds TempDir to keep the directory alive for the duration of the test.
pub struct TestEnv {
    _temp_dir: TempDir,
    config: Config,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::create(temp_dir.path().join("budget")).unwrap();
        Self {
            _temp_dir: temp_dir,
            config,
        }
    }

    /// Returns a clone of the Config.
    pub fn config(&self) -> Config {
        self.config.clone()
    }

    /// Opens the store the way the CLI does, with the configured backend.
    pub fn store(&self) -> Box<dyn Storage> {
        self.config.open_store(None).unwrap()
    }

    /// Opens the store with a specific backend.
    pub fn store_with(&self, preference: BackendPreference) -> Box<dyn Storage> {
        self.config.open_store(Some(preference)).unwrap()
    }
}

#[test]
fn test_env_backends_share_data() {
    let env = TestEnv::new();
    let mut engine = env.store_with(BackendPreference::Engine);
    engine
        .add_category(&crate::model::Category::new("Food", "", "#fff"))
        .unwrap();
    drop(engine);
    let document = env.store_with(BackendPreference::Document);
    assert_eq!(document.categories().len(), 1);
    assert_eq!(env.config().backend(), BackendPreference::Auto);
}
