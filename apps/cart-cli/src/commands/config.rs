//! # Config Commands
//!
//! Inspect the effective configuration. These run without a cart store.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::state::ConfigState;

/// Returns the effective configuration (file + environment + defaults).
pub fn show_config(config: &ConfigState) -> ConfigState {
    debug!("show_config command");
    config.clone()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigPaths {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    pub config_file_exists: bool,
    pub data_dir: PathBuf,
}

/// Where configuration is read from and where data is written.
pub fn config_paths(config: &ConfigState, explicit: Option<&Path>) -> ConfigPaths {
    debug!("config_paths command");
    let config_file = explicit
        .map(Path::to_path_buf)
        .or_else(ConfigState::default_config_path);
    let config_file_exists = config_file.as_deref().is_some_and(Path::exists);

    ConfigPaths {
        config_file,
        config_file_exists,
        data_dir: config.data_dir(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storefront.toml");
        std::fs::write(&path, "").unwrap();

        let mut config = ConfigState::default();
        config.storage.data_dir = Some(dir.path().to_path_buf());

        let paths = config_paths(&config, Some(&path));
        assert_eq!(paths.config_file.as_deref(), Some(path.as_path()));
        assert!(paths.config_file_exists);
        assert_eq!(paths.data_dir, dir.path());
    }

    #[test]
    fn test_show_config_is_a_copy() {
        let config = ConfigState::default();
        assert_eq!(show_config(&config), config);
    }
}
