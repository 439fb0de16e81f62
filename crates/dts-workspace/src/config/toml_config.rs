use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::search::find_in_ancestors;

/// The TOML configuration filename
pub const CONFIG_FILENAME: &str = ".dts-tools.toml";

/// Workspace configuration in TOML format
///
/// **Note**: It's up to the caller to check that the include paths exist.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct TomlConfig {
    pub include_paths: Option<Vec<PathBuf>>,
}

impl TomlConfig {
    /// Looks for [`CONFIG_FILENAME`] in `start` or its ancestors
    #[must_use]
    pub fn find_config(start: &Path) -> Option<PathBuf> {
        find_in_ancestors(start, CONFIG_FILENAME, Path::is_file)
    }

    /// Loads the config file at `path`
    ///
    /// Relative include paths are resolved against the directory of the config file.
    ///
    /// # Errors
    ///
    /// Fails when the file can't be read or isn't a valid config.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(&fs_err::read_to_string(path)?)?;

        let config_dir = path.parent().unwrap_or_else(|| Path::new(""));
        if let Some(include_paths) = &mut config.include_paths {
            for include_path in include_paths {
                *include_path = config_dir.join(&*include_path);
            }
        }

        Ok(config)
    }
}

/// Configuration errors encountered when loading the TOML config
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config")]
    Io(#[from] std::io::Error),

    #[error("Failed to deserialize config")]
    Toml(#[from] toml::de::Error),
}
