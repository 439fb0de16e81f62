use std::path::PathBuf;

use serde::Deserialize;

/// Prefix of the environment variables read by [`EnvConfig::from_env`]
pub const ENV_PREFIX: &str = "DTS_TOOLS_";

/// Workspace configuration using environment variables
#[derive(Debug, PartialEq, Eq, Deserialize)]
pub struct EnvConfig {
    /// `DTS_TOOLS_INCLUDE_PATHS`, comma separated
    pub include_paths: Option<Vec<PathBuf>>,
}

impl EnvConfig {
    /// Retrieves configuration from environment variables prefixed with [`ENV_PREFIX`]
    ///
    /// # Errors
    ///
    /// Fails when a variable is set but can't be deserialized.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed(ENV_PREFIX).from_env()
    }
}
