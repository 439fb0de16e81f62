//! Include path configuration for Devicetree source tools, layered from command-line flags,
//! `DTS_TOOLS_*` environment variables and a `.dts-tools.toml` file.

use std::path::PathBuf;

#[cfg(feature = "cli")]
use config::cli_config::CliConfig;
use config::{
    env_config::EnvConfig,
    toml_config::{ConfigError, TomlConfig},
    CombinedConfig,
};
use thiserror::Error;
use tracing::debug;

pub mod config;
mod search;

#[derive(Debug)]
pub struct Workspace {
    /// Directory the config file search started from
    pub path: PathBuf,

    /// The config file found in `path` or its ancestors
    pub config_path: Option<PathBuf>,

    pub toml: Option<TomlConfig>,
}

impl Workspace {
    /// Opens the workspace containing `path`, loading the nearest `.dts-tools.toml`.
    ///
    /// # Errors
    ///
    /// Fails when a config file is found but can't be loaded.
    pub fn try_new(path: PathBuf) -> Result<Self, WorkspaceError> {
        let config_path = TomlConfig::find_config(&path);
        let toml = match config_path.as_deref().map(TomlConfig::load) {
            None => None,
            Some(Ok(config)) => Some(config),
            // removed between finding and reading it
            Some(Err(ConfigError::Io(err))) if err.kind() == std::io::ErrorKind::NotFound => None,
            Some(Err(err)) => return Err(err.into()),
        };
        debug!(path = %path.display(), config = ?config_path, "Opened workspace");
        Ok(Self {
            path,
            config_path,
            toml,
        })
    }

    /// Combines `cli` and `env` with this workspace's config file.
    #[must_use]
    pub fn combine(
        &self,
        #[cfg(feature = "cli")] cli: Option<CliConfig>,
        env: Option<EnvConfig>,
    ) -> CombinedConfig {
        let config = CombinedConfig::merge(
            #[cfg(feature = "cli")]
            cli,
            env,
            self.toml.clone(),
        );
        debug!(
            include_paths = ?config.include_paths(),
            source = ?config.include_paths_source(),
            "Resolved include paths"
        );
        config
    }

    /// Like [`Workspace::combine`], reading the environment layer from the process environment.
    ///
    /// # Errors
    ///
    /// Fails when a `DTS_TOOLS_*` variable can't be deserialized.
    pub fn combined_config(
        &self,
        #[cfg(feature = "cli")] cli: Option<CliConfig>,
    ) -> Result<CombinedConfig, WorkspaceError> {
        let env = EnvConfig::from_env()?;
        Ok(self.combine(
            #[cfg(feature = "cli")]
            cli,
            Some(env),
        ))
    }
}

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("Failed to load config")]
    Config(#[from] ConfigError),

    #[error("Invalid environment configuration")]
    Env(#[from] envy::Error),
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::config::ConfigSource;
    use pretty_assertions::assert_eq;

    fn combine(workspace: &Workspace) -> CombinedConfig {
        workspace.combine(
            #[cfg(feature = "cli")]
            None,
            None,
        )
    }

    #[test]
    fn load() {
        let workspace = Workspace::try_new(PathBuf::from("test_data")).unwrap();
        let config = combine(&workspace);
        assert_eq!(config.include_paths(), [Path::new("test_data").join(".")]);
        assert_eq!(config.include_paths_source(), ConfigSource::Toml);
    }

    #[test]
    fn load_ancestor() {
        let workspace = Workspace::try_new(Path::new("test_data").join("empty")).unwrap();
        assert_eq!(
            workspace.config_path,
            Some(Path::new("test_data").join(".dts-tools.toml"))
        );

        // this is equal to `Workspace::try_new(PathBuf::from("."))`
        // because `not_exists` has no config and we fall back to its ancestor
        let workspace = Workspace::try_new(PathBuf::from("not_exists")).unwrap();
        assert_eq!(combine(&workspace).include_paths(), [PathBuf::from("test_data")]);
    }

    #[test]
    fn env_overrides_toml() {
        let workspace = Workspace::try_new(PathBuf::from("test_data")).unwrap();
        let config = workspace.combine(
            #[cfg(feature = "cli")]
            None,
            Some(EnvConfig {
                include_paths: Some(vec!["from-env".into()]),
            }),
        );
        assert_eq!(config.include_paths(), [PathBuf::from("from-env")]);
    }

    #[test]
    fn invalid_config() {
        assert!(matches!(
            Workspace::try_new(Path::new("test_data").join("invalid")),
            Err(WorkspaceError::Config(ConfigError::Toml(_)))
        ));
    }
}
