use std::path::PathBuf;

#[cfg(feature = "cli")]
use cli_config::CliConfig;
use env_config::EnvConfig;
use toml_config::TomlConfig;

#[cfg(feature = "cli")]
pub mod cli_config;
pub mod env_config;
pub mod toml_config;

/// Layer a [`CombinedConfig`] field was taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigSource {
    Cli,
    Env,
    Toml,
    #[default]
    Default,
}

/// A composite configuration from multiple sources with following ordering:
///
/// - `CliConfig` (if `cli` feature is enabled)
/// - [`EnvConfig`]
/// - [`TomlConfig`]
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CombinedConfig {
    include_paths: Vec<PathBuf>,
    include_paths_source: ConfigSource,
}

impl CombinedConfig {
    /// Merges `CliConfig` (if `cli` feature is enabled), [`EnvConfig`] and [`TomlConfig`]
    ///
    /// Each field is taken from the first layer that sets it.
    #[must_use]
    pub fn merge(
        #[cfg(feature = "cli")] cli: Option<CliConfig>,
        env: Option<EnvConfig>,
        toml: Option<TomlConfig>,
    ) -> Self {
        #[cfg(feature = "cli")]
        let cli = cli.and_then(|cli| cli.include_paths);
        #[cfg(not(feature = "cli"))]
        let cli: Option<Vec<PathBuf>> = None;

        let (source, include_paths) = [
            (ConfigSource::Cli, cli),
            (ConfigSource::Env, env.and_then(|env| env.include_paths)),
            (ConfigSource::Toml, toml.and_then(|toml| toml.include_paths)),
        ]
        .into_iter()
        .find_map(|(source, value)| value.map(|value| (source, value)))
        .unwrap_or((ConfigSource::Default, Vec::new()));

        Self {
            include_paths,
            include_paths_source: source,
        }
    }

    /// Directories searched for `/include/` files, in order
    #[must_use]
    pub fn include_paths(&self) -> &[PathBuf] {
        &self.include_paths
    }

    #[must_use]
    pub fn into_include_paths(self) -> Vec<PathBuf> {
        self.include_paths
    }

    /// Where [`CombinedConfig::include_paths`] came from
    #[must_use]
    pub fn include_paths_source(&self) -> ConfigSource {
        self.include_paths_source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn env(paths: &[&str]) -> EnvConfig {
        EnvConfig {
            include_paths: Some(paths.iter().map(PathBuf::from).collect()),
        }
    }

    fn toml(paths: &[&str]) -> TomlConfig {
        TomlConfig {
            include_paths: Some(paths.iter().map(PathBuf::from).collect()),
        }
    }

    #[test]
    fn merge() {
        #[cfg(feature = "cli")]
        let cli = CliConfig {
            include_paths: Some(vec!["cli".into()]),
        };

        let merged = CombinedConfig::merge(
            #[cfg(feature = "cli")]
            Some(cli),
            Some(env(&["env"])),
            Some(toml(&["toml"])),
        );
        let expected = if cfg!(feature = "cli") { "cli" } else { "env" };
        assert_eq!(merged.include_paths(), [PathBuf::from(expected)]);
        assert_eq!(
            merged.include_paths_source(),
            if cfg!(feature = "cli") {
                ConfigSource::Cli
            } else {
                ConfigSource::Env
            }
        );
    }

    #[test]
    fn merge_falls_through_unset_layers() {
        let merged = CombinedConfig::merge(
            #[cfg(feature = "cli")]
            Some(CliConfig {
                include_paths: None,
            }),
            Some(EnvConfig {
                include_paths: None,
            }),
            Some(toml(&["a", "b"])),
        );
        assert_eq!(merged.include_paths_source(), ConfigSource::Toml);
        assert_eq!(
            merged.into_include_paths(),
            vec![PathBuf::from("a"), PathBuf::from("b")]
        );
    }

    #[test]
    fn merge_nothing() {
        let merged = CombinedConfig::merge(
            #[cfg(feature = "cli")]
            None,
            None,
            None,
        );
        assert_eq!(merged.include_paths_source(), ConfigSource::Default);
        assert!(merged.include_paths().is_empty());
    }
}
