//! Configuration loading with the `config` crate.
//!
//! Layers, lowest precedence first: built-in defaults, an optional file
//! (`wrike.toml`, `wrike.yaml` or `wrike.json` in the working directory,
//! or an explicit path), then `WRIKE_*` environment variables.

use std::collections::HashMap;
use std::path::PathBuf;

use config::{Config, Environment, File};
use wrike_application::GatewayConfig;

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An explicitly requested file does not exist.
    #[error("configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// A source could not be read or did not match the expected shape.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// Builder for a layered `GatewayConfig`.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    env: Option<HashMap<String, String>>,
}

impl ConfigLoader {
    /// Environment variable prefix.
    pub const ENV_PREFIX: &'static str = "WRIKE";

    /// Default file stem looked up in the working directory.
    pub const DEFAULT_FILE: &'static str = "wrike";

    /// Creates a loader using the default file and the process environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `path` instead of the default file. The file must exist.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Reads `WRIKE_*` variables from `vars` instead of the process
    /// environment.
    #[must_use]
    pub fn with_env_vars(mut self, vars: HashMap<String, String>) -> Self {
        self.env = Some(vars);
        self
    }

    /// Loads and merges all layers.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` for a missing explicit file and
    /// `ConfigError::Load` for unreadable or mistyped sources.
    pub fn load(self) -> Result<GatewayConfig, ConfigError> {
        let file = match self.file {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path));
                }
                File::from(path).required(true)
            }
            None => File::with_name(Self::DEFAULT_FILE).required(false),
        };

        // No `try_parsing`: a secret such as `0042` must stay a string.
        let environment = Environment::with_prefix(Self::ENV_PREFIX).source(self.env);

        let config: GatewayConfig = Config::builder()
            .add_source(file)
            .add_source(environment)
            .build()?
            .try_deserialize()?;

        tracing::debug!(
            client_id = %config.client_id,
            callback_port = config.callback_port,
            token_file = ?config.token_file,
            "configuration loaded"
        );
        Ok(config)
    }
}
