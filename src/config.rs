//! Client configuration.
//!
//! [`ConfigLoader::resolve`] picks the first source that applies:
//!
//! 1. endpoint and token passed explicitly,
//! 2. an explicit config file path,
//! 3. the file named by `MLPLATFORM_CONFIG_FILE`,
//! 4. `MLPLATFORM_ENDPOINT` + `MLPLATFORM_API_TOKEN`,
//! 5. `<config dir>/mlplatform/mlpconfig.yaml`.
//!
//! An explicit endpoint or token on its own overrides the matching field of
//! whichever source was picked.
//!
//! The process-wide default slot at the bottom of this module exists for the
//! outermost application layer only. Nothing in the core reads it.

use crate::error::ConfigError;
use crate::network::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_CONNECT_TIMEOUT_SECS, ENV_API_TOKEN,
    ENV_CONFIG_FILE, ENV_ENDPOINT,
};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

/// Resolved connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub endpoint: String,
    pub token: String,
    /// Seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: f64,
    #[serde(default = "default_ssl_verify")]
    pub ssl_verify: bool,
    /// Retry budget for idempotent requests; `None` keeps the transport default.
    #[serde(default)]
    pub max_retries: Option<u32>,
    #[serde(default)]
    pub user_agent_suffix: Option<String>,
}

fn default_connect_timeout() -> f64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

fn default_ssl_verify() -> bool {
    true
}

impl ClientConfig {
    pub fn new(endpoint: &str, token: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            token: token.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT_SECS,
            ssl_verify: true,
            max_retries: None,
            user_agent_suffix: None,
        }
    }

    /// Read a YAML config file. Unknown keys are ignored.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        ConfigFile::read(path)?.into_config(None, None)
    }
}

/// On-disk shape: every key optional so explicit arguments can fill gaps.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    endpoint: Option<String>,
    token: Option<String>,
    connect_timeout: Option<f64>,
    ssl_verify: Option<bool>,
    max_retries: Option<u32>,
    user_agent_suffix: Option<String>,
}

impl ConfigFile {
    fn read(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        if contents.trim().is_empty() {
            return Ok(ConfigFile::default());
        }
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Yaml {
            path: display,
            source,
        })
    }

    fn into_config(
        self,
        endpoint: Option<String>,
        token: Option<String>,
    ) -> Result<ClientConfig, ConfigError> {
        let endpoint = endpoint
            .or(self.endpoint)
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingEndpoint)?;
        let token = token
            .or(self.token)
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingToken)?;
        Ok(ClientConfig {
            endpoint,
            token,
            connect_timeout: self.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
            ssl_verify: self.ssl_verify.unwrap_or(true),
            max_retries: self.max_retries,
            user_agent_suffix: self.user_agent_suffix,
        })
    }
}

// ─── Loader ──────────────────────────────────────────────────────────────────

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Resolves a [`ClientConfig`] from arguments, files and the environment.
pub struct ConfigLoader {
    endpoint: Option<String>,
    token: Option<String>,
    config_path: Option<PathBuf>,
    default_dir: Option<PathBuf>,
    env: EnvLookup,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self {
            endpoint: None,
            token: None,
            config_path: None,
            default_dir: dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME)),
            env: Box::new(|key| std::env::var(key).ok()),
        }
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = Some(endpoint.to_string());
        self
    }

    pub fn token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    pub fn config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Directory searched for `mlpconfig.yaml` when nothing else applies.
    pub fn default_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.default_dir = Some(dir.into());
        self
    }

    /// Replace the environment lookup.
    pub fn env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Box::new(lookup);
        self
    }

    fn env_var(&self, key: &str) -> Option<String> {
        (self.env)(key).filter(|v| !v.trim().is_empty())
    }

    pub fn resolve(self) -> Result<ClientConfig, ConfigError> {
        let endpoint = self.endpoint.clone();
        let token = self.token.clone();

        if let (Some(endpoint), Some(token)) = (&endpoint, &token) {
            return ConfigFile::default().into_config(Some(endpoint.clone()), Some(token.clone()));
        }

        if let Some(path) = &self.config_path {
            tracing::debug!(path = %path.display(), "Loading config from explicit path");
            return ConfigFile::read(path)?.into_config(endpoint, token);
        }

        if let Some(path) = self.env_var(ENV_CONFIG_FILE) {
            let path = PathBuf::from(path);
            if path.exists() {
                tracing::debug!(path = %path.display(), "Loading config from {}", ENV_CONFIG_FILE);
                return ConfigFile::read(&path)?.into_config(endpoint, token);
            }
            tracing::warn!(
                path = %path.display(),
                "{} points at a missing file; ignoring it",
                ENV_CONFIG_FILE
            );
        }

        let env_endpoint = self.env_var(ENV_ENDPOINT);
        let env_token = self.env_var(ENV_API_TOKEN);
        if env_endpoint.is_some() && env_token.is_some() {
            return ConfigFile::default()
                .into_config(endpoint.or(env_endpoint), token.or(env_token));
        }

        if let Some(dir) = &self.default_dir {
            let path = dir.join(CONFIG_FILE_NAME);
            if path.exists() {
                tracing::debug!(path = %path.display(), "Loading default config file");
                return ConfigFile::read(&path)?.into_config(endpoint, token);
            }
        }

        ConfigFile::default().into_config(endpoint.or(env_endpoint), token.or(env_token))
    }
}

// ─── Process-wide default ────────────────────────────────────────────────────

lazy_static! {
    static ref DEFAULT_CONFIG: RwLock<Option<ClientConfig>> = RwLock::new(None);
}

/// Install the process-wide default, returning the previous one.
///
/// Last writer wins: concurrent callers each replace the slot wholesale and
/// readers see whichever write landed last.
pub fn set_default_config(config: ClientConfig) -> Option<ClientConfig> {
    let mut slot = DEFAULT_CONFIG.write().unwrap_or_else(PoisonError::into_inner);
    slot.replace(config)
}

pub fn default_config() -> Option<ClientConfig> {
    DEFAULT_CONFIG
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

pub fn clear_default_config() -> Option<ClientConfig> {
    DEFAULT_CONFIG
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .take()
}
