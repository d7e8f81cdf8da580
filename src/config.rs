use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Environment variable naming a YAML configuration file.
pub const CONFIG_ENV: &str = "WEBLET_CONFIG";
/// Environment variable overriding `server.port`.
pub const PORT_ENV: &str = "WEBLET_PORT";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub limits: LimitsConfig,
}

/// Listener and runtime settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port specification handed to `listen_on_port` by the binary.
    pub port: String,
    /// Host used when the port specification carries no host part.
    pub bind_host: String,
    /// Async workers driving the accept loop and request reads.
    pub worker_threads: usize,
    /// Upper bound on concurrently running handler call-outs.
    pub handler_threads: usize,
    /// How long `close()` waits for the listening socket to be released.
    pub shutdown_grace_ms: u64,
}

/// Per-request limits enforced by the engine before dispatch.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_request_bytes: usize,
    pub max_headers: usize,
    pub read_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: "8080".to_string(),
            bind_host: "127.0.0.1".to_string(),
            worker_threads: 2,
            handler_threads: 16,
            shutdown_grace_ms: 1000,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_request_bytes: 64 * 1024,
            max_headers: 64,
            read_timeout_ms: 10_000,
        }
    }
}

impl Config {
    /// Loads the configuration from the process environment.
    ///
    /// Reads the YAML file named by `WEBLET_CONFIG` when set, then applies
    /// the `WEBLET_PORT` override.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::load`], with variables resolved through `lookup`.
    pub fn load_from<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = match lookup(CONFIG_ENV) {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Some(port) = lookup(PORT_ENV) {
            cfg.server.port = port;
        }

        Ok(cfg)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.server.shutdown_grace_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.limits.read_timeout_ms)
    }
}
