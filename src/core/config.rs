use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub eligibility: EligibilityConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: Option<u16>,
    pub unix_socket: Option<PathBuf>,
    #[serde(default = "default_num_threads")]
    pub num_threads: usize,
}

/// Cooldown windows in seconds
#[derive(Debug, Clone, Deserialize)]
pub struct EligibilityConfig {
    #[serde(default = "default_access_cooldown")]
    pub access_cooldown: i64,
    #[serde(default = "default_dispense_cooldown")]
    pub dispense_cooldown: i64,
}

impl Default for EligibilityConfig {
    fn default() -> Self {
        Self {
            access_cooldown: default_access_cooldown(),
            dispense_cooldown: default_dispense_cooldown(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Remote,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// JSON export used to seed the memory backend
    pub seed_path: Option<PathBuf>,
    /// Journal that makes memory-backend writes durable
    pub wal_path: Option<PathBuf>,
    /// Base URL of the remote document store
    pub endpoint: Option<String>,
    pub auth_token: Option<String>,
    #[serde(default = "default_storage_timeout")]
    pub timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            seed_path: None,
            wal_path: None,
            endpoint: None,
            auth_token: None,
            timeout_secs: default_storage_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_console")]
    pub console: bool,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SecurityConfig {
    /// Key required by `/metrics`; the endpoint refuses everyone when unset
    pub metrics_api_key: Option<String>,
}

// Default value functions
fn default_num_threads() -> usize {
    num_cpus::get()
}

fn default_access_cooldown() -> i64 {
    60
}

fn default_dispense_cooldown() -> i64 {
    43_200 // 12 hours
}

fn default_storage_timeout() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_console() -> bool {
    false
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config file")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        // Validate server config
        if self.server.port.is_none() && self.server.unix_socket.is_none() {
            bail!("Either port or unix_socket must be specified in server config");
        }

        if let Some(port) = self.server.port {
            if port == 0 {
                bail!("Server port must be greater than 0");
            }
        }

        if self.server.num_threads == 0 {
            bail!("num_threads must be greater than 0");
        }

        // Validate eligibility config
        if self.eligibility.access_cooldown < 0 {
            bail!("access_cooldown must be non-negative");
        }

        if self.eligibility.dispense_cooldown < 0 {
            bail!("dispense_cooldown must be non-negative");
        }

        // Validate storage config
        if self.storage.backend == StorageBackend::Remote {
            match &self.storage.endpoint {
                Some(endpoint) if !endpoint.is_empty() => {}
                _ => bail!("storage.endpoint must be set when backend is 'remote'"),
            }

            if self.storage.timeout_secs == 0 {
                bail!("storage.timeout_secs must be greater than 0");
            }
        }

        // Validate logging config
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            bail!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.logging.level
            );
        }

        let valid_formats = ["json", "console"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            bail!(
                "Invalid log format '{}'. Must be one of: json, console",
                self.logging.format
            );
        }

        if let Some(key) = &self.security.metrics_api_key {
            if key.is_empty() {
                bail!("metrics_api_key must not be empty when set");
            }
        }

        Ok(())
    }
}
