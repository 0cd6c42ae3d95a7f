use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default number of HTTP worker threads
pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BIN_PATH: &str = "./bin/sc_serv";
pub const DEFAULT_CONFIGS_DIR: &str = "./var/config";
pub const DEFAULT_WORKING_DIR: &str = "./";

fn default_address() -> String {
    DEFAULT_ADDRESS.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_bin_path() -> PathBuf {
    PathBuf::from(DEFAULT_BIN_PATH)
}

fn default_configs_dir() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIGS_DIR)
}

fn default_working_dir() -> PathBuf {
    PathBuf::from(DEFAULT_WORKING_DIR)
}

/// How server processes are launched.
///
/// # Examples
///
/// ```
/// use galena::config::ShoutcastSettings;
///
/// let settings = ShoutcastSettings::default();
/// assert_eq!(settings.bin_path.to_str(), Some("./bin/sc_serv"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoutcastSettings {
    /// Path of the `sc_serv` executable.
    #[serde(default = "default_bin_path")]
    pub bin_path: PathBuf,

    /// Directory receiving one generated `{id}.config` file per server.
    #[serde(default = "default_configs_dir")]
    pub configs_dir: PathBuf,

    /// Working directory of spawned processes.
    #[serde(default = "default_working_dir")]
    pub working_dir: PathBuf,
}

impl Default for ShoutcastSettings {
    fn default() -> Self {
        Self {
            bin_path: default_bin_path(),
            configs_dir: default_configs_dir(),
            working_dir: default_working_dir(),
        }
    }
}

/// Main configuration for Galena.
///
/// # JSON Schema
///
/// ```json
/// {
///   "address": "0.0.0.0",
///   "port": 3000,
///   "workers": 4,
///   "db": "./var/servers.json",
///   "shoutcast": {
///     "binPath": "./bin/sc_serv",
///     "configsDir": "./var/config",
///     "workingDir": "./"
///   }
/// }
/// ```
///
/// Every field is optional. Without `db` servers are kept in memory only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Address the HTTP API binds to.
    #[serde(default = "default_address")]
    pub address: String,

    /// Port the HTTP API binds to.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of HTTP worker threads.
    #[serde(default)]
    pub workers: Option<usize>,

    /// Path of the JSON document store file.
    #[serde(default)]
    pub db: Option<PathBuf>,

    /// Process launch settings.
    #[serde(default)]
    pub shoutcast: ShoutcastSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
            workers: None,
            db: None,
            shoutcast: ShoutcastSettings::default(),
        }
    }
}

impl Config {
    /// Loads a configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * The file cannot be read
    /// * The file contents are not valid JSON
    /// * The JSON does not conform to the expected schema
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigParse(format!("Failed to read config file: {}", e)))?;

        Self::parse_from_str(&content)
    }

    /// Parses a configuration from a JSON string.
    pub fn parse_from_str(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| Error::ConfigParse(format!("Failed to parse JSON config: {}", e)))
    }

    /// Worker count, falling back to [`DEFAULT_WORKERS`]
    pub fn workers(&self) -> usize {
        self.workers.unwrap_or(DEFAULT_WORKERS)
    }

    /// `address:port` of the HTTP API
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}
