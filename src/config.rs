use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::providers::gitlab::ClientOptions;

const FILE_STEM: &str = "gitlab-mcp";

/// Configuration file structure for the GitLab MCP server.
///
/// Every field has a default, so a partial file (or none at all) is valid.
/// Command-line flags and environment variables take precedence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub gitlab: GitLabConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GitLabConfig {
    /// GitLab personal access token
    pub token: Option<String>,

    /// GitLab instance base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Retries for rate-limited, 5xx, or timed-out requests
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServerConfig {
    /// Name reported to MCP clients during `initialize`
    #[serde(default = "default_server_name")]
    pub name: String,
}

impl Default for GitLabConfig {
    fn default() -> Self {
        Self {
            token: None,
            base_url: default_base_url(),
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
        }
    }
}

fn default_base_url() -> String {
    "https://gitlab.com".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_secs() -> u64 {
    5
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_server_name() -> String {
    "GitLab Project Manager".to_string()
}

impl GitLabConfig {
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            timeout: Duration::from_secs(self.timeout_secs),
            max_retries: self.max_retries,
            retry_delay: Duration::from_secs(self.retry_delay_secs),
        }
    }
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./gitlab-mcp.toml, ./gitlab-mcp.json, ./gitlab-mcp.yaml, ./gitlab-mcp.yml
    /// 3. `<config dir>/gitlab-mcp/config.toml`
    ///
    /// Returns default configuration if no file is found. A specified path
    /// that does not exist is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        Self::load_from_dir(Path::new("."))
    }

    fn load_from_dir(dir: &Path) -> Result<Self> {
        let local = ["toml", "json", "yaml", "yml"]
            .iter()
            .map(|ext| dir.join(format!("{FILE_STEM}.{ext}")));

        for path in local.chain(user_config_path()) {
            if path.exists() {
                log::debug!("Loading configuration from {}", path.display());
                return Self::load_from_path(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file path.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .with_context(|| format!("Failed to parse config file: {}", path.display())),
        }
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(FILE_STEM).join("config.toml"))
}
