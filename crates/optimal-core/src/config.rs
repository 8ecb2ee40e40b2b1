use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{OptimalError, Result};

/// Environment variable holding the message API base URL.
pub const ENV_API_URL: &str = "NEXT_PUBLIC_API_URL";
/// Environment variable overriding the SQLite database location.
pub const ENV_SQLITE_FILE: &str = "SQLITE_FILE";
/// Environment variable for the Base Sepolia RPC endpoint.
pub const ENV_BASE_RPC_URL: &str = "BASE_RPC_URL";
/// Environment variable for the Base mainnet RPC endpoint.
pub const ENV_MAINNET_BASE_RPC_URL: &str = "MAINNET_BASE_RPC_URL";
/// Environment variable for the wallet-side RPC endpoint.
pub const ENV_RPC_URL: &str = "NEXT_PUBLIC_RPC_URL";
/// Environment variable selecting the agent the client talks to.
pub const ENV_AGENT_ID: &str = "OPTIMAL_AGENT_ID";

/// Top-level configuration for OptimalAI.
///
/// Loaded from `~/.optimal/config.toml` by default, then overlaid with
/// environment variables. Each section corresponds to one crate or
/// cross-cutting concern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptimalConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub demo: DemoConfig,
}

impl OptimalConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: OptimalConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Overlay values from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_from(|key| std::env::var(key).ok());
    }

    /// Overlay values from an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn apply_env_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_API_URL) {
            self.client.api_url = Some(url);
        }
        if let Some(id) = get(ENV_AGENT_ID) {
            self.client.agent_id = Some(id);
        }
        if let Some(file) = get(ENV_SQLITE_FILE) {
            self.storage.sqlite_file = Some(file);
        }
        if let Some(url) = get(ENV_BASE_RPC_URL) {
            self.chain.base_rpc_url = Some(url);
        }
        if let Some(url) = get(ENV_MAINNET_BASE_RPC_URL) {
            self.chain.mainnet_base_rpc_url = Some(url);
        }
        if let Some(url) = get(ENV_RPC_URL) {
            self.chain.rpc_url = Some(url);
        }
    }

    /// The message API base URL, or a configuration error when unset.
    pub fn require_api_url(&self) -> Result<&str> {
        self.client
            .api_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .ok_or_else(|| OptimalError::Config(format!("{} is not defined", ENV_API_URL)))
    }

    /// Resolve the SQLite database path.
    ///
    /// An explicit `sqlite_file` wins; otherwise `<data_dir>/db.sqlite`.
    pub fn sqlite_path(&self, data_dir: &Path) -> PathBuf {
        match self.storage.sqlite_file {
            Some(ref file) => PathBuf::from(file),
            None => data_dir.join("db.sqlite"),
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Data directory for the SQLite database.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// API server port.
    pub port: u16,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.optimal/data".to_string(),
            log_level: "info".to_string(),
            port: 3000,
        }
    }
}

/// Shape of the message endpoint path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientRoute {
    /// `POST {api_url}/{agent_id}/message`
    #[default]
    Agent,
    /// `POST {api_url}/messages`
    Messages,
}

/// Message client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the message API.
    pub api_url: Option<String>,
    /// Agent identifier used by the agent-scoped route.
    pub agent_id: Option<String>,
    /// Which route shape to use.
    pub route: ClientRoute,
}

/// Persistence configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Explicit SQLite file; defaults to `<data_dir>/db.sqlite`.
    pub sqlite_file: Option<String>,
}

/// Chain RPC endpoints handed to the wallet/chain libraries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    pub base_rpc_url: Option<String>,
    pub mainnet_base_rpc_url: Option<String>,
    pub rpc_url: Option<String>,
}

/// Demo-mode conversation replay settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Serve the scripted conversation from the message endpoint.
    pub enabled: bool,
    /// Delay before the first batch of a conversation.
    pub initial_delay_ms: u64,
    /// Lower bound of the delay between entries of one batch.
    pub min_delay_ms: u64,
    /// Upper bound of the delay between entries of one batch.
    pub max_delay_ms: u64,
    /// Conversations kept at once; the least recently used is evicted.
    pub max_sessions: usize,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            initial_delay_ms: 2000,
            min_delay_ms: 500,
            max_delay_ms: 1500,
            max_sessions: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn env_of(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_default_config() {
        let config = OptimalConfig::default();
        assert_eq!(config.general.data_dir, "~/.optimal/data");
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.port, 3000);
        assert!(config.client.api_url.is_none());
        assert_eq!(config.client.route, ClientRoute::Agent);
        assert!(config.demo.enabled);
        assert_eq!(config.demo.initial_delay_ms, 2000);
        assert_eq!(config.demo.min_delay_ms, 500);
        assert_eq!(config.demo.max_delay_ms, 1500);
        assert_eq!(config.demo.max_sessions, 1024);
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[general]
data_dir = "/custom/data"
log_level = "debug"
port = 8080

[client]
api_url = "http://localhost:3000"
agent_id = "agent-1"
route = "messages"

[demo]
enabled = false
initial_delay_ms = 10
max_sessions = 8
"#;
        let file = create_temp_config(content);
        let config = OptimalConfig::load(file.path()).unwrap();
        assert_eq!(config.general.data_dir, "/custom/data");
        assert_eq!(config.general.port, 8080);
        assert_eq!(config.client.api_url.as_deref(), Some("http://localhost:3000"));
        assert_eq!(config.client.agent_id.as_deref(), Some("agent-1"));
        assert_eq!(config.client.route, ClientRoute::Messages);
        assert!(!config.demo.enabled);
        assert_eq!(config.demo.initial_delay_ms, 10);
        assert_eq!(config.demo.max_sessions, 8);
        // Unset fields in a present section keep their defaults
        assert_eq!(config.demo.max_delay_ms, 1500);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = OptimalConfig::load_or_default(Path::new("/nonexistent/config.toml"));
        assert_eq!(config.general.data_dir, "~/.optimal/data");
    }

    #[test]
    fn test_load_invalid_toml() {
        let file = create_temp_config("this is {{ not valid TOML");
        assert!(OptimalConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_save_creates_parent_dirs_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.toml");

        let mut config = OptimalConfig::default();
        config.client.api_url = Some("http://api.test".to_string());
        config.save(&path).unwrap();

        let reloaded = OptimalConfig::load(&path).unwrap();
        assert_eq!(reloaded.client.api_url.as_deref(), Some("http://api.test"));
        assert_eq!(reloaded.general.port, 3000);
    }

    #[test]
    fn test_env_overrides() {
        let env = env_of(&[
            (ENV_API_URL, "http://localhost:3000/"),
            (ENV_SQLITE_FILE, "/tmp/optimal.sqlite"),
            (ENV_BASE_RPC_URL, "https://sepolia.base.org"),
            (ENV_MAINNET_BASE_RPC_URL, "https://mainnet.base.org"),
            (ENV_RPC_URL, "https://rpc.example"),
            (ENV_AGENT_ID, "416659f6"),
        ]);
        let mut config = OptimalConfig::default();
        config.apply_env_overrides_from(|k| env.get(k).cloned());

        assert_eq!(config.require_api_url().unwrap(), "http://localhost:3000");
        assert_eq!(
            config.storage.sqlite_file.as_deref(),
            Some("/tmp/optimal.sqlite")
        );
        assert_eq!(
            config.chain.base_rpc_url.as_deref(),
            Some("https://sepolia.base.org")
        );
        assert_eq!(
            config.chain.mainnet_base_rpc_url.as_deref(),
            Some("https://mainnet.base.org")
        );
        assert_eq!(config.chain.rpc_url.as_deref(), Some("https://rpc.example"));
        assert_eq!(config.client.agent_id.as_deref(), Some("416659f6"));
    }

    #[test]
    fn test_empty_env_value_is_ignored() {
        let env = env_of(&[(ENV_API_URL, "  ")]);
        let mut config = OptimalConfig::default();
        config.client.api_url = Some("http://from-file".to_string());
        config.apply_env_overrides_from(|k| env.get(k).cloned());
        assert_eq!(config.require_api_url().unwrap(), "http://from-file");
    }

    #[test]
    fn test_missing_api_url_is_config_error() {
        let config = OptimalConfig::default();
        let err = config.require_api_url().unwrap_err();
        assert!(matches!(err, OptimalError::Config(_)));
        assert!(err.to_string().contains(ENV_API_URL));
    }

    #[test]
    fn test_sqlite_path_resolution() {
        let mut config = OptimalConfig::default();
        let data_dir = Path::new("/var/lib/optimal");
        assert_eq!(
            config.sqlite_path(data_dir),
            PathBuf::from("/var/lib/optimal/db.sqlite")
        );

        config.storage.sqlite_file = Some("/tmp/other.sqlite".to_string());
        assert_eq!(
            config.sqlite_path(data_dir),
            PathBuf::from("/tmp/other.sqlite")
        );
    }
}
