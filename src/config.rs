use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::domain::id_generator::{MAX_DATACENTER_ID, MAX_WORKER_ID};

const REDACTED: &str = "********";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub security: SecurityConfig,

    pub id_generator: IdGeneratorConfig,

    pub ai: AiConfig,

    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// `pretty` or `json`
    pub log_format: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,

    /// Load the demo wizards, artifacts and users into an empty database
    pub seed_demo_data: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/artifacts.db".to_string(),
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
            seed_demo_data: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    /// Prefix for every catalog endpoint, e.g. `/api/v1`
    pub base_path: String,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            base_path: "/api/v1".to_string(),
            cors_allowed_origins: vec![
                "http://localhost:8080".to_string(),
                "http://127.0.0.1:8080".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,

    /// `iss` claim written into access tokens
    pub token_issuer: String,

    /// Access token lifetime
    pub token_ttl_hours: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            token_issuer: "self".to_string(),
            token_ttl_hours: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdGeneratorConfig {
    pub datacenter_id: u64,
    pub worker_id: u64,
}

impl Default for IdGeneratorConfig {
    fn default() -> Self {
        Self {
            datacenter_id: 1,
            worker_id: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// OpenAI-compatible chat completions URL
    pub endpoint: String,

    pub api_key: String,

    pub model: String,

    pub request_timeout_seconds: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key: String::new(),
            model: "gpt-3.5-turbo".to_string(),
            request_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Local,
    Azure,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    /// Directory uploaded images are written to (local backend)
    pub images_path: String,

    /// URL prefix under which `images_path` is served (local backend)
    pub public_base_url: String,

    /// Blob service account URL, e.g. `https://acct.blob.core.windows.net`
    pub account_url: String,

    /// Shared access signature appended to blob requests
    pub sas_token: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Local,
            images_path: "data/images".to_string(),
            public_base_url: "http://localhost:8080/images".to_string(),
            account_url: String::new(),
            sas_token: String::new(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        let mut config = None;
        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                config = Some(Self::load_from_path(path)?);
                break;
            }
        }

        let mut config = config.unwrap_or_else(|| {
            info!("No config file found, using defaults");
            Self::default()
        });
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Secrets and the database location may come from the environment
    /// instead of the config file.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("AI_API_KEY").filter(|v| !v.is_empty()) {
            self.ai.api_key = key;
        }
        if let Some(token) = lookup("STORAGE_SAS_TOKEN").filter(|v| !v.is_empty()) {
            self.storage.sas_token = token;
        }
        if let Some(url) = lookup("DATABASE_URL").filter(|v| !v.is_empty()) {
            self.general.database_path = url;
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("artifacts-online").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".artifacts-online").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.id_generator.datacenter_id > MAX_DATACENTER_ID {
            anyhow::bail!(
                "id_generator.datacenter_id must be between 0 and {MAX_DATACENTER_ID}"
            );
        }

        if self.id_generator.worker_id > MAX_WORKER_ID {
            anyhow::bail!("id_generator.worker_id must be between 0 and {MAX_WORKER_ID}");
        }

        if !self.server.base_path.starts_with('/') {
            anyhow::bail!("server.base_path must start with '/'");
        }

        if self.security.token_ttl_hours == 0 {
            anyhow::bail!("security.token_ttl_hours must be > 0");
        }

        if self.storage.backend == StorageBackend::Azure {
            if self.storage.account_url.is_empty() {
                anyhow::bail!("storage.account_url cannot be empty when the azure backend is used");
            }
            url::Url::parse(&self.storage.account_url)
                .context("storage.account_url is not a valid URL")?;
        }

        url::Url::parse(&self.ai.endpoint).context("ai.endpoint is not a valid URL")?;

        Ok(())
    }

    /// Copy of the config that is safe to show to operators.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if !config.ai.api_key.is_empty() {
            config.ai.api_key = REDACTED.to_string();
        }
        if !config.storage.sas_token.is_empty() {
            config.storage.sas_token = REDACTED.to_string();
        }
        config
    }

    /// Base path without a trailing slash; `/` becomes the empty prefix.
    #[must_use]
    pub fn base_path(&self) -> &str {
        self.server.base_path.trim_end_matches('/')
    }
}
