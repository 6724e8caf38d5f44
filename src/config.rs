use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Default target of the `/api` dev proxy
pub const DEFAULT_PROXY_TARGET: &str = "http://localhost:8000";

/// Default port of the viewer server
pub const DEFAULT_PORT: u16 = 5173;

/// Configuration for the video catalog viewer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Catalog backend settings
    pub api: ApiConfig,

    /// Query cache settings
    pub cache: CacheConfig,

    /// Viewer server settings
    pub server: ServerConfig,

    /// Logging settings
    pub logging: LoggingConfig,

    /// Theme overrides keyed by theme key (e.g. `accent`)
    pub theme: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the catalog backend; the proxy target is used when unset
    pub base_url: Option<String>,

    /// Records requested per page
    pub page_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long a successful result counts as fresh
    pub stale_time_secs: u64,

    /// Entries untouched for this long are dropped by the cleanup task (0 = never)
    pub cleanup_after_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port the viewer listens on
    pub port: u16,

    /// Backend that `/api/*` requests are forwarded to
    pub proxy_target: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or `EnvFilter` directive
    pub level: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            page_size: catalog_core::DEFAULT_PAGE_SIZE,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_time_secs: 30,
            cleanup_after_secs: 300, // 5 minutes
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            proxy_target: DEFAULT_PROXY_TARGET.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        let config_paths = ["video-catalog.toml", "config/video-catalog.toml"];

        for path in &config_paths {
            if Path::new(path).exists() {
                match Self::from_file(path) {
                    Ok(config) => return Ok(config),
                    Err(e) => tracing::warn!("Failed to parse config file {}: {:#}", path, e),
                }
            }
        }

        Self::from_env()
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file {}", path.display()))?;
        let mut config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Invalid config file {}", path.display()))?;

        config.apply_env(|name| std::env::var(name).ok())?;
        tracing::info!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Override fields from `CATALOG_*` variables looked up through `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        // an empty value counts as unset so the proxy target stays in charge
        if let Some(base_url) = lookup("CATALOG_API_BASE_URL").filter(|v| !v.trim().is_empty()) {
            self.api.base_url = Some(base_url);
        }

        if let Some(target) = lookup("CATALOG_DEV_PROXY_TARGET") {
            self.server.proxy_target = target;
        }

        if let Some(port) = lookup("CATALOG_DEV_SERVER_PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("CATALOG_DEV_SERVER_PORT is not a port: {}", port))?;
        }

        if let Some(size) = lookup("CATALOG_PAGE_SIZE") {
            self.api.page_size = size
                .parse()
                .with_context(|| format!("CATALOG_PAGE_SIZE is not a number: {}", size))?;
        }

        if let Some(secs) = lookup("CATALOG_STALE_TIME_SECS") {
            self.cache.stale_time_secs = secs
                .parse()
                .with_context(|| format!("CATALOG_STALE_TIME_SECS is not a number: {}", secs))?;
        }

        if let Some(level) = lookup("CATALOG_LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.api.page_size == 0 {
            return Err(anyhow!("page_size must be greater than 0"));
        }

        if self.server.port == 0 {
            return Err(anyhow!("port must be greater than 0"));
        }

        Url::parse(&self.server.proxy_target)
            .with_context(|| format!("Invalid proxy target: {}", self.server.proxy_target))?;

        if let Some(base_url) = &self.api.base_url {
            Url::parse(base_url).with_context(|| format!("Invalid API base URL: {}", base_url))?;
        }

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }

    /// Backend base URL, falling back to the proxy target
    pub fn api_base_url(&self) -> &str {
        self.api
            .base_url
            .as_deref()
            .unwrap_or(&self.server.proxy_target)
    }

    pub fn stale_time(&self) -> Duration {
        Duration::from_secs(self.cache.stale_time_secs)
    }

    /// Idle time after which cache entries are dropped, `None` when disabled
    pub fn cleanup_after(&self) -> Option<Duration> {
        (self.cache.cleanup_after_secs > 0).then(|| Duration::from_secs(self.cache.cleanup_after_secs))
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "Video Catalog Configuration:\n\
            - API Base URL: {}\n\
            - Page Size: {}\n\
            - Stale Time: {}s\n\
            - Server Port: {}\n\
            - Proxy Target: {}\n\
            - Theme Overrides: {}",
            self.api_base_url(),
            self.api.page_size,
            self.cache.stale_time_secs,
            self.server.port,
            self.server.proxy_target,
            self.theme.len()
        )
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.api.base_url = Some(base_url.into());
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.config.api.page_size = page_size;
        self
    }

    pub fn with_stale_time_secs(mut self, secs: u64) -> Self {
        self.config.cache.stale_time_secs = secs;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn with_proxy_target(mut self, target: impl Into<String>) -> Self {
        self.config.server.proxy_target = target.into();
        self
    }

    pub fn with_theme_override(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.theme.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.page_size, 20);
        assert_eq!(config.server.port, 5173);
        assert_eq!(config.api_base_url(), "http://localhost:8000");
        assert_eq!(config.stale_time(), Duration::from_secs(30));
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .with_base_url("https://catalog.example.com")
            .with_page_size(12)
            .with_port(8080)
            .with_theme_override("accent", "#000000")
            .build();

        assert_eq!(config.api_base_url(), "https://catalog.example.com");
        assert_eq!(config.api.page_size, 12);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.theme.get("accent").map(String::as_str), Some("#000000"));
    }

    #[test]
    fn test_config_validation() {
        assert!(Config::default().validate().is_ok());
        assert!(ConfigBuilder::new().with_page_size(0).build().validate().is_err());
        assert!(ConfigBuilder::new().with_port(0).build().validate().is_err());
        assert!(ConfigBuilder::new()
            .with_base_url("not a url")
            .build()
            .validate()
            .is_err());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("CATALOG_DEV_PROXY_TARGET", "http://backend:9000"),
            ("CATALOG_DEV_SERVER_PORT", "3000"),
            ("CATALOG_PAGE_SIZE", "50"),
            ("CATALOG_LOG_LEVEL", "debug"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_env(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.api_base_url(), "http://backend:9000");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.api.page_size, 50);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_bad_env_value_is_rejected() {
        let mut config = Config::default();
        let result = config.apply_env(|name| {
            (name == "CATALOG_DEV_SERVER_PORT").then(|| "eighty".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_base_url_falls_back_to_proxy_target() {
        let mut config = Config::default();
        config
            .apply_env(|name| match name {
                "CATALOG_API_BASE_URL" => Some("  ".to_string()),
                "CATALOG_DEV_PROXY_TARGET" => Some("http://backend:9000".to_string()),
                _ => None,
            })
            .unwrap();

        assert_eq!(config.api.base_url, None);
        assert_eq!(config.api_base_url(), "http://backend:9000");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("video-catalog.toml");
        std::fs::write(
            &path,
            "[api]\nbase_url = \"https://api.example.com\"\n\n[theme]\naccent = \"#123456\"\n",
        )
        .unwrap();

        let config: Config = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(config.api.base_url.as_deref(), Some("https://api.example.com"));
        assert_eq!(config.api.page_size, 20);
        assert_eq!(config.server.port, 5173);
        assert_eq!(config.theme.get("accent").map(String::as_str), Some("#123456"));
    }

    #[test]
    fn test_save_then_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.toml");
        let config = ConfigBuilder::new().with_page_size(7).build();

        config.save(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let loaded: Config = toml::from_str(&text).unwrap();

        assert_eq!(loaded.api.page_size, 7);
    }
}
