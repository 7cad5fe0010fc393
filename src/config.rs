use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub scheduler: SchedulerConfig,

    pub radarr: ServiceConfig,

    pub sonarr: ServiceConfig,

    pub jellyfin: ServiceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/mediarr.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,

    pub port: u16,

    /// Origins allowed by the CORS layer. Empty list allows any origin.
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 8990,
            cors_allowed_origins: vec![],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enabled: bool,

    /// Six-field cron expressions (sec min hour day month weekday).
    /// The default stagger keeps users imported before the watch-state run.
    pub users_cron: String,

    pub movies_cron: String,

    pub watch_cron: String,

    pub series_cron: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            users_cron: "0 0 1 * * *".to_string(),
            movies_cron: "0 10 1 * * *".to_string(),
            watch_cron: "0 30 1 * * *".to_string(),
            series_cron: "0 0 2 * * *".to_string(),
        }
    }
}

/// Connection settings for one upstream service (Radarr, Sonarr or Jellyfin).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub url: String,

    pub api_key: String,

    /// Request timeout in seconds (default: 30)
    pub request_timeout_seconds: u32,

    /// Page size for offset/limit pagination where the service supports it.
    pub page_size: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            request_timeout_seconds: 30,
            page_size: 200,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            scheduler: SchedulerConfig::default(),
            radarr: ServiceConfig::default(),
            sonarr: ServiceConfig::default(),
            jellyfin: ServiceConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("mediarr").join("config.toml"));
        }
        paths
    }

    /// Environment variables beat the config file for service endpoints, so a
    /// container deployment never needs secrets on disk.
    pub fn apply_env_overrides(&mut self) {
        for (service, prefix) in [
            (&mut self.radarr, "RADARR"),
            (&mut self.sonarr, "SONARR"),
            (&mut self.jellyfin, "JELLYFIN"),
        ] {
            if let Ok(url) = std::env::var(format!("{prefix}_URL")) {
                service.url = url;
            }
            if let Ok(key) = std::env::var(format!("{prefix}_API_KEY")) {
                service.api_key = key;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.general.max_db_connections == 0 {
            anyhow::bail!("general.max_db_connections must be at least 1");
        }
        if self.general.min_db_connections > self.general.max_db_connections {
            anyhow::bail!("general.min_db_connections exceeds max_db_connections");
        }
        for (name, service) in [
            ("radarr", &self.radarr),
            ("sonarr", &self.sonarr),
            ("jellyfin", &self.jellyfin),
        ] {
            if service.request_timeout_seconds == 0 {
                anyhow::bail!("{name}.request_timeout_seconds must be at least 1");
            }
            if service.page_size == 0 {
                anyhow::bail!("{name}.page_size must be at least 1");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scheduler.users_cron, "0 0 1 * * *");
    }

    #[test]
    fn config_round_trips_through_toml() {
        let mut config = Config::default();
        config.radarr.url = "http://radarr:7878".to_string();
        config.radarr.api_key = "abc123".to_string();
        config.server.port = 9000;

        let raw = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&raw).unwrap();

        assert_eq!(parsed.radarr.url, "http://radarr:7878");
        assert_eq!(parsed.radarr.api_key, "abc123");
        assert_eq!(parsed.server.port, 9000);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let parsed: Config = toml::from_str("[sonarr]\nurl = \"http://sonarr:8989\"\n").unwrap();
        assert_eq!(parsed.sonarr.url, "http://sonarr:8989");
        assert_eq!(parsed.sonarr.page_size, 200);
        assert_eq!(parsed.general.log_level, "info");
    }

    #[test]
    fn invalid_pool_settings_rejected() {
        let mut config = Config::default();
        config.general.min_db_connections = 10;
        config.general.max_db_connections = 2;
        assert!(config.validate().is_err());
    }
}
