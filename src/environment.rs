// src/environment.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::discovery::DEFAULT_PAGE_SIZE;
use crate::recommend::{SearchRadius, DEFAULT_RADIUS_KM};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub database_path: PathBuf,
    pub log_path: PathBuf,
    /// Base URL of the OSRM-compatible routing service
    pub routing_url: String,
    /// Base URL of the job matching (AI ranking) service
    pub matching_url: String,
    #[serde(default)]
    pub matching_api_key: Option<String>,
    pub ip_lookup_url: String,
    #[serde(default = "default_radius_km")]
    pub default_radius_km: f64,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_radius_km() -> f64 {
    DEFAULT_RADIUS_KM
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("data/vieclam.db"),
            log_path: PathBuf::from("/tmp/vieclam.log"),
            routing_url: "https://router.project-osrm.org".to_string(),
            matching_url: "http://127.0.0.1:5555".to_string(),
            matching_api_key: None,
            ip_lookup_url: "http://ip-api.com/json".to_string(),
            default_radius_km: DEFAULT_RADIUS_KM,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    local: EnvironmentConfig,
    production: EnvironmentConfig,
}

impl EnvironmentConfig {
    /// Load `config.yaml` for the current environment, then apply env var overrides.
    ///
    /// Falls back to built-in defaults when the file is absent.
    pub fn load() -> Result<Self> {
        let environment = Self::get_environment();
        info!("Loading configuration for environment: {}", environment);

        let config_path = PathBuf::from("config.yaml");
        let config = if config_path.exists() {
            Self::load_from_file(&config_path, &environment)?
        } else {
            warn!("config.yaml not found, using default configuration");
            Self::default()
        };

        let config = config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn get_environment() -> String {
        std::env::var("VIECLAM_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .unwrap_or_else(|_| "local".to_string())
    }

    pub fn load_from_file(config_path: &Path, environment: &str) -> Result<Self> {
        let config_content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let config_file: ConfigFile = serde_yaml::from_str(&config_content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        let env_config = match environment {
            "production" => config_file.production,
            _ => config_file.local,
        };

        Ok(Self {
            database_path: Self::resolve_path(&env_config.database_path)?,
            log_path: Self::resolve_path(&env_config.log_path)?,
            ..env_config
        })
    }

    /// Environment variables win over the file
    pub fn apply_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("ROUTING_API_URL") {
            self.routing_url = url;
        }
        if let Some(url) = lookup("MATCHING_API_URL") {
            self.matching_url = url;
        }
        if let Some(key) = lookup("MATCHING_API_KEY") {
            self.matching_api_key = Some(key);
        }
        if let Some(path) = lookup("DATABASE_PATH") {
            self.database_path = PathBuf::from(path);
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        SearchRadius::new(self.default_radius_km).context("Invalid default_radius_km")?;
        if self.page_size == 0 {
            anyhow::bail!("page_size must be greater than zero");
        }
        Ok(())
    }

    pub fn default_radius(&self) -> SearchRadius {
        SearchRadius::new(self.default_radius_km).unwrap_or_default()
    }

    fn resolve_path(path: &Path) -> Result<PathBuf> {
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            let current_dir = std::env::current_dir().context("Failed to get current directory")?;
            Ok(current_dir.join(path))
        }
    }

    /// Ensure the database and log directories exist
    pub async fn ensure_directories(&self) -> Result<()> {
        for file in [&self.database_path, &self.log_path] {
            if let Some(parent) = file.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
local:
  database_path: /tmp/vieclam-test/local.db
  log_path: /tmp/vieclam-test/local.log
  routing_url: http://localhost:5000
  matching_url: http://localhost:5555
  ip_lookup_url: http://localhost:9000/json
production:
  database_path: /app/data/vieclam.db
  log_path: /app/logs/vieclam.log
  routing_url: https://router.project-osrm.org
  matching_url: https://matching.internal
  matching_api_key: secret
  ip_lookup_url: http://ip-api.com/json
  default_radius_km: 3.0
  page_size: 20
"#;

    fn sample_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_local_section_uses_defaults_for_missing_keys() {
        let file = sample_file();
        let config = EnvironmentConfig::load_from_file(file.path(), "local").unwrap();
        assert_eq!(config.routing_url, "http://localhost:5000");
        assert_eq!(config.default_radius_km, DEFAULT_RADIUS_KM);
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert!(config.matching_api_key.is_none());
    }

    #[test]
    fn test_production_section() {
        let file = sample_file();
        let config = EnvironmentConfig::load_from_file(file.path(), "production").unwrap();
        assert_eq!(config.database_path, PathBuf::from("/app/data/vieclam.db"));
        assert_eq!(config.matching_api_key.as_deref(), Some("secret"));
        assert_eq!(config.default_radius().km(), 3.0);
        assert_eq!(config.page_size, 20);
    }

    #[test]
    fn test_overrides() {
        let config = EnvironmentConfig::default().apply_overrides(|key| match key {
            "ROUTING_API_URL" => Some("http://osrm:5000".to_string()),
            "MATCHING_API_KEY" => Some("k".to_string()),
            _ => None,
        });
        assert_eq!(config.routing_url, "http://osrm:5000");
        assert_eq!(config.matching_api_key.as_deref(), Some("k"));
        assert_eq!(config.matching_url, EnvironmentConfig::default().matching_url);
    }

    #[test]
    fn test_validate_rejects_bad_radius() {
        let config = EnvironmentConfig {
            default_radius_km: 25.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(EnvironmentConfig::default().validate().is_ok());
    }
}
