use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::constants::{
    DEFAULT_ISOCHRONE_ATTRIBUTES, DEFAULT_ISOCHRONE_BATCH_SIZE, DEFAULT_OUTLET_DATA, ENV_CACHE, ENV_ORS_API_KEY,
    ENV_ORS_URL, ENV_OUTLET_DATA, ENV_OVERPASS_URL, ORS_DEFAULT_URL, OVERPASS_DEFAULT_URL,
};
use crate::error::{CoverageError, Result};
use crate::types::TagFilters;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub http: HttpConfig,
    pub overpass: OverpassConfig,
    pub isochrone: IsochroneConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub outlet_data: String,
    pub delimiter: char,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            outlet_data: DEFAULT_OUTLET_DATA.to_string(),
            delimiter: ';',
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 60,
            user_agent: concat!("outlet_coverage/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverpassConfig {
    pub url: String,
    pub tag_filters: TagFilters,
    pub default_radius_km: f64,
}

impl Default for OverpassConfig {
    fn default() -> Self {
        Self {
            url: OVERPASS_DEFAULT_URL.to_string(),
            tag_filters: TagFilters::default(),
            default_radius_km: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IsochroneConfig {
    pub url: String,
    /// Read from `ORS_API_KEY` when not set here
    pub api_key: Option<String>,
    pub batch_size: usize,
    pub attributes: Vec<String>,
    pub max_retries: u32,
    pub backoff_ms: u64,
    /// Batches in flight at once
    pub concurrency: u32,
    pub requests_per_min: Option<u64>,
    pub default_max_distance_km: f64,
}

impl Default for IsochroneConfig {
    fn default() -> Self {
        Self {
            url: ORS_DEFAULT_URL.to_string(),
            api_key: None,
            batch_size: DEFAULT_ISOCHRONE_BATCH_SIZE,
            attributes: DEFAULT_ISOCHRONE_ATTRIBUTES.iter().map(|a| a.to_string()).collect(),
            max_retries: 2,
            backoff_ms: 500,
            concurrency: 1,
            requests_per_min: Some(20),
            default_max_distance_km: 5.0,
        }
    }
}

impl IsochroneConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { dir: "logs".to_string() }
    }
}

impl Config {
    /// Load `path` if it exists (an explicitly requested file must exist),
    /// then apply environment overrides.
    pub fn load(path: &str, required: bool) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            let content = fs::read_to_string(path)
                .map_err(|e| CoverageError::Config(format!("Failed to read config file '{}': {}", path, e)))?;
            Self::from_toml_str(&content)?
        } else if required {
            return Err(CoverageError::Config(format!("Config file '{}' not found", path)));
        } else {
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply environment-style overrides from `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = lookup(ENV_OUTLET_DATA) {
            self.data.outlet_data = path;
        }
        if let Some(key) = lookup(ENV_ORS_API_KEY) {
            self.isochrone.api_key = Some(key);
        }
        if let Some(url) = lookup(ENV_ORS_URL) {
            self.isochrone.url = url;
        }
        if let Some(url) = lookup(ENV_OVERPASS_URL) {
            self.overpass.url = url;
        }
        if let Some(flag) = lookup(ENV_CACHE) {
            self.cache.enabled = !matches!(flag.trim().to_ascii_lowercase().as_str(), "0" | "false" | "off" | "no");
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.isochrone.batch_size == 0 {
            return Err(CoverageError::Config("isochrone.batch_size must be at least 1".into()));
        }
        if self.http.timeout_seconds == 0 {
            return Err(CoverageError::Config("http.timeout_seconds must be at least 1".into()));
        }
        if self.overpass.tag_filters.is_empty() {
            return Err(CoverageError::Config("overpass.tag_filters must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_match_service_requirements() {
        let config = Config::default();
        assert_eq!(config.isochrone.batch_size, 5);
        assert_eq!(config.isochrone.attributes, vec!["area", "reachfactor", "total_pop"]);
        assert_eq!(config.data.delimiter, ';');
        assert_eq!(config.overpass.url, OVERPASS_DEFAULT_URL);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [isochrone]
            batch_size = 3
            concurrency = 2

            [overpass]
            tag_filters = ["shop", "amenity"]
            "#,
        )
        .unwrap();
        assert_eq!(config.isochrone.batch_size, 3);
        assert_eq!(config.isochrone.concurrency, 2);
        assert_eq!(config.isochrone.max_retries, 2);
        assert_eq!(config.overpass.tag_filters, TagFilters::new(["shop", "amenity"]));
        assert_eq!(config.http.timeout_seconds, 60);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_ORS_API_KEY, "secret"),
            (ENV_OUTLET_DATA, "/tmp/outlets.csv"),
            (ENV_OVERPASS_URL, ""),
            (ENV_CACHE, "off"),
        ]
        .into_iter()
        .collect();
        let mut config = Config::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.isochrone.api_key.as_deref(), Some("secret"));
        assert_eq!(config.data.outlet_data, "/tmp/outlets.csv");
        // blank values are ignored
        assert_eq!(config.overpass.url, OVERPASS_DEFAULT_URL);
        assert!(!config.cache.enabled);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let config = Config::from_toml_str("[isochrone]\nbatch_size = 0\n").unwrap();
        assert!(matches!(config.validate(), Err(CoverageError::Config(_))));
    }

    #[test]
    fn test_missing_required_file() {
        assert!(Config::load("/nonexistent/coverage.toml", true).is_err());
    }
}
