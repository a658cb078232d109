use serde::Deserialize;
use std::{error::Error, fs};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CommonConfig {
    pub project_name: String,
    pub database_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    pub server_address: String,
    pub log_level: String,
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
    /// Number of parent keys grouped into one statement when order item
    /// collections are loaded lazily.
    #[serde(default = "default_batch_fetch_size")]
    pub batch_fetch_size: u64,
    #[serde(default = "default_page_limit")]
    pub default_page_limit: u64,
    #[serde(default)]
    pub seed_sample_data: bool,
}

fn default_cors_origin() -> String {
    "http://localhost:5173".to_string()
}

fn default_batch_fetch_size() -> u64 {
    100
}

fn default_page_limit() -> u64 {
    100
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            server_address: "127.0.0.1:8080".to_string(),
            log_level: "info".to_string(),
            cors_origin: default_cors_origin(),
            batch_fetch_size: default_batch_fetch_size(),
            default_page_limit: default_page_limit(),
            seed_sample_data: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    pub common: CommonConfig,
    pub backend: BackendConfig,
}

impl Config {
    pub fn load(config_path: &str) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let contents = fs::read_to_string(config_path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let mut config: Config = serde_yml::from_str(contents)?;

        if let Ok(database_url) = std::env::var("DATABASE_URL") {
            config.common.database_url = database_url;
        }
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        if self.backend.batch_fetch_size == 0 {
            return Err("backend.batch_fetch_size must be at least 1".into());
        }
        if self.backend.default_page_limit == 0 {
            return Err("backend.default_page_limit must be at least 1".into());
        }
        if self.common.database_url.is_empty() {
            return Err("common.database_url must not be empty".into());
        }
        Ok(())
    }
}
