use std::{fs, path::Path};

use serde::Deserialize;

use crate::core::error::ShieldError;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_cache_ttl_seconds")]
    pub cache_ttl_seconds: u64,
    /// Optional JSON file backing the fingerprint cache across runs.
    #[serde(default)]
    pub disk_cache_path: Option<String>,
    #[serde(default = "default_rdap_base_url")]
    pub rdap_base_url: String,
    #[serde(default = "default_rdap_timeout_ms")]
    pub rdap_timeout_ms: u64,
    #[serde(default = "default_text_model_path")]
    pub text_model_path: String,
    #[serde(default = "default_url_model_path")]
    pub url_model_path: String,
    #[serde(default = "default_blocklist_domains_path")]
    pub blocklist_domains_path: String,
    #[serde(default = "default_blocklist_urls_path")]
    pub blocklist_urls_path: String,
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_user_agent() -> String {
    "scamshield/1.0".to_string()
}

fn default_cache_ttl_seconds() -> u64 {
    6 * 3600
}

fn default_rdap_base_url() -> String {
    "https://rdap.org".to_string()
}

fn default_rdap_timeout_ms() -> u64 {
    2_500
}

fn default_text_model_path() -> String {
    "ml/artifacts/text_model.json".to_string()
}

fn default_url_model_path() -> String {
    "ml/artifacts/url_model.json".to_string()
}

fn default_blocklist_domains_path() -> String {
    "data/reputation/blocklist_domains.txt".to_string()
}

fn default_blocklist_urls_path() -> String {
    "data/reputation/blocklist_urls.txt".to_string()
}

fn default_db_path() -> String {
    "data/scamshield.db".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            user_agent: default_user_agent(),
            cache_ttl_seconds: default_cache_ttl_seconds(),
            disk_cache_path: None,
            rdap_base_url: default_rdap_base_url(),
            rdap_timeout_ms: default_rdap_timeout_ms(),
            text_model_path: default_text_model_path(),
            url_model_path: default_url_model_path(),
            blocklist_domains_path: default_blocklist_domains_path(),
            blocklist_urls_path: default_blocklist_urls_path(),
            db_path: default_db_path(),
        }
    }
}

pub fn load_config(path: Option<&str>) -> Result<AppConfig, ShieldError> {
    let default_path = Path::new("config/scamshield.toml");
    let path = path.map(Path::new).unwrap_or(default_path);

    if !path.exists() {
        return Ok(AppConfig::default());
    }

    let content = fs::read_to_string(path).map_err(|e| ShieldError::Config(e.to_string()))?;
    let cfg: AppConfig =
        toml::from_str(&content).map_err(|e| ShieldError::Config(e.to_string()))?;
    Ok(cfg)
}
