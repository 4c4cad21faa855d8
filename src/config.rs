use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::cbioportal::DEFAULT_CBIOPORTAL_URL;
use crate::error::OncoError;
use crate::llm::{DEFAULT_LLM_BASE_URL, DEFAULT_MODEL};
use crate::oncotree::DEFAULT_ONCOTREE_URL;

pub const CONFIG_FILE: &str = "onco-genes.json";

pub const DEFAULT_MIN_SAMPLES: u64 = 10;
pub const DEFAULT_EXCLUDED_CODE: &str = "MIXED";
pub const DEFAULT_PAGE_SIZE: usize = 1000;
pub const DEFAULT_PAGE_DELAY_MS: u64 = 1000;
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 2000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub min_samples: Option<u64>,
    #[serde(default)]
    pub excluded_code: Option<String>,
    #[serde(default)]
    pub page_size: Option<usize>,
    #[serde(default)]
    pub page_delay_ms: Option<u64>,
    #[serde(default)]
    pub request_delay_ms: Option<u64>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub llm_timeout_secs: Option<u64>,
    #[serde(default)]
    pub oncotree_url: Option<String>,
    #[serde(default)]
    pub cbioportal_url: Option<String>,
    #[serde(default)]
    pub llm_base_url: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub output_dir: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub min_samples: u64,
    pub excluded_code: String,
    pub page_size: usize,
    pub page_delay: Duration,
    pub request_delay: Duration,
    pub request_timeout: Duration,
    pub llm_timeout: Duration,
    pub oncotree_url: String,
    pub cbioportal_url: String,
    pub llm_base_url: String,
    pub model: String,
    pub temperature: f32,
    pub output_dir: Utf8PathBuf,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            schema_version: 1,
            min_samples: DEFAULT_MIN_SAMPLES,
            excluded_code: DEFAULT_EXCLUDED_CODE.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            page_delay: Duration::from_millis(DEFAULT_PAGE_DELAY_MS),
            request_delay: Duration::from_millis(DEFAULT_REQUEST_DELAY_MS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            llm_timeout: Duration::from_secs(DEFAULT_LLM_TIMEOUT_SECS),
            oncotree_url: DEFAULT_ONCOTREE_URL.to_string(),
            cbioportal_url: DEFAULT_CBIOPORTAL_URL.to_string(),
            llm_base_url: DEFAULT_LLM_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            output_dir: Utf8PathBuf::from("."),
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads `onco-genes.json` from the working directory, or `path` when
    /// given. Only an explicit path is required to exist.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, OncoError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Ok(ResolvedConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| OncoError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| OncoError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, OncoError> {
        let defaults = ResolvedConfig::default();

        let page_size = config.page_size.unwrap_or(defaults.page_size);
        if page_size == 0 {
            return Err(OncoError::ConfigParse(
                "page_size must be greater than zero".to_string(),
            ));
        }

        let temperature = config.temperature.unwrap_or(defaults.temperature);
        if !(0.0..=2.0).contains(&temperature) {
            return Err(OncoError::ConfigParse(format!(
                "temperature must be within 0.0..=2.0, got {temperature}"
            )));
        }

        let excluded_code = config
            .excluded_code
            .map(|code| code.trim().to_string())
            .unwrap_or(defaults.excluded_code);

        Ok(ResolvedConfig {
            schema_version: config.schema_version.unwrap_or(defaults.schema_version),
            min_samples: config.min_samples.unwrap_or(defaults.min_samples),
            excluded_code,
            page_size,
            page_delay: config
                .page_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.page_delay),
            request_delay: config
                .request_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.request_delay),
            request_timeout: config
                .request_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            llm_timeout: config
                .llm_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.llm_timeout),
            oncotree_url: config.oncotree_url.unwrap_or(defaults.oncotree_url),
            cbioportal_url: config
                .cbioportal_url
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.cbioportal_url),
            llm_base_url: config
                .llm_base_url
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.llm_base_url),
            model: config.model.unwrap_or(defaults.model),
            temperature,
            output_dir: config
                .output_dir
                .map(Utf8PathBuf::from)
                .unwrap_or(defaults.output_dir),
        })
    }
}
