use std::collections::BTreeMap;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::domain::{OncotreeCode, TaxonomyEntry};
use crate::error::OncoError;

pub const DEFAULT_ONCOTREE_URL: &str =
    "https://oncotree.info:443/api/tumor_types.txt?version=oncotree_latest_stable";

/// `level_1` through `level_7` lead every row of `tumor_types.txt`.
const LEVEL_COLUMNS: usize = 7;

static CELL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(.*?)\((.*?)\)").expect("cell pattern compiles"));

pub trait OncotreeClient: Send + Sync {
    fn fetch_tumor_types(&self) -> Result<String, OncoError>;
}

#[derive(Clone)]
pub struct OncotreeHttpClient {
    client: Client,
    url: String,
}

impl OncotreeHttpClient {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, OncoError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("onco-genes/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| OncoError::OncotreeHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|err| OncoError::OncotreeHttp(err.to_string()))?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

impl OncotreeClient for OncotreeHttpClient {
    fn fetch_tumor_types(&self) -> Result<String, OncoError> {
        tracing::debug!(url = %self.url, "requesting OncoTree tumor types");
        let response = self
            .client
            .get(&self.url)
            .send()
            .map_err(|err| OncoError::OncotreeHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "OncoTree request failed".to_string());
            return Err(OncoError::OncotreeStatus { status, message });
        }
        response
            .text()
            .map_err(|err| OncoError::OncotreeHttp(err.to_string()))
    }
}

/// Extracts `Name(Code)` pairs from the level columns of a tumor-types
/// listing. The first line is the header. Codes that are not valid
/// [`OncotreeCode`]s are dropped; on duplicates the last occurrence wins.
/// The result is sorted by code.
pub fn parse_tumor_types(text: &str) -> Vec<TaxonomyEntry> {
    let mut code_to_name = BTreeMap::<OncotreeCode, String>::new();

    for line in text.trim().lines().skip(1) {
        for cell in line.split('\t').take(LEVEL_COLUMNS) {
            if cell.is_empty() {
                continue;
            }
            let Some((name, code)) = parse_cell(cell) else {
                continue;
            };
            match code.parse::<OncotreeCode>() {
                Ok(code) => {
                    code_to_name.insert(code, name.to_string());
                }
                Err(_) => tracing::debug!(cell, "skipping cell with unusable code"),
            }
        }
    }

    code_to_name
        .into_iter()
        .map(|(code, name)| TaxonomyEntry { code, name })
        .collect()
}

fn parse_cell(cell: &str) -> Option<(&str, &str)> {
    let captures = CELL_PATTERN.captures(cell)?;
    let name = captures.get(1)?.as_str().trim();
    let code = captures.get(2)?.as_str().trim();
    if code.is_empty() {
        return None;
    }
    Some((name, code))
}
