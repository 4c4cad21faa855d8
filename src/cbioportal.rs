use std::collections::HashMap;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};

use crate::domain::{OncotreeCode, SampleCounts};
use crate::error::OncoError;

pub const DEFAULT_CBIOPORTAL_URL: &str = "https://www.cbioportal.org/api";

/// Subset of a cBioPortal study summary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Study {
    #[serde(default)]
    pub study_id: String,
    #[serde(default)]
    pub cancer_type_id: Option<String>,
    #[serde(default)]
    pub all_sample_count: Option<i64>,
}

pub trait StudyClient: Send + Sync {
    fn fetch_studies_page(
        &self,
        page_size: usize,
        page_number: usize,
    ) -> Result<Vec<Study>, OncoError>;
}

#[derive(Clone)]
pub struct CbioportalHttpClient {
    client: Client,
    base_url: String,
}

impl CbioportalHttpClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, OncoError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("onco-genes/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| OncoError::CbioportalHttp(err.to_string()))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|err| OncoError::CbioportalHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn studies_url(&self) -> String {
        format!("{}/studies", self.base_url)
    }
}

impl StudyClient for CbioportalHttpClient {
    fn fetch_studies_page(
        &self,
        page_size: usize,
        page_number: usize,
    ) -> Result<Vec<Study>, OncoError> {
        let response = self
            .client
            .get(self.studies_url())
            .query(&[("pageSize", page_size), ("pageNumber", page_number)])
            .send()
            .map_err(|err| OncoError::CbioportalHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "cBioPortal request failed".to_string());
            return Err(OncoError::CbioportalStatus { status, message });
        }
        response
            .json()
            .map_err(|err| OncoError::CbioportalHttp(err.to_string()))
    }
}

/// Walks the study listing from page 0 until a short page arrives, sleeping
/// `page_delay` between requests. Any failed page fails the whole walk.
pub fn fetch_all_studies<C: StudyClient + ?Sized>(
    client: &C,
    page_size: usize,
    page_delay: Duration,
) -> Result<Vec<Study>, OncoError> {
    let mut studies = Vec::new();
    let mut page_number = 0usize;
    loop {
        tracing::info!(page = page_number, "fetching studies page");
        let page = client.fetch_studies_page(page_size, page_number)?;
        let last = page.len() < page_size;
        studies.extend(page);
        if last {
            break;
        }
        page_number += 1;
        if !page_delay.is_zero() {
            std::thread::sleep(page_delay);
        }
    }
    tracing::info!(studies = studies.len(), "fetched studies");
    Ok(studies)
}

/// Sums `allSampleCount` per lowercased `cancerTypeId`. Studies without an
/// identifier or with a non-positive count do not contribute.
pub fn aggregate_sample_counts(studies: &[Study]) -> HashMap<String, u64> {
    let mut counts = HashMap::<String, u64>::new();
    for study in studies {
        let cancer_type = study
            .cancer_type_id
            .as_deref()
            .unwrap_or_default()
            .to_lowercase();
        let samples = study.all_sample_count.unwrap_or(0);
        if cancer_type.is_empty() || samples <= 0 {
            continue;
        }
        tracing::debug!(
            study = %study.study_id,
            cancer_type = %cancer_type,
            samples,
            "counting study"
        );
        *counts.entry(cancer_type).or_insert(0) += samples as u64;
    }
    tracing::info!(cancer_types = counts.len(), "aggregated sample counts");
    counts
}

/// Assigns each taxonomy code its cohort count (0 when unmatched) and orders
/// the result by descending count. Equal counts keep the input order.
pub fn map_codes_to_counts(codes: &[OncotreeCode], counts: &HashMap<String, u64>) -> SampleCounts {
    let mut pairs = codes
        .iter()
        .map(|code| {
            let count = counts.get(&code.cohort_key()).copied().unwrap_or(0);
            (code.clone(), count)
        })
        .collect::<Vec<_>>();
    pairs.sort_by(|a, b| b.1.cmp(&a.1));
    pairs.into_iter().collect()
}
