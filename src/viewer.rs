use serde::Serialize;

use crate::domain::{RecommendationRecord, RecommendationSet};
use crate::error::OncoError;
use crate::store::Store;

pub const DEFAULT_CANCER_TYPE: &str = "Breast Cancer";
pub const DEFAULT_CODE: &str = "BRCA";
const EMPTY_LIST: &str = "None";

/// One record formatted for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecommendationView {
    pub code: String,
    pub name: String,
    pub sample_count: u64,
    pub mutation_based: String,
    pub expression_based: String,
    pub pathways: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LookupResult {
    Found(RecommendationView),
    NotFound { code: String },
}

/// Precomputed recommendations, loaded once.
#[derive(Debug, Clone)]
pub struct Viewer {
    records: RecommendationSet,
}

impl Viewer {
    /// Reads `all_gene_recommendations.json`. A missing, malformed or empty
    /// file is an error; the viewer does not start without records.
    pub fn load(store: &Store) -> Result<Self, OncoError> {
        let records = store.read_aggregate()?;
        if records.is_empty() {
            return Err(OncoError::EmptyRecommendations(
                store.aggregate_path().to_string(),
            ));
        }
        tracing::info!(
            records = records.len(),
            path = %store.aggregate_path(),
            "loaded recommendations"
        );
        Ok(Self { records })
    }

    pub fn from_records(records: RecommendationSet) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Exact, case-sensitive match on the code. Surrounding whitespace from
    /// the input field is ignored.
    pub fn lookup(&self, code: &str) -> LookupResult {
        let code = code.trim();
        match self.records.get(code) {
            Some(record) => LookupResult::Found(render_record(code, record)),
            None => LookupResult::NotFound {
                code: code.to_string(),
            },
        }
    }
}

fn render_record(code: &str, record: &RecommendationRecord) -> RecommendationView {
    let recs = &record.recommendations;
    RecommendationView {
        code: code.to_string(),
        name: record.name.clone(),
        sample_count: record.sample_count,
        mutation_based: join_or_none(&recs.mutation_based),
        expression_based: join_or_none(&recs.expression_based),
        pathways: join_or_none(&recs.pathways),
        error: recs.error.clone(),
    }
}

/// Comma-separated list, or `None` when empty.
pub fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        EMPTY_LIST.to_string()
    } else {
        items.join(", ")
    }
}
