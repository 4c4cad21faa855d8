use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::Builder;

use crate::domain::{
    OncotreeCode, RecommendationRecord, RecommendationSet, SampleCounts, TaxonomyEntry,
    TaxonomyFile,
};
use crate::error::OncoError;
use crate::prompt::PromptTemplate;

pub const TAXONOMY_FILE: &str = "oncotree_codes.json";
pub const SAMPLE_COUNTS_FILE: &str = "oncotree_sample_counts.json";
pub const TEMPLATE_FILE: &str = "template.json";
pub const AGGREGATE_FILE: &str = "all_gene_recommendations.json";
pub const RECOMMENDATIONS_DIR: &str = "recommendations";

/// Directory holding the JSON files exchanged between pipeline stages.
#[derive(Debug, Clone)]
pub struct Store {
    root: Utf8PathBuf,
}

impl Store {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn taxonomy_path(&self) -> Utf8PathBuf {
        self.root.join(TAXONOMY_FILE)
    }

    pub fn sample_counts_path(&self) -> Utf8PathBuf {
        self.root.join(SAMPLE_COUNTS_FILE)
    }

    pub fn template_path(&self) -> Utf8PathBuf {
        self.root.join(TEMPLATE_FILE)
    }

    pub fn aggregate_path(&self) -> Utf8PathBuf {
        self.root.join(AGGREGATE_FILE)
    }

    pub fn recommendations_dir(&self) -> Utf8PathBuf {
        self.root.join(RECOMMENDATIONS_DIR)
    }

    pub fn record_path(&self, code: &OncotreeCode) -> Utf8PathBuf {
        self.recommendations_dir()
            .join(format!("gene_recommendations_{code}.json"))
    }

    pub fn ensure_recommendations_dir(&self) -> Result<(), OncoError> {
        fs::create_dir_all(self.recommendations_dir().as_std_path())
            .map_err(|err| OncoError::Filesystem(err.to_string()))
    }

    pub fn write_taxonomy(&self, entries: &[TaxonomyEntry]) -> Result<(), OncoError> {
        let file = TaxonomyFile {
            oncotree_entries: entries.to_vec(),
        };
        write_json_atomic(&self.taxonomy_path(), &file)
    }

    pub fn read_taxonomy(&self) -> Result<Vec<TaxonomyEntry>, OncoError> {
        let file: TaxonomyFile = read_json(&self.taxonomy_path())?;
        Ok(file.oncotree_entries)
    }

    /// Code to cancer-type name, skipping entries with an empty name.
    pub fn read_name_mapping(&self) -> Result<HashMap<String, String>, OncoError> {
        Ok(self
            .read_taxonomy()?
            .into_iter()
            .filter(|entry| !entry.name.trim().is_empty())
            .map(|entry| (entry.code.as_str().to_string(), entry.name))
            .collect())
    }

    pub fn write_sample_counts(&self, counts: &SampleCounts) -> Result<(), OncoError> {
        write_json_atomic(&self.sample_counts_path(), counts)
    }

    pub fn read_sample_counts(&self) -> Result<SampleCounts, OncoError> {
        read_json(&self.sample_counts_path())
    }

    pub fn write_template(&self, template: &PromptTemplate) -> Result<(), OncoError> {
        write_json_atomic(&self.template_path(), template)
    }

    pub fn read_template(&self) -> Result<PromptTemplate, OncoError> {
        read_json(&self.template_path())
    }

    /// Writes `{CODE: record}` to the per-code file.
    pub fn write_record(
        &self,
        code: &OncotreeCode,
        record: &RecommendationRecord,
    ) -> Result<(), OncoError> {
        let mut single = RecommendationSet::new();
        single.insert(code.clone(), record.clone());
        write_json_atomic(&self.record_path(code), &single)
    }

    pub fn write_aggregate(&self, records: &RecommendationSet) -> Result<(), OncoError> {
        write_json_atomic(&self.aggregate_path(), records)
    }

    pub fn read_aggregate(&self) -> Result<RecommendationSet, OncoError> {
        read_json(&self.aggregate_path())
    }
}

/// Serializes `value` next to `path` and renames it into place, so readers
/// never observe a half-written file.
pub fn write_json_atomic<T: Serialize + ?Sized>(
    path: &Utf8Path,
    value: &T,
) -> Result<(), OncoError> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or(Utf8Path::new("."));
    fs::create_dir_all(parent.as_std_path())
        .map_err(|err| OncoError::Filesystem(err.to_string()))?;

    let mut content = serde_json::to_vec_pretty(value)
        .map_err(|err| OncoError::Filesystem(err.to_string()))?;
    content.push(b'\n');

    let mut temp = Builder::new()
        .prefix(".onco-genes")
        .suffix(".json.tmp")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| OncoError::Filesystem(err.to_string()))?;
    temp.write_all(&content)
        .map_err(|err| OncoError::Filesystem(err.to_string()))?;
    temp.persist(path.as_std_path())
        .map_err(|err| OncoError::Filesystem(format!("persist {path}: {}", err.error)))?;
    Ok(())
}

pub fn read_json<T: DeserializeOwned>(path: &Utf8Path) -> Result<T, OncoError> {
    let content = fs::read_to_string(path.as_std_path()).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => OncoError::InputMissing(path.to_string()),
        _ => OncoError::Filesystem(format!("read {path}: {err}")),
    })?;
    serde_json::from_str(&content).map_err(|err| OncoError::InputParse {
        path: path.to_string(),
        message: err.to_string(),
    })
}
