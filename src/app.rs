use std::time::{Duration, Instant};

use serde::Serialize;

use crate::cbioportal::{StudyClient, aggregate_sample_counts, fetch_all_studies, map_codes_to_counts};
use crate::config::ResolvedConfig;
use crate::domain::{OncotreeCode, TaxonomyEntry};
use crate::error::OncoError;
use crate::llm::RecommendationModel;
use crate::oncotree::{OncotreeClient, parse_tumor_types};
use crate::prompt::PromptTemplate;
use crate::recommend::{run_batch, select_codes};
use crate::store::Store;

const PREVIEW_ENTRIES: usize = 5;
const TOP_COUNTS: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct TaxonomyResult {
    pub entries: usize,
    pub path: Option<String>,
    pub first: Vec<TaxonomyEntry>,
    pub last: Vec<TaxonomyEntry>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CodeCount {
    pub code: OncotreeCode,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CountsResult {
    pub codes: usize,
    pub studies: usize,
    pub cancer_types: usize,
    pub path: Option<String>,
    pub top: Vec<CodeCount>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateResult {
    pub path: String,
    pub input_variables: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendResult {
    pub name_mappings: usize,
    pub qualifying: usize,
    pub processed: usize,
    pub failed: Vec<OncotreeCode>,
    pub aggregate_path: String,
    pub records_dir: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub taxonomy: TaxonomyResult,
    pub counts: Option<CountsResult>,
    pub template: Option<TemplateResult>,
    pub recommend: Option<RecommendResult>,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

/// Runs the pipeline stages against a [`Store`].
#[derive(Clone)]
pub struct App<O: OncotreeClient, S: StudyClient, M: RecommendationModel> {
    store: Store,
    config: ResolvedConfig,
    oncotree: O,
    studies: S,
    model: M,
}

impl<O: OncotreeClient, S: StudyClient, M: RecommendationModel> App<O, S, M> {
    pub fn new(store: Store, config: ResolvedConfig, oncotree: O, studies: S, model: M) -> Self {
        Self {
            store,
            config,
            oncotree,
            studies,
            model,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Downloads and parses the taxonomy. Remote and parse failures are
    /// logged and reported as an empty result with nothing written.
    pub fn fetch_taxonomy(&self, sink: &dyn ProgressSink) -> Result<TaxonomyResult, OncoError> {
        sink.event(ProgressEvent {
            message: "phase=Fetch; oncotree.request tumor types".to_string(),
            elapsed: None,
        });
        let started = Instant::now();
        let text = match self.oncotree.fetch_tumor_types() {
            Ok(text) => text,
            Err(err) => {
                tracing::error!(error = %err, "error fetching data from OncoTree API");
                return Ok(TaxonomyResult {
                    entries: 0,
                    path: None,
                    first: Vec::new(),
                    last: Vec::new(),
                    error: Some(err.to_string()),
                });
            }
        };
        sink.event(ProgressEvent {
            message: "phase=Parse; extracting codes".to_string(),
            elapsed: Some(started.elapsed()),
        });

        let entries = parse_tumor_types(&text);
        if entries.is_empty() {
            tracing::error!("OncoTree response contained no usable entries");
            return Ok(TaxonomyResult {
                entries: 0,
                path: None,
                first: Vec::new(),
                last: Vec::new(),
                error: Some("no entries parsed".to_string()),
            });
        }

        self.store.write_taxonomy(&entries)?;
        let path = self.store.taxonomy_path();
        tracing::info!(
            entries = entries.len(),
            path = %path,
            "generated OncoTree entries"
        );
        sink.event(ProgressEvent {
            message: format!("phase=Store; {} entries -> {path}", entries.len()),
            elapsed: Some(started.elapsed()),
        });

        let first = entries.iter().take(PREVIEW_ENTRIES).cloned().collect();
        let last = entries[entries.len().saturating_sub(PREVIEW_ENTRIES)..].to_vec();
        Ok(TaxonomyResult {
            entries: entries.len(),
            path: Some(path.to_string()),
            first,
            last,
            error: None,
        })
    }

    /// Maps cohort sample counts onto the stored taxonomy codes. A failed
    /// page discards everything fetched so far and nothing is written.
    pub fn fetch_sample_counts(&self, sink: &dyn ProgressSink) -> Result<CountsResult, OncoError> {
        let codes = self
            .store
            .read_taxonomy()?
            .into_iter()
            .map(|entry| entry.code)
            .collect::<Vec<_>>();
        tracing::info!(codes = codes.len(), "loaded OncoTree codes");

        sink.event(ProgressEvent {
            message: "phase=Fetch; cbioportal.request studies".to_string(),
            elapsed: None,
        });
        let started = Instant::now();
        let studies =
            match fetch_all_studies(&self.studies, self.config.page_size, self.config.page_delay) {
                Ok(studies) => studies,
                Err(err) => {
                    tracing::error!(error = %err, "error fetching studies");
                    return Ok(CountsResult {
                        codes: codes.len(),
                        studies: 0,
                        cancer_types: 0,
                        path: None,
                        top: Vec::new(),
                        error: Some(err.to_string()),
                    });
                }
            };
        if studies.is_empty() {
            tracing::warn!("study listing is empty; nothing to write");
            return Ok(CountsResult {
                codes: codes.len(),
                studies: 0,
                cancer_types: 0,
                path: None,
                top: Vec::new(),
                error: Some("no studies returned".to_string()),
            });
        }

        let per_type = aggregate_sample_counts(&studies);
        let counts = map_codes_to_counts(&codes, &per_type);
        self.store.write_sample_counts(&counts)?;
        let path = self.store.sample_counts_path();
        sink.event(ProgressEvent {
            message: format!("phase=Store; {} codes -> {path}", counts.len()),
            elapsed: Some(started.elapsed()),
        });

        let top = counts
            .iter()
            .take(TOP_COUNTS)
            .map(|(code, count)| CodeCount {
                code: code.clone(),
                count: *count,
            })
            .collect::<Vec<_>>();
        for item in &top {
            tracing::info!("{}: {} samples", item.code, item.count);
        }

        Ok(CountsResult {
            codes: codes.len(),
            studies: studies.len(),
            cancer_types: per_type.len(),
            path: Some(path.to_string()),
            top,
            error: None,
        })
    }

    pub fn write_template(&self, sink: &dyn ProgressSink) -> Result<TemplateResult, OncoError> {
        let template = PromptTemplate::recommendation();
        self.store.write_template(&template)?;
        let path = self.store.template_path();
        tracing::info!(path = %path, "template saved");
        sink.event(ProgressEvent {
            message: format!("phase=Store; template -> {path}"),
            elapsed: None,
        });
        Ok(TemplateResult {
            path: path.to_string(),
            input_variables: template.input_variables,
        })
    }

    /// Generates recommendations for every qualifying code. Aborts before
    /// any model call when the name mapping is empty.
    pub fn recommend(&self, sink: &dyn ProgressSink) -> Result<RecommendResult, OncoError> {
        let names = match self.store.read_name_mapping() {
            Ok(names) => names,
            Err(err) => {
                tracing::error!(error = %err, "error loading OncoTree data");
                return Err(OncoError::EmptyTaxonomy);
            }
        };
        if names.is_empty() {
            return Err(OncoError::EmptyTaxonomy);
        }
        tracing::info!(mappings = names.len(), "loaded OncoTree code to name mappings");

        let counts = self.store.read_sample_counts()?;
        let selected = select_codes(
            &counts,
            self.config.min_samples,
            &self.config.excluded_code,
        );
        tracing::info!(
            qualifying = selected.len(),
            min_samples = self.config.min_samples,
            "found OncoTree codes meeting the sample threshold"
        );

        let template = self.store.read_template()?;
        sink.event(ProgressEvent {
            message: format!("phase=Resolve; {} codes queued", selected.len()),
            elapsed: None,
        });

        let records = run_batch(
            &self.model,
            &template,
            &names,
            &selected,
            &self.store,
            self.config.request_delay,
            sink,
        )?;

        let failed = records
            .iter()
            .filter(|(_, record)| record.recommendations.is_failed())
            .map(|(code, _)| code.clone())
            .collect::<Vec<_>>();
        let aggregate_path = self.store.aggregate_path();
        let records_dir = self.store.recommendations_dir();
        tracing::info!(
            processed = records.len(),
            failed = failed.len(),
            aggregate = %aggregate_path,
            "process complete"
        );

        Ok(RecommendResult {
            name_mappings: names.len(),
            qualifying: selected.len(),
            processed: records.len(),
            failed,
            aggregate_path: aggregate_path.to_string(),
            records_dir: records_dir.to_string(),
        })
    }

    /// Runs taxonomy, counts, template and recommend in order, stopping after
    /// the first stage that produced nothing.
    pub fn run_pipeline(&self, sink: &dyn ProgressSink) -> Result<PipelineResult, OncoError> {
        let taxonomy = self.fetch_taxonomy(sink)?;
        let mut result = PipelineResult {
            taxonomy,
            counts: None,
            template: None,
            recommend: None,
        };
        if result.taxonomy.path.is_none() {
            tracing::warn!("taxonomy stage produced no output; stopping");
            return Ok(result);
        }

        let counts = self.fetch_sample_counts(sink)?;
        let has_counts = counts.path.is_some();
        result.counts = Some(counts);
        if !has_counts {
            tracing::warn!("sample count stage produced no output; stopping");
            return Ok(result);
        }

        result.template = Some(self.write_template(sink)?);
        result.recommend = Some(self.recommend(sink)?);
        Ok(result)
    }
}
