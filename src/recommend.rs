use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::app::{ProgressEvent, ProgressSink};
use crate::domain::{
    OncotreeCode, RecommendationRecord, RecommendationSet, Recommendations, SampleCounts,
};
use crate::error::OncoError;
use crate::llm::RecommendationModel;
use crate::prompt::PromptTemplate;
use crate::store::Store;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedCode {
    pub code: OncotreeCode,
    pub sample_count: u64,
}

/// Codes with at least `min_samples` samples, minus `excluded_code`, highest
/// count first. Equal counts are ordered by code.
pub fn select_codes(
    counts: &SampleCounts,
    min_samples: u64,
    excluded_code: &str,
) -> Vec<SelectedCode> {
    let mut selected = counts
        .iter()
        .filter(|(code, count)| **count >= min_samples && code.as_str() != excluded_code)
        .map(|(code, count)| SelectedCode {
            code: code.clone(),
            sample_count: *count,
        })
        .collect::<Vec<_>>();
    selected.sort_by(|a, b| {
        b.sample_count
            .cmp(&a.sample_count)
            .then_with(|| a.code.cmp(&b.code))
    });
    selected
}

/// Asks the model for one cancer type. Failures never propagate: they come
/// back as empty lists carrying the error text.
pub fn generate_recommendations<M: RecommendationModel + ?Sized>(
    model: &M,
    template: &PromptTemplate,
    cancer_type: &str,
    code: &OncotreeCode,
) -> Recommendations {
    let result = template
        .render_recommendation(cancer_type, code.as_str())
        .and_then(|prompt| model.generate(&prompt));
    match result {
        Ok(genes) => genes.into(),
        Err(err) => {
            tracing::warn!(%code, cancer_type, error = %err, "recommendation failed");
            Recommendations::failed(err.to_string())
        }
    }
}

/// Processes `selected` in order. After each code the per-code file and the
/// full aggregate are rewritten, then the loop waits `request_delay` before
/// the next model call.
pub fn run_batch<M: RecommendationModel + ?Sized>(
    model: &M,
    template: &PromptTemplate,
    names: &HashMap<String, String>,
    selected: &[SelectedCode],
    store: &Store,
    request_delay: Duration,
    sink: &dyn ProgressSink,
) -> Result<RecommendationSet, OncoError> {
    store.ensure_recommendations_dir()?;

    let mut records = RecommendationSet::new();
    let total = selected.len();
    for (index, item) in selected.iter().enumerate() {
        let position = index + 1;
        tracing::info!(
            "[{position}/{total}] Processing {} with {} samples...",
            item.code,
            item.sample_count
        );
        sink.event(ProgressEvent {
            message: format!(
                "phase=Generate; [{position}/{total}] {} ({} samples)",
                item.code, item.sample_count
            ),
            elapsed: None,
        });

        let name = names
            .get(item.code.as_str())
            .cloned()
            .unwrap_or_else(|| item.code.as_str().to_string());
        let started = Instant::now();
        let recommendations = generate_recommendations(model, template, &name, &item.code);
        let failed = recommendations.is_failed();
        let record = RecommendationRecord {
            name,
            sample_count: item.sample_count,
            recommendations,
        };

        store.write_record(&item.code, &record)?;
        records.insert(item.code.clone(), record);
        store.write_aggregate(&records)?;

        sink.event(ProgressEvent {
            message: format!(
                "phase=Store; {} {}",
                item.code,
                if failed { "failed" } else { "saved" }
            ),
            elapsed: Some(started.elapsed()),
        });

        if position < total && !request_delay.is_zero() {
            std::thread::sleep(request_delay);
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(pairs: &[(&str, u64)]) -> SampleCounts {
        pairs
            .iter()
            .map(|(code, count)| (code.parse().unwrap(), *count))
            .collect()
    }

    #[test]
    fn threshold_is_inclusive() {
        let selected = select_codes(&counts(&[("BRCA", 10), ("LUAD", 9)]), 10, "MIXED");
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].code.as_str(), "BRCA");
    }

    #[test]
    fn sentinel_excluded_regardless_of_count() {
        let selected = select_codes(&counts(&[("MIXED", 5000), ("BRCA", 20)]), 10, "MIXED");
        let codes = selected
            .iter()
            .map(|item| item.code.as_str())
            .collect::<Vec<_>>();
        assert_eq!(codes, vec!["BRCA"]);
    }

    #[test]
    fn ordered_by_descending_count_then_code() {
        let selected = select_codes(
            &counts(&[("COAD", 30), ("BRCA", 50), ("ACC", 30)]),
            10,
            "MIXED",
        );
        let codes = selected
            .iter()
            .map(|item| item.code.as_str())
            .collect::<Vec<_>>();
        assert_eq!(codes, vec!["BRCA", "ACC", "COAD"]);
    }
}
