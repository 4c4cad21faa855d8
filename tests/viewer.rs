use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use onco_genes::domain::{RecommendationRecord, RecommendationSet, Recommendations};
use onco_genes::error::OncoError;
use onco_genes::store::Store;
use onco_genes::viewer::{LookupResult, Viewer};

fn temp_store() -> (tempfile::TempDir, Store) {
    let temp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    (temp, Store::new(root))
}

fn records() -> RecommendationSet {
    let mut records = RecommendationSet::new();
    records.insert(
        "BRCA".parse().unwrap(),
        RecommendationRecord {
            name: "Invasive Breast Carcinoma".to_string(),
            sample_count: 500,
            recommendations: Recommendations {
                mutation_based: vec!["TP53".to_string(), "PIK3CA".to_string()],
                expression_based: Vec::new(),
                pathways: vec!["PI3K".to_string()],
                error: None,
            },
        },
    );
    records.insert(
        "LUAD".parse().unwrap(),
        RecommendationRecord {
            name: "Lung Adenocarcinoma".to_string(),
            sample_count: 300,
            recommendations: Recommendations::failed("rate limited"),
        },
    );
    records
}

#[test]
fn lookup_found_formats_lists() {
    let (_temp, store) = temp_store();
    store.write_aggregate(&records()).unwrap();

    let viewer = Viewer::load(&store).unwrap();
    assert_eq!(viewer.len(), 2);

    let view = assert_matches!(viewer.lookup("BRCA"), LookupResult::Found(view) => view);
    assert_eq!(view.name, "Invasive Breast Carcinoma");
    assert_eq!(view.sample_count, 500);
    assert_eq!(view.mutation_based, "TP53, PIK3CA");
    assert_eq!(view.expression_based, "None");
    assert_eq!(view.pathways, "PI3K");
    assert_eq!(view.error, None);
}

#[test]
fn lookup_is_exact_and_case_sensitive() {
    let viewer = Viewer::from_records(records());
    assert_matches!(
        viewer.lookup("XYZ"),
        LookupResult::NotFound { code } if code == "XYZ"
    );
    assert_matches!(viewer.lookup("brca"), LookupResult::NotFound { .. });
    assert_matches!(viewer.lookup("  BRCA "), LookupResult::Found(_));
}

#[test]
fn failed_record_shows_error() {
    let viewer = Viewer::from_records(records());
    let view = assert_matches!(viewer.lookup("LUAD"), LookupResult::Found(view) => view);
    assert_eq!(view.mutation_based, "None");
    assert_eq!(view.error.as_deref(), Some("rate limited"));
}

#[test]
fn missing_aggregate_halts_viewer() {
    let (_temp, store) = temp_store();
    let err = Viewer::load(&store).unwrap_err();
    assert_matches!(err, OncoError::InputMissing(_));
}

#[test]
fn empty_aggregate_halts_viewer() {
    let (_temp, store) = temp_store();
    store.write_aggregate(&RecommendationSet::new()).unwrap();
    let err = Viewer::load(&store).unwrap_err();
    assert_matches!(err, OncoError::EmptyRecommendations(_));
}

#[test]
fn malformed_aggregate_halts_viewer() {
    let (_temp, store) = temp_store();
    std::fs::write(store.aggregate_path().as_std_path(), "not json").unwrap();
    let err = Viewer::load(&store).unwrap_err();
    assert_matches!(err, OncoError::InputParse { .. });
}
