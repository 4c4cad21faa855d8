use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use onco_genes::domain::{
    OncotreeCode, RecommendationRecord, RecommendationSet, Recommendations, SampleCounts,
    TaxonomyEntry,
};
use onco_genes::error::OncoError;
use onco_genes::prompt::PromptTemplate;
use onco_genes::store::Store;

fn temp_store() -> (tempfile::TempDir, Store) {
    let temp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    (temp, Store::new(root))
}

fn entry(code: &str, name: &str) -> TaxonomyEntry {
    TaxonomyEntry {
        code: code.parse().unwrap(),
        name: name.to_string(),
    }
}

#[test]
fn layout_paths() {
    let store = Store::new("results");
    let code: OncotreeCode = "LUAD".parse().unwrap();

    assert!(store.taxonomy_path().ends_with("oncotree_codes.json"));
    assert!(
        store
            .sample_counts_path()
            .ends_with("oncotree_sample_counts.json")
    );
    assert!(store.template_path().ends_with("template.json"));
    assert!(
        store
            .aggregate_path()
            .ends_with("all_gene_recommendations.json")
    );
    assert!(
        store
            .record_path(&code)
            .ends_with("recommendations/gene_recommendations_LUAD.json")
    );
    assert!(store.record_path(&code).starts_with(store.root()));
}

#[test]
fn taxonomy_written_under_entries_key() {
    let (_temp, store) = temp_store();
    store
        .write_taxonomy(&[entry("BRCA", "Invasive Breast Carcinoma")])
        .unwrap();

    let raw = std::fs::read_to_string(store.taxonomy_path().as_std_path()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["oncotree_entries"][0]["code"], "BRCA");
    assert_eq!(
        value["oncotree_entries"][0]["name"],
        "Invasive Breast Carcinoma"
    );

    let entries = store.read_taxonomy().unwrap();
    assert_eq!(entries.len(), 1);
}

#[test]
fn name_mapping_skips_empty_names() {
    let (_temp, store) = temp_store();
    store
        .write_taxonomy(&[entry("BRCA", "Invasive Breast Carcinoma"), entry("XX", "")])
        .unwrap();

    let names = store.read_name_mapping().unwrap();
    assert_eq!(names.len(), 1);
    assert_eq!(names["BRCA"], "Invasive Breast Carcinoma");
}

#[test]
fn sample_counts_keep_file_order() {
    let (_temp, store) = temp_store();
    let counts: SampleCounts = [("LUAD", 300u64), ("BRCA", 500), ("ZZZ", 0)]
        .into_iter()
        .map(|(code, count)| (code.parse().unwrap(), count))
        .collect();
    store.write_sample_counts(&counts).unwrap();

    let loaded = store.read_sample_counts().unwrap();
    assert_eq!(loaded, counts);
    let keys = loaded.keys().map(|code| code.as_str()).collect::<Vec<_>>();
    assert_eq!(keys, vec!["LUAD", "BRCA", "ZZZ"]);
}

#[test]
fn template_round_trip() {
    let (_temp, store) = temp_store();
    store
        .write_template(&PromptTemplate::recommendation())
        .unwrap();
    let loaded = store.read_template().unwrap();
    assert_eq!(loaded, PromptTemplate::recommendation());
}

#[test]
fn record_file_wraps_code() {
    let (_temp, store) = temp_store();
    let code: OncotreeCode = "BRCA".parse().unwrap();
    let record = RecommendationRecord {
        name: "Invasive Breast Carcinoma".to_string(),
        sample_count: 500,
        recommendations: Recommendations::failed("timeout"),
    };
    store.ensure_recommendations_dir().unwrap();
    store.write_record(&code, &record).unwrap();

    let raw = std::fs::read_to_string(store.record_path(&code).as_std_path()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["BRCA"]["sample_count"], 500);
    assert_eq!(value["BRCA"]["recommendations"]["error"], "timeout");
}

#[test]
fn missing_input_reported() {
    let (_temp, store) = temp_store();
    let err = store.read_aggregate().unwrap_err();
    assert_matches!(err, OncoError::InputMissing(_));
}

#[test]
fn malformed_input_reported() {
    let (_temp, store) = temp_store();
    std::fs::write(store.aggregate_path().as_std_path(), "[1, 2").unwrap();
    let err = store.read_aggregate().unwrap_err();
    assert_matches!(err, OncoError::InputParse { .. });
}

#[test]
fn aggregate_overwrite_replaces_contents() {
    let (_temp, store) = temp_store();
    let mut records = RecommendationSet::new();
    records.insert(
        "BRCA".parse().unwrap(),
        RecommendationRecord {
            name: "Invasive Breast Carcinoma".to_string(),
            sample_count: 500,
            recommendations: Recommendations::default(),
        },
    );
    store.write_aggregate(&records).unwrap();
    store.write_aggregate(&RecommendationSet::new()).unwrap();

    let loaded = store.read_aggregate().unwrap();
    assert!(loaded.is_empty());
}
