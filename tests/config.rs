use std::time::Duration;

use assert_matches::assert_matches;

use onco_genes::config::{Config, ConfigLoader};
use onco_genes::error::OncoError;

#[test]
fn resolve_config_applies_overrides() {
    let config = Config {
        min_samples: Some(50),
        excluded_code: Some(" OTHER ".to_string()),
        page_size: Some(200),
        page_delay_ms: Some(0),
        request_delay_ms: Some(250),
        cbioportal_url: Some("http://localhost:8080/api/".to_string()),
        llm_base_url: Some("http://localhost:11434/v1/".to_string()),
        model: Some("gpt-4o-mini".to_string()),
        temperature: Some(0.0),
        output_dir: Some("out".to_string()),
        ..Config::default()
    };

    let resolved = ConfigLoader::resolve_config(config).unwrap();
    assert_eq!(resolved.min_samples, 50);
    assert_eq!(resolved.excluded_code, "OTHER");
    assert_eq!(resolved.page_size, 200);
    assert_eq!(resolved.page_delay, Duration::ZERO);
    assert_eq!(resolved.request_delay, Duration::from_millis(250));
    assert_eq!(resolved.cbioportal_url, "http://localhost:8080/api");
    assert_eq!(resolved.llm_base_url, "http://localhost:11434/v1");
    assert_eq!(resolved.model, "gpt-4o-mini");
    assert_eq!(resolved.output_dir.as_str(), "out");
}

#[test]
fn resolve_config_defaults_match_pipeline_constants() {
    let resolved = ConfigLoader::resolve_config(Config::default()).unwrap();
    assert_eq!(resolved.min_samples, 10);
    assert_eq!(resolved.excluded_code, "MIXED");
    assert_eq!(resolved.page_delay, Duration::from_secs(1));
    assert_eq!(resolved.request_delay, Duration::from_secs(2));
    assert_eq!(resolved.request_timeout, Duration::from_secs(10));
    assert!((resolved.temperature - 0.2).abs() < f32::EPSILON);
    assert!(resolved.oncotree_url.contains("tumor_types.txt"));
    assert_eq!(resolved.cbioportal_url, "https://www.cbioportal.org/api");
}

#[test]
fn temperature_out_of_range_rejected() {
    let config = Config {
        temperature: Some(3.5),
        ..Config::default()
    };
    let err = ConfigLoader::resolve_config(config).unwrap_err();
    assert_matches!(err, OncoError::ConfigParse(_));
}

#[test]
fn resolve_reads_explicit_file() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("onco-genes.json");
    std::fs::write(
        &path,
        r#"{"schema_version": 1, "min_samples": 25, "request_delay_ms": 0}"#,
    )
    .unwrap();

    let resolved = ConfigLoader::resolve(path.to_str()).unwrap();
    assert_eq!(resolved.min_samples, 25);
    assert_eq!(resolved.request_delay, Duration::ZERO);
    assert_eq!(resolved.page_size, 1000);
}

#[test]
fn resolve_explicit_missing_file_fails() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("absent.json");
    let err = ConfigLoader::resolve(path.to_str()).unwrap_err();
    assert_matches!(err, OncoError::ConfigRead(_));
}

#[test]
fn resolve_malformed_file_fails() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("onco-genes.json");
    std::fs::write(&path, "{ not json").unwrap();
    let err = ConfigLoader::resolve(path.to_str()).unwrap_err();
    assert_matches!(err, OncoError::ConfigParse(_));
}
