use assert_matches::assert_matches;

use onco_genes::error::OncoError;
use onco_genes::prompt::{FORMAT_INSTRUCTIONS, PromptTemplate};

#[test]
fn recommendation_prompt_names_type_and_code() {
    let template = PromptTemplate::recommendation();
    assert_eq!(
        template.input_variables,
        vec![
            "cancer_type".to_string(),
            "format_instructions".to_string(),
            "oncotree_code".to_string()
        ]
    );

    let prompt = template
        .render_recommendation("Invasive Breast Carcinoma", "BRCA")
        .unwrap();
    assert!(prompt.contains("classifying Invasive Breast Carcinoma (OncoTree code: BRCA)"));
    assert!(prompt.contains("molecular \n    classification of Invasive Breast Carcinoma."));
    assert!(prompt.starts_with("\n    You are a genomics expert specializing in cancer genomics. \n"));
    assert!(prompt.contains(FORMAT_INSTRUCTIONS));
    assert!(!prompt.contains("{cancer_type}"));
}

#[test]
fn format_instructions_show_three_lists() {
    for key in ["\"mutation_based\"", "\"expression_based\"", "\"pathways\""] {
        assert!(FORMAT_INSTRUCTIONS.contains(key), "missing {key}");
    }
}

#[test]
fn render_requires_every_variable() {
    let template = PromptTemplate::recommendation();
    let err = template
        .render(&[("cancer_type", "Lung Adenocarcinoma"), ("oncotree_code", "LUAD")])
        .unwrap_err();
    assert_matches!(err, OncoError::Template(message) if message.contains("format_instructions"));
}

#[test]
fn placeholder_names_sorted() {
    let template = PromptTemplate::from_template("{zeta} then {alpha} then {mid}").unwrap();
    assert_eq!(
        template.input_variables,
        vec!["alpha".to_string(), "mid".to_string(), "zeta".to_string()]
    );
}

#[test]
fn stored_template_matches_saved_layout() {
    let json = serde_json::to_string_pretty(&PromptTemplate::recommendation()).unwrap();
    assert!(json.ends_with(
        "\"input_variables\": [\n    \"cancer_type\",\n    \"format_instructions\",\n    \"oncotree_code\"\n  ]\n}"
    ));
    assert!(json.contains("\"template\": \"\\n    You are a genomics expert"));
}

#[test]
fn repeated_placeholder_listed_once() {
    let template = PromptTemplate::from_template("{a} and {b} and {a}").unwrap();
    assert_eq!(template.input_variables, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(
        template.render(&[("a", "x"), ("b", "y")]).unwrap(),
        "x and y and x"
    );
}

#[test]
fn malformed_templates_rejected() {
    assert_matches!(
        PromptTemplate::from_template("unterminated {name"),
        Err(OncoError::Template(_))
    );
    assert_matches!(
        PromptTemplate::from_template("stray } brace"),
        Err(OncoError::Template(_))
    );
    assert_matches!(
        PromptTemplate::from_template("{not valid}"),
        Err(OncoError::Template(_))
    );
}

#[test]
fn stored_template_serializes_fields() {
    let json = serde_json::to_value(PromptTemplate::recommendation()).unwrap();
    assert!(json["template"].as_str().unwrap().contains("{oncotree_code}"));
    assert_eq!(json["input_variables"][0], "cancer_type");
}
