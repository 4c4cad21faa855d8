use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum OncoError {
    #[error("invalid OncoTree code: {0}")]
    InvalidCode(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("OncoTree request failed: {0}")]
    OncotreeHttp(String),

    #[error("OncoTree returned status {status}: {message}")]
    OncotreeStatus { status: u16, message: String },

    #[error("cBioPortal request failed: {0}")]
    CbioportalHttp(String),

    #[error("cBioPortal returned status {status}: {message}")]
    CbioportalStatus { status: u16, message: String },

    #[error("language model request failed: {0}")]
    LlmHttp(String),

    #[error("language model returned status {status}: {message}")]
    LlmStatus { status: u16, message: String },

    #[error("unusable language model response: {0}")]
    LlmResponse(String),

    #[error("OPENAI_API_KEY is not set")]
    #[diagnostic(help("export OPENAI_API_KEY before running `recommend` or `run`"))]
    MissingApiKey,

    #[error("prompt template error: {0}")]
    Template(String),

    #[error("input file not found: {0}")]
    #[diagnostic(help("run the preceding pipeline stage first"))]
    InputMissing(String),

    #[error("failed to parse {path}: {message}")]
    InputParse { path: String, message: String },

    #[error("OncoTree code to name mapping is empty")]
    #[diagnostic(help("run `onco-genes taxonomy` to regenerate oncotree_codes.json"))]
    EmptyTaxonomy,

    #[error("no recommendations found in {0}")]
    #[diagnostic(help("run `onco-genes recommend` to generate all_gene_recommendations.json"))]
    EmptyRecommendations(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
