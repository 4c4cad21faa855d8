pub mod app;
pub mod cbioportal;
pub mod config;
pub mod domain;
pub mod error;
pub mod llm;
pub mod oncotree;
pub mod output;
pub mod prompt;
pub mod recommend;
pub mod store;
pub mod tui;
pub mod viewer;
