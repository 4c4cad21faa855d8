use std::io::{self, Write};

use serde::Serialize;

use crate::app::{
    CountsResult, PipelineResult, ProgressEvent, ProgressSink, RecommendResult, TaxonomyResult,
    TemplateResult,
};
use crate::viewer::LookupResult;

const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

/// Machine-readable output for `--non-interactive`.
pub struct JsonOutput;

impl JsonOutput {
    pub fn print_taxonomy(result: &TaxonomyResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_counts(result: &CountsResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_template(result: &TemplateResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_recommend(result: &RecommendResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_pipeline(result: &PipelineResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_lookup(result: &LookupResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

/// Human-readable progress lines and stage summaries on stdout.
pub struct ConsoleOutput;

impl ProgressSink for ConsoleOutput {
    fn event(&self, event: ProgressEvent) {
        let message = event
            .message
            .split_once("; ")
            .map(|(_, payload)| payload)
            .unwrap_or(&event.message);
        match event.elapsed {
            Some(elapsed) => println!("{CYAN}•{RESET} {message} ({} ms)", elapsed.as_millis()),
            None => println!("{CYAN}•{RESET} {message}"),
        }
    }
}

impl ConsoleOutput {
    pub fn print_taxonomy(result: &TaxonomyResult) {
        match &result.path {
            Some(path) => {
                println!(
                    "{GREEN}Generated {} OncoTree entries. Saved to {path}{RESET}",
                    result.entries
                );
                println!("\nFirst {} entries as a sample:", result.first.len());
                for entry in &result.first {
                    println!("{}: {}", entry.code, entry.name);
                }
                println!("\nLast {} entries as a sample:", result.last.len());
                for entry in &result.last {
                    println!("{}: {}", entry.code, entry.name);
                }
            }
            None => println!(
                "{RED}Failed to fetch entries ({}). Check API response.{RESET}",
                result.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }

    pub fn print_counts(result: &CountsResult) {
        match &result.path {
            Some(path) => {
                println!(
                    "{GREEN}Mapped {} codes using {} studies ({} cancer types). Saved to {path}{RESET}",
                    result.codes, result.studies, result.cancer_types
                );
                println!("Sample counts for top {} codes:", result.top.len());
                for item in &result.top {
                    println!("{}: {} samples", item.code, item.count);
                }
            }
            None => println!(
                "{RED}No sample counts written ({}).{RESET}",
                result.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }

    pub fn print_template(result: &TemplateResult) {
        println!(
            "{GREEN}Template saved to {} (variables: {}){RESET}",
            result.path,
            result.input_variables.join(", ")
        );
    }

    pub fn print_recommend(result: &RecommendResult) {
        println!(
            "{GREEN}Processed {}/{} qualifying codes. Results saved to {} and {}{RESET}",
            result.processed, result.qualifying, result.aggregate_path, result.records_dir
        );
        if !result.failed.is_empty() {
            let failed = result
                .failed
                .iter()
                .map(|code| code.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            println!("{YELLOW}Errors recorded for: {failed}{RESET}");
        }
    }

    pub fn print_pipeline(result: &PipelineResult) {
        Self::print_taxonomy(&result.taxonomy);
        if let Some(counts) = &result.counts {
            Self::print_counts(counts);
        }
        if let Some(template) = &result.template {
            Self::print_template(template);
        }
        if let Some(recommend) = &result.recommend {
            Self::print_recommend(recommend);
        }
    }

    pub fn print_lookup(result: &LookupResult) {
        match result {
            LookupResult::Found(view) => {
                println!("{GREEN}OncoTree Code '{}' found!{RESET}", view.code);
                println!("{CYAN}Recommendations for {} ({}){RESET}", view.name, view.code);
                println!("Mutation-Based Genes:\n  {}", view.mutation_based);
                println!("Expression-Based Genes:\n  {}", view.expression_based);
                println!("Pathways:\n  {}", view.pathways);
                if let Some(error) = &view.error {
                    println!("{YELLOW}Generation error: {error}{RESET}");
                }
            }
            LookupResult::NotFound { code } => {
                println!("{RED}OncoTree Code '{code}' not found.{RESET}");
            }
        }
    }
}
