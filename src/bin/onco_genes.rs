use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use onco_genes::app::App;
use onco_genes::cbioportal::{CbioportalHttpClient, Study, StudyClient};
use onco_genes::config::{ConfigLoader, ResolvedConfig};
use onco_genes::domain::GeneRecommendations;
use onco_genes::error::OncoError;
use onco_genes::llm::{OpenAiChatClient, RecommendationModel};
use onco_genes::oncotree::{OncotreeClient, OncotreeHttpClient};
use onco_genes::output::{ConsoleOutput, JsonOutput, OutputMode};
use onco_genes::store::Store;
use onco_genes::tui::Tui;
use onco_genes::viewer::Viewer;

#[derive(Parser)]
#[command(name = "onco-genes")]
#[command(about = "OncoTree cancer types, cBioPortal cohort sizes and LLM gene/pathway recommendations")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    non_interactive: bool,

    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Fetch OncoTree codes into oncotree_codes.json")]
    Taxonomy,
    #[command(about = "Map cBioPortal sample counts onto OncoTree codes")]
    Counts,
    #[command(about = "Write the recommendation prompt to template.json")]
    Template,
    #[command(about = "Generate gene and pathway recommendations per OncoTree code")]
    Recommend,
    #[command(about = "Run taxonomy, counts, template and recommend in order")]
    Run,
    #[command(about = "Look up precomputed recommendations")]
    View(ViewArgs),
}

#[derive(Args)]
struct ViewArgs {
    #[arg(long)]
    code: Option<String>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<OncoError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &OncoError) -> u8 {
    match error {
        OncoError::InputMissing(_)
        | OncoError::EmptyTaxonomy
        | OncoError::EmptyRecommendations(_)
        | OncoError::MissingApiKey => 2,
        OncoError::OncotreeHttp(_)
        | OncoError::OncotreeStatus { .. }
        | OncoError::CbioportalHttp(_)
        | OncoError::CbioportalStatus { .. }
        | OncoError::LlmHttp(_)
        | OncoError::LlmStatus { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    let config = ConfigLoader::resolve(cli.config.as_deref())?;
    let store = Store::new(config.output_dir.clone());

    match cli.command {
        Some(Commands::Taxonomy) => {
            let oncotree = OncotreeHttpClient::new(&config.oncotree_url, config.request_timeout)?;
            let app = App::new(store, config, oncotree, NopStudies, NopModel);
            match output_mode {
                OutputMode::NonInteractive => {
                    let result = app.fetch_taxonomy(&JsonOutput)?;
                    JsonOutput::print_taxonomy(&result).into_diagnostic()
                }
                OutputMode::Interactive => {
                    let result = app.fetch_taxonomy(&ConsoleOutput)?;
                    ConsoleOutput::print_taxonomy(&result);
                    Ok(())
                }
            }
        }
        Some(Commands::Counts) => {
            let studies = CbioportalHttpClient::new(&config.cbioportal_url, config.request_timeout)?;
            let app = App::new(store, config, NopOncotree, studies, NopModel);
            match output_mode {
                OutputMode::NonInteractive => {
                    let result = app.fetch_sample_counts(&JsonOutput)?;
                    JsonOutput::print_counts(&result).into_diagnostic()
                }
                OutputMode::Interactive => {
                    let result = app.fetch_sample_counts(&ConsoleOutput)?;
                    ConsoleOutput::print_counts(&result);
                    Ok(())
                }
            }
        }
        Some(Commands::Template) => {
            let app = App::new(store, config, NopOncotree, NopStudies, NopModel);
            match output_mode {
                OutputMode::NonInteractive => {
                    let result = app.write_template(&JsonOutput)?;
                    JsonOutput::print_template(&result).into_diagnostic()
                }
                OutputMode::Interactive => {
                    let result = app.write_template(&ConsoleOutput)?;
                    ConsoleOutput::print_template(&result);
                    Ok(())
                }
            }
        }
        Some(Commands::Recommend) => {
            let model = OpenAiChatClient::from_config(&config)?;
            let app = App::new(store, config, NopOncotree, NopStudies, model);
            match output_mode {
                OutputMode::NonInteractive => {
                    let result = app.recommend(&JsonOutput)?;
                    JsonOutput::print_recommend(&result).into_diagnostic()
                }
                OutputMode::Interactive => {
                    let result = app.recommend(&ConsoleOutput)?;
                    ConsoleOutput::print_recommend(&result);
                    Ok(())
                }
            }
        }
        Some(Commands::Run) => run_pipeline(store, config, output_mode),
        Some(Commands::View(args)) => run_view(args, &store, output_mode),
        None => match output_mode {
            OutputMode::Interactive => run_view(ViewArgs { code: None }, &store, output_mode),
            OutputMode::NonInteractive => Err(miette::Report::msg(
                "command required (try `onco-genes --help`)",
            )),
        },
    }
}

fn run_pipeline(
    store: Store,
    config: ResolvedConfig,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let oncotree = OncotreeHttpClient::new(&config.oncotree_url, config.request_timeout)?;
    let studies = CbioportalHttpClient::new(&config.cbioportal_url, config.request_timeout)?;
    let model = OpenAiChatClient::from_config(&config)?;
    let app = App::new(store, config, oncotree, studies, model);
    match output_mode {
        OutputMode::NonInteractive => {
            let result = app.run_pipeline(&JsonOutput)?;
            JsonOutput::print_pipeline(&result).into_diagnostic()
        }
        OutputMode::Interactive => {
            let result = app.run_pipeline(&ConsoleOutput)?;
            ConsoleOutput::print_pipeline(&result);
            Ok(())
        }
    }
}

fn run_view(args: ViewArgs, store: &Store, output_mode: OutputMode) -> miette::Result<()> {
    let viewer = Viewer::load(store)?;
    match (args.code, output_mode) {
        (Some(code), OutputMode::NonInteractive) => {
            JsonOutput::print_lookup(&viewer.lookup(&code)).into_diagnostic()
        }
        (Some(code), OutputMode::Interactive) => {
            ConsoleOutput::print_lookup(&viewer.lookup(&code));
            Ok(())
        }
        (None, OutputMode::Interactive) => Tui::new(viewer).run(),
        (None, OutputMode::NonInteractive) => Err(miette::Report::msg(
            "--code is required with --non-interactive",
        )),
    }
}

struct NopOncotree;
struct NopStudies;
struct NopModel;

impl OncotreeClient for NopOncotree {
    fn fetch_tumor_types(&self) -> Result<String, OncoError> {
        Err(OncoError::OncotreeHttp(
            "OncoTree client not configured".to_string(),
        ))
    }
}

impl StudyClient for NopStudies {
    fn fetch_studies_page(
        &self,
        _page_size: usize,
        _page_number: usize,
    ) -> Result<Vec<Study>, OncoError> {
        Err(OncoError::CbioportalHttp(
            "cBioPortal client not configured".to_string(),
        ))
    }
}

impl RecommendationModel for NopModel {
    fn generate(&self, _prompt: &str) -> Result<GeneRecommendations, OncoError> {
        Err(OncoError::LlmHttp(
            "language model client not configured".to_string(),
        ))
    }
}
