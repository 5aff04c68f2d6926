mod assistant;
mod config;
mod error;
mod models;
mod pipeline;
mod prompts;
mod report;
mod server;
mod session;
mod shell;
mod tasks;
#[cfg(test)]
mod testing;
mod tools;

use anyhow::{bail, Result};
use assistant::ResearchAssistant;
use clap::{Parser, Subcommand};
use config::Settings;
use pipeline::{ProgressEvent, ProgressFn, ResearchPipeline};
use report::ReportFormat;
use session::SessionStore;
use std::path::PathBuf;
use std::sync::Arc;
use tools::fetcher::HttpFetcher;
use tools::llm::{LanguageModel, OpenAiModel};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "research-assistant")]
#[command(about = "Search the web, summarize what it says, and keep asking questions about it", long_about = None)]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive research session in the terminal (default)
    Shell,
    /// Serve the assistant over HTTP
    Serve {
        #[arg(long, env = "RESEARCH_BIND", default_value = "127.0.0.1:3000")]
        bind: String,
    },
    /// Write the saved session as a report without starting a session
    Export {
        #[arg(value_parser = ["json", "md", "markdown", "pdf", "all"])]
        format: String,
        /// Output directory; defaults to the configured export directory
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("research_assistant=info,graph_flow=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = cli.settings;

    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Shell => {
            let progress: ProgressFn = Arc::new(shell::print_progress);
            let mut assistant = build_assistant(&settings, progress)?;
            shell::run(&mut assistant, settings.export_dir.clone()).await?;
        }
        Commands::Serve { bind } => {
            let progress: ProgressFn = Arc::new(log_progress);
            let assistant = build_assistant(&settings, progress)?;
            server::serve(assistant, &bind).await?;
        }
        Commands::Export { format, out } => {
            let assistant = build_assistant(&settings, pipeline::silent_progress())?;
            if !assistant.has_session() {
                bail!(
                    "no saved research session in {}",
                    assistant.session_path().display()
                );
            }
            let formats = match ReportFormat::parse(&format) {
                Some(format) => vec![format],
                None => ReportFormat::ALL.to_vec(),
            };
            let dir = out.unwrap_or_else(|| settings.export_dir.clone());
            for format in formats {
                let path = assistant.export_to_dir(format, &dir)?;
                println!("Saved {}", path.display());
            }
        }
    }

    Ok(())
}

fn build_assistant(settings: &Settings, progress: ProgressFn) -> Result<ResearchAssistant> {
    let store = SessionStore::load(&settings.session_file);
    let model: Arc<dyn LanguageModel> =
        Arc::new(OpenAiModel::new(settings.model.clone(), settings.temperature));
    let pipeline = ResearchPipeline::new(
        settings.build_search_provider()?,
        Arc::new(HttpFetcher::new(settings.fetch_timeout_secs)?),
        model.clone(),
        settings.max_results,
        settings.char_budget,
        progress,
    );

    info!(
        provider = ?settings.search_provider,
        model = %settings.model,
        "Session file: {}",
        settings.session_file.display()
    );
    Ok(ResearchAssistant::new(store, pipeline, model))
}

fn log_progress(event: &ProgressEvent) {
    match event {
        ProgressEvent::Searching { query } => info!("Searching the web for {:?}", query),
        ProgressEvent::Scraping { url } => info!("Scraping: {}", url),
        ProgressEvent::ScrapeFailed { error, .. } => info!("{}", error),
        ProgressEvent::Summarizing => info!("Summarizing the research"),
    }
}
