//! docquery - Main CLI Entry Point

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use docquery::{
    cli::{load_document, Args, Commands},
    config::Config,
    logging,
    model::{GeminiClient, ResilientModelClient},
    rag::{DocumentPool, RagQueryOrchestrator},
    telemetry::{TelemetryCollector, TelemetryDisplay},
    types::Document,
    ErrorKind,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Err(e) = args.validate() {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(2);
    }

    // `init` writes the defaults, so the target file need not exist yet
    let loaded = if matches!(args.command, Some(Commands::Init { .. })) {
        Ok(Config::default())
    } else {
        Config::load(args.config.clone())
    };
    let mut config = match loaded {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(2);
        }
    };
    if let Some(model) = &args.model {
        config.model.model = model.clone();
    }

    logging::init(&config.logging.level, args.verbosity());

    match &args.command {
        Some(Commands::Chunks { max_chunk_size }) => {
            show_chunks(&args, &config, *max_chunk_size)?;
        }
        Some(Commands::Config) => {
            show_config(&config)?;
        }
        Some(Commands::Init { force }) => {
            init_config(&args, &config, *force)?;
        }
        None => {
            if let Some(question) = &args.question {
                let code = run_query(&args, &config, question).await?;
                if code != 0 {
                    std::process::exit(code);
                }
            }
        }
    }

    Ok(())
}

fn load_documents(args: &Args) -> Result<Vec<Document>> {
    args.docs
        .iter()
        .map(|path| load_document(path).map_err(anyhow::Error::from))
        .collect()
}

async fn run_query(args: &Args, config: &Config, question: &str) -> Result<i32> {
    let verbosity = args.verbosity();
    let documents = load_documents(args)?;

    let api_key = config.model.resolve_api_key()?;
    let backend = GeminiClient::with_config(&config.model.base_url, &config.model.model, api_key)?;

    let telemetry = TelemetryCollector::new();
    let client = Arc::new(
        ResilientModelClient::with_policy(Arc::new(backend), config.retry.policy())
            .with_telemetry(telemetry.clone()),
    );
    let orchestrator = RagQueryOrchestrator::with_config(client, config.rag.clone())
        .with_prompts(config.prompts.clone())
        .with_generation_config(config.model.generation_config())
        .with_telemetry(telemetry.clone());

    // Ctrl-C aborts the in-flight query instead of killing the process
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_token.cancel();
        }
    });

    let pb = if verbosity.show_progress() {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!(
            "Reading {} document(s) with {}...",
            documents.len(),
            config.model.model
        ));
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let result = orchestrator
        .answer_query_with_cancel(question, &documents, cancel)
        .await;

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let code = match result.error {
        None => {
            println!("{}", result.answer);
            if verbosity.show_progress() && !result.sources_used.is_empty() {
                let sources: Vec<&str> = result.sources_used.iter().map(String::as_str).collect();
                println!("\n{} {}", "Sources:".bold(), sources.join(", ").cyan());
            }
            0
        }
        Some(ErrorKind::EmptyDocumentPool) => {
            eprintln!(
                "{} No documents to search. Pass at least one non-empty --doc <PATH>.",
                "Error:".red().bold()
            );
            1
        }
        Some(ErrorKind::Cancelled) => {
            eprintln!("{}", "Cancelled.".yellow());
            130
        }
        Some(kind) => {
            eprintln!("{} {}", "Error:".red().bold(), result.answer);
            if verbosity.show_events() {
                eprintln!("  kind: {}", kind);
            }
            1
        }
    };

    TelemetryDisplay::new(telemetry, verbosity).display_summary();

    Ok(code)
}

fn show_chunks(args: &Args, config: &Config, max_chunk_size: Option<usize>) -> Result<()> {
    let documents = load_documents(args)?;
    let max_chunk_size = max_chunk_size.unwrap_or(config.rag.max_chunk_size);
    let chunks = DocumentPool::new(&documents).chunks_for(max_chunk_size);

    for (i, chunk) in chunks.iter().enumerate() {
        println!(
            "{} {} ({} chars)",
            format!("#{}", i + 1).bold(),
            chunk.source_name.cyan(),
            chunk.content.chars().count()
        );
        println!("{}\n", chunk.content);
    }
    println!(
        "{} chunk(s) from {} document(s), max {} chars",
        chunks.len(),
        documents.len(),
        max_chunk_size
    );

    Ok(())
}

fn show_config(config: &Config) -> Result<()> {
    if let Some(path) = Config::default_path() {
        println!("{} {}\n", "Default location:".bold(), path.display());
    }
    println!("{}", config.to_display_toml()?);
    Ok(())
}

fn init_config(args: &Args, config: &Config, force: bool) -> Result<()> {
    let path = match args.config.clone().or_else(Config::default_path) {
        Some(path) => path,
        None => anyhow::bail!("Cannot determine home directory; pass --config <PATH>"),
    };

    if path.exists() && !force {
        eprintln!(
            "{} {} already exists (use --force to overwrite)",
            "Error:".red().bold(),
            path.display()
        );
        std::process::exit(1);
    }

    config.save(&path)?;
    println!("{} {}", "Wrote".green(), path.display());
    Ok(())
}
