mod api;
mod config;
mod service;
mod upload;

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use docverify_config::DocVerifyConfig;
use docverify_core::{DocumentRegistry, ExtractionOutcome, FieldId, FormInput, Reconciler};
use docverify_store::SubmissionStore;

use api::AppState;
use service::DocumentService;

#[derive(Parser)]
#[command(name = "docverify")]
#[command(about = "DocVerify: check uploaded documents against form data")]
#[command(version)]
struct Cli {
    /// Path to the YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Check one document image against form values and print the report
    Validate {
        /// Document type: aadhar, pan or marksheet
        #[arg(short = 't', long = "type")]
        doc_type: String,
        /// Path to the document image
        #[arg(short, long)]
        file: PathBuf,
        /// Form value as key=value, repeatable
        #[arg(long = "field", value_parser = parse_field)]
        fields: Vec<(FieldId, String)>,
    },
    /// Query a running server's health endpoint
    Status,
}

fn parse_field(raw: &str) -> Result<(FieldId, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {raw}"))?;
    let field = FieldId::from_str(key.trim()).map_err(|e| e.to_string())?;
    Ok((field, value.to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load(cli.config).await?;

    docverify_logging::init_logger(
        config.logging.dir.as_deref().map(Path::new),
        &config.logging.level,
        config.logging.json,
    );
    docverify_config::check(&config)?;

    match cli.command {
        Commands::Serve { port } => {
            let mut config = config;
            if let Some(port) = port {
                config.server.port = port;
            }
            run_server(config).await?;
        }
        Commands::Validate { doc_type, file, fields } => {
            run_validate(&config, &doc_type, &file, fields).await?;
        }
        Commands::Status => {
            let url = format!("http://localhost:{}/api/health", config.server.port);
            match reqwest::get(&url).await {
                Ok(resp) => {
                    let body: serde_json::Value = resp.json().await?;
                    println!("{}", serde_json::to_string_pretty(&body)?);
                }
                Err(_) => {
                    println!("DocVerify is not running on port {}", config.server.port);
                }
            }
        }
    }

    Ok(())
}

async fn run_server(config: DocVerifyConfig) -> Result<()> {
    info!(
        port = config.server.port,
        bind = %config.server.bind,
        db = %config.storage.db_path,
        "Starting DocVerify"
    );

    let registry = Arc::new(DocumentRegistry::builtin());
    let extractor = config::build_extractor(&config.extraction, &registry)?;
    let store = SubmissionStore::open(&config.storage.db_path)?;
    let service = DocumentService::new(
        registry,
        extractor,
        Arc::new(store),
        &config.server.upload_dir,
    );

    let app = api::build_router(Arc::new(AppState { service }), config.server.max_upload_bytes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());
    let addr = format!("{}:{}", config.server.bind, config.server.port);

    info!(addr = %addr, "HTTP API listening");

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn run_validate(
    config: &DocVerifyConfig,
    doc_type: &str,
    file: &Path,
    fields: Vec<(FieldId, String)>,
) -> Result<()> {
    let registry = Arc::new(DocumentRegistry::builtin());
    let doc_type = registry.resolve(doc_type)?;
    let extractor = config::build_extractor(&config.extraction, &registry)?;

    let prompt = registry.prompt_for(doc_type)?;
    let extracted = match extractor.extract(file, prompt).await {
        ExtractionOutcome::Success(doc) => doc,
        ExtractionOutcome::Failure(reason) => {
            anyhow::bail!("Failed to extract data from {}: {reason}", file.display())
        }
    };

    let form = fields
        .into_iter()
        .fold(FormInput::new(), |form, (field, value)| form.with(field, value));
    let report = Reconciler::new(registry).reconcile(doc_type, &extracted, &form)?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
