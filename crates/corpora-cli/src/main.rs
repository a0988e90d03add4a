//! Corpora CLI — command-line ingestion client for the Corpora API.
//!
//! Set CORPORA_API_URL (or API_URL) and, if the server requires auth,
//! CORPORA_API_TOKEN.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use corpora_cli::progress::ProgressPresenter;
use corpora_cli::{init_tracing, truncate_string};
use corpora_client::{
    ApiClient, CategoryRepository, FileRepository, OrchestratorConfig, ProgressHandler,
    UploadOrchestrator, UploadSource,
};
use corpora_core::{format_file_size, validate_files, Config, PendingFile, UploadMetadata};

#[derive(Parser)]
#[command(name = "corpora", about = "Corpora ingestion CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload local documents into a category
    Ingest {
        /// Paths of the documents to upload
        files: Vec<PathBuf>,
        /// Category id the documents belong to
        #[arg(long)]
        category: String,
        /// Tag to attach (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Fetch a remote document and ingest it
    IngestUrl {
        /// URL of the document to download and upload
        url: String,
        /// Category id the document belongs to
        #[arg(long)]
        category: String,
        /// Tag to attach (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Ingested file operations
    Files {
        #[command(subcommand)]
        sub: FileCommands,
    },
    /// Category operations
    Categories {
        #[command(subcommand)]
        sub: CategoryCommands,
    },
}

#[derive(Subcommand)]
enum FileCommands {
    /// List ingested files
    List,
    /// Delete an ingested file by id
    Delete {
        /// File id
        id: String,
    },
}

#[derive(Subcommand)]
enum CategoryCommands {
    /// List categories
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::from_env()
        .context("Failed to load configuration. Set CORPORA_API_URL (or API_URL)")?;
    let client = Arc::new(ApiClient::from_config(&config)?);

    let cli = Cli::parse();

    match cli.command {
        Commands::Ingest {
            files,
            category,
            tags,
        } => {
            let mut sources = Vec::with_capacity(files.len());
            for path in &files {
                sources.push(UploadSource::from_path(path).await?);
            }
            ingest(&config, client, sources, category, tags).await?;
        }
        Commands::IngestUrl {
            url,
            category,
            tags,
        } => {
            let source = client.download_document(&url).await?;
            ingest(&config, client, vec![source], category, tags).await?;
        }
        Commands::Files { sub } => match sub {
            FileCommands::List => {
                let repo = FileRepository::new(client);
                let files = repo.get().await?;
                println!(
                    "{:<26} {:<40} {:<16} {:>10} {:<12}",
                    "ID", "FILENAME", "CATEGORY", "SIZE", "STAGE"
                );
                for file in files {
                    println!(
                        "{:<26} {:<40} {:<16} {:>10} {:<12}",
                        truncate_string(&file.id, 26),
                        truncate_string(&file.filename, 40),
                        truncate_string(&file.category_id, 16),
                        format_file_size(file.size_bytes.max(0) as u64),
                        file.current_stage.as_deref().unwrap_or("-"),
                    );
                }
            }
            FileCommands::Delete { id } => {
                let repo = FileRepository::new(client);
                repo.delete(&id).await?;
                println!("File {} deleted", id);
            }
        },
        Commands::Categories { sub } => match sub {
            CategoryCommands::List => {
                let repo = CategoryRepository::new(client);
                let categories = repo.get().await?;
                println!("{:<26} {:<30} TAGS", "ID", "NAME");
                for category in categories {
                    println!(
                        "{:<26} {:<30} {}",
                        truncate_string(&category.id, 26),
                        truncate_string(&category.name, 30),
                        category.tags.join(", "),
                    );
                }
            }
        },
    }

    Ok(())
}

async fn ingest(
    config: &Config,
    client: Arc<ApiClient>,
    sources: Vec<UploadSource>,
    category: String,
    tags: Vec<String>,
) -> anyhow::Result<()> {
    let candidates: Vec<PendingFile> = sources.iter().map(|s| s.file.clone()).collect();
    let validated = validate_files(candidates, &config.allow_list())?;
    if validated.has_rejections() {
        eprintln!(
            "Skipping unsupported files: {}",
            validated.rejected.join(", ")
        );
    }
    let accepted: HashSet<&str> = validated.accepted.iter().map(|f| f.name.as_str()).collect();
    let sources: Vec<UploadSource> = sources
        .into_iter()
        .filter(|s| accepted.contains(s.file.name.as_str()))
        .collect();

    let mut metadata = UploadMetadata::new(category);
    for tag in &tags {
        metadata.add_tag(tag)?;
    }

    let mirror = Arc::new(FileRepository::new(client.clone()));
    let orchestrator = UploadOrchestrator::new(client, OrchestratorConfig::from_config(config))
        .with_file_mirror(mirror);

    let presenter = ProgressPresenter::new()?;
    let render = presenter.clone();
    let handler: ProgressHandler = Arc::new(move |snapshot| render.render(&snapshot));

    let count = sources.len();
    match orchestrator.submit(sources, metadata, handler).await {
        Ok(_) => {
            presenter.finish();
            println!("{} document(s) uploaded successfully", count);
            Ok(())
        }
        Err(err) => {
            presenter.abandon();
            Err(anyhow::anyhow!("{}", err.user_message()))
        }
    }
}
