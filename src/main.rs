use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use notebridge::{
    config, logging,
    notebook::{Document, NotebookService, UploadProtocol},
};

#[derive(Parser)]
#[command(
    name = "notebridge",
    about = "Command-line companion for the document-intelligence API"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload a file for processing and print the resulting record.
    Process {
        /// Path to the document (pdf, txt, md, or docx).
        #[arg(long)]
        file: PathBuf,
        /// Title stored with the document.
        #[arg(long)]
        title: String,
        /// Upload protocol override (`v1` or `v2`).
        #[arg(long)]
        protocol: Option<String>,
    },
    /// List all processed documents.
    List,
    /// Show a single document by id.
    Get { id: String },
    /// Delete a document by id.
    Delete { id: String },
    /// Ask a question, optionally scoped to specific document ids.
    Query {
        question: String,
        /// Restrict the question to these document ids (repeatable).
        #[arg(long = "doc")]
        documents: Vec<String>,
    },
    /// Show past questions and answers.
    History,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    config::init_config();
    logging::init_tracing();
    let cli = Cli::parse();
    let service = NotebookService::new()?;

    match cli.command {
        Command::Process {
            file,
            title,
            protocol,
        } => {
            let filename = file
                .file_name()
                .and_then(|name| name.to_str())
                .ok_or_else(|| anyhow!("path has no usable filename: {}", file.display()))?
                .to_string();
            let content = std::fs::read(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let document = match protocol {
                Some(value) => {
                    let protocol: UploadProtocol = value
                        .parse()
                        .map_err(|()| anyhow!("invalid protocol {value:?}; expected v1 or v2"))?;
                    service
                        .process_document_with(protocol, content, &filename, &title)
                        .await?
                }
                None => service.process_document(content, &filename, &title).await?,
            };
            print_document(&document);
        }
        Command::List => {
            let documents = service.list_documents().await?;
            if documents.is_empty() {
                println!("no documents");
            }
            for document in &documents {
                println!("{}  {:?}  {}", document.id, document.status, document.title);
            }
        }
        Command::Get { id } => {
            let document = service.get_document(&id).await?;
            print_document(&document);
        }
        Command::Delete { id } => {
            let confirmation = service.delete_document(&id).await?;
            println!("{confirmation}");
        }
        Command::Query {
            question,
            documents,
        } => {
            let answer = service.query(&question, &documents).await?;
            println!("{}", answer.answer);
            if !answer.sources.is_empty() {
                println!("sources: {}", answer.sources.join(", "));
            }
            println!("documents consulted: {}", answer.documents_consulted);
        }
        Command::History => {
            let entries = service.chat_history().await?;
            if entries.is_empty() {
                println!("no history");
            }
            for entry in &entries {
                println!("[{}] Q: {}", entry.created_at, entry.question);
                println!("    A: {}", entry.answer);
            }
        }
    }

    Ok(())
}

fn print_document(document: &Document) {
    println!("id:     {}", document.id);
    println!("title:  {}", document.title);
    println!("status: {:?}", document.status);
    if let Some(source) = document.source {
        println!("source: {source:?}");
    }
    if let Some(analysis) = &document.analysis {
        if let Some(summary) = &analysis.summary {
            println!("summary:\n{summary}");
        }
        if let Some(bullets) = &analysis.bullet_points {
            println!("key points:\n{bullets}");
        }
        if !analysis.topics.is_empty() {
            println!("topics: {}", analysis.topics.join(", "));
        }
        if let Some(confidence) = &analysis.confidence {
            println!("confidence: {confidence}");
        }
    }
}
