use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{DocumentStore, DocumentsPage, HttpDocumentApi, PageAction, PageError};
use shared::domain::DocumentId;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = "http://127.0.0.1:8000")]
    server_url: String,
    /// Per-request timeout; requests wait indefinitely when omitted.
    #[arg(long)]
    timeout_secs: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    List {
        #[arg(long)]
        json: bool,
    },
    Show {
        id: String,
    },
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
    },
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
    },
    Delete {
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();
    let args = Args::parse();

    let api = match args.timeout_secs {
        Some(secs) => HttpDocumentApi::with_timeout(&args.server_url, Duration::from_secs(secs))?,
        None => HttpDocumentApi::new(&args.server_url)?,
    };
    info!(server_url = %api.base_url(), "using document service");
    let mut page = DocumentsPage::new(Arc::new(DocumentStore::new(Arc::new(api))));

    step(&mut page, PageAction::Load).await?;

    match args.command {
        Command::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&page.documents().await)?);
            } else {
                for preview in page.previews().await {
                    println!("{}  {}\n    {}", preview.id, preview.title, preview.excerpt);
                }
            }
        }
        Command::Show { id } => {
            step(&mut page, PageAction::OpenView(DocumentId::new(id))).await?;
            let modal = page.modal();
            println!("{}\n\n{}", modal.draft_title(), modal.draft_content());
        }
        Command::Create { title, content } => {
            step(&mut page, PageAction::OpenCreate).await?;
            step(&mut page, PageAction::EditTitle(title)).await?;
            step(&mut page, PageAction::EditContent(content)).await?;
            step(&mut page, PageAction::Submit).await?;
            if let Some(created) = page.documents().await.last() {
                println!("created document_id={}", created.id);
            }
        }
        Command::Edit { id, title, content } => {
            step(&mut page, PageAction::OpenEdit(DocumentId::new(id.clone()))).await?;
            if let Some(title) = title {
                step(&mut page, PageAction::EditTitle(title)).await?;
            }
            if let Some(content) = content {
                step(&mut page, PageAction::EditContent(content)).await?;
            }
            step(&mut page, PageAction::Submit).await?;
            println!("updated document_id={id}");
        }
        Command::Delete { id } => {
            step(&mut page, PageAction::Delete(DocumentId::new(id.clone()))).await?;
            println!("deleted document_id={id}");
        }
    }

    Ok(())
}

async fn step(page: &mut DocumentsPage, action: PageAction) -> Result<()> {
    let name = action.name();
    page.dispatch(action)
        .await
        .map_err(|err| match err {
            PageError::Store(_) => anyhow::anyhow!(
                "{}",
                page.error_message().unwrap_or_else(|| err.to_string())
            ),
            other => anyhow::Error::new(other),
        })
        .with_context(|| format!("{name} failed"))
}
