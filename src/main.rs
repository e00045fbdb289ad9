use anyhow::{Context, Result};
use chrono::{Datelike, Local};
use clap::{Parser, Subcommand};
use tracing::debug;

use cae_manager::models::{Document, DocumentType, Project, Status};
use cae_manager::workflow::service;
use cae_manager::{config, db, logging};

#[derive(Parser)]
#[command(name = "cae_manager", version, about = "Estimation and invoice workflow")]
struct Cli {
    /// Overrides DATABASE_URL
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Move a document to another status
    Status {
        id: i32,
        status: String,
        #[arg(long)]
        actor: i32,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Copy an estimation into a new one dated today
    Duplicate { id: i32 },
    /// Generate the cancel invoice of an invoice
    Cancel { id: i32 },
    /// Highest official number used this year (or --year)
    NextNumber {
        kind: String,
        #[arg(long)]
        year: Option<i32>,
    },
    /// Invoices of a company awaiting payment for too long
    Late { company_id: i32 },
    /// Status history of a document
    History { id: i32 },
    /// Create a project with its default phase
    #[command(name = "create-project")]
    CreateProject {
        company_id: i32,
        name: String,
        code: String,
        #[arg(long)]
        client: Option<i32>,
    },
    #[command(name = "archive-project")]
    ArchiveProject { id: i32 },
    #[command(name = "delete-project")]
    DeleteProject { id: i32 },
    #[command(name = "delete-client")]
    DeleteClient { id: i32 },
    #[command(name = "add-phase")]
    AddPhase { project_id: i32, name: String },
}

fn print_document(document: &Document) {
    println!(
        "#{} {} {:?} [{}] {} HT {}",
        document.id,
        document.doc_type(),
        document.name,
        document.status.map(|status| status.as_str()).unwrap_or("-"),
        document.task_date,
        document.totals().total_ht,
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    // Load configuration
    let config = config::init(cli.database_url)?;

    // Initialize database connection
    let db = db::init(&config).await.context("could not connect to the database")?;
    debug!("database connection established");

    let today = Local::now().date_naive();

    match cli.command {
        Command::Status { id, status, actor, comment } => {
            let status: Status = status.parse()?;
            let document = service::set_status(&db, id, status, actor, comment).await?;
            print_document(&document);
            println!("{}", document.status_summary(None));
        }
        Command::Duplicate { id } => {
            let copy = service::duplicate_estimation(&db, id, today).await?;
            print_document(&copy);
        }
        Command::Cancel { id } => {
            let cancel = service::cancel_invoice(&db, id, today).await?;
            print_document(&cancel);
        }
        Command::NextNumber { kind, year } => {
            let kind: DocumentType = kind.parse()?;
            let year = year.unwrap_or_else(|| today.year());
            match service::next_official_number(&db, kind, year).await? {
                Some(number) => println!("{number}"),
                None => println!("no {kind} numbered in {year}"),
            }
        }
        Command::Late { company_id } => {
            let late = service::late_documents(&db, company_id, today).await?;
            if late.is_empty() {
                println!("No late documents");
            }
            for document in &late {
                print_document(document);
            }
        }
        Command::History { id } => {
            for record in service::status_history(&db, id).await? {
                println!(
                    "{} {} by {} {}",
                    record.status_date.format("%d/%m/%Y %H:%M"),
                    record.status_code,
                    record
                        .status_person
                        .map(|id| id.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    record.status_comment.unwrap_or_default(),
                );
            }
        }
        Command::CreateProject { company_id, name, code, client } => {
            let project = Project {
                id: 0,
                company_id,
                client_id: client,
                name,
                code,
                definition: None,
                archived: false,
                starting_date: Some(today),
                ending_date: None,
            };
            let (project, phase) = service::create_project(&db, &project).await?;
            println!("Project #{} {} created with phase {}", project.id, project.name, phase.name);
        }
        Command::ArchiveProject { id } => {
            let project = service::archive_project(&db, id).await?;
            println!("Project {} archived", project.name);
        }
        Command::DeleteProject { id } => {
            service::delete_project(&db, id).await?;
            println!("Project {id} deleted");
        }
        Command::DeleteClient { id } => {
            service::delete_client(&db, id).await?;
            println!("Client {id} deleted");
        }
        Command::AddPhase { project_id, name } => {
            let phase = service::add_phase(&db, project_id, &name).await?;
            println!("Phase #{} {} added", phase.id, phase.name);
        }
    }

    Ok(())
}
