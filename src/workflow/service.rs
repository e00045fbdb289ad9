//! Workflow operations over a [`TaskStore`].

use chrono::NaiveDate;
use tracing::info;

use crate::db::TaskStore;
use crate::error::{Error, Result};
use crate::models::{Document, DocumentType, Phase, Project, Status, StatusChange, StatusRecord};
use crate::workflow::derive;

/// Moves document `id` to `status` on behalf of `actor`.
pub async fn set_status<S: TaskStore + ?Sized>(
    store: &S,
    id: i32,
    status: Status,
    actor: i32,
    comment: Option<String>,
) -> Result<Document> {
    let change = StatusChange::new(status, actor, comment);
    store.transition_status(id, &change).await
}

pub async fn status_history<S: TaskStore + ?Sized>(
    store: &S,
    id: i32,
) -> Result<Vec<StatusRecord>> {
    store.status_history(id).await
}

/// Saves a copy of estimation `id` dated `today` and returns it.
pub async fn duplicate_estimation<S: TaskStore + ?Sized>(
    store: &S,
    id: i32,
    today: NaiveDate,
) -> Result<Document> {
    let estimation = store.load_document(id).await?;
    let mut copy = derive::duplicate(&estimation, today)?;
    copy.id = store.save_document(&copy).await?;

    info!(source = id, copy = copy.id, "estimation duplicated");
    store.load_document(copy.id).await
}

/// Saves a draft cancel-invoice reversing invoice `id` and returns it.
pub async fn cancel_invoice<S: TaskStore + ?Sized>(
    store: &S,
    id: i32,
    today: NaiveDate,
) -> Result<Document> {
    let invoice = store.load_document(id).await?;
    let mut cancel = derive::generate_cancel_invoice(&invoice, today)?;
    cancel.id = store.save_document(&cancel).await?;

    info!(invoice = id, cancel_invoice = cancel.id, "cancel invoice generated");
    store.load_document(cancel.id).await
}

/// Current highest official number of `kind` for `year`; `None` when the year has none yet.
pub async fn next_official_number<S: TaskStore + ?Sized>(
    store: &S,
    kind: DocumentType,
    year: i32,
) -> Result<Option<i32>> {
    store.max_official_number(kind, year).await
}

/// Invoices of the company still awaiting payment past the delay.
pub async fn late_documents<S: TaskStore + ?Sized>(
    store: &S,
    company_id: i32,
    today: NaiveDate,
) -> Result<Vec<Document>> {
    let documents = store.documents_by_company(company_id, None).await?;
    Ok(documents
        .into_iter()
        .filter(|document| document.is_late_on(today))
        .collect())
}

/// Saves a new project along with its default phase.
pub async fn create_project<S: TaskStore + ?Sized>(
    store: &S,
    project: &Project,
) -> Result<(Project, Phase)> {
    if project.id != 0 {
        return Err(Error::validation(format!("project {} already exists", project.id)));
    }
    if project.name.trim().is_empty() {
        return Err(Error::validation("project name is required"));
    }

    let (project, phase) = store.create_project(project).await?;
    info!(id = project.id, name = %project.name, phase = phase.id, "project created");
    Ok((project, phase))
}

pub async fn archive_project<S: TaskStore + ?Sized>(store: &S, id: i32) -> Result<Project> {
    let mut project = store.load_project(id).await?;
    project.archived = true;
    store.save_project(&project).await?;

    info!(id, name = %project.name, "project archived");
    Ok(project)
}

/// Deletes an archived project whose documents may all be deleted.
pub async fn delete_project<S: TaskStore + ?Sized>(store: &S, id: i32) -> Result<()> {
    store.delete_project(id).await?;
    info!(id, "project deleted");
    Ok(())
}

pub async fn delete_client<S: TaskStore + ?Sized>(store: &S, id: i32) -> Result<()> {
    store.delete_client(id).await?;
    info!(id, "client deleted");
    Ok(())
}

pub async fn add_phase<S: TaskStore + ?Sized>(
    store: &S,
    project_id: i32,
    name: &str,
) -> Result<Phase> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("phase name is required"));
    }

    // Make sure the project exists
    store.load_project(project_id).await?;

    let mut phase = Phase::new(project_id, name);
    phase.id = store.save_phase(&phase).await?;
    Ok(phase)
}
