mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::models::{
    Client, Company, Document, DocumentType, Phase, Project, StatusChange, StatusRecord,
};

pub use memory::MemoryStore;
pub use postgres::{Database, init};

/// Persistence boundary of the workflow.
///
/// Records are keyed by integer ids; an id of 0 means "not saved yet".
/// Saving a document never changes the status of an existing one: status
/// only moves through [`TaskStore::transition_status`].
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn load_document(&self, id: i32) -> Result<Document>;

    /// Inserts (id 0) or updates a document and replaces its lines. Returns its id.
    ///
    /// A new document carrying a status must pass
    /// [`check_initial_status`](crate::workflow::check_initial_status); that
    /// status is recorded in its history.
    async fn save_document(&self, document: &Document) -> Result<i32>;

    /// Reads the current status, runs the transition guard and writes the
    /// new status plus a history record, as one atomic unit.
    async fn transition_status(&self, id: i32, change: &StatusChange) -> Result<Document>;

    async fn status_history(&self, id: i32) -> Result<Vec<StatusRecord>>;

    async fn documents_by_project(&self, project_id: i32) -> Result<Vec<Document>>;

    /// Documents of the client's projects plus its manual invoices.
    async fn documents_by_client(&self, client_id: i32) -> Result<Vec<Document>>;

    async fn documents_by_company(
        &self,
        company_id: i32,
        year: Option<i32>,
    ) -> Result<Vec<Document>>;

    /// Highest official number among `kind` documents dated in `year`.
    async fn max_official_number(&self, kind: DocumentType, year: i32) -> Result<Option<i32>>;

    async fn load_company(&self, id: i32) -> Result<Company>;

    async fn load_project(&self, id: i32) -> Result<Project>;

    async fn save_project(&self, project: &Project) -> Result<i32>;

    /// Inserts a new project together with its default phase.
    async fn create_project(&self, project: &Project) -> Result<(Project, Phase)>;

    /// Removes the project with its phases and documents.
    ///
    /// Fails with [`Error::NotDeletable`] unless [`Project::is_deletable`]
    /// holds; the check and the removal are one atomic unit.
    async fn delete_project(&self, id: i32) -> Result<()>;

    async fn phases_by_project(&self, project_id: i32) -> Result<Vec<Phase>>;

    async fn save_phase(&self, phase: &Phase) -> Result<i32>;

    async fn load_client(&self, id: i32) -> Result<Client>;

    async fn save_client(&self, client: &Client) -> Result<i32>;

    /// Removes the client with its projects and documents, under the same
    /// atomic deletability check as [`TaskStore::delete_project`].
    async fn delete_client(&self, id: i32) -> Result<()>;
}

/// First day of `year` and of the year after.
pub(crate) fn year_bounds(year: i32) -> Result<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1);
    let end = year.checked_add(1).and_then(|next| NaiveDate::from_ymd_opt(next, 1, 1));
    match (start, end) {
        (Some(start), Some(end)) => Ok((start, end)),
        _ => Err(Error::validation(format!("year {year} is out of range"))),
    }
}
