use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Datelike;
use tokio::sync::Mutex;
use tracing::info;

use crate::db::TaskStore;
use crate::error::{Error, Result};
use crate::models::{
    Client, Company, Document, DocumentKind, DocumentType, Phase, Project, StatusChange,
    StatusRecord,
};
use crate::workflow::derive;

#[derive(Default)]
struct State {
    last_id: i32,
    documents: BTreeMap<i32, Document>,
    history: Vec<StatusRecord>,
    companies: BTreeMap<i32, Company>,
    projects: BTreeMap<i32, Project>,
    phases: BTreeMap<i32, Phase>,
    clients: BTreeMap<i32, Client>,
}

impl State {
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }

    fn client_project_ids(&self, client_id: i32) -> Vec<i32> {
        self.projects
            .values()
            .filter(|project| project.client_id == Some(client_id))
            .map(|project| project.id)
            .collect()
    }

    fn drop_projects(&mut self, project_ids: &[i32]) {
        let removed: Vec<i32> = self
            .documents
            .values()
            .filter(|document| document.project_id.is_some_and(|id| project_ids.contains(&id)))
            .map(|document| document.id)
            .collect();
        self.drop_documents(&removed);
        self.phases.retain(|_, phase| !project_ids.contains(&phase.project_id));
        self.projects.retain(|id, _| !project_ids.contains(id));
    }

    fn drop_documents(&mut self, ids: &[i32]) {
        self.documents.retain(|id, _| !ids.contains(id));
        self.history.retain(|record| !ids.contains(&record.document_id));
    }
}

fn owned_by_client(document: &Document, client_id: i32, project_ids: &[i32]) -> bool {
    match &document.kind {
        DocumentKind::ManualInvoice(data) => data.client_id == client_id,
        _ => document.project_id.is_some_and(|id| project_ids.contains(&id)),
    }
}

/// In-process store; a single lock serialises every operation.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_company(&self, company: Company) -> i32 {
        let mut state = self.state.lock().await;
        let id = if company.id == 0 { state.next_id() } else { company.id };
        state.companies.insert(id, Company { id, ..company });
        id
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn load_document(&self, id: i32) -> Result<Document> {
        let state = self.state.lock().await;
        state
            .documents
            .get(&id)
            .cloned()
            .ok_or(Error::not_found("document", id))
    }

    async fn save_document(&self, document: &Document) -> Result<i32> {
        let mut state = self.state.lock().await;
        let mut stored = document.clone();
        let mut initial = None;

        if document.id == 0 {
            initial = stored.initial_status()?;
            stored.id = state.next_id();
        } else {
            let existing = state
                .documents
                .get(&document.id)
                .filter(|existing| existing.doc_type() == document.doc_type())
                .ok_or(Error::not_found("document", document.id))?;
            stored.status = existing.status;
            stored.status_info = existing.status_info.clone();
        }

        let id = stored.id;
        for line in &mut stored.lines {
            line.id = state.next_id();
            line.document_id = id;
        }
        if let DocumentKind::Estimation(data) = &mut stored.kind {
            for line in &mut data.payment_lines {
                line.id = state.next_id();
                line.document_id = id;
            }
        }

        if let Some((status, info)) = initial {
            state.history.push(StatusRecord::from_info(id, status, &info));
        }
        state.documents.insert(id, stored);
        Ok(id)
    }

    async fn transition_status(&self, id: i32, change: &StatusChange) -> Result<Document> {
        let mut state = self.state.lock().await;
        let document = state
            .documents
            .get_mut(&id)
            .ok_or(Error::not_found("document", id))?;

        let previous = document.status;
        document.apply_status(change)?;
        let updated = document.clone();
        state.history.push(StatusRecord::from_change(id, change));

        info!(id, from = ?previous, to = %change.status, actor = change.actor, "status changed");
        Ok(updated)
    }

    async fn status_history(&self, id: i32) -> Result<Vec<StatusRecord>> {
        let state = self.state.lock().await;
        Ok(state
            .history
            .iter()
            .filter(|record| record.document_id == id)
            .cloned()
            .collect())
    }

    async fn documents_by_project(&self, project_id: i32) -> Result<Vec<Document>> {
        let state = self.state.lock().await;
        let mut documents: Vec<Document> = state
            .documents
            .values()
            .filter(|document| document.project_id == Some(project_id))
            .cloned()
            .collect();
        documents.sort_by_key(|document| (document.task_date, document.id));
        Ok(documents)
    }

    async fn documents_by_client(&self, client_id: i32) -> Result<Vec<Document>> {
        let state = self.state.lock().await;
        let project_ids = state.client_project_ids(client_id);
        let mut documents: Vec<Document> = state
            .documents
            .values()
            .filter(|document| owned_by_client(document, client_id, &project_ids))
            .cloned()
            .collect();
        documents.sort_by_key(|document| (document.task_date, document.id));
        Ok(documents)
    }

    async fn documents_by_company(
        &self,
        company_id: i32,
        year: Option<i32>,
    ) -> Result<Vec<Document>> {
        let state = self.state.lock().await;
        let mut documents: Vec<Document> = state
            .documents
            .values()
            .filter(|document| {
                let owner = match &document.kind {
                    DocumentKind::ManualInvoice(data) => Some(data.company_id),
                    _ => document
                        .project_id
                        .and_then(|id| state.projects.get(&id))
                        .map(|project| project.company_id),
                };
                let in_year = year.is_none_or(|year| document.task_date.year() == year);
                owner == Some(company_id) && in_year
            })
            .cloned()
            .collect();
        documents.sort_by_key(|document| (document.task_date, document.id));
        Ok(documents)
    }

    async fn max_official_number(&self, kind: DocumentType, year: i32) -> Result<Option<i32>> {
        let state = self.state.lock().await;
        Ok(derive::max_official_number(state.documents.values(), kind, year))
    }

    async fn load_company(&self, id: i32) -> Result<Company> {
        let state = self.state.lock().await;
        state.companies.get(&id).cloned().ok_or(Error::not_found("company", id))
    }

    async fn load_project(&self, id: i32) -> Result<Project> {
        let state = self.state.lock().await;
        state.projects.get(&id).cloned().ok_or(Error::not_found("project", id))
    }

    async fn save_project(&self, project: &Project) -> Result<i32> {
        let mut state = self.state.lock().await;
        let id = if project.id == 0 {
            state.next_id()
        } else if state.projects.contains_key(&project.id) {
            project.id
        } else {
            return Err(Error::not_found("project", project.id));
        };
        state.projects.insert(id, Project { id, ..project.clone() });
        Ok(id)
    }

    async fn create_project(&self, project: &Project) -> Result<(Project, Phase)> {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        let project = Project { id, ..project.clone() };
        let mut phase = Phase::default_for(id);
        phase.id = state.next_id();

        state.projects.insert(id, project.clone());
        state.phases.insert(phase.id, phase.clone());
        Ok((project, phase))
    }

    async fn delete_project(&self, id: i32) -> Result<()> {
        let mut state = self.state.lock().await;
        let project = state.projects.get(&id).ok_or(Error::not_found("project", id))?;
        let documents: Vec<Document> = state
            .documents
            .values()
            .filter(|document| document.project_id == Some(id))
            .cloned()
            .collect();
        if !project.is_deletable(&documents) {
            return Err(Error::NotDeletable { entity: "project", id });
        }

        state.drop_projects(&[id]);
        Ok(())
    }

    async fn phases_by_project(&self, project_id: i32) -> Result<Vec<Phase>> {
        let state = self.state.lock().await;
        Ok(state
            .phases
            .values()
            .filter(|phase| phase.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn save_phase(&self, phase: &Phase) -> Result<i32> {
        let mut state = self.state.lock().await;
        let id = if phase.id == 0 { state.next_id() } else { phase.id };
        state.phases.insert(id, Phase { id, ..phase.clone() });
        Ok(id)
    }

    async fn load_client(&self, id: i32) -> Result<Client> {
        let state = self.state.lock().await;
        state.clients.get(&id).cloned().ok_or(Error::not_found("client", id))
    }

    async fn save_client(&self, client: &Client) -> Result<i32> {
        let mut state = self.state.lock().await;
        let id = if client.id == 0 { state.next_id() } else { client.id };
        state.clients.insert(id, Client { id, ..client.clone() });
        Ok(id)
    }

    async fn delete_client(&self, id: i32) -> Result<()> {
        let mut state = self.state.lock().await;
        let client = state.clients.get(&id).ok_or(Error::not_found("client", id))?;
        let project_ids = state.client_project_ids(id);
        let documents: Vec<Document> = state
            .documents
            .values()
            .filter(|document| owned_by_client(document, id, &project_ids))
            .cloned()
            .collect();
        if !client.is_deletable(&documents) {
            return Err(Error::NotDeletable { entity: "client", id });
        }

        state.drop_projects(&project_ids);

        let manual: Vec<i32> = state
            .documents
            .values()
            .filter(|document| owned_by_client(document, id, &[]))
            .map(|document| document.id)
            .collect();
        state.drop_documents(&manual);
        state.clients.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LineItem, Status};
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn saving_assigns_ids_to_document_and_lines() {
        let store = MemoryStore::new();
        let mut estimation = Document::estimation(1, "Quote", day(2024, 1, 1));
        estimation.lines = vec![LineItem::new(0, "Work", 1_000, 2.0, None)];

        let id = store.save_document(&estimation).await.unwrap();
        let loaded = store.load_document(id).await.unwrap();
        assert_eq!(loaded.id, id);
        assert_ne!(loaded.lines[0].id, 0);
        assert_eq!(loaded.lines[0].document_id, id);
    }

    #[tokio::test]
    async fn saving_never_overwrites_the_status() {
        let store = MemoryStore::new();
        let id = store.save_document(&Document::invoice(1, "x", day(2024, 1, 1))).await.unwrap();
        store
            .transition_status(id, &StatusChange::new(Status::Draft, 1, None))
            .await
            .unwrap();

        let mut edited = store.load_document(id).await.unwrap();
        edited.status = Some(Status::Paid);
        edited.name = "renamed".to_string();
        store.save_document(&edited).await.unwrap();

        let loaded = store.load_document(id).await.unwrap();
        assert_eq!(loaded.name, "renamed");
        assert_eq!(loaded.status, Some(Status::Draft));
    }

    #[tokio::test]
    async fn refused_transition_keeps_status_and_history() {
        let store = MemoryStore::new();
        let id = store.save_document(&Document::estimation(1, "x", day(2024, 1, 1))).await.unwrap();
        store
            .transition_status(id, &StatusChange::new(Status::Draft, 1, None))
            .await
            .unwrap();

        let err = store
            .transition_status(id, &StatusChange::new(Status::Paid, 1, None))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { to: Status::Paid, .. }));
        assert_eq!(store.load_document(id).await.unwrap().status, Some(Status::Draft));
        assert_eq!(store.status_history(id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_document_is_not_found() {
        let store = MemoryStore::new();
        let err = store.load_document(404).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "document", id: 404 }));
    }

    #[tokio::test]
    async fn companies_are_registered_and_loaded() {
        let store = MemoryStore::new();
        let id = store
            .insert_company(Company {
                id: 0,
                name: "Coop".to_string(),
                email: None,
                phone: None,
                active: true,
            })
            .await;

        let company = store.load_company(id).await.unwrap();
        assert_eq!(company.id, id);
        assert_eq!(company.name, "Coop");
        let missing = store.load_company(id + 1).await;
        assert!(matches!(missing, Err(Error::NotFound { entity: "company", .. })));
    }

    #[tokio::test]
    async fn new_document_cannot_skip_the_workflow() {
        let store = MemoryStore::new();
        let mut invoice = Document::invoice(1, "x", day(2024, 1, 1));
        invoice.status = Some(Status::Paid);

        let err = store.save_document(&invoice).await.unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidTransition { from: None, to: Status::Paid, .. }
        ));
        assert!(store.documents_by_project(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn initial_status_is_recorded_in_history() {
        let store = MemoryStore::new();
        let mut invoice = Document::invoice(1, "x", day(2024, 1, 1));
        invoice.status = Some(Status::Draft);
        invoice.status_info.person_id = Some(3);

        let id = store.save_document(&invoice).await.unwrap();
        let history = store.status_history(id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status_code, "draft");
        assert_eq!(history[0].status_person, Some(3));

        let stored = store.load_document(id).await.unwrap();
        assert_eq!(stored.status_info.changed_at, Some(history[0].status_date));
    }

    #[tokio::test]
    async fn manual_invoice_is_stored_valid() {
        let store = MemoryStore::new();
        let data = crate::models::ManualInvoiceData {
            client_id: 2,
            company_id: 1,
            ..Default::default()
        };
        let manual = Document::manual_invoice(data, "Imported", day(2024, 1, 1));
        let id = store.save_document(&manual).await.unwrap();

        assert_eq!(store.load_document(id).await.unwrap().status, Some(Status::Valid));
        assert_eq!(store.status_history(id).await.unwrap()[0].status_code, "valid");

        let mut draft = Document::manual_invoice(Default::default(), "x", day(2024, 1, 1));
        draft.status = Some(Status::Draft);
        assert!(store.save_document(&draft).await.is_err());
    }

    #[tokio::test]
    async fn deletion_checks_the_documents_it_removes() {
        let store = MemoryStore::new();
        let project = Project {
            id: 0,
            company_id: 1,
            client_id: None,
            name: "Website".to_string(),
            code: "WEB".to_string(),
            definition: None,
            archived: true,
            starting_date: None,
            ending_date: None,
        };
        let id = store.save_project(&project).await.unwrap();
        let invoice = Document::invoice(id, "x", day(2024, 1, 1));
        store.save_document(&invoice).await.unwrap();

        let err = store.delete_project(id).await.unwrap_err();
        assert!(matches!(err, Error::NotDeletable { entity: "project", .. }));
        assert_eq!(store.documents_by_project(id).await.unwrap().len(), 1);

        let err = store.delete_project(id + 100).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "project", .. }));
    }
}
