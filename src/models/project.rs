use crate::models::Document;

#[derive(sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct Project {
    pub id: i32,
    pub company_id: i32,
    pub client_id: Option<i32>,
    pub name: String,
    pub code: String,
    pub definition: Option<String>,
    pub archived: bool,
    pub starting_date: Option<chrono::NaiveDate>,
    pub ending_date: Option<chrono::NaiveDate>,
}

impl Project {
    pub fn is_archived(&self) -> bool {
        self.archived
    }

    /// An archived project may be removed once none of its documents must be kept.
    pub fn is_deletable(&self, documents: &[Document]) -> bool {
        self.archived && documents.iter().all(Document::is_deletable)
    }
}

/// Name of the phase created along with a project.
pub const DEFAULT_PHASE_NAME: &str = "Phase par défaut";

/// Names a default phase may carry.
const DEFAULT_PHASE_NAMES: [&str; 3] = [DEFAULT_PHASE_NAME, "default", "défaut"];

#[derive(sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct Phase {
    pub id: i32,
    pub project_id: i32,
    pub name: String,
}

impl Phase {
    pub fn new(project_id: i32, name: &str) -> Self {
        Self {
            id: 0,
            project_id,
            name: name.to_string(),
        }
    }

    pub fn default_for(project_id: i32) -> Self {
        Self::new(project_id, DEFAULT_PHASE_NAME)
    }

    pub fn is_default(&self) -> bool {
        DEFAULT_PHASE_NAMES.contains(&self.name.as_str())
    }
}
