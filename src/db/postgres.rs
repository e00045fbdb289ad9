use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info};

use crate::config::Config;
use crate::db::{TaskStore, year_bounds};
use crate::error::{Error, Result};
use crate::models::{
    CancelInvoiceData, Client, Company, Document, DocumentKind, DocumentType, EstimationData,
    InvoiceData, LineItem, ManualInvoiceData, PaymentDisplay, PaymentLine, PaymentMode, Phase,
    Project, Status, StatusChange, StatusInfo, StatusRecord,
};

const TASK_COLUMNS: &str = "t.id, t.kind, t.project_id, t.phase_id, t.owner_id, t.name, \
    t.description, t.status, t.status_comment, t.status_person, t.status_date, t.task_date, \
    t.tva, t.expenses, t.discount_ht, t.displayed_units, t.sequence_number, t.number, \
    t.deposit, t.payment_conditions, \
    t.exclusions, t.manual_deliverables, t.course, t.payment_display, t.estimation_id, \
    t.official_number, t.payment_mode, t.invoice_id, t.invoice_date, t.invoice_number, \
    t.reimbursement_conditions, t.client_id, t.company_id, t.amount_ht";

const PROJECT_COLUMNS: &str =
    "id, company_id, client_id, name, code, definition, archived, starting_date, ending_date";

const CLIENT_COLUMNS: &str = "id, company_id, code, name, contact_first_name, contact_last_name, \
    address, zip_code, city, country, email, phone, archived";

/// Flat image of the `tasks` table, one column per variant field.
#[derive(sqlx::FromRow, Debug)]
struct TaskRow {
    id: i32,
    kind: String,
    project_id: Option<i32>,
    phase_id: Option<i32>,
    owner_id: Option<i32>,
    name: String,
    description: Option<String>,
    status: Option<String>,
    status_comment: Option<String>,
    status_person: Option<i32>,
    status_date: Option<NaiveDateTime>,
    task_date: NaiveDate,
    tva: i32,
    expenses: i64,
    discount_ht: i64,
    displayed_units: bool,
    sequence_number: Option<i32>,
    number: Option<String>,
    deposit: i32,
    payment_conditions: Option<String>,
    exclusions: Option<String>,
    manual_deliverables: bool,
    course: bool,
    payment_display: Option<String>,
    estimation_id: Option<i32>,
    official_number: Option<i32>,
    payment_mode: Option<String>,
    invoice_id: Option<i32>,
    invoice_date: Option<NaiveDate>,
    invoice_number: Option<i32>,
    reimbursement_conditions: Option<String>,
    client_id: Option<i32>,
    company_id: Option<i32>,
    amount_ht: i64,
}

impl TaskRow {
    fn from_document(document: &Document) -> Self {
        let mut row = Self {
            id: document.id,
            kind: document.doc_type().as_str().to_string(),
            project_id: document.project_id,
            phase_id: document.phase_id,
            owner_id: document.owner_id,
            name: document.name.clone(),
            description: document.description.clone(),
            status: document.status.map(|s| s.as_str().to_string()),
            status_comment: document.status_info.comment.clone(),
            status_person: document.status_info.person_id,
            status_date: document.status_info.changed_at,
            task_date: document.task_date,
            tva: document.tva,
            expenses: document.expenses,
            discount_ht: document.discount_ht,
            displayed_units: document.displayed_units,
            sequence_number: document.sequence_number,
            number: document.number.clone(),
            deposit: 0,
            payment_conditions: None,
            exclusions: None,
            manual_deliverables: false,
            course: false,
            payment_display: None,
            estimation_id: None,
            official_number: document.official_number(),
            payment_mode: None,
            invoice_id: None,
            invoice_date: None,
            invoice_number: None,
            reimbursement_conditions: None,
            client_id: None,
            company_id: None,
            amount_ht: 0,
        };

        match &document.kind {
            DocumentKind::Estimation(data) => {
                row.deposit = data.deposit;
                row.payment_conditions = data.payment_conditions.clone();
                row.exclusions = data.exclusions.clone();
                row.manual_deliverables = data.manual_deliverables;
                row.course = data.course;
                row.payment_display = Some(data.payment_display.as_str().to_string());
            }
            DocumentKind::Invoice(data) => {
                row.estimation_id = data.estimation_id;
                row.payment_mode = data.payment_mode.map(|m| m.as_str().to_string());
                row.payment_conditions = data.payment_conditions.clone();
                row.deposit = data.deposit;
                row.course = data.course;
            }
            DocumentKind::CancelInvoice(data) => {
                row.invoice_id = data.invoice_id;
                row.invoice_date = data.invoice_date;
                row.invoice_number = data.invoice_number;
                row.payment_mode = data.payment_mode.map(|m| m.as_str().to_string());
                row.reimbursement_conditions = data.reimbursement_conditions.clone();
            }
            DocumentKind::ManualInvoice(data) => {
                row.client_id = Some(data.client_id);
                row.company_id = Some(data.company_id);
                row.amount_ht = data.amount_ht;
                row.payment_mode = data.payment_mode.map(|m| m.as_manual_str().to_string());
            }
        }
        row
    }

    fn into_document(
        self,
        lines: Vec<LineItem>,
        payment_lines: Vec<PaymentLine>,
    ) -> Result<Document> {
        let payment_mode = self
            .payment_mode
            .as_deref()
            .map(str::parse::<PaymentMode>)
            .transpose()?;

        let kind = match self.kind.parse::<DocumentType>()? {
            DocumentType::Estimation => DocumentKind::Estimation(EstimationData {
                deposit: self.deposit,
                payment_conditions: self.payment_conditions,
                exclusions: self.exclusions,
                manual_deliverables: self.manual_deliverables,
                course: self.course,
                payment_display: self
                    .payment_display
                    .as_deref()
                    .map(str::parse::<PaymentDisplay>)
                    .transpose()?
                    .unwrap_or_default(),
                payment_lines,
            }),
            DocumentType::Invoice => DocumentKind::Invoice(InvoiceData {
                estimation_id: self.estimation_id,
                official_number: self.official_number,
                payment_mode,
                payment_conditions: self.payment_conditions,
                deposit: self.deposit,
                course: self.course,
            }),
            DocumentType::CancelInvoice => DocumentKind::CancelInvoice(CancelInvoiceData {
                invoice_id: self.invoice_id,
                invoice_date: self.invoice_date,
                invoice_number: self.invoice_number,
                official_number: self.official_number,
                payment_mode,
                reimbursement_conditions: self.reimbursement_conditions,
            }),
            DocumentType::ManualInvoice => DocumentKind::ManualInvoice(ManualInvoiceData {
                client_id: self.client_id.unwrap_or_default(),
                company_id: self.company_id.unwrap_or_default(),
                official_number: self.official_number,
                amount_ht: self.amount_ht,
                payment_mode,
            }),
        };

        Ok(Document {
            id: self.id,
            project_id: self.project_id,
            phase_id: self.phase_id,
            owner_id: self.owner_id,
            name: self.name,
            description: self.description,
            status: self.status.as_deref().map(str::parse::<Status>).transpose()?,
            status_info: StatusInfo {
                person_id: self.status_person,
                comment: self.status_comment,
                changed_at: self.status_date,
            },
            task_date: self.task_date,
            tva: self.tva,
            expenses: self.expenses,
            discount_ht: self.discount_ht,
            displayed_units: self.displayed_units,
            sequence_number: self.sequence_number,
            number: self.number,
            lines,
            kind,
        })
    }
}

/// Postgres backed store
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new Database instance with a connection pool
    pub async fn new(config: &Config) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect(config.database_url())
            .await?;

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn get_pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_document(conn: &mut PgConnection, row: TaskRow) -> Result<Document> {
        let lines = sqlx::query_as::<_, LineItem>(
            r#"
            SELECT id, document_id, row_index, description, cost, quantity, unity
            FROM task_lines
            WHERE document_id = $1
            ORDER BY row_index ASC
            "#,
        )
        .bind(row.id)
        .fetch_all(&mut *conn)
        .await?;

        let payment_lines = if row.kind == DocumentType::Estimation.as_str() {
            sqlx::query_as::<_, PaymentLine>(
                r#"
                SELECT id, document_id, row_index, description, amount, payment_date
                FROM payment_lines
                WHERE document_id = $1
                ORDER BY row_index ASC
                "#,
            )
            .bind(row.id)
            .fetch_all(&mut *conn)
            .await?
        } else {
            Vec::new()
        };

        row.into_document(lines, payment_lines)
    }

    async fn fetch_documents(conn: &mut PgConnection, rows: Vec<TaskRow>) -> Result<Vec<Document>> {
        let mut documents = Vec::with_capacity(rows.len());
        for row in rows {
            documents.push(Self::fetch_document(&mut *conn, row).await?);
        }
        Ok(documents)
    }

    async fn replace_lines(conn: &mut PgConnection, id: i32, document: &Document) -> Result<()> {
        sqlx::query("DELETE FROM task_lines WHERE document_id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        sqlx::query("DELETE FROM payment_lines WHERE document_id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        for line in &document.lines {
            sqlx::query(
                r#"
                INSERT INTO task_lines (document_id, row_index, description, cost, quantity, unity)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(id)
            .bind(line.row_index)
            .bind(&line.description)
            .bind(line.cost)
            .bind(line.quantity)
            .bind(&line.unity)
            .execute(&mut *conn)
            .await?;
        }

        if let DocumentKind::Estimation(data) = &document.kind {
            for line in &data.payment_lines {
                sqlx::query(
                    r#"
                    INSERT INTO payment_lines
                        (document_id, row_index, description, amount, payment_date)
                    VALUES ($1, $2, $3, $4, $5)
                    "#,
                )
                .bind(id)
                .bind(line.row_index)
                .bind(&line.description)
                .bind(line.amount)
                .bind(line.payment_date)
                .execute(&mut *conn)
                .await?;
            }
        }

        Ok(())
    }

    async fn insert_project(conn: &mut PgConnection, project: &Project) -> Result<i32> {
        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO projects (company_id, client_id, name, code, definition, archived,
                starting_date, ending_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(project.company_id)
        .bind(project.client_id)
        .bind(&project.name)
        .bind(&project.code)
        .bind(&project.definition)
        .bind(project.archived)
        .bind(project.starting_date)
        .bind(project.ending_date)
        .fetch_one(&mut *conn)
        .await?;

        Ok(id)
    }

    async fn insert_history(conn: &mut PgConnection, record: &StatusRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO task_status_history
                (document_id, status_code, status_comment, status_person, status_date)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(record.document_id)
        .bind(&record.status_code)
        .bind(&record.status_comment)
        .bind(record.status_person)
        .bind(record.status_date)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Documents of the projects, plus the client's manual invoices, locked until commit.
    async fn lock_documents(
        conn: &mut PgConnection,
        project_ids: &[i32],
        client_id: Option<i32>,
    ) -> Result<Vec<Document>> {
        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks t
            WHERE t.project_id = ANY($1) OR t.client_id = $2
            ORDER BY t.id ASC
            FOR UPDATE
            "#
        ))
        .bind(project_ids)
        .bind(client_id)
        .fetch_all(&mut *conn)
        .await?;

        Self::fetch_documents(conn, rows).await
    }

    async fn delete_documents_of_projects(
        conn: &mut PgConnection,
        project_ids: &[i32],
    ) -> Result<()> {
        for table in ["task_lines", "payment_lines", "task_status_history"] {
            sqlx::query(&format!(
                r#"
                DELETE FROM {table}
                WHERE document_id IN (SELECT id FROM tasks WHERE project_id = ANY($1))
                "#
            ))
            .bind(project_ids)
            .execute(&mut *conn)
            .await?;
        }
        sqlx::query("DELETE FROM tasks WHERE project_id = ANY($1)")
            .bind(project_ids)
            .execute(&mut *conn)
            .await?;
        sqlx::query("DELETE FROM phases WHERE project_id = ANY($1)")
            .bind(project_ids)
            .execute(&mut *conn)
            .await?;
        sqlx::query("DELETE FROM projects WHERE id = ANY($1)")
            .bind(project_ids)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl TaskStore for Database {
    async fn load_document(&self, id: i32) -> Result<Document> {
        let mut conn = self.pool.acquire().await?;
        let query = format!("SELECT {TASK_COLUMNS} FROM tasks t WHERE t.id = $1");
        let row = sqlx::query_as::<_, TaskRow>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or(Error::not_found("document", id))?;

        Self::fetch_document(&mut conn, row).await
    }

    async fn save_document(&self, document: &Document) -> Result<i32> {
        let mut document = document.clone();
        let initial = if document.id == 0 { document.initial_status()? } else { None };
        let row = TaskRow::from_document(&document);

        // Start a transaction
        let mut tx = self.pool.begin().await?;

        let id = if document.id == 0 {
            sqlx::query_scalar::<_, i32>(
                r#"
                INSERT INTO tasks (kind, project_id, phase_id, owner_id, name, description,
                    status, status_comment, status_person, status_date, task_date, tva, expenses,
                    discount_ht, displayed_units, sequence_number, number, deposit,
                    payment_conditions,
                    exclusions, manual_deliverables, course, payment_display, estimation_id,
                    official_number, payment_mode, invoice_id, invoice_date, invoice_number,
                    reimbursement_conditions, client_id, company_id, amount_ht)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                    $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29, $30, $31, $32, $33)
                RETURNING id
                "#,
            )
            .bind(&row.kind)
            .bind(row.project_id)
            .bind(row.phase_id)
            .bind(row.owner_id)
            .bind(&row.name)
            .bind(&row.description)
            .bind(&row.status)
            .bind(&row.status_comment)
            .bind(row.status_person)
            .bind(row.status_date)
            .bind(row.task_date)
            .bind(row.tva)
            .bind(row.expenses)
            .bind(row.discount_ht)
            .bind(row.displayed_units)
            .bind(row.sequence_number)
            .bind(&row.number)
            .bind(row.deposit)
            .bind(&row.payment_conditions)
            .bind(&row.exclusions)
            .bind(row.manual_deliverables)
            .bind(row.course)
            .bind(&row.payment_display)
            .bind(row.estimation_id)
            .bind(row.official_number)
            .bind(&row.payment_mode)
            .bind(row.invoice_id)
            .bind(row.invoice_date)
            .bind(row.invoice_number)
            .bind(&row.reimbursement_conditions)
            .bind(row.client_id)
            .bind(row.company_id)
            .bind(row.amount_ht)
            .fetch_one(&mut *tx)
            .await?
        } else {
            // Status columns are left alone: they only move through transition_status
            let updated = sqlx::query(
                r#"
                UPDATE tasks
                SET project_id = $1, phase_id = $2, owner_id = $3, name = $4, description = $5,
                    task_date = $6, tva = $7, expenses = $8, discount_ht = $9,
                    displayed_units = $10, sequence_number = $11, number = $12, deposit = $13,
                    payment_conditions = $14, exclusions = $15, manual_deliverables = $16,
                    course = $17, payment_display = $18, estimation_id = $19,
                    official_number = $20, payment_mode = $21, invoice_id = $22,
                    invoice_date = $23, invoice_number = $24, reimbursement_conditions = $25,
                    client_id = $26, company_id = $27, amount_ht = $28
                WHERE id = $29 AND kind = $30
                "#,
            )
            .bind(row.project_id)
            .bind(row.phase_id)
            .bind(row.owner_id)
            .bind(&row.name)
            .bind(&row.description)
            .bind(row.task_date)
            .bind(row.tva)
            .bind(row.expenses)
            .bind(row.discount_ht)
            .bind(row.displayed_units)
            .bind(row.sequence_number)
            .bind(&row.number)
            .bind(row.deposit)
            .bind(&row.payment_conditions)
            .bind(&row.exclusions)
            .bind(row.manual_deliverables)
            .bind(row.course)
            .bind(&row.payment_display)
            .bind(row.estimation_id)
            .bind(row.official_number)
            .bind(&row.payment_mode)
            .bind(row.invoice_id)
            .bind(row.invoice_date)
            .bind(row.invoice_number)
            .bind(&row.reimbursement_conditions)
            .bind(row.client_id)
            .bind(row.company_id)
            .bind(row.amount_ht)
            .bind(row.id)
            .bind(&row.kind)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                return Err(Error::not_found("document", document.id));
            }
            document.id
        };

        Self::replace_lines(&mut tx, id, &document).await?;

        if let Some((status, info)) = initial {
            Self::insert_history(&mut tx, &StatusRecord::from_info(id, status, &info)).await?;
        }

        // Commit the transaction
        tx.commit().await?;

        debug!(id, kind = %document.doc_type(), "document saved");
        Ok(id)
    }

    async fn transition_status(&self, id: i32, change: &StatusChange) -> Result<Document> {
        let mut tx = self.pool.begin().await?;

        // Lock the row so concurrent changes queue behind this one
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks t WHERE t.id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(Error::not_found("document", id))?;

        let mut document = Self::fetch_document(&mut tx, row).await?;
        let previous = document.status;

        // Dropping the transaction on refusal rolls it back
        document.apply_status(change)?;

        sqlx::query(
            r#"
            UPDATE tasks
            SET status = $1, status_comment = $2, status_person = $3, status_date = $4
            WHERE id = $5
            "#,
        )
        .bind(change.status.as_str())
        .bind(&change.comment)
        .bind(change.actor)
        .bind(change.at)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        Self::insert_history(&mut tx, &StatusRecord::from_change(id, change)).await?;

        tx.commit().await?;

        info!(id, from = ?previous, to = %change.status, actor = change.actor, "status changed");
        Ok(document)
    }

    async fn status_history(&self, id: i32) -> Result<Vec<StatusRecord>> {
        let records = sqlx::query_as::<_, StatusRecord>(
            r#"
            SELECT document_id, status_code, status_comment, status_person, status_date
            FROM task_status_history
            WHERE document_id = $1
            ORDER BY status_date ASC, id ASC
            "#,
        )
        .bind(id)
        .fetch_all(self.get_pool())
        .await?;

        Ok(records)
    }

    async fn documents_by_project(&self, project_id: i32) -> Result<Vec<Document>> {
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks t
            WHERE t.project_id = $1
            ORDER BY t.task_date ASC, t.id ASC
            "#
        ))
        .bind(project_id)
        .fetch_all(&mut *conn)
        .await?;

        Self::fetch_documents(&mut conn, rows).await
    }

    async fn documents_by_client(&self, client_id: i32) -> Result<Vec<Document>> {
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks t
            LEFT JOIN projects p ON p.id = t.project_id
            WHERE p.client_id = $1 OR t.client_id = $1
            ORDER BY t.task_date ASC, t.id ASC
            "#
        ))
        .bind(client_id)
        .fetch_all(&mut *conn)
        .await?;

        Self::fetch_documents(&mut conn, rows).await
    }

    async fn documents_by_company(
        &self,
        company_id: i32,
        year: Option<i32>,
    ) -> Result<Vec<Document>> {
        let (start, end) = match year {
            Some(year) => {
                let (start, end) = year_bounds(year)?;
                (Some(start), Some(end))
            }
            None => (None, None),
        };

        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks t
            LEFT JOIN projects p ON p.id = t.project_id
            WHERE (p.company_id = $1 OR t.company_id = $1)
              AND ($2::date IS NULL OR t.task_date >= $2)
              AND ($3::date IS NULL OR t.task_date < $3)
            ORDER BY t.task_date ASC, t.id ASC
            "#
        ))
        .bind(company_id)
        .bind(start)
        .bind(end)
        .fetch_all(&mut *conn)
        .await?;

        Self::fetch_documents(&mut conn, rows).await
    }

    async fn max_official_number(&self, kind: DocumentType, year: i32) -> Result<Option<i32>> {
        let (start, end) = year_bounds(year)?;
        let max = sqlx::query_scalar::<_, Option<i32>>(
            r#"
            SELECT MAX(official_number)
            FROM tasks
            WHERE kind = $1 AND task_date >= $2 AND task_date < $3
            "#,
        )
        .bind(kind.as_str())
        .bind(start)
        .bind(end)
        .fetch_one(self.get_pool())
        .await?;

        Ok(max)
    }

    async fn load_company(&self, id: i32) -> Result<Company> {
        let query = "SELECT id, name, email, phone, active FROM companies WHERE id = $1";
        sqlx::query_as::<_, Company>(query)
            .bind(id)
            .fetch_optional(self.get_pool())
            .await?
            .ok_or(Error::not_found("company", id))
    }

    async fn load_project(&self, id: i32) -> Result<Project> {
        let query = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(self.get_pool())
            .await?
            .ok_or(Error::not_found("project", id))
    }

    async fn save_project(&self, project: &Project) -> Result<i32> {
        if project.id == 0 {
            let mut conn = self.pool.acquire().await?;
            return Self::insert_project(&mut conn, project).await;
        }

        let updated = sqlx::query(
            r#"
            UPDATE projects
            SET client_id = $1, name = $2, code = $3, definition = $4, archived = $5,
                starting_date = $6, ending_date = $7
            WHERE id = $8
            "#,
        )
        .bind(project.client_id)
        .bind(&project.name)
        .bind(&project.code)
        .bind(&project.definition)
        .bind(project.archived)
        .bind(project.starting_date)
        .bind(project.ending_date)
        .bind(project.id)
        .execute(self.get_pool())
        .await?;

        if updated.rows_affected() == 0 {
            return Err(Error::not_found("project", project.id));
        }
        Ok(project.id)
    }

    async fn create_project(&self, project: &Project) -> Result<(Project, Phase)> {
        // Start a transaction
        let mut tx = self.pool.begin().await?;

        let id = Self::insert_project(&mut tx, project).await?;

        let mut phase = Phase::default_for(id);
        phase.id = sqlx::query_scalar::<_, i32>(
            "INSERT INTO phases (project_id, name) VALUES ($1, $2) RETURNING id",
        )
        .bind(phase.project_id)
        .bind(&phase.name)
        .fetch_one(&mut *tx)
        .await?;

        // Commit the transaction
        tx.commit().await?;

        Ok((Project { id, ..project.clone() }, phase))
    }

    async fn delete_project(&self, id: i32) -> Result<()> {
        // Start a transaction
        let mut tx = self.pool.begin().await?;

        // Lock the project so no document can be attached to it before commit
        let project = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(Error::not_found("project", id))?;

        let documents = Self::lock_documents(&mut tx, &[id], None).await?;
        if !project.is_deletable(&documents) {
            return Err(Error::NotDeletable { entity: "project", id });
        }

        Self::delete_documents_of_projects(&mut tx, &[id]).await?;

        // Commit the transaction
        tx.commit().await?;

        Ok(())
    }

    async fn phases_by_project(&self, project_id: i32) -> Result<Vec<Phase>> {
        let phases = sqlx::query_as::<_, Phase>(
            "SELECT id, project_id, name FROM phases WHERE project_id = $1 ORDER BY id ASC",
        )
        .bind(project_id)
        .fetch_all(self.get_pool())
        .await?;

        Ok(phases)
    }

    async fn save_phase(&self, phase: &Phase) -> Result<i32> {
        if phase.id == 0 {
            let id = sqlx::query_scalar::<_, i32>(
                "INSERT INTO phases (project_id, name) VALUES ($1, $2) RETURNING id",
            )
            .bind(phase.project_id)
            .bind(&phase.name)
            .fetch_one(self.get_pool())
            .await?;

            return Ok(id);
        }

        sqlx::query("UPDATE phases SET name = $1 WHERE id = $2")
            .bind(&phase.name)
            .bind(phase.id)
            .execute(self.get_pool())
            .await?;

        Ok(phase.id)
    }

    async fn load_client(&self, id: i32) -> Result<Client> {
        sqlx::query_as::<_, Client>(&format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE id = $1"))
            .bind(id)
            .fetch_optional(self.get_pool())
            .await?
            .ok_or(Error::not_found("client", id))
    }

    async fn save_client(&self, client: &Client) -> Result<i32> {
        if client.id == 0 {
            let id = sqlx::query_scalar::<_, i32>(
                r#"
                INSERT INTO clients (company_id, code, name, contact_first_name, contact_last_name,
                    address, zip_code, city, country, email, phone, archived)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                RETURNING id
                "#,
            )
            .bind(client.company_id)
            .bind(&client.code)
            .bind(&client.name)
            .bind(&client.contact_first_name)
            .bind(&client.contact_last_name)
            .bind(&client.address)
            .bind(&client.zip_code)
            .bind(&client.city)
            .bind(&client.country)
            .bind(&client.email)
            .bind(&client.phone)
            .bind(client.archived)
            .fetch_one(self.get_pool())
            .await?;

            return Ok(id);
        }

        sqlx::query(
            r#"
            UPDATE clients
            SET code = $1, name = $2, contact_first_name = $3, contact_last_name = $4, address = $5,
                zip_code = $6, city = $7, country = $8, email = $9, phone = $10, archived = $11
            WHERE id = $12
            "#,
        )
        .bind(&client.code)
        .bind(&client.name)
        .bind(&client.contact_first_name)
        .bind(&client.contact_last_name)
        .bind(&client.address)
        .bind(&client.zip_code)
        .bind(&client.city)
        .bind(&client.country)
        .bind(&client.email)
        .bind(&client.phone)
        .bind(client.archived)
        .bind(client.id)
        .execute(self.get_pool())
        .await?;

        Ok(client.id)
    }

    async fn delete_client(&self, id: i32) -> Result<()> {
        // Start a transaction
        let mut tx = self.pool.begin().await?;

        // Lock the client, then its projects, so nothing new hangs off them before commit
        let client = sqlx::query_as::<_, Client>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(Error::not_found("client", id))?;

        let project_ids =
            sqlx::query_scalar::<_, i32>("SELECT id FROM projects WHERE client_id = $1 FOR UPDATE")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;

        let documents = Self::lock_documents(&mut tx, &project_ids, Some(id)).await?;
        if !client.is_deletable(&documents) {
            return Err(Error::NotDeletable { entity: "client", id });
        }

        Self::delete_documents_of_projects(&mut tx, &project_ids).await?;

        // Manual invoices hang directly off the client
        sqlx::query(
            r#"
            DELETE FROM task_status_history
            WHERE document_id IN (SELECT id FROM tasks WHERE client_id = $1)
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM tasks WHERE client_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        // Finally delete the client
        sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        // Commit the transaction
        tx.commit().await?;

        Ok(())
    }
}

/// Initialize the database connection pool
pub async fn init(config: &Config) -> Result<Database> {
    let db = Database::new(config).await?;

    info!(max_connections = config.db_max_connections, "database pool ready");
    Ok(db)
}
