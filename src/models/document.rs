use chrono::{Local, NaiveDate};

use crate::error::Result;
use crate::models::{
    CancelInvoiceData, DocumentKind, DocumentType, EstimationData, InvoiceData, LineItem,
    ManualInvoiceData, Status, StatusChange, StatusInfo,
};
use crate::workflow::transition::{
    MANUAL_INVOICE_INITIAL_STATUS, check_initial_status, check_transition,
};

/// Number of days after which an unpaid invoice is overdue.
pub const LATE_AFTER_DAYS: i64 = 45;

/// Default tax rate, in hundredths of a percent.
pub const DEFAULT_TVA: i32 = 1960;

/// A business document: estimation, invoice, cancel-invoice or manual invoice.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// 0 until the document has been saved.
    pub id: i32,
    /// `None` only for manual invoices, which hang off a client.
    pub project_id: Option<i32>,
    pub phase_id: Option<i32>,
    pub owner_id: Option<i32>,
    pub name: String,
    pub description: Option<String>,
    pub status: Option<Status>,
    pub status_info: StatusInfo,
    pub task_date: NaiveDate,
    /// Tax rate in hundredths of a percent (1960 = 19.6%).
    pub tva: i32,
    /// Expenses in cents, added after tax.
    pub expenses: i64,
    pub discount_ht: i64,
    pub displayed_units: bool,
    pub sequence_number: Option<i32>,
    pub number: Option<String>,
    pub lines: Vec<LineItem>,
    pub kind: DocumentKind,
}

impl Document {
    fn with_kind(
        project_id: Option<i32>,
        name: &str,
        task_date: NaiveDate,
        kind: DocumentKind,
    ) -> Self {
        Self {
            id: 0,
            project_id,
            phase_id: None,
            owner_id: None,
            name: name.to_string(),
            description: None,
            status: None,
            status_info: StatusInfo::default(),
            task_date,
            tva: DEFAULT_TVA,
            expenses: 0,
            discount_ht: 0,
            displayed_units: false,
            sequence_number: None,
            number: None,
            lines: Vec::new(),
            kind,
        }
    }

    pub fn estimation(project_id: i32, name: &str, task_date: NaiveDate) -> Self {
        Self::with_kind(
            Some(project_id),
            name,
            task_date,
            DocumentKind::Estimation(EstimationData::default()),
        )
    }

    pub fn invoice(project_id: i32, name: &str, task_date: NaiveDate) -> Self {
        Self::with_kind(
            Some(project_id),
            name,
            task_date,
            DocumentKind::Invoice(InvoiceData::default()),
        )
    }

    pub fn cancel_invoice(project_id: i32, name: &str, task_date: NaiveDate) -> Self {
        Self::with_kind(
            Some(project_id),
            name,
            task_date,
            DocumentKind::CancelInvoice(CancelInvoiceData::default()),
        )
    }

    /// A manual invoice is issued outside of any project and is valid from the start.
    pub fn manual_invoice(
        data: ManualInvoiceData,
        description: &str,
        task_date: NaiveDate,
    ) -> Self {
        let kind = DocumentKind::ManualInvoice(data);
        let mut document = Self::with_kind(None, description, task_date, kind);
        document.description = Some(description.to_string());
        document.status = Some(MANUAL_INVOICE_INITIAL_STATUS);
        document
    }

    pub fn doc_type(&self) -> DocumentType {
        self.kind.tag()
    }

    pub fn is_estimation(&self) -> bool {
        self.doc_type() == DocumentType::Estimation
    }

    pub fn is_invoice(&self) -> bool {
        self.doc_type() == DocumentType::Invoice
    }

    pub fn is_cancelinvoice(&self) -> bool {
        self.doc_type() == DocumentType::CancelInvoice
    }

    pub fn official_number(&self) -> Option<i32> {
        self.kind.official_number()
    }

    /// Number printed on the document.
    pub fn display_number(&self) -> Option<String> {
        match &self.kind {
            DocumentKind::ManualInvoice(data) => {
                data.official_number.map(|n| format!("FACT_MAN_{n}"))
            }
            _ => self.number.clone(),
        }
    }

    /// Validates `change` against the current status and records it.
    ///
    /// Callers must hold the document exclusively between reading its
    /// current status and persisting the result.
    pub fn apply_status(&mut self, change: &StatusChange) -> Result<()> {
        check_transition(self.doc_type(), self.status, change.status)?;
        self.status = Some(change.status);
        self.status_info = StatusInfo {
            person_id: Some(change.actor),
            comment: change.comment.clone(),
            changed_at: Some(change.at),
        };
        Ok(())
    }

    /// Runs the guard on the status a new document is inserted with.
    ///
    /// Returns the history entry to store with it, once the document id is
    /// known, or `None` when the document has no status yet.
    pub fn initial_status(&mut self) -> Result<Option<(Status, StatusInfo)>> {
        let Some(status) = self.status else {
            return Ok(None);
        };
        check_initial_status(self.doc_type(), status)?;

        if self.status_info.changed_at.is_none() {
            self.status_info.changed_at = Some(Local::now().naive_local());
        }
        Ok(Some((status, self.status_info.clone())))
    }

    fn status_in(&self, statuses: &[Status]) -> bool {
        self.status.is_some_and(|status| statuses.contains(&status))
    }

    pub fn is_draft(&self) -> bool {
        self.status_in(&[Status::Draft, Status::Invalid])
    }

    pub fn is_editable(&self, for_manager: bool) -> bool {
        match self.doc_type() {
            DocumentType::CancelInvoice => self.status == Some(Status::Draft),
            DocumentType::ManualInvoice => false,
            _ if for_manager => self.status_in(&[Status::Draft, Status::Invalid, Status::Wait]),
            _ => self.is_draft(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.status == Some(Status::Valid)
    }

    pub fn has_been_validated(&self) -> bool {
        self.status_in(&[Status::Valid, Status::Geninv, Status::Sent, Status::Recinv])
    }

    pub fn is_waiting(&self) -> bool {
        self.status == Some(Status::Wait)
    }

    pub fn is_sent(&self) -> bool {
        self.status == Some(Status::Sent)
    }

    pub fn is_paid(&self) -> bool {
        self.status == Some(Status::Paid)
    }

    pub fn is_cancelled(&self) -> bool {
        match self.doc_type() {
            DocumentType::Estimation => self.status == Some(Status::Aboest),
            DocumentType::Invoice => self.status == Some(Status::Aboinv),
            DocumentType::CancelInvoice => self.status == Some(Status::Abort),
            DocumentType::ManualInvoice => false,
        }
    }

    /// Whether payment has been expected for more than [`LATE_AFTER_DAYS`] on `today`.
    pub fn is_late_on(&self, today: NaiveDate) -> bool {
        let overdue = (today - self.task_date).num_days() > LATE_AFTER_DAYS;
        match self.doc_type() {
            DocumentType::Invoice => {
                overdue && self.status_in(&[Status::Valid, Status::Sent, Status::Recinv])
            }
            DocumentType::ManualInvoice => overdue && !self.is_paid(),
            DocumentType::Estimation | DocumentType::CancelInvoice => false,
        }
    }

    pub fn is_late(&self) -> bool {
        self.is_late_on(Local::now().date_naive())
    }

    /// Official documents are never deleted; estimations only until they produced an invoice.
    pub fn is_deletable(&self) -> bool {
        match self.doc_type() {
            DocumentType::Estimation => self.status != Some(Status::Geninv),
            _ => false,
        }
    }

    /// e.g. "Validated by Jane Doe on 05/03/2012".
    pub fn status_summary(&self, actor_name: Option<&str>) -> String {
        let label = match self.status {
            Some(status) => status.label(self.doc_type()),
            None => "Unknown status",
        };
        let date = self
            .status_info
            .changed_at
            .map(|at| at.format("%d/%m/%Y").to_string())
            .unwrap_or_default();
        format!("{} by {} on {}", label, actor_name.unwrap_or("Unknown"), date)
    }
}
