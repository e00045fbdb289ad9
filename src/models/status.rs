use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;

use crate::error::Error;
use crate::models::DocumentType;

/// Workflow status of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Draft,
    Invalid,
    Wait,
    Valid,
    Sent,
    Paid,
    Geninv,
    Aboinv,
    Aboest,
    Abort,
    Recinv,
}

impl Status {
    pub const ALL: [Status; 11] = [
        Status::Draft,
        Status::Invalid,
        Status::Wait,
        Status::Valid,
        Status::Sent,
        Status::Paid,
        Status::Geninv,
        Status::Aboinv,
        Status::Aboest,
        Status::Abort,
        Status::Recinv,
    ];

    /// Code stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Draft => "draft",
            Status::Invalid => "invalid",
            Status::Wait => "wait",
            Status::Valid => "valid",
            Status::Sent => "sent",
            Status::Paid => "paid",
            Status::Geninv => "geninv",
            Status::Aboinv => "aboinv",
            Status::Aboest => "aboest",
            Status::Abort => "abort",
            Status::Recinv => "recinv",
        }
    }

    /// Human readable label, as shown next to a document.
    pub fn label(&self, kind: DocumentType) -> &'static str {
        match self {
            Status::Paid if kind == DocumentType::CancelInvoice => "Settled",
            Status::Draft => "Draft modified",
            Status::Wait => "Validation requested",
            Status::Valid => "Validated",
            Status::Invalid => "Invalidated",
            Status::Abort => "Cancelled",
            Status::Geninv => "Invoice generated",
            Status::Aboinv => "Invoice cancelled",
            Status::Aboest => "Estimation cancelled",
            Status::Sent => "Document sent",
            Status::Paid => "Payment received",
            Status::Recinv => "Client reminded",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| Error::UnknownStatus(s.to_string()))
    }
}

/// Who last changed the status of a document, when, and why.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusInfo {
    pub person_id: Option<i32>,
    pub comment: Option<String>,
    pub changed_at: Option<NaiveDateTime>,
}

/// A requested status change.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub status: Status,
    pub actor: i32,
    pub comment: Option<String>,
    pub at: NaiveDateTime,
}

impl StatusChange {
    pub fn new(status: Status, actor: i32, comment: Option<String>) -> Self {
        Self {
            status,
            actor,
            comment,
            at: chrono::Local::now().naive_local(),
        }
    }
}

/// One entry of a document's status history.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct StatusRecord {
    pub document_id: i32,
    pub status_code: String,
    pub status_comment: Option<String>,
    pub status_person: Option<i32>,
    pub status_date: NaiveDateTime,
}

impl StatusRecord {
    pub fn from_change(document_id: i32, change: &StatusChange) -> Self {
        Self {
            document_id,
            status_code: change.status.as_str().to_string(),
            status_comment: change.comment.clone(),
            status_person: Some(change.actor),
            status_date: change.at,
        }
    }

    /// Entry for the status a document was created with.
    pub fn from_info(document_id: i32, status: Status, info: &StatusInfo) -> Self {
        Self {
            document_id,
            status_code: status.as_str().to_string(),
            status_comment: info.comment.clone(),
            status_person: info.person_id,
            status_date: info.changed_at.unwrap_or_else(|| chrono::Local::now().naive_local()),
        }
    }
}
