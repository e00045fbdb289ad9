use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::error::Error;
use crate::models::PaymentLine;

/// Explicit tag of a document variant, stored in the `kind` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentType {
    Estimation,
    Invoice,
    CancelInvoice,
    ManualInvoice,
}

impl DocumentType {
    pub const ALL: [DocumentType; 4] = [
        DocumentType::Estimation,
        DocumentType::Invoice,
        DocumentType::CancelInvoice,
        DocumentType::ManualInvoice,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Estimation => "estimation",
            DocumentType::Invoice => "invoice",
            DocumentType::CancelInvoice => "cancelinvoice",
            DocumentType::ManualInvoice => "manualinvoice",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocumentType::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::UnknownKind(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMode {
    Cheque,
    Transfer,
}

impl PaymentMode {
    /// Spelling used on project documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMode::Cheque => "CHEQUE",
            PaymentMode::Transfer => "VIREMENT",
        }
    }

    /// Spelling used on manual invoices.
    pub fn as_manual_str(&self) -> &'static str {
        match self {
            PaymentMode::Cheque => "chèque",
            PaymentMode::Transfer => "virement",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaymentMode::Cheque => "by cheque",
            PaymentMode::Transfer => "by bank transfer",
        }
    }
}

impl FromStr for PaymentMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CHEQUE" | "chèque" => Ok(PaymentMode::Cheque),
            "VIREMENT" | "virement" => Ok(PaymentMode::Transfer),
            other => Err(Error::InvalidPaymentMode(other.to_string())),
        }
    }
}

/// How much of the payment schedule an estimation prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaymentDisplay {
    All,
    None,
    #[default]
    Summary,
}

impl PaymentDisplay {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentDisplay::All => "ALL",
            PaymentDisplay::None => "NONE",
            PaymentDisplay::Summary => "SUMMARY",
        }
    }
}

impl FromStr for PaymentDisplay {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ALL" => Ok(PaymentDisplay::All),
            "NONE" => Ok(PaymentDisplay::None),
            "SUMMARY" => Ok(PaymentDisplay::Summary),
            other => Err(Error::validation(format!("unknown payment display `{other}`"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EstimationData {
    /// Deposit, in percent of the total.
    pub deposit: i32,
    pub payment_conditions: Option<String>,
    pub exclusions: Option<String>,
    pub manual_deliverables: bool,
    pub course: bool,
    pub payment_display: PaymentDisplay,
    pub payment_lines: Vec<PaymentLine>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct InvoiceData {
    pub estimation_id: Option<i32>,
    pub official_number: Option<i32>,
    pub payment_mode: Option<PaymentMode>,
    pub payment_conditions: Option<String>,
    pub deposit: i32,
    pub course: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CancelInvoiceData {
    /// The invoice this credit note reverses.
    pub invoice_id: Option<i32>,
    pub invoice_date: Option<NaiveDate>,
    pub invoice_number: Option<i32>,
    pub official_number: Option<i32>,
    pub payment_mode: Option<PaymentMode>,
    pub reimbursement_conditions: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ManualInvoiceData {
    pub client_id: i32,
    pub company_id: i32,
    pub official_number: Option<i32>,
    /// Amount excluding tax, in cents.
    pub amount_ht: i64,
    pub payment_mode: Option<PaymentMode>,
}

/// Variant specific part of a document.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentKind {
    Estimation(EstimationData),
    Invoice(InvoiceData),
    CancelInvoice(CancelInvoiceData),
    ManualInvoice(ManualInvoiceData),
}

impl DocumentKind {
    pub fn tag(&self) -> DocumentType {
        match self {
            DocumentKind::Estimation(_) => DocumentType::Estimation,
            DocumentKind::Invoice(_) => DocumentType::Invoice,
            DocumentKind::CancelInvoice(_) => DocumentType::CancelInvoice,
            DocumentKind::ManualInvoice(_) => DocumentType::ManualInvoice,
        }
    }

    pub fn official_number(&self) -> Option<i32> {
        match self {
            DocumentKind::Estimation(_) => None,
            DocumentKind::Invoice(data) => data.official_number,
            DocumentKind::CancelInvoice(data) => data.official_number,
            DocumentKind::ManualInvoice(data) => data.official_number,
        }
    }

    pub fn payment_mode(&self) -> Option<PaymentMode> {
        match self {
            DocumentKind::Estimation(_) => None,
            DocumentKind::Invoice(data) => data.payment_mode,
            DocumentKind::CancelInvoice(data) => data.payment_mode,
            DocumentKind::ManualInvoice(data) => data.payment_mode,
        }
    }
}
